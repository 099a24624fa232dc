/*
This file is part of the AOI Splitter
Copyright (C) 2022 Novel-T

The AOI Splitter is free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with this program.  If not, see <http://www.gnu.org/licenses/>.
*/
mod io;

use std::fs;

use anyhow::Result;
use log::{info, LevelFilter};
use simple_logger::SimpleLogger;
use structopt::StructOpt;

use splitter_core::config::SplitConfig;

#[derive(StructOpt)]
struct Args {
    #[structopt(long, help = "Path to a GeoJSON AOI (Polygon, Feature, FeatureCollection, or MultiPolygon)")]
    aoi: String,

    #[structopt(long, help = "Path to a GeoJSON FeatureCollection of linear splitters (highway/waterway/railway)")]
    lines: Option<String>,

    #[structopt(long, help = "Path to a GeoJSON FeatureCollection of building footprints")]
    features: Option<String>,

    #[structopt(long, help = "Path to write the output task FeatureCollection")]
    out: String,

    #[structopt(long, default_value = "10", help = "Desired features per task")]
    target_cluster_size: usize,

    #[structopt(long, help = "Low-count / small-task threshold; defaults to target_cluster_size / 2")]
    min_features: Option<usize>,

    #[structopt(long, default_value = "4.0", help = "Max perimeter segment length in meters")]
    segmentize_m: f64,

    #[structopt(long, default_value = "7.5", help = "Douglas-Peucker simplification tolerance in meters")]
    simplify_m: f64,

    #[structopt(long, default_value = "0", help = "Seed for deterministic k-means clustering")]
    kmeans_seed: u64,

    #[structopt(long, default_value = "Warn")]
    log_level: LevelFilter,
}

fn run() -> Result<()> {
    let args = Args::from_args();

    SimpleLogger::new().with_level(args.log_level).init()?;

    let aoi_raw = fs::read_to_string(&args.aoi)?;
    let aoi = io::decode_aoi(&aoi_raw)?;

    let lines = match &args.lines {
        Some(path) => io::decode_lines(&fs::read_to_string(path)?)?,
        None => Vec::new(),
    };

    let features = match &args.features {
        Some(path) => io::decode_features(&fs::read_to_string(path)?)?,
        None => Vec::new(),
    };

    use geo::Centroid;
    let aoi_centroid_lat = aoi
        .geometry
        .centroid()
        .map(|c| c.y())
        .unwrap_or(0.0);

    let mut config = SplitConfig::from_meters(
        args.target_cluster_size,
        args.segmentize_m,
        args.simplify_m,
        aoi_centroid_lat,
    );
    if let Some(min_features) = args.min_features {
        config.min_features = min_features;
    }
    config.kmeans_seed = args.kmeans_seed;

    info!(
        "splitting AOI with {} linear splitter candidates and {} building features",
        lines.len(),
        features.len()
    );

    let result = splitter_core::run(&aoi, &lines, &features, &config)?;

    info!(
        "produced {} tasks (multipolygon AOI: {}, had linear splitters: {}, had features: {}, voronoi retries: {})",
        result.tasks.len(),
        result.metadata.aoi_was_multipolygon,
        result.metadata.had_linear_splitters,
        result.metadata.had_features,
        result.metadata.voronoi_retry_count,
    );

    let fc = io::encode_tasks(&result.tasks);
    fs::write(&args.out, fc.to_string())?;

    Ok(())
}

fn main() {
    run().unwrap();
}

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
//! S1 — LineSplit: polygonize the AOI using selected linear features.
use log::debug;

use crate::config::SplitConfig;
use crate::error::SplitError;
use crate::geom::backend;
use crate::geom::convert::{line_string_to_geos, polygon_to_geos};
use crate::types::{Aoi, SplitLine, SubPolygon};

pub fn line_split(
    aoi: &Aoi,
    lines: &[SplitLine],
    config: &SplitConfig,
) -> Result<(Vec<SubPolygon>, bool), SplitError> {
    let selected: Vec<&SplitLine> = lines
        .iter()
        .filter(|l| config.split_tags.matches(&l.tags))
        .collect();

    let aoi_geos = polygon_to_geos(&aoi.geometry)?;

    if selected.is_empty() {
        debug!("no linear splitters selected; emitting AOI as a single SubPolygon");
        return Ok((vec![single_subpolygon(aoi)], false));
    }

    // Clip each selected splitter to the AOI; drop any that don't intersect.
    let mut clipped_lines = Vec::new();
    for line in &selected {
        let line_geos = line_string_to_geos(&line.geometry)?;
        if !backend::intersects(&line_geos, &aoi_geos)? {
            continue;
        }
        let intersection = backend::intersection(&line_geos, &aoi_geos)?;
        clipped_lines.push(intersection);
    }

    if clipped_lines.is_empty() {
        debug!("no splitter intersects the AOI; emitting AOI as a single SubPolygon");
        return Ok((vec![single_subpolygon(aoi)], false));
    }

    // Node-merge the clipped linework into a single planar linework M, then
    // union M with the AOI boundary ∂A to produce a closed planar graph G.
    let aoi_boundary = backend::boundary(&aoi_geos)?;
    clipped_lines.push(aoi_boundary);
    let noded_graph = backend::union_all(&clipped_lines)?;

    let polygons = backend::polygonize(&[noded_graph])?;

    if polygons.is_empty() {
        debug!("polygonize produced no faces; falling back to the AOI as a single SubPolygon");
        return Ok((vec![single_subpolygon(aoi)], false));
    }

    let sub_polygons: Vec<SubPolygon> = polygons
        .into_iter()
        .enumerate()
        .map(|(idx, geometry)| {
            let area_m2 = crate::geom::geodesic_area_m2(&geometry);
            SubPolygon {
                polyid: idx as u32,
                geometry,
                feature_ids: Vec::new(),
                area_m2,
            }
        })
        .collect();

    Ok((sub_polygons, true))
}

fn single_subpolygon(aoi: &Aoi) -> SubPolygon {
    SubPolygon {
        polyid: 0,
        geometry: aoi.geometry.clone(),
        feature_ids: Vec::new(),
        area_m2: crate::geom::geodesic_area_m2(&aoi.geometry),
    }
}

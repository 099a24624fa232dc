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
//! S6 — Voronoi: tessellate the densified point set, clipped per SubPolygon,
//! and tag each cell with its generator's cluster identity.
use geo::{BoundingRect, Point, Polygon};
use log::warn;
use rstar::{RTree, RTreeObject, AABB};

use crate::config::SplitConfig;
use crate::error::SplitError;
use crate::geom::backend;
use crate::geom::convert::{geos_to_geo, point_to_geos, polygon_to_geos};
use crate::pipeline::s5_densify::DensifiedPoint;
use crate::types::{ClusterUid, SubPolygon};

pub struct VoronoiCell {
    pub geometry: Polygon<f64>,
    pub cluster_uid: ClusterUid,
}

struct IndexedPoint {
    point: Point<f64>,
    cluster_uid: ClusterUid,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Computes the global Voronoi diagram of `points`, intersects each resulting
/// cell with the SubPolygon that owns its generator, and attaches the
/// generator's `clusteruid`. Retries by doubling `segmentize_deg`-sourced
/// tolerance up to `config.max_voronoi_retries` times on numeric failure.
pub fn voronoi_per_subpolygon(
    points: &[DensifiedPoint],
    sub_polygons: &[SubPolygon],
    config: &SplitConfig,
) -> Result<(Vec<VoronoiCell>, u32), SplitError> {
    if points.is_empty() {
        return Ok((Vec::new(), 0));
    }

    // Stable order: by cluster_uid then by (x, y), so repeated runs feed the
    // backend identical input ordering.
    let mut ordered: Vec<&DensifiedPoint> = points.iter().collect();
    ordered.sort_by(|a, b| {
        a.cluster_uid
            .cmp(&b.cluster_uid)
            .then(a.point.x().partial_cmp(&b.point.x()).unwrap())
            .then(a.point.y().partial_cmp(&b.point.y()).unwrap())
    });

    let geos_points: Vec<geos::Geometry> = ordered
        .iter()
        .map(|dp| point_to_geos(&dp.point))
        .collect::<Result<_, _>>()?;
    let point_collection = geos::Geometry::create_multipoint(geos_points)
        .map_err(SplitError::BackendCommunicationFailure)?;

    let mut tolerance = config.segmentize_deg / 4.0;
    let mut attempt = 0;
    let diagram = loop {
        attempt += 1;
        match backend::voronoi(&point_collection, None, tolerance) {
            Ok(d) => break d,
            Err(SplitError::VoronoiNumericFailure { .. }) if attempt < config.max_voronoi_retries => {
                warn!(
                    "voronoi failed on attempt {attempt} at tolerance {tolerance}; doubling and retrying"
                );
                tolerance *= 2.0;
                continue;
            }
            Err(SplitError::VoronoiNumericFailure { last_segmentize_deg, source, .. }) => {
                return Err(SplitError::VoronoiNumericFailure {
                    attempts: attempt,
                    last_segmentize_deg,
                    source,
                });
            }
            Err(e) => return Err(e),
        }
    };
    let retry_count = attempt - 1;

    let diagram_geo = geos_to_geo(&diagram)?;
    let cells = crate::geom::convert::extract_polygons(&diagram_geo);

    let indexed_points: Vec<IndexedPoint> = ordered
        .iter()
        .map(|dp| IndexedPoint {
            point: dp.point,
            cluster_uid: dp.cluster_uid,
            envelope: AABB::from_corners([dp.point.x(), dp.point.y()], [dp.point.x(), dp.point.y()]),
        })
        .collect();
    let point_tree = RTree::bulk_load(indexed_points);

    let sub_polygons_geos: Vec<(u32, &Polygon<f64>)> = sub_polygons
        .iter()
        .map(|sp| (sp.polyid, &sp.geometry))
        .collect();

    let mut out = Vec::new();
    for cell in cells {
        let rect = match cell.bounding_rect() {
            Some(r) => r,
            None => continue,
        };
        let envelope = AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]);
        let cell_geos = polygon_to_geos(&cell)?;

        let mut owner: Option<ClusterUid> = None;
        for candidate in point_tree.locate_in_envelope_intersecting(&envelope) {
            let candidate_geos = point_to_geos(&candidate.point)?;
            if backend::contains(&cell_geos, &candidate_geos)?
                || backend::intersects(&cell_geos, &candidate_geos)?
            {
                owner = Some(candidate.cluster_uid);
                break;
            }
        }
        let Some(cluster_uid) = owner else {
            continue; // cell with no generator inside (can happen at the diagram's outer fringe)
        };

        // Clip the cell to the SubPolygon that owns this clusteruid's polyid.
        if let Some((_, sub_geom)) = sub_polygons_geos
            .iter()
            .find(|(id, _)| *id == cluster_uid.polyid)
        {
            for clipped in backend::clip_to(&cell, sub_geom)? {
                out.push(VoronoiCell {
                    geometry: clipped,
                    cluster_uid,
                });
            }
        }
    }

    Ok((out, retry_count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn voronoi_of_two_clusters_tiles_the_subpolygon() {
        let sub = SubPolygon {
            polyid: 0,
            geometry: polygon![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)],
            feature_ids: vec![],
            area_m2: 0.0,
        };
        let points = vec![
            DensifiedPoint { point: Point::new(2.0, 5.0), cluster_uid: ClusterUid { polyid: 0, cid: 0 } },
            DensifiedPoint { point: Point::new(8.0, 5.0), cluster_uid: ClusterUid { polyid: 0, cid: 1 } },
        ];
        let config = SplitConfig::default();
        let (cells, _retries) = voronoi_per_subpolygon(&points, &[sub], &config).unwrap();
        assert!(!cells.is_empty());
        let cids: std::collections::HashSet<u32> = cells.iter().map(|c| c.cluster_uid.cid).collect();
        assert_eq!(cids.len(), 2);
    }
}

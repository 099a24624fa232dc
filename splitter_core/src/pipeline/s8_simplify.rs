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
//! S8 — Simplify: rebuild task boundaries from the preliminary clusters'
//! unique shared segments and simplify that linework once, globally, so the
//! tiling invariant survives Douglas-Peucker simplification untouched.
use crate::config::SplitConfig;
use crate::error::SplitError;
use crate::geom::backend;
use crate::geom::convert::line_string_to_geos;
use crate::pipeline::s7_dissolve::PreliminaryClusterPolygon;
use crate::types::{TaskId, TaskPolygon};

pub fn simplify_and_repolygonize(
    preliminary: &[PreliminaryClusterPolygon],
    config: &SplitConfig,
) -> Result<Vec<TaskPolygon>, SplitError> {
    if preliminary.is_empty() {
        return Ok(Vec::new());
    }

    // 1. Extract every preliminary polygon's boundary as linestrings.
    let mut boundaries = Vec::new();
    for cluster_poly in preliminary {
        boundaries.push(cluster_poly.geometry.exterior().clone());
        for interior in cluster_poly.geometry.interiors() {
            boundaries.push(interior.clone());
        }
    }

    // 2-3. Union the linework so a boundary shared by two task polygons
    // appears exactly once, then merge into a maximal set of linestrings.
    let merged = backend::line_merge(&boundaries)?;

    // 4. Douglas-Peucker simplification applied once to the shared linework.
    let mut simplified_lines = Vec::with_capacity(merged.len());
    for line in &merged {
        let geos_line = line_string_to_geos(line)?;
        let simplified = backend::simplify(&geos_line, config.simplify_deg)?;
        simplified_lines.push(simplified);
    }

    // 5. Re-polygonize the simplified linework; each face becomes a TaskPolygon.
    let polygons = backend::polygonize(&simplified_lines)?;

    let tasks = polygons
        .into_iter()
        .enumerate()
        .map(|(idx, geometry)| {
            let area_m2 = crate::geom::geodesic_area_m2(&geometry);
            TaskPolygon {
                taskid: idx as TaskId,
                geometry,
                feature_ids: Vec::new(), // filled in by the caller once feature centroids are known
                building_count: 0,
                area_m2,
            }
        })
        .collect();

    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ClusterUid;
    use geo::polygon;

    #[test]
    fn two_adjacent_preliminary_polygons_repolygonize_into_two_tasks() {
        let preliminary = vec![
            PreliminaryClusterPolygon {
                cluster_uid: ClusterUid { polyid: 0, cid: 0 },
                geometry: polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)],
            },
            PreliminaryClusterPolygon {
                cluster_uid: ClusterUid { polyid: 0, cid: 1 },
                geometry: polygon![(x: 1.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 1.0), (x: 1.0, y: 1.0)],
            },
        ];
        let mut config = SplitConfig::default();
        config.simplify_deg = 1e-9; // effectively no simplification for this coarse test geometry
        let tasks = simplify_and_repolygonize(&preliminary, &config).unwrap();
        assert_eq!(tasks.len(), 2);
        let total_area: f64 = tasks.iter().map(|t| t.area_m2).sum();
        assert!(total_area > 0.0);
    }
}

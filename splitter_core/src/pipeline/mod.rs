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
//! Orchestrates S1 through S9 end-to-end. Each stage is its own module so a
//! driver can also call them individually for inspection/testing; `run` is
//! the one contract callers are expected to use.
pub mod s1_linesplit;
pub mod s2_featurebind;
pub mod s3_lowcountmerge;
pub mod s4_cluster;
pub mod s5_densify;
pub mod s6_voronoi;
pub mod s7_dissolve;
pub mod s8_simplify;
pub mod s9_smallmerge;

use std::collections::HashMap;

use log::info;

use crate::config::SplitConfig;
use crate::error::SplitError;
use crate::geom::backend;
use crate::geom::convert::point_to_geos;
use crate::types::{Aoi, Feature, RunMetadata, SplitLine, SplitResult, TaskPolygon};

/// Assigns a `TaskPolygon`'s `feature_ids`/`building_count` by centroid
/// containment, the same rule S2 applies to SubPolygons. Ties are impossible
/// by construction: tasks are interior-disjoint, so a centroid not on a
/// shared boundary lies in at most one task; a centroid exactly on a shared
/// boundary is assigned to the lowest `taskid`, mirroring S2's tiebreak.
fn assign_building_counts(
    tasks: &mut [TaskPolygon],
    features: &[Feature],
) -> Result<(), SplitError> {
    let mut sorted_ids: Vec<u64> = features.iter().map(|f| f.id).collect();
    sorted_ids.sort_unstable();
    let by_id: HashMap<u64, &Feature> = features.iter().map(|f| (f.id, f)).collect();

    let mut geos_polys = Vec::with_capacity(tasks.len());
    for task in tasks.iter() {
        geos_polys.push(crate::geom::convert::polygon_to_geos(&task.geometry)?);
    }

    for task in tasks.iter_mut() {
        task.feature_ids.clear();
    }

    for id in sorted_ids {
        let feature = by_id[&id];
        let centroid_geos = point_to_geos(&feature.centroid()?)?;

        let mut assigned: Option<usize> = None;
        for (idx, poly) in geos_polys.iter().enumerate() {
            if backend::contains(poly, &centroid_geos)? {
                assigned = Some(idx);
                break;
            }
        }
        if assigned.is_none() {
            for (idx, poly) in geos_polys.iter().enumerate() {
                if backend::intersects(poly, &centroid_geos)? {
                    assigned = Some(idx);
                    break;
                }
            }
        }
        if let Some(idx) = assigned {
            tasks[idx].feature_ids.push(id);
        }
    }

    for task in tasks.iter_mut() {
        task.feature_ids.sort_unstable();
        task.building_count = task.feature_ids.len();
    }
    Ok(())
}

/// Runs the full S1-S9 pipeline. `aoi` is already a single simple polygon
/// (MultiPolygon reduction to convex hull is an `io`-layer concern); `lines`
/// and `features` are pre-filtered to the building tag and AOI containment
/// at the edge.
pub fn run(
    aoi: &Aoi,
    lines: &[SplitLine],
    features: &[Feature],
    config: &SplitConfig,
) -> Result<SplitResult, SplitError> {
    if aoi.geometry.exterior().0.is_empty() {
        return Err(SplitError::InvalidInputGeometry("AOI has no exterior ring".to_string()));
    }

    info!("S1 LineSplit: {} candidate linear splitters", lines.len());
    let (mut sub_polygons, had_linear_splitters) = s1_linesplit::line_split(aoi, lines, config)?;

    info!("S2 FeatureBind: binding {} features to {} SubPolygons", features.len(), sub_polygons.len());
    s2_featurebind::feature_bind(&mut sub_polygons, features)?;

    let had_features = !features.is_empty();

    if !had_features {
        info!("no features in AOI; degrading to SubPolygon tiling as tasks (S4-S9 skipped)");
        let tasks: Vec<TaskPolygon> = sub_polygons
            .into_iter()
            .enumerate()
            .map(|(idx, sp)| TaskPolygon {
                taskid: idx as u32,
                geometry: sp.geometry,
                feature_ids: Vec::new(),
                building_count: 0,
                area_m2: sp.area_m2,
            })
            .collect();
        return Ok(SplitResult {
            tasks,
            metadata: RunMetadata {
                aoi_was_multipolygon: aoi.was_multipolygon,
                had_linear_splitters,
                had_features,
                voronoi_retry_count: 0,
            },
        });
    }

    info!("S3 LowCountMerge: merging SubPolygons below {} features", config.min_features);
    let sub_polygons = s3_lowcountmerge::low_count_merge(sub_polygons, config)?;

    info!("S4 Cluster: k-means over {} SubPolygons", sub_polygons.len());
    let clusters = s4_cluster::cluster_all(&sub_polygons, features, config)?;

    info!("S5 Densify: segmentizing clustered feature boundaries");
    let features_by_id: HashMap<u64, &Feature> = features.iter().map(|f| (f.id, f)).collect();
    let densified = s5_densify::densify_clusters(&clusters, &features_by_id, config);

    info!("S6 Voronoi: tessellating {} densified points", densified.len());
    let (cells, voronoi_retry_count) =
        s6_voronoi::voronoi_per_subpolygon(&densified, &sub_polygons, config)?;

    info!("S7 DissolveByCluster: dissolving {} cells", cells.len());
    let preliminary = s7_dissolve::dissolve_by_cluster(cells)?;

    info!("S8 Simplify: re-polygonizing {} preliminary clusters", preliminary.len());
    let mut tasks = s8_simplify::simplify_and_repolygonize(&preliminary, config)?;

    assign_building_counts(&mut tasks, features)?;
    for task in tasks.iter_mut() {
        task.area_m2 = crate::geom::geodesic_area_m2(&task.geometry);
    }

    info!("S9 SmallMerge: merging undersized tasks (N_min={})", config.min_features);
    let mut tasks = s9_smallmerge::small_merge(tasks, config)?;
    tasks.sort_by_key(|t| t.taskid);
    for (idx, task) in tasks.iter_mut().enumerate() {
        task.taskid = idx as u32;
    }

    Ok(SplitResult {
        tasks,
        metadata: RunMetadata {
            aoi_was_multipolygon: aoi.was_multipolygon,
            had_linear_splitters,
            had_features,
            voronoi_retry_count,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn unit_square() -> Aoi {
        Aoi {
            geometry: polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)],
            was_multipolygon: false,
        }
    }

    #[test]
    fn unit_square_with_no_lines_or_features_is_a_single_task() {
        let aoi = unit_square();
        let result = run(&aoi, &[], &[], &SplitConfig::default()).unwrap();
        assert_eq!(result.tasks.len(), 1);
        assert!(!result.metadata.had_linear_splitters);
        assert!(!result.metadata.had_features);
    }

    #[test]
    fn bisecting_line_splits_unit_square_into_two_equal_tasks() {
        let aoi = unit_square();
        let mut tags = crate::types::Tags::new();
        tags.insert("highway".to_string(), "residential".to_string());
        let line = SplitLine {
            geometry: geo::LineString::from(vec![(0.5, 0.0), (0.5, 1.0)]),
            tags,
        };
        let result = run(&aoi, &[line], &[], &SplitConfig::default()).unwrap();
        assert_eq!(result.tasks.len(), 2);
        assert!(result.metadata.had_linear_splitters);
        let aoi_area = crate::geom::geodesic_area_m2(&aoi.geometry);
        for task in &result.tasks {
            assert!((task.area_m2 - aoi_area / 2.0).abs() / aoi_area < 0.05);
        }
    }

    fn building_at(id: u64, x: f64, y: f64) -> Feature {
        let mut tags = crate::types::Tags::new();
        tags.insert("building".to_string(), "yes".to_string());
        Feature {
            id,
            geometry: polygon![
                (x: x - 0.0002, y: y - 0.0002),
                (x: x + 0.0002, y: y - 0.0002),
                (x: x + 0.0002, y: y + 0.0002),
                (x: x - 0.0002, y: y + 0.0002)
            ],
            tags,
        }
    }

    #[test]
    fn five_buildings_close_together_form_a_single_task() {
        let aoi = Aoi {
            geometry: polygon![(x: 0.0, y: 0.0), (x: 0.001, y: 0.0), (x: 0.001, y: 0.001), (x: 0.0, y: 0.001)],
            was_multipolygon: false,
        };
        let features: Vec<Feature> = (0..5)
            .map(|i| building_at(i, 0.0002 + (i as f64) * 0.0001, 0.0005))
            .collect();
        let result = run(&aoi, &[], &features, &SplitConfig::default()).unwrap();
        assert_eq!(result.tasks.len(), 1);
        assert_eq!(result.tasks[0].building_count, 5);
    }

    #[test]
    fn low_count_subpolygon_merges_away_before_clustering_runs() {
        let aoi = Aoi {
            geometry: polygon![(x: 0.0, y: 0.0), (x: 3.0, y: 0.0), (x: 3.0, y: 1.0), (x: 0.0, y: 1.0)],
            was_multipolygon: false,
        };
        let mut tags = crate::types::Tags::new();
        tags.insert("highway".to_string(), "residential".to_string());
        let lines = vec![
            SplitLine { geometry: geo::LineString::from(vec![(1.0, 0.0), (1.0, 1.0)]), tags: tags.clone() },
            SplitLine { geometry: geo::LineString::from(vec![(2.0, 0.0), (2.0, 1.0)]), tags },
        ];
        // 30 buildings only in the third SubPolygon [2,3]; the first two start empty/low-count.
        let features: Vec<Feature> = (0..30)
            .map(|i| building_at(i, 2.0 + 0.02 + (i as f64) * 0.03, 0.5))
            .collect();
        let mut config = SplitConfig::default();
        config.min_features = 5;
        let result = run(&aoi, &lines, &features, &config).unwrap();
        let total_buildings: usize = result.tasks.iter().map(|t| t.building_count).sum();
        assert_eq!(total_buildings, 30);
    }
}

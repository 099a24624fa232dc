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
//! S9 — SmallMerge: merge tasks below size/feature thresholds into the
//! neighbour with the greatest shared boundary length.
use std::collections::{HashMap, HashSet};

use log::debug;

use crate::adjacency::{build_adjacency, shared_boundary_length_m};
use crate::config::SplitConfig;
use crate::error::SplitError;
use crate::geom::backend;
use crate::geom::convert::{geos_to_geo, polygon_to_geos};
use crate::types::TaskPolygon;

fn mean_and_population_stddev(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    (mean, variance.sqrt())
}

pub fn small_merge(
    tasks: Vec<TaskPolygon>,
    config: &SplitConfig,
) -> Result<Vec<TaskPolygon>, SplitError> {
    if tasks.is_empty() {
        return Ok(tasks);
    }

    let areas: Vec<f64> = tasks.iter().map(|t| t.area_m2).collect();
    let (mean, stddev) = mean_and_population_stddev(&areas);
    let a_min = mean - stddev; // may be negative; then the area test is vacuous

    let mut arena: HashMap<u32, TaskPolygon> =
        tasks.into_iter().map(|t| (t.taskid, t)).collect();

    let refs: Vec<(u32, &geo::Polygon<f64>)> =
        arena.iter().map(|(id, t)| (*id, &t.geometry)).collect();
    let mut adjacency = build_adjacency(&refs)?;

    let mut processing_order: Vec<u32> = arena.keys().copied().collect();
    processing_order.sort_unstable();

    let is_small = |t: &TaskPolygon| -> bool {
        (a_min > 0.0 && t.area_m2 < a_min) || t.building_count < config.min_features
    };

    for taskid in processing_order {
        let Some(current) = arena.get(&taskid) else {
            continue;
        };
        if !is_small(current) {
            continue;
        }

        let neighbours: Vec<u32> = adjacency
            .get(&taskid)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default();

        let mut best: Option<(u32, f64)> = None;
        for &candidate_id in &neighbours {
            let candidate = &arena[&candidate_id];
            if is_small(candidate) {
                continue; // only non-small neighbours are eligible merge targets
            }
            let shared_len = shared_boundary_length_m(&arena[&taskid].geometry, &candidate.geometry)?;
            if shared_len <= 0.0 {
                continue;
            }
            let better = match best {
                None => true,
                Some((best_id, best_len)) => {
                    (shared_len, std::cmp::Reverse(candidate_id)) > (best_len, std::cmp::Reverse(best_id))
                }
            };
            if better {
                best = Some((candidate_id, shared_len));
            }
        }

        let Some((target_id, _)) = best else {
            debug!("small task {taskid} has no eligible neighbour; leaving it as-is");
            continue;
        };

        merge_into(&mut arena, &mut adjacency, taskid, target_id)?;
    }

    let mut result: Vec<TaskPolygon> = arena.into_values().collect();
    result.sort_by_key(|t| t.taskid);
    Ok(result)
}

fn merge_into(
    arena: &mut HashMap<u32, TaskPolygon>,
    adjacency: &mut HashMap<u32, HashSet<u32>>,
    victim_id: u32,
    target_id: u32,
) -> Result<(), SplitError> {
    let victim = arena.remove(&victim_id).expect("victim must be present");
    let target = arena.get_mut(&target_id).expect("target must be present");

    let victim_geos = polygon_to_geos(&victim.geometry)?;
    let target_geos = polygon_to_geos(&target.geometry)?;
    let merged_geos = backend::union(&victim_geos, &target_geos)?;
    let merged_geo = geos_to_geo(&merged_geos)?;
    let merged_polys = crate::geom::convert::extract_polygons(&merged_geo);
    let merged_polygon = merged_polys
        .into_iter()
        .max_by(|a, b| {
            crate::geom::geodesic_area_m2(a)
                .partial_cmp(&crate::geom::geodesic_area_m2(b))
                .unwrap()
        })
        .ok_or_else(|| SplitError::InvalidInputGeometry("merge produced no polygon".to_string()))?;

    target.geometry = merged_polygon;
    target.feature_ids.extend(victim.feature_ids);
    target.feature_ids.sort_unstable();
    target.building_count = target.feature_ids.len();
    target.area_m2 = crate::geom::geodesic_area_m2(&target.geometry);

    let victim_neighbours = adjacency.remove(&victim_id).unwrap_or_default();
    for neighbour_id in victim_neighbours {
        if neighbour_id == target_id {
            continue;
        }
        if let Some(set) = adjacency.get_mut(&neighbour_id) {
            set.remove(&victim_id);
            set.insert(target_id);
        }
        adjacency.entry(target_id).or_default().insert(neighbour_id);
    }
    if let Some(set) = adjacency.get_mut(&target_id) {
        set.remove(&victim_id);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn task(taskid: u32, x0: f64, x1: f64, building_count: usize, area_m2: f64) -> TaskPolygon {
        TaskPolygon {
            taskid,
            geometry: polygon![(x: x0, y: 0.0), (x: x1, y: 0.0), (x: x1, y: 1.0), (x: x0, y: 1.0)],
            feature_ids: (0..building_count as u64).collect(),
            building_count,
            area_m2,
        }
    }

    #[test]
    fn task_below_feature_threshold_merges_into_neighbour() {
        let tasks = vec![task(0, 0.0, 1.0, 1, 100.0), task(1, 1.0, 2.0, 20, 100.0)];
        let mut config = SplitConfig::default();
        config.min_features = 5;
        let merged = small_merge(tasks, &config).unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].building_count, 21);
    }

    #[test]
    fn uniform_tasks_are_left_alone() {
        let tasks = vec![task(0, 0.0, 1.0, 10, 100.0), task(1, 1.0, 2.0, 10, 100.0)];
        let config = SplitConfig::default();
        let merged = small_merge(tasks, &config).unwrap();
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn no_eligible_neighbour_leaves_small_task_untouched() {
        let tasks = vec![task(0, 0.0, 1.0, 1, 100.0), task(1, 50.0, 51.0, 20, 100.0)];
        let mut config = SplitConfig::default();
        config.min_features = 5;
        let merged = small_merge(tasks, &config).unwrap();
        assert_eq!(merged.len(), 2);
    }
}

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
//! S3 — LowCountMerge: merge SubPolygons with too few features into a
//! chosen neighbour. Uses an id-arena / tombstone approach: merges are
//! id-level operations that update the winning record and drop the loser,
//! never mutating geometry in place across the whole set.
use std::collections::{HashMap, HashSet};

use log::debug;

use crate::adjacency::{build_adjacency, shared_boundary_length_m};
use crate::config::{MergeTargetRule, SplitConfig};
use crate::error::SplitError;
use crate::geom::backend;
use crate::geom::convert::{geos_to_geo, polygon_to_geos};
use crate::types::SubPolygon;

pub fn low_count_merge(
    sub_polygons: Vec<SubPolygon>,
    config: &SplitConfig,
) -> Result<Vec<SubPolygon>, SplitError> {
    if sub_polygons.is_empty() {
        return Ok(sub_polygons);
    }

    let mut arena: HashMap<u32, SubPolygon> =
        sub_polygons.into_iter().map(|sp| (sp.polyid, sp)).collect();

    let refs: Vec<(u32, &geo::Polygon<f64>)> =
        arena.iter().map(|(id, sp)| (*id, &sp.geometry)).collect();
    let mut adjacency = build_adjacency(&refs)?;

    let mut processing_order: Vec<u32> = arena.keys().copied().collect();
    processing_order.sort_unstable();

    for polyid in processing_order {
        let Some(current) = arena.get(&polyid) else {
            continue; // already merged away as someone else's neighbour
        };
        if current.n() >= config.min_features {
            continue;
        }

        let neighbours: Vec<u32> = adjacency
            .get(&polyid)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default();

        // Canonical rule prefers the neighbour with the greatest feature
        // count; an alternative rule prefers the fewest, exposed only via
        // this switch.
        let feature_count_key = |n: usize| match config.merge_target_rule {
            MergeTargetRule::LargestFeatureCount => n as i64,
            MergeTargetRule::FewestFeatureCount => -(n as i64),
        };

        let mut best: Option<u32> = None;
        for &candidate_id in &neighbours {
            let candidate = &arena[&candidate_id];
            let better = match best {
                None => true,
                Some(best_id) => {
                    let best_poly = &arena[&best_id];
                    (feature_count_key(candidate.n()) as f64, candidate.area_m2, std::cmp::Reverse(candidate_id))
                        > (feature_count_key(best_poly.n()) as f64, best_poly.area_m2, std::cmp::Reverse(best_id))
                }
            };
            if better {
                best = Some(candidate_id);
            }
        }

        let Some(target_id) = best else {
            debug!("SubPolygon {polyid} has no eligible neighbour; retaining as an island");
            continue;
        };

        merge_into(&mut arena, &mut adjacency, polyid, target_id)?;
    }

    let mut result: Vec<SubPolygon> = arena.into_values().collect();
    result.sort_by_key(|sp| sp.polyid);
    Ok(result)
}

fn merge_into(
    arena: &mut HashMap<u32, SubPolygon>,
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
    // Adjacent regions merge into a single polygon by construction; take the
    // largest face if the backend ever returns more than one sliver.
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
    target.area_m2 = crate::geom::geodesic_area_m2(&target.geometry);

    // Reattach the victim's neighbours (minus the victim and the target
    // itself) to the target, and drop the victim from the graph entirely.
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

    fn sub(polyid: u32, x0: f64, x1: f64, n: usize) -> SubPolygon {
        SubPolygon {
            polyid,
            geometry: polygon![(x: x0, y: 0.0), (x: x1, y: 0.0), (x: x1, y: 1.0), (x: x0, y: 1.0)],
            feature_ids: (0..n as u64).collect(),
            area_m2: 0.0,
        }
    }

    #[test]
    fn low_count_island_merges_into_largest_neighbour() {
        let subs = vec![sub(0, 0.0, 1.0, 0), sub(1, 1.0, 2.0, 1), sub(2, 2.0, 3.0, 30)];
        let mut config = SplitConfig::default();
        config.min_features = 5;
        let merged = low_count_merge(subs, &config).unwrap();
        // 0 and 1 both merge toward 2, the largest neighbour by feature count.
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].n(), 31);
    }

    #[test]
    fn above_threshold_subpolygons_are_untouched() {
        let subs = vec![sub(0, 0.0, 1.0, 10), sub(1, 1.0, 2.0, 10)];
        let config = SplitConfig::default();
        let merged = low_count_merge(subs, &config).unwrap();
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn isolated_low_count_subpolygon_is_retained() {
        let subs = vec![sub(0, 0.0, 1.0, 1), sub(1, 100.0, 101.0, 1)];
        let mut config = SplitConfig::default();
        config.min_features = 5;
        let merged = low_count_merge(subs, &config).unwrap();
        assert_eq!(merged.len(), 2);
    }
}

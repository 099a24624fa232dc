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
//! S4 — Cluster: k-means on feature centroids within each SubPolygon, with a
//! deterministic k-means++ seeding so identical inputs always yield
//! identical clusters.
use std::collections::HashMap;

use geo::Point;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::SplitConfig;
use crate::types::{Cluster, ClusterUid, Feature, SubPolygon};

fn squared_dist(a: Point<f64>, b: Point<f64>) -> f64 {
    let dx = a.x() - b.x();
    let dy = a.y() - b.y();
    dx * dx + dy * dy
}

/// k-means++ seeding: pick the first center uniformly, then each subsequent
/// center with probability proportional to its squared distance from the
/// nearest already-chosen center.
fn kmeans_plus_plus_centers(points: &[Point<f64>], k: usize, rng: &mut ChaCha8Rng) -> Vec<Point<f64>> {
    let mut centers = Vec::with_capacity(k);
    let first_idx = rng.gen_range(0..points.len());
    centers.push(points[first_idx]);

    while centers.len() < k {
        let weights: Vec<f64> = points
            .iter()
            .map(|p| {
                centers
                    .iter()
                    .map(|c| squared_dist(*p, *c))
                    .fold(f64::MAX, f64::min)
            })
            .collect();
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            // All remaining points coincide with an existing center; fall
            // back to a uniform pick so we still return k distinct centers.
            let idx = rng.gen_range(0..points.len());
            centers.push(points[idx]);
            continue;
        }
        let mut target = rng.gen_range(0.0..total);
        let mut chosen = points.len() - 1;
        for (idx, w) in weights.iter().enumerate() {
            if target <= *w {
                chosen = idx;
                break;
            }
            target -= w;
        }
        centers.push(points[chosen]);
    }
    centers
}

/// Reassigns the point farthest from its own center, out of whichever
/// cluster currently holds more than one point, into each empty cluster in
/// turn. Lloyd iteration can converge with an unused center when input
/// points coincide or cluster tightly (overlapping/duplicate input buildings
/// are never reconciled); this keeps the cluster count at exactly `k`
/// regardless. Always terminates when `points.len() >= centers.len()`, which
/// holds for every caller since `k = n/T + 1 <= n`.
fn fill_empty_clusters(points: &[Point<f64>], centers: &[Point<f64>], assignments: &mut [usize]) {
    let k = centers.len();
    loop {
        let mut counts = vec![0usize; k];
        for &c in assignments.iter() {
            counts[c] += 1;
        }
        let Some(empty_cid) = counts.iter().position(|&c| c == 0) else {
            break;
        };

        let mut donor_idx = None;
        let mut donor_dist = -1.0;
        for (i, p) in points.iter().enumerate() {
            let c = assignments[i];
            if counts[c] <= 1 {
                continue;
            }
            let d = squared_dist(*p, centers[c]);
            if d > donor_dist {
                donor_dist = d;
                donor_idx = Some(i);
            }
        }
        match donor_idx {
            Some(i) => assignments[i] = empty_cid,
            None => break, // every nonempty cluster holds exactly one point; can't happen when n >= k
        }
    }
}

fn lloyd_iterate(points: &[Point<f64>], centers: &mut [Point<f64>], max_iters: usize) -> Vec<usize> {
    let mut assignments = vec![0usize; points.len()];
    for _ in 0..max_iters {
        let mut changed = false;
        for (i, p) in points.iter().enumerate() {
            let mut best = 0;
            let mut best_dist = f64::MAX;
            for (c_idx, c) in centers.iter().enumerate() {
                let d = squared_dist(*p, *c);
                if d < best_dist {
                    best_dist = d;
                    best = c_idx;
                }
            }
            if assignments[i] != best {
                changed = true;
                assignments[i] = best;
            }
        }
        if !changed {
            break;
        }
        let mut sums = vec![(0.0, 0.0, 0usize); centers.len()];
        for (i, p) in points.iter().enumerate() {
            let c = assignments[i];
            sums[c].0 += p.x();
            sums[c].1 += p.y();
            sums[c].2 += 1;
        }
        for (c_idx, (sx, sy, count)) in sums.into_iter().enumerate() {
            if count > 0 {
                centers[c_idx] = Point::new(sx / count as f64, sy / count as f64);
            }
        }
    }
    assignments
}

/// Clusters a single SubPolygon's features, assuming `n > 0`.
pub fn cluster_subpolygon(
    sub_polygon: &SubPolygon,
    features_by_id: &HashMap<u64, &Feature>,
    config: &SplitConfig,
) -> crate::error::Result<Vec<Cluster>> {
    let n = sub_polygon.n();
    debug_assert!(n > 0);
    let k = n / config.target_cluster_size + 1;

    let mut feature_ids = sub_polygon.feature_ids.clone();
    feature_ids.sort_unstable();
    let points: Vec<Point<f64>> = feature_ids
        .iter()
        .map(|id| features_by_id[id].centroid())
        .collect::<crate::error::Result<_>>()?;

    if k <= 1 || points.len() <= 1 {
        return Ok(vec![Cluster {
            uid: ClusterUid {
                polyid: sub_polygon.polyid,
                cid: 0,
            },
            feature_ids,
        }]);
    }

    // Per-SubPolygon deterministic stream derived from the run seed, so
    // clustering one SubPolygon never perturbs another's random draws.
    let seed = config.kmeans_seed ^ ((sub_polygon.polyid as u64) << 32);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut centers = kmeans_plus_plus_centers(&points, k, &mut rng);
    let mut assignments = lloyd_iterate(&points, &mut centers, 50);
    fill_empty_clusters(&points, &centers, &mut assignments);

    let mut clusters: Vec<Vec<u64>> = vec![Vec::new(); k];
    for (idx, cid) in assignments.into_iter().enumerate() {
        clusters[cid].push(feature_ids[idx]);
    }

    clusters
        .into_iter()
        .enumerate()
        .map(|(cid, mut ids)| {
            ids.sort_unstable();
            Cluster {
                uid: ClusterUid {
                    polyid: sub_polygon.polyid,
                    cid: cid as u32,
                },
                feature_ids: ids,
            }
        })
        .collect()
}

pub fn cluster_all(
    sub_polygons: &[SubPolygon],
    features: &[Feature],
    config: &SplitConfig,
) -> crate::error::Result<Vec<Cluster>> {
    let features_by_id: HashMap<u64, &Feature> = features.iter().map(|f| (f.id, f)).collect();
    let mut out = Vec::new();
    for sp in sub_polygons {
        if sp.n() == 0 {
            continue;
        }
        out.extend(cluster_subpolygon(sp, &features_by_id, config)?);
    }
    Ok(out)
}

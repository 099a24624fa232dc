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
//! S5 — Densify: insert vertices along each clustered Feature's boundary so
//! no segment exceeds δ_seg, then dump the resulting vertices as points
//! tagged with their feature's cluster identity.
use std::collections::HashMap;

use geo::Point;

use crate::config::SplitConfig;
use crate::geom::{densify_polygon, dump_points};
use crate::types::{Cluster, ClusterUid, Feature};

#[derive(Debug, Clone)]
pub struct DensifiedPoint {
    pub point: Point<f64>,
    pub cluster_uid: ClusterUid,
}

pub fn densify_clusters(
    clusters: &[Cluster],
    features_by_id: &HashMap<u64, &Feature>,
    config: &SplitConfig,
) -> Vec<DensifiedPoint> {
    let mut out = Vec::new();
    for cluster in clusters {
        for &feature_id in &cluster.feature_ids {
            let feature = features_by_id[&feature_id];
            let dense = densify_polygon(&feature.geometry, config.segmentize_deg);
            for point in dump_points(&dense) {
                out.push(DensifiedPoint {
                    point,
                    cluster_uid: cluster.uid,
                });
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn building(id: u64) -> Feature {
        let mut tags = crate::types::Tags::new();
        tags.insert("building".to_string(), "yes".to_string());
        Feature {
            id,
            geometry: polygon![(x: 0.0, y: 0.0), (x: 0.01, y: 0.0), (x: 0.01, y: 0.01), (x: 0.0, y: 0.01)],
            tags,
        }
    }

    #[test]
    fn every_point_carries_its_clusters_identity() {
        let feature = building(1);
        let by_id: HashMap<u64, &Feature> = [(1, &feature)].into_iter().collect();
        let cluster = Cluster {
            uid: ClusterUid { polyid: 2, cid: 5 },
            feature_ids: vec![1],
        };
        let config = SplitConfig::default();
        let points = densify_clusters(&[cluster], &by_id, &config);
        assert!(!points.is_empty());
        assert!(points.iter().all(|p| p.cluster_uid == ClusterUid { polyid: 2, cid: 5 }));
    }

    #[test]
    fn densify_increases_point_count_over_raw_dump() {
        let feature = building(1);
        let raw = dump_points(&feature.geometry);
        let by_id: HashMap<u64, &Feature> = [(1, &feature)].into_iter().collect();
        let cluster = Cluster {
            uid: ClusterUid { polyid: 0, cid: 0 },
            feature_ids: vec![1],
        };
        let mut config = SplitConfig::default();
        config.segmentize_deg = 0.001; // coarser than the 0.01-wide test square's edges
        let dense = densify_clusters(&[cluster], &by_id, &config);
        assert!(dense.len() >= raw.len());
    }
}

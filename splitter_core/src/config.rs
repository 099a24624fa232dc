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
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Degrees-per-meter at the equator, used only as a documentation-level default;
/// callers should prefer `meters_to_degrees`, which accounts for latitude.
const DEGREES_PER_METER_EQUATOR: f64 = 1.0 / 111_320.0;

/// Tag predicate deciding which linear features are used as splitters
/// (`split_tags`). Kept as configuration, not a hard-coded filter, so a
/// driver can widen or narrow it without touching the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitTagPredicate {
    /// `highway` values that are *excluded* from the default "all highways" rule.
    pub excluded_highway_classes: HashSet<String>,
    /// Keep any linear feature carrying a `waterway` tag.
    pub include_waterways: bool,
    /// Keep any linear feature carrying a `railway` tag.
    pub include_railways: bool,
}

impl Default for SplitTagPredicate {
    fn default() -> Self {
        SplitTagPredicate {
            excluded_highway_classes: ["service", "pedestrian", "track", "bus_guideway"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            include_waterways: true,
            include_railways: true,
        }
    }
}

impl SplitTagPredicate {
    /// `tags` is the flattened string->string map produced at ingest.
    pub fn matches(&self, tags: &std::collections::HashMap<String, String>) -> bool {
        if let Some(highway) = tags.get("highway") {
            if !self.excluded_highway_classes.contains(highway) {
                return true;
            }
        }
        if self.include_waterways && tags.contains_key("waterway") {
            return true;
        }
        if self.include_railways && tags.contains_key("railway") {
            return true;
        }
        false
    }

    /// True when nothing in this predicate can ever match, i.e. highways are
    /// entirely excluded and neither waterways nor railways are kept. When this
    /// holds and there are no features either, the AOI is returned untouched
    /// as a single task.
    pub fn is_empty(&self) -> bool {
        self.include_waterways == false
            && self.include_railways == false
            && self.excluded_highway_classes.is_empty()
    }
}

/// Strategy for picking the merge target in S3 when a small region has more
/// than one eligible neighbour. The default prefers the neighbour with the
/// largest feature count; the alternative (fewest buildings) is exposed only
/// as an explicit switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergeTargetRule {
    LargestFeatureCount,
    FewestFeatureCount,
}

impl Default for MergeTargetRule {
    fn default() -> Self {
        MergeTargetRule::LargestFeatureCount
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// T: desired features per task.
    pub target_cluster_size: usize,
    /// N_min: low-count / small-task threshold. Defaults to `target_cluster_size / 2`.
    pub min_features: usize,
    /// δ_seg in degrees, after conversion from `segmentize_m`.
    pub segmentize_deg: f64,
    /// τ in degrees, after conversion from `simplify_m`.
    pub simplify_deg: f64,
    pub split_tags: SplitTagPredicate,
    pub kmeans_seed: u64,
    pub merge_target_rule: MergeTargetRule,
    /// Bound on VoronoiNumericFailure retries (doubling segmentize_deg each time).
    pub max_voronoi_retries: u32,
}

impl Default for SplitConfig {
    fn default() -> Self {
        let target_cluster_size = 10;
        SplitConfig {
            target_cluster_size,
            min_features: target_cluster_size / 2,
            segmentize_deg: 0.00004,
            simplify_deg: 0.000075,
            split_tags: SplitTagPredicate::default(),
            kmeans_seed: 0,
            merge_target_rule: MergeTargetRule::default(),
            max_voronoi_retries: 3,
        }
    }
}

impl SplitConfig {
    /// Builds a config from meter-denominated user inputs, converting to degrees
    /// using the geodesic relationship at `aoi_centroid_lat_deg`. Conversion
    /// happens here, at configuration time, not inside the pipeline core.
    pub fn from_meters(
        target_cluster_size: usize,
        segmentize_m: f64,
        simplify_m: f64,
        aoi_centroid_lat_deg: f64,
    ) -> Self {
        let mut cfg = SplitConfig {
            target_cluster_size,
            min_features: (target_cluster_size / 2).max(1),
            ..SplitConfig::default()
        };
        cfg.segmentize_deg = meters_to_degrees(segmentize_m, aoi_centroid_lat_deg);
        cfg.simplify_deg = meters_to_degrees(simplify_m, aoi_centroid_lat_deg);
        cfg
    }
}

/// Converts a distance in meters to degrees of longitude/latitude at the given
/// latitude, using the standard geodesic approximation (WGS84 meridian length
/// of one degree of latitude, corrected for longitudinal shrinkage by cos(lat)).
/// Uses the smaller (more conservative) of the lat/lon conversion so thresholds
/// never under-segmentize/under-simplify near the poles.
pub fn meters_to_degrees(meters: f64, lat_deg: f64) -> f64 {
    let meters_per_deg_lat = 1.0 / DEGREES_PER_METER_EQUATOR;
    let meters_per_deg_lon = meters_per_deg_lat * lat_deg.to_radians().cos().max(1e-6);
    let meters_per_deg = meters_per_deg_lat.min(meters_per_deg_lon);
    meters / meters_per_deg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_min_features_is_half_target() {
        let cfg = SplitConfig::default();
        assert_eq!(cfg.target_cluster_size, 10);
        assert_eq!(cfg.min_features, 5);
    }

    #[test]
    fn meters_to_degrees_at_equator_matches_rough_constant() {
        let deg = meters_to_degrees(111_320.0, 0.0);
        assert!((deg - 1.0).abs() < 1e-6);
    }

    #[test]
    fn meters_to_degrees_shrinks_away_from_equator() {
        let at_equator = meters_to_degrees(1000.0, 0.0);
        let at_60 = meters_to_degrees(1000.0, 60.0);
        assert!(at_60 > at_equator);
    }

    #[test]
    fn default_split_tags_predicate_matches_highway_and_waterway() {
        let pred = SplitTagPredicate::default();
        let mut tags = std::collections::HashMap::new();
        tags.insert("highway".to_string(), "residential".to_string());
        assert!(pred.matches(&tags));

        tags.insert("highway".to_string(), "service".to_string());
        assert!(!pred.matches(&tags));

        let mut waterway_tags = std::collections::HashMap::new();
        waterway_tags.insert("waterway".to_string(), "river".to_string());
        assert!(pred.matches(&waterway_tags));
    }

    #[test]
    fn degrees_per_meter_equator_constant_is_consistent() {
        assert!((DEGREES_PER_METER_EQUATOR * 111_320.0 - 1.0).abs() < 1e-9);
    }
}

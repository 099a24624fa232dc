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
use std::collections::HashMap;

use geo::{LineString, Point, Polygon};

/// Flattened tag map: any nested/non-scalar tag value is JSON-encoded into
/// a string before it reaches the core. The core never sees nested
/// structures.
pub type Tags = HashMap<String, String>;

/// `polyid`, stable for the lifetime of a run, assigned by S1's polygonization order.
pub type PolyId = u32;
/// Local cluster index within a SubPolygon, `cid ∈ [0, k)`.
pub type ClusterId = u32;
/// Final output id, assigned by S8's re-polygonization order.
pub type TaskId = u32;

/// Composite id `polyid "-" cid`, unique across a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterUid {
    pub polyid: PolyId,
    pub cid: ClusterId,
}

impl std::fmt::Display for ClusterUid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.polyid, self.cid)
    }
}

/// The Area of Interest. Invariant: non-empty, simple, valid single polygon
/// (a MultiPolygon input is reduced to its convex hull before this type is built).
#[derive(Debug, Clone)]
pub struct Aoi {
    pub geometry: Polygon<f64>,
    /// Set when the original input was a MultiPolygon, so callers can report it.
    pub was_multipolygon: bool,
}

/// A linear splitter candidate (highway/waterway/railway), already clipped to the AOI.
#[derive(Debug, Clone)]
pub struct SplitLine {
    pub geometry: LineString<f64>,
    pub tags: Tags,
}

/// A mappable building footprint. `tags.building` is guaranteed non-null by
/// the time this type is constructed (ingest filters everything else out).
#[derive(Debug, Clone)]
pub struct Feature {
    pub id: u64,
    pub geometry: Polygon<f64>,
    pub tags: Tags,
}

impl Feature {
    /// Centroid of this Feature's footprint. Building polygons are
    /// externally supplied and never reconciled or validated, so a
    /// zero-area or otherwise degenerate polygon is a data condition, not a
    /// programming error — surfaced as `SplitError::InvalidInputGeometry`
    /// rather than a panic.
    pub fn centroid(&self) -> crate::error::Result<Point<f64>> {
        use geo::Centroid;
        self.geometry.centroid().ok_or_else(|| {
            crate::error::SplitError::InvalidInputGeometry(format!(
                "feature {} has a degenerate geometry with no centroid",
                self.id
            ))
        })
    }
}

/// A connected region of the AOI bounded by SplitLines and the AOI boundary
/// (S1–S3 output). Tiles the AOI exactly with its siblings.
#[derive(Debug, Clone)]
pub struct SubPolygon {
    pub polyid: PolyId,
    pub geometry: Polygon<f64>,
    /// Feature ids assigned to this SubPolygon by S2, in ascending id order.
    pub feature_ids: Vec<u64>,
    pub area_m2: f64,
}

impl SubPolygon {
    pub fn n(&self) -> usize {
        self.feature_ids.len()
    }
}

/// A group of Features sharing a `(polyid, cid)` pair (S4 output).
#[derive(Debug, Clone)]
pub struct Cluster {
    pub uid: ClusterUid,
    pub feature_ids: Vec<u64>,
}

/// Final output polygon, with a stable `taskid` (S8–S9 output).
#[derive(Debug, Clone)]
pub struct TaskPolygon {
    pub taskid: TaskId,
    pub geometry: Polygon<f64>,
    /// Ids of features whose centroid this task contains; `building_count`
    /// is always `feature_ids.len()` and is kept alongside
    /// it purely so the public output doesn't need to re-derive it.
    pub feature_ids: Vec<u64>,
    pub building_count: usize,
    pub area_m2: f64,
}

/// Metadata about the run, separate from the task collection itself, so the
/// tiling invariant (tasks exactly partition the AOI) is easy to state about
/// `tasks` alone.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct RunMetadata {
    pub aoi_was_multipolygon: bool,
    pub had_linear_splitters: bool,
    pub had_features: bool,
    pub voronoi_retry_count: u32,
}

/// The pipeline's final result: the task collection plus run metadata.
#[derive(Debug, Clone)]
pub struct SplitResult {
    pub tasks: Vec<TaskPolygon>,
    pub metadata: RunMetadata,
}

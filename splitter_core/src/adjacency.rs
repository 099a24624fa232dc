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
//! Polygon adjacency graph shared by S3 (LowCountMerge) and S9 (SmallMerge):
//! an arena of polygon records indexed by `polyid`/`taskid`, with adjacency
//! as sets of integer ids, avoiding back-pointers.
//!
//! Candidate neighbour pairs are pruned with an `rstar` R-tree on bounding
//! boxes before the precise GEOS `touches`/intersection test decides whether
//! the shared boundary has positive length.
use std::collections::{HashMap, HashSet};

use geo::{BoundingRect, Polygon};
use rstar::{RTree, RTreeObject, AABB};

use crate::error::SplitError;
use crate::geom::backend;
use crate::geom::convert::polygon_to_geos;
use crate::geom::geodesic_length_m;

#[derive(Clone)]
struct IndexedBox {
    id: u32,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedBox {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Builds the adjacency sets for `polygons` (keyed by an arbitrary but stable
/// id chosen by the caller, e.g. `polyid` or `taskid`). Two polygons are
/// adjacent when they share a boundary of positive length; pure-point
/// (corner) contacts are excluded, per S3/S9's "corner contacts excluded".
pub fn build_adjacency(
    polygons: &[(u32, &Polygon<f64>)],
) -> Result<HashMap<u32, HashSet<u32>>, SplitError> {
    let mut tree_items = Vec::with_capacity(polygons.len());
    for (id, poly) in polygons {
        let rect = poly
            .bounding_rect()
            .ok_or_else(|| SplitError::InvalidInputGeometry(format!("polygon {id} has no bounding box")))?;
        tree_items.push(IndexedBox {
            id: *id,
            envelope: AABB::from_corners(
                [rect.min().x, rect.min().y],
                [rect.max().x, rect.max().y],
            ),
        });
    }
    let tree = RTree::bulk_load(tree_items);

    let by_id: HashMap<u32, &Polygon<f64>> = polygons.iter().map(|(id, p)| (*id, *p)).collect();
    let mut adjacency: HashMap<u32, HashSet<u32>> = HashMap::new();
    for (id, poly) in polygons {
        adjacency.entry(*id).or_default();
        let rect = poly.bounding_rect().unwrap();
        let envelope = AABB::from_corners(
            [rect.min().x, rect.min().y],
            [rect.max().x, rect.max().y],
        );
        for candidate in tree.locate_in_envelope_intersecting(&envelope) {
            if candidate.id == *id {
                continue;
            }
            if adjacency
                .get(id)
                .map(|s| s.contains(&candidate.id))
                .unwrap_or(false)
            {
                continue;
            }
            let other = by_id[&candidate.id];
            if shared_boundary_length_m(poly, other)? > 0.0 {
                adjacency.entry(*id).or_default().insert(candidate.id);
                adjacency.entry(candidate.id).or_default().insert(*id);
            }
        }
    }
    Ok(adjacency)
}

/// Length, in meters, of the shared boundary between two polygons. Zero when
/// the polygons don't touch, or touch only at a single point.
pub fn shared_boundary_length_m(a: &Polygon<f64>, b: &Polygon<f64>) -> Result<f64, SplitError> {
    let geos_a = polygon_to_geos(a)?;
    let geos_b = polygon_to_geos(b)?;
    if !backend::touches(&geos_a, &geos_b)? && !backend::intersects(&geos_a, &geos_b)? {
        return Ok(0.0);
    }
    let boundary_a = backend::boundary(&geos_a)?;
    let boundary_b = backend::boundary(&geos_b)?;
    let shared = backend::intersection(&boundary_a, &boundary_b)?;
    let geo_geom = crate::geom::convert::geos_to_geo(&shared)?;
    Ok(line_length_of(&geo_geom))
}

fn line_length_of(geom: &geo::Geometry<f64>) -> f64 {
    use geo::Geometry;
    match geom {
        Geometry::LineString(ls) => geodesic_length_m(ls),
        Geometry::MultiLineString(mls) => mls.0.iter().map(geodesic_length_m).sum(),
        Geometry::GeometryCollection(gc) => gc.iter().map(line_length_of).sum(),
        // Point-only or empty intersections contribute no boundary length.
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn adjacent_squares_share_a_boundary() {
        let left = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)];
        let right = polygon![(x: 1.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 1.0), (x: 1.0, y: 1.0)];
        let adjacency = build_adjacency(&[(1, &left), (2, &right)]).unwrap();
        assert!(adjacency[&1].contains(&2));
        assert!(adjacency[&2].contains(&1));
    }

    #[test]
    fn corner_touching_squares_are_not_adjacent() {
        let a = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)];
        let b = polygon![(x: 1.0, y: 1.0), (x: 2.0, y: 1.0), (x: 2.0, y: 2.0), (x: 1.0, y: 2.0)];
        let adjacency = build_adjacency(&[(1, &a), (2, &b)]).unwrap();
        assert!(adjacency[&1].is_empty());
        assert!(adjacency[&2].is_empty());
    }

    #[test]
    fn isolated_polygon_has_empty_adjacency() {
        let a = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)];
        let far = polygon![(x: 100.0, y: 100.0), (x: 101.0, y: 100.0), (x: 101.0, y: 101.0), (x: 100.0, y: 101.0)];
        let adjacency = build_adjacency(&[(1, &a), (2, &far)]).unwrap();
        assert!(adjacency[&1].is_empty());
        assert!(adjacency[&2].is_empty());
    }
}

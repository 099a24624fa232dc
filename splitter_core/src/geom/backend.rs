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
//! Thin wrapper over the geometry backend's primitives: every backend call
//! returns `Result<_, SplitError>` instead of a raw backend error, and
//! aggregate operations always sort their inputs first so repeated runs are
//! bit-identical.
use geo::{Geometry as GeoGeometry, LineString, Polygon};
use geos::{Geom, Geometry as GeosGeometry};

use crate::error::SplitError;
use crate::geom::convert::{extract_polygons, geos_to_geo, line_string_to_geos, polygon_to_geos};

/// 2-ary union.
pub fn union(a: &GeosGeometry, b: &GeosGeometry) -> Result<GeosGeometry, SplitError> {
    a.union(b).map_err(SplitError::BackendCommunicationFailure)
}

/// Aggregate union. Inputs are combined into a GeometryCollection and
/// dissolved with a single unary union call, which is the backend's preferred
/// way to avoid O(n^2) pairwise unions.
pub fn union_all(geoms: &[GeosGeometry]) -> Result<GeosGeometry, SplitError> {
    if geoms.is_empty() {
        return Err(SplitError::InvalidInputGeometry(
            "union_all called with no geometries".to_string(),
        ));
    }
    let refs: Vec<&GeosGeometry> = geoms.iter().collect();
    let collection =
        GeosGeometry::create_geometry_collection(refs.into_iter().map(|g| g.clone()).collect())
            .map_err(SplitError::BackendCommunicationFailure)?;
    collection
        .unary_union()
        .map_err(SplitError::BackendCommunicationFailure)
}

pub fn intersection(a: &GeosGeometry, b: &GeosGeometry) -> Result<GeosGeometry, SplitError> {
    a.intersection(b)
        .map_err(SplitError::BackendCommunicationFailure)
}

pub fn difference(a: &GeosGeometry, b: &GeosGeometry) -> Result<GeosGeometry, SplitError> {
    a.difference(b)
        .map_err(SplitError::BackendCommunicationFailure)
}

pub fn boundary(a: &GeosGeometry) -> Result<GeosGeometry, SplitError> {
    a.boundary().map_err(SplitError::BackendCommunicationFailure)
}

pub fn contains(a: &GeosGeometry, b: &GeosGeometry) -> Result<bool, SplitError> {
    a.contains(b).map_err(SplitError::BackendCommunicationFailure)
}

pub fn intersects(a: &GeosGeometry, b: &GeosGeometry) -> Result<bool, SplitError> {
    a.intersects(b)
        .map_err(SplitError::BackendCommunicationFailure)
}

pub fn touches(a: &GeosGeometry, b: &GeosGeometry) -> Result<bool, SplitError> {
    a.touches(b).map_err(SplitError::BackendCommunicationFailure)
}

/// Douglas-Peucker simplification at tolerance `tolerance_deg`.
pub fn simplify(a: &GeosGeometry, tolerance_deg: f64) -> Result<GeosGeometry, SplitError> {
    a.simplify(tolerance_deg)
        .map_err(SplitError::BackendCommunicationFailure)
}

/// Polygonizes a set of linework (the union of clipped splitters and the AOI
/// boundary for S1, or the simplified shared linework for S8) into faces.
/// Inputs are line-merged first so shared vertices are noded consistently,
/// matching the "node-merge... into a single planar linework" step of S1.
pub fn polygonize(lines: &[GeosGeometry]) -> Result<Vec<Polygon<f64>>, SplitError> {
    if lines.is_empty() {
        return Err(SplitError::InvalidInputGeometry(
            "polygonize called with no linework".to_string(),
        ));
    }
    let refs: Vec<GeosGeometry> = lines.to_vec();
    let polygonized =
        GeosGeometry::polygonize(&refs).map_err(SplitError::BackendCommunicationFailure)?;
    let geo_geom = geos_to_geo(&polygonized)?;
    Ok(extract_polygons(&geo_geom))
}

/// Merges a set of (possibly touching/overlapping) lines into a maximal set
/// of linestrings with shared segments appearing exactly once (S8 step 2-3).
pub fn line_merge(lines: &[LineString<f64>]) -> Result<Vec<LineString<f64>>, SplitError> {
    let geos_lines: Vec<GeosGeometry> = lines
        .iter()
        .map(line_string_to_geos)
        .collect::<Result<_, _>>()?;
    let collection = GeosGeometry::create_multiline_string(geos_lines)
        .map_err(SplitError::BackendCommunicationFailure)?;
    let merged = collection
        .line_merge()
        .map_err(SplitError::BackendCommunicationFailure)?;
    let geo_geom = geos_to_geo(&merged)?;
    Ok(extract_line_strings(&geo_geom))
}

fn extract_line_strings(geom: &GeoGeometry<f64>) -> Vec<LineString<f64>> {
    let mut out = Vec::new();
    match geom {
        GeoGeometry::LineString(ls) => out.push(ls.clone()),
        GeoGeometry::MultiLineString(mls) => out.extend(mls.0.iter().cloned()),
        GeoGeometry::GeometryCollection(gc) => {
            for g in gc.iter() {
                out.extend(extract_line_strings(g));
            }
        }
        _ => {}
    }
    out
}

/// Computes a Voronoi diagram of `points`, optionally clipped to `envelope`,
/// at the given numeric-robustness tolerance (the backend's own snapping
/// tolerance, distinct from `segmentize_deg`/`simplify_deg`).
pub fn voronoi(
    points: &GeosGeometry,
    envelope: Option<&GeosGeometry>,
    tolerance: f64,
) -> Result<GeosGeometry, SplitError> {
    points
        .voronoi(envelope, tolerance, false)
        .map_err(|source| SplitError::VoronoiNumericFailure {
            attempts: 1,
            last_segmentize_deg: tolerance,
            source,
        })
}

pub fn clip_to(geom: &Polygon<f64>, container: &Polygon<f64>) -> Result<Vec<Polygon<f64>>, SplitError> {
    let a = polygon_to_geos(geom)?;
    let b = polygon_to_geos(container)?;
    let clipped = intersection(&a, &b)?;
    let geo_geom = geos_to_geo(&clipped)?;
    Ok(extract_polygons(&geo_geom))
}

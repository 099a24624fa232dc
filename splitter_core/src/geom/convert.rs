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
//! geo_types <-> geos::Geometry conversions, via the `geos` crate's own
//! `geo` feature rather than a manual WKT/WKB round-trip.
use geo::{Geometry as GeoGeometry, LineString, MultiPolygon, Point, Polygon};
use geos::{Geom, Geometry as GeosGeometry};

use crate::error::SplitError;

pub fn polygon_to_geos(poly: &Polygon<f64>) -> Result<GeosGeometry, SplitError> {
    let geo_geom = GeoGeometry::Polygon(poly.clone());
    GeosGeometry::try_from(&geo_geom).map_err(SplitError::BackendCommunicationFailure)
}

pub fn multi_polygon_to_geos(mp: &MultiPolygon<f64>) -> Result<GeosGeometry, SplitError> {
    let geo_geom = GeoGeometry::MultiPolygon(mp.clone());
    GeosGeometry::try_from(&geo_geom).map_err(SplitError::BackendCommunicationFailure)
}

pub fn line_string_to_geos(line: &LineString<f64>) -> Result<GeosGeometry, SplitError> {
    let geo_geom = GeoGeometry::LineString(line.clone());
    GeosGeometry::try_from(&geo_geom).map_err(SplitError::BackendCommunicationFailure)
}

pub fn point_to_geos(point: &Point<f64>) -> Result<GeosGeometry, SplitError> {
    let geo_geom = GeoGeometry::Point(*point);
    GeosGeometry::try_from(&geo_geom).map_err(SplitError::BackendCommunicationFailure)
}

pub fn geos_to_geo(geom: &GeosGeometry) -> Result<GeoGeometry<f64>, SplitError> {
    GeoGeometry::try_from(geom).map_err(SplitError::BackendCommunicationFailure)
}

/// Extracts every Polygon from a geos result that may be a bare Polygon,
/// MultiPolygon, or GeometryCollection mixing both in with lower-dimension
/// junk produced by a noisy polygonize/union. Returns every polygon found
/// rather than asserting there is exactly one.
pub fn extract_polygons(geom: &GeoGeometry<f64>) -> Vec<Polygon<f64>> {
    let mut out = Vec::new();
    collect_polygons(geom, &mut out);
    out
}

fn collect_polygons(geom: &GeoGeometry<f64>, out: &mut Vec<Polygon<f64>>) {
    match geom {
        GeoGeometry::Polygon(p) => out.push(p.clone()),
        GeoGeometry::MultiPolygon(mp) => out.extend(mp.0.iter().cloned()),
        GeoGeometry::GeometryCollection(gc) => {
            for g in gc.iter() {
                collect_polygons(g, out);
            }
        }
        _ => {}
    }
}

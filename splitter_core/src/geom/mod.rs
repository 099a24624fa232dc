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
pub mod backend;
pub mod convert;

use geo::{Coord, LineString, Point, Polygon};
use geo::algorithm::geodesic_area::GeodesicArea;
use geo::algorithm::geodesic_length::GeodesicLength;

/// Geodesic area in square meters. GEOS itself has no notion of a geographic
/// CRS (it treats every coordinate as planar), so area/length use the `geo`
/// crate's ellipsoidal algorithms directly rather than round-tripping through
/// the GEOS backend. Degrees are never assumed equal to meters.
pub fn geodesic_area_m2(poly: &Polygon<f64>) -> f64 {
    poly.geodesic_area_unsigned()
}

pub fn geodesic_length_m(line: &LineString<f64>) -> f64 {
    line.geodesic_length()
}

/// Densify (segmentize): inserts vertices along every ring/line so that no
/// segment exceeds `max_segment_deg`, per S5. `max_segment_deg` is compared
/// against planar (degree-space) segment length rather than geodesic length:
/// δ_seg is a coordinate-space threshold tuned against the backend's Voronoi
/// numerical-robustness floor.
pub fn densify_line_string(line: &LineString<f64>, max_segment_deg: f64) -> LineString<f64> {
    if max_segment_deg <= 0.0 || line.0.len() < 2 {
        return line.clone();
    }
    let mut out: Vec<Coord<f64>> = Vec::with_capacity(line.0.len());
    for window in line.0.windows(2) {
        let (a, b) = (window[0], window[1]);
        out.push(a);
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let seg_len = (dx * dx + dy * dy).sqrt();
        if seg_len > max_segment_deg {
            let n_extra = (seg_len / max_segment_deg).ceil() as usize;
            for i in 1..n_extra {
                let t = i as f64 / n_extra as f64;
                out.push(Coord {
                    x: a.x + dx * t,
                    y: a.y + dy * t,
                });
            }
        }
    }
    if let Some(&last) = line.0.last() {
        out.push(last);
    }
    LineString::from(out)
}

pub fn densify_polygon(poly: &Polygon<f64>, max_segment_deg: f64) -> Polygon<f64> {
    let exterior = densify_line_string(poly.exterior(), max_segment_deg);
    let interiors: Vec<LineString<f64>> = poly
        .interiors()
        .iter()
        .map(|r| densify_line_string(r, max_segment_deg))
        .collect();
    Polygon::new(exterior, interiors)
}

/// Dump-points: every vertex of a (densified) polygon's exterior ring, tagged
/// by the caller with cluster identity. The closing vertex (equal to the
/// first) is dropped so each physical point appears exactly once.
pub fn dump_points(poly: &Polygon<f64>) -> Vec<Point<f64>> {
    let ext = poly.exterior();
    let n = ext.0.len();
    if n == 0 {
        return Vec::new();
    }
    // Exterior rings are closed (first == last); skip the duplicate.
    ext.0[..n.saturating_sub(1)]
        .iter()
        .map(|c| Point::new(c.x, c.y))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn densify_inserts_intermediate_vertices() {
        let ls = LineString::from(vec![(0.0, 0.0), (1.0, 0.0)]);
        let dense = densify_line_string(&ls, 0.3);
        assert!(dense.0.len() > 2);
        for window in dense.0.windows(2) {
            let dx = window[1].x - window[0].x;
            let dy = window[1].y - window[0].y;
            assert!((dx * dx + dy * dy).sqrt() <= 0.3 + 1e-9);
        }
    }

    #[test]
    fn densify_is_noop_below_threshold() {
        let ls = LineString::from(vec![(0.0, 0.0), (0.1, 0.0)]);
        let dense = densify_line_string(&ls, 1.0);
        assert_eq!(dense.0.len(), 2);
    }

    #[test]
    fn dump_points_drops_the_closing_duplicate() {
        let poly = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)];
        let pts = dump_points(&poly);
        assert_eq!(pts.len(), 4);
    }

    #[test]
    fn geodesic_area_of_unit_square_near_equator_is_plausible() {
        let poly = polygon![(x: 0.0, y: 0.0), (x: 0.001, y: 0.0), (x: 0.001, y: 0.001), (x: 0.0, y: 0.001)];
        let area = geodesic_area_m2(&poly);
        // ~0.001 deg ~ 111m at the equator, so area should be roughly 111m^2, generously bounded.
        assert!(area > 5_000.0 && area < 20_000.0, "area was {}", area);
    }
}

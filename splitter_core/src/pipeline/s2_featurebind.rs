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
//! S2 — FeatureBind: assign each feature to exactly one SubPolygon by
//! centroid containment, with a deterministic boundary tiebreak.
use crate::error::SplitError;
use crate::geom::backend;
use crate::geom::convert::{point_to_geos, polygon_to_geos};
use crate::types::{Feature, SubPolygon};

pub fn feature_bind(
    sub_polygons: &mut [SubPolygon],
    features: &[Feature],
) -> Result<(), SplitError> {
    // Stable order regardless of caller-supplied feature order, so repeated
    // runs over identical inputs bind features identically.
    let mut sorted_ids: Vec<u64> = features.iter().map(|f| f.id).collect();
    sorted_ids.sort_unstable();

    let mut geos_polys = Vec::with_capacity(sub_polygons.len());
    for sp in sub_polygons.iter() {
        geos_polys.push(polygon_to_geos(&sp.geometry)?);
    }

    let by_id: std::collections::HashMap<u64, &Feature> =
        features.iter().map(|f| (f.id, f)).collect();

    for sp in sub_polygons.iter_mut() {
        sp.feature_ids.clear();
    }

    for id in sorted_ids {
        let feature = by_id[&id];
        let centroid = feature.centroid()?;
        let centroid_geos = point_to_geos(&centroid)?;

        let mut assigned: Option<usize> = None;
        for (idx, poly) in geos_polys.iter().enumerate() {
            if backend::contains(poly, &centroid_geos)? {
                assigned = Some(idx);
                break;
            }
        }
        if assigned.is_none() {
            // On a shared boundary: `contains` excludes it everywhere, so fall
            // back to `intersects`, taking the lowest polyid.
            for (idx, poly) in geos_polys.iter().enumerate() {
                if backend::intersects(poly, &centroid_geos)? {
                    assigned = Some(idx);
                    break;
                }
            }
        }

        if let Some(idx) = assigned {
            sub_polygons[idx].feature_ids.push(id);
        }
        // A centroid entirely outside every SubPolygon (can only happen with a
        // malformed tiling) is silently dropped rather than failing the run.
    }

    for sp in sub_polygons.iter_mut() {
        sp.feature_ids.sort_unstable();
        sp.area_m2 = crate::geom::geodesic_area_m2(&sp.geometry);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn square(x0: f64, x1: f64) -> geo::Polygon<f64> {
        polygon![(x: x0, y: 0.0), (x: x1, y: 0.0), (x: x1, y: 1.0), (x: x0, y: 1.0)]
    }

    fn building_at(id: u64, x: f64, y: f64) -> Feature {
        let mut tags = crate::types::Tags::new();
        tags.insert("building".to_string(), "yes".to_string());
        Feature {
            id,
            geometry: polygon![(x: x - 0.01, y: y - 0.01), (x: x + 0.01, y: y - 0.01), (x: x + 0.01, y: y + 0.01), (x: x - 0.01, y: y + 0.01)],
            tags,
        }
    }

    #[test]
    fn assigns_features_to_the_containing_subpolygon() {
        let mut subs = vec![
            SubPolygon { polyid: 0, geometry: square(0.0, 1.0), feature_ids: vec![], area_m2: 0.0 },
            SubPolygon { polyid: 1, geometry: square(1.0, 2.0), feature_ids: vec![], area_m2: 0.0 },
        ];
        let features = vec![building_at(1, 0.5, 0.5), building_at(2, 1.5, 0.5)];
        feature_bind(&mut subs, &features).unwrap();
        assert_eq!(subs[0].feature_ids, vec![1]);
        assert_eq!(subs[1].feature_ids, vec![2]);
    }

    #[test]
    fn boundary_centroid_breaks_tie_to_lowest_polyid() {
        let mut subs = vec![
            SubPolygon { polyid: 0, geometry: square(0.0, 1.0), feature_ids: vec![], area_m2: 0.0 },
            SubPolygon { polyid: 1, geometry: square(1.0, 2.0), feature_ids: vec![], area_m2: 0.0 },
        ];
        // A feature whose centroid lands exactly on the shared edge x=1.
        let mut tags = crate::types::Tags::new();
        tags.insert("building".to_string(), "yes".to_string());
        let feature = Feature {
            id: 1,
            geometry: polygon![(x: 0.9, y: 0.4), (x: 1.1, y: 0.4), (x: 1.1, y: 0.6), (x: 0.9, y: 0.6)],
            tags,
        };
        feature_bind(&mut subs, &[feature]).unwrap();
        assert_eq!(subs[0].feature_ids, vec![1]);
        assert!(subs[1].feature_ids.is_empty());
    }
}

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
//! S7 — DissolveByCluster: union all Voronoi cells sharing a clusteruid into
//! one preliminary polygon per cluster.
use std::collections::BTreeMap;

use crate::error::SplitError;
use crate::geom::backend;
use crate::geom::convert::{geos_to_geo, polygon_to_geos};
use crate::pipeline::s6_voronoi::VoronoiCell;
use crate::types::ClusterUid;

pub struct PreliminaryClusterPolygon {
    pub cluster_uid: ClusterUid,
    pub geometry: geo::Polygon<f64>,
}

pub fn dissolve_by_cluster(
    cells: Vec<VoronoiCell>,
) -> Result<Vec<PreliminaryClusterPolygon>, SplitError> {
    // BTreeMap keeps clusteruid iteration order deterministic without an
    // extra sort pass.
    let mut by_cluster: BTreeMap<ClusterUid, Vec<geo::Polygon<f64>>> = BTreeMap::new();
    for cell in cells {
        by_cluster.entry(cell.cluster_uid).or_default().push(cell.geometry);
    }

    let mut out = Vec::with_capacity(by_cluster.len());
    for (cluster_uid, polys) in by_cluster {
        let geos_polys: Vec<geos::Geometry> = polys
            .iter()
            .map(polygon_to_geos)
            .collect::<Result<_, _>>()?;
        let dissolved = backend::union_all(&geos_polys)?;
        let geo_geom = geos_to_geo(&dissolved)?;
        let merged_polys = crate::geom::convert::extract_polygons(&geo_geom);
        let merged = merged_polys
            .into_iter()
            .max_by(|a, b| {
                crate::geom::geodesic_area_m2(a)
                    .partial_cmp(&crate::geom::geodesic_area_m2(b))
                    .unwrap()
            })
            .ok_or_else(|| {
                SplitError::InvalidInputGeometry(format!(
                    "dissolve of cluster {cluster_uid} produced no polygon"
                ))
            })?;
        out.push(PreliminaryClusterPolygon {
            cluster_uid,
            geometry: merged,
        });
    }
    Ok(out)
}

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
//! GeoJSON decode/encode and tag flattening, kept out of `splitter_core`
//! entirely as a thin edge around it.
use anyhow::{anyhow, Context, Result};
use geo::ConvexHull;
use geojson::GeoJson;
use splitter_core::types::{Aoi, Feature, SplitLine, Tags};
use splitter_core::types::TaskPolygon;

fn geojson_geometry_to_geo(geom: &geojson::Geometry) -> Result<geo_types::Geometry<f64>> {
    geo_types::Geometry::<f64>::try_from(geom)
        .map_err(|e| anyhow!("unsupported or invalid GeoJSON geometry: {e}"))
}

/// Reduces any of `Polygon`, `Feature{Polygon|MultiPolygon}`,
/// `FeatureCollection` (single member), or `MultiPolygon` to a single
/// `Aoi`, taking the convex hull for multipolygon input.
pub fn decode_aoi(raw: &str) -> Result<Aoi> {
    let parsed: GeoJson = raw.parse().context("AOI input is not valid GeoJSON")?;

    let geometry = match parsed {
        GeoJson::Geometry(g) => g,
        GeoJson::Feature(f) => f
            .geometry
            .ok_or_else(|| anyhow!("AOI Feature has no geometry"))?,
        GeoJson::FeatureCollection(fc) => {
            if fc.features.len() != 1 {
                return Err(anyhow!(
                    "AOI FeatureCollection must have exactly one member, found {}",
                    fc.features.len()
                ));
            }
            fc.features
                .into_iter()
                .next()
                .unwrap()
                .geometry
                .ok_or_else(|| anyhow!("AOI Feature has no geometry"))?
        }
    };

    let geo_geom = geojson_geometry_to_geo(&geometry)?;
    match geo_geom {
        geo_types::Geometry::Polygon(p) => Ok(Aoi {
            geometry: p,
            was_multipolygon: false,
        }),
        geo_types::Geometry::MultiPolygon(mp) => Ok(Aoi {
            geometry: mp.convex_hull(),
            was_multipolygon: true,
        }),
        other => Err(anyhow!(
            "AOI geometry must be a Polygon or MultiPolygon, found {:?}",
            other
        )),
    }
}

fn flatten_properties(properties: &Option<serde_json::Map<String, serde_json::Value>>) -> Tags {
    match properties {
        Some(map) => splitter_core::tags::normalize_tags(&serde_json::Value::Object(map.clone())),
        None => Tags::new(),
    }
}

/// Decodes a GeoJSON `FeatureCollection` of linear splitter candidates.
/// Tag filtering against `split_tags` happens inside the core (S1); this
/// function only flattens tags and converts geometry.
pub fn decode_lines(raw: &str) -> Result<Vec<SplitLine>> {
    let parsed: GeoJson = raw.parse().context("linear feature input is not valid GeoJSON")?;
    let GeoJson::FeatureCollection(fc) = parsed else {
        return Err(anyhow!("linear feature input must be a FeatureCollection"));
    };

    let mut out = Vec::with_capacity(fc.features.len());
    for feature in fc.features {
        let Some(geometry) = feature.geometry else {
            continue;
        };
        let tags = flatten_properties(&feature.properties);
        match geojson_geometry_to_geo(&geometry)? {
            geo_types::Geometry::LineString(ls) => out.push(SplitLine { geometry: ls, tags }),
            geo_types::Geometry::MultiLineString(mls) => {
                for ls in mls.0 {
                    out.push(SplitLine {
                        geometry: ls,
                        tags: tags.clone(),
                    });
                }
            }
            other => {
                return Err(anyhow!(
                    "linear feature geometry must be a LineString or MultiLineString, found {:?}",
                    other
                ))
            }
        }
    }
    Ok(out)
}

/// Decodes a GeoJSON `FeatureCollection` of building footprints, retaining
/// only those with a non-null `building` tag. Each retained
/// feature is assigned a stable id by ascending decode order.
pub fn decode_features(raw: &str) -> Result<Vec<Feature>> {
    let parsed: GeoJson = raw.parse().context("building feature input is not valid GeoJSON")?;
    let GeoJson::FeatureCollection(fc) = parsed else {
        return Err(anyhow!("building feature input must be a FeatureCollection"));
    };

    let mut out = Vec::with_capacity(fc.features.len());
    let mut next_id = 0u64;
    for feature in fc.features {
        let Some(geometry) = feature.geometry else {
            continue;
        };
        let tags = flatten_properties(&feature.properties);
        if !splitter_core::tags::has_building_tag(&tags) {
            continue;
        }
        let geom = match geojson_geometry_to_geo(&geometry)? {
            geo_types::Geometry::Polygon(p) => p,
            geo_types::Geometry::MultiPolygon(mp) => mp.convex_hull(),
            other => {
                return Err(anyhow!(
                    "building feature geometry must be a Polygon or MultiPolygon, found {:?}",
                    other
                ))
            }
        };
        out.push(Feature {
            id: next_id,
            geometry: geom,
            tags,
        });
        next_id += 1;
    }
    Ok(out)
}

/// Encodes the task polygon collection as a GeoJSON `FeatureCollection`,
/// ascending `taskid`, properties `{"building_count": integer}` only
/// No other properties are guaranteed.
pub fn encode_tasks(tasks: &[TaskPolygon]) -> geojson::FeatureCollection {
    let mut sorted: Vec<&TaskPolygon> = tasks.iter().collect();
    sorted.sort_by_key(|t| t.taskid);

    let features = sorted
        .into_iter()
        .map(|task| {
            let geom = geo_types::Geometry::Polygon(task.geometry.clone());
            let mut properties = serde_json::Map::new();
            properties.insert(
                "building_count".to_string(),
                serde_json::Value::from(task.building_count),
            );
            geojson::Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::from(&geom)),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    geojson::FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_bare_polygon_aoi() {
        let raw = r#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,1],[0,0]]]}"#;
        let aoi = decode_aoi(raw).unwrap();
        assert!(!aoi.was_multipolygon);
    }

    #[test]
    fn decodes_a_multipolygon_aoi_via_convex_hull() {
        let raw = r#"{"type":"MultiPolygon","coordinates":[
            [[[0,0],[1,0],[1,1],[0,1],[0,0]]],
            [[[2,0],[3,0],[3,1],[2,1],[2,0]]]
        ]}"#;
        let aoi = decode_aoi(raw).unwrap();
        assert!(aoi.was_multipolygon);
    }

    #[test]
    fn rejects_a_feature_collection_with_more_than_one_member() {
        let raw = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{},"geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,1],[0,0]]]}},
            {"type":"Feature","properties":{},"geometry":{"type":"Polygon","coordinates":[[[2,0],[3,0],[3,1],[2,1],[2,0]]]}}
        ]}"#;
        assert!(decode_aoi(raw).is_err());
    }

    #[test]
    fn decode_features_drops_non_building_tagged_features() {
        let raw = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"building":"yes"},"geometry":{"type":"Polygon","coordinates":[[[0,0],[0.01,0],[0.01,0.01],[0,0.01],[0,0]]]}},
            {"type":"Feature","properties":{"highway":"residential"},"geometry":{"type":"Polygon","coordinates":[[[1,0],[1.01,0],[1.01,0.01],[1,0.01],[1,0]]]}}
        ]}"#;
        let features = decode_features(raw).unwrap();
        assert_eq!(features.len(), 1);
    }

    #[test]
    fn encode_tasks_sorts_by_taskid_and_includes_building_count() {
        let tasks = vec![
            TaskPolygon {
                taskid: 1,
                geometry: geo::polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)],
                feature_ids: vec![1, 2],
                building_count: 2,
                area_m2: 0.0,
            },
            TaskPolygon {
                taskid: 0,
                geometry: geo::polygon![(x: 1.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 1.0), (x: 1.0, y: 1.0)],
                feature_ids: vec![],
                building_count: 0,
                area_m2: 0.0,
            },
        ];
        let fc = encode_tasks(&tasks);
        assert_eq!(fc.features.len(), 2);
        let first_props = fc.features[0].properties.as_ref().unwrap();
        assert_eq!(first_props.get("building_count").unwrap(), &serde_json::Value::from(0));
    }
}

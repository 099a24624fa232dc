// Full pipeline runs through the public `splitter_core::run` entry point:
// two clusters separated by distance, and a bisecting road over a building
// grid.
use geo::polygon;
use splitter_core::config::SplitConfig;
use splitter_core::types::{Aoi, Feature, SplitLine, Tags};

fn building_at(id: u64, x: f64, y: f64) -> Feature {
    let mut tags = Tags::new();
    tags.insert("building".to_string(), "yes".to_string());
    Feature {
        id,
        geometry: polygon![
            (x: x - 0.0002, y: y - 0.0002),
            (x: x + 0.0002, y: y - 0.0002),
            (x: x + 0.0002, y: y + 0.0002),
            (x: x - 0.0002, y: y + 0.0002)
        ],
        tags,
    }
}

#[test]
fn two_clusters_separated_by_200m_form_two_tasks() {
    let aoi = Aoi {
        geometry: polygon![(x: 0.0, y: 0.0), (x: 0.01, y: 0.0), (x: 0.01, y: 0.005), (x: 0.0, y: 0.005)],
        was_multipolygon: false,
    };
    let mut features = Vec::new();
    let mut id = 0u64;
    for i in 0..12 {
        features.push(building_at(id, 0.0008 + (i as f64) * 0.00005, 0.0015));
        id += 1;
    }
    for i in 0..12 {
        features.push(building_at(id, 0.0072 + (i as f64) * 0.00005, 0.0035));
        id += 1;
    }

    let config = SplitConfig::default();
    let result = splitter_core::run(&aoi, &[], &features, &config).unwrap();

    let total_buildings: usize = result.tasks.iter().map(|t| t.building_count).sum();
    assert_eq!(total_buildings, 24);
    // Every task meets the post-SmallMerge feature floor.
    for task in &result.tasks {
        assert!(task.building_count >= config.min_features || result.tasks.len() == 1);
    }
}

#[test]
fn bisecting_road_over_a_building_grid_preserves_the_boundary() {
    let aoi = Aoi {
        geometry: polygon![(x: 0.0, y: 0.0), (x: 0.02, y: 0.0), (x: 0.02, y: 0.02), (x: 0.0, y: 0.02)],
        was_multipolygon: false,
    };
    let mut road_tags = Tags::new();
    road_tags.insert("highway".to_string(), "residential".to_string());
    let road = SplitLine {
        geometry: geo::LineString::from(vec![(0.01, 0.0), (0.01, 0.02)]),
        tags: road_tags,
    };

    let mut features = Vec::new();
    let mut id = 0u64;
    for row in 0..5 {
        for col in 0..10 {
            let x = 0.001 + (col as f64) * 0.0019;
            let y = 0.002 + (row as f64) * 0.0036;
            features.push(building_at(id, x, y));
            id += 1;
        }
    }
    assert_eq!(features.len(), 50);

    let config = SplitConfig::default();
    let result = splitter_core::run(&aoi, std::slice::from_ref(&road), &features, &config).unwrap();

    assert!(result.metadata.had_linear_splitters);
    let total_buildings: usize = result.tasks.iter().map(|t| t.building_count).sum();
    assert_eq!(total_buildings, 50);
}

//! Integration tests for road building

mod common;

use std::collections::BTreeSet;

use scenariogen::core::rng::Rng;
use scenariogen::core::types::Position;
use scenariogen::gen::{OccupancyGrid, TileState, Zone, ZoneFiller};
use scenariogen::map::ScenarioMap;
use scenariogen::template::{TemplateZoneType, ZoneOptions};

const SIZE: i32 = 48;

/// A zone whose whole area is already carved free, with road nodes at the
/// corners of a 10x10 rectangle.
fn road_env() -> (Zone, OccupancyGrid, ScenarioMap) {
    let mut zone = Zone::new(0);
    let mut grid = OccupancyGrid::new(SIZE);

    for x in 5..25 {
        for y in 5..25 {
            let tile = Position::new(x, y);
            grid.set_zone_id(tile, 0);
            grid.set_occupied(tile, TileState::Free);
            zone.tile_info.insert(tile);
        }
    }

    for corner in [
        Position::new(10, 10),
        Position::new(20, 10),
        Position::new(10, 20),
        Position::new(20, 20),
    ] {
        zone.road_nodes.insert(corner);
    }

    (zone, grid, ScenarioMap::new("t", "t", SIZE))
}

#[test]
fn four_nodes_make_a_three_road_spanning_tree() {
    let (mut zone, mut grid, mut map) = road_env();
    let options = ZoneOptions::new(0, TemplateZoneType::Treasure);
    let settings = common::settings();
    let catalogs = common::catalogs();
    let mut rng = Rng::new(1);

    ZoneFiller::new(
        &mut zone, &options, &settings, &catalogs, &mut map, &mut grid, &mut rng, 1,
    )
    .connect_roads();

    assert_eq!(zone.roads.len(), 3, "spanning tree over 4 nodes has 3 edges");

    let mut covered: BTreeSet<Position> = BTreeSet::new();
    for road in &zone.roads {
        covered.insert(road.source);

        // Roads never step diagonally
        let mut previous = None;
        for &tile in &road.path {
            assert!(grid.is_road(tile));
            assert!(!map.tile(tile).is_water(), "road runs through water");
            covered.insert(tile);

            if let Some(previous) = previous {
                let delta: Position = tile - previous;
                assert!(
                    (delta.x == 0) != (delta.y == 0),
                    "diagonal road step {previous} -> {tile}"
                );
            }
            previous = Some(tile);
        }
    }

    // Every node ends up on the road network
    for node in &zone.road_nodes {
        assert!(
            grid.is_road(*node),
            "road node {node} is not on the network"
        );
    }
    assert!(covered.len() >= 20, "roads actually span the rectangle");
}

#[test]
fn road_building_respects_the_roads_setting() {
    let (mut zone, mut grid, mut map) = road_env();
    let options = ZoneOptions::new(0, TemplateZoneType::Treasure);
    let mut settings = common::settings();
    settings.roads = 0;
    let catalogs = common::catalogs();
    let mut rng = Rng::new(1);

    ZoneFiller::new(
        &mut zone, &options, &settings, &catalogs, &mut map, &mut grid, &mut rng, 1,
    )
    .connect_roads();

    assert!(zone.roads.is_empty());
}

#[test]
fn single_node_builds_nothing() {
    let (mut zone, mut grid, mut map) = road_env();
    zone.road_nodes = [Position::new(10, 10)].into_iter().collect();
    let options = ZoneOptions::new(0, TemplateZoneType::Treasure);
    let settings = common::settings();
    let catalogs = common::catalogs();
    let mut rng = Rng::new(1);

    ZoneFiller::new(
        &mut zone, &options, &settings, &catalogs, &mut map, &mut grid, &mut rng, 1,
    )
    .connect_roads();

    assert!(zone.roads.is_empty());
}

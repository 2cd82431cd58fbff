//! Integration tests for the zone fill pipeline

mod common;

use std::collections::{BTreeSet, VecDeque};

use scenariogen::catalog::ResourceType;
use scenariogen::core::rng::Rng;
use scenariogen::core::types::{Position, RandomValue, VPosition};
use scenariogen::gen::{OccupancyGrid, TileState, Zone, ZoneFiller};
use scenariogen::map::{FortKind, GroundType, ScenarioMap, ScenarioObject};
use scenariogen::template::{
    GroupInfo, MapTemplate, MerchantInfo, NeutralStacksInfo, RuinInfo, TemplateContents,
    TemplateZoneType, ZoneBorderType, ZoneConnection, ZoneOptions,
};

const SIZE: i32 = 48;

fn capital_template() -> MapTemplate {
    let mut zone = common::start_zone(0);
    zone.capital.garrison.value = RandomValue::new(300, 300);
    common::single_zone_template(zone)
}

#[test]
fn capital_is_placed_at_zone_center() {
    let catalogs = common::catalogs();
    let template = capital_template();
    let scenario = common::generate_single(&template, &catalogs, 1, SIZE).unwrap();

    let capital = scenario
        .map
        .objects()
        .find_map(|object| match object {
            ScenarioObject::Fortification(fort) if fort.kind == FortKind::Capital => Some(fort),
            _ => None,
        })
        .expect("capital exists");

    // Center of a 48x48 map is (24, 24); a 5x5 capital anchors at -(2, 2)
    assert_eq!(capital.element.position(), Position::new(22, 22));

    let entrance = capital.element.entrance();
    assert_eq!(entrance, Position::new(24, 26));

    // Guardian holds the center garrison slot
    assert!(capital.garrison.slot(2).is_some());

    // The visitor stack is stationed inside
    let visitor = capital.visitor_stack.expect("starting stack");
    match scenario.map.object(visitor) {
        Some(ScenarioObject::Stack(stack)) => assert_eq!(stack.inside, Some(capital.id)),
        other => panic!("visitor stack missing: {other:?}"),
    }

    let zone = &scenario.zones[&0];
    assert!(zone.road_nodes.contains(&entrance));
    assert!(
        zone.free_paths
            .iter()
            .any(|tile| tile.chebyshev_distance(entrance) <= 1),
        "free paths must reach the capital entrance"
    );
}

#[test]
fn first_crystals_stay_close_to_the_capital() {
    let catalogs = common::catalogs();

    let mut successes = 0;
    let seeds = 1..=10u32;
    let total = seeds.clone().count();

    for seed in seeds {
        let mut zone = common::start_zone(0);
        zone.capital.garrison.value = RandomValue::new(200, 200);
        zone.mines.insert(ResourceType::Gold, 1);
        zone.mines.insert(ResourceType::LifeMana, 1);
        let template = common::single_zone_template(zone);

        let scenario = common::generate_single(&template, &catalogs, seed, SIZE).unwrap();

        let entrance = scenario
            .map
            .objects()
            .find_map(|object| match object {
                ScenarioObject::Fortification(fort) => Some(fort.element.entrance()),
                _ => None,
            })
            .expect("capital exists");

        let crystals: Vec<Position> = scenario
            .map
            .objects()
            .filter_map(|object| match object {
                ScenarioObject::Crystal(crystal) => Some(crystal.element.position()),
                _ => None,
            })
            .collect();
        assert_eq!(crystals.len(), 2, "seed {seed}: both crystals placed");

        if crystals
            .iter()
            .all(|&position| position.chebyshev_distance(entrance) <= 12)
        {
            successes += 1;
        }
    }

    assert!(
        successes * 10 >= total * 9,
        "close crystals within radius 12 in only {successes}/{total} seeds"
    );
}

#[test]
fn junction_zone_links_entry_to_its_site() {
    let catalogs = common::catalogs();

    let mut left = ZoneOptions::new(0, TemplateZoneType::Treasure);
    left.center = VPosition::new(0.25, 0.5);

    let mut junction = ZoneOptions::new(1, TemplateZoneType::Junction);
    junction.center = VPosition::new(0.75, 0.5);
    let mut merchant = MerchantInfo {
        name: String::new(),
        description: String::new(),
        items: Default::default(),
        guard: GroupInfo::default(),
        ai_priority: 3,
    };
    merchant.items.value = RandomValue::new(200, 400);
    junction.merchants.push(merchant);

    let mut contents = TemplateContents::default();
    contents.zones.insert(0, left);
    contents.zones.insert(1, junction);
    contents.connections.push(ZoneConnection {
        from: 0,
        to: 1,
        size: 1.0,
        guard: GroupInfo::default(),
    });
    let template = MapTemplate { settings: common::settings(), contents };

    let scenario = common::generate_split(&template, &catalogs, 1, SIZE).unwrap();

    let sites: Vec<_> = scenario
        .map
        .objects()
        .filter_map(|object| match object {
            ScenarioObject::Site(site) => Some(site),
            _ => None,
        })
        .collect();
    assert_eq!(sites.len(), 1);
    let site = sites[0];

    // The site entrance must be 4-connected to the junction's entry side
    // over walkable tiles
    let passable = |position: Position| {
        scenario.grid.is_free(position)
            || scenario.grid.is_road(position)
            || scenario.map.tile(position).visitable
    };

    let entrance = site.element.entrance();
    let start = Position::new(entrance.x, entrance.y + 1);
    assert!(passable(start), "tile in front of the site entrance is walkable");

    let mut visited: BTreeSet<Position> = BTreeSet::new();
    let mut queue = VecDeque::from([start]);
    visited.insert(start);
    let mut reached_entry_side = false;
    while let Some(tile) = queue.pop_front() {
        if tile.x == SIZE / 2 {
            reached_entry_side = true;
            break;
        }
        for offset in [
            Position::new(0, -1),
            Position::new(-1, 0),
            Position::new(1, 0),
            Position::new(0, 1),
        ] {
            let next = tile + offset;
            if next.x < SIZE / 2 || next.x >= SIZE || next.y < 0 || next.y >= SIZE {
                continue;
            }
            if passable(next) && visited.insert(next) {
                queue.push_back(next);
            }
        }
    }
    assert!(reached_entry_side, "site is connected to the zone entry");
}

struct BorderEnv {
    zone: Zone,
    options: ZoneOptions,
    settings: scenariogen::template::TemplateSettings,
    catalogs: scenariogen::catalog::Catalogs,
    map: ScenarioMap,
    grid: OccupancyGrid,
    rng: Rng,
}

fn border_env(border_type: ZoneBorderType, gap_chance: u8, seed: u32) -> BorderEnv {
    let mut zone = Zone::new(0);
    let mut grid = OccupancyGrid::new(SIZE);

    // Two adjacent bands; zone 0 is the western one
    for x in 18..24 {
        for y in 12..36 {
            let tile = Position::new(x, y);
            grid.set_zone_id(tile, 0);
            zone.tile_info.insert(tile);
        }
    }
    for x in 24..30 {
        for y in 12..36 {
            grid.set_zone_id(Position::new(x, y), 1);
        }
    }

    let mut options = ZoneOptions::new(0, TemplateZoneType::Treasure);
    options.border_type = border_type;
    options.gap_chance = gap_chance;

    BorderEnv {
        zone,
        options,
        settings: common::settings(),
        catalogs: common::catalogs(),
        map: ScenarioMap::new("t", "t", SIZE),
        grid,
        rng: Rng::new(seed),
    }
}

fn border_states(env: &BorderEnv) -> (usize, usize) {
    let mut open = 0;
    let mut closed = 0;
    for &tile in &env.zone.tile_info {
        let is_border = env
            .grid
            .neighbors(tile)
            .into_iter()
            .any(|p| env.grid.zone_id(p) != Some(0));
        if !is_border {
            continue;
        }
        match env.grid.state(tile) {
            Some(TileState::Free) => open += 1,
            Some(TileState::Blocked) => closed += 1,
            _ => {}
        }
    }
    (open, closed)
}

#[test]
fn closed_border_leaves_no_open_tiles() {
    let mut env = border_env(ZoneBorderType::Closed, 0, 1);
    ZoneFiller::new(
        &mut env.zone,
        &env.options,
        &env.settings,
        &env.catalogs,
        &mut env.map,
        &mut env.grid,
        &mut env.rng,
        1,
    )
    .create_border();

    let (open, closed) = border_states(&env);
    assert_eq!(open, 0);
    assert!(closed > 0);
}

#[test]
fn open_border_leaves_no_closed_tiles() {
    let mut env = border_env(ZoneBorderType::Open, 0, 1);
    ZoneFiller::new(
        &mut env.zone,
        &env.options,
        &env.settings,
        &env.catalogs,
        &mut env.map,
        &mut env.grid,
        &mut env.rng,
        1,
    )
    .create_border();

    let (open, closed) = border_states(&env);
    assert_eq!(closed, 0);
    assert!(open > 0);
}

#[test]
fn water_border_paints_walkable_water() {
    let mut env = border_env(ZoneBorderType::Water, 0, 1);
    ZoneFiller::new(
        &mut env.zone,
        &env.options,
        &env.settings,
        &env.catalogs,
        &mut env.map,
        &mut env.grid,
        &mut env.rng,
        1,
    )
    .create_border();

    let (open, closed) = border_states(&env);
    assert_eq!(closed, 0);
    assert!(open > 0);

    for &tile in &env.zone.tile_info {
        if env.grid.state(tile) == Some(TileState::Free) {
            assert_eq!(env.map.tile(tile).ground, GroundType::Water);
        }
    }
}

#[test]
fn semi_open_border_respects_gap_chance() {
    let mut open_total = 0usize;
    let mut closed_total = 0usize;

    for seed in 1..=100u32 {
        let mut env = border_env(ZoneBorderType::SemiOpen, 50, seed);
        ZoneFiller::new(
            &mut env.zone,
            &env.options,
            &env.settings,
            &env.catalogs,
            &mut env.map,
            &mut env.grid,
            &mut env.rng,
            seed,
        )
        .create_border();

        let (open, closed) = border_states(&env);
        open_total += open;
        closed_total += closed;
    }

    let fraction = open_total as f64 / (open_total + closed_total) as f64;
    assert!(
        (0.35..=0.65).contains(&fraction),
        "open border fraction {fraction} outside the expected band"
    );
}

#[test]
fn forest_setting_boundaries() {
    let catalogs = common::catalogs();

    let mut zone = ZoneOptions::new(0, TemplateZoneType::Treasure);
    zone.center = VPosition::new(0.5, 0.5);

    // 0% leaves no forest tiles at all
    let mut template = common::single_zone_template(zone.clone());
    template.settings.forest = 0;
    let scenario = common::generate_single(&template, &catalogs, 3, SIZE).unwrap();
    for x in 0..SIZE {
        for y in 0..SIZE {
            assert_ne!(
                scenario.map.tile(Position::new(x, y)).ground,
                GroundType::Forest
            );
        }
    }

    // 100% forests every tile that is still unclaimed after the fill
    let mut template = common::single_zone_template(zone);
    template.settings.forest = 100;
    let scenario = common::generate_single(&template, &catalogs, 3, SIZE).unwrap();

    let mut forest_tiles = 0;
    for x in 0..SIZE {
        for y in 0..SIZE {
            let position = Position::new(x, y);
            assert_ne!(scenario.grid.state(position), Some(TileState::Possible));
            if scenario.map.tile(position).ground == GroundType::Forest {
                forest_tiles += 1;
                assert!(!scenario.grid.is_road(position), "roads are never forested");
            }
        }
    }
    assert!(forest_tiles > 0);
}

fn populated_template() -> MapTemplate {
    let mut start = common::start_zone(0);
    start.center = VPosition::new(0.25, 0.5);
    start.capital.garrison.value = RandomValue::new(250, 350);
    start.capital.gap_mask = 0x4;
    start.border_type = ZoneBorderType::SemiOpen;
    start.gap_chance = 50;
    start.mines.insert(ResourceType::Gold, 1);
    start.mines.insert(ResourceType::LifeMana, 1);

    let mut treasure = ZoneOptions::new(1, TemplateZoneType::Treasure);
    treasure.center = VPosition::new(0.75, 0.5);
    treasure.border_type = ZoneBorderType::SemiOpen;
    treasure.gap_chance = 50;

    let mut merchant = MerchantInfo {
        name: String::new(),
        description: String::new(),
        items: Default::default(),
        guard: GroupInfo::default(),
        ai_priority: 3,
    };
    merchant.items.value = RandomValue::new(300, 500);
    merchant.guard.value = RandomValue::new(200, 300);
    treasure.merchants.push(merchant);

    let mut ruin = RuinInfo {
        name: String::new(),
        guard: GroupInfo::default(),
        gold: RandomValue::new(100, 400),
        loot: Default::default(),
        ai_priority: 3,
    };
    ruin.guard.value = RandomValue::new(250, 400);
    ruin.loot.value = RandomValue::new(100, 250);
    treasure.ruins.push(ruin);

    let mut stacks = NeutralStacksInfo {
        count: 3,
        stacks: GroupInfo::default(),
        owner: None,
        name: String::new(),
        leader_modifiers: Vec::new(),
        order: Default::default(),
        ai_priority: 3,
    };
    stacks.stacks.value = RandomValue::new(600, 900);
    treasure.stacks.stack_groups.push(stacks);

    treasure.bags.count = 2;
    treasure.bags.loot.value = RandomValue::new(200, 400);

    let mut contents = TemplateContents::default();
    contents.zones.insert(0, start);
    contents.zones.insert(1, treasure);

    let mut guard = GroupInfo::default();
    guard.value = RandomValue::new(250, 350);
    contents.connections.push(ZoneConnection { from: 0, to: 1, size: 0.5, guard });

    MapTemplate { settings: common::settings(), contents }
}

#[test]
fn placed_objects_occupy_their_footprints() {
    let catalogs = common::catalogs();
    let template = populated_template();
    let scenario = common::generate_split(&template, &catalogs, 7, SIZE).unwrap();

    for object in scenario.map.objects() {
        let Some(element) = object.element() else { continue };
        for tile in element.all_positions() {
            assert!(
                scenario.grid.is_used(tile),
                "{} footprint tile {tile} is not used",
                object.id()
            );
        }
    }

    // The fill consumed or converted every unclaimed tile
    for x in 0..SIZE {
        for y in 0..SIZE {
            let position = Position::new(x, y);
            assert_ne!(scenario.grid.state(position), Some(TileState::Possible));
        }
    }

    // The obstacle pass produced actual mountains
    assert!(!scenario.map.mountains().is_empty());
}

#[test]
fn ruins_carry_guards_gold_and_loot() {
    let catalogs = common::catalogs();
    let template = populated_template();
    let scenario = common::generate_split(&template, &catalogs, 11, SIZE).unwrap();

    let ruin = scenario
        .map
        .objects()
        .find_map(|object| match object {
            ScenarioObject::Ruin(ruin) => Some(ruin),
            _ => None,
        })
        .expect("ruin exists");

    assert!(ruin.guard.occupied_slots() > 0, "ruin guard group is filled");
    assert!(ruin.cash.get(ResourceType::Gold) >= 100);
    assert!(ruin.item.is_some(), "ruin holds a loot item");
}

#[test]
fn same_seed_produces_identical_scenarios() {
    let catalogs = common::catalogs();
    let template = populated_template();

    let first = common::generate_split(&template, &catalogs, 5, SIZE).unwrap();
    let second = common::generate_split(&template, &catalogs, 5, SIZE).unwrap();

    assert_eq!(common::snapshot(&first), common::snapshot(&second));
}

//! Shared fixtures for integration tests: a small but complete catalog
//! and template builders.
#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};

use scenariogen::catalog::{
    Catalogs, GeneratorSettings, ItemId, ItemInfo, ItemType, LandmarkId, LandmarkInfo,
    LandmarkType, ModifierId, MountainDesc, RaceInfo, RaceType, ReachType, SiteText, SpellId,
    SpellInfo, SpellType, SubRaceType, UnitId, UnitInfo,
};
use scenariogen::core::error::Result;
use scenariogen::core::types::{Position, VPosition};
use scenariogen::gen::{MapGenerator, Scenario};
use scenariogen::map::{GroundType, ScenarioObject};
use scenariogen::template::{
    MapTemplate, TemplateContents, TemplateSettings, TemplateZoneType, ZoneOptions,
};

pub fn unit(
    id: u32,
    name: &str,
    value: u32,
    reach: ReachType,
    leader: bool,
    big: bool,
    leadership: u8,
) -> UnitInfo {
    UnitInfo {
        id: UnitId(id),
        name: name.into(),
        level: 1,
        value,
        enroll_cost: value / 2,
        hp: 50 + value / 10,
        move_points: 20,
        leadership,
        reach,
        subrace: SubRaceType::Neutral,
        big,
        leader,
        support: false,
    }
}

/// Catalog with enough spread in unit and item values that any budget in
/// the test templates can be composed.
pub fn catalogs() -> Catalogs {
    let mut units = BTreeMap::new();
    for info in [
        unit(1, "Squire", 50, ReachType::Adjacent, true, false, 4),
        unit(2, "Captain", 100, ReachType::Adjacent, true, false, 5),
        unit(3, "Warlord", 200, ReachType::Adjacent, true, false, 6),
        unit(4, "Sharpshooter Lord", 150, ReachType::Archer, true, false, 5),
        unit(5, "Wyrm Lord", 400, ReachType::Adjacent, true, true, 6),
        unit(10, "Militia", 30, ReachType::Adjacent, false, false, 0),
        unit(11, "Footman", 50, ReachType::Adjacent, false, false, 0),
        unit(12, "Swordsman", 80, ReachType::Adjacent, false, false, 0),
        unit(13, "Knight", 130, ReachType::Adjacent, false, false, 0),
        unit(14, "Champion", 210, ReachType::Adjacent, false, false, 0),
        unit(15, "Archer", 40, ReachType::Archer, false, false, 0),
        unit(16, "Marksman", 75, ReachType::Archer, false, false, 0),
        unit(17, "Sniper", 120, ReachType::Archer, false, false, 0),
        unit(18, "Elementalist", 170, ReachType::All, false, false, 0),
        unit(19, "Ogre", 160, ReachType::Adjacent, false, true, 0),
    ] {
        units.insert(info.id, info);
    }

    let mut items = BTreeMap::new();
    for (id, item_type, value) in [
        (1u32, ItemType::PotionHeal, 40u32),
        (2, ItemType::PotionBoost, 90),
        (3, ItemType::Weapon, 180),
        (4, ItemType::Armor, 260),
        (5, ItemType::Jewel, 130),
        (6, ItemType::Valuable, 60),
        (7, ItemType::Scroll, 110),
        (8, ItemType::Banner, 220),
        (9, ItemType::Talisman, 320),
    ] {
        items.insert(ItemId(id), ItemInfo { id: ItemId(id), item_type, value });
    }

    let mut spells = BTreeMap::new();
    for (id, spell_type, level, value) in [
        (1u32, SpellType::Attack, 1u8, 100u32),
        (2, SpellType::Heal, 1, 80),
        (3, SpellType::Boost, 2, 150),
        (4, SpellType::Lower, 2, 140),
        (5, SpellType::Summon, 3, 280),
    ] {
        spells.insert(SpellId(id), SpellInfo { id: SpellId(id), spell_type, level, value });
    }

    let mut landmarks = BTreeMap::new();
    for (id, side, landmark_type, mountain) in [
        (1u32, 1, LandmarkType::Misc, false),
        (2, 1, LandmarkType::Building, true),
        (3, 2, LandmarkType::Structure, true),
        (4, 3, LandmarkType::Terrain, true),
        (5, 5, LandmarkType::Terrain, true),
    ] {
        landmarks.insert(
            LandmarkId(id),
            LandmarkInfo {
                id: LandmarkId(id),
                size: Position::new(side, side),
                landmark_type,
                mountain,
            },
        );
    }

    let mut races = BTreeMap::new();
    races.insert(
        RaceType::Human,
        RaceInfo { race: RaceType::Human, guardian_unit: UnitId(14), leader_unit: UnitId(2) },
    );

    let text = |name: &str| SiteText { name: name.into(), description: "A place.".into() };

    Catalogs {
        units,
        items,
        spells,
        landmarks,
        races,
        city_names: ["Brightwater", "Stonegate", "Eastmere"].map(String::from).to_vec(),
        merchant_texts: vec![text("Trading post")],
        mage_texts: vec![text("Mage tower")],
        mercenary_texts: vec![text("Mercenary camp")],
        trainer_texts: vec![text("Training grounds")],
        market_texts: vec![text("Resource fair")],
        ruin_texts: vec![text("Forgotten ruin")],
        settings: GeneratorSettings {
            mountains: vec![
                MountainDesc { size: 1, image: 1 },
                MountainDesc { size: 2, image: 2 },
                MountainDesc { size: 3, image: 3 },
                MountainDesc { size: 5, image: 5 },
            ],
            merchant_images: vec![1],
            mage_images: vec![1],
            mercenary_images: vec![1],
            trainer_images: vec![1],
            market_images: vec![1],
            ruin_images: vec![1],
            bag_land_images: vec![1],
            bag_water_images: vec![2],
            min_leader_value: 50,
            min_soldier_value: 30,
            leadership_modifier: ModifierId(9031),
            tree_image_count: 20,
            forbidden_units: BTreeSet::new(),
            forbidden_items: BTreeSet::new(),
            forbidden_spells: BTreeSet::new(),
        },
    }
}

pub fn settings() -> TemplateSettings {
    let mut settings = TemplateSettings::default();
    settings.max_players = 1;
    settings.forest = 0;
    settings
}

/// Template with a single zone spanning the whole map.
pub fn single_zone_template(zone: ZoneOptions) -> MapTemplate {
    let mut contents = TemplateContents::default();
    contents.zones.insert(zone.id, zone);
    MapTemplate { settings: settings(), contents }
}

pub fn whole_map(size: i32) -> BTreeSet<Position> {
    let mut tiles = BTreeSet::new();
    for x in 0..size {
        for y in 0..size {
            tiles.insert(Position::new(x, y));
        }
    }
    tiles
}

pub fn split_map(size: i32) -> (BTreeSet<Position>, BTreeSet<Position>) {
    let mut left = BTreeSet::new();
    let mut right = BTreeSet::new();
    for x in 0..size {
        for y in 0..size {
            let tile = Position::new(x, y);
            if x < size / 2 {
                left.insert(tile);
            } else {
                right.insert(tile);
            }
        }
    }
    (left, right)
}

pub fn generate_single(template: &MapTemplate, catalogs: &Catalogs, seed: u32, size: i32) -> Result<Scenario> {
    let zone_id = *template.contents.zones.keys().next().expect("one zone");
    let mut generator = MapGenerator::new(template, catalogs, seed, size)?;
    generator.set_zone_area(zone_id, whole_map(size))?;
    generator.generate()
}

pub fn generate_split(template: &MapTemplate, catalogs: &Catalogs, seed: u32, size: i32) -> Result<Scenario> {
    let mut ids = template.contents.zones.keys().copied();
    let first = ids.next().expect("two zones");
    let second = ids.next().expect("two zones");
    let (left, right) = split_map(size);
    let mut generator = MapGenerator::new(template, catalogs, seed, size)?;
    generator.set_zone_area(first, left)?;
    generator.set_zone_area(second, right)?;
    generator.generate()
}

pub fn start_zone(id: u32) -> ZoneOptions {
    let mut zone = ZoneOptions::new(id, TemplateZoneType::PlayerStart);
    zone.owner = Some(RaceType::Human);
    zone.center = VPosition::new(0.5, 0.5);
    zone
}

/// Deterministic text dump of a scenario, for byte-identical comparisons.
pub fn snapshot(scenario: &Scenario) -> String {
    let mut out = String::new();
    let size = scenario.map.size();

    for y in 0..size {
        for x in 0..size {
            let position = Position::new(x, y);
            let tile = scenario.map.tile(position);
            let mut cell = match tile.ground {
                GroundType::Water => '~',
                GroundType::Mountain => '^',
                GroundType::Forest => 'T',
                GroundType::Plain => '.',
            };
            if scenario.grid.is_road(position) {
                cell = '+';
            }
            if tile.visitable {
                cell = '@';
            }
            out.push(cell);
        }
        out.push('\n');
    }

    for object in scenario.map.objects() {
        out.push_str(&format!("{}", object.id()));
        if let Some(element) = object.element() {
            out.push_str(&format!(" at {}", element.position()));
        }
        if let ScenarioObject::Stack(stack) = object {
            for slot in 0..6 {
                out.push_str(&format!(" s{slot}={:?}", stack.group.slot(slot)));
            }
        }
        out.push('\n');
    }

    for road in scenario.roads() {
        out.push_str(&format!("road {} -> {}: {:?}\n", road.source, road.destination, road.path));
    }

    out
}

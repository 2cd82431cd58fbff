//! Demo scenario generator
//!
//! Builds a small two-zone template against a built-in demo catalog, runs
//! the generator and renders the result as ASCII. Mainly a smoke-test
//! harness; real games drive the library with their own catalogs and
//! templates.

use std::collections::{BTreeMap, BTreeSet};

use clap::Parser;
use serde::Serialize;

use scenariogen::catalog::{
    Catalogs, GeneratorSettings, ItemId, ItemInfo, ItemType, LandmarkId, LandmarkInfo,
    LandmarkType, ModifierId, MountainDesc, RaceInfo, RaceType, ReachType, ResourceType, SiteText,
    SpellId, SpellInfo, SpellType, SubRaceType, UnitId, UnitInfo,
};
use scenariogen::core::error::GenError;
use scenariogen::core::types::{Position, RandomValue, VPosition};
use scenariogen::gen::{MapGenerator, Scenario};
use scenariogen::map::{GroundType, ScenarioObject};
use scenariogen::template::{
    BagInfo, GroupInfo, LootInfo, MapTemplate, MerchantInfo, NeutralStacksInfo, RuinInfo,
    TemplateContents, TemplateSettings, TemplateZoneType, ZoneBorderType, ZoneConnection,
    ZoneOptions,
};

/// Generate a demo scenario and print it
#[derive(Parser, Debug)]
#[command(name = "scenariogen")]
#[command(about = "Random scenario generator demo")]
struct Args {
    /// Random seed; retried on lack of space
    #[arg(long, default_value_t = 1)]
    seed: u32,

    /// Map side length
    #[arg(long, default_value_t = 72)]
    size: i32,

    /// Forest coverage percent
    #[arg(long, default_value_t = 30)]
    forest: u8,

    /// How many seeds to try before giving up
    #[arg(long, default_value_t = 10)]
    retries: u32,

    /// Print object statistics as JSON instead of the map
    #[arg(long)]
    stats: bool,
}

#[derive(Serialize)]
struct Stats {
    seed: u32,
    size: i32,
    objects: BTreeMap<String, usize>,
    road_tiles: usize,
    forest_tiles: usize,
    water_tiles: usize,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scenariogen=info".into()),
        )
        .init();

    let args = Args::parse();

    let catalogs = demo_catalogs();
    let template = demo_template(args.forest);

    let mut seed = args.seed;
    for attempt in 0..args.retries {
        match run(&template, &catalogs, seed, args.size) {
            Ok(scenario) => {
                if args.stats {
                    let stats = collect_stats(&scenario, seed, args.size);
                    println!("{}", serde_json::to_string_pretty(&stats).unwrap());
                } else {
                    render(&scenario);
                }
                return;
            }
            Err(GenError::LackOfSpace { zone, detail, .. }) => {
                tracing::warn!(seed, zone, %detail, attempt, "retrying with next seed");
                seed = seed.wrapping_add(1);
            }
            Err(error) => {
                eprintln!("generation failed: {error}");
                std::process::exit(1);
            }
        }
    }

    eprintln!("no seed in {}..{} produced a scenario", args.seed, seed);
    std::process::exit(1);
}

fn run(
    template: &MapTemplate,
    catalogs: &Catalogs,
    seed: u32,
    size: i32,
) -> scenariogen::core::error::Result<Scenario> {
    let mut generator = MapGenerator::new(template, catalogs, seed, size)?;

    // Split the map into a left and a right zone
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
    generator.set_zone_area(0, left)?;
    generator.set_zone_area(1, right)?;

    generator.generate()
}

fn render(scenario: &Scenario) {
    let size = scenario.map.size();
    let mut rows = vec![vec!['.'; size as usize]; size as usize];

    for y in 0..size {
        for x in 0..size {
            let position = Position::new(x, y);
            let tile = scenario.map.tile(position);
            let cell = &mut rows[y as usize][x as usize];

            *cell = match tile.ground {
                GroundType::Water => '~',
                GroundType::Mountain => '^',
                GroundType::Forest => 'T',
                GroundType::Plain => '.',
            };
            if scenario.grid.is_road(position) {
                *cell = '+';
            }
            if tile.blocked && tile.ground == GroundType::Plain {
                *cell = 'o';
            }
            if tile.visitable {
                *cell = '@';
            }
        }
    }

    for row in rows {
        println!("{}", row.into_iter().collect::<String>());
    }
}

fn collect_stats(scenario: &Scenario, seed: u32, size: i32) -> Stats {
    let mut objects: BTreeMap<String, usize> = BTreeMap::new();
    for object in scenario.map.objects() {
        let kind = match object {
            ScenarioObject::Fortification(_) => "fortifications",
            ScenarioObject::Stack(_) => "stacks",
            ScenarioObject::Site(_) => "sites",
            ScenarioObject::Ruin(_) => "ruins",
            ScenarioObject::Crystal(_) => "crystals",
            ScenarioObject::Bag(_) => "bags",
            ScenarioObject::Landmark(_) => "landmarks",
            ScenarioObject::Unit(_) => "units",
            ScenarioObject::Item(_) => "items",
            ScenarioObject::Player(_) => "players",
        };
        *objects.entry(kind.into()).or_default() += 1;
    }

    let mut road_tiles = 0;
    let mut forest_tiles = 0;
    let mut water_tiles = 0;
    for x in 0..size {
        for y in 0..size {
            let position = Position::new(x, y);
            if scenario.grid.is_road(position) {
                road_tiles += 1;
            }
            match scenario.map.tile(position).ground {
                GroundType::Forest => forest_tiles += 1,
                GroundType::Water => water_tiles += 1,
                _ => {}
            }
        }
    }

    Stats { seed, size, objects, road_tiles, forest_tiles, water_tiles }
}

fn unit(
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

fn demo_catalogs() -> Catalogs {
    let mut units = BTreeMap::new();
    for info in [
        unit(1, "Squire", 50, ReachType::Adjacent, true, false, 4),
        unit(2, "Warrior Lord", 120, ReachType::Adjacent, true, false, 5),
        unit(3, "Ranger Lord", 200, ReachType::Archer, true, false, 5),
        unit(4, "Dragon Lord", 420, ReachType::Adjacent, true, true, 6),
        unit(10, "Footman", 30, ReachType::Adjacent, false, false, 0),
        unit(11, "Swordsman", 60, ReachType::Adjacent, false, false, 0),
        unit(12, "Knight", 120, ReachType::Adjacent, false, false, 0),
        unit(13, "Champion", 240, ReachType::Adjacent, false, false, 0),
        unit(14, "Archer", 45, ReachType::Archer, false, false, 0),
        unit(15, "Marksman", 90, ReachType::Archer, false, false, 0),
        unit(16, "Mage", 150, ReachType::All, false, false, 0),
        unit(17, "Ogre", 180, ReachType::Adjacent, false, true, 0),
    ] {
        units.insert(info.id, info);
    }

    let mut items = BTreeMap::new();
    for (id, item_type, value) in [
        (1u32, ItemType::PotionHeal, 50u32),
        (2, ItemType::PotionBoost, 100),
        (3, ItemType::Weapon, 250),
        (4, ItemType::Armor, 300),
        (5, ItemType::Jewel, 150),
        (6, ItemType::Valuable, 75),
        (7, ItemType::Scroll, 120),
        (8, ItemType::Banner, 200),
    ] {
        items.insert(ItemId(id), ItemInfo { id: ItemId(id), item_type, value });
    }

    let mut spells = BTreeMap::new();
    for (id, spell_type, level, value) in [
        (1u32, SpellType::Attack, 1u8, 100u32),
        (2, SpellType::Heal, 1, 80),
        (3, SpellType::Boost, 2, 150),
        (4, SpellType::Lower, 2, 150),
        (5, SpellType::Summon, 3, 300),
        (6, SpellType::Fog, 1, 60),
    ] {
        spells.insert(SpellId(id), SpellInfo { id: SpellId(id), spell_type, level, value });
    }

    let mut landmarks = BTreeMap::new();
    for (id, side, landmark_type, mountain) in [
        (1u32, 1, LandmarkType::Misc, false),
        (2, 2, LandmarkType::Structure, true),
        (3, 3, LandmarkType::Terrain, true),
        (4, 5, LandmarkType::Terrain, true),
        (5, 1, LandmarkType::Building, true),
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
        RaceInfo { race: RaceType::Human, guardian_unit: UnitId(13), leader_unit: UnitId(2) },
    );

    Catalogs {
        units,
        items,
        spells,
        landmarks,
        races,
        city_names: ["Brightwater", "Stonegate", "Eastmere", "Hollowdale"]
            .map(String::from)
            .to_vec(),
        merchant_texts: vec![SiteText {
            name: "Trading post".into(),
            description: "Goods from afar.".into(),
        }],
        mage_texts: vec![SiteText {
            name: "Mage tower".into(),
            description: "Spells for sale.".into(),
        }],
        mercenary_texts: vec![SiteText {
            name: "Mercenary camp".into(),
            description: "Blades for hire.".into(),
        }],
        trainer_texts: vec![SiteText {
            name: "Training grounds".into(),
            description: "Veterans welcome.".into(),
        }],
        market_texts: vec![SiteText {
            name: "Resource fair".into(),
            description: "Fair rates, mostly.".into(),
        }],
        ruin_texts: vec![SiteText {
            name: "Forgotten ruin".into(),
            description: String::new(),
        }],
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
            ruin_images: vec![1, 2],
            bag_land_images: vec![1, 2],
            bag_water_images: vec![3],
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

fn demo_template(forest: u8) -> MapTemplate {
    let mut settings = TemplateSettings::default();
    settings.name = "Demo valley".into();
    settings.description = "Two zones split by a semi-open ridge".into();
    settings.max_players = 1;
    settings.forest = forest;
    settings.starting_gold = 500;

    let mut start = ZoneOptions::new(0, TemplateZoneType::PlayerStart);
    start.owner = Some(RaceType::Human);
    start.border_type = ZoneBorderType::SemiOpen;
    start.gap_chance = 40;
    start.center = VPosition::new(0.25, 0.5);
    start.capital.garrison.value = RandomValue::new(200, 300);
    start.mines.insert(ResourceType::Gold, 1);
    start.mines.insert(ResourceType::LifeMana, 1);

    let mut treasure = ZoneOptions::new(1, TemplateZoneType::Treasure);
    treasure.border_type = ZoneBorderType::SemiOpen;
    treasure.gap_chance = 40;
    treasure.center = VPosition::new(0.75, 0.5);

    let mut merchant = MerchantInfo {
        name: String::new(),
        description: String::new(),
        items: LootInfo::default(),
        guard: GroupInfo::default(),
        ai_priority: 3,
    };
    merchant.items.value = RandomValue::new(400, 700);
    merchant.guard.value = RandomValue::new(250, 400);
    treasure.merchants.push(merchant);

    let mut ruin = RuinInfo {
        name: String::new(),
        guard: GroupInfo::default(),
        gold: RandomValue::new(200, 500),
        loot: LootInfo::default(),
        ai_priority: 3,
    };
    ruin.guard.value = RandomValue::new(300, 500);
    ruin.loot.value = RandomValue::new(100, 300);
    treasure.ruins.push(ruin);

    let mut stacks = NeutralStacksInfo {
        count: 4,
        stacks: GroupInfo::default(),
        owner: None,
        name: String::new(),
        leader_modifiers: Vec::new(),
        order: Default::default(),
        ai_priority: 3,
    };
    stacks.stacks.value = RandomValue::new(800, 1200);
    treasure.stacks.stack_groups.push(stacks);

    treasure.bags = BagInfo {
        count: 3,
        loot: LootInfo { value: RandomValue::new(300, 600), ..Default::default() },
        ai_priority: 1,
    };

    let mut contents = TemplateContents::default();
    contents.zones.insert(0, start);
    contents.zones.insert(1, treasure);

    let mut guard = GroupInfo::default();
    guard.value = RandomValue::new(300, 450);
    contents.connections.push(ZoneConnection { from: 0, to: 1, size: 0.5, guard });

    MapTemplate { settings, contents }
}

//! Integration tests for the stack and loot composers

mod common;

use scenariogen::catalog::{Catalogs, ItemId};
use scenariogen::core::rng::Rng;
use scenariogen::core::types::{ObjectId, RandomValue};
use scenariogen::gen::{OccupancyGrid, Zone, ZoneFiller};
use scenariogen::map::{ScenarioMap, ScenarioObject, Stack};
use scenariogen::template::{
    GroupInfo, LootInfo, RequiredItemInfo, TemplateSettings, TemplateZoneType, ZoneOptions,
};

/// Owned pieces a standalone filler borrows from.
struct Env {
    zone: Zone,
    options: ZoneOptions,
    settings: TemplateSettings,
    catalogs: Catalogs,
    map: ScenarioMap,
    grid: OccupancyGrid,
    rng: Rng,
    seed: u32,
}

impl Env {
    fn new(seed: u32) -> Self {
        Self {
            zone: Zone::new(0),
            options: ZoneOptions::new(0, TemplateZoneType::Treasure),
            settings: common::settings(),
            catalogs: common::catalogs(),
            map: ScenarioMap::new("t", "t", 48),
            grid: OccupancyGrid::new(48),
            rng: Rng::new(seed),
            seed,
        }
    }

    fn filler(&mut self) -> ZoneFiller<'_> {
        ZoneFiller::new(
            &mut self.zone,
            &self.options,
            &self.settings,
            &self.catalogs,
            &mut self.map,
            &mut self.grid,
            &mut self.rng,
            self.seed,
        )
    }
}

fn stack_spec(min: u32, max: u32) -> GroupInfo {
    let mut info = GroupInfo::default();
    info.value = RandomValue::new(min, max);
    info
}

fn unit_value(env: &Env, unit: ObjectId) -> u32 {
    match env.map.object(unit) {
        Some(ScenarioObject::Unit(u)) => env.catalogs.unit(u.impl_id).map(|i| i.value).unwrap_or(0),
        _ => 0,
    }
}

fn distinct_units(stack: &Stack) -> Vec<ObjectId> {
    let mut units = Vec::new();
    for slot in 0..6 {
        if let Some(unit) = stack.group.slot(slot) {
            if !units.contains(&unit) {
                units.push(unit);
            }
        }
    }
    units
}

#[test]
fn empty_budget_creates_no_stack() {
    let mut env = Env::new(1);
    let stack = env.filler().create_stack(&GroupInfo::default(), true).unwrap();
    assert!(stack.is_none());
}

#[test]
fn composed_stack_has_one_leader_and_fits_its_budget() {
    for seed in 1..=20u32 {
        let mut env = Env::new(seed);
        let spec = stack_spec(500, 500);
        let stack = env
            .filler()
            .create_stack(&spec, true)
            .unwrap()
            .expect("budget of 500 produces a stack");

        let leader = stack.leader.expect("stack has a leader");
        assert_eq!(stack.group.leader(), Some(leader));
        assert!(!distinct_units(&stack).is_empty());

        // Every slotted unit is a real unit object
        let mut total_value = 0;
        let mut leaders = 0;
        for unit in distinct_units(&stack) {
            total_value += unit_value(&env, unit);
            let impl_id = match env.map.object(unit) {
                Some(ScenarioObject::Unit(u)) => u.impl_id,
                other => panic!("slot references a non-unit: {other:?}"),
            };
            if env.catalogs.unit(impl_id).unwrap().leader {
                leaders += 1;
            }
        }
        assert_eq!(leaders, 1, "seed {seed}: exactly one leader unit");
        assert!(
            total_value <= 500,
            "seed {seed}: stack value {total_value} exceeds its budget"
        );
    }
}

#[test]
fn leader_leadership_covers_the_group() {
    for seed in 1..=10u32 {
        let mut env = Env::new(seed);
        let spec = stack_spec(800, 800);
        let stack = env.filler().create_stack(&spec, true).unwrap().unwrap();

        let leader = stack.leader.unwrap();
        let (impl_id, modifiers) = match env.map.object(leader) {
            Some(ScenarioObject::Unit(u)) => (u.impl_id, u.modifiers.len()),
            _ => unreachable!(),
        };
        let leadership = env.catalogs.unit(impl_id).unwrap().leadership as usize + modifiers;
        assert!(
            leadership >= stack.group.occupied_slots(),
            "seed {seed}: leadership {leadership} below {} occupied slots",
            stack.group.occupied_slots()
        );
    }
}

#[test]
fn stack_composition_is_deterministic() {
    let compose = || {
        let mut env = Env::new(7);
        let spec = stack_spec(500, 500);
        let stack = env.filler().create_stack(&spec, true).unwrap().unwrap();

        let mut slots = Vec::new();
        for slot in 0..6 {
            let impl_id = stack.group.slot(slot).map(|unit| match env.map.object(unit) {
                Some(ScenarioObject::Unit(u)) => u.impl_id,
                _ => unreachable!(),
            });
            slots.push(impl_id);
        }
        (stack.leader, slots)
    };

    let (leader_a, slots_a) = compose();
    let (leader_b, slots_b) = compose();
    assert_eq!(leader_a, leader_b);
    assert_eq!(slots_a, slots_b);
}

#[test]
fn stack_loot_lands_in_the_inventory() {
    let mut env = Env::new(9);
    let mut spec = stack_spec(400, 400);
    spec.loot.value = RandomValue::new(300, 300);

    let stack = env.filler().create_stack(&spec, true).unwrap().unwrap();
    assert!(!stack.inventory.is_empty());

    for &item in stack.inventory.items() {
        match env.map.object(item) {
            Some(ScenarioObject::Item(_)) => {}
            other => panic!("inventory entry is not an item: {other:?}"),
        }
    }
}

#[test]
fn zero_loot_is_empty() {
    let mut env = Env::new(1);
    let loot = LootInfo::default();
    assert!(env.filler().create_loot(&loot, false).is_empty());
}

#[test]
fn loot_respects_its_value_budget() {
    for seed in 1..=20u32 {
        let mut env = Env::new(seed);
        let mut loot = LootInfo::default();
        loot.value = RandomValue::new(400, 400);

        let items = env.filler().create_loot(&loot, false);
        let total: u32 = items
            .iter()
            .map(|(id, amount)| env.catalogs.items[id].value * amount)
            .sum();
        assert!(total <= 400, "seed {seed}: loot value {total} over budget");
    }
}

#[test]
fn required_items_always_present() {
    let mut env = Env::new(3);
    let mut loot = LootInfo::default();
    loot.required_items.push(RequiredItemInfo {
        item: ItemId(3),
        amount: RandomValue::new(2, 2),
    });

    let items = env.filler().create_loot(&loot, false);
    assert_eq!(items, vec![(ItemId(3), 2)]);
}

#[test]
fn merchant_loot_excludes_valuables() {
    for seed in 1..=10u32 {
        let mut env = Env::new(seed);
        let mut loot = LootInfo::default();
        loot.value = RandomValue::new(500, 500);

        for (id, _) in env.filler().create_loot(&loot, true) {
            assert_ne!(
                env.catalogs.items[&id].item_type,
                scenariogen::catalog::ItemType::Valuable
            );
        }
    }
}

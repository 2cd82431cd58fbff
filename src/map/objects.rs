//! Scenario object variants
//!
//! Objects are stored in the map as a tagged variant keyed by id; the grid
//! and zones refer to them by id only. Dispatch is a match on the variant
//! instead of downcasts.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::catalog::{
    ItemId, LandmarkId, ModifierId, RaceType, ResourceType, SpellId, SubRaceType, UnitId,
};
use crate::core::types::ObjectId;
use crate::map::element::MapElement;
use crate::template::OrderType;

pub const GROUP_SIZE: usize = 6;

/// Six battle slots in two lines: even slots {0, 2, 4} form the front line,
/// odd slots {1, 3, 5} the back line. Slots `(2k, 2k+1)` form a column; a
/// big unit occupies both tiles of its column.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Group {
    slots: [Option<ObjectId>; GROUP_SIZE],
    leader_slot: Option<usize>,
}

impl Group {
    pub fn add_leader(&mut self, unit: ObjectId, slot: usize, big: bool) -> bool {
        if self.leader_slot.is_some() || !self.add_unit(unit, slot, big) {
            return false;
        }
        self.leader_slot = Some(slot);
        true
    }

    pub fn add_unit(&mut self, unit: ObjectId, slot: usize, big: bool) -> bool {
        if slot >= GROUP_SIZE || self.slots[slot].is_some() {
            return false;
        }

        if big {
            let pair = if slot % 2 == 0 { slot + 1 } else { slot - 1 };
            if self.slots[pair].is_some() {
                return false;
            }
            self.slots[pair] = Some(unit);
        }

        self.slots[slot] = Some(unit);
        true
    }

    pub fn leader(&self) -> Option<ObjectId> {
        self.leader_slot.and_then(|slot| self.slots[slot])
    }

    pub fn slot(&self, index: usize) -> Option<ObjectId> {
        self.slots.get(index).copied().flatten()
    }

    /// Occupied slot count; a big unit counts both tiles of its column.
    /// This is the leadership the group's leader must supply.
    pub fn occupied_slots(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Distinct units in the group.
    pub fn unit_count(&self) -> usize {
        let mut seen = BTreeSet::new();
        self.slots.iter().flatten().for_each(|id| {
            seen.insert(*id);
        });
        seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|slot| slot.is_none())
    }
}

/// Item instances carried by an object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    items: Vec<ObjectId>,
}

impl Inventory {
    pub fn add(&mut self, item: ObjectId) {
        self.items.push(item);
    }

    pub fn items(&self) -> &[ObjectId] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Resource amounts; absent entries are zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    amounts: BTreeMap<ResourceType, u16>,
}

impl Currency {
    pub fn set(&mut self, resource: ResourceType, amount: u16) {
        if amount == 0 {
            self.amounts.remove(&resource);
        } else {
            self.amounts.insert(resource, amount);
        }
    }

    pub fn get(&self, resource: ResourceType) -> u16 {
        self.amounts.get(&resource).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    Southwest,
    West,
    Northwest,
    North,
    Northeast,
    East,
    Southeast,
    South,
}

impl Facing {
    pub const COUNT: i64 = 8;

    pub fn from_index(index: i64) -> Self {
        match index {
            0 => Facing::Southwest,
            1 => Facing::West,
            2 => Facing::Northwest,
            3 => Facing::North,
            4 => Facing::Northeast,
            5 => Facing::East,
            6 => Facing::Southeast,
            _ => Facing::South,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FortKind {
    Village { tier: u8 },
    Capital,
}

/// Village or capital.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fortification {
    pub id: ObjectId,
    pub element: MapElement,
    pub kind: FortKind,
    pub name: String,
    pub owner: Option<ObjectId>,
    pub subrace: SubRaceType,
    pub garrison: Group,
    pub inventory: Inventory,
    /// Visitor stack stationed inside.
    pub visitor_stack: Option<ObjectId>,
    pub gap_mask: u8,
    pub ai_priority: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stack {
    pub id: ObjectId,
    pub element: MapElement,
    pub group: Group,
    pub inventory: Inventory,
    pub leader: Option<ObjectId>,
    pub owner: Option<ObjectId>,
    pub subrace: SubRaceType,
    /// Fortification this stack garrisons inside, if any.
    pub inside: Option<ObjectId>,
    pub move_points: u32,
    pub facing: Facing,
    pub order: OrderType,
    pub ai_priority: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SiteKind {
    Merchant {
        /// Item type and amount for sale.
        goods: Vec<(ItemId, u32)>,
    },
    Mage {
        spells: BTreeSet<SpellId>,
    },
    Mercenary {
        units: Vec<MercenaryStock>,
    },
    Trainer,
    ResourceMarket {
        exchange_rates: String,
        stock: Currency,
        infinite_stock: BTreeSet<ResourceType>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MercenaryStock {
    pub unit: UnitId,
    pub level: u8,
    pub unique: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    pub id: ObjectId,
    pub element: MapElement,
    pub kind: SiteKind,
    pub title: String,
    pub description: String,
    pub image: i32,
    pub ai_priority: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ruin {
    pub id: ObjectId,
    pub element: MapElement,
    pub title: String,
    pub image: i32,
    pub guard: Group,
    pub cash: Currency,
    /// Single reward item type looted on clearing the ruin.
    pub item: Option<ItemId>,
    pub ai_priority: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Crystal {
    pub id: ObjectId,
    pub element: MapElement,
    pub resource: ResourceType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bag {
    pub id: ObjectId,
    pub element: MapElement,
    pub image: i32,
    pub items: Vec<ObjectId>,
    pub ai_priority: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Landmark {
    pub id: ObjectId,
    pub element: MapElement,
    pub landmark_type: LandmarkId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: ObjectId,
    /// Catalog unit type this instance was created from.
    pub impl_id: UnitId,
    pub level: u8,
    pub hp: u32,
    pub name: String,
    pub modifiers: Vec<ModifierId>,
}

impl Unit {
    pub fn add_modifier(&mut self, modifier: ModifierId) {
        self.modifiers.push(modifier);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: ObjectId,
    /// Catalog item type.
    pub item_type: ItemId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: ObjectId,
    pub race: RaceType,
    pub bank: Currency,
    pub known_spells: BTreeSet<SpellId>,
    pub buildings: BTreeSet<crate::catalog::BuildingId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScenarioObject {
    Fortification(Fortification),
    Stack(Stack),
    Site(Site),
    Ruin(Ruin),
    Crystal(Crystal),
    Bag(Bag),
    Landmark(Landmark),
    Unit(Unit),
    Item(Item),
    Player(Player),
}

impl ScenarioObject {
    pub fn id(&self) -> ObjectId {
        match self {
            ScenarioObject::Fortification(o) => o.id,
            ScenarioObject::Stack(o) => o.id,
            ScenarioObject::Site(o) => o.id,
            ScenarioObject::Ruin(o) => o.id,
            ScenarioObject::Crystal(o) => o.id,
            ScenarioObject::Bag(o) => o.id,
            ScenarioObject::Landmark(o) => o.id,
            ScenarioObject::Unit(o) => o.id,
            ScenarioObject::Item(o) => o.id,
            ScenarioObject::Player(o) => o.id,
        }
    }

    /// Footprint geometry for objects that live on the grid.
    pub fn element(&self) -> Option<&MapElement> {
        match self {
            ScenarioObject::Fortification(o) => Some(&o.element),
            ScenarioObject::Stack(o) => Some(&o.element),
            ScenarioObject::Site(o) => Some(&o.element),
            ScenarioObject::Ruin(o) => Some(&o.element),
            ScenarioObject::Crystal(o) => Some(&o.element),
            ScenarioObject::Bag(o) => Some(&o.element),
            ScenarioObject::Landmark(o) => Some(&o.element),
            ScenarioObject::Unit(_) | ScenarioObject::Item(_) | ScenarioObject::Player(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ObjectType;

    fn unit_id(index: u32) -> ObjectId {
        ObjectId::new(ObjectType::Unit, index)
    }

    #[test]
    fn single_leader_per_group() {
        let mut group = Group::default();
        assert!(group.add_leader(unit_id(0), 2, false));
        assert!(!group.add_leader(unit_id(1), 3, false));
        assert_eq!(group.leader(), Some(unit_id(0)));
    }

    #[test]
    fn big_unit_occupies_column() {
        let mut group = Group::default();
        assert!(group.add_unit(unit_id(0), 2, true));
        assert_eq!(group.slot(2), Some(unit_id(0)));
        assert_eq!(group.slot(3), Some(unit_id(0)));
        assert_eq!(group.occupied_slots(), 2);
        assert_eq!(group.unit_count(), 1);

        // Column is taken now
        assert!(!group.add_unit(unit_id(1), 3, false));
        assert!(group.add_unit(unit_id(1), 0, false));
        assert_eq!(group.unit_count(), 2);
    }

    #[test]
    fn big_unit_needs_free_column() {
        let mut group = Group::default();
        assert!(group.add_unit(unit_id(0), 1, false));
        assert!(!group.add_unit(unit_id(1), 0, true));
    }
}

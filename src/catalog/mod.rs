//! Game data catalogs
//!
//! Immutable records describing units, items, spells, landmarks, races and
//! the generator's tuning tables. The zone filler borrows a [`Catalogs`]
//! instance instead of reaching for process-wide globals, which also lets
//! tests inject small fixture catalogs.

pub mod pickers;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::types::Position;

macro_rules! catalog_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub u32);
    };
}

catalog_id!(UnitId);
catalog_id!(ItemId);
catalog_id!(SpellId);
catalog_id!(LandmarkId);
catalog_id!(ModifierId);
catalog_id!(BuildingId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RaceType {
    Human,
    Undead,
    Heretic,
    Dwarf,
    Elf,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SubRaceType {
    Human,
    Undead,
    Heretic,
    Dwarf,
    Elf,
    Neutral,
}

impl RaceType {
    pub fn subrace(self) -> SubRaceType {
        match self {
            RaceType::Human => SubRaceType::Human,
            RaceType::Undead => SubRaceType::Undead,
            RaceType::Heretic => SubRaceType::Heretic,
            RaceType::Dwarf => SubRaceType::Dwarf,
            RaceType::Elf => SubRaceType::Elf,
            RaceType::Neutral => SubRaceType::Neutral,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    Gold,
    LifeMana,
    DeathMana,
    InfernalMana,
    RunicMana,
    GroveMana,
}

/// How far a unit's attack reaches in battle; drives front/back line rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReachType {
    /// Melee, hits adjacent targets only. Belongs at the front line.
    Adjacent,
    /// Ranged, hits any single target. Belongs at the back line.
    Archer,
    /// Hits everyone; treated as ranged for placement.
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ItemType {
    Armor,
    Jewel,
    Weapon,
    Banner,
    PotionBoost,
    PotionHeal,
    PotionRevive,
    Scroll,
    Wand,
    Valuable,
    Orb,
    Talisman,
    TravelItem,
    Special,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SpellType {
    Attack,
    Lower,
    Heal,
    Boost,
    Summon,
    Fog,
    Unfog,
    RestoreMove,
    Invisibility,
    ChangeTerrain,
    GiveWards,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LandmarkType {
    Misc,
    Building,
    Structure,
    Terrain,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitInfo {
    pub id: UnitId,
    pub name: String,
    pub level: u8,
    /// Worth of the unit for budget composition.
    pub value: u32,
    /// Price when hired at a mercenary camp.
    pub enroll_cost: u32,
    pub hp: u32,
    pub move_points: u32,
    /// Soldier slots this unit can command; only meaningful for leaders.
    pub leadership: u8,
    pub reach: ReachType,
    pub subrace: SubRaceType,
    /// Big units occupy both tiles of a group column.
    pub big: bool,
    pub leader: bool,
    /// Healers and the like; kept at the back line regardless of reach.
    pub support: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemInfo {
    pub id: ItemId,
    pub item_type: ItemType,
    pub value: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpellInfo {
    pub id: SpellId,
    pub spell_type: SpellType,
    pub level: u8,
    pub value: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandmarkInfo {
    pub id: LandmarkId,
    pub size: Position,
    pub landmark_type: LandmarkType,
    /// Mountain-themed landmarks may substitute mountain obstacles and
    /// allow terrain spread under decorations.
    pub mountain: bool,
}

/// Race-specific data the capital builder needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceInfo {
    pub race: RaceType,
    /// Unit reserved for the capital's center garrison slot.
    pub guardian_unit: UnitId,
    /// Starting leader unit for the owner's first stack.
    pub leader_unit: UnitId,
}

/// Title/description pool entry for generated sites.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteText {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MountainDesc {
    pub size: i32,
    pub image: i32,
}

/// Generator tuning tables that are game data rather than template input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorSettings {
    /// Known mountain obstacles; placement prefers the largest that fits.
    pub mountains: Vec<MountainDesc>,
    pub merchant_images: Vec<i32>,
    pub mage_images: Vec<i32>,
    pub mercenary_images: Vec<i32>,
    pub trainer_images: Vec<i32>,
    pub market_images: Vec<i32>,
    pub ruin_images: Vec<i32>,
    pub bag_land_images: Vec<i32>,
    pub bag_water_images: Vec<i32>,
    /// Cheapest leader in the game; stacks below this value are impossible.
    pub min_leader_value: u32,
    /// Cheapest soldier; bounds how many units a budget can buy.
    pub min_soldier_value: u32,
    /// Item granting +1 leadership, used to cover leadership deficits.
    pub leadership_modifier: ModifierId,
    /// Number of tree image variants for forest tiles.
    pub tree_image_count: u8,
    /// Units that must never be generated, regardless of template.
    pub forbidden_units: BTreeSet<UnitId>,
    pub forbidden_items: BTreeSet<ItemId>,
    pub forbidden_spells: BTreeSet<SpellId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalogs {
    pub units: BTreeMap<UnitId, UnitInfo>,
    pub items: BTreeMap<ItemId, ItemInfo>,
    pub spells: BTreeMap<SpellId, SpellInfo>,
    pub landmarks: BTreeMap<LandmarkId, LandmarkInfo>,
    pub races: BTreeMap<RaceType, RaceInfo>,
    pub city_names: Vec<String>,
    pub merchant_texts: Vec<SiteText>,
    pub mage_texts: Vec<SiteText>,
    pub mercenary_texts: Vec<SiteText>,
    pub trainer_texts: Vec<SiteText>,
    pub market_texts: Vec<SiteText>,
    pub ruin_texts: Vec<SiteText>,
    pub settings: GeneratorSettings,
}

impl Catalogs {
    pub fn unit(&self, id: UnitId) -> Option<&UnitInfo> {
        self.units.get(&id)
    }

    pub fn race(&self, race: RaceType) -> Option<&RaceInfo> {
        self.races.get(&race)
    }

    /// The resource a race's economy prefers; first crystals of this type
    /// are placed close to the owner's capital.
    pub fn native_resource(&self, race: RaceType) -> ResourceType {
        match race {
            RaceType::Human => ResourceType::LifeMana,
            RaceType::Undead => ResourceType::DeathMana,
            RaceType::Heretic => ResourceType::InfernalMana,
            RaceType::Dwarf => ResourceType::RunicMana,
            RaceType::Elf => ResourceType::GroveMana,
            RaceType::Neutral => ResourceType::Gold,
        }
    }
}

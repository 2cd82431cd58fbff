//! Scenario template records
//!
//! In-memory description of what a generated scenario must contain: global
//! settings, zones with their declared contents, connections between zones
//! and diplomacy. Templates are produced by an external loader; this module
//! owns the record shapes and pre-generation validation.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::catalog::{
    ItemId, ItemType, ModifierId, RaceType, ResourceType, SpellId, SpellType, SubRaceType, UnitId,
};
use crate::core::error::{GenError, Result};
use crate::core::types::{RandomValue, VPosition};

pub const MIN_MAP_SIZE: i32 = 48;
pub const MAX_MAP_SIZE: i32 = 144;
pub const MAX_PLAYERS: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TemplateZoneType {
    PlayerStart,
    AiStart,
    Treasure,
    Junction,
    Water,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneBorderType {
    /// Border tiles become walkable water.
    Water,
    /// Border tiles stay walkable.
    Open,
    /// Each border tile is open with the zone's gap chance, blocked otherwise.
    SemiOpen,
    /// Border tiles are blocked solid.
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Normal,
    Stand,
    Guard,
    Roam,
}

impl Default for OrderType {
    fn default() -> Self {
        OrderType::Normal
    }
}

/// A single required item in a loot list; amount may roll to zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequiredItemInfo {
    pub item: ItemId,
    pub amount: RandomValue,
}

/// Loot budget: required items plus a value of random items.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LootInfo {
    pub value: RandomValue,
    /// When set, each single item must fall in this value range.
    pub item_value: RandomValue,
    /// Empty set allows all item types.
    pub item_types: BTreeSet<ItemType>,
    pub required_items: Vec<RequiredItemInfo>,
}

/// Budgeted description of a combat group (garrison, guard or roaming stack).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupInfo {
    pub value: RandomValue,
    /// Empty set allows all subraces.
    pub subrace_types: BTreeSet<SubRaceType>,
    /// When non-empty the leader is picked from these unit types only.
    pub leader_ids: BTreeSet<UnitId>,
    pub leader_modifiers: Vec<ModifierId>,
    /// Optional leader rename.
    pub name: String,
    pub loot: LootInfo,
    pub owner: Option<RaceType>,
    pub order: OrderType,
    pub ai_priority: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityInfo {
    pub owner: Option<RaceType>,
    pub tier: u8,
    pub name: String,
    pub garrison: GroupInfo,
    /// Visitor stack placed inside the city.
    pub stack: GroupInfo,
    pub gap_mask: u8,
    pub ai_priority: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapitalInfo {
    pub name: String,
    pub garrison: GroupInfo,
    pub spells: BTreeSet<SpellId>,
    pub buildings: BTreeSet<crate::catalog::BuildingId>,
    pub gap_mask: u8,
    /// Reserve the center garrison slot for the race guardian.
    pub guardian: bool,
    pub ai_priority: u8,
}

impl Default for CapitalInfo {
    fn default() -> Self {
        Self {
            name: String::new(),
            garrison: GroupInfo::default(),
            spells: BTreeSet::new(),
            buildings: BTreeSet::new(),
            gap_mask: 0,
            guardian: true,
            ai_priority: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantInfo {
    pub name: String,
    pub description: String,
    pub items: LootInfo,
    pub guard: GroupInfo,
    pub ai_priority: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MageInfo {
    pub name: String,
    pub description: String,
    pub value: RandomValue,
    pub spell_types: BTreeSet<SpellType>,
    /// Zero range allows all spell levels.
    pub spell_levels: RandomValue,
    pub required_spells: BTreeSet<SpellId>,
    pub guard: GroupInfo,
    pub ai_priority: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MercenaryUnitInfo {
    pub unit: UnitId,
    pub level: u8,
    pub unique: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MercenaryInfo {
    pub name: String,
    pub description: String,
    pub subrace_types: BTreeSet<SubRaceType>,
    pub value: RandomValue,
    /// When set, each unit's enroll cost must fall in this range.
    pub enroll_value: RandomValue,
    pub required_units: Vec<MercenaryUnitInfo>,
    pub guard: GroupInfo,
    pub ai_priority: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerInfo {
    pub name: String,
    pub description: String,
    pub guard: GroupInfo,
    pub ai_priority: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketStock {
    pub infinite: bool,
    pub amount: RandomValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceMarketInfo {
    pub name: String,
    pub description: String,
    pub exchange_rates: String,
    pub stock: BTreeMap<ResourceType, MarketStock>,
    pub guard: GroupInfo,
    pub ai_priority: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuinInfo {
    pub name: String,
    pub guard: GroupInfo,
    pub gold: RandomValue,
    pub loot: LootInfo,
    pub ai_priority: u8,
}

/// A batch of neutral stacks sharing one budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeutralStacksInfo {
    pub count: u32,
    /// Value and loot are split evenly across the batch.
    pub stacks: GroupInfo,
    pub owner: Option<RaceType>,
    pub name: String,
    pub leader_modifiers: Vec<ModifierId>,
    pub order: OrderType,
    pub ai_priority: u8,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StacksInfo {
    pub stack_groups: Vec<NeutralStacksInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BagInfo {
    pub count: u32,
    /// Split evenly across bags; required items land in random bags.
    pub loot: LootInfo,
    pub ai_priority: u8,
}

/// Declared contents and border policy of one zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneOptions {
    pub id: u32,
    pub zone_type: TemplateZoneType,
    pub border_type: ZoneBorderType,
    /// Percent chance a SemiOpen border tile stays open.
    pub gap_chance: u8,
    /// Relative size weight used by the external zone layout step.
    pub size: u32,
    pub center: VPosition,
    pub owner: Option<RaceType>,
    pub capital: CapitalInfo,
    pub neutral_cities: Vec<CityInfo>,
    pub merchants: Vec<MerchantInfo>,
    pub mages: Vec<MageInfo>,
    pub mercenaries: Vec<MercenaryInfo>,
    pub trainers: Vec<TrainerInfo>,
    pub markets: Vec<ResourceMarketInfo>,
    pub ruins: Vec<RuinInfo>,
    pub mines: BTreeMap<ResourceType, u8>,
    pub stacks: StacksInfo,
    pub bags: BagInfo,
}

impl ZoneOptions {
    pub fn new(id: u32, zone_type: TemplateZoneType) -> Self {
        Self {
            id,
            zone_type,
            border_type: ZoneBorderType::Closed,
            gap_chance: 0,
            size: 1,
            center: VPosition::default(),
            owner: None,
            capital: CapitalInfo::default(),
            neutral_cities: Vec::new(),
            merchants: Vec::new(),
            mages: Vec::new(),
            mercenaries: Vec::new(),
            trainers: Vec::new(),
            markets: Vec::new(),
            ruins: Vec::new(),
            mines: BTreeMap::new(),
            stacks: StacksInfo::default(),
            bags: BagInfo::default(),
        }
    }

    pub fn is_start(&self) -> bool {
        matches!(
            self.zone_type,
            TemplateZoneType::PlayerStart | TemplateZoneType::AiStart
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneConnection {
    pub from: u32,
    pub to: u32,
    /// Relative width of the opening, in `[0, 1]`.
    pub size: f32,
    pub guard: GroupInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiplomacyRelation {
    pub race_a: RaceType,
    pub race_b: RaceType,
    /// 0 is war-leaning, 100 friendly.
    pub relation: u8,
    pub alliance: bool,
    pub always_at_war: bool,
    pub permanent_alliance: bool,
}

impl DiplomacyRelation {
    fn pair(&self) -> (RaceType, RaceType) {
        if self.race_a <= self.race_b {
            (self.race_a, self.race_b)
        } else {
            (self.race_b, self.race_a)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioVariable {
    pub name: String,
    pub value: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateSettings {
    pub name: String,
    pub description: String,
    pub max_players: u32,
    pub size_min: i32,
    pub size_max: i32,
    /// Percent of road coverage; 0 disables road building.
    pub roads: u8,
    /// Percent chance each leftover tile becomes forest.
    pub forest: u8,
    pub starting_gold: u16,
    pub starting_native_mana: u16,
    /// Zone layout refinement iterations for the external placer.
    pub iterations: u32,
    pub custom_parameters: BTreeMap<String, String>,
    pub forbidden_units: BTreeSet<UnitId>,
    pub forbidden_items: BTreeSet<ItemId>,
    pub forbidden_spells: BTreeSet<SpellId>,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            name: "Random scenario".into(),
            description: "Random scenario description".into(),
            max_players: 2,
            size_min: MIN_MAP_SIZE,
            size_max: MAX_MAP_SIZE,
            roads: 100,
            forest: 30,
            starting_gold: 0,
            starting_native_mana: 0,
            iterations: 0,
            custom_parameters: BTreeMap::new(),
            forbidden_units: BTreeSet::new(),
            forbidden_items: BTreeSet::new(),
            forbidden_spells: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateContents {
    pub zones: BTreeMap<u32, ZoneOptions>,
    pub connections: Vec<ZoneConnection>,
    pub diplomacy: Vec<DiplomacyRelation>,
    pub scenario_variables: Vec<ScenarioVariable>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapTemplate {
    pub settings: TemplateSettings,
    pub contents: TemplateContents,
}

impl MapTemplate {
    /// Pre-generation validation; any failure is fatal.
    pub fn validate(&self) -> Result<()> {
        let settings = &self.settings;

        if settings.max_players == 0 || settings.max_players > MAX_PLAYERS {
            return Err(GenError::TemplateInvalid(format!(
                "max players must be 1..{}, got {}",
                MAX_PLAYERS, settings.max_players
            )));
        }

        if settings.size_min < MIN_MAP_SIZE
            || settings.size_max > MAX_MAP_SIZE
            || settings.size_min > settings.size_max
        {
            return Err(GenError::TemplateInvalid(format!(
                "map size range {}..{} is outside {}..{}",
                settings.size_min, settings.size_max, MIN_MAP_SIZE, MAX_MAP_SIZE
            )));
        }

        if settings.roads > 100 || settings.forest > 100 {
            return Err(GenError::TemplateInvalid(
                "roads and forest settings are percentages".into(),
            ));
        }

        let starting_zones = self
            .contents
            .zones
            .values()
            .filter(|zone| zone.is_start())
            .count() as u32;
        if starting_zones > settings.max_players {
            return Err(GenError::TemplateInvalid(format!(
                "{} starting zones for at most {} players",
                starting_zones, settings.max_players
            )));
        }

        for zone in self.contents.zones.values() {
            if zone.is_start() && zone.owner.is_none() {
                return Err(GenError::TemplateInvalid(format!(
                    "starting zone {} has no owner race",
                    zone.id
                )));
            }
            if zone.gap_chance > 100 {
                return Err(GenError::TemplateInvalid(format!(
                    "zone {} gap chance above 100",
                    zone.id
                )));
            }
            for city in &zone.neutral_cities {
                if city.tier == 0 || city.tier > 5 {
                    return Err(GenError::TemplateInvalid(format!(
                        "zone {} city tier must be 1..5, got {}",
                        zone.id, city.tier
                    )));
                }
            }
        }

        for connection in &self.contents.connections {
            let known = |id: u32| self.contents.zones.contains_key(&id);
            if !known(connection.from) || !known(connection.to) {
                return Err(GenError::TemplateInvalid(format!(
                    "connection references unknown zone {} or {}",
                    connection.from, connection.to
                )));
            }
            if !(0.0..=1.0).contains(&connection.size) {
                return Err(GenError::TemplateInvalid(
                    "connection size must be within [0, 1]".into(),
                ));
            }
        }

        let mut seen_pairs = BTreeSet::new();
        for relation in &self.contents.diplomacy {
            if relation.relation > 100 {
                return Err(GenError::TemplateInvalid(
                    "diplomacy relation must be within 0..100".into(),
                ));
            }
            if relation.alliance && relation.always_at_war {
                return Err(GenError::TemplateInvalid(format!(
                    "races {:?} and {:?} cannot be allied and always at war",
                    relation.race_a, relation.race_b
                )));
            }
            if relation.permanent_alliance && !relation.alliance {
                return Err(GenError::TemplateInvalid(format!(
                    "races {:?} and {:?} must be allies for a permanent alliance",
                    relation.race_a, relation.race_b
                )));
            }
            if !seen_pairs.insert(relation.pair()) {
                return Err(GenError::TemplateInvalid(format!(
                    "duplicate diplomacy relation between {:?} and {:?}",
                    relation.race_a, relation.race_b
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_template() -> MapTemplate {
        let mut contents = TemplateContents::default();
        let mut zone = ZoneOptions::new(0, TemplateZoneType::PlayerStart);
        zone.owner = Some(RaceType::Human);
        contents.zones.insert(0, zone);
        contents
            .zones
            .insert(1, ZoneOptions::new(1, TemplateZoneType::Treasure));

        MapTemplate { settings: TemplateSettings::default(), contents }
    }

    #[test]
    fn valid_template_passes() {
        assert!(base_template().validate().is_ok());
    }

    #[test]
    fn too_many_starting_zones_rejected() {
        let mut template = base_template();
        template.settings.max_players = 1;
        for id in 2..4 {
            let mut zone = ZoneOptions::new(id, TemplateZoneType::AiStart);
            zone.owner = Some(RaceType::Undead);
            template.contents.zones.insert(id, zone);
        }
        assert!(matches!(
            template.validate(),
            Err(GenError::TemplateInvalid(_))
        ));
    }

    #[test]
    fn alliance_and_war_exclusive() {
        let mut template = base_template();
        template.contents.diplomacy.push(DiplomacyRelation {
            race_a: RaceType::Human,
            race_b: RaceType::Undead,
            relation: 50,
            alliance: true,
            always_at_war: true,
            permanent_alliance: false,
        });
        assert!(template.validate().is_err());
    }

    #[test]
    fn permanent_alliance_requires_alliance() {
        let mut template = base_template();
        template.contents.diplomacy.push(DiplomacyRelation {
            race_a: RaceType::Human,
            race_b: RaceType::Undead,
            relation: 80,
            alliance: false,
            always_at_war: false,
            permanent_alliance: true,
        });
        assert!(template.validate().is_err());
    }

    #[test]
    fn duplicate_relations_rejected() {
        let mut template = base_template();
        let relation = DiplomacyRelation {
            race_a: RaceType::Human,
            race_b: RaceType::Undead,
            relation: 40,
            alliance: false,
            always_at_war: false,
            permanent_alliance: false,
        };
        let mut mirrored = relation.clone();
        mirrored.race_a = RaceType::Undead;
        mirrored.race_b = RaceType::Human;
        template.contents.diplomacy.push(relation);
        template.contents.diplomacy.push(mirrored);
        assert!(template.validate().is_err());
    }

    #[test]
    fn starting_zone_needs_owner() {
        let mut template = base_template();
        template.contents.zones.get_mut(&0).unwrap().owner = None;
        assert!(template.validate().is_err());
    }
}

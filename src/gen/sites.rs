//! City, site and ruin builders
//!
//! Each sub-placer probes the zone for a spot, retries on placement
//! failures and gives up with `LackOfSpace` once the zone has no candidate
//! tiles left. The builders mirror each other: roll flavor text and image,
//! generate the variant's contents from its budget, commit the object and
//! guard it.

use std::collections::BTreeSet;

use crate::catalog::pickers::{pick_spell, pick_unit};
use crate::catalog::{SpellInfo, UnitInfo};
use crate::core::error::{GenError, Result};
use crate::core::types::{ObjectId, ObjectType, Position};
use crate::gen::decoration::Decoration;
use crate::gen::zone::{ObjectPlacingResult, ZoneFiller};
use crate::map::objects::GROUP_SIZE;
use crate::map::{
    Currency, FortKind, Fortification, Group, Inventory, MapElement, MercenaryStock, Site,
    SiteKind, TerrainType,
};
use crate::template::{
    CityInfo, MageInfo, MercenaryInfo, MerchantInfo, OrderType, ResourceMarketInfo, RuinInfo,
    TrainerInfo,
};

impl ZoneFiller<'_> {
    /// Builds the owner's capital at the zone center: garrison with an
    /// optional guardian, starting items, the starting leader stack inside,
    /// plus granted spells and buildings.
    pub(crate) fn place_capital(&mut self) -> Result<()> {
        let options = self.options;
        let capital = &options.capital;

        let owner_id = self
            .zone
            .owner_id
            .ok_or_else(|| GenError::Internal(format!("zone {} has no owner", self.zone.id)))?;
        let race = self
            .map
            .player_race(owner_id)
            .ok_or_else(|| GenError::Internal("capital owner is not a player".into()))?;
        let race_info = self
            .catalogs
            .race(race)
            .ok_or_else(|| GenError::CatalogMissing(format!("race {race:?}")))?
            .clone();

        let fort_id = self.map.create_id(ObjectType::Fortification);

        let name = if capital.name.is_empty() {
            self.rng
                .pick_element(&self.catalogs.city_names)
                .cloned()
                .unwrap_or_default()
        } else {
            capital.name.clone()
        };

        let mut fort = Fortification {
            id: fort_id,
            element: MapElement::square(5),
            kind: FortKind::Capital,
            name,
            owner: Some(owner_id),
            subrace: race.subrace(),
            garrison: Group::default(),
            inventory: Inventory::default(),
            visitor_stack: None,
            gap_mask: capital.gap_mask,
            ai_priority: capital.ai_priority,
        };

        let guardian_info = self
            .catalogs
            .unit(race_info.guardian_unit)
            .ok_or_else(|| {
                GenError::CatalogMissing(format!("guardian unit {:?}", race_info.guardian_unit))
            })?
            .clone();

        // The capital can fit an entire group in its garrison
        let mut positions: BTreeSet<usize> = (0..GROUP_SIZE).collect();
        let mut units: crate::gen::stacks::GroupUnits = [None; GROUP_SIZE];
        if capital.guardian {
            // The center slot is reserved for the guardian
            positions.remove(&2);
            units[2] = Some(guardian_info.id);
            if guardian_info.big {
                positions.remove(&3);
                units[3] = Some(guardian_info.id);
            }
        }

        let garrison_value = self.rng.pick_value(capital.garrison.value);
        let values = self.rng.constrained_sum(GROUP_SIZE, garrison_value);

        let mut unused_value = 0u32;
        let subraces = &capital.garrison.subrace_types;
        self.create_group(&mut unused_value, &mut positions, &mut units, &values, subraces);
        self.tighten_group(&mut unused_value, &mut positions, &mut units, subraces);
        let mut garrison = Group::default();
        self.create_group_units(&mut garrison, &units)?;
        fort.garrison = garrison;

        // Starting items
        let loot = self.create_loot(&capital.garrison.loot, false);
        for (item_type, amount) in loot {
            for _ in 0..amount {
                let item_id = self.create_item(item_type)?;
                fort.inventory.add(item_id);
            }
        }

        // Starting leader and its stack, stationed inside the capital
        let leader_info = self
            .catalogs
            .unit(race_info.leader_unit)
            .ok_or_else(|| {
                GenError::CatalogMissing(format!("leader unit {:?}", race_info.leader_unit))
            })?
            .clone();

        let mut stack = self.create_stack_from_units(&leader_info, 2, &[None; GROUP_SIZE])?;
        stack.inside = Some(fort_id);
        stack.owner = Some(owner_id);
        stack.subrace = race.subrace();
        stack.order = OrderType::Normal;
        fort.visitor_stack = Some(stack.id);

        // Granted spells and buildings
        let player = self.map.player_mut(owner_id)?;
        player.known_spells.extend(capital.spells.iter().copied());
        player.buildings.extend(capital.buildings.iter().copied());

        self.zone.decorations.push(Decoration::capital(fort_id));

        // The capital sits at the center of the zone
        let element = fort.element;
        let position = self.zone.pos - element.size() / 2;
        self.place_fortification(fort, position, TerrainType::from_race(race))?;

        let mut placed_element = element;
        placed_element.set_position(position);
        self.clear_entrance(&placed_element);
        // All roads lead to the tile next to the capital entrance
        self.zone.pos = placed_element.entrance() + Position::new(1, 1);

        self.place_stack_object(stack, position)?;

        Ok(())
    }

    /// Builds a neutral city of the declared tier, with a tier-sized
    /// garrison layout and a visitor stack inside. Returns the entrance.
    pub(crate) fn place_city(&mut self, position: Position, info: &CityInfo) -> Result<Position> {
        let city_id = self.map.create_id(ObjectType::Fortification);

        let (owner_id, subrace) = self.resolve_owner(info.owner);
        let neutral_owner = self.is_neutral_owner(owner_id);

        let name = if info.name.is_empty() {
            self.rng
                .pick_element(&self.catalogs.city_names)
                .cloned()
                .unwrap_or_default()
        } else {
            info.name.clone()
        };

        let mut fort = Fortification {
            id: city_id,
            element: MapElement::square(4),
            kind: FortKind::Village { tier: info.tier },
            name,
            owner: owner_id,
            subrace,
            garrison: Group::default(),
            inventory: Inventory::default(),
            visitor_stack: None,
            gap_mask: info.gap_mask,
            ai_priority: info.ai_priority,
        };

        // Garrison
        if !info.garrison.value.is_zero() {
            let value = self.rng.pick_value(info.garrison.value);
            let values = self.rng.constrained_sum(info.tier as usize, value);

            let mut positions: BTreeSet<usize> = BTreeSet::new();
            match info.tier {
                1 => {
                    // A tier 1 city always has a melee defender in the
                    // center
                    positions.insert(2);
                }
                2 => {
                    positions.insert(2);
                    let possible: BTreeSet<usize> = [0, 1, 3, 4, 5].into_iter().collect();
                    positions.insert(*self.rng.pick_from_set(&possible).expect("non-empty"));
                }
                3 => {
                    positions.insert(2);
                    let mut possible: BTreeSet<usize> = [0, 1, 3, 4, 5].into_iter().collect();
                    let first = *self.rng.pick_from_set(&possible).expect("non-empty");
                    possible.remove(&first);
                    positions.insert(first);
                    positions.insert(*self.rng.pick_from_set(&possible).expect("non-empty"));
                }
                _ => {
                    // Tier 4 and 5 exclude random slots instead
                    let mut possible: BTreeSet<usize> = (0..GROUP_SIZE).collect();
                    for _ in info.tier..GROUP_SIZE as u8 {
                        let excluded = *self.rng.pick_from_set(&possible).expect("non-empty");
                        possible.remove(&excluded);
                    }
                    positions = possible;
                }
            }

            let mut unused_value = 0u32;
            let mut units: crate::gen::stacks::GroupUnits = [None; GROUP_SIZE];
            let subraces = info.garrison.subrace_types.clone();
            self.create_group(&mut unused_value, &mut positions, &mut units, &values, &subraces);
            self.tighten_group(&mut unused_value, &mut positions, &mut units, &subraces);
            let mut garrison = Group::default();
            self.create_group_units(&mut garrison, &units)?;
            fort.garrison = garrison;
        }

        // Garrison items
        for (item_type, amount) in self.create_loot(&info.garrison.loot, false) {
            for _ in 0..amount {
                let item_id = self.create_item(item_type)?;
                fort.inventory.add(item_id);
            }
        }

        // Visitor stack
        let visitor = self.create_stack(&info.stack, neutral_owner)?;
        let mut visitor = visitor.map(|mut stack| {
            fort.visitor_stack = Some(stack.id);
            stack.inside = Some(city_id);
            stack.owner = owner_id;
            stack.subrace = subrace;
            stack.order = info.stack.order;
            stack.ai_priority = info.stack.ai_priority;
            stack
        });
        if let Some(stack) = &visitor {
            if !info.stack.name.is_empty() {
                if let Some(leader) = stack.leader {
                    self.map.unit_mut(leader)?.name = info.stack.name.clone();
                }
            }
            for modifier in &info.stack.leader_modifiers {
                if let Some(leader) = stack.leader {
                    self.map.unit_mut(leader)?.add_modifier(*modifier);
                }
            }
        }

        self.zone.decorations.push(Decoration::village(city_id, info.tier));

        let mut element = fort.element;
        element.set_position(position);
        self.place_fortification(fort, position, TerrainType::Neutral)?;
        self.clear_entrance(&element);

        if let Some(stack) = visitor.take() {
            self.place_stack_object(stack, position)?;
        }

        Ok(element.entrance())
    }

    /// Places the remaining neutral cities; the first one was placed at
    /// the zone center when towns were initialized.
    pub(crate) fn place_cities(&mut self) -> Result<()> {
        let skip = if self.options.is_start() { 0 } else { 1 };
        let cities = self.options.neutral_cities.clone();

        for info in cities.iter().skip(skip) {
            let probe = MapElement::square(4);
            let min_distance = (probe.size().x * 2) as f32;

            loop {
                let area = self.zone.tile_info.clone();
                let Some(position) = self.find_place_for_object(&area, &probe, min_distance, true)
                else {
                    return Err(self.lack_of_space("city placement"));
                };

                let mut element = probe;
                if self.try_to_place_object_and_connect_to_path(&mut element, position)
                    == ObjectPlacingResult::Success
                {
                    tracing::debug!(zone = self.zone.id, %position, "create city");
                    self.place_city(position, info)?;
                    break;
                }
            }
        }

        Ok(())
    }

    fn place_site_at_found_spot<F>(&mut self, what: &str, mut build: F) -> Result<()>
    where
        F: FnMut(&mut Self, Position) -> Result<()>,
    {
        let probe = MapElement::square(3);
        let min_distance = (probe.size().x * 2) as f32;

        loop {
            let area = self.zone.tile_info.clone();
            let Some(position) = self.find_place_for_object(&area, &probe, min_distance, true)
            else {
                return Err(self.lack_of_space(format!("{what} placement")));
            };

            let mut element = probe;
            if self.try_to_place_object_and_connect_to_path(&mut element, position)
                == ObjectPlacingResult::Success
            {
                tracing::debug!(zone = self.zone.id, %position, "create {what}");
                build(self, position)?;
                return Ok(());
            }
        }
    }

    pub(crate) fn place_merchants(&mut self) -> Result<()> {
        let merchants = self.options.merchants.clone();
        for info in &merchants {
            self.place_site_at_found_spot("merchant", |filler, position| {
                let site_id = filler.place_merchant(position, info)?;
                filler.zone.decorations.push(Decoration::site(site_id));
                Ok(())
            })?;
        }
        Ok(())
    }

    pub(crate) fn place_mages(&mut self) -> Result<()> {
        let mages = self.options.mages.clone();
        for info in &mages {
            self.place_site_at_found_spot("mage", |filler, position| {
                let site_id = filler.place_mage(position, info)?;
                filler.zone.decorations.push(Decoration::site(site_id));
                Ok(())
            })?;
        }
        Ok(())
    }

    pub(crate) fn place_mercenaries(&mut self) -> Result<()> {
        let mercenaries = self.options.mercenaries.clone();
        for info in &mercenaries {
            self.place_site_at_found_spot("mercenary", |filler, position| {
                let site_id = filler.place_mercenary(position, info)?;
                filler.zone.decorations.push(Decoration::site(site_id));
                Ok(())
            })?;
        }
        Ok(())
    }

    pub(crate) fn place_trainers(&mut self) -> Result<()> {
        let trainers = self.options.trainers.clone();
        for info in &trainers {
            self.place_site_at_found_spot("trainer", |filler, position| {
                let site_id = filler.place_trainer(position, info)?;
                filler.zone.decorations.push(Decoration::site(site_id));
                Ok(())
            })?;
        }
        Ok(())
    }

    pub(crate) fn place_markets(&mut self) -> Result<()> {
        let markets = self.options.markets.clone();
        for info in &markets {
            self.place_site_at_found_spot("resource market", |filler, position| {
                let site_id = filler.place_market(position, info)?;
                filler.zone.decorations.push(Decoration::site(site_id));
                Ok(())
            })?;
        }
        Ok(())
    }

    pub(crate) fn place_ruins(&mut self) -> Result<()> {
        let ruins = self.options.ruins.clone();
        for info in &ruins {
            self.place_site_at_found_spot("ruin", |filler, position| {
                let ruin_id = filler.place_ruin(position, info)?;
                filler.zone.decorations.push(Decoration::ruin(ruin_id));
                Ok(())
            })?;
        }
        Ok(())
    }

    pub(crate) fn place_merchant(
        &mut self,
        position: Position,
        info: &MerchantInfo,
    ) -> Result<ObjectId> {
        let site_id = self.map.create_id(ObjectType::Site);

        let text = self
            .rng
            .pick_element(&self.catalogs.merchant_texts)
            .cloned()
            .unwrap_or_default_text();
        let title = if info.name.is_empty() { text.name } else { info.name.clone() };
        let description = if info.description.is_empty() {
            text.description
        } else {
            info.description.clone()
        };
        let image = self
            .rng
            .pick_element(&self.catalogs.settings.merchant_images)
            .copied()
            .unwrap_or(0);

        let goods = self.create_loot(&info.items, true);

        let site = Site {
            id: site_id,
            element: MapElement::square(3),
            kind: SiteKind::Merchant { goods },
            title,
            description,
            image,
            ai_priority: info.ai_priority,
        };

        let element = placed_element(&site.element, position);
        self.place_site_object(site, position)?;
        self.guard_object(&element, &info.guard)?;

        Ok(site_id)
    }

    pub(crate) fn place_mage(&mut self, position: Position, info: &MageInfo) -> Result<ObjectId> {
        let site_id = self.map.create_id(ObjectType::Site);

        let text = self
            .rng
            .pick_element(&self.catalogs.mage_texts)
            .cloned()
            .unwrap_or_default_text();
        let title = if info.name.is_empty() { text.name } else { info.name.clone() };
        let description = if info.description.is_empty() {
            text.description
        } else {
            info.description.clone()
        };
        let image = self
            .rng
            .pick_element(&self.catalogs.settings.mage_images)
            .copied()
            .unwrap_or(0);

        // Random spells of the declared types until the budget is spent
        let mut spells = BTreeSet::new();
        if !info.value.is_zero() {
            let catalogs = self.catalogs;
            let settings = self.settings;

            let desired_value = self.rng.pick_value(info.value);
            let mut current_value = 0u32;

            while current_value <= desired_value {
                let remaining_value = desired_value - current_value;

                let no_duplicates = |spell: &SpellInfo| spells.contains(&spell.id);
                let no_wrong_type = |spell: &SpellInfo| {
                    if info.spell_types.is_empty() {
                        return false;
                    }
                    !info.spell_types.contains(&spell.spell_type)
                };
                let no_wrong_level = |spell: &SpellInfo| {
                    if info.spell_levels.is_zero() {
                        return false;
                    }
                    (spell.level as u32) < info.spell_levels.min
                        || (spell.level as u32) > info.spell_levels.max
                };
                let no_wrong_value = |spell: &SpellInfo| spell.value > remaining_value;
                let no_forbidden_on_template =
                    |spell: &SpellInfo| settings.forbidden_spells.contains(&spell.id);
                let no_forbidden_spell =
                    |spell: &SpellInfo| catalogs.settings.forbidden_spells.contains(&spell.id);

                let Some(spell) = pick_spell(
                    catalogs,
                    self.rng,
                    &[
                        &no_wrong_type,
                        &no_wrong_level,
                        &no_wrong_value,
                        &no_forbidden_on_template,
                        &no_forbidden_spell,
                        &no_duplicates,
                    ],
                ) else {
                    break;
                };

                current_value += spell.value;
                spells.insert(spell.id);
            }
        }
        spells.extend(info.required_spells.iter().copied());

        let site = Site {
            id: site_id,
            element: MapElement::square(3),
            kind: SiteKind::Mage { spells },
            title,
            description,
            image,
            ai_priority: info.ai_priority,
        };

        let element = placed_element(&site.element, position);
        self.place_site_object(site, position)?;
        self.guard_object(&element, &info.guard)?;

        Ok(site_id)
    }

    pub(crate) fn place_mercenary(
        &mut self,
        position: Position,
        info: &MercenaryInfo,
    ) -> Result<ObjectId> {
        let site_id = self.map.create_id(ObjectType::Site);

        let text = self
            .rng
            .pick_element(&self.catalogs.mercenary_texts)
            .cloned()
            .unwrap_or_default_text();
        let title = if info.name.is_empty() { text.name } else { info.name.clone() };
        let description = if info.description.is_empty() {
            text.description
        } else {
            info.description.clone()
        };
        let image = self
            .rng
            .pick_element(&self.catalogs.settings.mercenary_images)
            .copied()
            .unwrap_or(0);

        // Random units of the declared subraces until the budget is spent
        let mut units: Vec<MercenaryStock> = Vec::new();
        if !info.value.is_zero() {
            let catalogs = self.catalogs;
            let settings = self.settings;

            let desired_value = self.rng.pick_value(info.value);
            let mut current_value = 0u32;

            while current_value <= desired_value {
                let remaining_value = desired_value - current_value;

                let no_wrong_type = |unit: &UnitInfo| {
                    if info.subrace_types.is_empty() {
                        return false;
                    }
                    !info.subrace_types.contains(&unit.subrace)
                };
                let no_wrong_value = |unit: &UnitInfo| {
                    if !info.enroll_value.is_zero()
                        && (unit.enroll_cost < info.enroll_value.min
                            || unit.enroll_cost > info.enroll_value.max)
                    {
                        return true;
                    }
                    unit.enroll_cost > remaining_value
                };
                let no_forbidden_on_template =
                    |unit: &UnitInfo| settings.forbidden_units.contains(&unit.id);
                let no_forbidden_unit =
                    |unit: &UnitInfo| catalogs.settings.forbidden_units.contains(&unit.id);

                let Some(unit) = pick_unit(
                    catalogs,
                    self.rng,
                    &[
                        &no_wrong_type,
                        &no_wrong_value,
                        &no_forbidden_on_template,
                        &no_forbidden_unit,
                    ],
                ) else {
                    break;
                };

                current_value += unit.enroll_cost;
                units.push(MercenaryStock { unit: unit.id, level: unit.level, unique: true });
            }
        }
        for required in &info.required_units {
            units.push(MercenaryStock {
                unit: required.unit,
                level: required.level,
                unique: required.unique,
            });
        }

        let site = Site {
            id: site_id,
            element: MapElement::square(3),
            kind: SiteKind::Mercenary { units },
            title,
            description,
            image,
            ai_priority: info.ai_priority,
        };

        let element = placed_element(&site.element, position);
        self.place_site_object(site, position)?;
        self.guard_object(&element, &info.guard)?;

        Ok(site_id)
    }

    pub(crate) fn place_trainer(
        &mut self,
        position: Position,
        info: &TrainerInfo,
    ) -> Result<ObjectId> {
        let site_id = self.map.create_id(ObjectType::Site);

        let text = self
            .rng
            .pick_element(&self.catalogs.trainer_texts)
            .cloned()
            .unwrap_or_default_text();
        let title = if info.name.is_empty() { text.name } else { info.name.clone() };
        let description = if info.description.is_empty() {
            text.description
        } else {
            info.description.clone()
        };
        let image = self
            .rng
            .pick_element(&self.catalogs.settings.trainer_images)
            .copied()
            .unwrap_or(0);

        let site = Site {
            id: site_id,
            element: MapElement::square(3),
            kind: SiteKind::Trainer,
            title,
            description,
            image,
            ai_priority: info.ai_priority,
        };

        let element = placed_element(&site.element, position);
        self.place_site_object(site, position)?;
        self.guard_object(&element, &info.guard)?;

        Ok(site_id)
    }

    pub(crate) fn place_market(
        &mut self,
        position: Position,
        info: &ResourceMarketInfo,
    ) -> Result<ObjectId> {
        let site_id = self.map.create_id(ObjectType::Site);

        let text = self
            .rng
            .pick_element(&self.catalogs.market_texts)
            .cloned()
            .unwrap_or_default_text();
        let title = if info.name.is_empty() { text.name } else { info.name.clone() };
        let description = if info.description.is_empty() {
            text.description
        } else {
            info.description.clone()
        };
        let image = self
            .rng
            .pick_element(&self.catalogs.settings.market_images)
            .copied()
            .unwrap_or(0);

        let mut stock = Currency::default();
        let mut infinite_stock = BTreeSet::new();
        for (resource, stock_info) in &info.stock {
            if stock_info.infinite {
                infinite_stock.insert(*resource);
            } else {
                stock.set(*resource, self.rng.pick_value(stock_info.amount) as u16);
            }
        }

        let site = Site {
            id: site_id,
            element: MapElement::square(3),
            kind: SiteKind::ResourceMarket {
                exchange_rates: info.exchange_rates.clone(),
                stock,
                infinite_stock,
            },
            title,
            description,
            image,
            ai_priority: info.ai_priority,
        };

        let element = placed_element(&site.element, position);
        self.place_site_object(site, position)?;
        self.guard_object(&element, &info.guard)?;

        Ok(site_id)
    }

    /// Builds a ruin with an internal guard group, a gold reward and one
    /// loot item.
    pub(crate) fn place_ruin(&mut self, position: Position, info: &RuinInfo) -> Result<ObjectId> {
        let ruin_id = self.map.create_id(ObjectType::Ruin);

        let text = self
            .rng
            .pick_element(&self.catalogs.ruin_texts)
            .cloned()
            .unwrap_or_default_text();
        let title = if info.name.is_empty() { text.name } else { info.name.clone() };
        let image = self
            .rng
            .pick_element(&self.catalogs.settings.ruin_images)
            .copied()
            .unwrap_or(0);

        let mut guard = Group::default();
        if !info.guard.value.is_zero() {
            let value = self.rng.pick_value(info.guard.value);
            let values = self.rng.constrained_sum(GROUP_SIZE, value);

            let mut unused_value = 0u32;
            let mut positions: BTreeSet<usize> = (0..GROUP_SIZE).collect();
            let mut units: crate::gen::stacks::GroupUnits = [None; GROUP_SIZE];
            let subraces = info.guard.subrace_types.clone();
            self.create_group(&mut unused_value, &mut positions, &mut units, &values, &subraces);
            self.tighten_group(&mut unused_value, &mut positions, &mut units, &subraces);
            self.create_group_units(&mut guard, &units)?;
        }

        let mut cash = Currency::default();
        if !info.gold.is_zero() {
            cash.set(
                crate::catalog::ResourceType::Gold,
                self.rng.pick_value(info.gold) as u16,
            );
        }

        let item = self.create_ruin_loot(&info.loot);

        let ruin = crate::map::Ruin {
            id: ruin_id,
            element: MapElement::square(3),
            title,
            image,
            guard,
            cash,
            item,
            ai_priority: info.ai_priority,
        };

        self.place_ruin_object(ruin, position)?;

        Ok(ruin_id)
    }

    /// Places a guard stack on a connection entry tile; no-op when the
    /// guard group carries no value.
    pub(crate) fn place_zone_guard(
        &mut self,
        position: Position,
        info: &crate::template::GroupInfo,
    ) -> Result<Option<ObjectId>> {
        if info.value.is_zero() {
            return Ok(None);
        }

        let Some(mut stack) = self.create_stack(info, true)? else {
            return Ok(None);
        };

        let (owner_id, subrace) = self.resolve_owner(info.owner);
        stack.owner = owner_id;
        stack.subrace = subrace;
        stack.order = info.order;
        stack.ai_priority = info.ai_priority;

        if !info.name.is_empty() {
            if let Some(leader) = stack.leader {
                self.map.unit_mut(leader)?.name = info.name.clone();
            }
        }
        for modifier in &info.leader_modifiers {
            if let Some(leader) = stack.leader {
                self.map.unit_mut(leader)?.add_modifier(*modifier);
            }
        }

        let stack_id = stack.id;
        self.place_stack_object(stack, position)?;
        Ok(Some(stack_id))
    }

    /// Places an empty bag; the image pool depends on the ground type.
    pub(crate) fn place_bag(&mut self, position: Position) -> Result<ObjectId> {
        let bag_id = self.map.create_id(ObjectType::Bag);

        let images = if self.map.tile(position).is_water() {
            &self.catalogs.settings.bag_water_images
        } else {
            &self.catalogs.settings.bag_land_images
        };
        let image = self.rng.pick_element(images).copied().unwrap_or(0);

        let bag = crate::map::Bag {
            id: bag_id,
            element: MapElement::square(1),
            image,
            items: Vec::new(),
            ai_priority: 0,
        };

        self.place_bag_object(bag, position)?;

        Ok(bag_id)
    }
}

fn placed_element(element: &MapElement, position: Position) -> MapElement {
    let mut element = *element;
    element.set_position(position);
    element
}

/// Fallback for empty text pools.
trait OrDefaultText {
    fn unwrap_or_default_text(self) -> crate::catalog::SiteText;
}

impl OrDefaultText for Option<crate::catalog::SiteText> {
    fn unwrap_or_default_text(self) -> crate::catalog::SiteText {
        self.unwrap_or(crate::catalog::SiteText {
            name: String::new(),
            description: String::new(),
        })
    }
}

//! Stack composer
//!
//! Turns a value budget into a concrete combat group: the budget is split
//! into unit-sized shares by constrained sum, a leader consumes the first
//! shares, soldiers fill random slots under line/reach/subrace filters,
//! and a tighten pass spends whatever value is left. Value that no pick
//! could consume rolls over to the next share so weak catalogs still
//! produce full-strength stacks.

use std::collections::BTreeSet;

use crate::catalog::pickers::{pick_leader, pick_unit};
use crate::catalog::{ReachType, SubRaceType, UnitId, UnitInfo};
use crate::core::error::{GenError, Result};
use crate::gen::zone::ZoneFiller;
use crate::map::objects::GROUP_SIZE;
use crate::map::{Facing, Group, Inventory, MapElement, ScenarioObject, Stack, Unit};
use crate::template::{GroupInfo, OrderType};

/// Picked unit types per group slot; a big unit appears in both slots of
/// its column.
pub(crate) type GroupUnits = [Option<UnitId>; GROUP_SIZE];

impl<'a> ZoneFiller<'a> {
    /// Creates a stack from a group budget. Returns `None` when the budget
    /// requests nothing. The stack is populated but not yet placed; its
    /// units and loot items are already part of the map.
    pub fn create_stack(
        &mut self,
        info: &GroupInfo,
        _neutral_owner: bool,
    ) -> Result<Option<Stack>> {
        if info.value.is_zero() {
            return Ok(None);
        }

        let strength = self.rng.pick_value(info.value);

        let min_leader_value = self.catalogs.settings.min_leader_value;
        let min_soldier_value = self.catalogs.settings.min_soldier_value.max(1);

        // Don't roll more soldiers than a low-strength budget can pay for
        let soldiers_strength = strength.saturating_sub(min_leader_value);
        let max_units_possible = 5.min(soldiers_strength / min_soldier_value) as i64;
        // Soldier count affects both the leader pick and the final
        // contents
        let soldiers_total = self.rng.next_int(0, max_units_possible) as usize;
        let units_total = soldiers_total + 1;

        let unit_values = self.rng.constrained_sum(units_total, strength);

        let mut unused_value = 0u32;
        let mut values_consumed = 0usize;

        let mut leader_info: Option<&'a UnitInfo> = None;
        if !info.leader_ids.is_empty() {
            leader_info = self.pick_stack_leader(
                &mut unused_value,
                &mut values_consumed,
                &unit_values,
                &info.leader_ids,
            );
        }
        if leader_info.is_none() {
            leader_info = self.create_stack_leader(
                &mut unused_value,
                &mut values_consumed,
                &unit_values,
                &info.subrace_types,
            );
        }
        let leader_info = leader_info.ok_or_else(|| {
            GenError::CatalogMissing(format!(
                "could not pick stack leader; stack value {strength}, units {units_total}"
            ))
        })?;

        let mut positions: BTreeSet<usize> = (0..GROUP_SIZE).collect();
        let mut leader_slot = 2usize;

        if leader_info.big {
            // Big leaders take the whole center column
            positions.remove(&leader_slot);
            positions.remove(&(leader_slot + 1));
        } else if leader_info.support || leader_info.reach != ReachType::Adjacent {
            // Supports and ranged leaders go to the back center
            leader_slot = 3;
            positions.remove(&leader_slot);
        } else {
            positions.remove(&leader_slot);
        }

        let mut soldiers: GroupUnits = [None; GROUP_SIZE];

        // Pick soldiers one by one from the values the leader didn't use
        if values_consumed < unit_values.len() {
            let soldier_values = unit_values[values_consumed..].to_vec();
            self.create_group(
                &mut unused_value,
                &mut positions,
                &mut soldiers,
                &soldier_values,
                &info.subrace_types,
            );
        }

        // Spend leftover value; this reduces the number of stacks that end
        // up as a lone ranged or support leader
        self.tighten_group(
            &mut unused_value,
            &mut positions,
            &mut soldiers,
            &info.subrace_types,
        );

        if tracing::enabled!(tracing::Level::DEBUG) {
            let mut created_value = leader_info.value;
            let mut units_created = 1usize;
            let mut slot = 0;
            while slot < GROUP_SIZE {
                if let Some(unit) = soldiers[slot] {
                    if let Some(unit_info) = self.catalogs.unit(unit) {
                        units_created += 1;
                        created_value += unit_info.value;
                        if unit_info.big {
                            slot += 1;
                        }
                    }
                }
                slot += 1;
            }
            tracing::debug!(
                strength,
                created_value,
                unused = strength.saturating_sub(created_value),
                units_total,
                units_created,
                "stack composed"
            );
        }

        let mut stack = self.create_stack_from_units(leader_info, leader_slot, &soldiers)?;

        // Cover any leadership deficit with modifier items
        let mut leadership_required: u32 = if leader_info.big { 2 } else { 1 };
        let mut slot = 0;
        while slot < GROUP_SIZE {
            if let Some(unit) = soldiers[slot] {
                leadership_required += 1;
                if self.catalogs.unit(unit).map(|u| u.big).unwrap_or(false) {
                    leadership_required += 1;
                    slot += 1;
                }
            }
            slot += 1;
        }

        if (leader_info.leadership as u32) < leadership_required {
            let modifier = self.catalogs.settings.leadership_modifier;
            let diff = leadership_required - leader_info.leadership as u32;
            if let Some(leader_id) = stack.leader {
                for _ in 0..diff {
                    self.map.unit_mut(leader_id)?.add_modifier(modifier);
                }
            }
        }

        for (item_type, amount) in self.create_loot(&info.loot, false) {
            for _ in 0..amount {
                let item_id = self.create_item(item_type)?;
                stack.inventory.add(item_id);
            }
        }

        Ok(Some(stack))
    }

    /// Creates the stack object, its leader unit and soldier units.
    pub(crate) fn create_stack_from_units(
        &mut self,
        leader_info: &UnitInfo,
        leader_slot: usize,
        soldiers: &GroupUnits,
    ) -> Result<Stack> {
        let facing = Facing::from_index(self.rng.next_int(0, Facing::COUNT - 1));

        let stack_id = self.map.create_id(crate::core::types::ObjectType::Stack);

        let leader_id = self.map.create_id(crate::core::types::ObjectType::Unit);
        self.map.insert_object(ScenarioObject::Unit(Unit {
            id: leader_id,
            impl_id: leader_info.id,
            level: leader_info.level,
            hp: leader_info.hp,
            name: leader_info.name.clone(),
            modifiers: Vec::new(),
        }))?;

        let mut group = Group::default();
        if !group.add_leader(leader_id, leader_slot, leader_info.big) {
            return Err(GenError::Internal(format!(
                "leader does not fit into slot {leader_slot}"
            )));
        }

        self.create_group_units(&mut group, soldiers)?;

        Ok(Stack {
            id: stack_id,
            element: MapElement::square(1),
            group,
            inventory: Inventory::default(),
            leader: Some(leader_id),
            owner: None,
            subrace: SubRaceType::Neutral,
            inside: None,
            move_points: leader_info.move_points,
            facing,
            order: OrderType::Normal,
            ai_priority: 0,
        })
    }

    /// Leader pick restricted to an explicit id set. Shares are consumed
    /// until they cover the picked leader's value; the surplus rolls over
    /// to the soldiers.
    pub(crate) fn pick_stack_leader(
        &mut self,
        unused_value: &mut u32,
        values_consumed: &mut usize,
        unit_values: &[u32],
        leader_ids: &BTreeSet<UnitId>,
    ) -> Option<&'a UnitInfo> {
        let catalogs = self.catalogs;

        let required = |info: &UnitInfo| !leader_ids.contains(&info.id);
        let leader_info = pick_leader(catalogs, self.rng, &[&required])?;

        let mut unused = *unused_value;
        for (i, &value) in unit_values.iter().enumerate() {
            unused += value;
            *values_consumed = i + 1;
            if i == 0 && leader_info.big {
                continue;
            }
            if unused > leader_info.value {
                break;
            }
        }

        *unused_value = unused.saturating_sub(leader_info.value);
        Some(leader_info)
    }

    /// Leader pick by value gradient: starting from 65% of the running
    /// budget, each full sweep without a match relaxes the minimum by 15%,
    /// up to five sweeps, before settling for the weakest leader so the
    /// stack still exists.
    pub(crate) fn create_stack_leader(
        &mut self,
        unused_value: &mut u32,
        values_consumed: &mut usize,
        unit_values: &[u32],
        allowed_subraces: &BTreeSet<SubRaceType>,
    ) -> Option<&'a UnitInfo> {
        let catalogs = self.catalogs;
        let settings = self.settings;

        const TOTAL_FAILS: usize = 5;
        const MIN_VALUE_COEFF_DECREASE: f32 = 0.15;

        let mut min_value_coeff: f32 = 0.65;
        let mut failed_attempts = 0usize;

        while failed_attempts < TOTAL_FAILS {
            let mut unused = *unused_value;

            for (i, &unit_value) in unit_values.iter().enumerate() {
                let value = unit_value + unused;
                let min_value = value as f32 * min_value_coeff;
                // A big leader can't fit when the budget is split six ways
                let can_place_big = unit_values.len() < 6;

                let filter = |info: &UnitInfo| {
                    if !allowed_subraces.is_empty() && !allowed_subraces.contains(&info.subrace) {
                        return true;
                    }
                    if !can_place_big && info.big {
                        return true;
                    }
                    (info.value as f32) < min_value || info.value > value
                };
                let no_forbidden_on_template =
                    |info: &UnitInfo| settings.forbidden_units.contains(&info.id);
                let no_forbidden_unit =
                    |info: &UnitInfo| catalogs.settings.forbidden_units.contains(&info.id);

                if let Some(leader_info) = pick_leader(
                    catalogs,
                    self.rng,
                    &[&filter, &no_forbidden_on_template, &no_forbidden_unit],
                ) {
                    *unused_value = value - leader_info.value;
                    *values_consumed = i + 1;
                    return Some(leader_info);
                }

                // Consume the next share and remember everything unused
                unused = value;
            }

            min_value_coeff = (min_value_coeff - MIN_VALUE_COEFF_DECREASE).max(0.0);
            failed_attempts += 1;
        }

        // Constraints are too tight for this budget; place the weakest
        // leader rather than lose the stack
        let weakest = catalogs
            .units
            .values()
            .find(|info| info.leader && info.value == catalogs.settings.min_leader_value);
        if let Some(info) = weakest {
            tracing::warn!("could not pick leader, placing weakest");
            *unused_value = 0;
            *values_consumed = 0;
            return Some(info);
        }

        None
    }

    /// Fills free slots with soldiers, one budget share at a time.
    pub(crate) fn create_group(
        &mut self,
        unused_value: &mut u32,
        positions: &mut BTreeSet<usize>,
        group_units: &mut GroupUnits,
        unit_values: &[u32],
        allowed_subraces: &BTreeSet<SubRaceType>,
    ) {
        let catalogs = self.catalogs;
        let settings = self.settings;

        for i in 0..unit_values.len() {
            if positions.is_empty() {
                break;
            }

            let value = unit_values[i] + *unused_value;
            let min_value_coeff = 0.95 - positions.len() as f32 * 0.05;
            let min_value = value as f32 * min_value_coeff;

            let no_wrong_value =
                |info: &UnitInfo| (info.value as f32) < min_value || info.value > value;

            let mut position = *self
                .rng
                .pick_from_set(positions)
                .expect("positions is not empty");

            // Front line takes melee only
            let frontline = position % 2 == 0;
            let second_position = if frontline { position + 1 } else { position - 1 };
            // A big unit needs its whole column free, and enough slots to
            // spare
            let can_place_big = positions.contains(&position)
                && positions.contains(&second_position)
                && positions.len() > unit_values.len();

            let filter = |info: &UnitInfo| {
                if !allowed_subraces.is_empty() && !allowed_subraces.contains(&info.subrace) {
                    return true;
                }
                if !can_place_big && info.big {
                    return true;
                }
                // Line and reach don't matter for big units
                if can_place_big {
                    return false;
                }
                if frontline && info.reach != ReachType::Adjacent {
                    return true;
                }
                if !frontline && info.reach == ReachType::Adjacent {
                    return true;
                }
                false
            };
            let no_forbidden_on_template =
                |info: &UnitInfo| settings.forbidden_units.contains(&info.id);
            let no_forbidden_unit =
                |info: &UnitInfo| catalogs.settings.forbidden_units.contains(&info.id);

            let picked = pick_unit(
                catalogs,
                self.rng,
                &[
                    &filter,
                    &no_wrong_value,
                    &no_forbidden_on_template,
                    &no_forbidden_unit,
                ],
            );

            if let Some(info) = picked {
                *unused_value = value - info.value;

                if info.big {
                    positions.remove(&position);
                    group_units[position] = Some(info.id);
                    positions.remove(&second_position);
                    group_units[second_position] = Some(info.id);
                } else {
                    // The column was free, so a small unit can move to the
                    // line its reach prefers
                    if can_place_big && frontline && info.reach != ReachType::Adjacent {
                        position = second_position;
                    } else if can_place_big && !frontline && info.reach == ReachType::Adjacent {
                        position = second_position;
                    }

                    positions.remove(&position);
                    group_units[position] = Some(info.id);
                }
            } else {
                // Accumulate unused value
                *unused_value += unit_values[i];
            }
        }
    }

    /// Keeps adding soldiers while slots and value remain, relaxing the
    /// minimum value expectation after each failed pick.
    pub(crate) fn tighten_group(
        &mut self,
        unused_value: &mut u32,
        positions: &mut BTreeSet<usize>,
        group_units: &mut GroupUnits,
        allowed_subraces: &BTreeSet<SubRaceType>,
    ) {
        let catalogs = self.catalogs;
        let settings = self.settings;

        const TOTAL_FAILS: usize = 200;

        let mut min_value_coeff = 1.0 - positions.len() as f32 * 0.05;
        let mut failed_attempts = 0usize;

        while failed_attempts < TOTAL_FAILS
            && !positions.is_empty()
            && *unused_value >= catalogs.settings.min_soldier_value
        {
            let value = *unused_value;
            let min_value = value as f32 * min_value_coeff;

            let no_wrong_value =
                |info: &UnitInfo| (info.value as f32) < min_value || info.value > value;

            let mut position = *self
                .rng
                .pick_from_set(positions)
                .expect("positions is not empty");

            let frontline = position % 2 == 0;
            let second_position = if frontline { position + 1 } else { position - 1 };
            let can_place_big =
                positions.contains(&position) && positions.contains(&second_position);

            let filter = |info: &UnitInfo| {
                if !allowed_subraces.is_empty() && !allowed_subraces.contains(&info.subrace) {
                    return true;
                }
                if !can_place_big && info.big {
                    return true;
                }
                if can_place_big {
                    return false;
                }
                if frontline && info.reach != ReachType::Adjacent {
                    return true;
                }
                if !frontline && info.reach == ReachType::Adjacent {
                    return true;
                }
                false
            };
            let no_forbidden_on_template =
                |info: &UnitInfo| settings.forbidden_units.contains(&info.id);
            let no_forbidden_unit =
                |info: &UnitInfo| catalogs.settings.forbidden_units.contains(&info.id);

            let picked = pick_unit(
                catalogs,
                self.rng,
                &[
                    &filter,
                    &no_wrong_value,
                    &no_forbidden_on_template,
                    &no_forbidden_unit,
                ],
            );

            if let Some(info) = picked {
                *unused_value = value - info.value;
                failed_attempts = 0;

                if info.big {
                    positions.remove(&position);
                    group_units[position] = Some(info.id);
                    positions.remove(&second_position);
                    group_units[second_position] = Some(info.id);
                } else {
                    if can_place_big && frontline && info.reach != ReachType::Adjacent {
                        position = second_position;
                    } else if can_place_big && !frontline && info.reach == ReachType::Adjacent {
                        position = second_position;
                    }

                    positions.remove(&position);
                    group_units[position] = Some(info.id);
                }

                min_value_coeff = 1.0 - positions.len() as f32 * 0.05;
            } else {
                min_value_coeff = (min_value_coeff - 0.05).max(0.0);
                failed_attempts += 1;
            }
        }
    }

    /// Instantiates unit objects for the picked types and slots them into
    /// a group.
    pub(crate) fn create_group_units(
        &mut self,
        group: &mut Group,
        group_units: &GroupUnits,
    ) -> Result<()> {
        let mut slot = 0;
        while slot < GROUP_SIZE {
            let Some(unit_type) = group_units[slot] else {
                slot += 1;
                continue;
            };

            let info = self
                .catalogs
                .unit(unit_type)
                .ok_or_else(|| GenError::CatalogMissing(format!("unit {unit_type:?}")))?;
            let (impl_id, level, hp, name, big) = (
                info.id,
                info.level,
                info.hp,
                info.name.clone(),
                info.big,
            );

            let unit_id = self.map.create_id(crate::core::types::ObjectType::Unit);
            self.map.insert_object(ScenarioObject::Unit(Unit {
                id: unit_id,
                impl_id,
                level,
                hp,
                name,
                modifiers: Vec::new(),
            }))?;

            if !group.add_unit(unit_id, slot, big) {
                return Err(GenError::Internal(format!(
                    "unit does not fit into slot {slot}"
                )));
            }

            if big {
                // Skip the second half of the big unit
                slot += 1;
            }
            slot += 1;
        }

        Ok(())
    }
}

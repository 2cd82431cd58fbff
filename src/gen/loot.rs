//! Loot composer
//!
//! Required items are instantiated first, then random items are drawn to
//! fill the rolled value budget. Every draw runs the full filter list;
//! generation stops as soon as no candidate fits the remaining value.

use crate::catalog::pickers::pick_item;
use crate::catalog::{ItemId, ItemInfo, ItemType};
use crate::gen::zone::ZoneFiller;
use crate::template::LootInfo;

impl ZoneFiller<'_> {
    /// Generates item types and amounts for a loot budget. Merchant goods
    /// never include valuables.
    pub fn create_loot(&mut self, loot: &LootInfo, for_merchant: bool) -> Vec<(ItemId, u32)> {
        let catalogs = self.catalogs;
        let settings = self.settings;

        let mut items: Vec<(ItemId, u32)> = Vec::new();

        // Required items; the template may roll their amount down to zero
        for required in &loot.required_items {
            let amount = self.rng.pick_value(required.amount);
            if amount > 0 {
                items.push((required.item, amount));
            }
        }

        if loot.value.is_zero() {
            return items;
        }

        let desired_value = self.rng.pick_value(loot.value);
        let mut current_value = 0u32;
        let mut picked = 0usize;

        let no_wrong_type = |info: &ItemInfo| {
            if for_merchant && info.item_type == ItemType::Valuable {
                return true;
            }
            if loot.item_types.is_empty() {
                return false;
            }
            !loot.item_types.contains(&info.item_type)
        };
        let no_special_item = |info: &ItemInfo| info.item_type == ItemType::Special;
        let no_forbidden_on_template = |info: &ItemInfo| settings.forbidden_items.contains(&info.id);
        let no_forbidden_item =
            |info: &ItemInfo| catalogs.settings.forbidden_items.contains(&info.id);

        while current_value <= desired_value {
            let remaining_value = desired_value - current_value;

            let no_wrong_value = |info: &ItemInfo| {
                if !loot.item_value.is_zero()
                    && (info.value < loot.item_value.min || info.value > loot.item_value.max)
                {
                    return true;
                }
                info.value > remaining_value
            };

            let Some(item) = pick_item(
                catalogs,
                self.rng,
                &[
                    &no_wrong_type,
                    &no_wrong_value,
                    &no_special_item,
                    &no_forbidden_on_template,
                    &no_forbidden_item,
                ],
            ) else {
                // Nothing fits the remaining value
                break;
            };

            picked += 1;
            current_value += item.value;
            items.push((item.id, 1));
        }

        tracing::debug!(desired_value, current_value, picked, "loot composed");

        items
    }

    /// Ruins hold exactly one reward item.
    pub(crate) fn create_ruin_loot(&mut self, loot: &LootInfo) -> Option<ItemId> {
        self.create_loot(loot, false).first().map(|(id, _)| *id)
    }
}

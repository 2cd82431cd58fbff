//! Zone filler
//!
//! Per-zone orchestration of the generation pipeline: carve the free-tile
//! network, place every declared object on it, guard and decorate them,
//! then turn the leftovers into borders, obstacles and forests and wire the
//! road network. The filler borrows the map, the occupancy grid and the
//! RNG for the duration of its zone; zones are filled strictly one after
//! another so the RNG stream stays reproducible.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalogs, MountainDesc, RaceType, SubRaceType};
use crate::core::error::{GenError, Result};
use crate::core::rng::Rng;
use crate::core::types::{ObjectId, Position};
use crate::gen::decoration::Decoration;
use crate::gen::occupancy::{OccupancyGrid, TileState};
use crate::map::{GroundType, MapElement, ScenarioMap, ScenarioObject, TerrainType};
use crate::template::{GroupInfo, LootInfo, TemplateSettings, TemplateZoneType, ZoneOptions};

/// A built road: endpoints plus every tile the road runs through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadInfo {
    pub source: Position,
    pub destination: Position,
    pub path: Vec<Position>,
}

/// Per-zone state that survives between generation phases.
#[derive(Debug)]
pub struct Zone {
    pub id: u32,
    /// Target point for path carving; moves next to the capital or central
    /// city entrance once towns are placed.
    pub pos: Position,
    /// The area assigned to this zone by the external layout step.
    pub tile_info: BTreeSet<Position>,
    /// Unclaimed tiles still available for objects.
    pub possible_tiles: BTreeSet<Position>,
    /// Carved walkable network every object is linked to.
    pub free_paths: BTreeSet<Position>,
    /// Tiles the road builder must connect.
    pub road_nodes: BTreeSet<Position>,
    pub roads: Vec<RoadInfo>,
    /// Player owning this zone, if any.
    pub owner_id: Option<ObjectId>,
    pub(crate) decorations: Vec<Decoration>,
}

impl Zone {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            pos: Position::default(),
            tile_info: BTreeSet::new(),
            possible_tiles: BTreeSet::new(),
            free_paths: BTreeSet::new(),
            road_nodes: BTreeSet::new(),
            roads: Vec::new(),
            owner_id: None,
            decorations: Vec::new(),
        }
    }
}

/// Outcome of a placement probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectPlacingResult {
    Success,
    /// No accessible neighbor tile; try another spot.
    CannotFit,
    /// Pathing failed and the surrounding area is now blocked for good.
    SealedOff,
}

/// An object queued for required/close placement.
pub(crate) struct PendingObject {
    pub object: ScenarioObject,
    pub decoration: Option<Decoration>,
    pub guard_strength: u32,
    /// When set, search with a probe of this size and center the real
    /// object inside the found area.
    pub probe_size: Option<Position>,
    /// Close objects gravitate here instead of the zone position.
    pub requested_position: Option<Position>,
}

pub struct ZoneFiller<'a> {
    pub(crate) zone: &'a mut Zone,
    pub(crate) options: &'a ZoneOptions,
    pub(crate) settings: &'a TemplateSettings,
    pub(crate) catalogs: &'a Catalogs,
    pub(crate) map: &'a mut ScenarioMap,
    pub(crate) grid: &'a mut OccupancyGrid,
    pub(crate) rng: &'a mut Rng,
    pub(crate) seed: u32,
    pub(crate) required_objects: Vec<PendingObject>,
    pub(crate) close_objects: Vec<PendingObject>,
}

impl<'a> ZoneFiller<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        zone: &'a mut Zone,
        options: &'a ZoneOptions,
        settings: &'a TemplateSettings,
        catalogs: &'a Catalogs,
        map: &'a mut ScenarioMap,
        grid: &'a mut OccupancyGrid,
        rng: &'a mut Rng,
        seed: u32,
    ) -> Self {
        Self {
            zone,
            options,
            settings,
            catalogs,
            map,
            grid,
            rng,
            seed,
            required_objects: Vec::new(),
            close_objects: Vec::new(),
        }
    }

    pub(crate) fn lack_of_space(&self, detail: impl Into<String>) -> GenError {
        GenError::LackOfSpace {
            zone: self.zone.id,
            seed: self.seed,
            detail: detail.into(),
        }
    }

    pub fn is_in_the_zone(&self, position: Position) -> bool {
        self.grid.zone_id(position) == Some(self.zone.id)
    }

    pub(crate) fn add_road_node(&mut self, position: Position) {
        self.zone.road_nodes.insert(position);
    }

    pub(crate) fn add_free_path(&mut self, position: Position) {
        self.grid.set_occupied(position, TileState::Free);
        self.zone.free_paths.insert(position);
    }

    /// Refreshes each possible tile's nearest-object distance after a
    /// placement at `position`.
    pub(crate) fn update_distances(&mut self, position: Position) {
        for &tile in self.zone.possible_tiles.iter() {
            let distance = position.distance_squared(tile);
            let current = self.grid.nearest_object_distance(tile);
            self.grid
                .set_nearest_object_distance(tile, distance.min(current));
        }
    }

    pub(crate) fn paint_zone_terrain(&mut self, terrain: TerrainType, ground: GroundType) {
        let tiles: Vec<Position> = self.zone.tile_info.iter().copied().collect();
        self.map.paint_terrain_tiles(tiles, terrain, ground);
    }

    /// Frees every unclaimed tile around a fortification entrance so the
    /// front door opens onto walkable ground.
    pub(crate) fn clear_entrance(&mut self, element: &MapElement) {
        for position in self.grid.neighbors(element.entrance() + Position::new(1, 1)) {
            if self.grid.is_possible(position) {
                self.grid.set_occupied(position, TileState::Free);
            }
        }
    }

    /// Maps a template owner race onto (player id, subrace), falling back
    /// to the neutral player.
    pub(crate) fn resolve_owner(&self, owner: Option<RaceType>) -> (Option<ObjectId>, SubRaceType) {
        if let Some(race) = owner {
            if let Some(player) = self.map.player_id(race) {
                return (Some(player), race.subrace());
            }
        }
        (
            self.map.player_id(RaceType::Neutral),
            SubRaceType::Neutral,
        )
    }

    pub(crate) fn is_neutral_owner(&self, owner: Option<ObjectId>) -> bool {
        owner == self.map.player_id(RaceType::Neutral)
    }

    // ---- fill phases -----------------------------------------------------

    pub fn init_terrain(&mut self) {
        if self.options.zone_type == TemplateZoneType::Water {
            self.paint_zone_terrain(TerrainType::Neutral, GroundType::Water);
        }
    }

    /// Places the capital (start zones) or the first neutral city at the
    /// zone center and retargets the zone position to its doorstep.
    pub fn init_towns(&mut self) -> Result<()> {
        if self.options.zone_type == TemplateZoneType::Water {
            return Ok(());
        }

        if self.options.is_start() {
            tracing::debug!(zone = self.zone.id, "preparing player zone");
            self.place_capital()?;
            return Ok(());
        }

        let options = self.options;
        if !options.neutral_cities.is_empty() {
            let position = self.zone.pos - Position::new(2, 2);
            let entrance = self.place_city(position, &options.neutral_cities[0])?;
            // All roads lead to the tile next to the central city entrance
            self.zone.pos = entrance + Position::new(1, 1);
        }

        Ok(())
    }

    pub fn init_free_tiles(&mut self) {
        let possible: Vec<Position> = self
            .zone
            .tile_info
            .iter()
            .copied()
            .filter(|&tile| self.grid.is_possible(tile))
            .collect();
        self.zone.possible_tiles.extend(possible);

        // The zone needs at least one free tile for other paths to reach
        if self.zone.free_paths.is_empty() {
            let position = self.zone.pos;
            self.add_free_path(position);
        }
    }

    /// Runs every placement step of the zone in template order.
    pub fn fill(&mut self) -> Result<()> {
        self.fractalize();
        self.place_cities()?;
        self.place_merchants()?;
        self.place_mages()?;
        self.place_mercenaries()?;
        self.place_trainers()?;
        self.place_markets()?;
        self.place_ruins()?;
        self.place_mines()?;
        self.create_required_objects()?;
        self.place_stacks()?;
        self.place_bags()?;

        tracing::debug!(zone = self.zone.id, "zone filled");
        Ok(())
    }

    /// Carves a sparse passage network through the zone's candidate tiles,
    /// then reserves the tiles far from any passage for obstacles.
    pub fn fractalize(&mut self) {
        for &tile in self.zone.tile_info.iter() {
            if self.grid.is_free(tile) {
                self.zone.free_paths.insert(tile);
            }
        }

        let mut cleared: Vec<Position> = self.zone.free_paths.iter().copied().collect();
        let mut possible: BTreeSet<Position> = self
            .zone
            .tile_info
            .iter()
            .copied()
            .filter(|&tile| self.grid.is_possible(tile))
            .collect();

        // Squared distance between passage nodes
        let min_distance: f32 = 7.5 * 10.0;

        let mut nodes: Vec<Position> = Vec::new();

        // Junction zones keep a single carved path; everything else
        // remains blocked
        if self.options.zone_type != TemplateZoneType::Junction {
            while !possible.is_empty() {
                let mut candidates: Vec<Position> = possible.iter().copied().collect();
                self.rng.shuffle(&mut candidates);

                let mut node_found = None;
                let mut ignored: Vec<Position> = Vec::new();

                for tile in candidates {
                    let mut current_distance = f32::INFINITY;
                    for clear in &cleared {
                        let distance = tile.distance_squared(*clear);
                        if distance < current_distance {
                            current_distance = distance;
                        }
                        if current_distance <= min_distance {
                            // Close enough to an existing passage
                            ignored.push(tile);
                            break;
                        }
                    }

                    if current_distance > min_distance {
                        node_found = Some(tile);
                        nodes.push(tile);
                        cleared.push(tile);
                        break;
                    }
                }

                for tile in ignored {
                    possible.remove(&tile);
                }

                if node_found.is_none() {
                    break;
                }
            }
        }

        // Cut straight paths from each node towards the network and its
        // two nearest sibling nodes
        for index in 0..nodes.len() {
            let node = nodes[index];

            let mut subnodes = nodes.clone();
            subnodes.sort_by(|a, b| {
                node.distance_squared(*a)
                    .partial_cmp(&node.distance_squared(*b))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            let target = find_closest_tile(&self.zone.free_paths, node).unwrap_or(node);
            self.crunch_path(node, target, true, true);

            for nearby in subnodes.iter().skip(1).take(2) {
                self.crunch_path(node, *nearby, true, true);
            }
        }

        for node in &nodes {
            self.grid.set_occupied(*node, TileState::Free);
        }

        // Reserve the tiles far from every passage for obstacles
        let block_distance = min_distance * 0.25;
        let tiles: Vec<Position> = self.zone.tile_info.iter().copied().collect();
        for tile in tiles {
            if !self.grid.is_possible(tile) || self.zone.free_paths.contains(&tile) {
                continue;
            }

            let close_tile_found = self
                .zone
                .free_paths
                .iter()
                .any(|clear| tile.distance_squared(*clear) < block_distance);

            if !close_tile_found {
                self.grid.set_occupied(tile, TileState::Blocked);
            }
        }
    }

    /// Queues the zone's resource crystals. The first gold and native mana
    /// crystals stay close to the owner's capital; the rest are spread like
    /// any required object.
    pub fn place_mines(&mut self) -> Result<()> {
        let owner_race = self
            .zone
            .owner_id
            .and_then(|id| self.map.player_race(id));
        let zone_has_owner = owner_race.is_some();

        let native_resource = self
            .catalogs
            .native_resource(owner_race.unwrap_or(RaceType::Neutral));
        let crystal_terrain =
            TerrainType::from_race(owner_race.unwrap_or(RaceType::Neutral));

        let mines = self.options.mines.clone();
        for (resource, count) in mines {
            for i in 0..count {
                let id = self.map.create_id(crate::core::types::ObjectType::Crystal);
                let crystal = crate::map::Crystal {
                    id,
                    element: MapElement::square(1),
                    resource,
                };

                // Crystals keep one tile of clearance from obstacles
                let probe = Position::new(3, 3);

                let close = i == 0
                    && (resource == native_resource
                        || resource == crate::catalog::ResourceType::Gold);
                if close {
                    // The first gold and native mana are not guarded in
                    // player-owned zones
                    self.close_objects.push(PendingObject {
                        object: ScenarioObject::Crystal(crystal),
                        decoration: Some(Decoration::captured_crystal(id, crystal_terrain)),
                        guard_strength: if zone_has_owner { 0 } else { 500 },
                        probe_size: Some(probe),
                        requested_position: None,
                    });
                } else {
                    self.required_objects.push(PendingObject {
                        object: ScenarioObject::Crystal(crystal),
                        decoration: Some(Decoration::crystal(id)),
                        guard_strength: 500,
                        probe_size: Some(probe),
                        requested_position: None,
                    });
                }
            }
        }

        Ok(())
    }

    /// Places every queued required object (maximizing spread), then every
    /// close object (minimizing distance to its target).
    pub fn create_required_objects(&mut self) -> Result<()> {
        tracing::debug!(zone = self.zone.id, "creating required objects");

        let required = std::mem::take(&mut self.required_objects);
        for pending in required {
            self.place_required_object(pending)?;
        }

        let close = std::mem::take(&mut self.close_objects);
        for pending in close {
            self.place_close_object(pending)?;
        }

        Ok(())
    }

    fn place_required_object(&mut self, mut pending: PendingObject) -> Result<()> {
        let element = *pending
            .object
            .element()
            .ok_or_else(|| GenError::Internal("required object has no footprint".into()))?;

        let probe = pending
            .probe_size
            .map(MapElement::new)
            .unwrap_or(element);
        let min_distance = probe.size().x * 2;

        let area = self.zone.tile_info.clone();
        let Some(mut position) =
            self.find_place_for_object(&area, &probe, min_distance as f32, true)
        else {
            return Err(self.lack_of_space("required object placement"));
        };

        // A probe area centers the real object inside it
        if let Some(probe_size) = pending.probe_size {
            position += probe_size / 2;
        }

        let mut element = element;
        match self.try_to_place_object_and_connect_to_path(&mut element, position) {
            ObjectPlacingResult::Success => {
                set_object_position(&mut pending.object, position);
                self.place_scenario_object(pending.object, position)?;
                if pending.guard_strength > 0 {
                    self.guard_object(&element, &guard_group(pending.guard_strength))?;
                }
                if let Some(decoration) = pending.decoration {
                    self.zone.decorations.push(decoration);
                }
                Ok(())
            }
            // Possible tiles shrank under a required object; the zone
            // cannot satisfy its contents anymore
            _ => Err(self.lack_of_space("required object sealed off")),
        }
    }

    fn place_close_object(&mut self, mut pending: PendingObject) -> Result<()> {
        let element = *pending
            .object
            .element()
            .ok_or_else(|| GenError::Internal("close object has no footprint".into()))?;

        let probe = pending
            .probe_size
            .map(MapElement::new)
            .unwrap_or(element);
        let blocked_offsets = probe.blocked_offsets();

        let target = pending.requested_position.unwrap_or(self.zone.pos);

        loop {
            let mut tiles: Vec<Position> = self
                .zone
                .possible_tiles
                .iter()
                .copied()
                .filter(|&tile| {
                    !self.map.is_at_the_border(tile)
                        && !self.map.element_at_border(&probe, tile)
                        && self.accessible_offset(&probe, tile).is_some()
                })
                .collect();

            if tiles.is_empty() {
                return Err(self.lack_of_space("close object placement"));
            }

            // Prefer tiles close to the target but away from other
            // objects; anything beyond radius 12 is heavily penalized
            let score = |tile: Position| -> f32 {
                let mut target_distance = f32::MAX;
                for offset in &blocked_offsets {
                    let t = target + *offset;
                    target_distance = target_distance.min(t.distance(tile));
                }
                if target_distance > 12.0 {
                    target_distance *= 10.0;
                }
                target_distance * 0.5 - self.grid.nearest_object_distance(tile).sqrt()
            };
            tiles.sort_by(|a, b| {
                score(*a)
                    .partial_cmp(&score(*b))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            let mut attempted = false;
            for tile in tiles {
                if !self.all_tiles_available(&probe, tile, &blocked_offsets) {
                    continue;
                }
                attempted = true;

                let mut position = tile;
                if let Some(probe_size) = pending.probe_size {
                    position += probe_size / 2;
                }

                let mut element = element;
                match self.try_to_place_object_and_connect_to_path(&mut element, position) {
                    ObjectPlacingResult::Success => {
                        set_object_position(&mut pending.object, position);
                        self.place_scenario_object(pending.object, position)?;
                        if pending.guard_strength > 0 {
                            self.guard_object(&element, &guard_group(pending.guard_strength))?;
                        }
                        if let Some(decoration) = pending.decoration {
                            self.zone.decorations.push(decoration);
                        }
                        return Ok(());
                    }
                    ObjectPlacingResult::CannotFit => continue,
                    // Possible tiles changed; resort and retry
                    ObjectPlacingResult::SealedOff => break,
                }
            }

            if !attempted {
                return Err(self.lack_of_space("close object placement"));
            }
        }
    }

    /// Finds spots for every neutral stack first, then generates the
    /// stacks group by group over the shuffled spots so groups mix on the
    /// map.
    pub fn place_stacks(&mut self) -> Result<()> {
        let stacks_total: u32 = self
            .options
            .stacks
            .stack_groups
            .iter()
            .map(|group| group.count)
            .sum();

        let mut positions = Vec::with_capacity(stacks_total as usize);
        for _ in 0..stacks_total {
            let probe = MapElement::square(1);
            loop {
                let area = self.zone.tile_info.clone();
                let Some(position) = self.find_place_for_object(&area, &probe, 1.0, true) else {
                    return Err(self.lack_of_space("stack placement"));
                };

                let mut element = probe;
                if self.try_to_place_object_and_connect_to_path(&mut element, position)
                    == ObjectPlacingResult::Success
                {
                    positions.push(position);
                    // Update distances now so the next search sees this
                    // spot; the stack itself is placed later
                    self.update_distances(position);
                    break;
                }
            }
        }

        self.rng.shuffle(&mut positions);

        let mut position_index = 0usize;
        let stack_groups = self.options.stacks.stack_groups.clone();
        for group in &stack_groups {
            if group.count == 0 {
                continue;
            }

            let (owner_id, subrace) = self.resolve_owner(group.owner);
            let neutral_owner = self.is_neutral_owner(owner_id);

            // Value is split evenly across the group
            let mut single_info = GroupInfo::default();
            single_info.value = group.stacks.value.split(group.count);
            single_info.subrace_types = group.stacks.subrace_types.clone();
            single_info.leader_ids = group.stacks.leader_ids.clone();

            let mut placed: Vec<Option<ObjectId>> = Vec::with_capacity(group.count as usize);
            for _ in 0..group.count {
                let Some(mut stack) = self.create_stack(&single_info, neutral_owner)? else {
                    placed.push(None);
                    continue;
                };

                stack.owner = owner_id;
                stack.subrace = subrace;
                stack.order = group.order;
                stack.ai_priority = group.ai_priority;

                if !group.name.is_empty() {
                    if let Some(leader) = stack.leader {
                        self.map.unit_mut(leader)?.name = group.name.clone();
                    }
                }
                for modifier in &group.leader_modifiers {
                    if let Some(leader) = stack.leader {
                        self.map.unit_mut(leader)?.add_modifier(*modifier);
                    }
                }

                let id = stack.id;
                let position = positions[position_index];
                position_index += 1;
                self.place_stack_object(stack, position)?;
                placed.push(Some(id));
            }

            // Loot value for a single stack in the group
            let mut single_loot = LootInfo::default();
            single_loot.value = group.stacks.loot.value.split(group.count);
            single_loot.item_types = group.stacks.loot.item_types.clone();
            single_loot.item_value = group.stacks.loot.item_value;

            let mut items: Vec<Vec<crate::catalog::ItemId>> =
                vec![Vec::new(); group.count as usize];
            for item_list in items.iter_mut() {
                for (item, amount) in self.create_loot(&single_loot, false) {
                    for _ in 0..amount {
                        item_list.push(item);
                    }
                }
            }

            // Required items land in random stacks
            let mut required_loot = LootInfo::default();
            required_loot.required_items = group.stacks.loot.required_items.clone();
            for (item, amount) in self.create_loot(&required_loot, false) {
                for _ in 0..amount {
                    let index = self.rng.next_index(items.len());
                    items[index].push(item);
                }
            }

            for (index, stack_id) in placed.iter().enumerate() {
                let Some(stack_id) = stack_id else { continue };
                for item_type in &items[index] {
                    let item_id = self.create_item(*item_type)?;
                    self.map.stack_mut(*stack_id)?.inventory.add(item_id);
                }
            }
        }

        Ok(())
    }

    /// Places treasure bags; the declared loot is split evenly and the
    /// required items land in random bags.
    pub fn place_bags(&mut self) -> Result<()> {
        let bags = self.options.bags.clone();
        if bags.count == 0 {
            return Ok(());
        }

        let mut single_loot = LootInfo::default();
        single_loot.value = bags.loot.value.split(bags.count);
        single_loot.item_types = bags.loot.item_types.clone();
        single_loot.item_value = bags.loot.item_value;

        let mut items: Vec<Vec<crate::catalog::ItemId>> = vec![Vec::new(); bags.count as usize];
        for item_list in items.iter_mut() {
            for (item, amount) in self.create_loot(&single_loot, false) {
                for _ in 0..amount {
                    item_list.push(item);
                }
            }
        }

        let mut required_loot = LootInfo::default();
        required_loot.required_items = bags.loot.required_items.clone();
        for (item, amount) in self.create_loot(&required_loot, false) {
            for _ in 0..amount {
                let index = self.rng.next_index(items.len());
                items[index].push(item);
            }
        }

        let mut placed: Vec<ObjectId> = Vec::with_capacity(bags.count as usize);
        for _ in 0..bags.count {
            let probe = MapElement::square(1);
            let min_distance = 2.0;
            loop {
                let area = self.zone.tile_info.clone();
                let Some(position) = self.find_place_for_object(&area, &probe, min_distance, true)
                else {
                    return Err(self.lack_of_space("bag placement"));
                };

                let mut element = probe;
                if self.try_to_place_object_and_connect_to_path(&mut element, position)
                    == ObjectPlacingResult::Success
                {
                    tracing::debug!(zone = self.zone.id, %position, "create bag");
                    let bag_id = self.place_bag(position)?;
                    self.map.bag_mut(bag_id)?.ai_priority = bags.ai_priority;
                    placed.push(bag_id);
                    break;
                }
            }
        }

        // Fill bags with the generated items. Distribution quality across
        // count and value is the template author's job; dumb combinations
        // produce empty bags.
        for (index, bag_id) in placed.iter().enumerate() {
            for item_type in &items[index] {
                let item_id = self.create_item(*item_type)?;
                self.map.bag_mut(*bag_id)?.items.push(item_id);
            }
        }

        Ok(())
    }

    // ---- post-fill phases ------------------------------------------------

    /// Applies the zone's border policy to every tile that touches another
    /// zone.
    pub fn create_border(&mut self) {
        let mut border_tiles = 0usize;
        let mut open_borders = 0usize;
        let mut closed_borders = 0usize;

        let tiles: Vec<Position> = self.zone.tile_info.iter().copied().collect();
        for tile in tiles {
            let is_border = self
                .grid
                .neighbors(tile)
                .into_iter()
                .any(|p| self.grid.zone_id(p) != Some(self.zone.id));
            if !is_border {
                continue;
            }

            border_tiles += 1;
            if !self.grid.is_possible(tile) {
                continue;
            }

            use crate::template::ZoneBorderType;
            match self.options.border_type {
                ZoneBorderType::Water => {
                    self.map
                        .paint_terrain(tile, TerrainType::Neutral, GroundType::Water);
                    self.grid.set_occupied(tile, TileState::Free);
                    open_borders += 1;
                }
                ZoneBorderType::Open => {
                    self.grid.set_occupied(tile, TileState::Free);
                    open_borders += 1;
                }
                ZoneBorderType::Closed => {
                    self.grid.set_occupied(tile, TileState::Blocked);
                    closed_borders += 1;
                }
                ZoneBorderType::SemiOpen => {
                    let gap = self.rng.chance(self.options.gap_chance);
                    self.grid.set_occupied(
                        tile,
                        if gap { TileState::Free } else { TileState::Blocked },
                    );
                    if gap {
                        open_borders += 1;
                    } else {
                        closed_borders += 1;
                    }
                }
            }
        }

        tracing::debug!(
            zone = self.zone.id,
            border_tiles,
            open_borders,
            closed_borders,
            gap_chance = self.options.gap_chance,
            "zone border"
        );
    }

    /// Decorates placed objects, fills blocked tiles with mountains and
    /// turns leftover tiles into forests.
    pub fn create_obstacles(&mut self) -> Result<()> {
        let decorations = std::mem::take(&mut self.zone.decorations);
        for decoration in &decorations {
            self.decorate(decoration)?;
        }

        self.place_mountains()?;
        self.place_forests();
        Ok(())
    }

    fn place_mountains(&mut self) -> Result<()> {
        let mut by_size: BTreeMap<i32, Vec<MountainDesc>> = BTreeMap::new();
        for mountain in &self.catalogs.settings.mountains {
            by_size.entry(mountain.size).or_default().push(*mountain);
        }

        // Biggest mountains first
        let obstacles: Vec<(i32, Vec<MountainDesc>)> = by_size.into_iter().rev().collect();

        let tiles: Vec<Position> = self.zone.tile_info.iter().copied().collect();
        for tile in tiles {
            if !self.grid.should_be_blocked(tile) {
                continue;
            }

            for (size, group) in &obstacles {
                if self.try_place_mountain(tile, *size, group)? {
                    break;
                }
            }
        }

        Ok(())
    }

    fn try_place_mountain(
        &mut self,
        tile: Position,
        size: i32,
        group: &[MountainDesc],
    ) -> Result<bool> {
        let mountain = *self
            .rng
            .pick_element(group)
            .ok_or_else(|| GenError::CatalogMissing("mountain table is empty".into()))?;

        let element = MapElement::square(size);
        if !self.can_obstacle_be_placed(&element, tile) {
            return Ok(false);
        }

        // Sizes 3 and 5 roll a chance to spawn a mountain landmark instead
        if (size == 3 || size == 5) && self.rng.chance(10) {
            let no_wrong_size =
                |info: &crate::catalog::LandmarkInfo| info.size.x != size || info.size.y != size;
            let info = crate::catalog::pickers::pick_mountain_landmark(
                self.catalogs,
                self.rng,
                &[&no_wrong_size],
            )
            .ok_or_else(|| {
                GenError::CatalogMissing(format!("no mountain landmark of size {size}"))
            })?;

            let landmark_type = info.id;
            let landmark_size = info.size;
            let id = self.map.create_id(crate::core::types::ObjectType::Landmark);
            let landmark = crate::map::Landmark {
                id,
                element: MapElement::new(landmark_size),
                landmark_type,
            };
            self.place_landmark_object(landmark, tile)?;
        } else {
            self.place_mountain(tile, Position::new(size, size), mountain.image)?;
        }

        Ok(true)
    }

    fn place_forests(&mut self) {
        let forest = self.settings.forest;

        let tiles: Vec<Position> = self.zone.tile_info.iter().copied().collect();
        if forest == 0 {
            // Free the unused possible tiles to make room for roads
            for tile in tiles {
                if self.grid.is_possible(tile) {
                    self.grid.set_occupied(tile, TileState::Free);
                }
            }
            return;
        }

        for tile in tiles {
            if !self.grid.is_possible(tile) {
                continue;
            }

            if self.grid.is_road(tile) {
                self.grid.set_occupied(tile, TileState::Free);
                continue;
            }

            if !self.rng.chance(forest) {
                self.grid.set_occupied(tile, TileState::Free);
                continue;
            }

            self.grid.set_occupied(tile, TileState::Used);
            let tree_count = self.catalogs.settings.tree_image_count.max(1);
            let tree_image = self.rng.next_int(0, tree_count as i64 - 1) as u8;
            let map_tile = self.map.tile_mut(tile);
            map_tile.set_terrain_ground(TerrainType::Neutral, GroundType::Forest);
            map_tile.tree_image = tree_image;
        }
    }

    /// Builds a road spanning tree over the zone's road nodes.
    pub fn connect_roads(&mut self) {
        if self.settings.roads == 0 {
            return;
        }

        tracing::debug!(zone = self.zone.id, "building roads");

        let mut unprocessed: BTreeSet<Position> = self.zone.road_nodes.clone();
        let mut processed: BTreeSet<Position> = BTreeSet::new();

        while let Some(node) = unprocessed.iter().next().copied() {
            unprocessed.remove(&node);

            let cross = if !processed.is_empty() {
                find_closest_tile(&processed, node)
            } else {
                find_closest_tile(&unprocessed, node)
            };
            let Some(cross) = cross else {
                // Single road node in this zone
                break;
            };

            tracing::debug!(from = %node, to = %cross, "building road");

            if self.create_road(node, cross) {
                // The end point is connected now; don't start another road
                // from it
                processed.insert(cross);
                unprocessed.remove(&cross);
            }

            processed.insert(node);
        }
    }

    // ---- object commit ---------------------------------------------------

    /// Single entry point for placing a built object at a position; all
    /// variants share the same commit sequence with per-variant hooks.
    pub(crate) fn place_scenario_object(
        &mut self,
        object: ScenarioObject,
        position: Position,
    ) -> Result<()> {
        match object {
            ScenarioObject::Fortification(fort) => {
                self.place_fortification(fort, position, TerrainType::Neutral)
            }
            ScenarioObject::Stack(stack) => self.place_stack_object(stack, position),
            ScenarioObject::Crystal(crystal) => self.place_crystal_object(crystal, position),
            ScenarioObject::Ruin(ruin) => self.place_ruin_object(ruin, position),
            ScenarioObject::Site(site) => self.place_site_object(site, position),
            ScenarioObject::Bag(bag) => self.place_bag_object(bag, position),
            ScenarioObject::Landmark(landmark) => self.place_landmark_object(landmark, position),
            _ => Err(GenError::Internal(
                "object kind cannot be placed on the grid".into(),
            )),
        }
    }

    fn check_element_fits(&self, element: &MapElement, what: &str) -> Result<()> {
        if !self.map.is_in_the_map(element.position()) {
            return Err(GenError::Internal(format!(
                "position of {what} at {} is outside of the map",
                element.position()
            )));
        }
        // Position and entrance span the footprint rectangle; nothing else
        // needs checking
        if !self.map.is_in_the_map(element.entrance()) {
            return Err(GenError::Internal(format!(
                "entrance {} of {what} at {} is outside of the map",
                element.entrance(),
                element.position()
            )));
        }
        Ok(())
    }

    fn occupy_footprint(&mut self, element: &MapElement, paint: Option<TerrainType>) {
        let mut tiles = element.blocked_positions();
        tiles.insert(element.entrance());
        for tile in tiles {
            self.grid.set_occupied(tile, TileState::Used);
            if let Some(terrain) = paint {
                self.map.paint_terrain(tile, terrain, GroundType::Plain);
            }
        }
    }

    pub(crate) fn place_fortification(
        &mut self,
        mut fort: crate::map::Fortification,
        position: Position,
        terrain: TerrainType,
    ) -> Result<()> {
        fort.element.set_position(position);
        self.check_element_fits(&fort.element, "fort")?;

        // Terrain under a city is owner-specific
        self.occupy_footprint(&fort.element, Some(terrain));

        if fort.gap_mask > 0 {
            let footprint = fort.element.all_positions();
            for tile in fort.element.tiles_by_gap_mask(fort.gap_mask) {
                if footprint.contains(&tile) || !self.map.is_in_the_map(tile) {
                    continue;
                }
                self.grid.set_occupied(tile, TileState::Free);
            }
        }

        self.update_distances(position);
        self.add_road_node(fort.element.entrance());

        self.map.insert_map_element(&fort.element, fort.id, true);
        self.map.insert_object(ScenarioObject::Fortification(fort))
    }

    pub(crate) fn place_stack_object(
        &mut self,
        mut stack: crate::map::Stack,
        position: Position,
    ) -> Result<()> {
        stack.element.set_position(position);
        self.check_element_fits(&stack.element, "stack")?;
        self.occupy_footprint(&stack.element, None);
        self.update_distances(position);
        self.map.insert_map_element(&stack.element, stack.id, true);
        self.map.insert_object(ScenarioObject::Stack(stack))
    }

    pub(crate) fn place_crystal_object(
        &mut self,
        mut crystal: crate::map::Crystal,
        position: Position,
    ) -> Result<()> {
        crystal.element.set_position(position);
        self.check_element_fits(&crystal.element, "crystal")?;
        self.occupy_footprint(&crystal.element, None);
        self.update_distances(position);
        self.map
            .insert_map_element(&crystal.element, crystal.id, true);
        self.map.insert_object(ScenarioObject::Crystal(crystal))
    }

    pub(crate) fn place_ruin_object(
        &mut self,
        mut ruin: crate::map::Ruin,
        position: Position,
    ) -> Result<()> {
        ruin.element.set_position(position);
        self.check_element_fits(&ruin.element, "ruin")?;
        self.occupy_footprint(&ruin.element, None);
        self.update_distances(position);
        self.add_road_node(ruin.element.entrance());
        self.map.insert_map_element(&ruin.element, ruin.id, true);
        self.map.insert_object(ScenarioObject::Ruin(ruin))
    }

    pub(crate) fn place_site_object(
        &mut self,
        mut site: crate::map::Site,
        position: Position,
    ) -> Result<()> {
        site.element.set_position(position);
        self.check_element_fits(&site.element, "site")?;
        self.occupy_footprint(&site.element, None);
        self.update_distances(position);
        self.add_road_node(site.element.entrance());
        self.map.insert_map_element(&site.element, site.id, true);
        self.map.insert_object(ScenarioObject::Site(site))
    }

    pub(crate) fn place_bag_object(
        &mut self,
        mut bag: crate::map::Bag,
        position: Position,
    ) -> Result<()> {
        bag.element.set_position(position);
        self.check_element_fits(&bag.element, "bag")?;
        self.occupy_footprint(&bag.element, None);
        self.update_distances(position);
        self.map.insert_map_element(&bag.element, bag.id, true);
        self.map.insert_object(ScenarioObject::Bag(bag))
    }

    pub(crate) fn place_landmark_object(
        &mut self,
        mut landmark: crate::map::Landmark,
        position: Position,
    ) -> Result<()> {
        landmark.element.set_position(position);
        self.check_element_fits(&landmark.element, "landmark")?;
        self.occupy_footprint(&landmark.element, None);
        self.update_distances(position);
        // Landmarks cannot be entered; the whole footprint blocks
        self.map
            .insert_map_element(&landmark.element, landmark.id, false);
        self.map.insert_object(ScenarioObject::Landmark(landmark))
    }

    pub(crate) fn place_mountain(
        &mut self,
        position: Position,
        size: Position,
        image: i32,
    ) -> Result<()> {
        for x in 0..size.x {
            for y in 0..size.y {
                let tile = position + Position::new(x, y);
                if !self.map.is_in_the_map(tile) {
                    return Err(GenError::Internal(format!(
                        "position of mountain at {tile} is outside of the map"
                    )));
                }
                self.grid.set_occupied(tile, TileState::Used);
            }
        }

        self.map.add_mountain(position, size, image);
        Ok(())
    }

    /// Places a guard stack in front of an object's entrance. Returns
    /// false when there is no tile to guard from.
    pub(crate) fn guard_object(
        &mut self,
        element: &MapElement,
        guard_info: &GroupInfo,
    ) -> Result<bool> {
        if self.accessible_tiles(element).is_empty() {
            tracing::warn!(position = %element.position(), "failed to guard object");
            return Ok(false);
        }
        let Some(guard_tile) = self.accessible_offset(element, element.position()) else {
            tracing::warn!(position = %element.position(), "failed to guard object");
            return Ok(false);
        };

        let Some(mut stack) = self.create_stack(guard_info, true)? else {
            // No guard; leave walkable tiles in front of the object
            for tile in self.accessible_tiles(element) {
                if self.grid.is_possible(tile) {
                    self.grid.set_occupied(tile, TileState::Free);
                }
            }
            return Ok(true);
        };

        let (owner_id, subrace) = self.resolve_owner(guard_info.owner);
        stack.owner = owner_id;
        stack.subrace = subrace;
        stack.order = guard_info.order;
        stack.ai_priority = guard_info.ai_priority;

        if !guard_info.name.is_empty() {
            if let Some(leader) = stack.leader {
                self.map.unit_mut(leader)?.name = guard_info.name.clone();
            }
        }
        for modifier in &guard_info.leader_modifiers {
            if let Some(leader) = stack.leader {
                self.map.unit_mut(leader)?.add_modifier(*modifier);
            }
        }

        self.place_stack_object(stack, guard_tile)?;
        Ok(true)
    }

    pub(crate) fn create_item(&mut self, item_type: crate::catalog::ItemId) -> Result<ObjectId> {
        let id = self.map.create_id(crate::core::types::ObjectType::Item);
        self.map
            .insert_object(ScenarioObject::Item(crate::map::Item { id, item_type }))?;
        Ok(id)
    }
}

/// Anonymous guard group of the given strength.
fn guard_group(strength: u32) -> GroupInfo {
    let mut info = GroupInfo::default();
    info.value = crate::core::types::RandomValue::exact(strength);
    info
}

pub(crate) fn set_object_position(object: &mut ScenarioObject, position: Position) {
    if let Some(element) = object_element_mut(object) {
        element.set_position(position);
    }
}

pub(crate) fn object_element_mut(object: &mut ScenarioObject) -> Option<&mut MapElement> {
    match object {
        ScenarioObject::Fortification(o) => Some(&mut o.element),
        ScenarioObject::Stack(o) => Some(&mut o.element),
        ScenarioObject::Site(o) => Some(&mut o.element),
        ScenarioObject::Ruin(o) => Some(&mut o.element),
        ScenarioObject::Crystal(o) => Some(&mut o.element),
        ScenarioObject::Bag(o) => Some(&mut o.element),
        ScenarioObject::Landmark(o) => Some(&mut o.element),
        _ => None,
    }
}

/// Closest tile of `tiles` to `position` by squared f32 distance.
pub(crate) fn find_closest_tile(
    tiles: &BTreeSet<Position>,
    position: Position,
) -> Option<Position> {
    let mut best: Option<(Position, f32)> = None;
    for &tile in tiles {
        let distance = position.distance_squared(tile);
        if best.map(|(_, d)| distance < d).unwrap_or(true) {
            best = Some((tile, distance));
        }
    }
    best.map(|(tile, _)| tile)
}

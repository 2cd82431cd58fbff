//! Scenario map: tile array plus the scenario object store
//!
//! The map owns every generated object and mints their ids. Grid state used
//! only during generation (occupancy, zone ids, distances) lives in
//! [`crate::gen::occupancy`]; the map holds what the finished scenario
//! keeps: tiles, objects, footprint registrations and mountains.

pub mod element;
pub mod objects;
pub mod tile;

pub use element::MapElement;
pub use objects::{
    Bag, Crystal, Currency, Facing, FortKind, Fortification, Group, Inventory, Item, Landmark,
    MercenaryStock, Player, Ruin, ScenarioObject, Site, SiteKind, Stack, Unit,
};
pub use tile::{GroundType, TerrainType, Tile};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::RaceType;
use crate::core::error::{GenError, Result};
use crate::core::types::{ObjectId, ObjectType, Position};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Mountain {
    pub pos: Position,
    pub size: Position,
    pub image: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioMap {
    pub name: String,
    pub description: String,
    size: i32,
    tiles: Vec<Tile>,
    objects: BTreeMap<ObjectId, ScenarioObject>,
    players: BTreeMap<RaceType, ObjectId>,
    mountains: Vec<Mountain>,
    next_index: [u32; ObjectType::COUNT],
}

impl ScenarioMap {
    pub fn new(name: impl Into<String>, description: impl Into<String>, size: i32) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            size,
            tiles: vec![Tile::default(); (size * size) as usize],
            objects: BTreeMap::new(),
            players: BTreeMap::new(),
            mountains: Vec::new(),
            next_index: [0; ObjectType::COUNT],
        }
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn is_in_the_map(&self, position: Position) -> bool {
        position.x >= 0 && position.x < self.size && position.y >= 0 && position.y < self.size
    }

    pub fn is_at_the_border(&self, position: Position) -> bool {
        position.x == 0
            || position.x == self.size - 1
            || position.y == 0
            || position.y == self.size - 1
    }

    /// Whether any footprint tile of `element`, anchored at `position`,
    /// touches the map border.
    pub fn element_at_border(&self, element: &MapElement, position: Position) -> bool {
        let size = element.size();
        position.x <= 0
            || position.y <= 0
            || position.x + size.x >= self.size - 1
            || position.y + size.y >= self.size - 1
    }

    fn index(&self, position: Position) -> usize {
        (position.x + self.size * position.y) as usize
    }

    pub fn tile(&self, position: Position) -> &Tile {
        &self.tiles[self.index(position)]
    }

    pub fn tile_mut(&mut self, position: Position) -> &mut Tile {
        let index = self.index(position);
        &mut self.tiles[index]
    }

    pub fn create_id(&mut self, ty: ObjectType) -> ObjectId {
        let index = self.next_index[ty.index()];
        self.next_index[ty.index()] += 1;
        ObjectId::new(ty, index)
    }

    pub fn insert_object(&mut self, object: ScenarioObject) -> Result<()> {
        let id = object.id();
        if self.objects.insert(id, object).is_some() {
            return Err(GenError::Internal(format!("duplicate object id {id}")));
        }
        Ok(())
    }

    /// Registers an element's footprint on the tiles: blocked positions
    /// become blocking, and the entrance becomes visitable when the object
    /// can be entered (landmarks cannot).
    pub fn insert_map_element(&mut self, element: &MapElement, id: ObjectId, visitable: bool) {
        for position in element.blocked_positions() {
            if self.is_in_the_map(position) {
                let tile = self.tile_mut(position);
                tile.blocked = true;
                tile.blocking_objects.push(id);
            }
        }

        let entrance = element.entrance();
        if self.is_in_the_map(entrance) {
            let tile = self.tile_mut(entrance);
            if visitable {
                tile.visitable = true;
                tile.visitable_objects.push(id);
            } else {
                tile.blocked = true;
                tile.blocking_objects.push(id);
            }
        }
    }

    pub fn object(&self, id: ObjectId) -> Option<&ScenarioObject> {
        self.objects.get(&id)
    }

    pub fn objects(&self) -> impl Iterator<Item = &ScenarioObject> {
        self.objects.values()
    }

    pub fn unit_mut(&mut self, id: ObjectId) -> Result<&mut Unit> {
        match self.objects.get_mut(&id) {
            Some(ScenarioObject::Unit(unit)) => Ok(unit),
            _ => Err(GenError::Internal(format!("object {id} is not a unit"))),
        }
    }

    pub fn stack_mut(&mut self, id: ObjectId) -> Result<&mut Stack> {
        match self.objects.get_mut(&id) {
            Some(ScenarioObject::Stack(stack)) => Ok(stack),
            _ => Err(GenError::Internal(format!("object {id} is not a stack"))),
        }
    }

    pub fn fortification_mut(&mut self, id: ObjectId) -> Result<&mut Fortification> {
        match self.objects.get_mut(&id) {
            Some(ScenarioObject::Fortification(fort)) => Ok(fort),
            _ => Err(GenError::Internal(format!(
                "object {id} is not a fortification"
            ))),
        }
    }

    pub fn bag_mut(&mut self, id: ObjectId) -> Result<&mut Bag> {
        match self.objects.get_mut(&id) {
            Some(ScenarioObject::Bag(bag)) => Ok(bag),
            _ => Err(GenError::Internal(format!("object {id} is not a bag"))),
        }
    }

    pub fn player_mut(&mut self, id: ObjectId) -> Result<&mut Player> {
        match self.objects.get_mut(&id) {
            Some(ScenarioObject::Player(player)) => Ok(player),
            _ => Err(GenError::Internal(format!("object {id} is not a player"))),
        }
    }

    /// Creates the player object for a race, or returns the existing one.
    pub fn create_player(&mut self, race: RaceType) -> Result<ObjectId> {
        if let Some(id) = self.players.get(&race) {
            return Ok(*id);
        }

        let id = self.create_id(ObjectType::Player);
        self.insert_object(ScenarioObject::Player(Player {
            id,
            race,
            bank: Currency::default(),
            known_spells: Default::default(),
            buildings: Default::default(),
        }))?;
        self.players.insert(race, id);
        Ok(id)
    }

    pub fn player_id(&self, race: RaceType) -> Option<ObjectId> {
        self.players.get(&race).copied()
    }

    pub fn player_race(&self, id: ObjectId) -> Option<RaceType> {
        match self.objects.get(&id) {
            Some(ScenarioObject::Player(player)) => Some(player.race),
            _ => None,
        }
    }

    pub fn paint_terrain(&mut self, position: Position, terrain: TerrainType, ground: GroundType) {
        self.tile_mut(position).set_terrain_ground(terrain, ground);
    }

    pub fn paint_terrain_tiles(
        &mut self,
        tiles: impl IntoIterator<Item = Position>,
        terrain: TerrainType,
        ground: GroundType,
    ) {
        for position in tiles {
            self.paint_terrain(position, terrain, ground);
        }
    }

    pub fn add_mountain(&mut self, position: Position, size: Position, image: i32) {
        for x in 0..size.x {
            for y in 0..size.y {
                let tile_pos = position + Position::new(x, y);
                if self.is_in_the_map(tile_pos) {
                    let tile = self.tile_mut(tile_pos);
                    tile.set_terrain_ground(TerrainType::Neutral, GroundType::Mountain);
                    tile.blocked = true;
                }
            }
        }
        self.mountains.push(Mountain { pos: position, size, image });
    }

    pub fn mountains(&self) -> &[Mountain] {
        &self.mountains
    }

    /// Whether movement from `source` to `destination` is possible. A
    /// diagonal step is rejected when either crossed corner tile is water
    /// or blocked, so paths never cut non-traversable corners.
    pub fn can_move_between(&self, source: Position, destination: Position) -> bool {
        if source.x == destination.x || source.y == destination.y {
            return true;
        }

        let corner_a = Position::new(source.x, destination.y);
        let corner_b = Position::new(destination.x, source.y);
        for corner in [corner_a, corner_b] {
            if !self.is_in_the_map(corner) {
                return false;
            }
            let tile = self.tile(corner);
            if tile.is_water() || tile.blocked {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_minted_per_type() {
        let mut map = ScenarioMap::new("t", "t", 48);
        let a = map.create_id(ObjectType::Stack);
        let b = map.create_id(ObjectType::Stack);
        let c = map.create_id(ObjectType::Site);
        assert_eq!(a.index, 0);
        assert_eq!(b.index, 1);
        assert_eq!(c.index, 0);
        assert_ne!(a, c);
    }

    #[test]
    fn border_checks() {
        let map = ScenarioMap::new("t", "t", 48);
        assert!(map.is_at_the_border(Position::new(0, 10)));
        assert!(map.is_at_the_border(Position::new(47, 10)));
        assert!(!map.is_at_the_border(Position::new(10, 10)));

        let element = MapElement::square(3);
        assert!(map.element_at_border(&element, Position::new(44, 10)));
        assert!(!map.element_at_border(&element, Position::new(43, 10)));
    }

    #[test]
    fn diagonal_move_blocked_by_water_corner() {
        let mut map = ScenarioMap::new("t", "t", 48);
        let src = Position::new(5, 5);
        let dst = Position::new(6, 6);
        assert!(map.can_move_between(src, dst));

        map.paint_terrain(Position::new(5, 6), TerrainType::Neutral, GroundType::Water);
        assert!(!map.can_move_between(src, dst));

        // Straight moves don't care about corners
        assert!(map.can_move_between(src, Position::new(5, 6)));
    }

    #[test]
    fn element_registration_marks_tiles() {
        let mut map = ScenarioMap::new("t", "t", 48);
        let mut element = MapElement::square(3);
        element.set_position(Position::new(10, 10));
        let id = map.create_id(ObjectType::Site);
        map.insert_map_element(&element, id, true);

        assert!(map.tile(Position::new(10, 10)).blocked);
        assert!(map.tile(element.entrance()).visitable);
        assert!(!map.tile(element.entrance()).blocked);
    }
}

//! Map tiles

use serde::{Deserialize, Serialize};

use crate::catalog::RaceType;
use crate::core::types::ObjectId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerrainType {
    Neutral,
    Human,
    Undead,
    Heretic,
    Dwarf,
    Elf,
}

impl TerrainType {
    pub fn from_race(race: RaceType) -> Self {
        match race {
            RaceType::Human => TerrainType::Human,
            RaceType::Undead => TerrainType::Undead,
            RaceType::Heretic => TerrainType::Heretic,
            RaceType::Dwarf => TerrainType::Dwarf,
            RaceType::Elf => TerrainType::Elf,
            RaceType::Neutral => TerrainType::Neutral,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroundType {
    Plain,
    Forest,
    Water,
    Mountain,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tile {
    pub terrain: TerrainType,
    pub ground: GroundType,
    /// Tree sprite variant for forest tiles.
    pub tree_image: u8,
    /// An object entrance sits on this tile.
    pub visitable: bool,
    /// An object footprint blocks this tile.
    pub blocked: bool,
    pub blocking_objects: Vec<ObjectId>,
    pub visitable_objects: Vec<ObjectId>,
}

impl Default for Tile {
    fn default() -> Self {
        Self {
            terrain: TerrainType::Neutral,
            ground: GroundType::Plain,
            tree_image: 0,
            visitable: false,
            blocked: false,
            blocking_objects: Vec::new(),
            visitable_objects: Vec::new(),
        }
    }
}

impl Tile {
    /// Water and mountain tiles always belong to the neutral race.
    pub fn set_terrain_ground(&mut self, terrain: TerrainType, ground: GroundType) {
        self.terrain = if matches!(ground, GroundType::Water | GroundType::Mountain) {
            TerrainType::Neutral
        } else {
            terrain
        };
        self.ground = ground;
    }

    pub fn is_water(&self) -> bool {
        self.ground == GroundType::Water
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn water_and_mountain_force_neutral_terrain() {
        let mut tile = Tile::default();

        tile.set_terrain_ground(TerrainType::Human, GroundType::Water);
        assert_eq!(tile.terrain, TerrainType::Neutral);
        assert!(tile.is_water());

        tile.set_terrain_ground(TerrainType::Elf, GroundType::Mountain);
        assert_eq!(tile.terrain, TerrainType::Neutral);

        tile.set_terrain_ground(TerrainType::Elf, GroundType::Plain);
        assert_eq!(tile.terrain, TerrainType::Elf);
    }
}

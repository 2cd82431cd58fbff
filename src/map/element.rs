//! Rectangular map element geometry
//!
//! Every on-map object shares the same footprint model: a `w x h` rectangle
//! anchored at its top-left tile, with an entrance at the bottom-center tile
//! unless overridden. Blocked offsets cover the footprint minus the
//! entrance; the entrance is tracked separately so placement can reason
//! about reachability.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::types::Position;

/// Offsets around the entrance that lie outside the footprint; used for
/// "is the entrance reachable" tests.
const ENTRANCE_OFFSETS: [Position; 5] = [
    Position::new(-1, 0),
    Position::new(1, 0),
    Position::new(-1, 1),
    Position::new(0, 1),
    Position::new(1, 1),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapElement {
    pos: Position,
    size: Position,
    entrance_offset: Position,
}

impl MapElement {
    /// Element with the default bottom-center entrance.
    pub fn new(size: Position) -> Self {
        Self {
            pos: Position::default(),
            size,
            entrance_offset: Position::new(size.x / 2, size.y - 1),
        }
    }

    pub fn square(side: i32) -> Self {
        Self::new(Position::new(side, side))
    }

    pub fn position(&self) -> Position {
        self.pos
    }

    pub fn set_position(&mut self, position: Position) {
        self.pos = position;
    }

    pub fn size(&self) -> Position {
        self.size
    }

    pub fn entrance_offset(&self) -> Position {
        self.entrance_offset
    }

    pub fn entrance(&self) -> Position {
        self.pos + self.entrance_offset
    }

    pub fn entrance_offsets(&self) -> &'static [Position] {
        &ENTRANCE_OFFSETS
    }

    /// Footprint offsets relative to the top-left tile, excluding the
    /// entrance tile.
    pub fn blocked_offsets(&self) -> BTreeSet<Position> {
        let mut offsets = BTreeSet::new();
        for x in 0..self.size.x {
            for y in 0..self.size.y {
                let offset = Position::new(x, y);
                if offset != self.entrance_offset {
                    offsets.insert(offset);
                }
            }
        }
        offsets
    }

    /// Absolute footprint tiles, excluding the entrance tile.
    pub fn blocked_positions(&self) -> BTreeSet<Position> {
        self.blocked_offsets()
            .into_iter()
            .map(|offset| self.pos + offset)
            .collect()
    }

    /// All footprint tiles including the entrance.
    pub fn all_positions(&self) -> BTreeSet<Position> {
        let mut tiles = self.blocked_positions();
        tiles.insert(self.entrance());
        tiles
    }

    /// Elements are visitable from any neighbor tile of the entrance.
    pub fn is_visitable_from(&self, direction: Position) -> bool {
        direction != Position::default()
    }

    /// Gap-mask tiles: one-tile strips just outside the footprint, selected
    /// by side bit (1 north, 2 east, 4 south, 8 west). A fortification
    /// leaves these walkable to form approach corridors.
    pub fn tiles_by_gap_mask(&self, mask: u8) -> BTreeSet<Position> {
        let mut tiles = BTreeSet::new();

        if mask & 0x1 != 0 {
            for x in 0..self.size.x {
                tiles.insert(self.pos + Position::new(x, -1));
            }
        }
        if mask & 0x2 != 0 {
            for y in 0..self.size.y {
                tiles.insert(self.pos + Position::new(self.size.x, y));
            }
        }
        if mask & 0x4 != 0 {
            for x in 0..self.size.x {
                tiles.insert(self.pos + Position::new(x, self.size.y));
            }
        }
        if mask & 0x8 != 0 {
            for y in 0..self.size.y {
                tiles.insert(self.pos + Position::new(-1, y));
            }
        }

        tiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entrance_is_bottom_center() {
        let mut element = MapElement::square(3);
        element.set_position(Position::new(10, 10));
        assert_eq!(element.entrance(), Position::new(11, 12));

        let mut element = MapElement::new(Position::new(4, 4));
        element.set_position(Position::new(0, 0));
        assert_eq!(element.entrance(), Position::new(2, 3));
    }

    #[test]
    fn single_tile_element_has_no_blocked_offsets() {
        let element = MapElement::square(1);
        assert!(element.blocked_offsets().is_empty());
        assert_eq!(element.entrance(), element.position());
        assert_eq!(element.all_positions().len(), 1);
    }

    #[test]
    fn blocked_offsets_exclude_entrance() {
        let element = MapElement::square(3);
        let offsets = element.blocked_offsets();
        assert_eq!(offsets.len(), 8);
        assert!(!offsets.contains(&element.entrance_offset()));
    }

    #[test]
    fn gap_mask_strips_sit_outside_footprint() {
        let mut element = MapElement::square(2);
        element.set_position(Position::new(5, 5));

        let north = element.tiles_by_gap_mask(0x1);
        assert_eq!(
            north,
            [Position::new(5, 4), Position::new(6, 4)].into_iter().collect()
        );

        let all = element.tiles_by_gap_mask(0xf);
        assert_eq!(all.len(), 8);
        for tile in &all {
            assert!(!element.all_positions().contains(tile));
        }
    }
}

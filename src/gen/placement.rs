//! Object placement search
//!
//! `find_place_for_object` scans an area for the anchor tile that
//! maximizes the distance to the nearest placed object, subject to
//! accessibility and footprint constraints.
//! `try_to_place_object_and_connect_to_path` then probes a concrete spot:
//! it installs a transient blueprint over the footprint so the path search
//! cannot tunnel through the object, connects the entrance to the free
//! network and reserves the footprint on success.

use std::collections::BTreeSet;

use crate::core::types::Position;
use crate::gen::occupancy::TileState;
use crate::gen::zone::{ObjectPlacingResult, ZoneFiller};
use crate::map::MapElement;

/// Transient footprint reservation; holds the states to restore.
pub(crate) struct Blueprint {
    saved: Vec<(Position, TileState)>,
}

impl ZoneFiller<'_> {
    /// Best anchor tile in `area` for `element`: at least `min_distance`
    /// from the nearest object and as far from everything as possible.
    /// The whole footprint must consist of unclaimed tiles of this zone
    /// and must not touch the map border.
    pub(crate) fn find_place_for_object(
        &self,
        area: &BTreeSet<Position>,
        element: &MapElement,
        min_distance: f32,
        find_accessible: bool,
    ) -> Option<Position> {
        let blocked_offsets = element.blocked_offsets();

        let mut best_distance = 0.0f32;
        let mut result = None;

        for &tile in area {
            // Avoid borders
            if self.map.element_at_border(element, tile) {
                continue;
            }

            if find_accessible {
                if self.accessible_offset(element, tile).is_none() {
                    continue;
                }
                if !self.entrance_accessible(element, tile) {
                    continue;
                }
            }

            if !self.grid.is_possible(tile) {
                continue;
            }

            let distance = self.grid.nearest_object_distance(tile);
            if distance >= min_distance
                && distance > best_distance
                && self.all_tiles_available(element, tile, &blocked_offsets)
            {
                best_distance = distance;
                result = Some(tile);
            }
        }

        result
    }

    /// A walkable in-zone tile from which the element's entrance can be
    /// reached, if one exists. Scans the 1-tile radius around the entrance.
    pub(crate) fn accessible_offset(
        &self,
        element: &MapElement,
        position: Position,
    ) -> Option<Position> {
        let blocked = element.blocked_offsets();
        let mut result = None;

        for x in -1..2 {
            for y in -1..2 {
                // The object is visited from another tile
                if x == 0 && y == 0 {
                    continue;
                }

                let offset = Position::new(x, y) + element.entrance_offset();
                if blocked.contains(&offset) {
                    continue;
                }

                let nearby = position + offset;
                if !self.map.is_in_the_map(nearby) {
                    continue;
                }

                if element.is_visitable_from(Position::new(x, y))
                    && !self.grid.is_blocked(nearby)
                    && self.is_in_the_zone(nearby)
                {
                    result = Some(nearby);
                }
            }
        }

        result
    }

    /// If any tile around the entrance is inaccessible the whole element
    /// is considered inaccessible.
    pub(crate) fn entrance_accessible(&self, element: &MapElement, position: Position) -> bool {
        let entrance = position + element.entrance_offset();

        for &offset in element.entrance_offsets() {
            let tile = entrance + offset;
            if !self.map.is_in_the_map(tile) {
                return false;
            }
            if self.grid.is_blocked(tile) {
                return false;
            }
        }

        true
    }

    /// All walkable tiles from which a placed element can be entered.
    pub(crate) fn accessible_tiles(&self, element: &MapElement) -> Vec<Position> {
        let entrance = element.entrance();
        let footprint = element.blocked_positions();
        let mut tiles = Vec::new();

        for position in self.grid.neighbors(entrance) {
            if !(self.grid.is_possible(position) || self.grid.is_free(position)) {
                continue;
            }
            if footprint.contains(&position) {
                continue;
            }
            if element.is_visitable_from(position - entrance) && !self.grid.is_blocked(position) {
                tiles.push(position);
            }
        }

        tiles
    }

    /// The whole footprint must be unclaimed tiles of this zone.
    pub(crate) fn all_tiles_available(
        &self,
        _element: &MapElement,
        position: Position,
        blocked_offsets: &BTreeSet<Position>,
    ) -> bool {
        for &offset in blocked_offsets {
            let tile = position + offset;
            if !self.map.is_in_the_map(tile)
                || !self.grid.is_possible(tile)
                || self.grid.zone_id(tile) != Some(self.zone.id)
            {
                return false;
            }
        }
        true
    }

    /// Obstacles fill only tiles already reserved for blocking.
    pub(crate) fn can_obstacle_be_placed(&self, element: &MapElement, position: Position) -> bool {
        // The anchor may fit while the bottom-right corner does not
        if !self.map.is_in_the_map(position) {
            return false;
        }

        for offset in element.blocked_offsets() {
            let tile = position + offset;
            if !self.map.is_in_the_map(tile) {
                return false;
            }
            if !self.grid.should_be_blocked(tile) {
                return false;
            }
        }

        true
    }

    fn install_blueprint(&mut self, element: &MapElement) -> Blueprint {
        let mut saved = Vec::new();
        let size = element.size();
        for x in 0..size.x {
            for y in 0..size.y {
                let tile = element.position() + Position::new(x, y);
                if let Some(state) = self.grid.state(tile) {
                    saved.push((tile, state));
                    self.grid.set_occupied(tile, TileState::Used);
                }
            }
        }
        Blueprint { saved }
    }

    fn remove_blueprint(&mut self, blueprint: Blueprint) {
        for (tile, state) in blueprint.saved {
            self.grid.set_occupied(tile, state);
        }
    }

    /// Probes a concrete placement: verifies accessibility, reserves the
    /// footprint as a blueprint, connects the entrance to the free network
    /// and reserves the footprint for good on success. The blueprint is
    /// released on every exit path; after `SealedOff` the tiles sealed by
    /// the failed path search stay blocked.
    pub(crate) fn try_to_place_object_and_connect_to_path(
        &mut self,
        element: &mut MapElement,
        position: Position,
    ) -> ObjectPlacingResult {
        element.set_position(position);

        if self.accessible_tiles(element).is_empty() {
            tracing::debug!(%position, "cannot access object, retrying");
            return ObjectPlacingResult::CannotFit;
        }

        let Some(accessible_tile) = self.accessible_offset(element, position) else {
            tracing::debug!(%position, "cannot access object, retrying");
            return ObjectPlacingResult::CannotFit;
        };

        let blueprint = self.install_blueprint(element);
        let connected = self.connect_path(accessible_tile, true);
        self.remove_blueprint(blueprint);

        if !connected {
            tracing::debug!(%position, "failed to create path to object, retrying");
            return ObjectPlacingResult::SealedOff;
        }

        self.grid
            .set_occupied(element.entrance(), TileState::Blocked);
        for tile in element.blocked_positions() {
            if self.map.is_in_the_map(tile) {
                self.grid.set_occupied(tile, TileState::Blocked);
            }
        }

        ObjectPlacingResult::Success
    }
}

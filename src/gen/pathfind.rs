//! Path searches over the occupancy grid
//!
//! Four variants, all restricted to the current zone's tiles:
//! `connect_with_center` (A* towards the zone position, preferring already
//! free tiles), `crunch_path` (greedy carve towards a destination),
//! `connect_path` (A* to the nearest free tile, sealing off unreachable
//! pockets on failure) and `create_road` (straight-preferring A* that
//! paints road flags).

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ahash::{AHashMap, AHashSet};

use crate::core::types::Position;
use crate::gen::occupancy::TileState;
use crate::gen::zone::{RoadInfo, ZoneFiller};

/// Heap entry ordered so the binary max-heap pops the lowest cost first;
/// ties break by insertion order.
#[derive(Debug, Clone, Copy)]
struct PathEntry {
    cost: f32,
    seq: u32,
    pos: Position,
}

impl PartialEq for PathEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PathEntry {}

impl Ord for PathEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for PathEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl ZoneFiller<'_> {
    fn zone_neighbors(&self, position: Position, only_straight: bool) -> Vec<Position> {
        if only_straight {
            self.grid.direct_neighbors(position)
        } else {
            self.grid.neighbors(position)
        }
    }

    /// Connects `position` to the zone position with free tiles. Movement
    /// prefers tiles that are already free (cost 1) over unclaimed ones
    /// (cost 2); blocked tiles cost 3 and are only allowed when
    /// `pass_through_blocked` is set.
    pub(crate) fn connect_with_center(
        &mut self,
        position: Position,
        only_straight: bool,
        pass_through_blocked: bool,
    ) -> bool {
        let target = self.zone.pos;

        let mut closed: AHashSet<Position> = AHashSet::new();
        let mut queue: BinaryHeap<PathEntry> = BinaryHeap::new();
        let mut came_from: AHashMap<Position, Option<Position>> = AHashMap::new();
        let mut distances: AHashMap<Position, f32> = AHashMap::new();
        let mut seq = 0u32;

        came_from.insert(position, None);
        distances.insert(position, 0.0);
        queue.push(PathEntry { cost: 0.0, seq, pos: position });

        while let Some(node) = queue.pop() {
            let current = node.pos;
            closed.insert(current);

            if current == target {
                let mut back = current;
                while let Some(parent) = came_from.get(&back).copied().flatten() {
                    self.grid.set_occupied(back, TileState::Free);
                    back = parent;
                }
                return true;
            }

            for p in self.zone_neighbors(current, only_straight) {
                if closed.contains(&p) {
                    continue;
                }
                if self.grid.zone_id(p) != Some(self.zone.id) {
                    continue;
                }

                let movement_cost = if self.grid.is_free(p) {
                    1.0
                } else if self.grid.is_possible(p) {
                    2.0
                } else if pass_through_blocked && self.grid.should_be_blocked(p) {
                    3.0
                } else {
                    continue;
                };

                let distance = distances[&current] + movement_cost;
                let best_so_far = distances.get(&p).copied().unwrap_or(f32::INFINITY);
                if distance < best_so_far {
                    came_from.insert(p, Some(current));
                    distances.insert(p, distance);
                    seq += 1;
                    queue.push(PathEntry { cost: distance, seq, pos: p });
                }
            }
        }

        false
    }

    /// Greedy steepest-descent carve from `source` towards `destination`.
    /// Converts unclaimed tiles to free ones while walking; stops when the
    /// destination or any already free tile is reached. When stuck, falls
    /// back to the first unclaimed neighbor and keeps going.
    ///
    /// With `record` set, carved tiles are added to the zone's free paths.
    pub(crate) fn crunch_path(
        &mut self,
        source: Position,
        destination: Position,
        only_straight: bool,
        record: bool,
    ) -> bool {
        let mut result = false;
        let mut end = false;

        let mut current = source;
        let mut distance = current.distance_squared(destination);

        while !end {
            if current == destination {
                result = true;
                break;
            }

            let last_distance = distance;

            for position in self.zone_neighbors(current, only_straight) {
                if result {
                    break;
                }

                if position == destination {
                    result = true;
                    end = true;
                }

                if position.distance_squared(destination) >= distance {
                    continue;
                }
                if self.grid.is_blocked(position) {
                    continue;
                }
                if self.grid.zone_id(position) != Some(self.zone.id) {
                    continue;
                }

                if self.grid.is_possible(position) {
                    self.grid.set_occupied(position, TileState::Free);
                    if record {
                        self.zone.free_paths.insert(position);
                    }
                    current = position;
                    distance = current.distance_squared(destination);
                } else if self.grid.is_free(position) {
                    end = true;
                    result = true;
                }
            }

            let mut another: Option<Position> = None;
            if !(result || distance < last_distance) {
                // No closer tile; take any nearby unclaimed tile instead
                for position in self.zone_neighbors(current, only_straight) {
                    if self.grid.zone_id(position) != Some(self.zone.id) {
                        continue;
                    }
                    if !self.grid.is_possible(position) {
                        continue;
                    }
                    another = Some(position);
                    break;
                }

                if let Some(position) = another {
                    self.grid.set_occupied(position, TileState::Free);
                    if record {
                        self.zone.free_paths.insert(position);
                    }
                    current = position;
                }
            }

            if !(result || distance < last_distance || another.is_some()) {
                tracing::debug!(
                    %current, %source, %destination,
                    "no closer tile found on path"
                );
                break;
            }
        }

        result
    }

    /// Connects `source` to the nearest free tile within the zone by
    /// uniform-cost search. On success the whole backtracked path becomes
    /// free. On exhaustion every visited unclaimed tile is sealed off:
    /// blocked for good and removed from the zone's possible tiles.
    pub(crate) fn connect_path(&mut self, source: Position, only_straight: bool) -> bool {
        let mut closed: AHashSet<Position> = AHashSet::new();
        let mut open: BinaryHeap<PathEntry> = BinaryHeap::new();
        let mut came_from: AHashMap<Position, Option<Position>> = AHashMap::new();
        let mut distances: AHashMap<Position, f32> = AHashMap::new();
        let mut seq = 0u32;

        came_from.insert(source, None);
        distances.insert(source, 0.0);
        open.push(PathEntry { cost: 0.0, seq, pos: source });

        while let Some(node) = open.pop() {
            let current = node.pos;
            closed.insert(current);

            // Reached the free path network
            if self.grid.is_free(current) {
                let mut back = current;
                loop {
                    self.grid.set_occupied(back, TileState::Free);
                    match came_from.get(&back).copied().flatten() {
                        Some(parent) => back = parent,
                        None => break,
                    }
                }
                return true;
            }

            for p in self.zone_neighbors(current, only_straight) {
                if closed.contains(&p) {
                    continue;
                }
                // No paths through blocked or occupied tiles, stay within
                // the zone
                if self.grid.is_blocked(p) || self.grid.zone_id(p) != Some(self.zone.id) {
                    continue;
                }

                let distance = distances[&current] + 1.0;
                let best_so_far = distances.get(&p).copied().unwrap_or(f32::INFINITY);
                if distance < best_so_far {
                    came_from.insert(p, Some(current));
                    distances.insert(p, distance);
                    seq += 1;
                    open.push(PathEntry { cost: distance, seq, pos: p });
                }
            }
        }

        // These tiles are sealed off and can't be connected anymore
        for tile in closed {
            if self.grid.is_possible(tile) {
                self.grid.set_occupied(tile, TileState::Blocked);
            }
            self.zone.possible_tiles.remove(&tile);
        }

        false
    }

    /// Builds a road from `source` to `destination`, or to the first
    /// existing road tile on the way. Straight steps cost 1; diagonals are
    /// penalized at 2.1 and only tried when no straight neighbor advanced.
    pub(crate) fn create_road(&mut self, source: Position, destination: Position) -> bool {
        let mut closed: AHashSet<Position> = AHashSet::new();
        let mut queue: BinaryHeap<PathEntry> = BinaryHeap::new();
        let mut came_from: AHashMap<Position, Option<Position>> = AHashMap::new();
        let mut distances: AHashMap<Position, f32> = AHashMap::new();
        let mut seq = 0u32;

        // The road node itself may already carry a road from another zone;
        // node tiles get their road flag back when the path is traced
        self.grid.set_road(source, false);

        came_from.insert(source, None);
        distances.insert(source, 0.0);
        queue.push(PathEntry { cost: 0.0, seq, pos: source });

        while let Some(node) = queue.pop() {
            let current = node.pos;
            closed.insert(current);

            if current == destination || self.grid.is_road(current) {
                let mut path = Vec::new();
                let mut back = current;
                while let Some(parent) = came_from.get(&back).copied().flatten() {
                    path.push(back);
                    self.grid.set_road(back, true);
                    back = parent;
                }
                self.grid.set_road(source, true);
                self.zone.roads.push(RoadInfo { source, destination, path });
                return true;
            }

            let node_cost = distances[&current];

            let direct = self.grid.direct_neighbors(current);
            let advanced = self.visit_road_neighbors(
                &direct,
                current,
                node_cost,
                1.0,
                destination,
                &mut queue,
                &mut came_from,
                &mut distances,
                &closed,
                &mut seq,
            );

            if !advanced {
                // Moving diagonally is penalized over two straight steps
                let diagonal = self.grid.diagonal_neighbors(current);
                self.visit_road_neighbors(
                    &diagonal,
                    current,
                    node_cost,
                    2.1,
                    destination,
                    &mut queue,
                    &mut came_from,
                    &mut distances,
                    &closed,
                    &mut seq,
                );
            }
        }

        tracing::debug!(%source, %destination, "failed to create road");
        false
    }

    #[allow(clippy::too_many_arguments)]
    fn visit_road_neighbors(
        &self,
        neighbors: &[Position],
        current: Position,
        node_cost: f32,
        movement_cost: f32,
        destination: Position,
        queue: &mut BinaryHeap<PathEntry>,
        came_from: &mut AHashMap<Position, Option<Position>>,
        distances: &mut AHashMap<Position, f32>,
        closed: &AHashSet<Position>,
        seq: &mut u32,
    ) -> bool {
        let mut neighbor_found = false;

        for &p in neighbors {
            if closed.contains(&p) {
                continue;
            }

            let distance = node_cost + movement_cost;
            let best_so_far = distances.get(&p).copied().unwrap_or(f32::INFINITY);
            if distance >= best_so_far {
                continue;
            }

            if self.map.tile(p).is_water() {
                continue;
            }
            if !self.map.can_move_between(current, p) {
                continue;
            }

            let empty_path = self.grid.is_free(p) && self.grid.is_free(current);
            // Moving from or onto an object entrance
            let visitable = self.map.tile(p).visitable || self.map.tile(current).visitable;
            let completed = p == destination;

            if empty_path || visitable || completed {
                // Stay in the zone so a guard position doesn't end up
                // connected to another zone
                if self.grid.zone_id(p) == Some(self.zone.id) || completed {
                    came_from.insert(p, Some(current));
                    distances.insert(p, distance);
                    *seq += 1;
                    queue.push(PathEntry { cost: distance, seq: *seq, pos: p });
                    neighbor_found = true;
                }
            }
        }

        neighbor_found
    }
}

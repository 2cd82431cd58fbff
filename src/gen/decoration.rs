//! Decorations around placed objects
//!
//! After a zone is filled, each notable object decorates its surroundings
//! with landmarks and patches of forest. The per-object differences (area
//! margin, landmark filters, terrain painting, placement order) are a
//! strategy record rather than a type hierarchy; crystals paint forests
//! before landmarks so the landmark doesn't always claim the top tile.

use std::collections::BTreeSet;

use crate::catalog::pickers::pick_landmark;
use crate::catalog::{LandmarkInfo, LandmarkType, RaceType};
use crate::core::error::{GenError, Result};
use crate::core::types::{ObjectId, ObjectType, Position, RandomValue};
use crate::gen::occupancy::TileState;
use crate::gen::zone::ZoneFiller;
use crate::map::{GroundType, MapElement, ScenarioObject, TerrainType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DecorationKind {
    Capital,
    Village { tier: u8 },
    Site,
    Ruin,
    Crystal,
    /// First crystal near an owner's capital; spreads the owner's terrain.
    CapturedCrystal { terrain: TerrainType },
}

/// Decoration job for one placed object.
#[derive(Debug, Clone)]
pub(crate) struct Decoration {
    target: ObjectId,
    kind: DecorationKind,
    landmarks: RandomValue,
    forests: RandomValue,
    gap: i32,
}

impl Decoration {
    pub(crate) fn capital(target: ObjectId) -> Self {
        Self {
            target,
            kind: DecorationKind::Capital,
            landmarks: RandomValue::new(2, 5),
            forests: RandomValue::new(4, 10),
            gap: 3,
        }
    }

    pub(crate) fn village(target: ObjectId, tier: u8) -> Self {
        Self {
            target,
            kind: DecorationKind::Village { tier },
            landmarks: RandomValue::new(2, 5),
            forests: RandomValue::new(4, 10),
            gap: 4,
        }
    }

    pub(crate) fn site(target: ObjectId) -> Self {
        Self {
            target,
            kind: DecorationKind::Site,
            landmarks: RandomValue::new(1, 3),
            forests: RandomValue::new(2, 6),
            gap: 3,
        }
    }

    pub(crate) fn ruin(target: ObjectId) -> Self {
        Self {
            target,
            kind: DecorationKind::Ruin,
            landmarks: RandomValue::new(1, 3),
            forests: RandomValue::new(2, 6),
            gap: 4,
        }
    }

    pub(crate) fn crystal(target: ObjectId) -> Self {
        Self {
            target,
            kind: DecorationKind::Crystal,
            landmarks: RandomValue::new(1, 2),
            forests: RandomValue::new(1, 4),
            gap: 1,
        }
    }

    pub(crate) fn captured_crystal(target: ObjectId, terrain: TerrainType) -> Self {
        Self {
            target,
            kind: DecorationKind::CapturedCrystal { terrain },
            landmarks: RandomValue::new(1, 2),
            forests: RandomValue::new(1, 4),
            gap: 1,
        }
    }
}

impl ZoneFiller<'_> {
    /// Runs one decoration job: collect the free area around the target,
    /// then fill it with landmarks and forests in the kind's order.
    pub(crate) fn decorate(&mut self, decoration: &Decoration) -> Result<()> {
        let object = self
            .map
            .object(decoration.target)
            .ok_or_else(|| GenError::Internal("decoration target does not exist".into()))?;
        let element = *object
            .element()
            .ok_or_else(|| GenError::Internal("decoration target has no footprint".into()))?;

        let landmark_race = match decoration.kind {
            DecorationKind::Capital => {
                let owner = match object {
                    ScenarioObject::Fortification(fort) => fort.owner,
                    _ => None,
                };
                owner
                    .and_then(|id| self.map.player_race(id))
                    .unwrap_or(RaceType::Neutral)
            }
            _ => RaceType::Neutral,
        };
        let terrain = match decoration.kind {
            DecorationKind::Capital => TerrainType::from_race(landmark_race),
            DecorationKind::CapturedCrystal { terrain } => terrain,
            _ => TerrainType::Neutral,
        };

        let mut area = self.map_element_area(&element, decoration.gap, decoration.gap);
        if area.is_empty() {
            // No place for landmarks or forests
            return Ok(());
        }

        let forests_first = matches!(
            decoration.kind,
            DecorationKind::Crystal | DecorationKind::CapturedCrystal { .. }
        );

        if forests_first {
            // Forests claim random tiles first so landmarks don't always
            // spawn at the top tile
            self.place_forest_decorations(&mut area, decoration, terrain, true);
            if area.is_empty() {
                return Ok(());
            }
            self.place_landmark_decorations(&mut area, decoration, &element, landmark_race, terrain)?;
        } else {
            self.place_landmark_decorations(&mut area, decoration, &element, landmark_race, terrain)?;
            if area.is_empty() {
                return Ok(());
            }
            self.place_forest_decorations(&mut area, decoration, terrain, false);
        }

        Ok(())
    }

    /// The unclaimed tiles in a margin around an element's footprint,
    /// excluding the entrance neighborhood.
    fn map_element_area(
        &self,
        element: &MapElement,
        gap_x: i32,
        gap_y: i32,
    ) -> BTreeSet<Position> {
        let start = element.position();
        let end = start + element.size();
        let entrance = element.entrance();

        let mut excluded = element.all_positions();
        for &offset in element.entrance_offsets() {
            excluded.insert(entrance + offset);
        }

        let mut area = BTreeSet::new();
        for x in (start.x - gap_x)..(end.x + gap_x) {
            for y in (start.y - gap_y)..(end.y + gap_y) {
                let tile = Position::new(x, y);
                if excluded.contains(&tile) {
                    continue;
                }
                if !self.map.is_in_the_map(tile) || !self.grid.is_possible(tile) {
                    continue;
                }
                area.insert(tile);
            }
        }

        area
    }

    fn place_landmark_decorations(
        &mut self,
        area: &mut BTreeSet<Position>,
        decoration: &Decoration,
        element: &MapElement,
        race: RaceType,
        terrain: TerrainType,
    ) -> Result<()> {
        let catalogs = self.catalogs;
        let total = self.rng.pick_value(decoration.landmarks);

        let target_size = element.size().x;
        // Capitals reject landmarks of their own size; everything else
        // only rejects strictly larger ones
        let strict_size = decoration.kind == DecorationKind::Capital;
        let needs_mountain = matches!(
            decoration.kind,
            DecorationKind::Capital
                | DecorationKind::Village { .. }
                | DecorationKind::Crystal
                | DecorationKind::CapturedCrystal { .. }
        );
        // Cemeteries and skeletons look out of place around big cities
        let no_misc = matches!(decoration.kind, DecorationKind::Village { tier } if tier >= 3);
        let tight_spread = matches!(
            decoration.kind,
            DecorationKind::Village { .. } | DecorationKind::Site | DecorationKind::Ruin
        );

        for _ in 0..total {
            let wrong_size = |info: &LandmarkInfo| {
                if strict_size {
                    info.size.x >= target_size
                } else {
                    info.size.x > target_size
                }
            };
            let not_mountain = |info: &LandmarkInfo| !info.mountain;
            let misc = |info: &LandmarkInfo| info.landmark_type == LandmarkType::Misc;

            let mut filters: Vec<&dyn Fn(&LandmarkInfo) -> bool> = Vec::new();
            if decoration.kind != DecorationKind::Ruin {
                filters.push(&wrong_size);
            }
            if needs_mountain {
                filters.push(&not_mountain);
            }
            if no_misc {
                filters.push(&misc);
            }

            let Some(info) = pick_landmark(catalogs, race, self.rng, &filters) else {
                break;
            };

            let min_distance = if tight_spread {
                info.size.x * 3
            } else {
                info.size.x * 2
            };

            let probe = MapElement::new(info.size);
            let Some(position) =
                self.find_place_for_object(area, &probe, min_distance as f32, false)
            else {
                continue;
            };

            let landmark_type = info.id;
            let landmark_size = info.size;
            let id = self.map.create_id(ObjectType::Landmark);
            let landmark = crate::map::Landmark {
                id,
                element: MapElement::new(landmark_size),
                landmark_type,
            };
            self.place_landmark_object(landmark, position)?;

            let mut placed = MapElement::new(landmark_size);
            placed.set_position(position);
            for tile in placed.all_positions() {
                // Painted terrain under landmarks reads better
                if self.map.is_in_the_map(tile) {
                    self.map.paint_terrain(tile, terrain, GroundType::Plain);
                }
                area.remove(&tile);
            }
        }

        Ok(())
    }

    fn place_forest_decorations(
        &mut self,
        area: &mut BTreeSet<Position>,
        decoration: &Decoration,
        terrain: TerrainType,
        erase: bool,
    ) {
        let total = self.rng.pick_value(decoration.forests) as usize;

        let mut tiles: Vec<Position> = area.iter().copied().collect();
        self.rng.shuffle(&mut tiles);

        let tree_count = self.catalogs.settings.tree_image_count.max(1);
        for &tile in tiles.iter().take(total) {
            let tree_image = self.rng.next_int(0, tree_count as i64 - 1) as u8;
            let map_tile = self.map.tile_mut(tile);
            map_tile.set_terrain_ground(terrain, GroundType::Forest);
            map_tile.tree_image = tree_image;

            self.grid.set_occupied(tile, TileState::Used);

            if erase {
                area.remove(&tile);
            }
        }
    }
}

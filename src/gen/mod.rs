//! Scenario generation driver
//!
//! `MapGenerator` owns the grid, the map and the RNG for one generation
//! run. Zone geometry comes from the outside: the caller assigns each
//! zone its tile set, then `generate` carves connection entry points and
//! runs the fill pipeline zone by zone, strictly in id order, so a seed
//! always reproduces the same scenario.

pub mod decoration;
pub mod loot;
pub mod occupancy;
pub mod pathfind;
pub mod placement;
pub mod sites;
pub mod stacks;
pub mod zone;

pub use occupancy::{OccupancyGrid, TileState};
pub use zone::{ObjectPlacingResult, RoadInfo, Zone, ZoneFiller};

use std::collections::BTreeMap;

use crate::catalog::{Catalogs, RaceType, ResourceType};
use crate::core::error::{GenError, Result};
use crate::core::rng::Rng;
use crate::core::types::Position;
use crate::map::{GroundType, ScenarioMap, ScenarioObject};
use crate::template::{DiplomacyRelation, MapTemplate, ScenarioVariable};

/// A finished scenario: the populated map plus the generation-time state
/// tests and tooling inspect (occupancy, zones, roads).
pub struct Scenario {
    pub map: ScenarioMap,
    pub grid: OccupancyGrid,
    pub zones: BTreeMap<u32, Zone>,
    pub diplomacy: Vec<DiplomacyRelation>,
    pub scenario_variables: Vec<ScenarioVariable>,
}

impl Scenario {
    pub fn roads(&self) -> impl Iterator<Item = &RoadInfo> {
        self.zones.values().flat_map(|zone| zone.roads.iter())
    }
}

pub struct MapGenerator<'a> {
    template: &'a MapTemplate,
    catalogs: &'a Catalogs,
    seed: u32,
    rng: Rng,
    map: ScenarioMap,
    grid: OccupancyGrid,
    zones: BTreeMap<u32, Zone>,
}

impl<'a> MapGenerator<'a> {
    pub fn new(
        template: &'a MapTemplate,
        catalogs: &'a Catalogs,
        seed: u32,
        size: i32,
    ) -> Result<Self> {
        template.validate()?;

        if size < template.settings.size_min || size > template.settings.size_max {
            return Err(GenError::TemplateInvalid(format!(
                "map size {} is outside the template range {}..{}",
                size, template.settings.size_min, template.settings.size_max
            )));
        }

        let map = ScenarioMap::new(
            template.settings.name.clone(),
            template.settings.description.clone(),
            size,
        );

        let zones = template
            .contents
            .zones
            .keys()
            .map(|&id| (id, Zone::new(id)))
            .collect();

        Ok(Self {
            template,
            catalogs,
            seed,
            rng: Rng::new(seed),
            map,
            grid: OccupancyGrid::new(size),
            zones,
        })
    }

    /// Assigns a zone its area. The zone position starts at the in-area
    /// tile closest to the zone's declared center.
    pub fn set_zone_area(
        &mut self,
        zone_id: u32,
        tiles: std::collections::BTreeSet<Position>,
    ) -> Result<()> {
        let options = self
            .template
            .contents
            .zones
            .get(&zone_id)
            .ok_or_else(|| GenError::TemplateInvalid(format!("unknown zone {zone_id}")))?;
        let zone = self
            .zones
            .get_mut(&zone_id)
            .ok_or_else(|| GenError::Internal(format!("zone {zone_id} not initialized")))?;

        for &tile in &tiles {
            if !self.grid.is_in_the_map(tile) {
                return Err(GenError::TemplateInvalid(format!(
                    "zone {zone_id} tile {tile} is outside of the map"
                )));
            }
            self.grid.set_zone_id(tile, zone_id);
        }

        let center = options.center.to_position(self.map.size());
        zone.pos = if tiles.contains(&center) {
            center
        } else {
            zone::find_closest_tile(&tiles, center)
                .ok_or_else(|| GenError::TemplateInvalid(format!("zone {zone_id} has no tiles")))?
        };
        zone.tile_info = tiles;

        Ok(())
    }

    fn with_filler<R>(
        &mut self,
        zone_id: u32,
        f: impl FnOnce(&mut ZoneFiller<'_>) -> R,
    ) -> Result<R> {
        let template = self.template;
        let options = template
            .contents
            .zones
            .get(&zone_id)
            .ok_or_else(|| GenError::Internal(format!("unknown zone {zone_id}")))?;
        let zone = self
            .zones
            .get_mut(&zone_id)
            .ok_or_else(|| GenError::Internal(format!("zone {zone_id} not initialized")))?;

        let mut filler = ZoneFiller::new(
            zone,
            options,
            &template.settings,
            self.catalogs,
            &mut self.map,
            &mut self.grid,
            &mut self.rng,
            self.seed,
        );
        Ok(f(&mut filler))
    }

    fn zone_ids(&self) -> Vec<u32> {
        self.zones.keys().copied().collect()
    }

    /// Runs the whole pipeline and hands back the finished scenario.
    pub fn generate(mut self) -> Result<Scenario> {
        tracing::info!(seed = self.seed, size = self.map.size(), "generating scenario");

        for (&zone_id, zone) in &self.zones {
            if zone.tile_info.is_empty() {
                return Err(GenError::TemplateInvalid(format!(
                    "zone {zone_id} has no area assigned"
                )));
            }
        }

        self.create_players()?;

        let zone_ids = self.zone_ids();

        for &id in &zone_ids {
            self.with_filler(id, |filler| filler.init_terrain())?;
        }
        for &id in &zone_ids {
            self.with_filler(id, |filler| filler.init_towns())??;
        }

        self.carve_connections()?;

        for &id in &zone_ids {
            self.with_filler(id, |filler| {
                filler.init_free_tiles();
                filler.fill()
            })??;
        }
        for &id in &zone_ids {
            self.with_filler(id, |filler| filler.create_border())?;
        }
        for &id in &zone_ids {
            self.with_filler(id, |filler| filler.create_obstacles())??;
        }
        for &id in &zone_ids {
            self.with_filler(id, |filler| filler.connect_roads())?;
        }

        self.check_objects_access()?;

        tracing::info!(seed = self.seed, "scenario generated");

        Ok(Scenario {
            map: self.map,
            grid: self.grid,
            zones: self.zones,
            diplomacy: self.template.contents.diplomacy.clone(),
            scenario_variables: self.template.contents.scenario_variables.clone(),
        })
    }

    /// Creates the neutral player and one player per owned zone, granting
    /// the template's starting resources.
    fn create_players(&mut self) -> Result<()> {
        self.map.create_player(RaceType::Neutral)?;

        let template = self.template;
        let starting_gold = template.settings.starting_gold;
        let starting_mana = template.settings.starting_native_mana;

        for (&zone_id, options) in &template.contents.zones {
            let Some(race) = options.owner else { continue };

            let player_id = self.map.create_player(race)?;
            let native = self.catalogs.native_resource(race);
            let player = self.map.player_mut(player_id)?;
            player.bank.set(ResourceType::Gold, starting_gold);
            player.bank.set(native, starting_mana);

            if let Some(zone) = self.zones.get_mut(&zone_id) {
                zone.owner_id = Some(player_id);
            }
        }

        Ok(())
    }

    /// Carves an entry point for every template connection: the closest
    /// tile pair between the two zones becomes free, both sides connect
    /// to their zone centers, and the declared guard takes the entry tile.
    fn carve_connections(&mut self) -> Result<()> {
        let connections = self.template.contents.connections.clone();

        for connection in &connections {
            let (tile_from, tile_to) = {
                let zone_a = self.zones.get(&connection.from).ok_or_else(|| {
                    GenError::Internal(format!("unknown zone {}", connection.from))
                })?;
                let zone_b = self
                    .zones
                    .get(&connection.to)
                    .ok_or_else(|| GenError::Internal(format!("unknown zone {}", connection.to)))?;

                // Closest tile pair; ties resolve towards the midpoint of
                // the two zone positions so entries sit mid-border
                let mid = Position::new(
                    (zone_a.pos.x + zone_b.pos.x) / 2,
                    (zone_a.pos.y + zone_b.pos.y) / 2,
                );
                let mut best: Option<(Position, Position, f32, f32)> = None;
                for &a in &zone_a.tile_info {
                    for &b in &zone_b.tile_info {
                        let distance = a.distance_squared(b);
                        let spread = a.distance_squared(mid) + b.distance_squared(mid);
                        let better = match best {
                            None => true,
                            Some((_, _, d, s)) => {
                                distance < d || (distance == d && spread < s)
                            }
                        };
                        if better {
                            best = Some((a, b, distance, spread));
                        }
                    }
                }
                let (a, b, _, _) = best.ok_or_else(|| {
                    GenError::TemplateInvalid(format!(
                        "connection {} -> {} has empty zones",
                        connection.from, connection.to
                    ))
                })?;
                (a, b)
            };

            self.with_filler(connection.from, |filler| -> Result<()> {
                filler.add_free_path(tile_from);
                filler.connect_with_center(tile_from, true, true);
                filler.add_road_node(tile_from);
                filler.place_zone_guard(tile_from, &connection.guard)?;
                Ok(())
            })??;

            self.with_filler(connection.to, |filler| {
                filler.add_free_path(tile_to);
                filler.connect_with_center(tile_to, true, true);
                filler.add_road_node(tile_to);
            })?;
        }

        Ok(())
    }

    /// Every fortification, ruin and site must keep a reachable entrance;
    /// a violation here is a generator bug.
    fn check_objects_access(&self) -> Result<()> {
        for object in self.map.objects() {
            let (element, what) = match object {
                ScenarioObject::Fortification(fort) => (&fort.element, "city"),
                ScenarioObject::Ruin(ruin) => (&ruin.element, "ruin"),
                ScenarioObject::Site(site) => (&site.element, "site"),
                _ => continue,
            };

            let entrance = element.entrance();
            let all_blocked = element.entrance_offsets().iter().all(|&offset| {
                let position = entrance + offset;

                if self.grid.should_be_blocked(position) {
                    return true;
                }
                if self.grid.is_road(position) {
                    // A road means the entrance isn't blocked at all
                    return false;
                }
                if self.grid.is_used(position) && self.map.is_in_the_map(position) {
                    // Used by anything but a forest means a stack, a
                    // landmark or another object stands in the way
                    return self.map.tile(position).ground != GroundType::Forest;
                }

                false
            });

            if all_blocked {
                return Err(GenError::Internal(format!(
                    "{what} at {} has its entrance blocked (map seed {})",
                    element.position(),
                    self.seed
                )));
            }
        }

        Ok(())
    }
}

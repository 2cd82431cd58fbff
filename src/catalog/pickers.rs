//! Filter-list pickers over catalog records
//!
//! Callers compose small reject-if predicates; a candidate is accepted iff
//! no predicate rejects it. The surviving candidates are picked from
//! uniformly. Catalog maps iterate in key order, so the pick is fully
//! determined by the RNG stream.

use crate::catalog::{Catalogs, ItemInfo, LandmarkInfo, RaceType, SpellInfo, UnitInfo};
use crate::core::rng::Rng;

pub type UnitFilter<'a> = &'a dyn Fn(&UnitInfo) -> bool;
pub type ItemFilter<'a> = &'a dyn Fn(&ItemInfo) -> bool;
pub type SpellFilter<'a> = &'a dyn Fn(&SpellInfo) -> bool;
pub type LandmarkFilter<'a> = &'a dyn Fn(&LandmarkInfo) -> bool;

fn rejected<T>(info: &T, filters: &[&dyn Fn(&T) -> bool]) -> bool {
    filters.iter().any(|reject| reject(info))
}

/// Picks a random soldier unit passing all filters.
pub fn pick_unit<'a>(
    catalogs: &'a Catalogs,
    rng: &mut Rng,
    filters: &[UnitFilter<'_>],
) -> Option<&'a UnitInfo> {
    let candidates: Vec<&UnitInfo> = catalogs
        .units
        .values()
        .filter(|info| !info.leader && !rejected(*info, filters))
        .collect();

    rng.pick_element(&candidates).copied()
}

/// Picks a random leader unit passing all filters.
pub fn pick_leader<'a>(
    catalogs: &'a Catalogs,
    rng: &mut Rng,
    filters: &[UnitFilter<'_>],
) -> Option<&'a UnitInfo> {
    let candidates: Vec<&UnitInfo> = catalogs
        .units
        .values()
        .filter(|info| info.leader && !rejected(*info, filters))
        .collect();

    rng.pick_element(&candidates).copied()
}

pub fn pick_item<'a>(
    catalogs: &'a Catalogs,
    rng: &mut Rng,
    filters: &[ItemFilter<'_>],
) -> Option<&'a ItemInfo> {
    let candidates: Vec<&ItemInfo> = catalogs
        .items
        .values()
        .filter(|info| !rejected(*info, filters))
        .collect();

    rng.pick_element(&candidates).copied()
}

pub fn pick_spell<'a>(
    catalogs: &'a Catalogs,
    rng: &mut Rng,
    filters: &[SpellFilter<'_>],
) -> Option<&'a SpellInfo> {
    let candidates: Vec<&SpellInfo> = catalogs
        .spells
        .values()
        .filter(|info| !rejected(*info, filters))
        .collect();

    rng.pick_element(&candidates).copied()
}

/// Picks a landmark appropriate for the given race. Neutral decorations
/// draw from the whole non-race-specific pool.
pub fn pick_landmark<'a>(
    catalogs: &'a Catalogs,
    _race: RaceType,
    rng: &mut Rng,
    filters: &[LandmarkFilter<'_>],
) -> Option<&'a LandmarkInfo> {
    let candidates: Vec<&LandmarkInfo> = catalogs
        .landmarks
        .values()
        .filter(|info| !rejected(*info, filters))
        .collect();

    rng.pick_element(&candidates).copied()
}

/// Picks a mountain-themed landmark, for obstacle substitution.
pub fn pick_mountain_landmark<'a>(
    catalogs: &'a Catalogs,
    rng: &mut Rng,
    filters: &[LandmarkFilter<'_>],
) -> Option<&'a LandmarkInfo> {
    let candidates: Vec<&LandmarkInfo> = catalogs
        .landmarks
        .values()
        .filter(|info| info.mountain && !rejected(*info, filters))
        .collect();

    rng.pick_element(&candidates).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::*;
    use crate::core::types::Position;
    use std::collections::{BTreeMap, BTreeSet};

    fn tiny_catalogs() -> Catalogs {
        let mut units = BTreeMap::new();
        for (id, value, leader) in [(1u32, 50u32, true), (2, 30, false), (3, 80, false)] {
            units.insert(
                UnitId(id),
                UnitInfo {
                    id: UnitId(id),
                    name: format!("unit {id}"),
                    level: 1,
                    value,
                    enroll_cost: value,
                    hp: 100,
                    move_points: 20,
                    leadership: 5,
                    reach: ReachType::Adjacent,
                    subrace: SubRaceType::Neutral,
                    big: false,
                    leader,
                    support: false,
                },
            );
        }

        Catalogs {
            units,
            items: BTreeMap::new(),
            spells: BTreeMap::new(),
            landmarks: BTreeMap::new(),
            races: BTreeMap::new(),
            city_names: vec!["Test".into()],
            merchant_texts: Vec::new(),
            mage_texts: Vec::new(),
            mercenary_texts: Vec::new(),
            trainer_texts: Vec::new(),
            market_texts: Vec::new(),
            ruin_texts: Vec::new(),
            settings: GeneratorSettings {
                mountains: vec![MountainDesc { size: 1, image: 0 }],
                merchant_images: vec![0],
                mage_images: vec![0],
                mercenary_images: vec![0],
                trainer_images: vec![0],
                market_images: vec![0],
                ruin_images: vec![0],
                bag_land_images: vec![0],
                bag_water_images: vec![0],
                min_leader_value: 50,
                min_soldier_value: 30,
                leadership_modifier: ModifierId(9031),
                tree_image_count: 20,
                forbidden_units: BTreeSet::new(),
                forbidden_items: BTreeSet::new(),
                forbidden_spells: BTreeSet::new(),
            },
        }
    }

    #[test]
    fn leaders_and_soldiers_are_disjoint_pools() {
        let catalogs = tiny_catalogs();
        let mut rng = Rng::new(1);

        let leader = pick_leader(&catalogs, &mut rng, &[]).unwrap();
        assert!(leader.leader);

        for _ in 0..10 {
            let soldier = pick_unit(&catalogs, &mut rng, &[]).unwrap();
            assert!(!soldier.leader);
        }
    }

    #[test]
    fn all_filters_must_accept() {
        let catalogs = tiny_catalogs();
        let mut rng = Rng::new(1);

        let too_cheap = |info: &UnitInfo| info.value < 100;
        assert!(pick_unit(&catalogs, &mut rng, &[&too_cheap]).is_none());

        let not_exact = |info: &UnitInfo| info.value != 30;
        let picked = pick_unit(&catalogs, &mut rng, &[&not_exact]).unwrap();
        assert_eq!(picked.value, 30);
    }

    #[test]
    fn landmark_size_filter() {
        let mut catalogs = tiny_catalogs();
        catalogs.landmarks.insert(
            LandmarkId(1),
            LandmarkInfo {
                id: LandmarkId(1),
                size: Position::new(3, 3),
                landmark_type: LandmarkType::Structure,
                mountain: true,
            },
        );
        let mut rng = Rng::new(1);

        let wrong_size = |info: &LandmarkInfo| info.size.x != 3;
        assert!(pick_mountain_landmark(&catalogs, &mut rng, &[&wrong_size]).is_some());

        let too_big = |info: &LandmarkInfo| info.size.x >= 3;
        assert!(pick_mountain_landmark(&catalogs, &mut rng, &[&too_big]).is_none());
    }
}

//! Core type definitions used throughout the generator

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Integer tile coordinate on the scenario grid.
///
/// Distances are computed in 32-bit floats so that candidate comparisons
/// (nearest-object distance, path tie-breaks) behave identically on every
/// platform.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Squared euclidean distance as f32.
    pub fn distance_squared(&self, other: Position) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;
        dx * dx + dy * dy
    }

    pub fn distance(&self, other: Position) -> f32 {
        self.distance_squared(other).sqrt()
    }

    /// Chebyshev (king-move) distance.
    pub fn chebyshev_distance(&self, other: Position) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

impl std::ops::Add for Position {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl std::ops::Sub for Position {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl std::ops::AddAssign for Position {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl std::ops::Div<i32> for Position {
    type Output = Self;
    fn div(self, rhs: i32) -> Self {
        Self { x: self.x / rhs, y: self.y / rhs }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Normalized zone center in the unit square.
///
/// Zone layout works with fractional coordinates; a center pushed past an
/// edge wraps around to the opposite side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VPosition(Vec2);

impl VPosition {
    pub fn new(x: f32, y: f32) -> Self {
        let mut v = Self::default();
        v.set(Vec2::new(x, y));
        v
    }

    /// Wraps both coordinates into `[0, 1)`; negative inputs come out on
    /// the opposite side.
    pub fn set(&mut self, value: Vec2) {
        self.0 = Vec2::new(value.x.rem_euclid(1.0), value.y.rem_euclid(1.0));
    }

    pub fn get(&self) -> Vec2 {
        self.0
    }

    /// Projects the fractional center onto a map of the given size.
    pub fn to_position(&self, map_size: i32) -> Position {
        Position::new(
            (self.0.x * map_size as f32) as i32,
            (self.0.y * map_size as f32) as i32,
        )
    }
}

/// Closed integer range `[min, max]` sampled uniformly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomValue {
    pub min: u32,
    pub max: u32,
}

impl RandomValue {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub const fn exact(value: u32) -> Self {
        Self { min: value, max: value }
    }

    /// An all-zero range means "nothing requested" in template records.
    pub fn is_zero(&self) -> bool {
        self.max == 0
    }

    /// Splits the range evenly, for budgets shared across `count` objects.
    pub fn split(&self, count: u32) -> Self {
        Self { min: self.min / count, max: self.max / count }
    }
}

/// Scenario object kinds; doubles as the id namespace tag.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ObjectType {
    Fortification,
    Stack,
    Crystal,
    Ruin,
    Site,
    Bag,
    Landmark,
    Unit,
    Item,
    Player,
}

impl ObjectType {
    pub const COUNT: usize = 10;

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Unique identifier for scenario objects, minted sequentially per type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ObjectId {
    pub ty: ObjectType,
    pub index: u32,
}

impl ObjectId {
    pub fn new(ty: ObjectType, index: u32) -> Self {
        Self { ty, index }
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}#{}", self.ty, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_squared_f32() {
        let a = Position::new(0, 0);
        let b = Position::new(3, 4);
        assert_eq!(a.distance_squared(b), 25.0);
        assert_eq!(a.distance(b), 5.0);
        assert_eq!(a.chebyshev_distance(b), 4);
    }

    #[test]
    fn center_wraps_into_unit_square() {
        let v = VPosition::new(1.25, -0.25);
        assert!((v.get().x - 0.25).abs() < 1e-6);
        assert!((v.get().y - 0.75).abs() < 1e-6);

        let v = VPosition::new(-3.5, 7.125);
        assert!(v.get().x >= 0.0 && v.get().x < 1.0);
        assert!(v.get().y >= 0.0 && v.get().y < 1.0);
    }

    #[test]
    fn zero_random_value() {
        assert!(RandomValue::default().is_zero());
        assert!(!RandomValue::new(0, 5).is_zero());
        assert_eq!(RandomValue::new(100, 300).split(4), RandomValue::new(25, 75));
    }
}

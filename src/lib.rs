//! Random scenario generator for a tile-based fantasy strategy game.
//!
//! Given a declarative template (zones, connections, object budgets) and a
//! 32-bit seed, the generator produces a fully populated rectangular map:
//! terrain per tile, fortifications, neutral guard stacks, sites, ruins,
//! resource crystals, item bags, roads and obstacles. Generation is one-shot
//! and deterministic for a `(template, catalogs, seed)` triple.

pub mod catalog;
pub mod core;
pub mod gen;
pub mod map;
pub mod template;

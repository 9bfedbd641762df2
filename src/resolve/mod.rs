//! Combat resolution.
//!
//! Resolves a single attack between two territories with one die per side,
//! drawing faces through an injectable [`Dice`] source.

pub mod combat;
pub mod dice;

pub use combat::{resolve, resolve_rolls, CombatOutcome, Side};
pub use dice::{Dice, LoadedDice};

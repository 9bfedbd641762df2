//! Board representation.
//!
//! Contains the territory record and the bounded, ordered collection that
//! holds every territory registered for a session.

pub mod map;
pub mod territory;

pub use map::TerritoryMap;
pub use territory::{Territory, TerritoryError, MAX_NAME_LEN, MAX_TROOPS};

//! Territory records.
//!
//! A territory is a named slot on the map held by a faction with some number
//! of troops. Names and factions are bounded strings so that every record
//! stays small and printable on a single line.

use serde::{Deserialize, Serialize};

/// Maximum length, in characters, of a territory name or faction.
pub const MAX_NAME_LEN: usize = 29;

/// Largest troop count a territory may hold.
///
/// Keeps a full battle, and the odds estimator that replays it, bounded.
pub const MAX_TROOPS: u32 = 9_999;

/// Errors raised while building or registering territories.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TerritoryError {
    #[error("territory name is empty")]
    EmptyName,

    #[error("faction is empty")]
    EmptyFaction,

    #[error("'{0}' exceeds {max} characters", max = MAX_NAME_LEN)]
    TooLong(String),

    #[error("{0} troops exceeds the maximum of {max}", max = MAX_TROOPS)]
    TooManyTroops(i64),

    #[error("map is full ({0} territories)")]
    MapFull(usize),
}

/// A single territory on the map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Territory {
    pub name: String,
    pub faction: String,
    pub troops: u32,
}

impl Territory {
    /// Creates a territory, rejecting empty or over-long labels and troop
    /// counts above [`MAX_TROOPS`].
    pub fn new(
        name: impl Into<String>,
        faction: impl Into<String>,
        troops: u32,
    ) -> Result<Self, TerritoryError> {
        let name = name.into();
        let faction = faction.into();
        if name.is_empty() {
            return Err(TerritoryError::EmptyName);
        }
        if faction.is_empty() {
            return Err(TerritoryError::EmptyFaction);
        }
        check_len(&name)?;
        check_len(&faction)?;
        if troops > MAX_TROOPS {
            return Err(TerritoryError::TooManyTroops(i64::from(troops)));
        }
        Ok(Territory { name, faction, troops })
    }

    /// Creates a territory from a signed troop count, clamping negatives to 0.
    pub fn with_signed_troops(
        name: impl Into<String>,
        faction: impl Into<String>,
        troops: i64,
    ) -> Result<Self, TerritoryError> {
        let troops = u32::try_from(troops.max(0))
            .ok()
            .filter(|&t| t <= MAX_TROOPS)
            .ok_or(TerritoryError::TooManyTroops(troops))?;
        Territory::new(name, faction, troops)
    }

    /// Returns true if this territory belongs to `faction` and still holds troops.
    pub fn is_held_by(&self, faction: &str) -> bool {
        self.faction == faction && self.troops > 0
    }
}

fn check_len(s: &str) -> Result<(), TerritoryError> {
    if s.chars().count() > MAX_NAME_LEN {
        return Err(TerritoryError::TooLong(s.to_string()));
    }
    Ok(())
}

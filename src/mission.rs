//! Secret missions and their evaluation.
//!
//! A mission is drawn once per session from a two-entry catalog and never
//! changes afterwards. Evaluation is a pure scan over the territory
//! collection.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::Territory;

/// Number of held territories the catalog conquest mission asks for.
pub const CONQUEST_TARGET: usize = 3;

/// Faction the catalog elimination mission asks the player to wipe out.
pub const DEFAULT_TARGET_FACTION: &str = "Verde";

/// The closed set of mission kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MissionKind {
    Conquest,
    Elimination,
}

impl MissionKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            MissionKind::Conquest => "conquest",
            MissionKind::Elimination => "elimination",
        }
    }
}

impl FromStr for MissionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "conquest" => Ok(MissionKind::Conquest),
            "elimination" => Ok(MissionKind::Elimination),
            other => Err(format!("unknown mission kind '{other}'")),
        }
    }
}

/// A player's objective.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Mission {
    /// Hold at least `target` territories with troops.
    Conquest { target: usize },
    /// Leave no territory of `faction` with troops.
    Elimination { faction: String },
}

impl Mission {
    /// The two catalog missions, with `target_faction` as the elimination target.
    pub fn catalog(target_faction: &str) -> [Mission; 2] {
        [
            Mission::Conquest { target: CONQUEST_TARGET },
            Mission::Elimination { faction: target_faction.to_string() },
        ]
    }

    /// Draws one catalog mission uniformly at random.
    pub fn draw<R: Rng + ?Sized>(rng: &mut R, target_faction: &str) -> Mission {
        let [conquest, elimination] = Mission::catalog(target_faction);
        if rng.gen_bool(0.5) {
            conquest
        } else {
            elimination
        }
    }

    /// Builds the catalog mission of the given kind.
    pub fn of_kind(kind: MissionKind, target_faction: &str) -> Mission {
        match kind {
            MissionKind::Conquest => Mission::Conquest { target: CONQUEST_TARGET },
            MissionKind::Elimination => Mission::Elimination { faction: target_faction.to_string() },
        }
    }

    pub const fn kind(&self) -> MissionKind {
        match self {
            Mission::Conquest { .. } => MissionKind::Conquest,
            Mission::Elimination { .. } => MissionKind::Elimination,
        }
    }
}

impl fmt::Display for Mission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mission::Conquest { target } => write!(f, "Conquer {target} territories"),
            Mission::Elimination { faction } => write!(f, "Destroy the entire {faction} army"),
        }
    }
}

/// Returns true if `mission` is currently satisfied for `player_faction`.
pub fn evaluate(territories: &[Territory], mission: &Mission, player_faction: &str) -> bool {
    match mission {
        Mission::Conquest { target } => {
            territories.iter().filter(|t| t.is_held_by(player_faction)).count() >= *target
        }
        Mission::Elimination { faction } => !territories.iter().any(|t| t.is_held_by(faction)),
    }
}

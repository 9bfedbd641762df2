//! Dice combat between two territories.
//!
//! One exchange rolls a die for each side. Ties go to the attacker. The
//! loser of the exchange drops one troop; a defender driven to zero is
//! conquered and receives half of the attacker's troops (at least one),
//! changing hands to the attacker's faction.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::dice::Dice;
use crate::board::Territory;

/// Which side won an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Attacker,
    Defender,
}

impl Side {
    pub const fn as_str(self) -> &'static str {
        match self {
            Side::Attacker => "attacker",
            Side::Defender => "defender",
        }
    }
}

/// The result of a single exchange, with post-combat troop counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatOutcome {
    pub attack_roll: u8,
    pub defend_roll: u8,
    pub winner: Side,
    pub conquered: bool,
    /// Troops moved into the defender's slot on conquest, 0 otherwise.
    pub transferred: u32,
    pub attacker_troops: u32,
    pub defender_troops: u32,
}

/// Resolves one exchange, drawing the attacker's die first.
///
/// # Panics
/// Panics if both territories share a faction or the attacker has no troops.
/// Both checks run before any troop or faction is touched.
pub fn resolve<D: Dice + ?Sized>(
    attacker: &mut Territory,
    defender: &mut Territory,
    dice: &mut D,
) -> CombatOutcome {
    check_preconditions(attacker, defender);
    let attack_roll = dice.roll_d6();
    let defend_roll = dice.roll_d6();
    apply_rolls(attacker, defender, attack_roll, defend_roll)
}

/// Resolves one exchange with the given die faces.
///
/// # Panics
/// Same contract as [`resolve`].
pub fn resolve_rolls(
    attacker: &mut Territory,
    defender: &mut Territory,
    attack_roll: u8,
    defend_roll: u8,
) -> CombatOutcome {
    check_preconditions(attacker, defender);
    apply_rolls(attacker, defender, attack_roll, defend_roll)
}

/// Applies an exchange to territories that already passed the precondition check.
fn apply_rolls(
    attacker: &mut Territory,
    defender: &mut Territory,
    attack_roll: u8,
    defend_roll: u8,
) -> CombatOutcome {
    debug_assert!((1..=6).contains(&attack_roll) && (1..=6).contains(&defend_roll));

    let winner = if attack_roll >= defend_roll {
        Side::Attacker
    } else {
        Side::Defender
    };

    let mut conquered = false;
    let mut transferred = 0;
    match winner {
        Side::Attacker => {
            defender.troops = defender.troops.saturating_sub(1);
            if defender.troops == 0 {
                transferred = (attacker.troops / 2).max(1);
                defender.troops = transferred;
                defender.faction.clone_from(&attacker.faction);
                attacker.troops = attacker.troops.saturating_sub(transferred);
                conquered = true;
            }
        }
        Side::Defender => {
            attacker.troops = attacker.troops.saturating_sub(1);
        }
    }

    debug!(
        attacker = %attacker.name,
        defender = %defender.name,
        attack_roll,
        defend_roll,
        winner = winner.as_str(),
        "exchange resolved"
    );
    if conquered {
        info!(
            territory = %defender.name,
            faction = %defender.faction,
            transferred,
            "territory conquered"
        );
    }

    CombatOutcome {
        attack_roll,
        defend_roll,
        winner,
        conquered,
        transferred,
        attacker_troops: attacker.troops,
        defender_troops: defender.troops,
    }
}

fn check_preconditions(attacker: &Territory, defender: &Territory) {
    assert!(
        attacker.faction != defender.faction,
        "{} cannot attack {}: both held by {}",
        attacker.name,
        defender.name,
        attacker.faction
    );
    assert!(attacker.troops >= 1, "{} has no troops to attack with", attacker.name);
}

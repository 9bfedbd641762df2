//! Monte Carlo odds for a full battle.
//!
//! Plays many independent battles between copies of two territories, each
//! battle repeating exchanges until the defender falls or the attacker runs
//! out of troops. Trials run in parallel on a rayon pool; trial `i` is seeded
//! with `seed + i`, so a non-zero seed gives the same report on every run.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::board::Territory;
use crate::resolve::{resolve, Dice};

/// Largest number of battles a single estimate may simulate.
pub const MAX_ODDS_TRIALS: u32 = 10_000;

/// Errors raised by the odds estimator.
#[derive(Debug, thiserror::Error)]
pub enum OddsError {
    #[error("{0} trials exceeds the maximum of {max}", max = MAX_ODDS_TRIALS)]
    TooManyTrials(u32),

    #[error("failed to start odds workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Settings for an odds estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OddsConfig {
    /// Number of simulated battles.
    pub trials: u32,
    /// Base seed (0 = use entropy).
    pub seed: u64,
    /// Worker threads for the rayon pool.
    pub threads: usize,
}

impl Default for OddsConfig {
    fn default() -> Self {
        OddsConfig {
            trials: 1000,
            seed: 0,
            threads: 4,
        }
    }
}

/// Aggregate result of an odds estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OddsReport {
    pub trials: u32,
    pub conquests: u32,
    /// Fraction of battles ending in conquest.
    pub probability: f64,
    /// Mean number of exchanges per battle.
    pub mean_exchanges: f64,
}

/// Outcome of one simulated battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BattleResult {
    pub conquered: bool,
    pub exchanges: u64,
}

/// Plays exchanges until the defender is conquered or the attacker is spent.
///
/// Territories of the same faction never fight; the result is then an
/// empty battle.
pub fn play_battle<D: Dice + ?Sized>(
    attacker: &mut Territory,
    defender: &mut Territory,
    dice: &mut D,
) -> BattleResult {
    let mut exchanges: u64 = 0;
    while attacker.troops > 0 && attacker.faction != defender.faction {
        exchanges += 1;
        if resolve(attacker, defender, dice).conquered {
            return BattleResult { conquered: true, exchanges };
        }
    }
    BattleResult { conquered: false, exchanges }
}

/// Estimates the chance that `attacker` conquers `defender` in a full battle.
///
/// Refuses more than [`MAX_ODDS_TRIALS`] battles.
pub fn estimate_odds(
    attacker: &Territory,
    defender: &Territory,
    config: &OddsConfig,
) -> Result<OddsReport, OddsError> {
    if config.trials > MAX_ODDS_TRIALS {
        return Err(OddsError::TooManyTrials(config.trials));
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()?;

    let (conquests, exchanges) = pool.install(|| {
        (0..config.trials)
            .into_par_iter()
            .map(|i| {
                let mut rng = if config.seed != 0 {
                    SmallRng::seed_from_u64(config.seed.wrapping_add(u64::from(i)))
                } else {
                    SmallRng::from_entropy()
                };
                let mut a = attacker.clone();
                let mut d = defender.clone();
                let result = play_battle(&mut a, &mut d, &mut rng);
                (u32::from(result.conquered), result.exchanges)
            })
            .reduce(|| (0, 0), |x, y| (x.0 + y.0, x.1 + y.1))
    });

    let report = if config.trials == 0 {
        OddsReport {
            trials: 0,
            conquests: 0,
            probability: 0.0,
            mean_exchanges: 0.0,
        }
    } else {
        OddsReport {
            trials: config.trials,
            conquests,
            probability: f64::from(conquests) / f64::from(config.trials),
            mean_exchanges: exchanges as f64 / f64::from(config.trials),
        }
    };
    debug!(
        attacker = %attacker.name,
        defender = %defender.name,
        trials = report.trials,
        conquests = report.conquests,
        "odds estimated"
    );
    Ok(report)
}

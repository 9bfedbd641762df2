//! Session configuration.
//!
//! Built from command-line options by the binary; every field has a default
//! so a bare invocation starts a playable session.

use crate::board::MAX_NAME_LEN;
use crate::mission::{MissionKind, DEFAULT_TARGET_FACTION};
use crate::simulate::{OddsConfig, MAX_ODDS_TRIALS};

/// Errors raised while reading command-line options.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing value for {0}")]
    MissingValue(&'static str),

    #[error("invalid value for {flag}: '{value}'")]
    InvalidValue { flag: &'static str, value: String },

    #[error("capacity must be at least 1")]
    ZeroCapacity,

    #[error("faction '{0}' must be 1 to {max} characters with no whitespace", max = MAX_NAME_LEN)]
    BadFaction(String),

    #[error("odds trials {0} exceeds the maximum of {max}", max = MAX_ODDS_TRIALS)]
    TooManyTrials(u32),

    #[error("unknown argument: {0}")]
    UnknownArgument(String),

    #[error("help requested")]
    HelpRequested,
}

/// Configuration for one game session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    /// Maximum number of territories the map accepts.
    pub capacity: usize,
    /// The human player's faction.
    pub faction: String,
    /// Random seed (0 = use entropy).
    pub seed: u64,
    /// Faction the elimination mission targets.
    pub target_faction: String,
    /// Force a mission kind instead of drawing one.
    pub mission: Option<MissionKind>,
    /// Evaluate the mission after every successful attack.
    pub auto_check: bool,
    /// Battles simulated by the `odds` command when no count is given.
    pub odds_trials: u32,
    /// Worker threads for the odds estimator.
    pub threads: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            capacity: 16,
            faction: "Azul".to_string(),
            seed: 0,
            target_faction: DEFAULT_TARGET_FACTION.to_string(),
            mission: None,
            auto_check: true,
            odds_trials: 1000,
            threads: 4,
        }
    }
}

pub const USAGE: &str = "\
Usage: conquest [OPTIONS]

Options:
  --capacity N            Maximum number of territories (default: 16)
  --faction NAME          Your faction (default: Azul)
  --seed N                Random seed, 0 for entropy (default: 0)
  --target-faction NAME   Faction the elimination mission targets (default: Verde)
  --mission KIND          Force 'conquest' or 'elimination' instead of drawing
  --no-auto-check         Do not check the mission after each attack
  --odds-trials N         Battles simulated by 'odds', at most 10000 (default: 1000)
  --threads N             Worker threads for 'odds' (default: 4)
  --help                  Show this message";

impl GameConfig {
    /// Parses options, excluding the program name.
    pub fn from_args<I>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = GameConfig::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--capacity" => {
                    config.capacity = parse_value("--capacity", args.next())?;
                }
                "--faction" => {
                    config.faction = value("--faction", args.next())?;
                }
                "--seed" => {
                    config.seed = parse_value("--seed", args.next())?;
                }
                "--target-faction" => {
                    config.target_faction = value("--target-faction", args.next())?;
                }
                "--mission" => {
                    config.mission = Some(parse_value("--mission", args.next())?);
                }
                "--no-auto-check" => {
                    config.auto_check = false;
                }
                "--odds-trials" => {
                    config.odds_trials = parse_value("--odds-trials", args.next())?;
                }
                "--threads" => {
                    config.threads = parse_value("--threads", args.next())?;
                }
                "--help" | "-h" => return Err(ConfigError::HelpRequested),
                other => return Err(ConfigError::UnknownArgument(other.to_string())),
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks the cross-field constraints parsing alone cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        for faction in [&self.faction, &self.target_faction] {
            // `register` reads the faction as a single token.
            if faction.is_empty()
                || faction.chars().count() > MAX_NAME_LEN
                || faction.chars().any(char::is_whitespace)
            {
                return Err(ConfigError::BadFaction(faction.clone()));
            }
        }
        if self.odds_trials > MAX_ODDS_TRIALS {
            return Err(ConfigError::TooManyTrials(self.odds_trials));
        }
        Ok(())
    }

    /// Settings for the odds estimator derived from this session.
    pub fn odds(&self) -> OddsConfig {
        OddsConfig {
            trials: self.odds_trials,
            seed: self.seed,
            threads: self.threads,
        }
    }
}

fn value(flag: &'static str, raw: Option<String>) -> Result<String, ConfigError> {
    raw.ok_or(ConfigError::MissingValue(flag))
}

fn parse_value<T: std::str::FromStr>(flag: &'static str, raw: Option<String>) -> Result<T, ConfigError> {
    let raw = value(flag, raw)?;
    raw.parse()
        .map_err(|_| ConfigError::InvalidValue { flag, value: raw })
}

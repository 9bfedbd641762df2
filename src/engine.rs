//! Session state management.
//!
//! Holds the territory map, the player's faction and secret mission, and the
//! session's random source. Validates attacks before handing them to the
//! resolver and writes one response line per fact to the output stream.

use std::io::{self, Write};

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{info, warn};

use crate::board::{Territory, TerritoryError, TerritoryMap};
use crate::config::GameConfig;
use crate::mission::{evaluate, Mission};
use crate::protocol::Command;
use crate::resolve::{resolve, CombatOutcome, Dice};
use crate::simulate::{estimate_odds, OddsError, OddsReport};

/// Reasons an attack is refused before any dice are rolled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttackError {
    #[error("at least 2 territories are needed to attack")]
    NotEnoughTerritories,

    #[error("no territory number {number} (have {count})")]
    NoSuchTerritory { number: usize, count: usize },

    #[error("a territory cannot attack itself")]
    SelfAttack,

    #[error("cannot attack a territory of the same faction ({0})")]
    SameFaction(String),

    #[error("{0} has no troops to attack with")]
    NoTroops(String),
}

/// Errors that abort command handling.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Attack(#[from] AttackError),

    #[error("failed to encode state: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Odds(#[from] OddsError),
}

/// Serializable view of the session for the `state` command.
#[derive(Serialize)]
struct Snapshot<'a> {
    player: &'a str,
    mission: &'a Mission,
    map: &'a TerritoryMap,
    finished: bool,
}

/// Holds the mutable state of one game session.
///
/// Generic over the dice so a session can be replayed with scripted rolls.
pub struct Engine<D: Dice = SmallRng> {
    config: GameConfig,
    map: TerritoryMap,
    mission: Mission,
    dice: D,
    finished: bool,
}

impl Engine<SmallRng> {
    /// Starts a session: seeds the dice and draws (or forces) the mission.
    pub fn new(config: GameConfig) -> Self {
        let mut rng = if config.seed != 0 {
            SmallRng::seed_from_u64(config.seed)
        } else {
            SmallRng::from_entropy()
        };
        let mission = match config.mission {
            Some(kind) => Mission::of_kind(kind, &config.target_faction),
            None => Mission::draw(&mut rng, &config.target_faction),
        };
        Engine::with_parts(config, mission, rng)
    }
}

impl<D: Dice> Engine<D> {
    /// Starts a session with an explicit mission and dice.
    pub fn with_parts(config: GameConfig, mission: Mission, dice: D) -> Self {
        info!(player = %config.faction, "session started");
        Engine {
            map: TerritoryMap::with_capacity(config.capacity),
            config,
            mission,
            dice,
            finished: false,
        }
    }

    pub fn map(&self) -> &TerritoryMap {
        &self.map
    }

    pub fn mission(&self) -> &Mission {
        &self.mission
    }

    pub fn player(&self) -> &str {
        &self.config.faction
    }

    /// True once the player has quit or completed the mission.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Registers a territory, clamping negative troop counts to zero.
    pub fn register(&mut self, name: &str, faction: &str, troops: i64) -> Result<usize, TerritoryError> {
        let territory = Territory::with_signed_troops(name, faction, troops)?;
        self.map.register(territory)
    }

    /// Checks an attack between two zero-based indices without changing anything.
    pub fn validate_attack(&self, attacker: usize, defender: usize) -> Result<(), AttackError> {
        let count = self.map.len();
        if count < 2 {
            return Err(AttackError::NotEnoughTerritories);
        }
        let a = self.map.get(attacker).ok_or(AttackError::NoSuchTerritory {
            number: attacker.saturating_add(1),
            count,
        })?;
        let d = self.map.get(defender).ok_or(AttackError::NoSuchTerritory {
            number: defender.saturating_add(1),
            count,
        })?;
        if attacker == defender {
            return Err(AttackError::SelfAttack);
        }
        if a.faction == d.faction {
            return Err(AttackError::SameFaction(a.faction.clone()));
        }
        if a.troops == 0 {
            return Err(AttackError::NoTroops(a.name.clone()));
        }
        Ok(())
    }

    /// Validates and resolves one attack between zero-based indices.
    pub fn attack(&mut self, attacker: usize, defender: usize) -> Result<CombatOutcome, AttackError> {
        self.validate_attack(attacker, defender)?;
        let (a, d) = self
            .map
            .pair_mut(attacker, defender)
            .ok_or(AttackError::SelfAttack)?;
        Ok(resolve(a, d, &mut self.dice))
    }

    /// Returns true if the player's mission currently holds.
    pub fn mission_complete(&self) -> bool {
        evaluate(self.map.as_slice(), &self.mission, &self.config.faction)
    }

    /// Estimates full-battle odds between zero-based indices.
    pub fn odds(&self, attacker: usize, defender: usize, trials: Option<u32>) -> Result<OddsReport, EngineError> {
        self.validate_attack(attacker, defender)?;
        let mut odds = self.config.odds();
        if let Some(t) = trials {
            odds.trials = t;
        }
        let (a, d) = (&self.map.as_slice()[attacker], &self.map.as_slice()[defender]);
        Ok(estimate_odds(a, d, &odds)?)
    }

    /// Writes the opening briefing shown once at session start.
    pub fn handle_start<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "player {}", self.config.faction)?;
        writeln!(out, "objective {}", self.mission)?;
        out.flush()
    }

    /// Dispatches one parsed command.
    pub fn handle_command<W: Write>(&mut self, cmd: Command, out: &mut W) -> Result<(), EngineError> {
        match cmd {
            Command::Register { name, faction, troops } => {
                self.handle_register(&name, &faction, troops, out)?;
            }
            Command::List => self.handle_list(out)?,
            Command::Attack { attacker, defender } => {
                self.handle_attack(attacker, defender, out)?;
            }
            Command::Mission => self.handle_mission(out)?,
            Command::Objective => {
                writeln!(out, "objective {}", self.mission)?;
            }
            Command::Odds { attacker, defender, trials } => {
                self.handle_odds(attacker, defender, trials, out)?;
            }
            Command::State => self.handle_state(out)?,
            Command::Quit => {
                self.finished = true;
            }
        }
        out.flush()?;
        Ok(())
    }

    fn handle_register<W: Write>(&mut self, name: &str, faction: &str, troops: i64, out: &mut W) -> io::Result<()> {
        match self.register(name, faction, troops) {
            Ok(idx) => {
                let t = &self.map.as_slice()[idx];
                writeln!(out, "registered {} {} | {} | {}", idx + 1, t.name, t.faction, t.troops)
            }
            Err(e) => reject(out, &e),
        }
    }

    fn handle_list<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if self.map.is_empty() {
            return writeln!(out, "no territories");
        }
        for (i, t) in self.map.iter().enumerate() {
            writeln!(out, "territory {} {} | {} | {}", i + 1, t.name, t.faction, t.troops)?;
        }
        Ok(())
    }

    /// Handles `attack` with 1-based territory numbers.
    fn handle_attack<W: Write>(&mut self, attacker: usize, defender: usize, out: &mut W) -> io::Result<()> {
        let (a, d) = match self.indices(attacker, defender) {
            Ok(pair) => pair,
            Err(e) => return reject(out, &e),
        };
        if let Err(e) = self.validate_attack(a, d) {
            return reject(out, &e);
        }

        {
            let at = &self.map.as_slice()[a];
            let df = &self.map.as_slice()[d];
            writeln!(out, "battle {} ({}) -> {} ({})", at.name, at.troops, df.name, df.troops)?;
        }
        let outcome = match self.attack(a, d) {
            Ok(o) => o,
            Err(e) => return reject(out, &e),
        };
        writeln!(out, "roll attacker {} defender {}", outcome.attack_roll, outcome.defend_roll)?;
        writeln!(out, "winner {}", outcome.winner.as_str())?;
        let (at, df) = (&self.map.as_slice()[a], &self.map.as_slice()[d]);
        if outcome.conquered {
            writeln!(out, "conquered {} by {} transferred {}", df.name, df.faction, outcome.transferred)?;
        }
        writeln!(out, "troops {} {} {} {}", at.name, at.troops, df.name, df.troops)?;

        if self.config.auto_check && self.mission_complete() {
            self.declare_victory(out)?;
        }
        Ok(())
    }

    fn handle_mission<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        if self.mission_complete() {
            self.declare_victory(out)
        } else {
            writeln!(out, "mission incomplete")
        }
    }

    fn handle_odds<W: Write>(&self, attacker: usize, defender: usize, trials: Option<u32>, out: &mut W) -> Result<(), EngineError> {
        let (a, d) = match self.indices(attacker, defender) {
            Ok(pair) => pair,
            Err(e) => return Ok(reject(out, &e)?),
        };
        let report = match self.odds(a, d, trials) {
            Ok(r) => r,
            Err(EngineError::Attack(e)) => return Ok(reject(out, &e)?),
            Err(EngineError::Odds(e @ OddsError::TooManyTrials(_))) => return Ok(reject(out, &e)?),
            Err(e) => return Err(e),
        };
        let (at, df) = (&self.map.as_slice()[a], &self.map.as_slice()[d]);
        writeln!(
            out,
            "odds {} -> {} trials {} conquests {} probability {:.3} mean_exchanges {:.2}",
            at.name, df.name, report.trials, report.conquests, report.probability, report.mean_exchanges
        )?;
        Ok(())
    }

    fn handle_state<W: Write>(&self, out: &mut W) -> Result<(), EngineError> {
        let snapshot = Snapshot {
            player: &self.config.faction,
            mission: &self.mission,
            map: &self.map,
            finished: self.finished,
        };
        let json = serde_json::to_string(&snapshot)?;
        writeln!(out, "{json}")?;
        Ok(())
    }

    fn declare_victory<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        info!(player = %self.config.faction, "mission complete");
        self.finished = true;
        writeln!(out, "mission complete")?;
        writeln!(out, "victory")
    }

    /// Converts 1-based territory numbers to indices.
    fn indices(&self, attacker: usize, defender: usize) -> Result<(usize, usize), AttackError> {
        let count = self.map.len();
        if count < 2 {
            return Err(AttackError::NotEnoughTerritories);
        }
        let index = |number: usize| {
            number
                .checked_sub(1)
                .filter(|&i| i < count)
                .ok_or(AttackError::NoSuchTerritory { number, count })
        };
        Ok((index(attacker)?, index(defender)?))
    }
}

fn reject<W: Write>(out: &mut W, reason: &dyn std::fmt::Display) -> io::Result<()> {
    warn!(%reason, "command rejected");
    writeln!(out, "rejected {reason}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mission::MissionKind;
    use crate::protocol::parse_command;
    use crate::resolve::{LoadedDice, Side};

    fn config() -> GameConfig {
        GameConfig {
            capacity: 4,
            seed: 7,
            ..GameConfig::default()
        }
    }

    fn scripted(mission: Mission, faces: &[u8]) -> Engine<LoadedDice> {
        Engine::with_parts(config(), mission, LoadedDice::new(faces.to_vec()))
    }

    fn conquest() -> Mission {
        Mission::of_kind(MissionKind::Conquest, "Verde")
    }

    fn elimination() -> Mission {
        Mission::of_kind(MissionKind::Elimination, "Verde")
    }

    /// Runs command lines through the engine and returns the output lines.
    fn run<D: Dice>(engine: &mut Engine<D>, lines: &[&str]) -> Vec<String> {
        let mut output = Vec::new();
        for line in lines {
            if let Some(cmd) = parse_command(line) {
                engine.handle_command(cmd, &mut output).unwrap();
            }
        }
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn new_engine_uses_forced_mission() {
        let engine = Engine::new(GameConfig {
            mission: Some(MissionKind::Elimination),
            target_faction: "Preto".to_string(),
            ..config()
        });
        assert_eq!(engine.mission(), &Mission::Elimination { faction: "Preto".to_string() });
        assert_eq!(engine.player(), "Azul");
        assert!(engine.map().is_empty());
        assert!(!engine.is_finished());
    }

    #[test]
    fn same_seed_draws_same_mission() {
        let a = Engine::new(config());
        let b = Engine::new(config());
        assert_eq!(a.mission(), b.mission());
    }

    #[test]
    fn register_respects_capacity() {
        let mut engine = scripted(conquest(), &[6]);
        for i in 0..4 {
            assert_eq!(engine.register(&format!("T{i}"), "Azul", 1), Ok(i));
        }
        assert_eq!(engine.register("T4", "Azul", 1), Err(TerritoryError::MapFull(4)));
    }

    #[test]
    fn validate_attack_rejections() {
        let mut engine = scripted(conquest(), &[6]);
        engine.register("Brasil", "Azul", 3).unwrap();
        assert_eq!(engine.validate_attack(0, 1), Err(AttackError::NotEnoughTerritories));

        engine.register("Peru", "Azul", 2).unwrap();
        engine.register("Chile", "Verde", 0).unwrap();
        assert_eq!(
            engine.validate_attack(0, 5),
            Err(AttackError::NoSuchTerritory { number: 6, count: 3 })
        );
        assert_eq!(engine.validate_attack(1, 1), Err(AttackError::SelfAttack));
        assert_eq!(
            engine.validate_attack(0, 1),
            Err(AttackError::SameFaction("Azul".to_string()))
        );
        assert_eq!(
            engine.validate_attack(2, 0),
            Err(AttackError::NoTroops("Chile".to_string()))
        );
        assert_eq!(engine.validate_attack(0, 2), Ok(()));
    }

    #[test]
    fn rejected_attack_changes_nothing() {
        let mut engine = scripted(conquest(), &[6, 1]);
        engine.register("Brasil", "Azul", 3).unwrap();
        engine.register("Peru", "Azul", 2).unwrap();
        let before = engine.map().clone();
        assert!(engine.attack(0, 1).is_err());
        assert_eq!(engine.map(), &before);
    }

    #[test]
    fn attack_applies_scripted_rolls() {
        let mut engine = scripted(conquest(), &[6, 1]);
        engine.register("Brasil", "Azul", 5).unwrap();
        engine.register("Argentina", "Verde", 1).unwrap();
        let outcome = engine.attack(0, 1).unwrap();
        assert_eq!(outcome.winner, Side::Attacker);
        assert!(outcome.conquered);
        let argentina = engine.map().get(1).unwrap();
        assert_eq!(argentina.faction, "Azul");
        assert_eq!(argentina.troops, 2);
        assert_eq!(engine.map().get(0).unwrap().troops, 3);
    }

    #[test]
    fn conquest_mission_completes_after_third_territory() {
        let mut engine = scripted(conquest(), &[6, 1]);
        engine.register("Brasil", "Azul", 5).unwrap();
        engine.register("Peru", "Azul", 2).unwrap();
        engine.register("Chile", "Verde", 1).unwrap();
        assert!(!engine.mission_complete());
        engine.attack(0, 2).unwrap();
        assert!(engine.mission_complete());
    }

    #[test]
    fn handle_attack_reports_and_declares_victory() {
        let mut engine = scripted(elimination(), &[6, 1]);
        let lines = run(
            &mut engine,
            &[
                "register Brasil Azul 5",
                "register Argentina Verde 1",
                "attack 1 2",
            ],
        );
        assert_eq!(
            lines,
            vec![
                "registered 1 Brasil | Azul | 5",
                "registered 2 Argentina | Verde | 1",
                "battle Brasil (5) -> Argentina (1)",
                "roll attacker 6 defender 1",
                "winner attacker",
                "conquered Argentina by Azul transferred 2",
                "troops Brasil 3 Argentina 2",
                "mission complete",
                "victory",
            ]
        );
        assert!(engine.is_finished());
    }

    #[test]
    fn auto_check_can_be_disabled() {
        let mut engine = Engine::with_parts(
            GameConfig { auto_check: false, ..config() },
            elimination(),
            LoadedDice::new([6, 1]),
        );
        let lines = run(
            &mut engine,
            &["register Brasil Azul 5", "register Argentina Verde 1", "attack 1 2"],
        );
        assert!(!lines.iter().any(|l| l == "victory"));
        assert!(!engine.is_finished());

        let lines = run(&mut engine, &["mission"]);
        assert_eq!(lines, vec!["mission complete", "victory"]);
        assert!(engine.is_finished());
    }

    #[test]
    fn handle_attack_defender_holds() {
        let mut engine = scripted(elimination(), &[2, 5]);
        let lines = run(
            &mut engine,
            &["register Brasil Azul 3", "register Argentina Verde 5", "attack 1 2"],
        );
        assert!(lines.contains(&"winner defender".to_string()));
        assert!(lines.contains(&"troops Brasil 2 Argentina 5".to_string()));
        assert!(!lines.iter().any(|l| l.starts_with("conquered")));
        assert!(!engine.is_finished());
    }

    #[test]
    fn handle_attack_rejections_are_reported() {
        let mut engine = scripted(conquest(), &[6, 1]);
        let lines = run(
            &mut engine,
            &[
                "attack 1 2",
                "register Brasil Azul 3",
                "register Peru Azul 2",
                "attack 0 1",
                "attack 1 9",
                "attack 1 1",
                "attack 1 2",
            ],
        );
        let rejected: Vec<&String> = lines.iter().filter(|l| l.starts_with("rejected ")).collect();
        assert_eq!(rejected.len(), 5);
        assert!(rejected[0].contains("at least 2"));
        assert!(rejected[1].contains("number 0"));
        assert!(rejected[2].contains("number 9"));
        assert!(rejected[3].contains("itself"));
        assert!(rejected[4].contains("same faction"));
    }

    #[test]
    fn handle_register_rejects_when_full() {
        let mut engine = Engine::with_parts(
            GameConfig { capacity: 1, ..config() },
            conquest(),
            LoadedDice::new([1]),
        );
        let lines = run(&mut engine, &["register Brasil Azul -3", "register Peru Verde 2"]);
        assert_eq!(lines[0], "registered 1 Brasil | Azul | 0");
        assert!(lines[1].starts_with("rejected map is full"));
    }

    #[test]
    fn handle_list_and_objective() {
        let mut engine = scripted(conquest(), &[1]);
        let lines = run(&mut engine, &["list", "objective"]);
        assert_eq!(lines, vec!["no territories", "objective Conquer 3 territories"]);

        let lines = run(&mut engine, &["register Costa Rica Verde 4", "list"]);
        assert_eq!(lines[1], "territory 1 Costa Rica | Verde | 4");
    }

    #[test]
    fn handle_mission_incomplete() {
        let mut engine = scripted(conquest(), &[1]);
        let lines = run(&mut engine, &["register Brasil Azul 3", "mission"]);
        assert_eq!(lines[1], "mission incomplete");
        assert!(!engine.is_finished());
    }

    #[test]
    fn handle_odds_is_seeded_and_read_only() {
        let mut engine = scripted(conquest(), &[1]);
        run(&mut engine, &["register Brasil Azul 6", "register Peru Verde 2"]);
        let before = engine.map().clone();
        let first = run(&mut engine, &["odds 1 2 300"]);
        let second = run(&mut engine, &["odds 1 2 300"]);
        assert_eq!(first, second);
        assert!(first[0].starts_with("odds Brasil -> Peru trials 300 conquests "));
        assert_eq!(engine.map(), &before);

        let lines = run(&mut engine, &["odds 2 2"]);
        assert!(lines[0].starts_with("rejected "));
    }

    #[test]
    fn handle_odds_rejects_too_many_trials() {
        let mut engine = scripted(conquest(), &[1]);
        run(&mut engine, &["register Brasil Azul 6", "register Peru Verde 2"]);
        let lines = run(&mut engine, &["odds 1 2 4294967295"]);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("rejected 4294967295 trials exceeds the maximum"));
        assert!(!engine.is_finished());
    }

    #[test]
    fn handle_register_rejects_huge_troop_counts() {
        let mut engine = scripted(conquest(), &[1]);
        let lines = run(&mut engine, &["register Brasil Azul 99999999999", "list"]);
        assert!(lines[0].starts_with("rejected 99999999999 troops exceeds the maximum"));
        assert_eq!(lines[1], "no territories");
    }

    #[test]
    fn handle_state_is_json() {
        let mut engine = scripted(elimination(), &[1]);
        let lines = run(&mut engine, &["register Brasil Azul 3", "state"]);
        let value: serde_json::Value = serde_json::from_str(&lines[1]).unwrap();
        assert_eq!(value["player"], "Azul");
        assert_eq!(value["mission"]["kind"], "elimination");
        assert_eq!(value["map"]["capacity"], 4);
        assert_eq!(value["map"]["territories"][0]["name"], "Brasil");
        assert_eq!(value["finished"], false);
    }

    #[test]
    fn quit_finishes_session() {
        let mut engine = scripted(conquest(), &[1]);
        let lines = run(&mut engine, &["quit"]);
        assert!(lines.is_empty());
        assert!(engine.is_finished());
    }

    #[test]
    fn handle_start_shows_briefing() {
        let engine = scripted(elimination(), &[1]);
        let mut output = Vec::new();
        engine.handle_start(&mut output).unwrap();
        let text = String::from_utf8(output).unwrap();
        assert_eq!(text, "player Azul\nobjective Destroy the entire Verde army\n");
    }
}

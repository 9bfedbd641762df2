//! Command parser.
//!
//! Parses incoming command lines into structured `Command` variants that the
//! main loop dispatches on. Territory numbers are 1-based, as shown by
//! `list`.

use tracing::warn;

/// A parsed player command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Register a territory: `register <name...> <faction> <troops>`.
    Register {
        name: String,
        faction: String,
        troops: i64,
    },

    /// List every registered territory.
    List,

    /// Attack one territory from another: `attack <from> <to>`.
    Attack { attacker: usize, defender: usize },

    /// Check whether the mission is complete.
    Mission,

    /// Show the mission briefing.
    Objective,

    /// Estimate full-battle odds: `odds <from> <to> [trials]`.
    Odds {
        attacker: usize,
        defender: usize,
        trials: Option<u32>,
    },

    /// Print a JSON snapshot of the session.
    State,

    /// End the session.
    Quit,
}

/// Parses a single line of input into a `Command`.
///
/// Returns `None` for empty lines or unrecognized commands. Malformed
/// arguments for known commands also return `None` after logging a warning.
pub fn parse_command(line: &str) -> Option<Command> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let (&head, args) = tokens.split_first()?;

    match head {
        "list" => Some(Command::List),
        "mission" => Some(Command::Mission),
        "objective" => Some(Command::Objective),
        "state" => Some(Command::State),
        "quit" => Some(Command::Quit),

        "register" => parse_register(args),
        "attack" => parse_attack(args),
        "odds" => parse_odds(args),

        other => {
            warn!(command = other, "unknown command");
            None
        }
    }
}

/// Parses `register <name...> <faction> <troops>`. The name may span several words.
fn parse_register(args: &[&str]) -> Option<Command> {
    if args.len() < 3 {
        warn!("malformed register: expected 'register <name> <faction> <troops>'");
        return None;
    }
    let (name_parts, rest) = args.split_at(args.len() - 2);
    let troops = match rest[1].parse::<i64>() {
        Ok(t) => t,
        Err(_) => {
            warn!(value = rest[1], "malformed register: troops must be an integer");
            return None;
        }
    };
    Some(Command::Register {
        name: name_parts.join(" "),
        faction: rest[0].to_string(),
        troops,
    })
}

/// Parses `attack <from> <to>`.
fn parse_attack(args: &[&str]) -> Option<Command> {
    match args {
        [a, d] => {
            let (attacker, defender) = parse_pair(a, d, "attack")?;
            Some(Command::Attack { attacker, defender })
        }
        _ => {
            warn!("malformed attack: expected 'attack <from> <to>'");
            None
        }
    }
}

/// Parses `odds <from> <to> [trials]`.
fn parse_odds(args: &[&str]) -> Option<Command> {
    let (a, d, trials) = match args {
        [a, d] => (a, d, None),
        [a, d, t] => (a, d, Some(*t)),
        _ => {
            warn!("malformed odds: expected 'odds <from> <to> [trials]'");
            return None;
        }
    };
    let (attacker, defender) = parse_pair(a, d, "odds")?;
    let trials = match trials.map(str::parse::<u32>) {
        None => None,
        Some(Ok(t)) => Some(t),
        Some(Err(_)) => {
            warn!("malformed odds: trials must be a non-negative integer");
            return None;
        }
    };
    Some(Command::Odds {
        attacker,
        defender,
        trials,
    })
}

fn parse_pair(a: &str, d: &str, command: &str) -> Option<(usize, usize)> {
    match (a.parse::<usize>(), d.parse::<usize>()) {
        (Ok(a), Ok(d)) => Some((a, d)),
        _ => {
            warn!(command, "malformed territory numbers: expected two positive integers");
            None
        }
    }
}

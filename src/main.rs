//! Conquest -- a territory-conquest game played over stdin.
//!
//! This binary reads one command per line from stdin and writes responses to
//! stdout. Diagnostics go to stderr through `tracing`; set `RUST_LOG` to
//! change the filter.

use std::env;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use conquest::config::{ConfigError, GameConfig, USAGE};
use conquest::engine::{Engine, EngineError};
use conquest::protocol::parse_command;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("conquest=warn")),
        )
        .with_writer(io::stderr)
        .init();

    let config = match GameConfig::from_args(env::args().skip(1)) {
        Ok(c) => c,
        Err(ConfigError::HelpRequested) => {
            eprintln!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("{e}");
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "session aborted");
            ExitCode::FAILURE
        }
    }
}

/// Runs the command loop until `quit`, victory, or end of input.
fn run(config: GameConfig) -> Result<(), EngineError> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let mut engine = Engine::new(config);

    engine.handle_start(&mut out)?;

    for line in stdin.lock().lines() {
        let line = line?;
        let cmd = match parse_command(&line) {
            Some(c) => c,
            None => continue,
        };
        engine.handle_command(cmd, &mut out)?;
        if engine.is_finished() {
            break;
        }
    }

    out.flush()?;
    Ok(())
}

//! Text command protocol.
//!
//! Parses the line-oriented commands read by the main loop.

pub mod parser;

pub use parser::{parse_command, Command};

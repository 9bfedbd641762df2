//! Conquest engine library.
//!
//! Exposes the board representation, combat resolver, mission evaluator,
//! odds estimator, and command protocol for use by integration tests and the
//! binary entry point.

pub mod board;
pub mod config;
pub mod engine;
pub mod mission;
pub mod protocol;
pub mod resolve;
pub mod simulate;

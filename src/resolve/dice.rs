//! Six-sided dice.
//!
//! Combat draws its randomness through the [`Dice`] trait so that a session
//! can roll from a seeded generator while tests and replays feed scripted
//! faces.

use rand::rngs::SmallRng;
use rand::Rng;

/// A source of six-sided die rolls.
pub trait Dice {
    /// Rolls one die, returning a face in `1..=6`.
    fn roll_d6(&mut self) -> u8;
}

impl Dice for SmallRng {
    fn roll_d6(&mut self) -> u8 {
        self.gen_range(1..=6)
    }
}

/// Dice that replay a fixed script of faces, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct LoadedDice {
    faces: Vec<u8>,
    next: usize,
}

impl LoadedDice {
    /// Creates loaded dice from a non-empty script of faces in `1..=6`.
    ///
    /// # Panics
    /// Panics if the script is empty or holds a face outside `1..=6`.
    pub fn new(faces: impl Into<Vec<u8>>) -> Self {
        let faces = faces.into();
        assert!(!faces.is_empty(), "loaded dice need at least one face");
        assert!(
            faces.iter().all(|f| (1..=6).contains(f)),
            "loaded dice faces must be in 1..=6: {faces:?}"
        );
        LoadedDice { faces, next: 0 }
    }
}

impl Dice for LoadedDice {
    fn roll_d6(&mut self) -> u8 {
        let face = self.faces[self.next];
        self.next = (self.next + 1) % self.faces.len();
        face
    }
}

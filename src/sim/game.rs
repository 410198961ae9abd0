//! Shared contract for the three simulation cores

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::input::Intent;
use super::machine::PhaseRules;

/// Which game a core implements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameKind {
    Snake,
    TileMerge,
    Shooter,
}

impl GameKind {
    pub const ALL: [GameKind; 3] = [GameKind::Snake, GameKind::TileMerge, GameKind::Shooter];

    /// Index used by the score backend (also the unlock order)
    pub fn index(self) -> u32 {
        match self {
            GameKind::Snake => 0,
            GameKind::TileMerge => 1,
            GameKind::Shooter => 2,
        }
    }

    /// Key under which the local high score is stored
    pub fn storage_key(self) -> &'static str {
        match self {
            GameKind::Snake => "snakeHighScore",
            GameKind::TileMerge => "2048HighScore",
            GameKind::Shooter => "shooterHighScore",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GameKind::Snake => "snake",
            GameKind::TileMerge => "2048",
            GameKind::Shooter => "shooter",
        }
    }

    /// Lifecycle rules; the shooter has no pause
    pub fn rules(self) -> PhaseRules {
        PhaseRules {
            pausable: !matches!(self, GameKind::Shooter),
        }
    }
}

/// What a core reports back after consuming input or time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Outcome {
    #[default]
    Continue,
    /// The run is lost; the state machine moves to GameOver
    Over,
}

impl Outcome {
    pub fn is_over(self) -> bool {
        self == Outcome::Over
    }
}

/// A per-game simulation core.
///
/// Cores own their entities and score. They never see platform events or
/// draw anything; randomness is always drawn from the RNG passed in.
pub trait Simulation {
    fn kind(&self) -> GameKind;

    /// Discard every entity and start a fresh run
    fn reset(&mut self, rng: &mut Pcg32);

    /// Consume one gameplay intent (only called while playing)
    fn handle_intent(&mut self, intent: Intent, rng: &mut Pcg32) -> Outcome;

    /// Advance by `dt_ms` of wall time (only called while playing)
    fn advance(&mut self, dt_ms: f32, rng: &mut Pcg32) -> Outcome;

    /// Score of the current run
    fn score(&self) -> u64;
}

/// RNG seed wrapper for reproducible runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed)
    }
}

//! Per-instance session bookkeeping shared by every game

use serde::{Deserialize, Serialize};

use super::game::GameKind;
use super::machine::GamePhase;

/// Lifecycle phase plus the score state the host displays
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    pub kind: GameKind,
    pub phase: GamePhase,
    /// Score of the current (or last) run
    pub score: u64,
    /// Best score known locally
    pub high_score: u64,
    /// The last settled run beat the previous best
    pub new_record: bool,
    /// Game indices unlocked by the last successful score report
    pub unlocked_games: Vec<u32>,
    /// The current run's result has already been settled
    settled: bool,
}

impl GameSession {
    pub fn new(kind: GameKind, high_score: u64) -> Self {
        Self {
            kind,
            phase: GamePhase::Start,
            score: 0,
            high_score,
            new_record: false,
            unlocked_games: Vec::new(),
            settled: false,
        }
    }

    /// Clear run state for a fresh run
    pub fn begin_run(&mut self) {
        self.score = 0;
        self.new_record = false;
        self.settled = false;
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// Whether the current run beats the stored best
    pub fn beats_record(&self) -> bool {
        self.score > self.high_score
    }

    /// Close the books on the current run, at most once.
    ///
    /// Returns the new high score when the run strictly exceeded the previous
    /// one and therefore has to be persisted.
    pub fn settle(&mut self) -> Option<u64> {
        if self.settled {
            return None;
        }
        self.settled = true;
        if self.beats_record() {
            self.high_score = self.score;
            self.new_record = true;
            log::info!("{}: new high score {}", self.kind.as_str(), self.score);
            Some(self.score)
        } else {
            None
        }
    }
}

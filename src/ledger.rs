//! In-process score backend
//!
//! Accumulates the user's total across every game and unlocks games as the
//! total crosses their thresholds. Clones share the same ledger, so one
//! ledger can serve the runners of all three games.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::services::{Result, ScoreReport, ScoreReporter, ServiceError};

/// Total score needed to unlock each game, by game index
pub const UNLOCK_THRESHOLDS: [u64; 3] = [0, 1000, 3000];

/// One accepted report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub game_index: u32,
    pub delta: u64,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    pub total: u64,
    /// Unlocked game indices in unlock order
    pub unlocked: Vec<u32>,
    pub history: Vec<ScoreEntry>,
}

impl Default for LedgerState {
    fn default() -> Self {
        Self {
            total: 0,
            unlocked: vec![0],
            history: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScoreLedger {
    state: Rc<RefCell<LedgerState>>,
}

impl ScoreLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> LedgerState {
        self.state.borrow().clone()
    }

    pub fn total(&self) -> u64 {
        self.state.borrow().total
    }

    pub fn is_unlocked(&self, game_index: u32) -> bool {
        self.state.borrow().unlocked.contains(&game_index)
    }
}

impl ScoreReporter for ScoreLedger {
    fn report_score(&mut self, game_index: u32, delta: i64) -> Result<ScoreReport> {
        let delta = u64::try_from(delta)
            .ok()
            .filter(|&d| d > 0)
            .ok_or_else(|| ServiceError::Rejected(format!("invalid score delta {delta}")))?;

        let mut state = self.state.borrow_mut();
        state.total += delta;
        let total = state.total;
        for (index, &threshold) in (0u32..).zip(UNLOCK_THRESHOLDS.iter()) {
            if total >= threshold && !state.unlocked.contains(&index) {
                state.unlocked.push(index);
                log::info!("Unlocked game {} at total score {}", index, total);
            }
        }
        state.history.push(ScoreEntry {
            game_index,
            delta,
            total,
        });

        Ok(ScoreReport {
            success: true,
            new_score: total,
            unlocked_games: state.unlocked.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_unlock_in_order() {
        let mut ledger = ScoreLedger::new();
        let r = ledger.report_score(0, 400).unwrap();
        assert_eq!(r.new_score, 400);
        assert_eq!(r.unlocked_games, vec![0]);

        let r = ledger.report_score(0, 600).unwrap();
        assert_eq!(r.unlocked_games, vec![0, 1]);

        let r = ledger.report_score(1, 2500).unwrap();
        assert_eq!(r.new_score, 3500);
        assert_eq!(r.unlocked_games, vec![0, 1, 2]);
        assert!(ledger.is_unlocked(2));
    }

    #[test]
    fn test_non_positive_delta_rejected() {
        let mut ledger = ScoreLedger::new();
        assert!(matches!(
            ledger.report_score(0, 0),
            Err(ServiceError::Rejected(_))
        ));
        assert!(matches!(
            ledger.report_score(0, -5),
            Err(ServiceError::Rejected(_))
        ));
        assert_eq!(ledger.total(), 0);
        assert!(ledger.snapshot().history.is_empty());
    }

    #[test]
    fn test_clones_share_state() {
        let ledger = ScoreLedger::new();
        let mut a = ledger.clone();
        let mut b = ledger.clone();
        a.report_score(0, 700).unwrap();
        b.report_score(2, 300).unwrap();
        assert_eq!(ledger.total(), 1000);
        assert_eq!(ledger.snapshot().history.len(), 2);
    }
}

//! Game lifecycle state machine
//!
//! `Start → Playing ⇄ Paused`, `Playing → GameOver → Playing`. The reducer is
//! a pure function of phase and command; side effects are returned as data
//! for the frame loop to carry out.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use super::input::Intent;
use crate::consts::{HUD_BUTTON_SIZE, HUD_MARGIN};

/// Lifecycle phase of one game instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen, waiting for the first tap
    #[default]
    Start,
    /// Active gameplay; the only phase in which the core advances
    Playing,
    /// Frozen by an explicit toggle
    Paused,
    /// Run ended; waits for a reset tap
    GameOver,
}

/// Per-game differences in the lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseRules {
    /// Whether `Playing ⇄ Paused` exists for this game
    pub pausable: bool,
}

/// Commands the reducer understands
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// First tap on the title screen
    Launch,
    /// Pause button
    TogglePause,
    /// Tap on the game-over screen
    Restart,
    /// Back button (accepted in every phase)
    Exit,
    /// The core declared the run lost
    Finish,
    /// Gameplay input for the core
    Forward(Intent),
}

/// Side effect requested by a transition
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    None,
    /// Reset all entities and score, then play
    ResetRun,
    /// Hand the intent to the simulation core
    Forward(Intent),
    /// Record the run result (high score, report, callback)
    GameOver,
    /// Tear the instance down
    Exit,
}

/// Result of one reducer step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub phase: GamePhase,
    pub effect: Effect,
}

impl Transition {
    fn stay(phase: GamePhase) -> Self {
        Self {
            phase,
            effect: Effect::None,
        }
    }

    pub fn is_noop(&self, from: GamePhase) -> bool {
        self.phase == from && self.effect == Effect::None
    }
}

/// Pure lifecycle reducer
pub fn reduce(phase: GamePhase, command: Command, rules: PhaseRules) -> Transition {
    use GamePhase::*;
    match (phase, command) {
        (_, Command::Exit) => Transition {
            phase,
            effect: Effect::Exit,
        },
        (Start, Command::Launch) | (GameOver, Command::Restart) => Transition {
            phase: Playing,
            effect: Effect::ResetRun,
        },
        (Playing, Command::TogglePause) if rules.pausable => Transition::stay(Paused),
        (Paused, Command::TogglePause) if rules.pausable => Transition::stay(Playing),
        (Playing, Command::Finish) => Transition {
            phase: GameOver,
            effect: Effect::GameOver,
        },
        (Playing, Command::Forward(intent)) => Transition {
            phase: Playing,
            effect: Effect::Forward(intent),
        },
        _ => Transition::stay(phase),
    }
}

/// HUD button layout shared by the games
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hud {
    pub back_button: Rect,
    pub pause_button: Rect,
}

impl Hud {
    /// Default layout for a canvas of the given width
    pub fn for_width(width: f32) -> Self {
        let size = HUD_BUTTON_SIZE;
        Self {
            back_button: Rect::new(HUD_MARGIN, HUD_MARGIN, size, size),
            pause_button: Rect::new(width - HUD_MARGIN - size, HUD_MARGIN, size, size),
        }
    }

    /// Map an intent to a lifecycle command for the given phase.
    ///
    /// Taps on HUD buttons take priority; any other tap starts or restarts a
    /// run from the title and game-over screens. Everything else is gameplay.
    pub fn classify(&self, phase: GamePhase, intent: Intent, rules: PhaseRules) -> Command {
        let Intent::Tap { x, y } = intent else {
            return Command::Forward(intent);
        };
        let p = Vec2::new(x, y);
        if self.back_button.contains_point(p) {
            return Command::Exit;
        }
        let on_pause = rules.pausable && self.pause_button.contains_point(p);
        match phase {
            GamePhase::Playing | GamePhase::Paused if on_pause => Command::TogglePause,
            GamePhase::Start => Command::Launch,
            GamePhase::GameOver => Command::Restart,
            _ => Command::Forward(intent),
        }
    }
}

//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay pure:
//! - Time only arrives as a frame delta
//! - Seeded RNG only
//! - Stable iteration order for every entity collection
//! - No rendering or platform dependencies

pub mod collision;
pub mod game;
pub mod input;
pub mod machine;
pub mod merge;
pub mod session;
pub mod shooter;
pub mod snake;
pub mod tick;

pub use collision::Rect;
pub use game::{GameKind, Outcome, RngState, Simulation};
pub use input::{Direction, InputTranslator, Intent, PointerEvent};
pub use machine::{Command, Effect, GamePhase, Hud, PhaseRules, Transition, reduce};
pub use merge::{Grid, MergeGame};
pub use session::GameSession;
pub use shooter::{PowerupKind, ShooterGame};
pub use snake::{Cell, SnakeGame};
pub use tick::{TickInput, TickReport, tick};

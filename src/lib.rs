//! Arcade Suite - frame-driven simulation for snake, 2048 and a shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (state machine, input, the three cores)
//! - `platform`: Frame scheduling, listeners and teardown
//! - `runner`: Wires one game instance to its platform and collaborators
//! - `renderer`: Read-only per-frame snapshot hand-off
//! - `services`, `highscores`, `ledger`: High-score storage and score reporting
//! - `settings`: Data-driven tuning

pub mod highscores;
pub mod ledger;
pub mod platform;
pub mod renderer;
pub mod runner;
pub mod services;
pub mod settings;
pub mod sim;

pub use highscores::MemoryStore;
pub use ledger::ScoreLedger;
pub use runner::GameRunner;
pub use settings::Settings;

/// Engine constants
pub mod consts {
    /// Longest frame delta fed to the simulation (ms)
    pub const MAX_FRAME_MS: f32 = 250.0;
    /// Maximum snake steps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Max pointer travel (px) for a press/release to count as a tap
    pub const TAP_SLOP: f32 = 10.0;
    /// HUD button edge length (px)
    pub const HUD_BUTTON_SIZE: f32 = 40.0;
    /// HUD button inset from the canvas edges (px)
    pub const HUD_MARGIN: f32 = 20.0;
}

/// Route `log` output to the browser console and install the panic hook
#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

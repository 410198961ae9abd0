//! Game settings and tuning
//!
//! Every field has a default, so partial JSON documents are valid. Loaded from
//! a file on native builds and from LocalStorage on the web.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::machine::Hud;

/// Settings could not be read or parsed
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("settings IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Canvas size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Playfield {
    pub width: f32,
    pub height: f32,
}

impl Default for Playfield {
    fn default() -> Self {
        Self {
            width: 375.0,
            height: 667.0,
        }
    }
}

/// Gesture thresholds (pixels)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputTuning {
    /// Max travel for a press/release to count as a tap
    pub tap_slop: f32,
    /// Snake swipe distance along the dominant axis
    pub snake_swipe_min: f32,
    /// Tile-merge swipe distance along the dominant axis
    pub merge_swipe_min: f32,
}

impl Default for InputTuning {
    fn default() -> Self {
        Self {
            tap_slop: crate::consts::TAP_SLOP,
            snake_swipe_min: 20.0,
            merge_swipe_min: 30.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnakeTuning {
    /// Pixels per grid cell (grid = playfield / cell_size)
    pub cell_size: f32,
    /// Cells per second at the start of a run
    pub initial_speed: u32,
    pub max_speed: u32,
    /// Speed rises by one each time the score hits a multiple of this
    pub speed_step_points: u64,
    pub food_points: u64,
    pub special_points: u64,
    /// Unarmed time before each special-food roll
    pub special_interval_ms: f32,
    pub special_chance: f64,
    pub special_lifetime_ms: f32,
}

impl Default for SnakeTuning {
    fn default() -> Self {
        Self {
            cell_size: 20.0,
            initial_speed: 10,
            max_speed: 20,
            speed_step_points: 50,
            food_points: 10,
            special_points: 50,
            special_interval_ms: 15_000.0,
            special_chance: 0.3,
            special_lifetime_ms: 5_000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeTuning {
    pub grid_size: usize,
    /// Probability that a spawned tile is a 4 instead of a 2
    pub four_chance: f64,
    pub appear_ms: f32,
    pub slide_ms: f32,
}

impl Default for MergeTuning {
    fn default() -> Self {
        Self {
            grid_size: 4,
            four_chance: 0.1,
            appear_ms: 200.0,
            slide_ms: 100.0,
        }
    }
}

/// Relative weights for the power-up draw (need not sum to 1)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerupWeights {
    pub life: f64,
    pub shield: f64,
    pub rapid_fire: f64,
}

impl Default for PowerupWeights {
    fn default() -> Self {
        Self {
            life: 0.2,
            shield: 0.4,
            rapid_fire: 0.4,
        }
    }
}

/// Shooter tuning; every duration is in frames
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShooterTuning {
    pub lives: u32,
    pub max_lives: u32,
    pub level_threshold: u64,
    pub spawn_interval: u32,
    pub spawn_floor: u32,
    pub spawn_step: u32,
    pub fire_cooldown: u32,
    pub rapid_cooldown: u32,
    pub bullet_speed: f32,
    pub powerup_speed: f32,
    pub invincible_frames: u32,
    pub shield_frames: u32,
    pub rapid_frames: u32,
    pub powerup_chance: f64,
    pub powerup_weights: PowerupWeights,
    pub explosion_life: u32,
}

impl Default for ShooterTuning {
    fn default() -> Self {
        Self {
            lives: 3,
            max_lives: 5,
            level_threshold: 1000,
            spawn_interval: 60,
            spawn_floor: 10,
            spawn_step: 5,
            fire_cooldown: 15,
            rapid_cooldown: 5,
            bullet_speed: 10.0,
            powerup_speed: 2.0,
            invincible_frames: 60,
            shield_frames: 300,
            rapid_frames: 300,
            powerup_chance: 0.05,
            powerup_weights: PowerupWeights::default(),
            explosion_life: 30,
        }
    }
}

/// Complete settings document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub playfield: Playfield,
    /// HUD layout; derived from the playfield width when absent
    pub hud: Option<Hud>,
    pub input: InputTuning,
    pub snake: SnakeTuning,
    pub merge: MergeTuning,
    pub shooter: ShooterTuning,
    /// Upper bound on a single frame delta (ms)
    pub max_frame_ms: f32,
    /// Upper bound on snake steps taken in one frame
    pub max_steps_per_frame: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            playfield: Playfield::default(),
            hud: None,
            input: InputTuning::default(),
            snake: SnakeTuning::default(),
            merge: MergeTuning::default(),
            shooter: ShooterTuning::default(),
            max_frame_ms: crate::consts::MAX_FRAME_MS,
            max_steps_per_frame: crate::consts::MAX_SUBSTEPS,
        }
    }
}

impl Settings {
    /// Parse a (possibly partial) JSON settings document
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Effective HUD layout
    pub fn hud(&self) -> Hud {
        self.hud
            .unwrap_or_else(|| Hud::for_width(self.playfield.width))
    }

    /// Snake grid dimensions in cells
    pub fn snake_grid(&self) -> (i32, i32) {
        let cell = self.snake.cell_size.max(1.0);
        (
            (self.playfield.width / cell).floor() as i32,
            (self.playfield.height / cell).floor() as i32,
        )
    }

    /// Read settings from a JSON file
    #[cfg(not(target_arch = "wasm32"))]
    pub fn read(path: &std::path::Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load settings from a JSON file, falling back to defaults
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: &std::path::Path) -> Self {
        match Self::read(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(SettingsError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No settings at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                log::warn!("Ignoring settings at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// LocalStorage key
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "arcade_suite_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }
}

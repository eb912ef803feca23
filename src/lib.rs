//! Neon Snake - a neon grid-runner arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (movement, collisions, level generation)
//! - `session`: Fixed-step loop, lifecycle operations, snapshots
//! - `persistence`: Player profile store with default recovery
//! - `scores`: Run summaries and the score-service seam
//! - `tuning`: Data-driven game balance

pub mod persistence;
pub mod scores;
pub mod session;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use session::Session;
pub use settings::Settings;
pub use sim::{Snapshot, WorldState};

/// Game configuration constants
pub mod consts {
    /// Grid dimensions in cells
    pub const COLS: i32 = 28;
    pub const ROWS: i32 = 28;

    /// Snake never shrinks below this many segments
    pub const MIN_SNAKE_LEN: usize = 3;

    /// Base movement rate in steps per second; level and protocol adjust it
    pub const BASE_SPEED: f64 = 7.0;
    pub const MIN_SPEED: f64 = 4.0;
    pub const MAX_SPEED: f64 = 18.0;
    /// Speed gained per level above 1
    pub const LEVEL_SPEED_STEP: f64 = 0.6;
    /// Speed/slow power adjustments (steps per second)
    pub const SPEED_EFFECT_BOOST: f64 = 3.5;
    pub const SLOW_EFFECT_DRAG: f64 = 2.5;

    /// Combo window baseline and floor (milliseconds)
    pub const COMBO_WINDOW_MS: f64 = 2400.0;
    pub const COMBO_WINDOW_FLOOR_MS: f64 = 800.0;
    /// Milliseconds of combo window per combo-upgrade level
    pub const COMBO_UPGRADE_STEP_MS: f64 = 600.0;

    /// Time mode: starting clock and seconds granted per bonus pickup
    pub const TIME_LIMIT_SECS: f64 = 90.0;
    pub const BONUS_TIME_SECS: f64 = 6.0;

    /// Survival mode starting lives
    pub const SURVIVAL_LIVES: u32 = 3;

    /// Magnet pull radius baseline (Manhattan cells)
    pub const MAGNET_RADIUS: i32 = 6;

    /// Shield charge ceiling
    pub const SHIELD_CAP: u32 = 3;

    /// Ticks a portal stays locked out after a teleport
    pub const PORTAL_COOLDOWN_TICKS: u32 = 3;

    /// Half-width of the square safe zone reserved around the spawn cell
    pub const SAFE_ZONE_RADIUS: i32 = 2;

    /// Rejection-sampling attempts for empty-cell placement
    pub const PLACEMENT_ATTEMPTS: u32 = 120;

    /// Level progression
    pub const MAX_LEVEL: u32 = 20;
    pub const SCORE_PER_LEVEL: u32 = 220;

    /// Cap on concurrent non-food specials at the highest levels
    pub const SPECIAL_CAP: usize = 5;
}

//! Walls of Doom - survive on a screen crossed by moving platforms
//!
//! Core modules:
//! - `sim`: Deterministic simulation (occupancy grid, platforms, player physics, perks)
//! - `runner`: Fixed-timestep game loop and its collaborator seams
//! - `settings`: Tunable settings with validation
//! - `highscores`: Persisted record table

pub mod error;
pub mod highscores;
pub mod runner;
pub mod settings;
pub mod sim;

pub use error::Error;
pub use highscores::RecordTable;
pub use settings::{RepositionAlgorithm, Settings};

/// Game configuration constants
pub mod consts {
    /// Logic updates per second
    pub const UPS: u64 = 60;

    /// Player running speed (tiles per second)
    pub const PLAYER_RUNNING_SPEED: i32 = 9;
    /// Player falling speed (tiles per second)
    pub const PLAYER_FALLING_SPEED: i32 = 12;
    /// Player jumping speed (tiles per second)
    pub const PLAYER_JUMPING_SPEED: i32 = PLAYER_FALLING_SPEED;
    /// Height of a grounded jump (tiles)
    pub const PLAYER_JUMPING_HEIGHT: i32 = PLAYER_JUMPING_SPEED;
    /// Lives at the start of a game
    pub const PLAYER_INITIAL_LIVES: u32 = 3;
    /// Positions kept in the player trail
    pub const TRAIL_SIZE: usize = 4;

    /// Points granted by the Extra Points bonus
    pub const EXTRA_POINTS_AMOUNT: u64 = 1000;
    /// Score spent by the convert command on one life
    pub const BUY_LIFE_PRICE: u64 = 100;

    /// Fading warnings start at this many remaining frames (five whole seconds)
    pub const MINIMUM_REMAINING_FRAMES_FOR_MESSAGE: u64 = 6 * UPS - 1;

    /// Upper bound for the platform count setting
    pub const MAXIMUM_PLATFORM_COUNT: u32 = 256;

    /// Minimum delay between two accepted presses of a held command (ms)
    pub const REPETITION_DELAY: u64 = 300;
    /// Render rate cap for the game loop
    pub const MAXIMUM_FPS: u64 = 250;
}

/// Reduces a scalar to -1, 0 or 1 according to its sign
#[inline]
pub fn normalize(value: i32) -> i32 {
    value.signum()
}

//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only, owned by the game
//! - Stable iteration order (by platform ID)
//! - No rendering, input or timing dependencies

pub mod command;
pub mod geometry;
pub mod grid;
pub mod perk;
pub mod physics;
pub mod platform;
pub mod player;
pub mod random;
pub mod state;
pub mod tick;

pub use command::{Command, CommandTable};
pub use geometry::{BoundingBox, Point};
pub use grid::RigidMatrix;
pub use perk::{Perk, PerkCategory, PerkEffect, PerkSlot};
pub use physics::{ShoveResult, VerticalState};
pub use platform::{
    Exit, Platform, PlatformId, generate_platforms, get_absolute_pending_movement,
    get_pending_movement, select_random_line_awarely, select_random_line_blindly,
};
pub use player::Player;
pub use random::{Xorshift128, coin_flip, random_integer};
pub use state::{Game, Message};
pub use tick::update_game;

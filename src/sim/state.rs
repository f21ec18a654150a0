//! Game state and core simulation types
//!
//! `Game` is the single aggregate the orchestrator hands to every subsystem.
//! It is also the snapshot the renderer draws.

use serde::{Deserialize, Serialize};

use super::geometry::BoundingBox;
use super::grid::RigidMatrix;
use super::perk::PerkSlot;
use super::platform::{Platform, PlatformId, generate_platforms};
use super::player::Player;
use super::random::Xorshift128;
use crate::consts::UPS;
use crate::settings::Settings;

/// Transient status text shown by the renderer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    /// Frame after which the message is discarded
    pub end_frame: u64,
    pub priority: u32,
}

impl Message {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub player: Player,
    /// Indexed by `PlatformId`; platforms are never removed during a game
    pub platforms: Vec<Platform>,
    /// Playable area
    pub bbox: BoundingBox,
    pub rigid_matrix: RigidMatrix,
    pub settings: Settings,
    pub tile_w: i32,
    pub tile_h: i32,
    /// Simulated logic ticks
    pub current_frame: u64,
    /// Logic ticks the wall clock asks for
    pub desired_frame: u64,
    /// Ticks during which the player was active
    pub played_frames: u64,
    /// Played ticks after which the game ends
    pub limit_played_frames: Option<u64>,
    /// Perk on the field, and when the current field cycle ends
    pub perk: PerkSlot,
    pub message: Message,
    pub paused: bool,
    pub debugging: bool,
    pub rng: Xorshift128,
}

impl Game {
    /// Create a new game with the given seed
    pub fn new(name: impl Into<String>, settings: &Settings, seed: u64) -> Self {
        Self::with_rng(name, settings, Xorshift128::new(seed))
    }

    /// Create a new game drawing every random decision from `rng`
    ///
    /// Settings are assumed to be validated.
    pub fn with_rng(name: impl Into<String>, settings: &Settings, mut rng: Xorshift128) -> Self {
        let tile_w = settings.tile_w as i32;
        let tile_h = settings.tile_h as i32;
        let bbox = settings.play_box();

        let mut player = Player::new(name, tile_w, tile_h);
        let center = bbox.center();
        player.x = center.x;
        player.y = center.y;

        let platforms = generate_platforms(
            settings,
            bbox,
            player.bbox(),
            settings.platform_count as usize,
            tile_w,
            tile_h,
            &mut rng,
        );
        let rigid_matrix = RigidMatrix::from_platforms(bbox, &platforms);

        let limit_played_frames = match settings.played_time_limit {
            0 => None,
            seconds => Some(u64::from(seconds) * UPS),
        };

        let game = Self {
            player,
            platforms,
            bbox,
            rigid_matrix,
            settings: settings.clone(),
            tile_w,
            tile_h,
            current_frame: 0,
            desired_frame: 0,
            played_frames: 0,
            limit_played_frames,
            // No perk on screen at the start
            perk: PerkSlot::new(u64::from(settings.perk_screen_duration) * UPS),
            message: Message::default(),
            paused: false,
            debugging: false,
            rng,
        };
        log::info!(
            "Created a game with {} platforms on a {}x{} box",
            game.platforms.len(),
            bbox.width(),
            bbox.height()
        );
        game
    }

    /// Add a platform, registering it on the rigid matrix
    pub fn insert_platform(&mut self, platform: Platform) -> PlatformId {
        self.rigid_matrix.add_platform(&platform);
        self.platforms.push(platform);
        self.platforms.len() - 1
    }

    /// Change the status message unless a live message has higher priority
    pub fn set_message(&mut self, text: impl Into<String>, duration_secs: u64, priority: u32) {
        let last_has_expired = self.message.end_frame <= self.current_frame;
        let last_has_lower_priority = self.message.priority <= priority;
        if last_has_expired || last_has_lower_priority {
            self.message = Message {
                text: text.into(),
                end_frame: self.current_frame + duration_secs * UPS,
                priority,
            };
        }
    }

    /// Whether the session should stop advancing
    pub fn is_over(&self) -> bool {
        self.player.lives == 0
            || self
                .limit_played_frames
                .is_some_and(|limit| self.played_frames >= limit)
    }

    /// Rough difficulty relative to the configured averages (1.0 = average)
    ///
    /// Narrower and faster platforms than expected push it above 1.
    pub fn difficulty(&self) -> Option<f64> {
        if self.platforms.is_empty() {
            return None;
        }
        let count = self.platforms.len() as f64;
        let settings = &self.settings;
        let expected_width =
            f64::from(settings.platform_min_width + settings.platform_max_width) / 2.0
                * f64::from(self.tile_w);
        let expected_speed =
            f64::from(settings.platform_min_speed + settings.platform_max_speed) / 2.0
                * f64::from(self.tile_w);
        let average_width = self.platforms.iter().map(|p| f64::from(p.w)).sum::<f64>() / count;
        let average_speed = self
            .platforms
            .iter()
            .map(|p| f64::from(p.speed.abs()))
            .sum::<f64>()
            / count;
        if average_width == 0.0 || expected_speed == 0.0 {
            return None;
        }
        Some(expected_width / average_width * (average_speed / expected_speed))
    }
}

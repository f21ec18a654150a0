//! Perks: timed field pickups
//!
//! A field slot cycles `Absent -> OnField -> Absent` on a fixed cadence of
//! played frames. Picking a perk up either applies a one-shot effect (bonus,
//! curse) or makes the player wear it for a while (power).

use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::geometry::BoundingBox;
use super::platform::Platform;
use super::player::Player;
use super::random::random_integer;
use super::state::Game;
use crate::consts::{EXTRA_POINTS_AMOUNT, MINIMUM_REMAINING_FRAMES_FOR_MESSAGE, UPS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Perk {
    Invincibility,
    Levitation,
    /// Halves the falling speed
    LowGravity,
    /// Doubles jump heights
    SuperJump,
    /// Freezes every platform
    TimeStop,
    AcceleratePlatforms,
    ReversePlatforms,
    ExtraPoints,
    ExtraLife,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerkCategory {
    /// Worn by the player for a while
    Power,
    /// Applied once to every platform
    Curse,
    /// Applied once to the player
    Bonus,
}

/// What picking a perk up does
#[derive(Debug, Clone, Copy)]
pub enum PerkEffect {
    Power,
    Curse(fn(&mut Platform)),
    Bonus(fn(&mut Player)),
}

fn accelerate_platform(platform: &mut Platform) {
    platform.speed = platform.speed.saturating_add(platform.speed / 2);
}

fn reverse_platform(platform: &mut Platform) {
    platform.speed = platform.speed.saturating_neg();
}

fn grant_extra_points(player: &mut Player) {
    player.increment_score(EXTRA_POINTS_AMOUNT);
}

fn grant_extra_life(player: &mut Player) {
    player.lives = player.lives.saturating_add(1);
}

impl Perk {
    pub const COUNT: usize = 9;

    pub const ALL: [Perk; Self::COUNT] = [
        Perk::Invincibility,
        Perk::Levitation,
        Perk::LowGravity,
        Perk::SuperJump,
        Perk::TimeStop,
        Perk::AcceleratePlatforms,
        Perk::ReversePlatforms,
        Perk::ExtraPoints,
        Perk::ExtraLife,
    ];

    /// Uniformly random perk
    pub fn random<R: RngCore + ?Sized>(rng: &mut R) -> Perk {
        Self::ALL[random_integer(rng, 0, Self::COUNT as i32 - 1) as usize]
    }

    pub fn name(self) -> &'static str {
        match self {
            Perk::Invincibility => "Invincibility",
            Perk::Levitation => "Levitation",
            Perk::LowGravity => "Low Gravity",
            Perk::SuperJump => "Super Jump",
            Perk::TimeStop => "Time Stop",
            Perk::AcceleratePlatforms => "Accelerate Platforms",
            Perk::ReversePlatforms => "Reverse Platforms",
            Perk::ExtraPoints => "Extra Points",
            Perk::ExtraLife => "Extra Life",
        }
    }

    pub fn effect(self) -> PerkEffect {
        match self {
            Perk::Invincibility
            | Perk::Levitation
            | Perk::LowGravity
            | Perk::SuperJump
            | Perk::TimeStop => PerkEffect::Power,
            Perk::AcceleratePlatforms => PerkEffect::Curse(accelerate_platform),
            Perk::ReversePlatforms => PerkEffect::Curse(reverse_platform),
            Perk::ExtraPoints => PerkEffect::Bonus(grant_extra_points),
            Perk::ExtraLife => PerkEffect::Bonus(grant_extra_life),
        }
    }

    pub fn category(self) -> PerkCategory {
        match self.effect() {
            PerkEffect::Power => PerkCategory::Power,
            PerkEffect::Curse(_) => PerkCategory::Curse,
            PerkEffect::Bonus(_) => PerkCategory::Bonus,
        }
    }
}

/// The field perk slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerkSlot {
    pub kind: Option<Perk>,
    pub x: i32,
    pub y: i32,
    /// Played frame at which the current field cycle ends
    ///
    /// Kept after a pickup: the next spawn is scheduled from it.
    pub end_frame: u64,
}

impl PerkSlot {
    pub fn new(end_frame: u64) -> Self {
        Self {
            kind: None,
            x: 0,
            y: 0,
            end_frame,
        }
    }

    pub fn is_on_field(&self) -> bool {
        self.kind.is_some()
    }
}

/// Text for a worn perk that is about to fade
fn fading_message(perk: Perk, remaining_frames: u64) -> String {
    let seconds = remaining_frames / UPS;
    match seconds {
        0 => format!("{} will fade at any moment.", perk.name()),
        1 => format!("{} will fade in 1 second.", perk.name()),
        n => format!("{} will fade in {n} seconds.", perk.name()),
    }
}

impl Game {
    /// Field perk cadence: expire the current one or spawn the next
    pub fn update_perk(&mut self) {
        let interval = u64::from(self.settings.perk_interval) * UPS;
        let screen_duration = u64::from(self.settings.perk_screen_duration) * UPS;
        let next_perk_frame = self.perk.end_frame + interval - screen_duration;
        if self.played_frames == self.perk.end_frame {
            if let Some(kind) = self.perk.kind.take() {
                log::debug!("{} left the field untouched", kind.name());
            }
        } else if self.played_frames == next_perk_frame {
            self.spawn_perk(screen_duration);
        }
    }

    fn spawn_perk(&mut self, screen_duration: u64) {
        let kind = Perk::random(&mut self.rng);
        let columns = self.bbox.width() / self.tile_w;
        let lines = self.bbox.height() / self.tile_h;
        self.perk.x = self.bbox.min_x + random_integer(&mut self.rng, 0, columns - 1) * self.tile_w;
        self.perk.y = self.bbox.min_y + random_integer(&mut self.rng, 0, lines - 1) * self.tile_h;
        self.perk.kind = Some(kind);
        self.perk.end_frame = self.played_frames + screen_duration;
        log::debug!(
            "Spawned {} at ({}, {})",
            kind.name(),
            self.perk.x,
            self.perk.y
        );
    }

    pub fn perk_bbox(&self) -> BoundingBox {
        BoundingBox::from_size(self.perk.x, self.perk.y, self.tile_w, self.tile_h)
    }

    pub fn is_touching_perk(&self) -> bool {
        self.perk.is_on_field() && self.player.bbox().overlaps(&self.perk_bbox())
    }

    /// Expire the worn perk and pick up the field perk
    ///
    /// Only runs on ticks during which the player is active.
    pub(crate) fn update_player_perk(&mut self) {
        if let Some(perk) = self.player.perk {
            let remaining = self.player.perk_end_frame.saturating_sub(self.played_frames);
            if remaining == 0 {
                self.set_message(format!("{} has faded.", perk.name()), 1, 0);
                self.player.perk = None;
            } else if remaining <= MINIMUM_REMAINING_FRAMES_FOR_MESSAGE {
                self.set_message(fading_message(perk, remaining), 1, 0);
            }
        }
        if self.is_touching_perk()
            && let Some(kind) = self.perk.kind.take()
        {
            self.apply_perk(kind);
            self.set_message(format!("Got {}!", kind.name()), 1, 0);
        }
    }

    /// Apply a picked up perk
    ///
    /// One-shot perks leave a worn power perk untouched.
    pub fn apply_perk(&mut self, perk: Perk) {
        log::info!("{} got {}", self.player.name, perk.name());
        match perk.effect() {
            PerkEffect::Power => {
                self.player.perk = Some(perk);
                self.player.perk_end_frame =
                    self.played_frames + u64::from(self.settings.perk_player_duration) * UPS;
            }
            PerkEffect::Curse(curse) => self.platforms.iter_mut().for_each(curse),
            PerkEffect::Bonus(bonus) => bonus(&mut self.player),
        }
    }
}

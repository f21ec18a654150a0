//! Player physics
//!
//! Movement is resolved one unit at a time against the rigid matrix. Within a
//! tick the player runs before it jumps or falls.

use serde::{Deserialize, Serialize};

use super::command::{Command, CommandTable};
use super::perk::Perk;
use super::platform::{get_pending_movement, is_over_platform};
use super::state::Game;
use crate::consts::{
    BUY_LIFE_PRICE, PLAYER_FALLING_SPEED, PLAYER_JUMPING_HEIGHT, PLAYER_JUMPING_SPEED,
    PLAYER_RUNNING_SPEED, UPS,
};
use crate::normalize;

/// Outcome of a platform trying to push the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShoveResult {
    Success,
    Failure,
}

/// Vertical state of the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerticalState {
    Grounded,
    Jumping { remaining: i32 },
    Falling,
}

impl Game {
    /// Whether the player box may occupy (x, y)
    ///
    /// An invincible player cannot step into the ring just outside the box.
    pub fn is_valid_move(&self, x: i32, y: i32) -> bool {
        let player = &self.player;
        if player.has_perk(Perk::Invincibility) {
            let bbox = &self.bbox;
            if x == bbox.min_x - 1
                || x + player.w - 1 == bbox.max_x + 1
                || y == bbox.min_y - 1
                || y + player.h - 1 == bbox.max_y + 1
            {
                return false;
            }
        }
        !self.rigid_matrix.violates(x, y, player.w, player.h)
    }

    /// Move the player at most one unit per axis; returns whether it moved
    pub fn move_player(&mut self, dx: i32, dy: i32) -> bool {
        let dx = normalize(dx);
        let dy = normalize(dy);
        if dx == 0 && dy == 0 {
            return false;
        }
        if !self.is_valid_move(self.player.x + dx, self.player.y + dy) {
            return false;
        }
        self.player.x += dx;
        self.player.y += dy;
        true
    }

    /// Push the player one unit on behalf of a moving platform
    ///
    /// `standing` tells whether the player rides the pushing platform. An inert
    /// player does not collide with platforms and is left in place.
    pub fn shove_player(&mut self, dx: i32, dy: i32, standing: bool) -> ShoveResult {
        if !self.player.physics {
            return ShoveResult::Success;
        }
        let dx = if standing && self.player.has_perk(Perk::Levitation) {
            0
        } else {
            dx
        };
        if (dx == 0 && dy == 0) || self.move_player(dx, dy) {
            ShoveResult::Success
        } else {
            ShoveResult::Failure
        }
    }

    /// Whether the player has something solid right below
    ///
    /// An invincible player treats the bottom of the box as a platform.
    pub fn is_standing_on_platform(&self) -> bool {
        let p = &self.player;
        if p.y + p.h - 1 == self.bbox.max_y {
            return p.has_perk(Perk::Invincibility);
        }
        self.rigid_matrix.has_rigid_support(p.x, p.y, p.w, p.h)
    }

    pub fn is_falling(&self) -> bool {
        self.player.physics
            && !self.player.has_perk(Perk::Levitation)
            && !self.is_standing_on_platform()
    }

    pub fn vertical_state(&self) -> VerticalState {
        if self.player.is_jumping() {
            VerticalState::Jumping {
                remaining: self.player.remaining_jump_height,
            }
        } else if self.is_falling() {
            VerticalState::Falling
        } else {
            VerticalState::Grounded
        }
    }

    /// Whether the row right above the player is clear
    ///
    /// The top of the box does not block: leaving it kills the player.
    pub fn can_move_up(&self) -> bool {
        let p = &self.player;
        if p.y == self.bbox.min_y {
            return true;
        }
        self.rigid_matrix.is_free(p.x, p.y - 1, p.w, 1)
    }

    pub fn is_touching_a_wall(&self) -> bool {
        !self.bbox.encloses(&self.player.bbox())
    }

    /// Start a jump, or a half-height double jump while airborne
    pub fn process_jump(&mut self) {
        let height = self.tile_h * PLAYER_JUMPING_HEIGHT;
        let multiplier = if self.player.has_perk(Perk::SuperJump) {
            2
        } else {
            1
        };
        if self.is_standing_on_platform() {
            self.player.remaining_jump_height = height * multiplier;
        } else if self.player.can_double_jump {
            self.player.can_double_jump = false;
            self.player.remaining_jump_height += height / 2 * multiplier;
        }
    }

    /// Convert score into one extra life
    pub fn buy_life(&mut self) {
        if self.player.score < BUY_LIFE_PRICE {
            return;
        }
        self.player.decrement_score(BUY_LIFE_PRICE);
        self.player.lives = self.player.lives.saturating_add(1);
        self.set_message(
            format!("Bought an extra life for {BUY_LIFE_PRICE} points."),
            1,
            1,
        );
        log::info!("{} bought a life", self.player.name);
    }

    /// Translate the command table into player intent
    ///
    /// Running or jumping wakes an inert player up. Jump and convert are
    /// cleared once handled.
    pub fn process_command(&mut self, commands: &mut CommandTable) {
        let running = f64::from(PLAYER_RUNNING_SPEED * self.tile_w);
        let left = commands.get(Command::Left);
        let right = commands.get(Command::Right);
        if left != 0.0 {
            self.player.speed_x = -(left * running) as i32;
            self.player.physics = true;
        } else if right != 0.0 {
            self.player.speed_x = (right * running) as i32;
            self.player.physics = true;
        } else {
            self.player.speed_x = 0;
        }
        if commands.is_active(Command::Jump) {
            commands.consume(Command::Jump);
            self.process_jump();
            self.player.physics = true;
        } else if commands.is_active(Command::Convert) {
            commands.consume(Command::Convert);
            self.buy_life();
        }
    }

    pub fn update_player_horizontal_position(&mut self) {
        let pending = get_pending_movement(self.current_frame, self.player.speed_x);
        let direction = normalize(pending);
        for _ in 0..pending.abs() {
            self.move_player(direction, 0);
        }
    }

    pub fn update_player_vertical_position(&mut self) {
        match self.vertical_state() {
            VerticalState::Jumping { .. } => {
                let speed = PLAYER_JUMPING_SPEED * self.tile_h;
                self.player.speed_y = -speed;
                let mut pending = get_pending_movement(self.current_frame, speed);
                while pending > 0 && self.player.remaining_jump_height > 0 {
                    if !self.can_move_up() || !self.move_player(0, -1) {
                        // Ceiling
                        self.player.remaining_jump_height = 0;
                        break;
                    }
                    self.player.remaining_jump_height -= 1;
                    pending -= 1;
                }
            }
            VerticalState::Falling => {
                let mut speed = PLAYER_FALLING_SPEED * self.tile_h;
                if self.player.has_perk(Perk::LowGravity) {
                    speed /= 2;
                }
                self.player.speed_y = speed;
                let pending = get_pending_movement(self.current_frame, speed);
                for _ in 0..pending {
                    if !self.move_player(0, 1) {
                        break;
                    }
                }
            }
            VerticalState::Grounded => self.player.speed_y = 0,
        }
    }

    pub fn update_double_jump(&mut self) {
        if self.is_standing_on_platform() {
            self.player.can_double_jump = true;
        }
    }

    /// Put the player back at the center of the box
    pub fn reposition_player(&mut self) {
        let center = self.bbox.center();
        self.player.x = center.x;
        self.player.y = center.y;
    }

    /// Cost a life if the player left the box
    pub fn check_for_player_death(&mut self) {
        if self.player.has_perk(Perk::Invincibility) || !self.is_touching_a_wall() {
            return;
        }
        self.player.lives = self.player.lives.saturating_sub(1);
        log::info!(
            "{} hit a wall at ({}, {}), {} lives left",
            self.player.name,
            self.player.x,
            self.player.y,
            self.player.lives
        );
        self.reposition_player();
        self.player.reset_motion();
    }

    /// Score for every platform the player is standing on
    fn accrue_platform_score(&mut self) {
        if !self.player.physics || !self.is_standing_on_platform() {
            return;
        }
        let Game {
            player, platforms, ..
        } = self;
        for platform in platforms.iter() {
            if is_over_platform(player, platform) {
                player.increment_score_from_event(platform.rarity);
            }
        }
    }

    /// Advance the player by one tick
    pub fn update_player(&mut self, commands: &mut CommandTable) {
        if self.player.physics && self.settings.logging_player_score {
            log::info!(
                "played_frames={} score={}",
                self.played_frames,
                self.player.score
            );
        }
        self.player.record_trail();
        if self.player.physics {
            self.played_frames += 1;
            if self.played_frames % UPS == 0 {
                self.player.increment_score(1);
            }
            self.update_player_perk();
        }
        self.process_command(commands);
        self.update_player_horizontal_position();
        self.update_player_vertical_position();
        self.update_double_jump();
        self.check_for_player_death();
        self.accrue_platform_score();
    }
}

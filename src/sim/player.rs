//! The player avatar and its score bookkeeping

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::geometry::{BoundingBox, Point};
use super::perk::Perk;
use crate::consts::{PLAYER_INITIAL_LIVES, TRAIL_SIZE, UPS};

/// Base score per second of standing on a platform, scaled by its rarity
const PLATFORM_SCORE_PER_SECOND: u64 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    /// Horizontal speed (world units per second)
    pub speed_x: i32,
    /// Vertical speed (world units per second), informational
    pub speed_y: i32,
    /// Inert until the first movement or jump command
    pub physics: bool,
    pub can_double_jump: bool,
    /// Units still to climb in the current jump
    pub remaining_jump_height: i32,
    pub lives: u32,
    pub score: u64,
    /// Worn power perk
    pub perk: Option<Perk>,
    pub perk_end_frame: u64,
    /// Most recent positions, newest last
    pub trail: VecDeque<Point>,
}

impl Player {
    pub fn new(name: impl Into<String>, w: i32, h: i32) -> Self {
        Self {
            name: name.into(),
            x: 0,
            y: 0,
            w,
            h,
            speed_x: 0,
            speed_y: 0,
            physics: false,
            can_double_jump: false,
            remaining_jump_height: 0,
            lives: PLAYER_INITIAL_LIVES,
            score: 0,
            perk: None,
            perk_end_frame: 0,
            trail: VecDeque::with_capacity(TRAIL_SIZE),
        }
    }

    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::from_size(self.x, self.y, self.w, self.h)
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    #[inline]
    pub fn has_perk(&self, perk: Perk) -> bool {
        self.perk == Some(perk)
    }

    pub fn is_jumping(&self) -> bool {
        self.remaining_jump_height > 0
    }

    /// Add to the score, saturating at the maximum
    pub fn increment_score(&mut self, amount: u64) {
        match self.score.checked_add(amount) {
            Some(score) => self.score = score,
            None => {
                log::warn!("Score of {} saturated", self.name);
                self.score = u64::MAX;
            }
        }
    }

    /// Subtract from the score, saturating at zero
    pub fn decrement_score(&mut self, amount: u64) {
        match self.score.checked_sub(amount) {
            Some(score) => self.score = score,
            None => {
                log::warn!("Score of {} went below zero, clamping", self.name);
                self.score = 0;
            }
        }
    }

    /// Score for one tick of standing on a platform of the given rarity
    pub fn increment_score_from_event(&mut self, rarity: f32) {
        let points = PLATFORM_SCORE_PER_SECOND as f64 / UPS as f64 * (1.0 + f64::from(rarity));
        self.increment_score(points as u64);
    }

    /// Remember the current position, dropping the oldest beyond the trail size
    pub fn record_trail(&mut self) {
        if self.trail.len() == TRAIL_SIZE {
            self.trail.pop_front();
        }
        self.trail.push_back(self.position());
    }

    /// Back to the inert state after losing a life
    pub fn reset_motion(&mut self) {
        self.physics = false;
        self.speed_x = 0;
        self.speed_y = 0;
        self.can_double_jump = false;
        self.remaining_jump_height = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_player_is_inert() {
        let player = Player::new("Tester", 2, 3);
        assert!(!player.physics);
        assert_eq!(player.lives, PLAYER_INITIAL_LIVES);
        assert_eq!(player.bbox(), BoundingBox::new(0, 0, 1, 2));
    }

    #[test]
    fn test_score_saturates() {
        let mut player = Player::new("Tester", 1, 1);
        player.score = u64::MAX - 1;
        player.increment_score(10);
        assert_eq!(player.score, u64::MAX);

        player.score = 5;
        player.decrement_score(10);
        assert_eq!(player.score, 0);
    }

    #[test]
    fn test_score_from_event_uses_rarity() {
        let mut player = Player::new("Tester", 1, 1);
        // 100 / 60 truncates to 1
        player.increment_score_from_event(0.0);
        assert_eq!(player.score, 1);
        // 100 / 60 * 2 = 3.33
        player.increment_score_from_event(1.0);
        assert_eq!(player.score, 4);
    }

    #[test]
    fn test_trail_keeps_latest_positions() {
        let mut player = Player::new("Tester", 1, 1);
        for x in 0..6 {
            player.x = x;
            player.record_trail();
        }
        assert_eq!(player.trail.len(), TRAIL_SIZE);
        assert_eq!(player.trail.front(), Some(&Point::new(2, 0)));
        assert_eq!(player.trail.back(), Some(&Point::new(5, 0)));
    }
}

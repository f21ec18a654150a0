//! Platforms: generation, horizontal motion and off-screen repositioning
//!
//! Platforms only ever move horizontally. Every displacement goes through the
//! rigid matrix so its counters stay in sync with the platform list.

use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::geometry::BoundingBox;
use super::grid::RigidMatrix;
use super::perk::Perk;
use super::physics::ShoveResult;
use super::player::Player;
use super::random::{coin_flip, random_integer};
use super::state::Game;
use crate::consts::UPS;
use crate::normalize;
use crate::settings::{RepositionAlgorithm, Settings};

/// Index of a platform in `Game::platforms`
pub type PlatformId = usize;

/// Rarity levels are multiples of this step in `[0, 1]`
const RARITY_LEVELS: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    /// Signed horizontal speed (world units per second)
    pub speed: i32,
    /// Score multiplier bonus in `[0, 1]`
    pub rarity: f32,
}

/// Which side of the box a platform left through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Left,
    Right,
}

impl Platform {
    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::from_size(self.x, self.y, self.w, self.h)
    }

    /// Side through which the platform has completely left `bbox`, if any
    pub fn exit(&self, bbox: &BoundingBox) -> Option<Exit> {
        if self.x > bbox.max_x {
            Some(Exit::Right)
        } else if self.x + self.w < bbox.min_x {
            Some(Exit::Left)
        } else {
            None
        }
    }
}

/// Whether the player stands right on top of the platform
pub fn is_over_platform(player: &Player, platform: &Platform) -> bool {
    player.y + player.h == platform.y
        && player.x < platform.x + platform.w
        && player.x + player.w > platform.x
}

/// Whether the player is adjacent to the platform's leading edge
pub fn is_in_front_of_platform(player: &Player, platform: &Platform) -> bool {
    let touching = if platform.speed < 0 {
        player.x + player.w == platform.x
    } else {
        platform.x + platform.w == player.x
    };
    touching && player.y < platform.y + platform.h && player.y + player.h > platform.y
}

/// Unsigned number of unit steps due this frame at `speed` units per second
///
/// Uses the difference of two floors so fractional speeds spread evenly over
/// each second without drift.
pub fn get_absolute_pending_movement(frame: u64, speed: i32) -> i32 {
    let speed = speed.unsigned_abs();
    if speed == 0 {
        return 0;
    }
    let slice = f64::from(speed) / UPS as f64;
    // Keep frame - 1 non-negative
    let frame = (frame % UPS + UPS) as f64;
    ((frame * slice).floor() - ((frame - 1.0) * slice).floor()) as i32
}

/// Signed number of unit steps due this frame at `speed` units per second
pub fn get_pending_movement(frame: u64, speed: i32) -> i32 {
    normalize(speed) * get_absolute_pending_movement(frame, speed)
}

/// Pick an empty line, or any line if none is empty
///
/// # Panics
///
/// Panics on an empty slice.
pub fn select_random_line_blindly<R: RngCore + ?Sized>(lines: &[u8], rng: &mut R) -> usize {
    assert!(!lines.is_empty(), "cannot select a line from an empty slice");
    let empty = lines.iter().filter(|&&line| line == 0).count();
    if empty == 0 {
        return random_integer(rng, 0, lines.len() as i32 - 1) as usize;
    }
    let skip = random_integer(rng, 0, empty as i32 - 1) as usize;
    lines
        .iter()
        .enumerate()
        .filter(|&(_, &line)| line == 0)
        .nth(skip)
        .map(|(index, _)| index)
        .unwrap_or_else(|| unreachable!("skip is below the empty line count"))
}

/// Pick one of the lines furthest away from every occupied line
///
/// The borders count as occupied lines one step beyond the slice.
///
/// # Panics
///
/// Panics on an empty slice.
pub fn select_random_line_awarely<R: RngCore + ?Sized>(lines: &[u8], rng: &mut R) -> usize {
    assert!(!lines.is_empty(), "cannot select a line from an empty slice");
    let size = lines.len();
    let mut distances = vec![0i32; size];
    for i in 0..size {
        if lines[i] == 0 {
            distances[i] = if i > 0 { distances[i - 1] + 1 } else { 1 };
        }
    }
    for i in (0..size).rev() {
        if lines[i] == 0 {
            distances[i] = if i + 1 < size {
                distances[i].min(distances[i + 1] + 1)
            } else {
                1
            };
        }
    }
    let maximum = distances.iter().copied().max().unwrap_or(0);
    let count = distances.iter().filter(|&&d| d == maximum).count();
    let skip = random_integer(rng, 0, count as i32 - 1) as usize;
    distances
        .iter()
        .enumerate()
        .filter(|&(_, &d)| d == maximum)
        .nth(skip)
        .map(|(index, _)| index)
        .unwrap_or_else(|| unreachable!("skip is below the maximum distance count"))
}

/// Generate the initial platform layout
///
/// Rows overlapping `avoidance` start out as occupied, so the player does not
/// spawn inside a platform row. Once every row is taken, platforms share rows
/// without overlapping each other or `avoidance`, and a platform that fits
/// nowhere is dropped.
pub fn generate_platforms<R: RngCore + ?Sized>(
    settings: &Settings,
    bbox: BoundingBox,
    avoidance: BoundingBox,
    count: usize,
    tile_w: i32,
    tile_h: i32,
    rng: &mut R,
) -> Vec<Platform> {
    let min_width = settings.platform_min_width as i32 * tile_w;
    let max_width = settings.platform_max_width as i32 * tile_w;
    let min_speed = settings.platform_min_speed as i32 * tile_w;
    let max_speed = settings.platform_max_speed as i32 * tile_w;

    let lines = (bbox.height() / tile_h) as usize;
    let mut density = vec![0u8; lines];
    for y in avoidance.min_y..=avoidance.max_y {
        let line = (y - bbox.min_y) / tile_h;
        if y >= bbox.min_y && (line as usize) < lines {
            density[line as usize] = 1;
        }
    }

    let mut matrix = RigidMatrix::new(bbox);
    let mut platforms = Vec::with_capacity(count);
    for _ in 0..count {
        let w = random_integer(rng, min_width, max_width);
        let line = select_random_line_awarely(&density, rng);
        let (line, x) = if density[line] == 0 {
            (line, bbox.min_x + random_integer(rng, 0, bbox.width() - 1))
        } else {
            match find_free_span(&matrix, bbox, avoidance, line, w, tile_h, rng) {
                Some(found) => found,
                None => {
                    log::warn!("No room left for a platform of width {w}, generating fewer platforms");
                    continue;
                }
            }
        };
        density[line] = density[line].saturating_add(1);
        let y = bbox.min_y + line as i32 * tile_h;
        let speed = random_integer(rng, min_speed, max_speed);
        let speed = if coin_flip(rng) { speed } else { -speed };
        let rarity = random_integer(rng, 0, RARITY_LEVELS) as f32 / RARITY_LEVELS as f32;
        let platform = Platform {
            x,
            y,
            w,
            h: tile_h,
            speed,
            rarity,
        };
        matrix.add_platform(&platform);
        platforms.push(platform);
    }
    platforms
}

/// Random free position on a shared line, scanning down from `first`
///
/// A span qualifies when none of its cells is solid and it stays clear of
/// `avoidance`. Returns the line and the left edge.
fn find_free_span<R: RngCore + ?Sized>(
    matrix: &RigidMatrix,
    bbox: BoundingBox,
    avoidance: BoundingBox,
    first: usize,
    w: i32,
    h: i32,
    rng: &mut R,
) -> Option<(usize, i32)> {
    let lines = (bbox.height() / h) as usize;
    (0..lines).map(|offset| (first + offset) % lines).find_map(|line| {
        let y = bbox.min_y + line as i32 * h;
        let free: Vec<i32> = (bbox.min_x..=bbox.max_x)
            .filter(|&x| {
                matrix.is_free(x, y, w, h) && !BoundingBox::from_size(x, y, w, h).overlaps(&avoidance)
            })
            .collect();
        if free.is_empty() {
            return None;
        }
        let pick = random_integer(rng, 0, free.len() as i32 - 1) as usize;
        Some((line, free[pick]))
    })
}

impl Game {
    /// Advance every platform by one tick (frozen under Time Stop)
    pub fn update_platforms(&mut self) {
        if self.player.has_perk(Perk::TimeStop) {
            return;
        }
        for id in 0..self.platforms.len() {
            self.move_platform_horizontally(id);
            self.reposition(id);
        }
    }

    /// Whether the platform may move by (dx, dy) without overlapping another
    pub fn can_move_platform(&self, id: PlatformId, dx: i32, dy: i32) -> bool {
        let p = &self.platforms[id];
        if self.settings.player_stops_platforms && is_over_platform(&self.player, p) {
            return false;
        }
        let grid = &self.rigid_matrix;
        match (dx, dy) {
            (0, 0) => true,
            (0, dy) if dy < 0 => grid.is_free(p.x, p.y + dy, p.w, -dy),
            (0, dy) => grid.is_free(p.x, p.y + p.h, p.w, dy),
            (dx, 0) if dx < 0 => grid.is_free(p.x + dx, p.y, -dx, p.h),
            (dx, 0) => grid.is_free(p.x + p.w, p.y, dx, p.h),
            (dx, dy) => {
                // Cells the platform already covers do not count against it
                let own = p.bbox();
                (p.x + dx..p.x + dx + p.w).all(|x| {
                    (p.y + dy..p.y + dy + p.h).all(|y| {
                        let own_count = u16::from(own.contains(x, y));
                        grid.count(x, y) <= own_count
                    })
                })
            }
        }
    }

    /// Move a platform this tick's due unit steps along its speed
    ///
    /// The player is pushed when in front of the platform and carried when
    /// standing on it. A step stops as soon as the player cannot follow.
    pub fn move_platform_horizontally(&mut self, id: PlatformId) {
        let direction = normalize(self.platforms[id].speed);
        if direction == 0 {
            return;
        }
        let mut pending = get_absolute_pending_movement(self.current_frame, self.platforms[id].speed);
        while pending > 0 {
            pending -= 1;
            if !self.can_move_platform(id, direction, 0) {
                break;
            }
            let platform = self.platforms[id];
            if is_in_front_of_platform(&self.player, &platform)
                && self.shove_player(direction, 0, false) == ShoveResult::Failure
            {
                break;
            }
            if is_over_platform(&self.player, &platform)
                && self.shove_player(direction, 0, true) == ShoveResult::Failure
            {
                break;
            }
            let Game {
                platforms,
                rigid_matrix,
                ..
            } = self;
            rigid_matrix.slide_platform_x(&mut platforms[id], direction);
        }
    }

    /// Occupancy per line of the box, ignoring one platform
    pub fn occupied_lines(&self, ignored: Option<PlatformId>) -> Vec<u8> {
        let lines = (self.bbox.height() / self.tile_h) as usize;
        let mut occupied = vec![0u8; lines];
        for (id, platform) in self.platforms.iter().enumerate() {
            if Some(id) == ignored || platform.y < self.bbox.min_y {
                continue;
            }
            let line = ((platform.y - self.bbox.min_y) / self.tile_h) as usize;
            if let Some(slot) = occupied.get_mut(line) {
                *slot = 1;
            }
        }
        occupied
    }

    /// Bring a platform that left the box back on the opposite side
    ///
    /// The destination line comes from the configured selector. When the
    /// entry cells are taken the platform keeps drifting outside and tries
    /// again next tick.
    pub fn reposition(&mut self, id: PlatformId) {
        let platform = self.platforms[id];
        let Some(exit) = platform.exit(&self.bbox) else {
            return;
        };
        let lines = self.occupied_lines(Some(id));
        let line = match self.settings.reposition_algorithm {
            RepositionAlgorithm::Blind => select_random_line_blindly(&lines, &mut self.rng),
            RepositionAlgorithm::Aware => select_random_line_awarely(&lines, &mut self.rng),
        };
        let x = match exit {
            // One unit inside the box
            Exit::Right => self.bbox.min_x - platform.w + 1,
            Exit::Left => self.bbox.max_x,
        };
        let y = self.bbox.min_y + line as i32 * self.tile_h;
        if self.rigid_matrix.violates(x, y, platform.w, platform.h) {
            log::debug!("Platform {id} could not re-enter on line {line}, retrying next tick");
            return;
        }
        let Game {
            platforms,
            rigid_matrix,
            ..
        } = self;
        let platform = &mut platforms[id];
        rigid_matrix.subtract_platform(platform);
        platform.x = x;
        platform.y = y;
        rigid_matrix.add_platform(platform);
        log::trace!("Platform {id} re-entered at ({x}, {y})");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::random::Xorshift128;

    fn empty_game() -> Game {
        let settings = Settings {
            platform_count: 0,
            ..Default::default()
        };
        Game::new("Tester", &settings, 11)
    }

    fn platform(x: i32, y: i32, w: i32, speed: i32) -> Platform {
        Platform {
            x,
            y,
            w,
            h: 1,
            speed,
            rarity: 0.0,
        }
    }

    #[test]
    fn test_pending_movement_spreads_evenly() {
        for speed in [0, 1, 7, 30, 60, 61, 125] {
            let total: i32 = (0..UPS).map(|f| get_absolute_pending_movement(f, speed)).sum();
            assert_eq!(total, speed, "speed {speed}");
        }
        assert_eq!(get_pending_movement(3, -60), -1);
        assert_eq!(get_pending_movement(3, 120), 2);
    }

    #[test]
    fn test_aware_selection_avoids_occupied_line() {
        let mut rng = Xorshift128::new(1);
        let mut seen = [0u32; 3];
        for _ in 0..1000 {
            seen[select_random_line_awarely(&[0, 1, 0], &mut rng)] += 1;
        }
        assert_eq!(seen[1], 0);
        assert!(seen[0] > 0 && seen[2] > 0);
    }

    #[test]
    fn test_aware_selection_prefers_middle() {
        let mut rng = Xorshift128::new(2);
        for _ in 0..100 {
            assert_eq!(select_random_line_awarely(&[0, 0, 0], &mut rng), 1);
        }
    }

    #[test]
    fn test_blind_selection() {
        let mut rng = Xorshift128::new(3);
        for _ in 0..100 {
            assert_eq!(select_random_line_blindly(&[1, 0, 1, 1], &mut rng), 1);
            assert!(select_random_line_blindly(&[1, 1], &mut rng) < 2);
        }
    }

    #[test]
    #[should_panic(expected = "empty slice")]
    fn test_selection_rejects_empty_slice() {
        let mut rng = Xorshift128::new(4);
        select_random_line_awarely(&[], &mut rng);
    }

    #[test]
    fn test_generated_platforms_respect_ranges() {
        let settings = Settings::default();
        let bbox = settings.play_box();
        let avoidance = BoundingBox::from_size(40, 15, 1, 1);
        let mut rng = Xorshift128::new(77);
        let platforms = generate_platforms(&settings, bbox, avoidance, 16, 1, 1, &mut rng);
        assert_eq!(platforms.len(), 16);
        let mut rows = std::collections::HashSet::new();
        for p in &platforms {
            assert!((4..=16).contains(&p.w));
            assert!((4..=12).contains(&p.speed.abs()));
            assert!(bbox.contains(p.x, p.y));
            assert_ne!(p.y, 15, "platform generated on the player's row");
            assert!([0.0, 0.25, 0.5, 0.75, 1.0].contains(&p.rarity));
            rows.insert(p.y);
        }
        // Fewer platforms than rows, so no row is shared
        assert_eq!(rows.len(), 16);
    }

    #[test]
    fn test_platform_slides_and_keeps_grid() {
        let mut game = empty_game();
        let id = game.insert_platform(platform(10, 5, 4, 60));
        game.move_platform_horizontally(id);
        assert_eq!(game.platforms[id].x, 11);
        assert_eq!(
            game.rigid_matrix,
            RigidMatrix::from_platforms(game.bbox, &game.platforms)
        );
    }

    #[test]
    fn test_platform_blocked_by_platform() {
        let mut game = empty_game();
        let id = game.insert_platform(platform(10, 5, 4, 60));
        game.insert_platform(platform(14, 5, 4, 0));
        game.move_platform_horizontally(id);
        assert_eq!(game.platforms[id].x, 10);
    }

    #[test]
    fn test_platform_pushes_player() {
        let mut game = empty_game();
        game.player.physics = true;
        game.player.x = 14;
        game.player.y = 5;
        let id = game.insert_platform(platform(10, 5, 4, 60));
        game.move_platform_horizontally(id);
        assert_eq!(game.platforms[id].x, 11);
        assert_eq!(game.player.x, 15);
    }

    #[test]
    fn test_platform_carries_player() {
        let mut game = empty_game();
        game.player.physics = true;
        game.player.x = 12;
        game.player.y = 4;
        let id = game.insert_platform(platform(10, 5, 4, -60));
        game.move_platform_horizontally(id);
        assert_eq!(game.platforms[id].x, 9);
        assert_eq!(game.player.x, 11);
    }

    #[test]
    fn test_platform_stops_when_player_is_stuck() {
        let mut game = empty_game();
        game.player.physics = true;
        game.player.x = 14;
        game.player.y = 5;
        let id = game.insert_platform(platform(10, 5, 4, 60));
        // A wall right behind the player
        game.insert_platform(platform(15, 5, 1, 0));
        game.move_platform_horizontally(id);
        assert_eq!(game.platforms[id].x, 10);
        assert_eq!(game.player.x, 14);
    }

    #[test]
    fn test_player_stops_platforms() {
        let mut game = Game::new(
            "Tester",
            &Settings {
                platform_count: 0,
                player_stops_platforms: true,
                ..Default::default()
            },
            5,
        );
        game.player.physics = true;
        game.player.x = 12;
        game.player.y = 4;
        let id = game.insert_platform(platform(10, 5, 4, 60));
        game.move_platform_horizontally(id);
        assert_eq!(game.platforms[id].x, 10);
    }

    #[test]
    fn test_reposition_after_right_exit() {
        let mut game = empty_game();
        // 120 units per second on 1x1 tiles, two units every frame
        let id = game.insert_platform(platform(75, 3, 10, 120));
        let mut repositioned = false;
        for _ in 0..(3 * UPS) {
            game.update_platforms();
            game.current_frame += 1;
            let p = game.platforms[id];
            assert!(p.x <= game.bbox.max_x + 2, "platform wandered off at {}", p.x);
            if p.x < 0 {
                repositioned = true;
                assert_eq!(p.x, -9);
                assert!(game.bbox.contains(0, p.y));
                break;
            }
        }
        assert!(repositioned);
        assert_eq!(
            game.rigid_matrix,
            RigidMatrix::from_platforms(game.bbox, &game.platforms)
        );
    }

    #[test]
    fn test_reposition_after_left_exit() {
        let mut game = empty_game();
        let id = game.insert_platform(platform(-11, 3, 10, -60));
        game.reposition(id);
        assert_eq!(game.platforms[id].x, game.bbox.max_x);
        assert_eq!(
            game.rigid_matrix,
            RigidMatrix::from_platforms(game.bbox, &game.platforms)
        );
    }

    #[test]
    fn test_reposition_waits_for_free_entry() {
        let mut game = empty_game();
        // Block column 0 on every line
        for y in game.bbox.min_y..=game.bbox.max_y {
            game.insert_platform(platform(0, y, 1, 0));
        }
        let id = game.insert_platform(platform(81, 3, 10, 60));
        game.reposition(id);
        assert_eq!(game.platforms[id].x, 81);
        assert_eq!(game.platforms[id].y, 3);
        assert_eq!(
            game.rigid_matrix,
            RigidMatrix::from_platforms(game.bbox, &game.platforms)
        );
    }

    #[test]
    fn test_blind_reposition_takes_the_empty_line() {
        let mut game = Game::new(
            "Tester",
            &Settings {
                platform_count: 0,
                reposition_algorithm: RepositionAlgorithm::Blind,
                ..Default::default()
            },
            13,
        );
        for y in game.bbox.min_y..=game.bbox.max_y {
            if y != 7 {
                game.insert_platform(platform(40, y, 1, 0));
            }
        }
        let id = game.insert_platform(platform(-11, 3, 10, -60));
        game.reposition(id);
        assert_eq!(game.platforms[id].x, game.bbox.max_x);
        assert_eq!(game.platforms[id].y, 7);
        assert_eq!(
            game.rigid_matrix,
            RigidMatrix::from_platforms(game.bbox, &game.platforms)
        );
    }

    #[test]
    fn test_crowded_generation_never_stacks() {
        let settings = Settings {
            platform_count: 64,
            ..Default::default()
        };
        for seed in [1, 2, 3] {
            let game = Game::new("Tester", &settings, seed);
            assert!(game.platforms.len() > 30);
            let player = game.player.bbox();
            for p in &game.platforms {
                assert!(!p.bbox().overlaps(&player), "platform {p:?} covers the player");
            }
            for x in game.bbox.min_x..=game.bbox.max_x {
                for y in game.bbox.min_y..=game.bbox.max_y {
                    assert!(game.rigid_matrix.count(x, y) <= 1, "stacked cell at ({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn test_time_stop_freezes_platforms() {
        let mut game = empty_game();
        let id = game.insert_platform(platform(10, 5, 4, 60));
        game.player.perk = Some(Perk::TimeStop);
        game.update_platforms();
        assert_eq!(game.platforms[id].x, 10);
    }

    #[test]
    fn test_occupied_lines_ignores_platform() {
        let mut game = empty_game();
        let a = game.insert_platform(platform(0, 2, 4, 1));
        game.insert_platform(platform(0, 7, 4, 1));
        let lines = game.occupied_lines(Some(a));
        assert_eq!(lines.len(), 30);
        assert_eq!(lines[2], 0);
        assert_eq!(lines[7], 1);
    }
}

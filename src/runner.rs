//! Fixed timestep game loop
//!
//! Logic advances at `UPS` ticks per second of wall time while drawing runs as
//! often as `MAXIMUM_FPS` allows. Rendering, input, time and score storage are
//! collaborators behind traits so the loop runs headless in tests.

use std::time::{Duration, Instant};

use crate::consts::{MAXIMUM_FPS, REPETITION_DELAY, UPS};
use crate::sim::{Command, CommandTable, Game, update_game};

/// Millisecond time source
pub trait Clock {
    fn now(&self) -> u64;
    fn sleep(&mut self, ms: u64);
}

/// Wall clock measured from its creation
#[derive(Debug, Clone)]
pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn sleep(&mut self, ms: u64) {
        std::thread::sleep(Duration::from_millis(ms));
    }
}

/// Clock that only advances when slept on
///
/// Runs a game as fast as the host allows with the same tick cadence as a
/// real-time session.
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    now: u64,
}

impl VirtualClock {
    pub fn advance(&mut self, ms: u64) {
        self.now += ms;
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> u64 {
        self.now
    }

    fn sleep(&mut self, ms: u64) {
        self.advance(ms);
    }
}

/// Draws game snapshots and collects input
pub trait Frontend {
    fn draw(&mut self, game: &Game);

    /// Refresh the command table; `now` is the clock time in milliseconds
    fn read_commands(&mut self, game: &Game, commands: &mut CommandTable, now: u64);
}

/// Stores final scores
pub trait ScoreKeeper {
    /// Returns the rank the score achieved, if any
    fn register(&mut self, name: &str, score: u64) -> Option<usize>;
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The player ran out of lives
    GameOver,
    /// The played time limit was reached
    TimeUp,
    /// The player left the game
    Quit,
    /// The application is closing; the score is discarded
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameResult {
    pub outcome: Outcome,
    pub score: u64,
    pub rank: Option<usize>,
}

fn check_end(game: &Game, commands: &CommandTable) -> Option<Outcome> {
    if commands.is_active(Command::Close) {
        Some(Outcome::Close)
    } else if commands.is_active(Command::Quit) {
        Some(Outcome::Quit)
    } else if game.player.lives == 0 {
        Some(Outcome::GameOver)
    } else if game.is_over() {
        Some(Outcome::TimeUp)
    } else {
        None
    }
}

/// Play a session until the player quits, dies or runs out of time
///
/// The score is registered unless the session ended with `Close`.
pub fn run_game<F, C, S>(
    game: &mut Game,
    commands: &mut CommandTable,
    frontend: &mut F,
    clock: &mut C,
    scores: &mut S,
) -> GameResult
where
    F: Frontend + ?Sized,
    C: Clock + ?Sized,
    S: ScoreKeeper + ?Sized,
{
    match game.difficulty() {
        Some(difficulty) => log::info!("Started running a game of difficulty {difficulty:.4}"),
        None => log::info!("Started running a game without platforms"),
    }
    let frame_interval = 1000 / MAXIMUM_FPS;
    let logic_interval = 1000 / UPS;
    let mut since_last_logic = 0;

    let outcome = loop {
        if let Some(outcome) = check_end(game, commands) {
            break outcome;
        }
        let start = clock.now();
        if since_last_logic >= 2 * logic_interval {
            log::warn!("Skipped a frame!");
        }
        while since_last_logic > logic_interval {
            since_last_logic -= logic_interval;
            game.desired_frame += 1;
        }

        if game.paused {
            frontend.draw(game);
            frontend.read_commands(game, commands, clock.now());
            let now = clock.now();
            if commands.test(Command::Close, REPETITION_DELAY, now) {
                break Outcome::Close;
            }
            if commands.test(Command::Quit, REPETITION_DELAY, now) {
                break Outcome::Quit;
            }
            if commands.test(Command::Pause, REPETITION_DELAY, now) {
                log::debug!("Resumed at frame {}", game.current_frame);
                game.paused = false;
            }
            clock.sleep(frame_interval);
            continue;
        }

        while game.current_frame < game.desired_frame {
            update_game(game, commands);
        }
        frontend.draw(game);
        frontend.read_commands(game, commands, clock.now());
        let now = clock.now();
        if commands.test(Command::Pause, REPETITION_DELAY, now) {
            log::debug!("Paused at frame {}", game.current_frame);
            game.paused = true;
        }
        if commands.test(Command::Debug, REPETITION_DELAY, now) {
            game.debugging = !game.debugging;
        }
        let elapsed = clock.now().saturating_sub(start);
        if elapsed < frame_interval {
            clock.sleep(frame_interval - elapsed);
        }
        since_last_logic += clock.now().saturating_sub(start);
    };

    let score = game.player.score;
    let rank = if outcome == Outcome::Close {
        None
    } else {
        scores.register(&game.player.name, score)
    };
    log::info!(
        "{} finished with {score} points ({outcome:?}) after {} played frames",
        game.player.name,
        game.played_frames
    );
    GameResult {
        outcome,
        score,
        rank,
    }
}

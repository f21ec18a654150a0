//! Walls of Doom headless runner
//!
//! Plays sessions with a random autopilot standing in for a human player,
//! records the scores and optionally dumps the final game state.

use std::fs;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use walls_of_doom::runner::{Clock, Frontend, GameResult, SystemClock, VirtualClock, run_game};
use walls_of_doom::sim::{Command, CommandTable, Game};
use walls_of_doom::{RecordTable, RepositionAlgorithm, Settings};

#[derive(Parser, Debug)]
#[command(name = "walls-of-doom")]
#[command(about = "Survive on a screen crossed by moving platforms (autopilot runner)")]
struct Cli {
    /// Player name written to the record table
    #[arg(long, default_value = "Autopilot")]
    name: String,
    /// Seed of the first session (defaults to the current time)
    #[arg(long)]
    seed: Option<u64>,
    /// Number of sessions to play; each uses the next seed
    #[arg(long, default_value_t = 1)]
    sessions: u32,
    /// Settings file (defaults are used when it does not exist)
    #[arg(long, default_value = "settings.json")]
    settings: PathBuf,
    /// Record table file
    #[arg(long, default_value = "records.json")]
    records: PathBuf,
    /// Override the reposition algorithm from the settings file
    #[arg(long, value_enum)]
    algorithm: Option<CliAlgorithm>,
    /// Sleep for real instead of running on a virtual clock
    #[arg(long, default_value_t = false)]
    realtime: bool,
    /// Write the final state of the last session as JSON
    #[arg(long)]
    dump_state: Option<PathBuf>,
    /// Print the final screen of each session
    #[arg(long, default_value_t = false)]
    print_final: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliAlgorithm {
    Blind,
    Aware,
}

impl From<CliAlgorithm> for RepositionAlgorithm {
    fn from(value: CliAlgorithm) -> Self {
        match value {
            CliAlgorithm::Blind => RepositionAlgorithm::Blind,
            CliAlgorithm::Aware => RepositionAlgorithm::Aware,
        }
    }
}

/// Milliseconds between two autopilot decisions
const DECISION_INTERVAL: u64 = 250;

/// Random player: runs left or right, jumps now and then and buys lives
struct Autopilot {
    rng: Pcg32,
    next_decision: u64,
    draws: u64,
}

impl Autopilot {
    fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            next_decision: 0,
            draws: 0,
        }
    }
}

impl Frontend for Autopilot {
    fn draw(&mut self, game: &Game) {
        self.draws += 1;
        if game.debugging && game.current_frame % 60 == 0 {
            log::debug!(
                "frame {} at ({}, {}) score {} lives {}",
                game.current_frame,
                game.player.x,
                game.player.y,
                game.player.score,
                game.player.lives
            );
        }
    }

    fn read_commands(&mut self, game: &Game, commands: &mut CommandTable, now: u64) {
        if now < self.next_decision {
            return;
        }
        self.next_decision = now + DECISION_INTERVAL;
        let magnitude = self.rng.random_range(0.5..=1.0);
        let (left, right) = match self.rng.random_range(0..3) {
            0 => (magnitude, 0.0),
            1 => (0.0, magnitude),
            _ => (0.0, 0.0),
        };
        commands.set(Command::Left, left, now);
        commands.set(Command::Right, right, now);
        if self.rng.random_bool(0.35) {
            commands.set(Command::Jump, 1.0, now);
        }
        if game.player.lives == 1 && game.player.score >= walls_of_doom::consts::BUY_LIFE_PRICE {
            commands.set(Command::Convert, 1.0, now);
        }
    }
}

/// Plain text rendering of the play box
fn render_ascii(game: &Game) -> String {
    let bbox = game.bbox;
    let mut screen = format!(
        "{} | score {} | lives {} | frame {}\n",
        game.player.name, game.player.score, game.player.lives, game.current_frame
    );
    let player = game.player.bbox();
    let perk = game.perk.is_on_field().then(|| game.perk_bbox());
    for y in (bbox.min_y..=bbox.max_y).step_by(game.tile_h as usize) {
        for x in (bbox.min_x..=bbox.max_x).step_by(game.tile_w as usize) {
            let glyph = if player.contains(x, y) {
                '@'
            } else if perk.is_some_and(|p| p.contains(x, y)) {
                'X'
            } else if game.rigid_matrix.query(x, y) {
                '='
            } else {
                ' '
            };
            screen.push(glyph);
        }
        screen.push('\n');
    }
    if !game.message.is_empty() {
        screen.push_str(&game.message.text);
        screen.push('\n');
    }
    screen
}

fn play_session(
    cli: &Cli,
    settings: &Settings,
    seed: u64,
    records: &mut RecordTable,
) -> (Game, GameResult) {
    let mut game = Game::new(cli.name.clone(), settings, seed);
    let mut autopilot = Autopilot::new(seed);
    let mut clock: Box<dyn Clock> = if cli.realtime {
        Box::new(SystemClock::default())
    } else {
        Box::new(VirtualClock::default())
    };
    let mut commands = CommandTable::new(clock.now());
    let result = run_game(
        &mut game,
        &mut commands,
        &mut autopilot,
        clock.as_mut(),
        records,
    );
    log::debug!("Session drew {} frames", autopilot.draws);
    (game, result)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut settings = if cli.settings.exists() {
        Settings::load(&cli.settings)
            .with_context(|| format!("failed to load settings from {}", cli.settings.display()))?
    } else {
        log::info!("No settings file at {}, using defaults", cli.settings.display());
        Settings::default()
    };
    if let Some(algorithm) = cli.algorithm {
        settings.reposition_algorithm = algorithm.into();
    }
    let mut records = RecordTable::load(&cli.records)
        .with_context(|| format!("failed to read records from {}", cli.records.display()))?;

    let first_seed = cli.seed.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default()
    });

    let mut last_game = None;
    for session in 0..u64::from(cli.sessions) {
        let seed = first_seed.wrapping_add(session);
        log::info!(
            "Session {} of {} (seed {seed}, {} reposition)",
            session + 1,
            cli.sessions,
            settings.reposition_algorithm.as_str()
        );
        // A broken invariant aborts the session, not the whole run
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            play_session(&cli, &settings, seed, &mut records)
        }));
        match outcome {
            Ok((game, result)) => {
                let rank = result
                    .rank
                    .map_or_else(|| "unranked".to_string(), |r| format!("rank {r}"));
                println!(
                    "seed {seed}: {:?} with {} points ({rank})",
                    result.outcome, result.score
                );
                if cli.print_final {
                    print!("{}", render_ascii(&game));
                }
                last_game = Some(game);
            }
            Err(_) => log::error!("Session with seed {seed} crashed, skipping it"),
        }
    }

    records
        .save(&cli.records)
        .with_context(|| format!("failed to write records to {}", cli.records.display()))?;

    if let (Some(path), Some(game)) = (&cli.dump_state, &last_game) {
        let json = serde_json::to_string_pretty(game).context("failed to serialize game state")?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        log::info!("Dumped final state to {}", path.display());
    }
    Ok(())
}

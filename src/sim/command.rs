//! Abstract player intent
//!
//! The input collaborator translates keyboard/joystick events into magnitudes
//! on this table. The simulation only reads it, except for the one-shot
//! commands (jump, convert) which it clears after consuming.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    Up,
    Left,
    Center,
    Right,
    Down,
    Jump,
    Enter,
    Convert,
    Pause,
    Debug,
    Quit,
    Close,
}

impl Command {
    pub const COUNT: usize = 12;

    pub const ALL: [Command; Self::COUNT] = [
        Command::Up,
        Command::Left,
        Command::Center,
        Command::Right,
        Command::Down,
        Command::Jump,
        Command::Enter,
        Command::Convert,
        Command::Pause,
        Command::Debug,
        Command::Quit,
        Command::Close,
    ];

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

/// Magnitude per command plus the timestamps used for repetition control
///
/// Magnitudes are in `[0, 1]`; analog axes split into two commands
/// (e.g. `Left` and `Right`), each holding its own positive magnitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandTable {
    status: [f64; Command::COUNT],
    last_issued: [u64; Command::COUNT],
    last_modified: [u64; Command::COUNT],
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::new(0)
    }
}

impl CommandTable {
    /// Create a table with every command released at time `now` (ms)
    pub fn new(now: u64) -> Self {
        Self {
            status: [0.0; Command::COUNT],
            last_issued: [now; Command::COUNT],
            last_modified: [now; Command::COUNT],
        }
    }

    pub fn get(&self, command: Command) -> f64 {
        self.status[command.index()]
    }

    pub fn is_active(&self, command: Command) -> bool {
        self.get(command) != 0.0
    }

    pub fn set(&mut self, command: Command, value: f64, now: u64) {
        let value = if value.is_finite() {
            value.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.status[command.index()] = value;
        self.last_modified[command.index()] = now;
    }

    pub fn last_modified(&self, command: Command) -> u64 {
        self.last_modified[command.index()]
    }

    /// Read a one-shot command and clear it
    pub fn consume(&mut self, command: Command) -> f64 {
        std::mem::take(&mut self.status[command.index()])
    }

    /// Whether a held command should fire now
    ///
    /// A command fires at most once per `repetition_delay` milliseconds.
    pub fn test(&mut self, command: Command, repetition_delay: u64, now: u64) -> bool {
        if !self.is_active(command) {
            return false;
        }
        let index = command.index();
        if now.saturating_sub(self.last_issued[index]) < repetition_delay {
            return false;
        }
        self.last_issued[index] = now;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_matches_indices() {
        for (i, command) in Command::ALL.iter().enumerate() {
            assert_eq!(command.index(), i);
        }
    }

    #[test]
    fn test_set_clamps_magnitude() {
        let mut table = CommandTable::new(0);
        table.set(Command::Right, 2.5, 10);
        assert_eq!(table.get(Command::Right), 1.0);
        table.set(Command::Left, f64::NAN, 10);
        assert_eq!(table.get(Command::Left), 0.0);
        assert_eq!(table.last_modified(Command::Left), 10);
    }

    #[test]
    fn test_consume_clears_one_shot() {
        let mut table = CommandTable::new(0);
        table.set(Command::Jump, 1.0, 5);
        assert_eq!(table.consume(Command::Jump), 1.0);
        assert!(!table.is_active(Command::Jump));
        assert_eq!(table.consume(Command::Jump), 0.0);
    }

    #[test]
    fn test_repetition_delay() {
        let mut table = CommandTable::new(0);
        table.set(Command::Pause, 1.0, 0);
        assert!(!table.test(Command::Pause, 300, 100));
        assert!(table.test(Command::Pause, 300, 300));
        assert!(!table.test(Command::Pause, 300, 500));
        assert!(table.test(Command::Pause, 300, 600));

        table.set(Command::Pause, 0.0, 700);
        assert!(!table.test(Command::Pause, 300, 2000));
    }
}

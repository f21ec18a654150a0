//! Game settings
//!
//! Persisted as a JSON document next to the record table. Every field has a
//! default, so partial files are accepted.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::MAXIMUM_PLATFORM_COUNT;
use crate::error::Error;
use crate::sim::BoundingBox;

/// How a platform that left the screen picks the row it re-enters on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RepositionAlgorithm {
    /// Any empty row, or any row at all when none is empty
    Blind,
    /// A row as far as possible from every occupied row
    #[default]
    Aware,
}

impl RepositionAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepositionAlgorithm::Blind => "Blind",
            RepositionAlgorithm::Aware => "Aware",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "blind" | "blindly" => Some(RepositionAlgorithm::Blind),
            "aware" | "awarely" => Some(RepositionAlgorithm::Aware),
            _ => None,
        }
    }
}

/// Tunable settings consumed by the simulation and the game loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Geometry ===
    pub tiles_on_x: u32,
    pub tiles_on_y: u32,
    /// Tile width in world units
    pub tile_w: u32,
    /// Tile height in world units
    pub tile_h: u32,
    /// Height of each of the two UI bars (renderer only)
    pub bar_height: u32,

    // === Platforms ===
    pub platform_count: u32,
    /// Minimum platform width (tiles)
    pub platform_min_width: u32,
    /// Maximum platform width (tiles)
    pub platform_max_width: u32,
    /// Minimum platform speed (tiles per second)
    pub platform_min_speed: u32,
    /// Maximum platform speed (tiles per second)
    pub platform_max_speed: u32,
    pub reposition_algorithm: RepositionAlgorithm,
    /// Platforms carrying the player hold still
    pub player_stops_platforms: bool,

    // === Perks (seconds) ===
    pub perk_interval: u32,
    pub perk_screen_duration: u32,
    pub perk_player_duration: u32,

    // === Session ===
    /// Played seconds after which the game ends (0 = unlimited)
    pub played_time_limit: u32,
    /// Trace the score every tick while the player is active
    pub logging_player_score: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tiles_on_x: 80,
            tiles_on_y: 30,
            tile_w: 1,
            tile_h: 1,
            bar_height: 1,

            platform_count: 16,
            platform_min_width: 4,
            platform_max_width: 16,
            platform_min_speed: 4,
            platform_max_speed: 12,
            reposition_algorithm: RepositionAlgorithm::Aware,
            player_stops_platforms: false,

            perk_interval: 20,
            perk_screen_duration: 10,
            perk_player_duration: 5,

            played_time_limit: 120,
            logging_player_score: false,
        }
    }
}

impl Settings {
    pub fn window_width(&self) -> u32 {
        self.tile_w * self.tiles_on_x
    }

    pub fn window_height(&self) -> u32 {
        self.tile_h * self.tiles_on_y + 2 * self.bar_height
    }

    /// Playable area in world units (excludes the UI bars)
    pub fn play_box(&self) -> BoundingBox {
        BoundingBox::new(
            0,
            0,
            (self.tile_w * self.tiles_on_x) as i32 - 1,
            (self.tile_h * self.tiles_on_y) as i32 - 1,
        )
    }

    /// Check that these settings can build a playable game
    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |reason: String| Err(Error::InvalidSettings(reason));
        if self.tile_w == 0 || self.tile_h == 0 {
            return invalid(format!(
                "tile dimensions must be positive, got {}x{}",
                self.tile_w, self.tile_h
            ));
        }
        if self.tiles_on_x == 0 || self.tiles_on_y == 0 {
            return invalid(format!(
                "tile counts must be positive, got {}x{}",
                self.tiles_on_x, self.tiles_on_y
            ));
        }
        if self.platform_count > MAXIMUM_PLATFORM_COUNT {
            return invalid(format!(
                "platform count {} exceeds {MAXIMUM_PLATFORM_COUNT}",
                self.platform_count
            ));
        }
        if self.platform_min_width == 0 || self.platform_min_width > self.platform_max_width {
            return invalid(format!(
                "bad platform width range [{}, {}]",
                self.platform_min_width, self.platform_max_width
            ));
        }
        if self.platform_min_speed > self.platform_max_speed {
            return invalid(format!(
                "bad platform speed range [{}, {}]",
                self.platform_min_speed, self.platform_max_speed
            ));
        }
        if self.perk_interval == 0 {
            return invalid("perk interval must be positive".to_string());
        }
        if self.perk_screen_duration >= self.perk_interval {
            return invalid(format!(
                "perk screen duration {} must be shorter than the perk interval {}",
                self.perk_screen_duration, self.perk_interval
            ));
        }
        Ok(())
    }

    /// Load and validate settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let settings: Settings = serde_json::from_str(&json).map_err(|e| Error::json(path, e))?;
        settings.validate()?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load settings, falling back to defaults when the file is missing or bad
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("{e}, using default settings");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|e| Error::json(path, e))?;
        fs::write(path, json).map_err(|e| Error::io(path, e))?;
        log::info!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.window_width(), 80);
        assert_eq!(settings.window_height(), 32);
        assert_eq!(settings.play_box(), BoundingBox::new(0, 0, 79, 29));
    }

    #[test]
    fn test_play_box_scales_with_tiles() {
        let settings = Settings {
            tile_w: 8,
            tile_h: 16,
            tiles_on_x: 10,
            tiles_on_y: 5,
            ..Default::default()
        };
        assert_eq!(settings.play_box(), BoundingBox::new(0, 0, 79, 79));
    }

    #[test]
    fn test_rejects_inverted_ranges() {
        let settings = Settings {
            platform_min_width: 10,
            platform_max_width: 2,
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(Error::InvalidSettings(_))));

        let settings = Settings {
            platform_min_speed: 5,
            platform_max_speed: 1,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_rejects_perk_lifetime_longer_than_interval() {
        let settings = Settings {
            perk_interval: 5,
            perk_screen_duration: 6,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_tiles() {
        let settings = Settings {
            tile_h: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_reposition_algorithm_from_str() {
        assert_eq!(
            RepositionAlgorithm::from_str("BLIND"),
            Some(RepositionAlgorithm::Blind)
        );
        assert_eq!(
            RepositionAlgorithm::from_str("aware"),
            Some(RepositionAlgorithm::Aware)
        );
        assert_eq!(RepositionAlgorithm::from_str("random"), None);
    }

    #[test]
    fn test_load_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "platform_count": 3, "reposition_algorithm": "Blind" }"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.platform_count, 3);
        assert_eq!(settings.reposition_algorithm, RepositionAlgorithm::Blind);
        assert_eq!(settings.tiles_on_x, 80);
    }

    #[test]
    fn test_load_or_default_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_or_default(dir.path().join("missing.json"));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "tile_w": 0 }"#).unwrap();
        assert!(matches!(Settings::load(&path), Err(Error::InvalidSettings(_))));

        fs::write(&path, "not json").unwrap();
        assert!(matches!(Settings::load(&path), Err(Error::Json { .. })));
    }
}

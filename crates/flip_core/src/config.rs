//! Game configuration, loaded once at startup from JSON.
//!
//! Every field has a default so a partial file is valid, and a missing file
//! means "use the built-in defaults". A file that exists but cannot be read,
//! parsed or validated is an error the caller treats as fatal.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::board::{BoardError, BoardLayout};
use crate::engine::DEFAULT_REVEAL_DELAY_MS;

pub const DEFAULT_CONFIG_PATH: &str = "assets/config/game.json";
pub const CONFIG_PATH_ENV: &str = "FLIP_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("invalid board layout: {0}")]
    Layout(#[from] BoardError),
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct WindowSection {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            title: "Card Flip".to_string(),
            width: 640,
            height: 480,
        }
    }
}

/// Naming scheme for card images: `<dir>/<back>.<ext>` and
/// `<dir>/<face_prefix><identity>.<ext>`.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AssetSection {
    pub dir: String,
    pub back: String,
    pub face_prefix: String,
    pub extension: String,
}

impl Default for AssetSection {
    fn default() -> Self {
        Self {
            dir: "assets/cards".to_string(),
            back: "back".to_string(),
            face_prefix: "face_".to_string(),
            extension: "png".to_string(),
        }
    }
}

impl AssetSection {
    pub fn back_path(&self) -> PathBuf {
        Path::new(&self.dir).join(format!("{}.{}", self.back, self.extension))
    }

    pub fn face_path(&self, identity: usize) -> PathBuf {
        Path::new(&self.dir).join(format!(
            "{}{}.{}",
            self.face_prefix, identity, self.extension
        ))
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct GameConfig {
    pub window: WindowSection,
    pub board: BoardLayout,
    pub reveal_delay_ms: u64,
    /// Frame clear color, sRGB.
    pub background: [u8; 3],
    pub assets: AssetSection,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            window: WindowSection::default(),
            board: BoardLayout::default(),
            reveal_delay_ms: DEFAULT_REVEAL_DELAY_MS,
            background: [255, 255, 255],
            assets: AssetSection::default(),
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let board = &self.board;
        board.validate()?;
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(
                "window width and height must be > 0".to_string(),
            ));
        }

        let (right, bottom) = board.grid_extent()?;
        if i64::from(right) > i64::from(self.window.width)
            || i64::from(bottom) > i64::from(self.window.height)
        {
            return Err(ConfigError::Invalid(format!(
                "{} cards in {} columns need {}x{} but the window is {}x{}",
                board.card_count(),
                board.columns,
                right,
                bottom,
                self.window.width,
                self.window.height
            )));
        }
        if self.assets.extension.is_empty() {
            return Err(ConfigError::Invalid(
                "assets.extension must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn load_config_from_path(path: &Path) -> Result<GameConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: GameConfig = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

/// Load `path` if it exists, otherwise fall back to the validated defaults.
pub fn load_config_or_default(path: &Path) -> Result<GameConfig, ConfigError> {
    if path.exists() {
        let config = load_config_from_path(path)?;
        log::info!("Loaded config '{}'", path.display());
        return Ok(config);
    }
    log::warn!(
        "Config '{}' not found, using built-in defaults",
        path.display()
    );
    let config = GameConfig::default();
    config.validate()?;
    Ok(config)
}

/// Config path from `FLIP_CONFIG`, or the default asset location.
pub fn config_path_from_env() -> PathBuf {
    std::env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "flip_config_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn defaults_are_valid_classic_layout() {
        let config = GameConfig::default();
        config.validate().expect("defaults must validate");
        assert_eq!(config.board.pair_count, 6);
        assert_eq!(config.board.columns, 4);
        assert_eq!(config.reveal_delay_ms, 1000);
        assert_eq!((config.window.width, config.window.height), (640, 480));
        assert_eq!(config.background, [255, 255, 255]);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let path = temp_file_path("partial");
        fs::write(
            &path,
            r#"{ "board": { "pair_count": 4 }, "reveal_delay_ms": 750 }"#,
        )
        .expect("write config");

        let config = load_config_from_path(&path).expect("partial config should load");
        assert_eq!(config.board.pair_count, 4);
        assert_eq!(config.board.columns, 4);
        assert_eq!(config.board.card_width, 100);
        assert_eq!(config.reveal_delay_ms, 750);
        assert_eq!(config.window, WindowSection::default());

        let _ = fs::remove_file(path);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let path = temp_file_path("malformed");
        fs::write(&path, "{ not json").expect("write config");

        let err = load_config_from_path(&path).expect_err("malformed config should fail");
        assert!(matches!(err, ConfigError::Parse { .. }));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn zero_pairs_rejected() {
        let path = temp_file_path("zero_pairs");
        fs::write(&path, r#"{ "board": { "pair_count": 0 } }"#).expect("write config");

        let err = load_config_from_path(&path).expect_err("zero pairs should fail");
        assert!(err.to_string().contains("pair_count"));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn grid_larger_than_window_rejected() {
        let config = GameConfig {
            board: BoardLayout {
                pair_count: 12,
                ..BoardLayout::default()
            },
            ..GameConfig::default()
        };
        let err = config.validate().expect_err("6 rows cannot fit in 480px");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn negative_gap_rejected() {
        let config = GameConfig {
            board: BoardLayout {
                gap: -5,
                ..BoardLayout::default()
            },
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_columns_rejected() {
        let config = GameConfig {
            board: BoardLayout {
                columns: 0,
                ..BoardLayout::default()
            },
            ..GameConfig::default()
        };
        let err = config.validate().expect_err("zero columns");
        assert!(err.to_string().contains("columns"));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = temp_file_path("missing");
        let _ = fs::remove_file(&path);
        let config = load_config_or_default(&path).expect("defaults should load");
        assert_eq!(config, GameConfig::default());
    }

    #[test]
    fn asset_paths_follow_naming_scheme() {
        let assets = AssetSection {
            dir: "cards".to_string(),
            extension: "jpg".to_string(),
            ..AssetSection::default()
        };
        assert_eq!(assets.back_path(), Path::new("cards").join("back.jpg"));
        assert_eq!(assets.face_path(3), Path::new("cards").join("face_3.jpg"));
    }

    #[test]
    fn oversized_card_width_is_a_layout_error() {
        let config = GameConfig {
            board: BoardLayout {
                pair_count: 2,
                card_width: 1_000_000_000,
                ..BoardLayout::default()
            },
            ..GameConfig::default()
        };
        let err = config.validate().expect_err("grid overflows i32");
        assert!(matches!(
            err,
            ConfigError::Layout(BoardError::GridOverflow { .. })
        ));
    }

    #[test]
    fn oversized_layout_in_file_is_rejected() {
        let path = temp_file_path("overflow");
        fs::write(
            &path,
            r#"{ "board": { "pair_count": 2, "card_height": 2000000000, "columns": 1 } }"#,
        )
        .expect("write config");

        let err = load_config_from_path(&path).expect_err("overflowing layout should fail");
        assert!(matches!(err, ConfigError::Layout(_)), "got {err}");

        let _ = fs::remove_file(path);
    }
}

use std::path::PathBuf;

use flip_core::board::BoardError;
use flip_core::config::ConfigError;
use thiserror::Error;

/// Everything that can stop the game from starting. All of these are fatal:
/// the process reports the error and exits with a non-zero status.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("failed to build board: {0}")]
    Board(#[from] BoardError),
    #[error("graphics initialisation failed: {0}")]
    Gpu(String),
    #[error("failed to load card image '{}': {reason}", .path.display())]
    Asset { path: PathBuf, reason: String },
}

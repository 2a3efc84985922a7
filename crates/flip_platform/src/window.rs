use std::sync::Arc;
use winit::error::OsError;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowAttributes};

pub struct PlatformConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            title: "Card Flip".to_string(),
            width: 640,
            height: 480,
            resizable: false,
        }
    }
}

/// Create the game window. The board is laid out in logical pixels, so the
/// inner size is requested in logical units as well.
pub fn create_window(
    event_loop: &ActiveEventLoop,
    config: &PlatformConfig,
) -> Result<Arc<Window>, OsError> {
    let attrs = WindowAttributes::default()
        .with_title(&config.title)
        .with_resizable(config.resizable)
        .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));

    let window = event_loop.create_window(attrs)?;
    log::debug!(
        "Window '{}' scale factor {:.2}",
        config.title,
        window.scale_factor()
    );
    Ok(Arc::new(window))
}

//! Lazuli studio: a small windowed demo of the engine.
//!
//! A triangle spins inside a multisampled render target, which is then
//! composited onto the window as a textured quad.

mod gl_window;
mod scene;

use anyhow::{Context as _, Result};
use winit::event_loop::{ControlFlow, EventLoop};

use lazuli_engine::logging::{LoggingConfig, init_logging};

/// Demo configuration.
#[derive(Debug, Clone)]
pub struct StudioConfig {
    pub title: String,
    /// Logical window size.
    pub width: u32,
    pub height: u32,
    /// Edge length of the offscreen target, in pixels.
    pub target_size: u32,
    /// Requested MSAA samples for the offscreen target (clamped by the device).
    pub samples: u32,
    pub vsync: bool,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            title: "lazuli studio".to_string(),
            width: 960,
            height: 640,
            target_size: 512,
            samples: 4,
            vsync: true,
        }
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = gl_window::StudioApp::new(StudioConfig::default());
    event_loop
        .run_app(&mut app)
        .context("winit event loop terminated with error")?;

    app.into_result()
}

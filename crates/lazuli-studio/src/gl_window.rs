//! Window, GL context and the winit event handler.

use std::num::NonZeroU32;

use anyhow::{Context as _, Result};
use glutin::config::{Config, ConfigTemplateBuilder, GlConfig};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, NotCurrentGlContext, PossiblyCurrentContext, Version,
};
use glutin::display::{Display, DisplayApiPreference, GlDisplay};
use glutin::surface::{GlSurface, Surface, SwapInterval, WindowSurface};
use glutin_winit::GlWindow;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawWindowHandle};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowId};

use lazuli_engine::device::GlowDevice;

use crate::StudioConfig;
use crate::scene::Scene;

/// Everything tied to the window's GL context.
///
/// Field order is drop order: the scene (and its device) goes while the
/// context is still alive.
struct Gfx {
    scene: Scene,
    surface: Surface<WindowSurface>,
    gl_context: PossiblyCurrentContext,
    window: Window,
}

pub struct StudioApp {
    config: StudioConfig,
    gfx: Option<Gfx>,
    error: Option<anyhow::Error>,
}

impl StudioApp {
    pub fn new(config: StudioConfig) -> Self {
        Self {
            config,
            gfx: None,
            error: None,
        }
    }

    /// Outcome of the run: the first fatal error, if any.
    pub fn into_result(self) -> Result<()> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.error.get_or_insert(err);
        event_loop.exit();
    }

    fn create_gfx(&self, event_loop: &ActiveEventLoop) -> Result<Gfx> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));

        // WGL loads its extensions through a window, so it gets one up front.
        let early_window = if cfg!(windows) {
            Some(
                event_loop
                    .create_window(attrs.clone())
                    .context("failed to create window")?,
            )
        } else {
            None
        };
        let early_handle = match &early_window {
            Some(window) => Some(raw_window_handle(window)?),
            None => None,
        };

        let raw_display = event_loop
            .display_handle()
            .context("event loop has no display handle")?
            .as_raw();
        let gl_display = unsafe { Display::new(raw_display, display_preference(early_handle)) }
            .context("failed to open GL display")?;

        let mut template = ConfigTemplateBuilder::new().with_alpha_size(8);
        if let Some(handle) = early_handle {
            template = template.compatible_with_native_window(handle);
        }
        let configs = unsafe { gl_display.find_configs(template.build()) }
            .context("failed to query GL framebuffer configs")?;
        let gl_config = pick_config(configs).context("GL display offered no framebuffer configs")?;

        let window = match early_window {
            Some(window) => window,
            None => glutin_winit::finalize_window(event_loop, attrs, &gl_config)
                .context("failed to create window")?,
        };

        let raw_handle = raw_window_handle(&window)?;
        let context_attrs = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .build(Some(raw_handle));
        let not_current = unsafe { gl_display.create_context(&gl_config, &context_attrs) }
            .context("failed to create GL 3.3 context")?;

        let surface_attrs = window
            .build_surface_attributes(Default::default())
            .context("failed to describe window surface")?;
        let surface = unsafe { gl_display.create_window_surface(&gl_config, &surface_attrs) }
            .context("failed to create window surface")?;
        let gl_context = not_current
            .make_current(&surface)
            .context("failed to make GL context current")?;

        if self.config.vsync {
            if let Err(e) = surface.set_swap_interval(&gl_context, SwapInterval::Wait(NonZeroU32::MIN))
            {
                log::warn!("vsync unavailable: {e}");
            }
        }

        let gl = unsafe { glow::Context::from_loader_function_cstr(|s| gl_display.get_proc_address(s)) };
        // The context was made current above and outlives the device (see `Gfx`).
        let device = unsafe { GlowDevice::new(gl) }.context("failed to initialize GL device")?;

        let size = window.inner_size();
        let scene = Scene::new(device, &self.config, size.width, size.height)?;

        Ok(Gfx {
            scene,
            surface,
            gl_context,
            window,
        })
    }
}

/// Prefers single-sampled configs; the engine multisamples offscreen.
fn pick_config(configs: impl Iterator<Item = Config>) -> Option<Config> {
    configs.min_by_key(|c| c.num_samples())
}

fn raw_window_handle(window: &Window) -> Result<RawWindowHandle> {
    Ok(window
        .window_handle()
        .context("window has no raw handle")?
        .as_raw())
}

#[cfg(windows)]
fn display_preference(window: Option<RawWindowHandle>) -> DisplayApiPreference {
    DisplayApiPreference::WglThenEgl(window)
}

#[cfg(target_vendor = "apple")]
fn display_preference(_window: Option<RawWindowHandle>) -> DisplayApiPreference {
    DisplayApiPreference::Cgl
}

#[cfg(target_os = "android")]
fn display_preference(_window: Option<RawWindowHandle>) -> DisplayApiPreference {
    DisplayApiPreference::Egl
}

#[cfg(all(unix, not(target_vendor = "apple"), not(target_os = "android")))]
fn display_preference(_window: Option<RawWindowHandle>) -> DisplayApiPreference {
    DisplayApiPreference::EglThenGlx(Box::new(winit::platform::x11::register_xlib_error_hook))
}

impl ApplicationHandler for StudioApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gfx.is_some() {
            return;
        }
        match self.create_gfx(event_loop) {
            Ok(gfx) => {
                gfx.window.request_redraw();
                self.gfx = Some(gfx);
            }
            Err(e) => self.fail(event_loop, e.context("failed to create window")),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(gfx) = self.gfx.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let (Some(w), Some(h)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height)) {
                    gfx.surface.resize(&gfx.gl_context, w, h);
                    gfx.scene.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                let frame = gfx.scene.render();
                let swap = gfx
                    .surface
                    .swap_buffers(&gfx.gl_context)
                    .context("failed to swap buffers");
                if let Err(e) = frame.and(swap) {
                    self.fail(event_loop, e);
                    return;
                }
                gfx.window.request_redraw();
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gfx) = self.gfx.take() {
            gfx.scene.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_list_yields_none() {
        assert!(pick_config(std::iter::empty()).is_none());
    }
}

//! What the studio draws each frame.

use std::time::Instant;

use anyhow::{Context as _, Result};

use lazuli_engine::coords::{Color, Mat4};
use lazuli_engine::device::{GlowDevice, PixelFormat, Topology};
use lazuli_engine::shader::{DEFAULT_FRAGMENT_SOURCE, DEFAULT_VERTEX_SOURCE};
use lazuli_engine::{Context, ContextConfig, Shader, Texture, TextureDesc, Vertex, init};

const BACKGROUND: Color = Color::new(0.06, 0.07, 0.10, 1.0);
const TARGET_BACKGROUND: Color = Color::new(0.12, 0.16, 0.28, 1.0);

pub struct Scene {
    ctx: Context<GlowDevice>,
    shader: Shader<GlowDevice>,
    target: Texture<GlowDevice>,
    started: Instant,
}

impl Scene {
    pub fn new(device: GlowDevice, config: &crate::StudioConfig, width: u32, height: u32) -> Result<Self> {
        let instance = init(device).context("GL device rejected")?;
        let mut ctx = Context::new(
            instance,
            ContextConfig {
                width,
                height,
                samples: config.samples,
                ..ContextConfig::default()
            },
        );

        let shader = ctx
            .create_shader(DEFAULT_VERTEX_SOURCE, DEFAULT_FRAGMENT_SOURCE)
            .context("failed to build default shader")?;
        let target = ctx
            .create_target_texture(&TextureDesc::new(
                config.target_size,
                config.target_size,
                PixelFormat::Rgba8,
            ))
            .context("failed to create offscreen target")?;
        log::info!(
            "offscreen target {}x{} with {} samples",
            target.width(),
            target.height(),
            target.samples()
        );

        Ok(Self {
            ctx,
            shader,
            target,
            started: Instant::now(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.ctx.resize(width, height);
        self.ctx.reset_viewport();
    }

    pub fn render(&mut self) -> Result<()> {
        let angle = self.started.elapsed().as_secs_f32();
        self.draw_offscreen(angle)?;
        self.composite()?;

        if let Some(err) = self.ctx.poll_device_error() {
            log::warn!("GL error during frame: {err}");
        }
        Ok(())
    }

    /// Spinning triangle in clip space, drawn into the multisampled target.
    fn draw_offscreen(&mut self, angle: f32) -> Result<()> {
        let ctx = &mut self.ctx;
        ctx.set_render_target(Some(&self.target));
        ctx.clear(TARGET_BACKGROUND);

        ctx.set_transform(Mat4::rotation_z(angle));
        ctx.set_bool(&self.shader, "u_use_texture", false);
        let triangle = [
            Vertex::new([0.0, 0.7, 0.0], [1.0, 0.3, 0.3, 1.0], [0.0, 0.0]),
            Vertex::new([-0.6, -0.5, 0.0], [0.3, 1.0, 0.4, 1.0], [0.0, 0.0]),
            Vertex::new([0.6, -0.5, 0.0], [0.3, 0.5, 1.0, 1.0], [0.0, 0.0]),
        ];
        ctx.draw_vertices(&self.shader, None, Topology::Triangles, &triangle)?;
        Ok(())
    }

    /// Resolves the target and draws it centered on the window.
    fn composite(&mut self) -> Result<()> {
        let ctx = &mut self.ctx;
        ctx.set_render_target(None);
        ctx.clear(BACKGROUND);

        let (w, h) = ctx.drawable_size();
        let (w, h) = (w as f32, h as f32);
        let side = w.min(h) * 0.8;
        let (x0, y0) = ((w - side) * 0.5, (h - side) * 0.5);
        let (x1, y1) = (x0 + side, y0 + side);

        ctx.push_state();
        ctx.set_projection(Mat4::screen(w, h));
        ctx.set_bool(&self.shader, "u_use_texture", true);
        // GL textures start at the bottom row; screen space has +Y down.
        let quad = [
            Vertex::xy(x0, y0, Color::WHITE, 0.0, 1.0),
            Vertex::xy(x0, y1, Color::WHITE, 0.0, 0.0),
            Vertex::xy(x1, y0, Color::WHITE, 1.0, 1.0),
            Vertex::xy(x1, y1, Color::WHITE, 1.0, 0.0),
        ];
        let drawn = ctx.draw_vertices(&self.shader, Some(&self.target), Topology::TriangleStrip, &quad);
        ctx.pop_state();
        drawn?;
        Ok(())
    }

    /// Releases GPU objects. The device goes with the returned instance.
    pub fn shutdown(self) {
        let Self {
            mut ctx,
            shader,
            target,
            ..
        } = self;
        ctx.destroy_shader(shader);
        ctx.destroy_texture(target);
        drop(ctx.destroy());
        log::info!("studio shut down");
    }
}

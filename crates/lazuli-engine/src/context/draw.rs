//! Draw submission and lazy state application.

use crate::buffer::{Buffer, Vertex};
use crate::coords::{Color, Mat4};
use crate::device::{BufferUsage, Capability, Device, Topology, UniformValue};
use crate::error::Result;
use crate::shader::Shader;
use crate::texture::Texture;

use super::{Context, StreamBuffer};

/// Smallest allocation for the streaming vertex buffer.
const MIN_STREAM_VERTICES: usize = 64;

impl<D: Device> Context<D> {
    /// Clears the active draw destination to `color`.
    ///
    /// Depth is cleared too when the destination has a depth attachment.
    pub fn clear(&mut self, color: Color) {
        let depth = match &self.target {
            Some(t) => t.depth,
            None => self.config.depth,
        };
        self.device.clear(color, depth);
    }

    /// Draws the whole vertex range of `buffer` with its own topology.
    ///
    /// `texture: None` draws with no texture bound.
    pub fn draw_buffer(&mut self, shader: &Shader<D>, texture: Option<&Texture<D>>, buffer: &Buffer<D>) {
        self.draw_range(shader, texture, buffer.handle, buffer.topology, 0, buffer.len);
    }

    /// Draws `vertices` through the context's streaming buffer.
    ///
    /// The streaming buffer grows to the next power of two when `vertices`
    /// does not fit; it is never shrunk.
    pub fn draw_vertices(
        &mut self,
        shader: &Shader<D>,
        texture: Option<&Texture<D>>,
        topology: Topology,
        vertices: &[Vertex],
    ) -> Result<()> {
        if vertices.is_empty() {
            return Ok(());
        }
        let handle = self.ensure_stream(vertices.len())?;
        self.device.update_vertex_buffer(handle, 0, vertices);
        self.draw_range(shader, texture, handle, topology, 0, vertices.len());
        Ok(())
    }

    fn ensure_stream(&mut self, needed: usize) -> Result<D::Buffer> {
        if let Some(stream) = &self.stream {
            if stream.capacity >= needed {
                return Ok(stream.handle);
            }
        }

        let capacity = needed.next_power_of_two().max(MIN_STREAM_VERTICES);
        let result = self.device.create_vertex_buffer(capacity, BufferUsage::Stream);
        let handle = self.record(result)?;
        if let Some(old) = self.stream.replace(StreamBuffer { handle, capacity }) {
            self.device.delete_vertex_buffer(old.handle);
        }
        log::debug!("stream buffer grown to {capacity} vertices");
        Ok(handle)
    }

    fn draw_range(
        &mut self,
        shader: &Shader<D>,
        texture: Option<&Texture<D>>,
        buffer: D::Buffer,
        topology: Topology,
        first: usize,
        count: usize,
    ) {
        if let Some(texture) = texture {
            assert!(
                self.target.is_none_or(|t| t.id != texture.id),
                "texture {:?} is sampled while bound as the render target",
                texture.id
            );
        }

        self.bind_texture(texture);
        self.bind_program(shader);
        self.apply_state(shader);

        let depth_test = self.target.is_some_and(|t| t.depth);
        self.toggle_capabilities(true, depth_test);
        self.device.draw(buffer, topology, first, count);
        self.toggle_capabilities(false, depth_test);
    }

    fn toggle_capabilities(&mut self, enabled: bool, depth_test: bool) {
        self.device.set_capability(Capability::Blend, enabled);
        if self.config.srgb {
            self.device.set_capability(Capability::FramebufferSrgb, enabled);
        }
        if depth_test {
            self.device.set_capability(Capability::DepthTest, enabled);
        }
    }

    /// Issues a state call for every field of the active snapshot that
    /// differs from what the previous draw used.
    ///
    /// Expects `shader` to be bound.
    fn apply_state(&mut self, shader: &Shader<D>) {
        let active = *self.state();
        let prev = self.applied;
        // Matrix uniforms live in the program, so a different shader needs them again.
        let same_shader = self.matrices_shader == Some(shader.id);

        if prev.is_none_or(|p| p.viewport != active.viewport) && !active.viewport.is_degenerate() {
            self.device.set_viewport(active.viewport);
        }
        if prev.is_none_or(|p| p.blend_mode != active.blend_mode) {
            self.device.set_blend_mode(&active.blend_mode);
        }
        if !same_shader || prev.is_none_or(|p| p.transform != active.transform) {
            if let Some(location) = shader.transform_location() {
                self.upload_matrix(location, &active.transform);
            }
        }
        if !same_shader || prev.is_none_or(|p| p.projection != active.projection) {
            if let Some(location) = shader.projection_location() {
                self.upload_matrix(location, &active.projection);
            }
        }
        if prev.is_none_or(|p| p.line_width != active.line_width) {
            self.device.set_line_width(active.line_width);
        }

        self.applied = Some(active);
        self.matrices_shader = Some(shader.id);
    }

    fn upload_matrix(&mut self, location: &D::UniformLocation, matrix: &Mat4) {
        self.device.set_uniform(
            location,
            UniformValue::Matrices {
                dim: 4,
                transpose: self.config.transpose_matrices,
                data: matrix.as_array(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::super::ContextConfig;
    use super::super::tests::{headless, small};
    use crate::coords::Viewport;
    use crate::device::{Call, HeadlessDevice, PixelFormat};
    use crate::shader::{DEFAULT_FRAGMENT_SOURCE, DEFAULT_VERTEX_SOURCE};
    use crate::state::BlendMode;
    use crate::texture::TextureDesc;

    use super::*;

    const TRI: [Vertex; 3] = [Vertex::new([0.0; 3], [1.0; 4], [0.0; 2]); 3];

    fn setup() -> (Context<HeadlessDevice>, Shader<HeadlessDevice>) {
        let mut ctx = headless(small());
        let shader = ctx
            .create_shader(DEFAULT_VERTEX_SOURCE, DEFAULT_FRAGMENT_SOURCE)
            .unwrap();
        (ctx, shader)
    }

    fn state_calls(ctx: &mut Context<HeadlessDevice>) -> Vec<Call> {
        ctx.device_mut()
            .take_calls()
            .into_iter()
            .filter(Call::is_state_change)
            .collect()
    }

    // ── diffing ──────────────────────────────────────────────────────────

    #[test]
    fn first_draw_applies_everything() {
        let (mut ctx, shader) = setup();
        ctx.device_mut().clear_calls();
        ctx.draw_vertices(&shader, None, Topology::Triangles, &TRI).unwrap();

        let calls = state_calls(&mut ctx);
        // viewport, blend, transform, projection, line width
        assert_eq!(calls.len(), 5);
        assert_eq!(calls[0], Call::SetViewport(Viewport::new(0, 0, 640, 480)));
        assert_eq!(calls[1], Call::SetBlendMode(BlendMode::ALPHA));
        assert_eq!(calls[4], Call::SetLineWidth(1.0));
    }

    #[test]
    fn identical_draw_applies_nothing() {
        let (mut ctx, shader) = setup();
        ctx.draw_vertices(&shader, None, Topology::Triangles, &TRI).unwrap();
        ctx.device_mut().clear_calls();

        ctx.draw_vertices(&shader, None, Topology::Triangles, &TRI).unwrap();
        assert!(state_calls(&mut ctx).is_empty());
    }

    #[test]
    fn changed_field_applies_only_that_call() {
        let (mut ctx, shader) = setup();
        ctx.draw_vertices(&shader, None, Topology::Triangles, &TRI).unwrap();
        ctx.device_mut().clear_calls();

        ctx.set_line_width(3.0);
        ctx.draw_vertices(&shader, None, Topology::Triangles, &TRI).unwrap();
        assert_eq!(state_calls(&mut ctx), [Call::SetLineWidth(3.0)]);

        ctx.set_blend_mode(BlendMode::ADDITIVE);
        ctx.draw_vertices(&shader, None, Topology::Triangles, &TRI).unwrap();
        assert_eq!(state_calls(&mut ctx), [Call::SetBlendMode(BlendMode::ADDITIVE)]);
    }

    #[test]
    fn transform_change_uploads_one_matrix() {
        let (mut ctx, shader) = setup();
        ctx.draw_vertices(&shader, None, Topology::Triangles, &TRI).unwrap();
        ctx.device_mut().clear_calls();

        let m = Mat4::translation(5.0, 0.0, 0.0);
        ctx.set_transform(m);
        ctx.draw_vertices(&shader, None, Topology::Triangles, &TRI).unwrap();

        let loc = *shader.transform_location().unwrap();
        assert_eq!(
            state_calls(&mut ctx),
            [Call::SetUniform {
                location: loc,
                ints: vec![],
                floats: m.as_array().to_vec(),
                transpose: false,
            }]
        );
    }

    #[test]
    fn transpose_flag_is_forwarded() {
        let mut ctx = headless(ContextConfig {
            transpose_matrices: true,
            ..small()
        });
        let shader = ctx
            .create_shader(DEFAULT_VERTEX_SOURCE, DEFAULT_FRAGMENT_SOURCE)
            .unwrap();
        ctx.draw_vertices(&shader, None, Topology::Triangles, &TRI).unwrap();
        let transposed = ctx
            .device()
            .count(|c| matches!(c, Call::SetUniform { transpose: true, .. }));
        assert_eq!(transposed, 2);
    }

    #[test]
    fn switching_shader_reuploads_matrices() {
        let (mut ctx, a) = setup();
        let b = ctx
            .create_shader(DEFAULT_VERTEX_SOURCE, DEFAULT_FRAGMENT_SOURCE)
            .unwrap();
        ctx.draw_vertices(&a, None, Topology::Triangles, &TRI).unwrap();
        ctx.device_mut().clear_calls();

        ctx.draw_vertices(&b, None, Topology::Triangles, &TRI).unwrap();
        let uploads = state_calls(&mut ctx)
            .into_iter()
            .filter(|c| matches!(c, Call::SetUniform { .. }))
            .count();
        assert_eq!(uploads, 2);
    }

    #[test]
    fn degenerate_viewport_is_never_applied() {
        let (mut ctx, shader) = setup();
        ctx.set_viewport(Viewport::new(0, 0, 0, 0));
        ctx.draw_vertices(&shader, None, Topology::Triangles, &TRI).unwrap();
        assert_eq!(
            ctx.device().count(|c| matches!(c, Call::SetViewport(_))),
            0
        );
        // Only one side collapsed still counts as a real viewport.
        ctx.set_viewport(Viewport::new(0, 0, 10, 0));
        ctx.draw_vertices(&shader, None, Topology::Triangles, &TRI).unwrap();
        assert_eq!(
            ctx.device().count(|c| matches!(c, Call::SetViewport(_))),
            1
        );
    }

    #[test]
    fn pop_restored_state_is_diffed_against_last_draw() {
        let (mut ctx, shader) = setup();
        ctx.draw_vertices(&shader, None, Topology::Triangles, &TRI).unwrap();

        ctx.push_state();
        ctx.set_viewport(Viewport::new(0, 0, 100, 100));
        ctx.draw_vertices(&shader, None, Topology::Triangles, &TRI).unwrap();
        ctx.pop_state();
        ctx.device_mut().clear_calls();

        ctx.draw_vertices(&shader, None, Topology::Triangles, &TRI).unwrap();
        assert_eq!(
            state_calls(&mut ctx),
            [Call::SetViewport(Viewport::new(0, 0, 640, 480))]
        );
    }

    #[test]
    fn invalidate_forces_full_apply() {
        let (mut ctx, shader) = setup();
        ctx.draw_vertices(&shader, None, Topology::Triangles, &TRI).unwrap();
        ctx.invalidate_state();
        ctx.device_mut().clear_calls();

        ctx.draw_vertices(&shader, None, Topology::Triangles, &TRI).unwrap();
        assert_eq!(state_calls(&mut ctx).len(), 5);
    }

    // ── bindings ─────────────────────────────────────────────────────────

    #[test]
    fn repeated_draw_elides_binds() {
        let (mut ctx, shader) = setup();
        let tex = ctx
            .create_texture(&TextureDesc::new(2, 2, PixelFormat::Rgba8), None)
            .unwrap();
        ctx.bind_shader(&shader);
        ctx.device_mut().clear_calls();

        ctx.draw_vertices(&shader, Some(&tex), Topology::Triangles, &TRI).unwrap();
        ctx.draw_vertices(&shader, Some(&tex), Topology::Triangles, &TRI).unwrap();
        let binds = ctx
            .device()
            .count(|c| matches!(c, Call::BindTexture(_) | Call::UseProgram(_)));
        assert_eq!(binds, 1);

        ctx.draw_vertices(&shader, None, Topology::Triangles, &TRI).unwrap();
        assert!(ctx.device().calls().contains(&Call::BindTexture(None)));
        assert_eq!(ctx.bound_texture(), None);
    }

    // ── buffers ──────────────────────────────────────────────────────────

    #[test]
    fn buffer_draw_uses_its_topology_and_length() {
        let (mut ctx, shader) = setup();
        let mut buf = ctx
            .create_buffer_with_capacity(Topology::LineStrip, 8, &TRI, BufferUsage::Dynamic)
            .unwrap();
        ctx.update_buffer(&mut buf, 0, &TRI[..2]).unwrap();
        ctx.device_mut().clear_calls();

        ctx.draw_buffer(&shader, None, &buf);
        assert!(ctx.device().calls().contains(&Call::Draw {
            buffer: buf.handle(),
            topology: Topology::LineStrip,
            first: 0,
            count: 2,
        }));
    }

    #[test]
    fn stream_buffer_grows_by_powers_of_two() {
        let (mut ctx, shader) = setup();
        let few = vec![Vertex::default(); 10];
        let many = vec![Vertex::default(); 100];

        ctx.draw_vertices(&shader, None, Topology::Points, &few).unwrap();
        ctx.draw_vertices(&shader, None, Topology::Points, &few).unwrap();
        ctx.draw_vertices(&shader, None, Topology::Points, &many).unwrap();

        let sizes: Vec<usize> = ctx
            .device()
            .calls()
            .iter()
            .filter_map(|c| match c {
                Call::CreateVertexBuffer { capacity, .. } => Some(*capacity),
                _ => None,
            })
            .collect();
        assert_eq!(sizes, [64, 128]);
        assert_eq!(
            ctx.device().count(|c| matches!(c, Call::DeleteVertexBuffer(_))),
            1
        );
    }

    #[test]
    fn empty_vertex_slice_draws_nothing() {
        let (mut ctx, shader) = setup();
        ctx.device_mut().clear_calls();
        ctx.draw_vertices(&shader, None, Topology::Triangles, &[]).unwrap();
        assert!(ctx.device().calls().is_empty());
    }

    // ── capabilities ─────────────────────────────────────────────────────

    #[test]
    fn blending_is_enabled_only_around_the_draw() {
        let mut ctx = headless(ContextConfig {
            srgb: true,
            ..small()
        });
        let shader = ctx
            .create_shader(DEFAULT_VERTEX_SOURCE, DEFAULT_FRAGMENT_SOURCE)
            .unwrap();
        ctx.device_mut().clear_calls();
        ctx.draw_vertices(&shader, None, Topology::Triangles, &TRI).unwrap();

        let calls = ctx.device().calls();
        let draw = calls
            .iter()
            .position(|c| matches!(c, Call::Draw { .. }))
            .unwrap();
        assert!(calls[..draw].contains(&Call::SetCapability(Capability::Blend, true)));
        assert!(calls[..draw].contains(&Call::SetCapability(Capability::FramebufferSrgb, true)));
        assert!(calls[draw..].contains(&Call::SetCapability(Capability::Blend, false)));
        assert!(!calls.contains(&Call::SetCapability(Capability::DepthTest, true)));
    }

    #[test]
    fn clear_targets_depth_when_configured() {
        let mut ctx = headless(ContextConfig {
            depth: true,
            ..small()
        });
        ctx.clear(Color::BLACK);
        assert_eq!(
            ctx.device().calls(),
            &[Call::Clear {
                color: Color::BLACK,
                depth: true
            }]
        );
    }
}

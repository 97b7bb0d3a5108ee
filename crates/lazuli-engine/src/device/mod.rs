//! Boundary with the underlying immediate-mode rasterization API.
//!
//! The engine never talks to GL directly; everything goes through [`Device`].
//! Backends:
//! - [`GlowDevice`] (feature `glow`): OpenGL 3.3 core / GLES 3.0 through `glow`
//! - [`HeadlessDevice`]: no GPU; records calls and simulates objects, used by
//!   tests and tooling

mod headless;
mod types;

#[cfg(feature = "glow")]
mod gl;

use std::fmt::Debug;

use crate::buffer::Vertex;
use crate::coords::{Color, Viewport};
use crate::error::Result;
use crate::state::BlendMode;
use crate::texture::TextureDesc;

pub use headless::{Call, HEADLESS_LIMITS, HeadlessDevice};
pub use types::{
    ActiveUniform, Attachment, BufferUsage, Capability, DeviceLimits, Filter, FramebufferStatus,
    PixelFormat, ProgramSource, RenderbufferFormat, Topology, UniformType, UniformValue, Wrap,
};

#[cfg(feature = "glow")]
pub use gl::GlowDevice;

/// Low-level rasterization API the engine drives.
///
/// Implementations are thin: no caching, no redundancy elimination. The
/// engine's diffing and binding logic decides *when* each method is called.
///
/// Object creation returns `Err` for recoverable failures (compile/link errors,
/// allocation failure). Deleting, binding and attaching take handles the engine
/// got from this same device.
pub trait Device {
    type Program: Copy + Eq + Debug;
    type Texture: Copy + Eq + Debug;
    type Framebuffer: Copy + Eq + Debug;
    type Renderbuffer: Copy + Eq + Debug;
    type Buffer: Copy + Eq + Debug;
    type UniformLocation: Clone + Debug;

    fn limits(&self) -> DeviceLimits;

    // ── programs ──────────────────────────────────────────────────────────

    /// Compiles and links a program. Vertex attributes are bound to the slots
    /// listed in [`Vertex::ATTRIBUTES`] before linking.
    fn create_program(&mut self, source: &ProgramSource<'_>) -> Result<Self::Program>;
    fn delete_program(&mut self, program: Self::Program);
    fn use_program(&mut self, program: Option<Self::Program>);
    fn active_uniforms(&mut self, program: Self::Program) -> Vec<ActiveUniform>;
    fn uniform_location(
        &mut self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation>;
    /// Writes a uniform of the program currently in use.
    fn set_uniform(&mut self, location: &Self::UniformLocation, value: UniformValue<'_>);

    // ── textures ──────────────────────────────────────────────────────────

    fn create_texture(&mut self, desc: &TextureDesc, pixels: Option<&[u8]>)
    -> Result<Self::Texture>;
    fn create_depth_texture(&mut self, width: u32, height: u32) -> Result<Self::Texture>;
    #[allow(clippy::too_many_arguments)]
    fn update_texture(
        &mut self,
        texture: Self::Texture,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        format: PixelFormat,
        pixels: &[u8],
    );
    fn generate_mipmaps(&mut self, texture: Self::Texture);
    /// Switches `texture` to the mip-sampling variant of `filter` for minification.
    fn set_mip_filter(&mut self, texture: Self::Texture, filter: Filter);
    fn delete_texture(&mut self, texture: Self::Texture);
    fn bind_texture(&mut self, texture: Option<Self::Texture>);

    // ── framebuffers ──────────────────────────────────────────────────────

    fn create_framebuffer(&mut self) -> Result<Self::Framebuffer>;
    fn delete_framebuffer(&mut self, framebuffer: Self::Framebuffer);
    /// Binds `framebuffer` as draw destination; `None` selects the drawable surface.
    fn bind_framebuffer(&mut self, framebuffer: Option<Self::Framebuffer>);
    fn attach_texture(
        &mut self,
        framebuffer: Self::Framebuffer,
        attachment: Attachment,
        texture: Self::Texture,
    );
    fn create_renderbuffer(
        &mut self,
        format: RenderbufferFormat,
        samples: u32,
        width: u32,
        height: u32,
    ) -> Result<Self::Renderbuffer>;
    fn delete_renderbuffer(&mut self, renderbuffer: Self::Renderbuffer);
    fn attach_renderbuffer(
        &mut self,
        framebuffer: Self::Framebuffer,
        attachment: Attachment,
        renderbuffer: Self::Renderbuffer,
    );
    fn framebuffer_status(&mut self, framebuffer: Self::Framebuffer) -> FramebufferStatus;
    /// Copies the color channel of `src` into `dst` (linear filter, same size).
    fn resolve(&mut self, src: Self::Framebuffer, dst: Self::Framebuffer, width: u32, height: u32);

    // ── global state ──────────────────────────────────────────────────────

    fn set_viewport(&mut self, viewport: Viewport);
    fn set_blend_mode(&mut self, mode: &BlendMode);
    fn set_line_width(&mut self, width: f32);
    fn set_capability(&mut self, capability: Capability, enabled: bool);
    /// Clears the bound draw destination's color (and depth when `depth`).
    fn clear(&mut self, color: Color, depth: bool);

    // ── vertex storage ────────────────────────────────────────────────────

    /// Allocates storage for `capacity` vertices.
    fn create_vertex_buffer(&mut self, capacity: usize, usage: BufferUsage)
    -> Result<Self::Buffer>;
    /// Writes `vertices` starting at vertex index `offset`.
    fn update_vertex_buffer(&mut self, buffer: Self::Buffer, offset: usize, vertices: &[Vertex]);
    fn delete_vertex_buffer(&mut self, buffer: Self::Buffer);
    fn draw(&mut self, buffer: Self::Buffer, topology: Topology, first: usize, count: usize);

    /// Returns and clears the device's sticky error, if any.
    fn take_error(&mut self) -> Option<u32>;
}

//! Geometry and color value types shared by the state stack and the backends.
//!
//! Conventions:
//! - Viewports are in framebuffer pixels, origin bottom-left (GL convention).
//! - Matrices are column-major `[f32; 16]`, uploaded as-is unless the context
//!   is configured to transpose.

mod color;
mod mat4;
mod viewport;

pub use color::Color;
pub use mat4::Mat4;
pub use viewport::Viewport;

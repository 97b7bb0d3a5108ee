//! Lazuli engine crate.
//!
//! Render-state and GPU resource management over an immediate-mode
//! rasterization API: a bounded stack of state snapshots, lazy application of
//! only the fields that changed since the previous draw, identity-based
//! shader/texture binding, render-target textures with multisample resolve,
//! and a hashed uniform table per shader.
//!
//! The API itself sits behind [`device::Device`]; [`device::GlowDevice`]
//! drives OpenGL and [`device::HeadlessDevice`] runs without a GPU.

pub mod coords;
pub mod device;
pub mod logging;
pub mod shader;
pub mod state;

mod buffer;
mod context;
mod error;
mod hash;
mod id;
mod instance;
mod texture;

pub use buffer::{Buffer, Vertex, VertexAttribute};
pub use context::{Context, ContextConfig};
pub use error::{Error, ErrorCode, Result, ShaderStage};
pub use hash::{fnv1a, fnv1a_str};
pub use id::ResourceId;
pub use instance::{Instance, init};
pub use shader::Shader;
pub use texture::{Texture, TextureDesc};

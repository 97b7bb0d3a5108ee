//! Linked programs and their uniform tables.

mod glsl;
mod uniform;

use std::fmt;

use crate::device::Device;
use crate::id::ResourceId;

pub use glsl::{DEFAULT_FRAGMENT_SOURCE, DEFAULT_VERTEX_SOURCE};
pub use uniform::{Uniform, UniformCache};

/// Uniform the engine writes the snapshot's transform matrix to.
pub const TRANSFORM_UNIFORM: &str = "u_transform";
/// Uniform the engine writes the snapshot's projection matrix to.
pub const PROJECTION_UNIFORM: &str = "u_projection";
/// Sampler set to texture unit 0 at creation, when present.
pub const TEXTURE_UNIFORM: &str = "u_texture";

/// A linked program plus its uniform table, built once at creation.
pub struct Shader<D: Device> {
    pub(crate) id: ResourceId,
    pub(crate) program: D::Program,
    pub(crate) uniforms: UniformCache<D::UniformLocation>,
}

impl<D: Device> Shader<D> {
    #[inline]
    pub fn id(&self) -> ResourceId {
        self.id
    }

    #[inline]
    pub fn program(&self) -> D::Program {
        self.program
    }

    #[inline]
    pub fn uniforms(&self) -> &UniformCache<D::UniformLocation> {
        &self.uniforms
    }

    #[inline]
    pub fn has_uniform(&self, name: &str) -> bool {
        self.uniforms.find(name).is_some()
    }

    pub(crate) fn transform_location(&self) -> Option<&D::UniformLocation> {
        self.uniforms.find(TRANSFORM_UNIFORM).map(Uniform::location)
    }

    pub(crate) fn projection_location(&self) -> Option<&D::UniformLocation> {
        self.uniforms.find(PROJECTION_UNIFORM).map(Uniform::location)
    }
}

impl<D: Device> fmt::Debug for Shader<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shader")
            .field("id", &self.id)
            .field("program", &self.program)
            .field("uniforms", &self.uniforms.len())
            .finish()
    }
}

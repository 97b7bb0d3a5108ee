/// Construction parameters for a [`Context`](super::Context).
///
/// All capacities are fixed for the lifetime of the context; nothing on the
/// draw path allocates beyond them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextConfig {
    /// Drawable width in pixels (the default framebuffer's viewport).
    pub width: u32,

    /// Drawable height in pixels.
    pub height: u32,

    /// Multisample count for render-target textures; `0` disables MSAA.
    ///
    /// Clamped to the device maximum when targets are created.
    pub samples: u32,

    /// Give render-target textures a depth attachment.
    pub depth: bool,

    /// Store color textures as sRGB and enable sRGB framebuffer writes while drawing.
    pub srgb: bool,

    /// Upload matrices with the transpose flag set (row-major shaders).
    pub transpose_matrices: bool,

    /// Saved snapshots per state stack.
    pub stack_depth: usize,

    /// Active uniforms allowed per shader.
    pub max_uniforms: usize,

    /// Longest accepted uniform name, in bytes.
    pub max_uniform_name_len: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            samples: 0,
            depth: false,
            srgb: false,
            transpose_matrices: false,
            stack_depth: 32,
            max_uniforms: 32,
            max_uniform_name_len: 64,
        }
    }
}

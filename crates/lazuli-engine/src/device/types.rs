/// Device limits queried once at [`init`](crate::init).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DeviceLimits {
    /// Largest supported texture edge, in pixels.
    pub max_texture_size: u32,
    /// Largest supported multisample count; `0` when MSAA is unavailable.
    pub max_samples: u32,
}

/// Pixel layout of texture data (8 bits per channel).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PixelFormat {
    R8,
    Rg8,
    Rgb8,
    Rgba8,
}

impl PixelFormat {
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::R8 => 1,
            PixelFormat::Rg8 => 2,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }

    /// Whether an sRGB-encoded storage variant exists for this layout.
    #[inline]
    pub const fn has_srgb_variant(self) -> bool {
        matches!(self, PixelFormat::Rgb8 | PixelFormat::Rgba8)
    }
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum Filter {
    Nearest,
    #[default]
    Linear,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum Wrap {
    #[default]
    ClampToEdge,
    Repeat,
    MirroredRepeat,
}

/// Primitive assembly mode for non-indexed draws.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Topology {
    Points,
    Lines,
    LineStrip,
    LineLoop,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

/// Update-frequency hint for vertex storage.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum BufferUsage {
    #[default]
    Static,
    Dynamic,
    Stream,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Attachment {
    Color0,
    Depth,
}

/// Storage format of a (possibly multisampled) renderbuffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum RenderbufferFormat {
    R8,
    Rg8,
    Rgb8,
    Srgb8,
    Rgba8,
    Srgb8Alpha8,
    Depth24,
}

impl RenderbufferFormat {
    /// Color storage matching a texture of `format`, so a resolve blit copies
    /// between identical formats.
    #[inline]
    pub const fn color(format: PixelFormat, srgb: bool) -> Self {
        match (format, srgb) {
            (PixelFormat::R8, _) => RenderbufferFormat::R8,
            (PixelFormat::Rg8, _) => RenderbufferFormat::Rg8,
            (PixelFormat::Rgb8, false) => RenderbufferFormat::Rgb8,
            (PixelFormat::Rgb8, true) => RenderbufferFormat::Srgb8,
            (PixelFormat::Rgba8, false) => RenderbufferFormat::Rgba8,
            (PixelFormat::Rgba8, true) => RenderbufferFormat::Srgb8Alpha8,
        }
    }
}

/// Global toggles the engine flips around each draw.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Capability {
    Blend,
    DepthTest,
    FramebufferSrgb,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FramebufferStatus {
    Complete,
    /// Backend-specific status code.
    Incomplete(u32),
}

/// Type tag of an active uniform as reported by program introspection.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum UniformType {
    Bool,
    Int,
    IVec2,
    IVec3,
    IVec4,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
    Sampler2D,
    /// Anything the engine has no dedicated setter for (native enumerant).
    Other(u32),
}

/// One active uniform reported by the device after linking.
///
/// Array uniforms are reported once, without the `[0]` suffix, with `size` set
/// to the element count.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ActiveUniform {
    pub name: String,
    pub size: i32,
    pub ty: UniformType,
}

/// Borrowed uniform payload.
///
/// `components` is the vector width (1-4) and `dim` the square matrix size
/// (2-4); `data` may hold several elements for array uniforms.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue<'a> {
    Ints { components: u8, data: &'a [i32] },
    Floats { components: u8, data: &'a [f32] },
    Matrices { dim: u8, transpose: bool, data: &'a [f32] },
}

/// GLSL sources for one program.
#[derive(Debug, Copy, Clone)]
pub struct ProgramSource<'a> {
    pub vertex: &'a str,
    pub fragment: &'a str,
}

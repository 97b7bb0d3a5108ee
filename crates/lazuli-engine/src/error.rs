use std::fmt;

/// Shader pipeline stage, used in compile diagnostics.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Recoverable engine faults.
///
/// Every fallible [`Context`](crate::Context) operation returns one of these and
/// also keeps a copy as the context's sticky last error.
///
/// Programmer errors (state stack overflow/underflow, binding a plain texture as
/// a render target) are not represented here; they panic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid texture dimensions {width}x{height} (device maximum {max})")]
    InvalidDimensions { width: u32, height: u32, max: u32 },

    #[error(
        "region {width}x{height} at ({x}, {y}) exceeds texture extent {texture_width}x{texture_height}"
    )]
    RegionOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        texture_width: u32,
        texture_height: u32,
    },

    #[error("pixel data is {actual} bytes, expected {expected}")]
    InvalidPixelData { expected: usize, actual: usize },

    #[error("{stage} shader failed to compile: {log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("program failed to link: {0}")]
    ProgramLink(String),

    #[error("framebuffer incomplete (status {0:#06x})")]
    FramebufferIncomplete(u32),

    #[error("shader exposes more than {limit} active uniforms")]
    TooManyUniforms { limit: usize },

    #[error("uniform name `{name}` exceeds {limit} bytes")]
    UniformNameTooLong { name: String, limit: usize },

    #[error("out of memory allocating {0}")]
    OutOfMemory(&'static str),

    #[error("vertex range {offset}..{end} exceeds buffer capacity {capacity}")]
    BufferOverflow { offset: usize, end: usize, capacity: usize },

    #[error("device reported error {0:#06x}")]
    Device(u32),

    #[error("unsupported device: {0}")]
    Unsupported(String),
}

/// Payload-free discriminant of [`Error`], convenient for diagnostics and matching.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ErrorCode {
    InvalidDimensions,
    RegionOutOfBounds,
    InvalidPixelData,
    ShaderCompile,
    ProgramLink,
    FramebufferIncomplete,
    TooManyUniforms,
    UniformNameTooLong,
    OutOfMemory,
    BufferOverflow,
    Device,
    Unsupported,
}

impl Error {
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::InvalidDimensions { .. } => ErrorCode::InvalidDimensions,
            Error::RegionOutOfBounds { .. } => ErrorCode::RegionOutOfBounds,
            Error::InvalidPixelData { .. } => ErrorCode::InvalidPixelData,
            Error::ShaderCompile { .. } => ErrorCode::ShaderCompile,
            Error::ProgramLink(_) => ErrorCode::ProgramLink,
            Error::FramebufferIncomplete(_) => ErrorCode::FramebufferIncomplete,
            Error::TooManyUniforms { .. } => ErrorCode::TooManyUniforms,
            Error::UniformNameTooLong { .. } => ErrorCode::UniformNameTooLong,
            Error::OutOfMemory(_) => ErrorCode::OutOfMemory,
            Error::BufferOverflow { .. } => ErrorCode::BufferOverflow,
            Error::Device(_) => ErrorCode::Device,
            Error::Unsupported(_) => ErrorCode::Unsupported,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

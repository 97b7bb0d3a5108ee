use std::fmt;

use crate::device::{Device, Filter, PixelFormat, Wrap};
use crate::id::ResourceId;

/// Creation parameters for a texture.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub filter: Filter,
    pub wrap: Wrap,
    /// Generate a mip chain after the initial upload. Ignored for render targets.
    pub mipmaps: bool,
    /// Store as sRGB. Forced on for RGB/RGBA formats when the context is sRGB.
    pub srgb: bool,
}

impl TextureDesc {
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
            filter: Filter::default(),
            wrap: Wrap::default(),
            mipmaps: false,
            srgb: false,
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_wrap(mut self, wrap: Wrap) -> Self {
        self.wrap = wrap;
        self
    }

    pub fn with_mipmaps(mut self, mipmaps: bool) -> Self {
        self.mipmaps = mipmaps;
        self
    }

    /// Size in bytes of a full upload for this description.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }
}

/// Sampled image, optionally usable as a draw destination.
///
/// A texture is a render target only if it was created through
/// [`Context::create_target_texture`](crate::Context::create_target_texture).
pub struct Texture<D: Device> {
    pub(crate) id: ResourceId,
    pub(crate) handle: D::Texture,
    pub(crate) desc: TextureDesc,
    pub(crate) mipmapped: bool,
    pub(crate) target: Option<TargetAttachments<D>>,
}

/// Framebuffer graph owned by a render-target texture.
pub(crate) struct TargetAttachments<D: Device> {
    pub(crate) framebuffer: D::Framebuffer,
    pub(crate) depth: Option<D::Texture>,
    pub(crate) msaa: Option<Multisample<D>>,
}

pub(crate) struct Multisample<D: Device> {
    pub(crate) framebuffer: D::Framebuffer,
    pub(crate) color: D::Renderbuffer,
    pub(crate) depth: Option<D::Renderbuffer>,
    pub(crate) samples: u32,
}

/// What the context needs to remember about the bound render target.
pub(crate) struct TargetBinding<D: Device> {
    pub(crate) id: ResourceId,
    pub(crate) framebuffer: D::Framebuffer,
    pub(crate) msaa_framebuffer: Option<D::Framebuffer>,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) depth: bool,
}

impl<D: Device> TargetBinding<D> {
    /// Framebuffer draws go to while this target is bound.
    #[inline]
    pub(crate) fn draw_framebuffer(&self) -> D::Framebuffer {
        self.msaa_framebuffer.unwrap_or(self.framebuffer)
    }
}

impl<D: Device> Clone for TargetBinding<D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D: Device> Copy for TargetBinding<D> {}

impl<D: Device> Texture<D> {
    #[inline]
    pub fn id(&self) -> ResourceId {
        self.id
    }

    #[inline]
    pub fn handle(&self) -> D::Texture {
        self.handle
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.desc.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.desc.height
    }

    #[inline]
    pub fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.desc.format
    }

    #[inline]
    pub fn has_mipmaps(&self) -> bool {
        self.mipmapped
    }

    #[inline]
    pub fn is_render_target(&self) -> bool {
        self.target.is_some()
    }

    /// Whether a depth attachment was allocated (render targets only).
    pub fn has_depth(&self) -> bool {
        self.target.as_ref().is_some_and(|t| t.depth.is_some())
    }

    /// Multisample count of the draw framebuffer; `0` when not multisampled.
    pub fn samples(&self) -> u32 {
        self.target
            .as_ref()
            .and_then(|t| t.msaa.as_ref())
            .map_or(0, |m| m.samples)
    }

    pub(crate) fn binding(&self) -> Option<TargetBinding<D>> {
        let target = self.target.as_ref()?;
        Some(TargetBinding {
            id: self.id,
            framebuffer: target.framebuffer,
            msaa_framebuffer: target.msaa.as_ref().map(|m| m.framebuffer),
            width: self.desc.width,
            height: self.desc.height,
            depth: target.depth.is_some(),
        })
    }
}

impl<D: Device> fmt::Debug for Texture<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("id", &self.id)
            .field("handle", &self.handle)
            .field("desc", &self.desc)
            .field("render_target", &self.is_render_target())
            .field("samples", &self.samples())
            .finish()
    }
}

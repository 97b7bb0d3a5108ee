//! Shader, texture and buffer lifecycle plus identity-based binding.

use crate::buffer::{Buffer, Vertex};
use crate::device::{BufferUsage, Device, ProgramSource, Topology, UniformValue};
use crate::error::{Error, Result};
use crate::shader::{Shader, TEXTURE_UNIFORM, UniformCache};
use crate::texture::{Texture, TextureDesc};

use super::Context;

impl<D: Device> Context<D> {
    // ── shaders ───────────────────────────────────────────────────────────

    /// Compiles and links a program and builds its uniform table.
    ///
    /// A `u_texture` sampler, when present, is pointed at texture unit 0.
    pub fn create_shader(&mut self, vertex: &str, fragment: &str) -> Result<Shader<D>> {
        let result = self.build_shader(&ProgramSource { vertex, fragment });
        self.record(result)
    }

    fn build_shader(&mut self, source: &ProgramSource<'_>) -> Result<Shader<D>> {
        let program = self.device.create_program(source)?;

        let uniforms = match self.introspect(program) {
            Ok(uniforms) => uniforms,
            Err(err) => {
                self.device.delete_program(program);
                return Err(err);
            }
        };

        let shader = Shader {
            id: self.ids.next(),
            program,
            uniforms,
        };

        if shader.has_uniform(TEXTURE_UNIFORM) {
            self.set_uniform(
                &shader,
                TEXTURE_UNIFORM,
                UniformValue::Ints {
                    components: 1,
                    data: &[0],
                },
            );
        }

        log::debug!(
            "shader {:?} created with {} uniforms",
            shader.id,
            shader.uniforms.len()
        );
        Ok(shader)
    }

    fn introspect(&mut self, program: D::Program) -> Result<UniformCache<D::UniformLocation>> {
        let mut cache = UniformCache::new(self.config.max_uniforms, self.config.max_uniform_name_len);
        for uniform in self.device.active_uniforms(program) {
            // Built-ins (gl_*) have no location.
            let Some(location) = self.device.uniform_location(program, &uniform.name) else {
                continue;
            };
            cache.insert(&uniform.name, uniform.size, uniform.ty, location)?;
        }
        Ok(cache)
    }

    /// Makes `shader` the active program. No-op when it already is.
    pub fn bind_shader(&mut self, shader: &Shader<D>) {
        self.bind_program(shader);
    }

    /// Returns `true` when a device bind was issued.
    pub(crate) fn bind_program(&mut self, shader: &Shader<D>) -> bool {
        if self.bound_shader.is_some_and(|(id, _)| id == shader.id) {
            return false;
        }
        self.device.use_program(Some(shader.program));
        self.bound_shader = Some((shader.id, shader.program));
        true
    }

    /// Deletes the program, unbinding it first if it is active.
    pub fn destroy_shader(&mut self, shader: Shader<D>) {
        if self.bound_shader.is_some_and(|(id, _)| id == shader.id) {
            self.device.use_program(None);
            self.bound_shader = None;
        }
        if self.matrices_shader == Some(shader.id) {
            self.matrices_shader = None;
        }
        self.device.delete_program(shader.program);
        log::debug!("shader {:?} destroyed", shader.id);
    }

    // ── textures ──────────────────────────────────────────────────────────

    /// Checks size limits and applies context-wide storage policy.
    pub(crate) fn prepare_desc(&self, desc: &TextureDesc) -> Result<TextureDesc> {
        let max = self.limits.max_texture_size;
        if desc.width == 0 || desc.height == 0 || desc.width > max || desc.height > max {
            return Err(Error::InvalidDimensions {
                width: desc.width,
                height: desc.height,
                max,
            });
        }

        let mut desc = *desc;
        if self.config.srgb && desc.format.has_srgb_variant() {
            desc.srgb = true;
        }
        Ok(desc)
    }

    /// Creates a sampled (non-target) texture, optionally uploading `pixels`.
    ///
    /// `pixels` must hold exactly `width * height * bytes_per_pixel` bytes.
    pub fn create_texture(
        &mut self,
        desc: &TextureDesc,
        pixels: Option<&[u8]>,
    ) -> Result<Texture<D>> {
        let result = self.build_texture(desc, pixels);
        self.record(result)
    }

    fn build_texture(&mut self, desc: &TextureDesc, pixels: Option<&[u8]>) -> Result<Texture<D>> {
        let desc = self.prepare_desc(desc)?;
        if let Some(pixels) = pixels {
            check_pixels(desc.byte_len(), pixels)?;
        }

        let handle = self.device.create_texture(&desc, pixels)?;
        if desc.mipmaps {
            self.device.generate_mipmaps(handle);
        }

        let texture = Texture {
            id: self.ids.next(),
            handle,
            desc,
            mipmapped: desc.mipmaps,
            target: None,
        };
        log::debug!(
            "texture {:?} created ({}x{} {:?})",
            texture.id,
            desc.width,
            desc.height,
            desc.format
        );
        Ok(texture)
    }

    /// Replaces a `width` x `height` region at (`x`, `y`) with `pixels`, in the
    /// texture's own format. Mipmaps are regenerated if the texture has them.
    pub fn update_texture(
        &mut self,
        texture: &Texture<D>,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<()> {
        let result = self.write_texture(texture, x, y, width, height, pixels);
        self.record(result)
    }

    fn write_texture(
        &mut self,
        texture: &Texture<D>,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<()> {
        let fits_x = x.checked_add(width).is_some_and(|r| r <= texture.width());
        let fits_y = y.checked_add(height).is_some_and(|b| b <= texture.height());
        if width == 0 || height == 0 || !fits_x || !fits_y {
            return Err(Error::RegionOutOfBounds {
                x,
                y,
                width,
                height,
                texture_width: texture.width(),
                texture_height: texture.height(),
            });
        }

        let format = texture.format();
        check_pixels(
            width as usize * height as usize * format.bytes_per_pixel(),
            pixels,
        )?;

        self.device
            .update_texture(texture.handle, x, y, width, height, format, pixels);
        if texture.mipmapped {
            self.device.generate_mipmaps(texture.handle);
        }
        Ok(())
    }

    /// Builds the mip chain from level 0 and switches minification to sample it.
    ///
    /// Later [`update_texture`](Self::update_texture) calls keep the chain current.
    ///
    /// # Panics
    /// Panics if `texture` is a render target.
    pub fn generate_mipmaps(&mut self, texture: &mut Texture<D>) {
        assert!(
            !texture.is_render_target(),
            "texture {:?} is a render target and cannot carry mipmaps",
            texture.id
        );
        if !texture.mipmapped {
            self.device.set_mip_filter(texture.handle, texture.desc.filter);
            texture.desc.mipmaps = true;
            texture.mipmapped = true;
        }
        self.device.generate_mipmaps(texture.handle);
    }

    /// Binds `texture` (or nothing) to unit 0. No-op when already bound.
    pub fn bind_texture(&mut self, texture: Option<&Texture<D>>) {
        let wanted = texture.map(|t| (t.id, t.handle));
        if self.bound_texture.map(|(id, _)| id) == wanted.map(|(id, _)| id) {
            return;
        }
        self.device.bind_texture(wanted.map(|(_, handle)| handle));
        self.bound_texture = wanted;
    }

    /// Releases the image and every attachment allocated for it.
    ///
    /// Destroying the bound render target falls back to the drawable surface
    /// without resolving.
    pub fn destroy_texture(&mut self, texture: Texture<D>) {
        if self.target.is_some_and(|t| t.id == texture.id) {
            self.target = None;
            self.device.bind_framebuffer(None);
            self.invalidate_state();
        }
        if self.bound_texture.is_some_and(|(id, _)| id == texture.id) {
            self.device.bind_texture(None);
            self.bound_texture = None;
        }

        if let Some(target) = texture.target {
            if let Some(msaa) = target.msaa {
                if let Some(depth) = msaa.depth {
                    self.device.delete_renderbuffer(depth);
                }
                self.device.delete_renderbuffer(msaa.color);
                self.device.delete_framebuffer(msaa.framebuffer);
            }
            if let Some(depth) = target.depth {
                self.device.delete_texture(depth);
            }
            self.device.delete_framebuffer(target.framebuffer);
        }
        self.device.delete_texture(texture.handle);
        log::debug!("texture {:?} destroyed", texture.id);
    }

    // ── buffers ───────────────────────────────────────────────────────────

    /// Creates a buffer sized exactly for `vertices`.
    pub fn create_buffer(
        &mut self,
        topology: Topology,
        vertices: &[Vertex],
        usage: BufferUsage,
    ) -> Result<Buffer<D>> {
        self.create_buffer_with_capacity(topology, vertices.len(), vertices, usage)
    }

    /// Creates a buffer with room for `capacity` vertices (at least
    /// `vertices.len()`) and uploads `vertices` at the start.
    pub fn create_buffer_with_capacity(
        &mut self,
        topology: Topology,
        capacity: usize,
        vertices: &[Vertex],
        usage: BufferUsage,
    ) -> Result<Buffer<D>> {
        let capacity = capacity.max(vertices.len());
        let result = self.device.create_vertex_buffer(capacity, usage);
        let handle = self.record(result)?;
        if !vertices.is_empty() {
            self.device.update_vertex_buffer(handle, 0, vertices);
        }

        let buffer = Buffer {
            id: self.ids.next(),
            handle,
            topology,
            usage,
            len: vertices.len(),
            capacity,
        };
        log::debug!("buffer {:?} created ({capacity} vertices)", buffer.id);
        Ok(buffer)
    }

    /// Writes `vertices` at vertex index `offset`.
    ///
    /// The drawn range becomes `0..offset + vertices.len()`, so an update can
    /// shrink it; the allocation itself never changes.
    pub fn update_buffer(
        &mut self,
        buffer: &mut Buffer<D>,
        offset: usize,
        vertices: &[Vertex],
    ) -> Result<()> {
        let end = offset.saturating_add(vertices.len());
        if end > buffer.capacity {
            return self.record(Err(Error::BufferOverflow {
                offset,
                end,
                capacity: buffer.capacity,
            }));
        }

        if !vertices.is_empty() {
            self.device.update_vertex_buffer(buffer.handle, offset, vertices);
        }
        buffer.len = end;
        Ok(())
    }

    pub fn destroy_buffer(&mut self, buffer: Buffer<D>) {
        self.device.delete_vertex_buffer(buffer.handle);
        log::debug!("buffer {:?} destroyed", buffer.id);
    }
}

fn check_pixels(expected: usize, pixels: &[u8]) -> Result<()> {
    if pixels.len() != expected {
        return Err(Error::InvalidPixelData {
            expected,
            actual: pixels.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::ContextConfig;
    use super::super::tests::{headless, small};
    use crate::device::{Call, Filter, PixelFormat};
    use crate::error::{ErrorCode, ShaderStage};
    use crate::shader::{DEFAULT_FRAGMENT_SOURCE, DEFAULT_VERTEX_SOURCE};

    use super::*;

    const VS: &str = "uniform mat4 u_transform; uniform mat4 u_projection; void main() {}";
    const FS: &str = "uniform sampler2D u_texture; uniform vec4 u_bar; void main() {}";

    #[test]
    fn shader_uniform_table_is_built_at_creation() {
        let mut ctx = headless(small());
        let shader = ctx.create_shader(VS, FS).unwrap();

        assert_eq!(shader.uniforms().len(), 4);
        assert!(shader.has_uniform("u_transform"));
        assert!(shader.has_uniform("u_bar"));
        assert!(shader.transform_location().is_some());
        assert!(shader.projection_location().is_some());
    }

    #[test]
    fn sampler_is_pointed_at_unit_zero() {
        let mut ctx = headless(small());
        let shader = ctx.create_shader(VS, FS).unwrap();
        let loc = *shader.uniforms().find("u_texture").unwrap().location();

        assert!(ctx.device().calls().contains(&Call::SetUniform {
            location: loc,
            ints: vec![0],
            floats: vec![],
            transpose: false,
        }));
    }

    #[test]
    fn compile_failure_is_returned_and_recorded() {
        let mut ctx = headless(small());
        let err = ctx.create_shader("", FS).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ShaderCompile);
        assert!(matches!(
            ctx.last_error(),
            Some(Error::ShaderCompile {
                stage: ShaderStage::Vertex,
                ..
            })
        ));
    }

    #[test]
    fn uniform_overflow_fails_creation_without_leaking() {
        let mut ctx = headless(ContextConfig {
            max_uniforms: 2,
            ..small()
        });
        let err = ctx.create_shader(VS, FS).unwrap_err();
        assert_eq!(err, Error::TooManyUniforms { limit: 2 });
        assert_eq!(ctx.last_error(), Some(&err));
        assert_eq!(ctx.device().live_objects(), 0);
    }

    #[test]
    fn long_uniform_name_fails_creation() {
        let mut ctx = headless(ContextConfig {
            max_uniform_name_len: 8,
            ..small()
        });
        let err = ctx.create_shader(VS, FS).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UniformNameTooLong);
        assert_eq!(ctx.device().live_objects(), 0);
    }

    #[test]
    fn binding_same_shader_twice_binds_once() {
        let mut ctx = headless(small());
        let a = ctx.create_shader(VS, FS).unwrap();
        let b = ctx.create_shader(DEFAULT_VERTEX_SOURCE, DEFAULT_FRAGMENT_SOURCE).unwrap();
        ctx.device_mut().clear_calls();

        ctx.bind_shader(&a);
        ctx.bind_shader(&a);
        ctx.bind_shader(&b);
        ctx.bind_shader(&b);

        let uses = ctx.device().count(|c| matches!(c, Call::UseProgram(_)));
        assert_eq!(uses, 2);
        assert_eq!(ctx.bound_shader(), Some(b.id()));
    }

    #[test]
    fn destroying_bound_shader_unbinds_it() {
        let mut ctx = headless(small());
        let shader = ctx.create_shader(VS, FS).unwrap();
        ctx.bind_shader(&shader);
        ctx.destroy_shader(shader);

        assert_eq!(ctx.bound_shader(), None);
        assert_eq!(ctx.device().current_program(), None);
        assert_eq!(ctx.device().live_objects(), 0);
    }

    #[test]
    fn binding_same_texture_twice_binds_once() {
        let mut ctx = headless(small());
        let desc = TextureDesc::new(4, 4, PixelFormat::Rgba8);
        let t = ctx.create_texture(&desc, None).unwrap();
        ctx.device_mut().clear_calls();

        ctx.bind_texture(Some(&t));
        ctx.bind_texture(Some(&t));
        ctx.bind_texture(None);
        ctx.bind_texture(None);

        assert_eq!(
            ctx.device().calls(),
            &[Call::BindTexture(Some(t.handle())), Call::BindTexture(None)]
        );
    }

    #[test]
    fn texture_dimensions_are_validated() {
        let mut ctx = headless(small());
        for (w, h) in [(0, 4), (4, 0), (4097, 4), (4, 5000)] {
            let err = ctx
                .create_texture(&TextureDesc::new(w, h, PixelFormat::Rgba8), None)
                .unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvalidDimensions);
        }
        let ok = ctx.create_texture(&TextureDesc::new(4096, 1, PixelFormat::R8), None);
        assert!(ok.is_ok());
        // The earlier fault stays visible after the success.
        assert_eq!(
            ctx.last_error().map(Error::code),
            Some(ErrorCode::InvalidDimensions)
        );
    }

    #[test]
    fn pixel_data_length_is_validated() {
        let mut ctx = headless(small());
        let desc = TextureDesc::new(2, 2, PixelFormat::Rgb8);
        let err = ctx.create_texture(&desc, Some(&[0u8; 11])).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidPixelData {
                expected: 12,
                actual: 11
            }
        );
        assert!(ctx.create_texture(&desc, Some(&[0u8; 12])).is_ok());
    }

    #[test]
    fn srgb_context_marks_color_textures() {
        let mut ctx = headless(ContextConfig {
            srgb: true,
            ..small()
        });
        let rgba = ctx
            .create_texture(&TextureDesc::new(2, 2, PixelFormat::Rgba8), None)
            .unwrap();
        let r8 = ctx
            .create_texture(&TextureDesc::new(2, 2, PixelFormat::R8), None)
            .unwrap();
        assert!(rgba.desc().srgb);
        assert!(!r8.desc().srgb);
    }

    #[test]
    fn mipmapped_texture_regenerates_on_update() {
        let mut ctx = headless(small());
        let desc = TextureDesc::new(4, 4, PixelFormat::R8).with_mipmaps(true);
        let t = ctx.create_texture(&desc, Some(&[0u8; 16])).unwrap();
        assert!(t.has_mipmaps());
        ctx.device_mut().clear_calls();

        ctx.update_texture(&t, 1, 1, 2, 2, &[255u8; 4]).unwrap();
        assert_eq!(
            ctx.device().calls(),
            &[Call::UpdateTexture(t.handle()), Call::GenerateMipmaps(t.handle())]
        );
    }

    #[test]
    fn late_mipmaps_switch_to_mip_filtering() {
        let mut ctx = headless(small());
        let desc = TextureDesc::new(4, 4, PixelFormat::Rgba8).with_filter(Filter::Nearest);
        let mut t = ctx.create_texture(&desc, None).unwrap();
        assert!(!t.has_mipmaps());
        ctx.device_mut().clear_calls();

        ctx.generate_mipmaps(&mut t);
        assert!(t.has_mipmaps());
        assert!(t.desc().mipmaps);
        assert_eq!(
            ctx.device().calls(),
            &[
                Call::SetMipFilter(t.handle(), Filter::Nearest),
                Call::GenerateMipmaps(t.handle()),
            ]
        );

        // The filter is switched once; later calls only rebuild the chain.
        ctx.device_mut().clear_calls();
        ctx.generate_mipmaps(&mut t);
        assert_eq!(ctx.device().calls(), &[Call::GenerateMipmaps(t.handle())]);
    }

    #[test]
    #[should_panic(expected = "cannot carry mipmaps")]
    fn render_targets_reject_mipmaps() {
        let mut ctx = headless(small());
        let mut t = ctx
            .create_target_texture(&TextureDesc::new(4, 4, PixelFormat::Rgba8))
            .unwrap();
        ctx.generate_mipmaps(&mut t);
    }

    #[test]
    fn update_region_must_fit() {
        let mut ctx = headless(small());
        let t = ctx
            .create_texture(&TextureDesc::new(4, 4, PixelFormat::R8), None)
            .unwrap();
        let err = ctx.update_texture(&t, 3, 0, 2, 1, &[0u8; 2]).unwrap_err();
        assert_eq!(
            err,
            Error::RegionOutOfBounds {
                x: 3,
                y: 0,
                width: 2,
                height: 1,
                texture_width: 4,
                texture_height: 4,
            }
        );
        assert_eq!(ctx.last_error(), Some(&err));
        let err = ctx.update_texture(&t, 0, 0, 2, 1, &[0u8; 3]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidPixelData);
    }

    #[test]
    fn destroying_bound_texture_unbinds_it() {
        let mut ctx = headless(small());
        let t = ctx
            .create_texture(&TextureDesc::new(4, 4, PixelFormat::Rgba8), None)
            .unwrap();
        ctx.bind_texture(Some(&t));
        ctx.destroy_texture(t);
        assert_eq!(ctx.bound_texture(), None);
        assert_eq!(ctx.device().live_textures(), 0);
    }

    #[test]
    fn buffer_update_can_shrink_but_never_reallocates() {
        let mut ctx = headless(small());
        let verts = [Vertex::default(); 6];
        let mut buf = ctx
            .create_buffer(Topology::Triangles, &verts, BufferUsage::Dynamic)
            .unwrap();
        assert_eq!((buf.len(), buf.capacity()), (6, 6));

        ctx.update_buffer(&mut buf, 0, &verts[..3]).unwrap();
        assert_eq!((buf.len(), buf.capacity()), (3, 6));

        ctx.update_buffer(&mut buf, 3, &verts[..3]).unwrap();
        assert_eq!(buf.len(), 6);

        let creates = ctx
            .device()
            .count(|c| matches!(c, Call::CreateVertexBuffer { .. }));
        assert_eq!(creates, 1);
    }

    #[test]
    fn buffer_update_past_capacity_fails() {
        let mut ctx = headless(small());
        let mut buf = ctx
            .create_buffer_with_capacity(Topology::Lines, 4, &[], BufferUsage::Dynamic)
            .unwrap();
        assert!(buf.is_empty());

        let err = ctx
            .update_buffer(&mut buf, 2, &[Vertex::default(); 3])
            .unwrap_err();
        assert_eq!(
            err,
            Error::BufferOverflow {
                offset: 2,
                end: 5,
                capacity: 4
            }
        );
        assert_eq!(buf.len(), 0);
        assert_eq!(ctx.last_error(), Some(&err));

        ctx.destroy_buffer(buf);
        assert_eq!(ctx.device().live_objects(), 0);
    }
}

//! OpenGL 3.3 core / GLES 3.0 backend over `glow`.

use glow::{HasContext, PixelUnpackData};

use crate::buffer::Vertex;
use crate::coords::{Color, Viewport};
use crate::error::{Error, Result, ShaderStage};
use crate::state::{BlendEquation, BlendFactor, BlendMode};
use crate::texture::TextureDesc;

use super::{
    ActiveUniform, Attachment, BufferUsage, Capability, Device, DeviceLimits, Filter,
    FramebufferStatus, PixelFormat, ProgramSource, RenderbufferFormat, Topology, UniformType,
    UniformValue, Wrap,
};

/// [`Device`] driving a `glow` context.
///
/// Creating and attaching objects never changes the texture or framebuffer
/// binding the engine last asked for; the device tracks both and restores them.
pub struct GlowDevice {
    gl: glow::Context,
    limits: DeviceLimits,
    vao: glow::VertexArray,

    bound_texture: Option<glow::Texture>,
    bound_framebuffer: Option<glow::Framebuffer>,
    /// Buffer the vertex attribute pointers currently reference.
    attribs_buffer: Option<glow::Buffer>,
}

impl GlowDevice {
    /// Wraps `gl`, creating the vertex array every draw goes through.
    ///
    /// # Safety
    /// `gl` must be current on this thread for the whole lifetime of the device.
    pub unsafe fn new(gl: glow::Context) -> Result<Self> {
        unsafe {
            let vao = gl
                .create_vertex_array()
                .map_err(|_| Error::OutOfMemory("vertex array"))?;
            gl.bind_vertex_array(Some(vao));
            gl.active_texture(glow::TEXTURE0);
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);

            let limits = DeviceLimits {
                max_texture_size: u32::try_from(gl.get_parameter_i32(glow::MAX_TEXTURE_SIZE))
                    .unwrap_or(0),
                max_samples: u32::try_from(gl.get_parameter_i32(glow::MAX_SAMPLES)).unwrap_or(0),
            };
            log::debug!(
                "GL {:?}, max texture {}, max samples {}",
                gl.version(),
                limits.max_texture_size,
                limits.max_samples
            );

            Ok(Self {
                gl,
                limits,
                vao,
                bound_texture: None,
                bound_framebuffer: None,
                attribs_buffer: None,
            })
        }
    }

    #[inline]
    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    unsafe fn compile(&self, stage: ShaderStage, source: &str) -> Result<glow::Shader> {
        let gl = &self.gl;
        let kind = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        unsafe {
            let shader = gl
                .create_shader(kind)
                .map_err(|_| Error::OutOfMemory("shader"))?;
            gl.shader_source(shader, source);
            gl.compile_shader(shader);
            if !gl.get_shader_compile_status(shader) {
                let log = gl.get_shader_info_log(shader);
                gl.delete_shader(shader);
                return Err(Error::ShaderCompile { stage, log });
            }
            Ok(shader)
        }
    }

    /// Runs `f` with `framebuffer` bound, then restores the tracked binding.
    unsafe fn with_framebuffer<T>(
        &self,
        framebuffer: glow::Framebuffer,
        f: impl FnOnce(&glow::Context) -> T,
    ) -> T {
        unsafe {
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, Some(framebuffer));
            let out = f(&self.gl);
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, self.bound_framebuffer);
            out
        }
    }

    /// Runs `f` with `texture` bound to unit 0, then restores the tracked binding.
    unsafe fn with_texture<T>(&self, texture: glow::Texture, f: impl FnOnce(&glow::Context) -> T) -> T {
        unsafe {
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            let out = f(&self.gl);
            self.gl.bind_texture(glow::TEXTURE_2D, self.bound_texture);
            out
        }
    }
}

impl std::fmt::Debug for GlowDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlowDevice")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

// ── native enum tables ───────────────────────────────────────────────────

fn pixel_format(format: PixelFormat, srgb: bool) -> (i32, u32) {
    let (internal, external) = match (format, srgb) {
        (PixelFormat::R8, _) => (glow::R8, glow::RED),
        (PixelFormat::Rg8, _) => (glow::RG8, glow::RG),
        (PixelFormat::Rgb8, false) => (glow::RGB8, glow::RGB),
        (PixelFormat::Rgb8, true) => (glow::SRGB8, glow::RGB),
        (PixelFormat::Rgba8, false) => (glow::RGBA8, glow::RGBA),
        (PixelFormat::Rgba8, true) => (glow::SRGB8_ALPHA8, glow::RGBA),
    };
    (internal as i32, external)
}

fn external_format(format: PixelFormat) -> u32 {
    match format {
        PixelFormat::R8 => glow::RED,
        PixelFormat::Rg8 => glow::RG,
        PixelFormat::Rgb8 => glow::RGB,
        PixelFormat::Rgba8 => glow::RGBA,
    }
}

fn filters(filter: Filter, mipmaps: bool) -> (u32, u32) {
    match (filter, mipmaps) {
        (Filter::Nearest, false) => (glow::NEAREST, glow::NEAREST),
        (Filter::Nearest, true) => (glow::NEAREST_MIPMAP_NEAREST, glow::NEAREST),
        (Filter::Linear, false) => (glow::LINEAR, glow::LINEAR),
        (Filter::Linear, true) => (glow::LINEAR_MIPMAP_LINEAR, glow::LINEAR),
    }
}

fn wrap(wrap: Wrap) -> u32 {
    match wrap {
        Wrap::ClampToEdge => glow::CLAMP_TO_EDGE,
        Wrap::Repeat => glow::REPEAT,
        Wrap::MirroredRepeat => glow::MIRRORED_REPEAT,
    }
}

fn blend_factor(factor: BlendFactor) -> u32 {
    match factor {
        BlendFactor::Zero => glow::ZERO,
        BlendFactor::One => glow::ONE,
        BlendFactor::SrcColor => glow::SRC_COLOR,
        BlendFactor::OneMinusSrcColor => glow::ONE_MINUS_SRC_COLOR,
        BlendFactor::DstColor => glow::DST_COLOR,
        BlendFactor::OneMinusDstColor => glow::ONE_MINUS_DST_COLOR,
        BlendFactor::SrcAlpha => glow::SRC_ALPHA,
        BlendFactor::OneMinusSrcAlpha => glow::ONE_MINUS_SRC_ALPHA,
        BlendFactor::DstAlpha => glow::DST_ALPHA,
        BlendFactor::OneMinusDstAlpha => glow::ONE_MINUS_DST_ALPHA,
        BlendFactor::SrcAlphaSaturate => glow::SRC_ALPHA_SATURATE,
    }
}

fn blend_equation(equation: BlendEquation) -> u32 {
    match equation {
        BlendEquation::Add => glow::FUNC_ADD,
        BlendEquation::Subtract => glow::FUNC_SUBTRACT,
        BlendEquation::ReverseSubtract => glow::FUNC_REVERSE_SUBTRACT,
        BlendEquation::Min => glow::MIN,
        BlendEquation::Max => glow::MAX,
    }
}

fn topology(topology: Topology) -> u32 {
    match topology {
        Topology::Points => glow::POINTS,
        Topology::Lines => glow::LINES,
        Topology::LineStrip => glow::LINE_STRIP,
        Topology::LineLoop => glow::LINE_LOOP,
        Topology::Triangles => glow::TRIANGLES,
        Topology::TriangleStrip => glow::TRIANGLE_STRIP,
        Topology::TriangleFan => glow::TRIANGLE_FAN,
    }
}

fn buffer_usage(usage: BufferUsage) -> u32 {
    match usage {
        BufferUsage::Static => glow::STATIC_DRAW,
        BufferUsage::Dynamic => glow::DYNAMIC_DRAW,
        BufferUsage::Stream => glow::STREAM_DRAW,
    }
}

fn attachment(attachment: Attachment) -> u32 {
    match attachment {
        Attachment::Color0 => glow::COLOR_ATTACHMENT0,
        Attachment::Depth => glow::DEPTH_ATTACHMENT,
    }
}

fn renderbuffer_format(format: RenderbufferFormat) -> u32 {
    match format {
        RenderbufferFormat::R8 => glow::R8,
        RenderbufferFormat::Rg8 => glow::RG8,
        RenderbufferFormat::Rgb8 => glow::RGB8,
        RenderbufferFormat::Srgb8 => glow::SRGB8,
        RenderbufferFormat::Rgba8 => glow::RGBA8,
        RenderbufferFormat::Srgb8Alpha8 => glow::SRGB8_ALPHA8,
        RenderbufferFormat::Depth24 => glow::DEPTH_COMPONENT24,
    }
}

fn capability(capability: Capability) -> u32 {
    match capability {
        Capability::Blend => glow::BLEND,
        Capability::DepthTest => glow::DEPTH_TEST,
        Capability::FramebufferSrgb => glow::FRAMEBUFFER_SRGB,
    }
}

fn uniform_type(native: u32) -> UniformType {
    match native {
        glow::BOOL => UniformType::Bool,
        glow::INT => UniformType::Int,
        glow::INT_VEC2 => UniformType::IVec2,
        glow::INT_VEC3 => UniformType::IVec3,
        glow::INT_VEC4 => UniformType::IVec4,
        glow::FLOAT => UniformType::Float,
        glow::FLOAT_VEC2 => UniformType::Vec2,
        glow::FLOAT_VEC3 => UniformType::Vec3,
        glow::FLOAT_VEC4 => UniformType::Vec4,
        glow::FLOAT_MAT2 => UniformType::Mat2,
        glow::FLOAT_MAT3 => UniformType::Mat3,
        glow::FLOAT_MAT4 => UniformType::Mat4,
        glow::SAMPLER_2D => UniformType::Sampler2D,
        other => UniformType::Other(other),
    }
}

#[inline]
fn gl_size(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

// ── Device ───────────────────────────────────────────────────────────────

// Every `unsafe` block below relies on the contract of `GlowDevice::new`: the
// context is current, and handles come from this same context.
impl Device for GlowDevice {
    type Program = glow::Program;
    type Texture = glow::Texture;
    type Framebuffer = glow::Framebuffer;
    type Renderbuffer = glow::Renderbuffer;
    type Buffer = glow::Buffer;
    type UniformLocation = glow::UniformLocation;

    fn limits(&self) -> DeviceLimits {
        self.limits
    }

    fn create_program(&mut self, source: &ProgramSource<'_>) -> Result<glow::Program> {
        let gl = &self.gl;
        unsafe {
            let vs = self.compile(ShaderStage::Vertex, source.vertex)?;
            let fs = match self.compile(ShaderStage::Fragment, source.fragment) {
                Ok(fs) => fs,
                Err(err) => {
                    gl.delete_shader(vs);
                    return Err(err);
                }
            };

            let program = match gl.create_program() {
                Ok(p) => p,
                Err(_) => {
                    gl.delete_shader(fs);
                    gl.delete_shader(vs);
                    return Err(Error::OutOfMemory("program"));
                }
            };
            gl.attach_shader(program, vs);
            gl.attach_shader(program, fs);
            for attr in Vertex::ATTRIBUTES {
                gl.bind_attrib_location(program, attr.location, attr.name);
            }
            gl.link_program(program);

            gl.detach_shader(program, fs);
            gl.detach_shader(program, vs);
            gl.delete_shader(fs);
            gl.delete_shader(vs);

            if !gl.get_program_link_status(program) {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                return Err(Error::ProgramLink(log));
            }
            Ok(program)
        }
    }

    fn delete_program(&mut self, program: glow::Program) {
        unsafe { self.gl.delete_program(program) };
    }

    fn use_program(&mut self, program: Option<glow::Program>) {
        unsafe { self.gl.use_program(program) };
    }

    fn active_uniforms(&mut self, program: glow::Program) -> Vec<ActiveUniform> {
        let gl = &self.gl;
        unsafe {
            let count = gl.get_active_uniforms(program);
            (0..count)
                .filter_map(|index| gl.get_active_uniform(program, index))
                .map(|u| {
                    // Arrays are reported as `name[0]`.
                    let name = match u.name.strip_suffix("[0]") {
                        Some(base) => base.to_owned(),
                        None => u.name,
                    };
                    ActiveUniform {
                        name,
                        size: u.size,
                        ty: uniform_type(u.utype),
                    }
                })
                .collect()
        }
    }

    fn uniform_location(
        &mut self,
        program: glow::Program,
        name: &str,
    ) -> Option<glow::UniformLocation> {
        unsafe { self.gl.get_uniform_location(program, name) }
    }

    fn set_uniform(&mut self, location: &glow::UniformLocation, value: UniformValue<'_>) {
        let gl = &self.gl;
        let loc = Some(location);
        unsafe {
            match value {
                UniformValue::Ints { components, data } => match components {
                    1 => gl.uniform_1_i32_slice(loc, data),
                    2 => gl.uniform_2_i32_slice(loc, data),
                    3 => gl.uniform_3_i32_slice(loc, data),
                    4 => gl.uniform_4_i32_slice(loc, data),
                    n => log::warn!("ignoring int uniform with {n} components"),
                },
                UniformValue::Floats { components, data } => match components {
                    1 => gl.uniform_1_f32_slice(loc, data),
                    2 => gl.uniform_2_f32_slice(loc, data),
                    3 => gl.uniform_3_f32_slice(loc, data),
                    4 => gl.uniform_4_f32_slice(loc, data),
                    n => log::warn!("ignoring float uniform with {n} components"),
                },
                UniformValue::Matrices {
                    dim,
                    transpose,
                    data,
                } => match dim {
                    2 => gl.uniform_matrix_2_f32_slice(loc, transpose, data),
                    3 => gl.uniform_matrix_3_f32_slice(loc, transpose, data),
                    4 => gl.uniform_matrix_4_f32_slice(loc, transpose, data),
                    n => log::warn!("ignoring {n}x{n} matrix uniform"),
                },
            }
        }
    }

    fn create_texture(&mut self, desc: &TextureDesc, pixels: Option<&[u8]>) -> Result<glow::Texture> {
        let texture = unsafe { self.gl.create_texture() }.map_err(|_| Error::OutOfMemory("texture"))?;
        let (internal, external) = pixel_format(desc.format, desc.srgb);
        let (min, mag) = filters(desc.filter, desc.mipmaps);

        unsafe {
            self.with_texture(texture, |gl| {
                gl.tex_image_2d(
                    glow::TEXTURE_2D,
                    0,
                    internal,
                    gl_size(desc.width),
                    gl_size(desc.height),
                    0,
                    external,
                    glow::UNSIGNED_BYTE,
                    PixelUnpackData::Slice(pixels),
                );
                gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, min as i32);
                gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, mag as i32);
                gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, wrap(desc.wrap) as i32);
                gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, wrap(desc.wrap) as i32);
            });
        }
        Ok(texture)
    }

    fn create_depth_texture(&mut self, width: u32, height: u32) -> Result<glow::Texture> {
        let texture =
            unsafe { self.gl.create_texture() }.map_err(|_| Error::OutOfMemory("depth texture"))?;
        unsafe {
            self.with_texture(texture, |gl| {
                gl.tex_image_2d(
                    glow::TEXTURE_2D,
                    0,
                    glow::DEPTH_COMPONENT24 as i32,
                    gl_size(width),
                    gl_size(height),
                    0,
                    glow::DEPTH_COMPONENT,
                    glow::UNSIGNED_INT,
                    PixelUnpackData::Slice(None),
                );
                gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::NEAREST as i32);
                gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::NEAREST as i32);
            });
        }
        Ok(texture)
    }

    fn update_texture(
        &mut self,
        texture: glow::Texture,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        format: PixelFormat,
        pixels: &[u8],
    ) {
        unsafe {
            self.with_texture(texture, |gl| {
                gl.tex_sub_image_2d(
                    glow::TEXTURE_2D,
                    0,
                    gl_size(x),
                    gl_size(y),
                    gl_size(width),
                    gl_size(height),
                    external_format(format),
                    glow::UNSIGNED_BYTE,
                    PixelUnpackData::Slice(Some(pixels)),
                );
            });
        }
    }

    fn generate_mipmaps(&mut self, texture: glow::Texture) {
        unsafe {
            self.with_texture(texture, |gl| gl.generate_mipmap(glow::TEXTURE_2D));
        }
    }

    fn set_mip_filter(&mut self, texture: glow::Texture, filter: Filter) {
        let (min, _) = filters(filter, true);
        unsafe {
            self.with_texture(texture, |gl| {
                gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, min as i32)
            });
        }
    }

    fn delete_texture(&mut self, texture: glow::Texture) {
        if self.bound_texture == Some(texture) {
            self.bound_texture = None;
        }
        unsafe { self.gl.delete_texture(texture) };
    }

    fn bind_texture(&mut self, texture: Option<glow::Texture>) {
        self.bound_texture = texture;
        unsafe { self.gl.bind_texture(glow::TEXTURE_2D, texture) };
    }

    fn create_framebuffer(&mut self) -> Result<glow::Framebuffer> {
        unsafe { self.gl.create_framebuffer() }.map_err(|_| Error::OutOfMemory("framebuffer"))
    }

    fn delete_framebuffer(&mut self, framebuffer: glow::Framebuffer) {
        if self.bound_framebuffer == Some(framebuffer) {
            self.bound_framebuffer = None;
        }
        unsafe { self.gl.delete_framebuffer(framebuffer) };
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<glow::Framebuffer>) {
        self.bound_framebuffer = framebuffer;
        unsafe { self.gl.bind_framebuffer(glow::FRAMEBUFFER, framebuffer) };
    }

    fn attach_texture(
        &mut self,
        framebuffer: glow::Framebuffer,
        slot: Attachment,
        texture: glow::Texture,
    ) {
        unsafe {
            self.with_framebuffer(framebuffer, |gl| {
                gl.framebuffer_texture_2d(
                    glow::FRAMEBUFFER,
                    attachment(slot),
                    glow::TEXTURE_2D,
                    Some(texture),
                    0,
                );
            });
        }
    }

    fn create_renderbuffer(
        &mut self,
        format: RenderbufferFormat,
        samples: u32,
        width: u32,
        height: u32,
    ) -> Result<glow::Renderbuffer> {
        let gl = &self.gl;
        unsafe {
            let rb = gl
                .create_renderbuffer()
                .map_err(|_| Error::OutOfMemory("renderbuffer"))?;
            gl.bind_renderbuffer(glow::RENDERBUFFER, Some(rb));
            gl.renderbuffer_storage_multisample(
                glow::RENDERBUFFER,
                gl_size(samples),
                renderbuffer_format(format),
                gl_size(width),
                gl_size(height),
            );
            gl.bind_renderbuffer(glow::RENDERBUFFER, None);
            Ok(rb)
        }
    }

    fn delete_renderbuffer(&mut self, renderbuffer: glow::Renderbuffer) {
        unsafe { self.gl.delete_renderbuffer(renderbuffer) };
    }

    fn attach_renderbuffer(
        &mut self,
        framebuffer: glow::Framebuffer,
        slot: Attachment,
        renderbuffer: glow::Renderbuffer,
    ) {
        unsafe {
            self.with_framebuffer(framebuffer, |gl| {
                gl.framebuffer_renderbuffer(
                    glow::FRAMEBUFFER,
                    attachment(slot),
                    glow::RENDERBUFFER,
                    Some(renderbuffer),
                );
            });
        }
    }

    fn framebuffer_status(&mut self, framebuffer: glow::Framebuffer) -> FramebufferStatus {
        let status = unsafe {
            self.with_framebuffer(framebuffer, |gl| gl.check_framebuffer_status(glow::FRAMEBUFFER))
        };
        if status == glow::FRAMEBUFFER_COMPLETE {
            FramebufferStatus::Complete
        } else {
            FramebufferStatus::Incomplete(status)
        }
    }

    fn resolve(
        &mut self,
        src: glow::Framebuffer,
        dst: glow::Framebuffer,
        width: u32,
        height: u32,
    ) {
        let (w, h) = (gl_size(width), gl_size(height));
        let gl = &self.gl;
        unsafe {
            gl.bind_framebuffer(glow::READ_FRAMEBUFFER, Some(src));
            gl.bind_framebuffer(glow::DRAW_FRAMEBUFFER, Some(dst));
            gl.blit_framebuffer(
                0,
                0,
                w,
                h,
                0,
                0,
                w,
                h,
                glow::COLOR_BUFFER_BIT,
                glow::LINEAR,
            );
            gl.bind_framebuffer(glow::FRAMEBUFFER, self.bound_framebuffer);
        }
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        unsafe {
            self.gl
                .viewport(viewport.x, viewport.y, viewport.width, viewport.height)
        };
    }

    fn set_blend_mode(&mut self, mode: &BlendMode) {
        let gl = &self.gl;
        unsafe {
            gl.blend_func_separate(
                blend_factor(mode.color_src),
                blend_factor(mode.color_dst),
                blend_factor(mode.alpha_src),
                blend_factor(mode.alpha_dst),
            );
            gl.blend_equation_separate(
                blend_equation(mode.color_equation),
                blend_equation(mode.alpha_equation),
            );
        }
    }

    fn set_line_width(&mut self, width: f32) {
        unsafe { self.gl.line_width(width) };
    }

    fn set_capability(&mut self, cap: Capability, enabled: bool) {
        unsafe {
            if enabled {
                self.gl.enable(capability(cap));
            } else {
                self.gl.disable(capability(cap));
            }
        }
    }

    fn clear(&mut self, color: Color, depth: bool) {
        let gl = &self.gl;
        let mut mask = glow::COLOR_BUFFER_BIT;
        if depth {
            mask |= glow::DEPTH_BUFFER_BIT;
        }
        unsafe {
            gl.clear_color(color.r, color.g, color.b, color.a);
            gl.clear(mask);
        }
    }

    fn create_vertex_buffer(&mut self, capacity: usize, usage: BufferUsage) -> Result<glow::Buffer> {
        let bytes = capacity
            .checked_mul(Vertex::STRIDE)
            .and_then(|b| i32::try_from(b).ok())
            .ok_or(Error::OutOfMemory("vertex buffer"))?;
        let gl = &self.gl;
        unsafe {
            let buffer = gl
                .create_buffer()
                .map_err(|_| Error::OutOfMemory("vertex buffer"))?;
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
            gl.buffer_data_size(glow::ARRAY_BUFFER, bytes, buffer_usage(usage));
            Ok(buffer)
        }
    }

    fn update_vertex_buffer(&mut self, buffer: glow::Buffer, offset: usize, vertices: &[Vertex]) {
        let gl = &self.gl;
        unsafe {
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
            gl.buffer_sub_data_u8_slice(
                glow::ARRAY_BUFFER,
                (offset * Vertex::STRIDE) as i32,
                bytemuck::cast_slice(vertices),
            );
        }
    }

    fn delete_vertex_buffer(&mut self, buffer: glow::Buffer) {
        if self.attribs_buffer == Some(buffer) {
            self.attribs_buffer = None;
        }
        unsafe { self.gl.delete_buffer(buffer) };
    }

    fn draw(&mut self, buffer: glow::Buffer, mode: Topology, first: usize, count: usize) {
        let gl = &self.gl;
        unsafe {
            if self.attribs_buffer != Some(buffer) {
                gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
                for attr in Vertex::ATTRIBUTES {
                    gl.enable_vertex_attrib_array(attr.location);
                    gl.vertex_attrib_pointer_f32(
                        attr.location,
                        attr.components,
                        glow::FLOAT,
                        false,
                        Vertex::STRIDE as i32,
                        attr.offset as i32,
                    );
                }
                self.attribs_buffer = Some(buffer);
            }
            gl.draw_arrays(topology(mode), first as i32, count as i32);
        }
    }

    fn take_error(&mut self) -> Option<u32> {
        let code = unsafe { self.gl.get_error() };
        (code != glow::NO_ERROR).then_some(code)
    }
}

impl Drop for GlowDevice {
    fn drop(&mut self) {
        unsafe { self.gl.delete_vertex_array(self.vao) };
    }
}

use std::collections::{HashMap, HashSet};

use crate::buffer::Vertex;
use crate::coords::{Color, Viewport};
use crate::error::{Error, Result, ShaderStage};
use crate::state::BlendMode;
use crate::texture::TextureDesc;

use super::{
    ActiveUniform, Attachment, BufferUsage, Capability, Device, DeviceLimits, Filter,
    FramebufferStatus, PixelFormat, ProgramSource, RenderbufferFormat, Topology, UniformType,
    UniformValue,
};

/// One recorded device call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateProgram(u32),
    DeleteProgram(u32),
    UseProgram(Option<u32>),
    SetUniform {
        location: u32,
        ints: Vec<i32>,
        floats: Vec<f32>,
        transpose: bool,
    },
    CreateTexture(u32),
    CreateDepthTexture(u32),
    UpdateTexture(u32),
    GenerateMipmaps(u32),
    SetMipFilter(u32, Filter),
    DeleteTexture(u32),
    BindTexture(Option<u32>),
    CreateFramebuffer(u32),
    DeleteFramebuffer(u32),
    BindFramebuffer(Option<u32>),
    AttachTexture {
        framebuffer: u32,
        attachment: Attachment,
        texture: u32,
    },
    CreateRenderbuffer {
        renderbuffer: u32,
        format: RenderbufferFormat,
        samples: u32,
    },
    DeleteRenderbuffer(u32),
    AttachRenderbuffer {
        framebuffer: u32,
        attachment: Attachment,
        renderbuffer: u32,
    },
    Resolve {
        src: u32,
        dst: u32,
        width: u32,
        height: u32,
    },
    SetViewport(Viewport),
    SetBlendMode(BlendMode),
    SetLineWidth(f32),
    SetCapability(Capability, bool),
    Clear {
        color: Color,
        depth: bool,
    },
    CreateVertexBuffer {
        buffer: u32,
        capacity: usize,
    },
    UpdateVertexBuffer {
        buffer: u32,
        offset: usize,
        count: usize,
    },
    DeleteVertexBuffer(u32),
    Draw {
        buffer: u32,
        topology: Topology,
        first: usize,
        count: usize,
    },
}

impl Call {
    /// True for calls that change global pipeline state the diffing engine manages.
    pub fn is_state_change(&self) -> bool {
        matches!(
            self,
            Call::SetViewport(_)
                | Call::SetBlendMode(_)
                | Call::SetLineWidth(_)
                | Call::SetUniform { .. }
        )
    }
}

#[derive(Debug, Clone)]
struct ProgramUniform {
    name: String,
    size: i32,
    ty: UniformType,
    location: u32,
}

/// GPU-less [`Device`].
///
/// Hands out integer handles, tracks which objects are alive, derives active
/// uniforms from the `uniform` declarations in the GLSL sources and records
/// every call in order. Programs fail to compile on empty sources and fail to
/// link when a stage has no `main`.
#[derive(Debug)]
pub struct HeadlessDevice {
    limits: DeviceLimits,
    incomplete_status: Option<u32>,
    pending_error: Option<u32>,

    next_handle: u32,
    calls: Vec<Call>,

    programs: HashMap<u32, Vec<ProgramUniform>>,
    textures: HashSet<u32>,
    framebuffers: HashSet<u32>,
    renderbuffers: HashSet<u32>,
    buffers: HashMap<u32, usize>,
    current_program: Option<u32>,
}

/// Limits used by [`HeadlessDevice::new`].
pub const HEADLESS_LIMITS: DeviceLimits = DeviceLimits {
    max_texture_size: 4096,
    max_samples: 8,
};

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self::with_limits(HEADLESS_LIMITS)
    }

    pub fn with_limits(limits: DeviceLimits) -> Self {
        Self {
            limits,
            incomplete_status: None,
            pending_error: None,
            next_handle: 1,
            calls: Vec::new(),
            programs: HashMap::new(),
            textures: HashSet::new(),
            framebuffers: HashSet::new(),
            renderbuffers: HashSet::new(),
            buffers: HashMap::new(),
            current_program: None,
        }
    }

    /// Makes every framebuffer report `status` instead of complete.
    pub fn fail_framebuffers_with(&mut self, status: u32) {
        self.incomplete_status = Some(status);
    }

    /// Sets the sticky error returned by the next [`Device::take_error`].
    pub fn raise_error(&mut self, code: u32) {
        self.pending_error = Some(code);
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<Call> {
        std::mem::take(&mut self.calls)
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Number of recorded calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    /// Total number of objects created and not yet deleted.
    pub fn live_objects(&self) -> usize {
        self.programs.len()
            + self.textures.len()
            + self.framebuffers.len()
            + self.renderbuffers.len()
            + self.buffers.len()
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn live_framebuffers(&self) -> usize {
        self.framebuffers.len()
    }

    pub fn live_renderbuffers(&self) -> usize {
        self.renderbuffers.len()
    }

    pub fn current_program(&self) -> Option<u32> {
        self.current_program
    }

    fn alloc(&mut self) -> u32 {
        let h = self.next_handle;
        self.next_handle += 1;
        h
    }

    fn release(set: &mut HashSet<u32>, handle: u32, kind: &str) {
        assert!(set.remove(&handle), "deleting unknown {kind} {handle}");
    }
}

impl Device for HeadlessDevice {
    type Program = u32;
    type Texture = u32;
    type Framebuffer = u32;
    type Renderbuffer = u32;
    type Buffer = u32;
    type UniformLocation = u32;

    fn limits(&self) -> DeviceLimits {
        self.limits
    }

    fn create_program(&mut self, source: &ProgramSource<'_>) -> Result<u32> {
        for (stage, src) in [
            (ShaderStage::Vertex, source.vertex),
            (ShaderStage::Fragment, source.fragment),
        ] {
            if src.trim().is_empty() {
                return Err(Error::ShaderCompile {
                    stage,
                    log: "empty source".to_owned(),
                });
            }
        }
        if !source.vertex.contains("main") || !source.fragment.contains("main") {
            return Err(Error::ProgramLink("missing entry point `main`".to_owned()));
        }

        let mut uniforms: Vec<ProgramUniform> = Vec::new();
        let mut next_location = 0u32;
        for (name, size, ty) in parse_uniforms(source.vertex)
            .into_iter()
            .chain(parse_uniforms(source.fragment))
        {
            if uniforms.iter().any(|u| u.name == name) {
                continue;
            }
            uniforms.push(ProgramUniform {
                name,
                size,
                ty,
                location: next_location,
            });
            next_location += size.max(1) as u32;
        }

        let program = self.alloc();
        self.programs.insert(program, uniforms);
        self.calls.push(Call::CreateProgram(program));
        Ok(program)
    }

    fn delete_program(&mut self, program: u32) {
        assert!(
            self.programs.remove(&program).is_some(),
            "deleting unknown program {program}"
        );
        if self.current_program == Some(program) {
            self.current_program = None;
        }
        self.calls.push(Call::DeleteProgram(program));
    }

    fn use_program(&mut self, program: Option<u32>) {
        self.current_program = program;
        self.calls.push(Call::UseProgram(program));
    }

    fn active_uniforms(&mut self, program: u32) -> Vec<ActiveUniform> {
        self.programs
            .get(&program)
            .map(|us| {
                us.iter()
                    .map(|u| ActiveUniform {
                        name: u.name.clone(),
                        size: u.size,
                        ty: u.ty,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn uniform_location(&mut self, program: u32, name: &str) -> Option<u32> {
        let base = name.strip_suffix("[0]").unwrap_or(name);
        self.programs
            .get(&program)?
            .iter()
            .find(|u| u.name == base)
            .map(|u| u.location)
    }

    fn set_uniform(&mut self, location: &u32, value: UniformValue<'_>) {
        let (ints, floats, transpose) = match value {
            UniformValue::Ints { data, .. } => (data.to_vec(), Vec::new(), false),
            UniformValue::Floats { data, .. } => (Vec::new(), data.to_vec(), false),
            UniformValue::Matrices {
                data, transpose, ..
            } => (Vec::new(), data.to_vec(), transpose),
        };
        self.calls.push(Call::SetUniform {
            location: *location,
            ints,
            floats,
            transpose,
        });
    }

    fn create_texture(&mut self, _desc: &TextureDesc, _pixels: Option<&[u8]>) -> Result<u32> {
        let t = self.alloc();
        self.textures.insert(t);
        self.calls.push(Call::CreateTexture(t));
        Ok(t)
    }

    fn create_depth_texture(&mut self, _width: u32, _height: u32) -> Result<u32> {
        let t = self.alloc();
        self.textures.insert(t);
        self.calls.push(Call::CreateDepthTexture(t));
        Ok(t)
    }

    fn update_texture(
        &mut self,
        texture: u32,
        _x: u32,
        _y: u32,
        _width: u32,
        _height: u32,
        _format: PixelFormat,
        _pixels: &[u8],
    ) {
        self.calls.push(Call::UpdateTexture(texture));
    }

    fn generate_mipmaps(&mut self, texture: u32) {
        self.calls.push(Call::GenerateMipmaps(texture));
    }

    fn set_mip_filter(&mut self, texture: u32, filter: Filter) {
        self.calls.push(Call::SetMipFilter(texture, filter));
    }

    fn delete_texture(&mut self, texture: u32) {
        Self::release(&mut self.textures, texture, "texture");
        self.calls.push(Call::DeleteTexture(texture));
    }

    fn bind_texture(&mut self, texture: Option<u32>) {
        self.calls.push(Call::BindTexture(texture));
    }

    fn create_framebuffer(&mut self) -> Result<u32> {
        let f = self.alloc();
        self.framebuffers.insert(f);
        self.calls.push(Call::CreateFramebuffer(f));
        Ok(f)
    }

    fn delete_framebuffer(&mut self, framebuffer: u32) {
        Self::release(&mut self.framebuffers, framebuffer, "framebuffer");
        self.calls.push(Call::DeleteFramebuffer(framebuffer));
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<u32>) {
        self.calls.push(Call::BindFramebuffer(framebuffer));
    }

    fn attach_texture(&mut self, framebuffer: u32, attachment: Attachment, texture: u32) {
        self.calls.push(Call::AttachTexture {
            framebuffer,
            attachment,
            texture,
        });
    }

    fn create_renderbuffer(
        &mut self,
        format: RenderbufferFormat,
        samples: u32,
        _width: u32,
        _height: u32,
    ) -> Result<u32> {
        let r = self.alloc();
        self.renderbuffers.insert(r);
        self.calls.push(Call::CreateRenderbuffer {
            renderbuffer: r,
            format,
            samples,
        });
        Ok(r)
    }

    fn delete_renderbuffer(&mut self, renderbuffer: u32) {
        Self::release(&mut self.renderbuffers, renderbuffer, "renderbuffer");
        self.calls.push(Call::DeleteRenderbuffer(renderbuffer));
    }

    fn attach_renderbuffer(&mut self, framebuffer: u32, attachment: Attachment, renderbuffer: u32) {
        self.calls.push(Call::AttachRenderbuffer {
            framebuffer,
            attachment,
            renderbuffer,
        });
    }

    fn framebuffer_status(&mut self, _framebuffer: u32) -> FramebufferStatus {
        match self.incomplete_status {
            Some(status) => FramebufferStatus::Incomplete(status),
            None => FramebufferStatus::Complete,
        }
    }

    fn resolve(&mut self, src: u32, dst: u32, width: u32, height: u32) {
        self.calls.push(Call::Resolve {
            src,
            dst,
            width,
            height,
        });
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.calls.push(Call::SetViewport(viewport));
    }

    fn set_blend_mode(&mut self, mode: &BlendMode) {
        self.calls.push(Call::SetBlendMode(*mode));
    }

    fn set_line_width(&mut self, width: f32) {
        self.calls.push(Call::SetLineWidth(width));
    }

    fn set_capability(&mut self, capability: Capability, enabled: bool) {
        self.calls.push(Call::SetCapability(capability, enabled));
    }

    fn clear(&mut self, color: Color, depth: bool) {
        self.calls.push(Call::Clear { color, depth });
    }

    fn create_vertex_buffer(&mut self, capacity: usize, _usage: BufferUsage) -> Result<u32> {
        let b = self.alloc();
        self.buffers.insert(b, capacity);
        self.calls.push(Call::CreateVertexBuffer { buffer: b, capacity });
        Ok(b)
    }

    fn update_vertex_buffer(&mut self, buffer: u32, offset: usize, vertices: &[Vertex]) {
        let capacity = self.buffers.get(&buffer).copied().unwrap_or(0);
        assert!(
            offset + vertices.len() <= capacity,
            "vertex write {}..{} out of bounds (capacity {capacity})",
            offset,
            offset + vertices.len()
        );
        self.calls.push(Call::UpdateVertexBuffer {
            buffer,
            offset,
            count: vertices.len(),
        });
    }

    fn delete_vertex_buffer(&mut self, buffer: u32) {
        assert!(
            self.buffers.remove(&buffer).is_some(),
            "deleting unknown buffer {buffer}"
        );
        self.calls.push(Call::DeleteVertexBuffer(buffer));
    }

    fn draw(&mut self, buffer: u32, topology: Topology, first: usize, count: usize) {
        assert!(self.current_program.is_some(), "draw without a program in use");
        self.calls.push(Call::Draw {
            buffer,
            topology,
            first,
            count,
        });
    }

    fn take_error(&mut self) -> Option<u32> {
        self.pending_error.take()
    }
}

/// Extracts `uniform <type> <name>[N], ...;` declarations from GLSL source.
///
/// Interface blocks and anything after `//` on a line are ignored.
fn parse_uniforms(src: &str) -> Vec<(String, i32, UniformType)> {
    let stripped: String = src
        .lines()
        .map(|l| l.split("//").next().unwrap_or(""))
        .collect::<Vec<_>>()
        .join("\n");

    let mut out = Vec::new();
    for stmt in stripped.split(';') {
        let mut tokens = stmt.split_whitespace().peekable();
        if tokens.next() != Some("uniform") {
            continue;
        }
        while matches!(tokens.peek(), Some(&("lowp" | "mediump" | "highp"))) {
            tokens.next();
        }
        let Some(ty) = tokens.next() else { continue };
        let rest: String = tokens.collect::<Vec<_>>().join("");
        if rest.contains('{') {
            continue;
        }
        let ty = parse_type(ty);
        for decl in rest.split(',').filter(|d| !d.is_empty()) {
            let (name, size) = match decl.split_once('[') {
                Some((name, len)) => {
                    let len = len.trim_end_matches(']').parse::<i32>().unwrap_or(1);
                    (name, len)
                }
                None => (decl, 1),
            };
            out.push((name.to_owned(), size, ty));
        }
    }
    out
}

fn parse_type(ty: &str) -> UniformType {
    match ty {
        "bool" => UniformType::Bool,
        "int" => UniformType::Int,
        "ivec2" => UniformType::IVec2,
        "ivec3" => UniformType::IVec3,
        "ivec4" => UniformType::IVec4,
        "float" => UniformType::Float,
        "vec2" => UniformType::Vec2,
        "vec3" => UniformType::Vec3,
        "vec4" => UniformType::Vec4,
        "mat2" => UniformType::Mat2,
        "mat3" => UniformType::Mat3,
        "mat4" => UniformType::Mat4,
        "sampler2D" => UniformType::Sampler2D,
        _ => UniformType::Other(0),
    }
}

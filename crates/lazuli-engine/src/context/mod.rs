//! The rendering context: state stacks, lazy state application, bindings and
//! resource lifecycle.
//!
//! Two state stacks exist: one for the drawable surface and one for whichever
//! render-target texture is bound. State setters always edit the current
//! snapshot of the *active* stack; nothing reaches the device until a draw.

mod config;
mod draw;
mod resources;
mod target;
mod uniforms;

use std::fmt;

use crate::coords::{Mat4, Viewport};
use crate::device::{Device, DeviceLimits};
use crate::error::{Error, Result};
use crate::id::{IdAllocator, ResourceId};
use crate::instance::Instance;
use crate::state::{BlendMode, Snapshot, StateStack};
use crate::texture::TargetBinding;

pub use config::ContextConfig;

/// Reusable vertex storage behind [`Context::draw_vertices`].
struct StreamBuffer<B> {
    handle: B,
    capacity: usize,
}

/// One rendering session over a [`Device`].
pub struct Context<D: Device> {
    device: D,
    limits: DeviceLimits,
    config: ContextConfig,
    ids: IdAllocator,
    last_error: Option<Error>,

    width: u32,
    height: u32,

    bound_shader: Option<(ResourceId, D::Program)>,
    bound_texture: Option<(ResourceId, D::Texture)>,
    target: Option<TargetBinding<D>>,

    default_stack: StateStack,
    target_stack: StateStack,

    /// State used by the previous draw; `None` forces a full apply.
    applied: Option<Snapshot>,
    /// Shader whose transform/projection uniforms hold `applied`'s matrices.
    matrices_shader: Option<ResourceId>,

    stream: Option<StreamBuffer<D::Buffer>>,
}

impl<D: Device> Context<D> {
    /// Creates the context, taking ownership of the initialized device.
    ///
    /// A zero drawable size is treated as 1x1.
    pub fn new(instance: Instance<D>, config: ContextConfig) -> Self {
        let Instance { device, limits } = instance;
        let width = config.width.max(1);
        let height = config.height.max(1);

        let default_stack =
            StateStack::new(config.stack_depth, Snapshot::new(Viewport::full(width, height)));
        let target_stack = default_stack.clone();

        log::debug!(
            "context created ({width}x{height}, samples {}, depth {}, srgb {})",
            config.samples,
            config.depth,
            config.srgb
        );

        Self {
            device,
            limits,
            config,
            ids: IdAllocator::new(),
            last_error: None,
            width,
            height,
            bound_shader: None,
            bound_texture: None,
            target: None,
            default_stack,
            target_stack,
            applied: None,
            matrices_shader: None,
            stream: None,
        }
    }

    /// Ends the session, releasing the streaming vertex storage and returning
    /// the device capability.
    ///
    /// Shaders, textures and buffers still alive must be destroyed first; their
    /// device objects are otherwise leaked.
    pub fn destroy(mut self) -> Instance<D> {
        if self.target.take().is_some() {
            self.device.bind_framebuffer(None);
        }
        if self.bound_shader.take().is_some() {
            self.device.use_program(None);
        }
        if self.bound_texture.take().is_some() {
            self.device.bind_texture(None);
        }
        if let Some(stream) = self.stream.take() {
            self.device.delete_vertex_buffer(stream.handle);
        }
        log::debug!("context destroyed");

        Instance {
            device: self.device,
            limits: self.limits,
        }
    }

    // ── accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    #[inline]
    pub fn limits(&self) -> DeviceLimits {
        self.limits
    }

    #[inline]
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Direct device access.
    ///
    /// Changing bindings or pipeline state behind the context's back desyncs
    /// its bookkeeping; call [`invalidate_state`](Self::invalidate_state)
    /// afterwards if you do.
    #[inline]
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Most recent recoverable fault. Not cleared by later successful calls.
    #[inline]
    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    /// Drawable size as `(width, height)`.
    #[inline]
    pub fn drawable_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Updates the drawable size used by the default viewport.
    ///
    /// The current snapshot is not changed; call
    /// [`reset_viewport`](Self::reset_viewport) to follow the new size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
    }

    /// Id of the bound render-target texture, if any.
    #[inline]
    pub fn render_target(&self) -> Option<ResourceId> {
        self.target.map(|t| t.id)
    }

    #[inline]
    pub fn bound_shader(&self) -> Option<ResourceId> {
        self.bound_shader.map(|(id, _)| id)
    }

    #[inline]
    pub fn bound_texture(&self) -> Option<ResourceId> {
        self.bound_texture.map(|(id, _)| id)
    }

    /// Forgets the last applied state so the next draw re-applies everything.
    pub fn invalidate_state(&mut self) {
        self.applied = None;
        self.matrices_shader = None;
    }

    /// Drains the device's sticky error into the last error.
    pub fn poll_device_error(&mut self) -> Option<Error> {
        let code = self.device.take_error()?;
        let err = Error::Device(code);
        log::warn!("{err}");
        self.last_error = Some(err.clone());
        Some(err)
    }

    pub(crate) fn record<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            log::debug!("lazuli fault: {err}");
            self.last_error = Some(err.clone());
        }
        result
    }

    // ── state stack ───────────────────────────────────────────────────────

    #[inline]
    fn active_stack(&self) -> &StateStack {
        if self.target.is_some() {
            &self.target_stack
        } else {
            &self.default_stack
        }
    }

    #[inline]
    fn active_stack_mut(&mut self) -> &mut StateStack {
        if self.target.is_some() {
            &mut self.target_stack
        } else {
            &mut self.default_stack
        }
    }

    #[inline]
    fn current_mut(&mut self) -> &mut Snapshot {
        self.active_stack_mut().current_mut()
    }

    /// Default state for the active draw destination.
    fn default_snapshot(&self) -> Snapshot {
        let viewport = match &self.target {
            Some(t) => Viewport::full(t.width, t.height),
            None => Viewport::full(self.width, self.height),
        };
        Snapshot::new(viewport)
    }

    /// Current snapshot of the active stack.
    #[inline]
    pub fn state(&self) -> &Snapshot {
        self.active_stack().current()
    }

    /// Saved snapshots on the active stack.
    #[inline]
    pub fn state_depth(&self) -> usize {
        self.active_stack().depth()
    }

    /// Saves the current state.
    ///
    /// # Panics
    /// Panics if the active stack is full.
    pub fn push_state(&mut self) {
        self.active_stack_mut().push();
    }

    /// Restores the state saved by the matching [`push_state`](Self::push_state).
    ///
    /// # Panics
    /// Panics if nothing was pushed.
    pub fn pop_state(&mut self) {
        self.active_stack_mut().pop();
    }

    /// Drops all saved states of the active stack; the current state is kept.
    pub fn clear_state_stack(&mut self) {
        self.active_stack_mut().clear();
    }

    pub fn set_blend_mode(&mut self, mode: BlendMode) {
        self.current_mut().blend_mode = mode;
    }

    pub fn set_transform(&mut self, transform: Mat4) {
        self.current_mut().transform = transform;
    }

    pub fn set_projection(&mut self, projection: Mat4) {
        self.current_mut().projection = projection;
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.current_mut().viewport = viewport;
    }

    pub fn set_line_width(&mut self, width: f32) {
        self.current_mut().line_width = width;
    }

    pub fn reset_blend_mode(&mut self) {
        let d = self.default_snapshot();
        self.current_mut().blend_mode = d.blend_mode;
    }

    pub fn reset_transform(&mut self) {
        let d = self.default_snapshot();
        self.current_mut().transform = d.transform;
    }

    pub fn reset_projection(&mut self) {
        let d = self.default_snapshot();
        self.current_mut().projection = d.projection;
    }

    /// Resets the viewport to the full extent of the active draw destination.
    pub fn reset_viewport(&mut self) {
        let d = self.default_snapshot();
        self.current_mut().viewport = d.viewport;
    }

    pub fn reset_line_width(&mut self) {
        let d = self.default_snapshot();
        self.current_mut().line_width = d.line_width;
    }

    /// Resets every field of the current state. Saved states are kept.
    pub fn reset_state(&mut self) {
        let d = self.default_snapshot();
        *self.current_mut() = d;
    }
}

impl<D: Device> fmt::Debug for Context<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("limits", &self.limits)
            .field("drawable", &(self.width, self.height))
            .field("bound_shader", &self.bound_shader())
            .field("bound_texture", &self.bound_texture())
            .field("render_target", &self.render_target())
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

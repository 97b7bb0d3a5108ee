//! Render-target textures and the target switch protocol.

use crate::coords::Viewport;
use crate::device::{Attachment, Device, FramebufferStatus, RenderbufferFormat};
use crate::error::{Error, Result};
use crate::state::Snapshot;
use crate::texture::{Multisample, TargetAttachments, Texture, TextureDesc};

use super::Context;

/// Objects allocated while building a target, released newest first on failure.
enum Allocation<D: Device> {
    Texture(D::Texture),
    Framebuffer(D::Framebuffer),
    Renderbuffer(D::Renderbuffer),
}

struct Allocations<D: Device>(Vec<Allocation<D>>);

impl<D: Device> Allocations<D> {
    fn new() -> Self {
        Self(Vec::with_capacity(6))
    }

    fn texture(&mut self, result: Result<D::Texture>) -> Result<D::Texture> {
        let t = result?;
        self.0.push(Allocation::Texture(t));
        Ok(t)
    }

    fn framebuffer(&mut self, result: Result<D::Framebuffer>) -> Result<D::Framebuffer> {
        let f = result?;
        self.0.push(Allocation::Framebuffer(f));
        Ok(f)
    }

    fn renderbuffer(&mut self, result: Result<D::Renderbuffer>) -> Result<D::Renderbuffer> {
        let r = result?;
        self.0.push(Allocation::Renderbuffer(r));
        Ok(r)
    }

    fn release(self, device: &mut D) {
        for allocation in self.0.into_iter().rev() {
            match allocation {
                Allocation::Texture(t) => device.delete_texture(t),
                Allocation::Framebuffer(f) => device.delete_framebuffer(f),
                Allocation::Renderbuffer(r) => device.delete_renderbuffer(r),
            }
        }
    }
}

impl<D: Device> Context<D> {
    /// Creates a texture that can be bound with
    /// [`set_render_target`](Self::set_render_target).
    ///
    /// Depth and multisampling follow the context configuration; the sample
    /// count is clamped to the device maximum. `desc.mipmaps` is ignored.
    pub fn create_target_texture(&mut self, desc: &TextureDesc) -> Result<Texture<D>> {
        let result = self.prepare_desc(desc).and_then(|mut desc| {
            desc.mipmaps = false;
            let mut allocations = Allocations::new();
            match self.build_target(&desc, &mut allocations) {
                Ok((handle, target)) => Ok(Texture {
                    id: self.ids.next(),
                    handle,
                    desc,
                    mipmapped: false,
                    target: Some(target),
                }),
                Err(err) => {
                    allocations.release(&mut self.device);
                    Err(err)
                }
            }
        });
        let texture = self.record(result)?;
        log::debug!(
            "render target {:?} created ({}x{}, samples {}, depth {})",
            texture.id,
            texture.width(),
            texture.height(),
            texture.samples(),
            texture.has_depth()
        );
        Ok(texture)
    }

    fn build_target(
        &mut self,
        desc: &TextureDesc,
        allocations: &mut Allocations<D>,
    ) -> Result<(D::Texture, TargetAttachments<D>)> {
        let (width, height) = (desc.width, desc.height);
        let device = &mut self.device;

        let image = allocations.texture(device.create_texture(desc, None))?;
        let framebuffer = allocations.framebuffer(device.create_framebuffer())?;
        device.attach_texture(framebuffer, Attachment::Color0, image);

        let depth = if self.config.depth {
            let depth = allocations.texture(device.create_depth_texture(width, height))?;
            device.attach_texture(framebuffer, Attachment::Depth, depth);
            Some(depth)
        } else {
            None
        };

        let samples = self.config.samples.min(self.limits.max_samples);
        if samples < self.config.samples {
            log::warn!(
                "requested {} samples, device supports {}; clamping",
                self.config.samples,
                self.limits.max_samples
            );
        }

        let msaa = if samples > 0 {
            let msaa_framebuffer = allocations.framebuffer(device.create_framebuffer())?;
            let color = allocations.renderbuffer(device.create_renderbuffer(
                RenderbufferFormat::color(desc.format, desc.srgb),
                samples,
                width,
                height,
            ))?;
            device.attach_renderbuffer(msaa_framebuffer, Attachment::Color0, color);

            let msaa_depth = if self.config.depth {
                let rb = allocations.renderbuffer(device.create_renderbuffer(
                    RenderbufferFormat::Depth24,
                    samples,
                    width,
                    height,
                ))?;
                device.attach_renderbuffer(msaa_framebuffer, Attachment::Depth, rb);
                Some(rb)
            } else {
                None
            };

            Some(Multisample {
                framebuffer: msaa_framebuffer,
                color,
                depth: msaa_depth,
                samples,
            })
        } else {
            None
        };

        check_complete(device, framebuffer)?;
        if let Some(msaa) = &msaa {
            check_complete(device, msaa.framebuffer)?;
        }

        Ok((
            image,
            TargetAttachments {
                framebuffer,
                depth,
                msaa,
            },
        ))
    }

    /// Redirects draws into `texture`, or back to the drawable surface with `None`.
    ///
    /// Leaving a multisampled target resolves it into its texture. Entering a
    /// target resets that target's state stack to the texture's full extent.
    /// Binding the already-bound target does nothing.
    ///
    /// # Panics
    /// Panics if `texture` was not created as a render target.
    pub fn set_render_target(&mut self, texture: Option<&Texture<D>>) {
        let next = texture.map(|t| match t.binding() {
            Some(binding) => binding,
            None => panic!("texture {:?} is not a render target", t.id),
        });

        if self.target.map(|t| t.id) == next.map(|t| t.id) {
            return;
        }

        if let Some(prev) = self.target.take() {
            if let Some(msaa) = prev.msaa_framebuffer {
                self.device
                    .resolve(msaa, prev.framebuffer, prev.width, prev.height);
            }
        }

        match next {
            Some(binding) => {
                self.device.bind_framebuffer(Some(binding.draw_framebuffer()));
                self.target_stack.reset(Snapshot::new(Viewport::full(
                    binding.width,
                    binding.height,
                )));
                log::debug!("render target -> {:?}", binding.id);
            }
            None => {
                self.device.bind_framebuffer(None);
                log::debug!("render target -> drawable");
            }
        }

        self.target = next;
        self.invalidate_state();
    }
}

fn check_complete<D: Device>(device: &mut D, framebuffer: D::Framebuffer) -> Result<()> {
    match device.framebuffer_status(framebuffer) {
        FramebufferStatus::Complete => Ok(()),
        FramebufferStatus::Incomplete(status) => Err(Error::FramebufferIncomplete(status)),
    }
}

#[cfg(test)]
mod tests {
    use super::super::ContextConfig;
    use super::super::tests::{headless, small};
    use crate::buffer::Vertex;
    use crate::device::{Call, Capability, HeadlessDevice, PixelFormat, Topology};
    use crate::error::ErrorCode;
    use crate::shader::{DEFAULT_FRAGMENT_SOURCE, DEFAULT_VERTEX_SOURCE};

    use super::*;

    const TRI: [Vertex; 3] = [Vertex::new([0.0; 3], [1.0; 4], [0.0; 2]); 3];

    fn rgba(w: u32, h: u32) -> TextureDesc {
        TextureDesc::new(w, h, PixelFormat::Rgba8)
    }

    fn resolves(ctx: &Context<HeadlessDevice>) -> usize {
        ctx.device().count(|c| matches!(c, Call::Resolve { .. }))
    }

    // ── creation ─────────────────────────────────────────────────────────

    #[test]
    fn plain_target_is_complete() {
        let mut ctx = headless(small());
        let t = ctx.create_target_texture(&rgba(64, 64)).unwrap();

        assert!(t.is_render_target());
        assert!(!t.has_depth());
        assert_eq!(t.samples(), 0);
        assert_eq!(ctx.device().live_framebuffers(), 1);
        assert_eq!(ctx.device().live_renderbuffers(), 0);
        assert!(ctx.last_error().is_none());
    }

    #[test]
    fn samples_clamp_to_device_maximum() {
        let mut ctx = headless(ContextConfig {
            samples: 64,
            ..small()
        });
        let t = ctx.create_target_texture(&rgba(64, 64)).unwrap();
        assert_eq!(t.samples(), 8);
        assert!(ctx.device().calls().contains(&Call::CreateRenderbuffer {
            renderbuffer: 4,
            format: RenderbufferFormat::Rgba8,
            samples: 8,
        }));
    }

    #[test]
    fn msaa_depth_target_allocates_full_graph() {
        let mut ctx = headless(ContextConfig {
            samples: 4,
            depth: true,
            ..small()
        });
        let t = ctx.create_target_texture(&rgba(32, 16)).unwrap();
        assert!(t.has_depth());
        assert_eq!(t.samples(), 4);
        // image + depth texture, two framebuffers, color + depth renderbuffers
        assert_eq!(ctx.device().live_textures(), 2);
        assert_eq!(ctx.device().live_framebuffers(), 2);
        assert_eq!(ctx.device().live_renderbuffers(), 2);

        ctx.destroy_texture(t);
        assert_eq!(ctx.device().live_objects(), 0);
    }

    #[test]
    fn srgb_target_uses_srgb_renderbuffer() {
        let mut ctx = headless(ContextConfig {
            samples: 2,
            srgb: true,
            ..small()
        });
        ctx.create_target_texture(&rgba(8, 8)).unwrap();
        let srgb = ctx.device().count(|c| {
            matches!(
                c,
                Call::CreateRenderbuffer {
                    format: RenderbufferFormat::Srgb8Alpha8,
                    ..
                }
            )
        });
        assert_eq!(srgb, 1);
    }

    fn color_renderbuffer_formats(ctx: &Context<HeadlessDevice>) -> Vec<RenderbufferFormat> {
        ctx.device()
            .calls()
            .iter()
            .filter_map(|c| match c {
                Call::CreateRenderbuffer { format, .. } if *format != RenderbufferFormat::Depth24 => {
                    Some(*format)
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn msaa_color_storage_follows_texture_format() {
        let mut ctx = headless(ContextConfig {
            samples: 4,
            ..small()
        });
        for format in [PixelFormat::R8, PixelFormat::Rg8, PixelFormat::Rgb8] {
            ctx.create_target_texture(&TextureDesc::new(8, 8, format)).unwrap();
        }
        assert_eq!(
            color_renderbuffer_formats(&ctx),
            [
                RenderbufferFormat::R8,
                RenderbufferFormat::Rg8,
                RenderbufferFormat::Rgb8,
            ]
        );
    }

    #[test]
    fn srgb_rgb_target_gets_srgb8_storage() {
        let mut ctx = headless(ContextConfig {
            samples: 4,
            srgb: true,
            ..small()
        });
        let t = ctx
            .create_target_texture(&TextureDesc::new(8, 8, PixelFormat::Rgb8))
            .unwrap();
        assert!(t.desc().srgb);
        let r8 = ctx
            .create_target_texture(&TextureDesc::new(8, 8, PixelFormat::R8))
            .unwrap();
        assert!(!r8.desc().srgb);
        assert_eq!(
            color_renderbuffer_formats(&ctx),
            [RenderbufferFormat::Srgb8, RenderbufferFormat::R8]
        );
    }

    #[test]
    fn incomplete_framebuffer_rolls_back_in_reverse() {
        let mut ctx = headless(ContextConfig {
            samples: 4,
            depth: true,
            ..small()
        });
        ctx.device_mut().fail_framebuffers_with(0x8CD6);
        let before = ctx.device().live_objects();

        let err = ctx.create_target_texture(&rgba(64, 64)).unwrap_err();
        assert_eq!(err, Error::FramebufferIncomplete(0x8CD6));
        assert_eq!(ctx.last_error(), Some(&err));
        assert_eq!(ctx.device().live_objects(), before);

        let deletes: Vec<&Call> = ctx
            .device()
            .calls()
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    Call::DeleteTexture(_) | Call::DeleteFramebuffer(_) | Call::DeleteRenderbuffer(_)
                )
            })
            .collect();
        // Handles were allocated 1..=6 in creation order.
        assert_eq!(
            deletes,
            [
                &Call::DeleteRenderbuffer(6),
                &Call::DeleteRenderbuffer(5),
                &Call::DeleteFramebuffer(4),
                &Call::DeleteTexture(3),
                &Call::DeleteFramebuffer(2),
                &Call::DeleteTexture(1),
            ]
        );
    }

    #[test]
    fn oversized_target_is_rejected() {
        let mut ctx = headless(small());
        let err = ctx.create_target_texture(&rgba(8192, 8)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidDimensions);
        assert_eq!(ctx.device().live_objects(), 0);
    }

    // ── switching ────────────────────────────────────────────────────────

    fn switch_scenario(samples: u32) -> usize {
        let mut ctx = headless(ContextConfig {
            samples,
            ..small()
        });
        let shader = ctx
            .create_shader(DEFAULT_VERTEX_SOURCE, DEFAULT_FRAGMENT_SOURCE)
            .unwrap();
        let a = ctx.create_target_texture(&rgba(64, 64)).unwrap();
        let b = ctx.create_target_texture(&rgba(32, 32)).unwrap();

        ctx.set_render_target(Some(&a));
        ctx.draw_vertices(&shader, None, Topology::Triangles, &TRI).unwrap();
        ctx.set_render_target(Some(&b));
        ctx.draw_vertices(&shader, None, Topology::Triangles, &TRI).unwrap();
        ctx.set_render_target(None);
        resolves(&ctx)
    }

    #[test]
    fn leaving_msaa_targets_resolves_each_once() {
        assert_eq!(switch_scenario(4), 2);
    }

    #[test]
    fn single_sampled_targets_never_resolve() {
        assert_eq!(switch_scenario(0), 0);
    }

    #[test]
    fn resolve_blits_msaa_into_plain_framebuffer() {
        let mut ctx = headless(ContextConfig {
            samples: 4,
            ..small()
        });
        let t = ctx.create_target_texture(&rgba(64, 32)).unwrap();
        let binding = t.binding().unwrap();

        ctx.set_render_target(Some(&t));
        assert!(
            ctx.device()
                .calls()
                .contains(&Call::BindFramebuffer(binding.msaa_framebuffer))
        );
        ctx.set_render_target(None);

        assert!(ctx.device().calls().contains(&Call::Resolve {
            src: binding.draw_framebuffer(),
            dst: binding.framebuffer,
            width: 64,
            height: 32,
        }));
        assert_eq!(ctx.device().calls().last(), Some(&Call::BindFramebuffer(None)));
    }

    #[test]
    fn self_transition_is_a_no_op() {
        let mut ctx = headless(small());
        let t = ctx.create_target_texture(&rgba(16, 16)).unwrap();
        ctx.set_render_target(Some(&t));
        ctx.device_mut().clear_calls();

        ctx.set_render_target(Some(&t));
        ctx.set_render_target(None);
        ctx.set_render_target(None);
        assert_eq!(ctx.device().calls(), &[Call::BindFramebuffer(None)]);
    }

    #[test]
    fn entering_target_resets_its_stack() {
        let mut ctx = headless(small());
        let t = ctx.create_target_texture(&rgba(64, 64)).unwrap();

        ctx.set_render_target(Some(&t));
        ctx.push_state();
        ctx.set_line_width(5.0);
        ctx.set_render_target(None);
        assert_eq!(ctx.state().viewport, Viewport::new(0, 0, 640, 480));

        ctx.set_render_target(Some(&t));
        assert_eq!(ctx.state_depth(), 0);
        assert_eq!(*ctx.state(), Snapshot::new(Viewport::new(0, 0, 64, 64)));
    }

    #[test]
    fn switching_between_targets_resets_the_entered_stack() {
        let mut ctx = headless(ContextConfig {
            samples: 4,
            ..small()
        });
        let a = ctx.create_target_texture(&rgba(64, 64)).unwrap();
        let b = ctx.create_target_texture(&rgba(32, 16)).unwrap();

        ctx.set_render_target(Some(&a));
        ctx.push_state();
        ctx.push_state();
        ctx.set_line_width(3.0);
        ctx.set_viewport(Viewport::new(4, 4, 8, 8));

        ctx.set_render_target(Some(&b));
        assert_eq!(ctx.state_depth(), 0);
        assert_eq!(*ctx.state(), Snapshot::new(Viewport::new(0, 0, 32, 16)));
        ctx.push_state();
        ctx.set_line_width(9.0);

        ctx.set_render_target(Some(&a));
        assert_eq!(ctx.render_target(), Some(a.id()));
        assert_eq!(ctx.state_depth(), 0);
        assert_eq!(*ctx.state(), Snapshot::new(Viewport::new(0, 0, 64, 64)));
        // Leaving `a` and then `b` resolved each once.
        assert_eq!(resolves(&ctx), 2);
    }

    #[test]
    fn default_stack_survives_target_round_trip() {
        let mut ctx = headless(small());
        let t = ctx.create_target_texture(&rgba(64, 64)).unwrap();
        ctx.push_state();
        ctx.set_line_width(2.0);

        ctx.set_render_target(Some(&t));
        ctx.set_line_width(7.0);
        ctx.set_render_target(None);

        assert_eq!(ctx.state_depth(), 1);
        assert_eq!(ctx.state().line_width, 2.0);
    }

    #[test]
    fn first_draw_after_switch_applies_everything() {
        let mut ctx = headless(small());
        let shader = ctx
            .create_shader(DEFAULT_VERTEX_SOURCE, DEFAULT_FRAGMENT_SOURCE)
            .unwrap();
        let t = ctx.create_target_texture(&rgba(64, 64)).unwrap();
        ctx.draw_vertices(&shader, None, Topology::Triangles, &TRI).unwrap();

        ctx.set_render_target(Some(&t));
        ctx.device_mut().clear_calls();
        ctx.draw_vertices(&shader, None, Topology::Triangles, &TRI).unwrap();

        let applied = ctx.device().count(Call::is_state_change);
        assert_eq!(applied, 5);
        assert!(
            ctx.device()
                .calls()
                .contains(&Call::SetViewport(Viewport::new(0, 0, 64, 64)))
        );
    }

    #[test]
    fn depth_target_enables_depth_test_around_draws() {
        let mut ctx = headless(ContextConfig {
            depth: true,
            ..small()
        });
        let shader = ctx
            .create_shader(DEFAULT_VERTEX_SOURCE, DEFAULT_FRAGMENT_SOURCE)
            .unwrap();
        let t = ctx.create_target_texture(&rgba(8, 8)).unwrap();
        ctx.set_render_target(Some(&t));
        ctx.draw_vertices(&shader, None, Topology::Triangles, &TRI).unwrap();

        let calls = ctx.device().calls();
        assert!(calls.contains(&Call::SetCapability(Capability::DepthTest, true)));
        assert!(calls.contains(&Call::SetCapability(Capability::DepthTest, false)));
    }

    #[test]
    fn destroying_bound_target_falls_back_without_resolve() {
        let mut ctx = headless(ContextConfig {
            samples: 4,
            ..small()
        });
        let t = ctx.create_target_texture(&rgba(16, 16)).unwrap();
        ctx.set_render_target(Some(&t));
        ctx.destroy_texture(t);

        assert_eq!(ctx.render_target(), None);
        assert_eq!(resolves(&ctx), 0);
        assert_eq!(ctx.device().live_objects(), 0);
    }

    #[test]
    #[should_panic(expected = "not a render target")]
    fn plain_texture_cannot_be_a_target() {
        let mut ctx = headless(small());
        let t = ctx.create_texture(&rgba(4, 4), None).unwrap();
        ctx.set_render_target(Some(&t));
    }

    #[test]
    #[should_panic(expected = "bound as the render target")]
    fn sampling_the_bound_target_panics() {
        let mut ctx = headless(small());
        let shader = ctx
            .create_shader(DEFAULT_VERTEX_SOURCE, DEFAULT_FRAGMENT_SOURCE)
            .unwrap();
        let t = ctx.create_target_texture(&rgba(4, 4)).unwrap();
        ctx.set_render_target(Some(&t));
        let _ = ctx.draw_vertices(&shader, Some(&t), Topology::Triangles, &TRI);
    }
}

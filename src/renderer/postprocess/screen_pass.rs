//! Screen-space pass runner: one full-screen triangle draw per invocation.
//!
//! Every post pass funnels through [`ScreenPassRunner::run`], which is the
//! only place a full-screen draw is issued. The per-frame pass counter this
//! yields is what frame statistics (and the bypass-mode guarantee of zero
//! screen passes) are built on.

/// A fully bound full-screen pass: pipeline, bindings, and destination.
///
/// The caller sets every uniform the pass reads before handing this to
/// [`ScreenPassRunner::run`]; running has no side effects beyond the draw.
pub struct PassInvocation<'a> {
    /// Debug label for the encoded render pass.
    pub label: &'static str,
    /// Full-screen pipeline with `vs_main`/`fs_main` entry points.
    pub pipeline: &'a wgpu::RenderPipeline,
    /// Bind group 0, holding the pass's textures, samplers, and uniforms.
    pub bind_group: &'a wgpu::BindGroup,
    /// Destination view: an offscreen surface or the swapchain.
    pub target: &'a wgpu::TextureView,
}

/// Executes full-screen passes and counts them per frame.
#[derive(Default)]
pub struct ScreenPassRunner {
    passes_this_frame: u32,
}

impl ScreenPassRunner {
    /// A runner with a zeroed pass counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the per-frame pass counter.
    pub fn begin_frame(&mut self) {
        self.passes_this_frame = 0;
    }

    /// Encode one full-screen triangle draw into `invocation.target`.
    pub fn run(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        invocation: &PassInvocation<'_>,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(invocation.label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: invocation.target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            ..Default::default()
        });
        pass.set_pipeline(invocation.pipeline);
        pass.set_bind_group(0, invocation.bind_group, &[]);
        pass.draw(0..3, 0..1);
        self.passes_this_frame += 1;
    }

    /// Number of full-screen passes encoded since
    /// [`begin_frame`](Self::begin_frame).
    pub fn pass_count(&self) -> u32 {
        self.passes_this_frame
    }
}

//! The post-processing pipeline: owns every surface and pass, and encodes
//! one frame per [`PostPipeline::update`] call.
//!
//! A frame renders the scene offscreen, then walks the stage plan for the
//! frame's mode (see [`super::plan`]): anti-aliasing, optional motion blur,
//! bright extraction, the progressive mip blur, bloom composite, an optional
//! directional focus blur while a zoom transition is live, and the final
//! composite to the swapchain. All parameter uploads happen before the
//! encoder is submitted; camera history is stored after encoding so motion
//! vectors always compare against the previous frame.
//!
//! Bypass mode (`set_enabled(false)`) renders the scene straight to the
//! swapchain with zero full-screen passes, which is the baseline frame
//! statistics are measured against.

use super::antialias::FxaaPass;
use super::bloom_composite::BloomCompositePass;
use super::bright::BrightPass;
use super::final_composite::FinalCompositePass;
use super::focus_blur::FocusBlurPass;
use super::mip_blur::MipBlurPass;
use super::motion_blur::{CameraHistory, MotionBlurPass};
use super::plan::{self, FrameMode, Stage};
use super::screen_pass::{PassInvocation, ScreenPassRunner};
use super::targets::{PoolSizes, TargetPool, MIP_LEVELS};
use crate::animate::{Animator, Easing, Tween};
use crate::camera::Camera;
use crate::error::AfterglowError;
use crate::gpu::render_context::RenderContext;
use crate::gpu::shader_composer::ShaderComposer;
use crate::options::PostProcessingOptions;
use crate::renderer::SceneRenderer;
use crate::util::frame_clock::FrameTick;

/// Seconds the zoom-in transition holds before blur ramps up.
pub const ZOOM_IN_DELAY: f64 = 0.3;
/// Seconds the zoom-in blur ramp takes after its delay.
pub const ZOOM_IN_DURATION: f64 = 1.0;
/// Seconds the zoom-out blur release takes (no delay).
pub const ZOOM_OUT_DURATION: f64 = 0.3;

/// Scene clear color, a near-black blue that reads as "off" next to bloom.
const SCENE_CLEAR: wgpu::Color = wgpu::Color {
    r: 0.004,
    g: 0.005,
    b: 0.009,
    a: 1.0,
};

/// Counts of draw work submitted for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// Scene geometry passes encoded (always 1).
    pub scene_draws: u32,
    /// Full-screen post passes encoded (0 in bypass mode).
    pub screen_passes: u32,
}

/// Runtime post-processing parameters.
///
/// `focus` here is the target point; the pipeline eases its live focus
/// toward it at `focus_lerp_speed` per frame, so snapping the target never
/// snaps the image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineParams {
    /// Minimum luminance that leaks into bloom.
    pub bloom_threshold: f32,
    /// Softness of the threshold knee.
    pub bloom_smoothing: f32,
    /// Overall bloom intensity.
    pub bloom_strength: f32,
    /// Balance between fine and coarse bloom levels.
    pub bloom_radius: f32,
    /// Camera-velocity blur scale; zero disables the motion blur stage.
    pub velocity_scale: f32,
    /// Focal point target in normalized viewport coordinates.
    pub focus: [f32; 2],
    /// Focal band rotation in radians.
    pub focus_rotation: f32,
    /// Exponential easing rate for the live focus point, per second.
    pub focus_lerp_speed: f32,
    /// Chromatic fringe strength during zoom transitions.
    pub distortion: f32,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            bloom_threshold: 0.1,
            bloom_smoothing: 1.0,
            bloom_strength: 0.3,
            bloom_radius: 0.2,
            velocity_scale: 1.0,
            focus: [0.5, 0.5],
            focus_rotation: 0.0,
            focus_lerp_speed: 5.0,
            distortion: 1.0,
        }
    }
}

impl From<&PostProcessingOptions> for PipelineParams {
    fn from(options: &PostProcessingOptions) -> Self {
        Self {
            bloom_threshold: options.bloom_threshold,
            bloom_smoothing: options.bloom_smoothing,
            bloom_strength: options.bloom_strength,
            bloom_radius: options.bloom_radius,
            velocity_scale: options.velocity_scale,
            focus: options.focus,
            focus_rotation: options.focus_rotation,
            focus_lerp_speed: options.focus_lerp_speed,
            distortion: options.distortion,
        }
    }
}

/// The single animated channel a zoom transition drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ZoomChannel {
    #[default]
    BlurFactor,
}

/// Cancel-and-replace zoom state machine over the blur factor.
///
/// Zoom-in holds for [`ZOOM_IN_DELAY`], then ramps to 1 with a back-out
/// overshoot; zoom-out releases linearly to 0 with no delay. Because the
/// animator keeps one tween per channel, issuing either command mid-flight
/// replaces the pending transition outright, so a zoom-out during the
/// zoom-in delay wins immediately.
#[derive(Debug, Default)]
pub struct ZoomTransition {
    animator: Animator<ZoomChannel>,
    factor: f32,
    zoomed_in: bool,
}

impl ZoomTransition {
    /// Begin a zoom-in at timeline second `now`.
    pub fn zoom_in(&mut self, now: f64) {
        self.zoomed_in = true;
        self.animator.start(
            ZoomChannel::BlurFactor,
            Tween::new(self.factor, 1.0)
                .delay(ZOOM_IN_DELAY)
                .duration(ZOOM_IN_DURATION)
                .easing(Easing::BackOut),
            now,
        );
    }

    /// Begin a zoom-out at timeline second `now`.
    pub fn zoom_out(&mut self, now: f64) {
        self.zoomed_in = false;
        self.animator.start(
            ZoomChannel::BlurFactor,
            Tween::new(self.factor, 0.0)
                .duration(ZOOM_OUT_DURATION)
                .easing(Easing::Linear),
            now,
        );
    }

    /// Cancel any pending transition and snap the blur factor to zero.
    pub fn reset(&mut self) {
        let _ = self.animator.cancel(ZoomChannel::BlurFactor);
        self.factor = 0.0;
        self.zoomed_in = false;
    }

    /// Advance to `now` and return the current blur factor. The back-out
    /// ramp intentionally overshoots 1 near its end.
    pub fn advance(&mut self, now: f64) -> f32 {
        let mut factor = self.factor;
        let _ = self
            .animator
            .update(now, |ZoomChannel::BlurFactor, value| factor = value);
        self.factor = factor;
        factor
    }

    /// Whether the last command was a zoom-in.
    #[must_use]
    pub fn zoomed_in(&self) -> bool {
        self.zoomed_in
    }

    /// Current blur factor without advancing time.
    #[must_use]
    pub fn factor(&self) -> f32 {
        self.factor
    }
}

/// Owns the target pool, every pass, and the per-frame orchestration.
pub struct PostPipeline {
    pool: TargetPool,
    runner: ScreenPassRunner,
    fxaa: FxaaPass,
    motion_blur: MotionBlurPass,
    bright: BrightPass,
    mip_blur: MipBlurPass,
    bloom_composite: BloomCompositePass,
    focus_blur: FocusBlurPass,
    final_composite: FinalCompositePass,
    history: CameraHistory,
    zoom: ZoomTransition,
    params: PipelineParams,
    /// Live focus point, eased toward `params.focus` each frame.
    focus: [f32; 2],
    bright_dirty: bool,
    bloom_dirty: bool,
    sizes: PoolSizes,
    display_size: (u32, u32),
    enabled: bool,
    time: f64,
}

impl PostPipeline {
    /// Build every pass against 1x1 placeholder surfaces; call
    /// [`resize`](Self::resize) before the first frame. The pipeline begins
    /// in bypass mode until [`start`](Self::start).
    ///
    /// # Errors
    ///
    /// Returns [`AfterglowError::ShaderCompose`] when any pass shader fails
    /// to compose.
    pub fn new(context: &RenderContext) -> Result<Self, AfterglowError> {
        let mut composer = ShaderComposer::new()?;
        let pool = TargetPool::new(&context.device, context.format());

        let fxaa = FxaaPass::new(context, &mut composer, pool.scene.view())?;
        let motion_blur = MotionBlurPass::new(
            context,
            &mut composer,
            pool.smoothed.view(),
            pool.scene_depth.view(),
        )?;
        let bright = BrightPass::new(
            context,
            &mut composer,
            pool.smoothed.view(),
            pool.motion.view(),
        )?;
        let mip_blur = MipBlurPass::new(context, &mut composer, &pool)?;
        let bloom_composite =
            BloomCompositePass::new(context, &mut composer, &pool)?;
        let focus_blur = FocusBlurPass::new(context, &mut composer, &pool)?;
        let final_composite =
            FinalCompositePass::new(context, &mut composer, &pool)?;

        let params = PipelineParams::default();
        Ok(Self {
            pool,
            runner: ScreenPassRunner::new(),
            fxaa,
            motion_blur,
            bright,
            mip_blur,
            bloom_composite,
            focus_blur,
            final_composite,
            history: CameraHistory::default(),
            zoom: ZoomTransition::default(),
            focus: params.focus,
            params,
            bright_dirty: true,
            bloom_dirty: true,
            sizes: PoolSizes::compute(1.0, 1.0, 1.0),
            display_size: (1, 1),
            enabled: false,
            time: 0.0,
        })
    }

    /// Resize every surface for a logical viewport at a pixel ratio and
    /// rebind all passes. No-op when nothing changes. Fold any
    /// supersampling factor into `pixel_ratio`.
    pub fn resize(
        &mut self,
        context: &RenderContext,
        width: f64,
        height: f64,
        pixel_ratio: f64,
    ) {
        let sizes = PoolSizes::compute(width, height, pixel_ratio);
        let display_size = (context.config.width, context.config.height);
        if sizes == self.sizes && display_size == self.display_size {
            return;
        }
        log::info!(
            "pipeline resize: physical {:?}, bloom base {:?}",
            sizes.physical,
            sizes.bloom_base
        );
        self.pool.resize(&context.device, &sizes, display_size);
        self.fxaa
            .rebind(context, self.pool.scene.view(), sizes.physical);
        self.motion_blur.rebind(
            context,
            self.pool.smoothed.view(),
            self.pool.scene_depth.view(),
        );
        self.bright.rebind(
            context,
            self.pool.smoothed.view(),
            self.pool.motion.view(),
        );
        self.mip_blur.rebind(context, &self.pool, &sizes);
        self.bloom_composite.rebind(context, &self.pool);
        self.focus_blur.rebind(context, &self.pool);
        self.final_composite.rebind(context, &self.pool);
        self.sizes = sizes;
        self.display_size = display_size;
    }

    /// Replace all runtime parameters, e.g. from a loaded preset.
    pub fn apply_options(&mut self, options: &PostProcessingOptions) {
        self.params = PipelineParams::from(options);
        self.bright_dirty = true;
        self.bloom_dirty = true;
    }

    /// Current runtime parameters.
    #[must_use]
    pub fn params(&self) -> &PipelineParams {
        &self.params
    }

    /// Set the bloom luminance threshold.
    pub fn set_bloom_threshold(&mut self, value: f32) {
        self.params.bloom_threshold = value;
        self.bright_dirty = true;
    }

    /// Set the bloom threshold knee softness.
    pub fn set_bloom_smoothing(&mut self, value: f32) {
        self.params.bloom_smoothing = value;
        self.bright_dirty = true;
    }

    /// Set the overall bloom intensity.
    pub fn set_bloom_strength(&mut self, value: f32) {
        self.params.bloom_strength = value;
        self.bloom_dirty = true;
    }

    /// Set the bloom fine/coarse balance.
    pub fn set_bloom_radius(&mut self, value: f32) {
        self.params.bloom_radius = value;
        self.bloom_dirty = true;
    }

    /// Set the motion blur velocity scale; zero skips the stage entirely.
    pub fn set_velocity_scale(&mut self, value: f32) {
        self.params.velocity_scale = value;
    }

    /// Set the focal point target; the live focus eases toward it.
    pub fn set_focus(&mut self, focus: [f32; 2]) {
        self.params.focus = focus;
    }

    /// Set the focal band rotation in radians.
    pub fn set_focus_rotation(&mut self, radians: f32) {
        self.params.focus_rotation = radians;
    }

    /// Set the focus easing rate per second.
    pub fn set_focus_lerp_speed(&mut self, value: f32) {
        self.params.focus_lerp_speed = value;
    }

    /// Set the chromatic fringe strength.
    pub fn set_distortion(&mut self, value: f32) {
        self.params.distortion = value;
    }

    /// Enable or bypass the whole post chain.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether the post chain runs (false = bypass straight to swapchain).
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Leave bypass mode with a sharp image: the blur factor snaps to zero,
    /// any pending zoom transition is dropped, and full pipeline execution
    /// begins with the next [`update`](Self::update).
    pub fn start(&mut self) {
        self.zoom.reset();
        self.enabled = true;
        log::info!("post pipeline started");
    }

    /// Start a zoom-in transition on the pipeline's timeline.
    pub fn zoom_in(&mut self) {
        self.zoom.zoom_in(self.time);
    }

    /// Start a zoom-out transition on the pipeline's timeline.
    pub fn zoom_out(&mut self) {
        self.zoom.zoom_out(self.time);
    }

    /// Whether the last zoom command was a zoom-in.
    #[must_use]
    pub fn zoomed_in(&self) -> bool {
        self.zoom.zoomed_in()
    }

    /// The directional blur factor as of the last frame.
    #[must_use]
    pub fn blur_factor(&self) -> f32 {
        self.zoom.factor()
    }

    /// Render one frame into `output`.
    ///
    /// Encodes the scene pass plus the stage plan for this frame's mode,
    /// submits, and stores the camera history for the next frame's motion
    /// vectors.
    pub fn update(
        &mut self,
        context: &RenderContext,
        scene: &mut dyn SceneRenderer,
        camera: &Camera,
        tick: FrameTick,
        output: &wgpu::TextureView,
    ) -> FrameStats {
        self.time = tick.time;
        self.runner.begin_frame();
        scene.prepare(&context.queue, camera);
        let mut encoder = context.create_encoder();

        if !self.enabled {
            {
                let mut pass = begin_scene_pass(
                    &mut encoder,
                    output,
                    self.pool.display_depth.view(),
                );
                scene.draw(&mut pass);
            }
            context.submit(encoder);
            self.history.store(camera);
            return FrameStats {
                scene_draws: 1,
                screen_passes: 0,
            };
        }

        let blur_factor = self.zoom.advance(tick.time);
        self.ease_focus(tick.delta);
        let mode = FrameMode::select(blur_factor, self.params.velocity_scale);

        if self.bright_dirty {
            self.bright.set_params(
                &context.queue,
                self.params.bloom_threshold,
                self.params.bloom_smoothing,
            );
            self.bright_dirty = false;
        }
        if self.bloom_dirty {
            self.bloom_composite.set_weights(
                &context.queue,
                self.params.bloom_strength,
                self.params.bloom_radius,
            );
            self.bloom_dirty = false;
        }

        let (pw, ph) = self.sizes.physical;
        let aspect = pw as f32 / ph as f32;
        if mode == FrameMode::MotionBlur {
            self.motion_blur.write_params(
                &context.queue,
                camera,
                &self.history,
                self.params.velocity_scale,
                tick.delta as f32,
            );
        }
        if mode == FrameMode::DirectionalBlur {
            self.focus_blur.write_params(
                &context.queue,
                self.focus,
                self.params.focus_rotation,
                blur_factor,
                aspect,
            );
        }
        self.final_composite.write_params(
            &context.queue,
            self.focus,
            self.params.focus_rotation,
            blur_factor,
            self.params.distortion,
            aspect,
        );

        for stage in plan::stages(mode).iter().copied() {
            match stage {
                Stage::Scene => {
                    let mut pass = begin_scene_pass(
                        &mut encoder,
                        self.pool.scene.view(),
                        self.pool.scene_depth.view(),
                    );
                    scene.draw(&mut pass);
                }
                Stage::AntiAlias => self.runner.run(
                    &mut encoder,
                    &PassInvocation {
                        label: "FXAA Pass",
                        pipeline: self.fxaa.pipeline(),
                        bind_group: self.fxaa.bind_group(),
                        target: self.pool.smoothed.view(),
                    },
                ),
                Stage::MotionBlur => self.runner.run(
                    &mut encoder,
                    &PassInvocation {
                        label: "Motion Blur Pass",
                        pipeline: self.motion_blur.pipeline(),
                        bind_group: self.motion_blur.bind_group(),
                        target: self.pool.motion.view(),
                    },
                ),
                Stage::BrightPass => self.runner.run(
                    &mut encoder,
                    &PassInvocation {
                        label: "Bright Pass",
                        pipeline: self.bright.pipeline(),
                        bind_group: self.bright.bind_group(mode),
                        target: self.pool.bright.view(),
                    },
                ),
                Stage::MipBlur => {
                    for level in 0..MIP_LEVELS {
                        self.runner.run(
                            &mut encoder,
                            &PassInvocation {
                                label: "Mip Blur Horizontal Pass",
                                pipeline: self.mip_blur.pipeline(),
                                bind_group: self.mip_blur.bind_group(level, false),
                                target: self.pool.mips.horizontal[level].view(),
                            },
                        );
                        self.runner.run(
                            &mut encoder,
                            &PassInvocation {
                                label: "Mip Blur Vertical Pass",
                                pipeline: self.mip_blur.pipeline(),
                                bind_group: self.mip_blur.bind_group(level, true),
                                target: self.pool.mips.vertical[level].view(),
                            },
                        );
                    }
                }
                Stage::BloomComposite => self.runner.run(
                    &mut encoder,
                    &PassInvocation {
                        label: "Bloom Composite Pass",
                        pipeline: self.bloom_composite.pipeline(),
                        bind_group: self.bloom_composite.bind_group(mode),
                        // Level 0's horizontal surface is free once its
                        // vertical pass has read it; the composite reuses it
                        // as the carrier for the remaining stages.
                        target: self.pool.mips.horizontal[0].view(),
                    },
                ),
                Stage::FocusBlur => {
                    self.runner.run(
                        &mut encoder,
                        &PassInvocation {
                            label: "Focus Blur Horizontal Pass",
                            pipeline: self.focus_blur.pipeline(),
                            bind_group: self.focus_blur.bind_group(false),
                            target: self.pool.motion.view(),
                        },
                    );
                    self.runner.run(
                        &mut encoder,
                        &PassInvocation {
                            label: "Focus Blur Vertical Pass",
                            pipeline: self.focus_blur.pipeline(),
                            bind_group: self.focus_blur.bind_group(true),
                            target: self.pool.smoothed.view(),
                        },
                    );
                }
                Stage::FinalComposite => self.runner.run(
                    &mut encoder,
                    &PassInvocation {
                        label: "Final Composite Pass",
                        pipeline: self.final_composite.pipeline(),
                        bind_group: self.final_composite.bind_group(mode),
                        target: output,
                    },
                ),
            }
        }

        debug_assert_eq!(
            self.runner.pass_count(),
            plan::screen_pass_count(mode),
            "encoded passes diverged from the frame plan"
        );
        context.submit(encoder);
        self.history.store(camera);
        FrameStats {
            scene_draws: 1,
            screen_passes: self.runner.pass_count(),
        }
    }

    /// Ease the live focus toward its target by an exponential step.
    fn ease_focus(&mut self, delta: f64) {
        let t = (self.params.focus_lerp_speed * delta as f32).min(1.0);
        self.focus[0] += (self.params.focus[0] - self.focus[0]) * t;
        self.focus[1] += (self.params.focus[1] - self.focus[1]) * t;
    }
}

/// Begin the scene geometry pass: cleared color plus a cleared depth
/// attachment.
fn begin_scene_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    color: &wgpu::TextureView,
    depth: &wgpu::TextureView,
) -> wgpu::RenderPass<'e> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Scene Pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: color,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(SCENE_CLEAR),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: Some(
            wgpu::RenderPassDepthStencilAttachment {
                view: depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            },
        ),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_in_holds_through_delay_then_ramps() {
        let mut zoom = ZoomTransition::default();
        zoom.zoom_in(0.0);
        assert!(zoom.zoomed_in());
        assert_eq!(zoom.advance(0.1), 0.0);
        assert_eq!(zoom.advance(0.29), 0.0);
        let early = zoom.advance(0.4);
        assert!(early > 0.0, "ramp should have started, got {early}");
        assert_eq!(zoom.advance(ZOOM_IN_DELAY + ZOOM_IN_DURATION), 1.0);
        // Completed tween leaves the factor parked at 1.
        assert_eq!(zoom.advance(5.0), 1.0);
    }

    #[test]
    fn zoom_in_overshoots_before_settling() {
        let mut zoom = ZoomTransition::default();
        zoom.zoom_in(0.0);
        // Back-out peaks past the target around 58% through the ramp.
        let peak = zoom.advance(ZOOM_IN_DELAY + 0.58);
        assert!(peak > 1.0, "expected overshoot, got {peak}");
        assert_eq!(zoom.advance(ZOOM_IN_DELAY + ZOOM_IN_DURATION), 1.0);
    }

    #[test]
    fn zoom_out_replaces_pending_zoom_in() {
        let mut zoom = ZoomTransition::default();
        zoom.zoom_in(0.0);
        let mid = zoom.advance(0.5);
        assert!(mid > 0.0);
        zoom.zoom_out(0.5);
        assert!(!zoom.zoomed_in());
        // The release runs from the factor at replacement time down to 0,
        // strictly decreasing, and completes in ZOOM_OUT_DURATION.
        let a = zoom.advance(0.6);
        let b = zoom.advance(0.7);
        assert!(a < mid && b < a, "expected monotonic release: {a}, {b}");
        assert_eq!(zoom.advance(0.5 + ZOOM_OUT_DURATION), 0.0);
        assert_eq!(zoom.advance(2.0), 0.0);
    }

    #[test]
    fn reset_drops_pending_transition_and_zeroes_factor() {
        let mut zoom = ZoomTransition::default();
        zoom.zoom_in(0.0);
        assert!(zoom.advance(0.9) > 0.0);
        zoom.reset();
        assert_eq!(zoom.factor(), 0.0);
        assert!(!zoom.zoomed_in());
        // Nothing pending: the factor stays parked at zero.
        assert_eq!(zoom.advance(2.0), 0.0);
    }

    #[test]
    fn zoom_out_during_delay_never_blurs() {
        let mut zoom = ZoomTransition::default();
        zoom.zoom_in(0.0);
        assert_eq!(zoom.advance(0.2), 0.0);
        zoom.zoom_out(0.2);
        // The pending zoom-in was replaced before its delay elapsed, so the
        // factor stays at zero throughout.
        assert_eq!(zoom.advance(0.4), 0.0);
        assert_eq!(zoom.advance(1.0), 0.0);
        assert_eq!(zoom.factor(), 0.0);
    }

    #[test]
    fn params_track_option_values() {
        let options = PostProcessingOptions::default();
        let params = PipelineParams::from(&options);
        assert_eq!(params, PipelineParams::default());
    }

    #[test]
    fn default_params_match_documented_values() {
        let p = PipelineParams::default();
        assert_eq!(p.bloom_threshold, 0.1);
        assert_eq!(p.bloom_smoothing, 1.0);
        assert_eq!(p.bloom_strength, 0.3);
        assert_eq!(p.bloom_radius, 0.2);
        assert_eq!(p.velocity_scale, 1.0);
        assert_eq!(p.focus, [0.5, 0.5]);
        assert_eq!(p.focus_rotation, 0.0);
        assert_eq!(p.focus_lerp_speed, 5.0);
        assert_eq!(p.distortion, 1.0);
    }
}

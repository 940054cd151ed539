//! Standalone demo window backed by winit.
//!
//! Opens a window, renders the instanced cube scene through the post
//! pipeline, and orbits the camera on the frame clock's timeline.
//! Space toggles the zoom transition, B cycles bloom strength, P bypasses
//! the pipeline, Escape exits.
//!
//! ```no_run
//! # use afterglow::viewer::Viewer;
//! Viewer::builder()
//!     .with_title("Afterglow demo")
//!     .build()
//!     .run()
//!     .unwrap();
//! ```

use std::{cell::RefCell, rc::Rc, sync::Arc};

use glam::Vec3;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::{
    camera::Camera,
    demo::DemoScene,
    error::AfterglowError,
    gpu::render_context::RenderContext,
    options::{CameraOptions, Options},
    renderer::postprocess::{FrameStats, PostPipeline},
    util::frame_clock::FrameClock,
};

// ── Builder ──────────────────────────────────────────────────────────────

/// Fluent builder for [`Viewer`].
pub struct ViewerBuilder {
    options: Option<Options>,
    title: String,
}

impl ViewerBuilder {
    /// Create a builder with sensible defaults (title "Afterglow", default
    /// options).
    fn new() -> Self {
        Self {
            options: None,
            title: "Afterglow".into(),
        }
    }

    /// Override the default options.
    #[must_use]
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = Some(options);
        self
    }

    /// Set the window title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Consume the builder and produce a [`Viewer`].
    #[must_use]
    pub fn build(self) -> Viewer {
        Viewer {
            options: self.options,
            title: self.title,
        }
    }
}

// ── Viewer ───────────────────────────────────────────────────────────────

/// A standalone window that runs the demo scene through the post pipeline.
///
/// Construct via [`Viewer::builder`], then call [`run`](Self::run) to
/// enter the event loop.
pub struct Viewer {
    options: Option<Options>,
    title: String,
}

impl Viewer {
    /// Start a new builder.
    #[must_use]
    pub fn builder() -> ViewerBuilder {
        ViewerBuilder::new()
    }

    /// Open the window and run the event loop. Blocks until the window is
    /// closed.
    ///
    /// # Errors
    ///
    /// Returns [`AfterglowError::Viewer`] when the event loop cannot be
    /// created or fails while running.
    pub fn run(self) -> Result<(), AfterglowError> {
        let event_loop = EventLoop::new()
            .map_err(|e| AfterglowError::Viewer(e.to_string()))?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = ViewerApp {
            window: None,
            state: None,
            options: self.options,
            title: self.title,
        };

        event_loop
            .run_app(&mut app)
            .map_err(|e| AfterglowError::Viewer(e.to_string()))
    }
}

// ── Winit app ────────────────────────────────────────────────────────────

/// Bloom strengths the B key steps through.
const BLOOM_STRENGTH_STEPS: [f32; 4] = [0.3, 0.6, 1.0, 0.0];

/// Internal winit application handler.
struct ViewerApp {
    window: Option<Arc<Window>>,
    state: Option<ViewerState>,
    options: Option<Options>,
    title: String,
}

/// Everything that only exists once the window and GPU device are up.
struct ViewerState {
    context: RenderContext,
    pipeline: PostPipeline,
    scene: DemoScene,
    camera: Camera,
    clock: FrameClock,
    options: Options,
    /// Last frame's numbers, shared with the throttled stats callback.
    stats: Rc<RefCell<StatsSample>>,
    bloom_step: usize,
}

/// One frame's numbers for the 1 Hz stats log.
#[derive(Debug, Clone, Copy, Default)]
struct StatsSample {
    fps: f32,
    frame: FrameStats,
}

/// Clamp the window's physical size to at least one pixel per axis.
fn viewport_size(inner: PhysicalSize<u32>) -> (u32, u32) {
    (inner.width.max(1), inner.height.max(1))
}

/// Eye position on the orbit circle at `time` seconds.
fn orbit_eye(time: f64, options: &CameraOptions) -> Vec3 {
    let angle = (time * f64::from(options.orbit_speed)) as f32;
    let radius = options.orbit_radius;
    Vec3::new(angle.sin() * radius, radius * 0.45, angle.cos() * radius)
}

impl ViewerState {
    fn new(
        window: &Arc<Window>,
        options: Options,
    ) -> Result<Self, AfterglowError> {
        let inner = window.inner_size();
        let scale_factor = window.scale_factor();
        let (vp_w, vp_h) = viewport_size(inner);

        let mut context = pollster::block_on(RenderContext::new(
            Arc::clone(window),
            (vp_w, vp_h),
        ))?;
        context.render_scale = options.viewer.render_scale.max(1);

        let scene = DemoScene::new(&context)?;
        let mut pipeline = PostPipeline::new(&context)?;
        pipeline.apply_options(&options.post_processing);
        pipeline.resize(
            &context,
            f64::from(vp_w) / scale_factor,
            f64::from(vp_h) / scale_factor,
            scale_factor * f64::from(context.render_scale),
        );
        pipeline.start();

        let mut camera = Camera::new(
            orbit_eye(0.0, &options.camera),
            Vec3::ZERO,
            vp_w as f32 / vp_h as f32,
        );
        camera.fovy = options.camera.fovy;
        camera.znear = options.camera.znear;
        camera.zfar = options.camera.zfar;

        let mut clock = FrameClock::new();
        clock.set_target_fps(options.viewer.target_fps);
        let stats = Rc::new(RefCell::new(StatsSample::default()));
        let shared = Rc::clone(&stats);
        let log_id = clock.register(move |_| {
            let sample = *shared.borrow();
            log::info!(
                "{:5.1} fps | {} screen passes",
                sample.fps,
                sample.frame.screen_passes
            );
        });
        let _ = clock.set_rate(log_id, 1.0);

        Ok(Self {
            context,
            pipeline,
            scene,
            camera,
            clock,
            options,
            stats,
            bloom_step: 0,
        })
    }

    /// Reconfigure the swapchain and every pipeline surface for a new
    /// physical window size.
    fn resize(&mut self, inner: PhysicalSize<u32>, scale_factor: f64) {
        let (vp_w, vp_h) = viewport_size(inner);
        self.context.resize(vp_w, vp_h);
        self.pipeline.resize(
            &self.context,
            f64::from(vp_w) / scale_factor,
            f64::from(vp_h) / scale_factor,
            scale_factor * f64::from(self.context.render_scale),
        );
        self.camera.set_aspect(vp_w as f32 / vp_h as f32);
    }

    /// Advance the clock, orbit the camera, and render one frame.
    fn render_frame(&mut self) -> Result<(), wgpu::SurfaceError> {
        let tick = self.clock.tick();
        self.camera.eye = orbit_eye(tick.time, &self.options.camera);

        let frame = self.context.get_next_frame()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let frame_stats = self.pipeline.update(
            &self.context,
            &mut self.scene,
            &self.camera,
            tick,
            &view,
        );
        frame.present();

        *self.stats.borrow_mut() = StatsSample {
            fps: self.clock.fps(),
            frame: frame_stats,
        };
        Ok(())
    }

    fn cycle_bloom_strength(&mut self) {
        self.bloom_step = (self.bloom_step + 1) % BLOOM_STRENGTH_STEPS.len();
        let strength = BLOOM_STRENGTH_STEPS[self.bloom_step];
        self.pipeline.set_bloom_strength(strength);
        log::info!("bloom strength {strength}");
    }

    fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Space => {
                if self.pipeline.zoomed_in() {
                    self.pipeline.zoom_out();
                } else {
                    self.pipeline.zoom_in();
                }
            }
            KeyCode::KeyB => self.cycle_bloom_strength(),
            KeyCode::KeyP => {
                let enabled = !self.pipeline.enabled();
                self.pipeline.set_enabled(enabled);
                log::info!(
                    "post pipeline {}",
                    if enabled { "enabled" } else { "bypassed" }
                );
            }
            _ => (),
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next());
        let attrs = if let Some(mon) = &monitor {
            let mon_size = mon.size();
            let scale = mon.scale_factor();
            let logical_w = (mon_size.width as f64 / scale * 0.75) as u32;
            let logical_h = (mon_size.height as f64 / scale * 0.75) as u32;
            Window::default_attributes()
                .with_title(&self.title)
                .with_inner_size(winit::dpi::LogicalSize::new(
                    logical_w, logical_h,
                ))
        } else {
            Window::default_attributes().with_title(&self.title)
        };

        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let options = self.options.take().unwrap_or_default();
        let state = match ViewerState::new(&window, options) {
            Ok(s) => s,
            Err(e) => {
                log::error!("failed to initialize renderer: {e}");
                event_loop.exit();
                return;
            }
        };

        window.request_redraw();
        self.window = Some(window);
        self.state = Some(state);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _id: WindowId,
        event: WindowEvent,
    ) {
        if matches!(event, WindowEvent::CloseRequested) {
            event_loop.exit();
            return;
        }

        // Guard: both window and state must be initialised.
        let (Some(window), Some(state)) = (&self.window, &mut self.state)
        else {
            return;
        };

        match event {
            WindowEvent::Resized(event_size) => {
                state.resize(event_size, window.scale_factor());
            }

            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                // Supersample on low-DPI displays so the mip chain keeps
                // enough pixels to blur smoothly.
                state.context.render_scale =
                    if scale_factor < 2.0 { 2 } else { 1 };
                state.resize(window.inner_size(), scale_factor);
            }

            WindowEvent::RedrawRequested => {
                if state.clock.should_tick() {
                    match state.render_frame() {
                        Ok(()) => {}
                        Err(
                            wgpu::SurfaceError::Outdated
                            | wgpu::SurfaceError::Lost,
                        ) => {
                            state.resize(
                                window.inner_size(),
                                window.scale_factor(),
                            );
                        }
                        Err(e) => {
                            log::error!("render error: {e:?}");
                        }
                    }
                }
                window.request_redraw();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed {
                    return;
                }
                let PhysicalKey::Code(code) = event.physical_key else {
                    return;
                };
                if code == KeyCode::Escape {
                    event_loop.exit();
                    return;
                }
                state.handle_key(code);
            }

            _ => (),
        }
    }
}

//! Bright-pass extraction: thresholded luminance feeding the bloom chain.
//!
//! The carrier differs per frame mode (motion-blurred or merely smoothed),
//! so both bind groups are prebuilt and the pipeline picks one at encode
//! time instead of rebinding textures mid-frame.

use wgpu::util::DeviceExt;

use super::plan::FrameMode;
use crate::error::AfterglowError;
use crate::gpu::pipeline_helpers::{
    create_screen_space_pipeline, filtering_sampler, linear_sampler,
    texture_2d, uniform_buffer,
};
use crate::gpu::render_context::RenderContext;
use crate::gpu::shader_composer::ShaderComposer;

/// Must match the WGSL `BrightParams` layout.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct BrightUniform {
    threshold: f32,
    smoothing: f32,
    _pad: [f32; 2],
}

/// Bright-pass resources. Reads the frame's carrier surface, writes the
/// bright surface at bloom-base size.
pub struct BrightPass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    /// `[0]` reads the smoothed surface, `[1]` the motion surface.
    bind_groups: [wgpu::BindGroup; 2],
    sampler: wgpu::Sampler,
    params_buffer: wgpu::Buffer,
}

impl BrightPass {
    /// Build the bright-pass pipeline with both carrier bind groups.
    ///
    /// # Errors
    ///
    /// Returns [`AfterglowError::ShaderCompose`] when the shader fails to
    /// compose.
    pub fn new(
        context: &RenderContext,
        composer: &mut ShaderComposer,
        smoothed_view: &wgpu::TextureView,
        motion_view: &wgpu::TextureView,
    ) -> Result<Self, AfterglowError> {
        let sampler = linear_sampler(&context.device, "Bright Pass Sampler");

        let params = BrightUniform {
            threshold: 0.1,
            smoothing: 1.0,
            _pad: [0.0; 2],
        };
        let params_buffer = context.device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("Bright Pass Params Buffer"),
                contents: bytemuck::cast_slice(&[params]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            },
        );

        let bind_group_layout = context.device.create_bind_group_layout(
            &wgpu::BindGroupLayoutDescriptor {
                label: Some("Bright Pass Bind Group Layout"),
                entries: &[
                    texture_2d(0),
                    filtering_sampler(1),
                    uniform_buffer(2),
                ],
            },
        );

        let bind_groups = Self::create_bind_groups(
            context,
            &bind_group_layout,
            smoothed_view,
            motion_view,
            &sampler,
            &params_buffer,
        );

        let shader = composer.compose(
            &context.device,
            "Bright Pass Shader",
            include_str!("../../../assets/shaders/bright_pass.wgsl"),
            "bright_pass.wgsl",
        )?;

        let pipeline = create_screen_space_pipeline(
            &context.device,
            "Bright Pass",
            &shader,
            context.format(),
            None,
            &[&bind_group_layout],
        );

        Ok(Self {
            pipeline,
            bind_group_layout,
            bind_groups,
            sampler,
            params_buffer,
        })
    }

    fn create_bind_groups(
        context: &RenderContext,
        layout: &wgpu::BindGroupLayout,
        smoothed_view: &wgpu::TextureView,
        motion_view: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
        params_buffer: &wgpu::Buffer,
    ) -> [wgpu::BindGroup; 2] {
        let build = |label, view: &wgpu::TextureView| {
            context
                .device
                .create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(label),
                    layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(sampler),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: params_buffer.as_entire_binding(),
                        },
                    ],
                })
        };
        [
            build("Bright Pass Bind Group (smoothed)", smoothed_view),
            build("Bright Pass Bind Group (motion)", motion_view),
        ]
    }

    /// Rebuild both bind groups against resized carrier views.
    pub fn rebind(
        &mut self,
        context: &RenderContext,
        smoothed_view: &wgpu::TextureView,
        motion_view: &wgpu::TextureView,
    ) {
        self.bind_groups = Self::create_bind_groups(
            context,
            &self.bind_group_layout,
            smoothed_view,
            motion_view,
            &self.sampler,
            &self.params_buffer,
        );
    }

    /// Push new threshold/smoothing values.
    pub fn set_params(
        &self,
        queue: &wgpu::Queue,
        threshold: f32,
        smoothing: f32,
    ) {
        let params = BrightUniform {
            threshold,
            smoothing,
            _pad: [0.0; 2],
        };
        queue.write_buffer(
            &self.params_buffer,
            0,
            bytemuck::cast_slice(&[params]),
        );
    }

    /// The full-screen pipeline for this pass.
    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    /// The carrier bind group for this frame's mode.
    pub fn bind_group(&self, mode: FrameMode) -> &wgpu::BindGroup {
        match mode {
            FrameMode::MotionBlur => &self.bind_groups[1],
            FrameMode::DirectionalBlur | FrameMode::Neither => {
                &self.bind_groups[0]
            }
        }
    }
}

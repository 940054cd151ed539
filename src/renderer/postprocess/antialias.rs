//! FXAA pass: screen-space anti-aliasing applied to the raw scene color.
//!
//! First link in the post chain; every later stage reads the smoothed image
//! (or something derived from it), so edge noise never reaches the bloom
//! threshold.

use wgpu::util::DeviceExt;

use crate::error::AfterglowError;
use crate::gpu::pipeline_helpers::{
    create_screen_space_pipeline, filtering_sampler, linear_sampler,
    texture_2d, uniform_buffer,
};
use crate::gpu::render_context::RenderContext;
use crate::gpu::shader_composer::ShaderComposer;

/// Anti-aliasing pass resources. Reads the scene surface, writes the
/// smoothed surface.
pub struct FxaaPass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    sampler: wgpu::Sampler,
    resolution_buffer: wgpu::Buffer,
}

impl FxaaPass {
    /// Build the FXAA pipeline reading the given scene color view.
    ///
    /// # Errors
    ///
    /// Returns [`AfterglowError::ShaderCompose`] when the shader fails to
    /// compose.
    pub fn new(
        context: &RenderContext,
        composer: &mut ShaderComposer,
        scene_view: &wgpu::TextureView,
    ) -> Result<Self, AfterglowError> {
        let sampler = linear_sampler(&context.device, "FXAA Sampler");

        let resolution: [f32; 2] = [1.0, 1.0];
        let resolution_buffer = context.device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("FXAA Resolution Buffer"),
                contents: bytemuck::cast_slice(&resolution),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            },
        );

        let bind_group_layout = context.device.create_bind_group_layout(
            &wgpu::BindGroupLayoutDescriptor {
                label: Some("FXAA Bind Group Layout"),
                entries: &[
                    texture_2d(0),
                    filtering_sampler(1),
                    uniform_buffer(2),
                ],
            },
        );

        let bind_group = Self::create_bind_group(
            context,
            &bind_group_layout,
            scene_view,
            &sampler,
            &resolution_buffer,
        );

        let shader = composer.compose(
            &context.device,
            "FXAA Shader",
            include_str!("../../../assets/shaders/fxaa.wgsl"),
            "fxaa.wgsl",
        )?;

        let pipeline = create_screen_space_pipeline(
            &context.device,
            "FXAA",
            &shader,
            context.format(),
            None,
            &[&bind_group_layout],
        );

        Ok(Self {
            pipeline,
            bind_group_layout,
            bind_group,
            sampler,
            resolution_buffer,
        })
    }

    fn create_bind_group(
        context: &RenderContext,
        layout: &wgpu::BindGroupLayout,
        scene_view: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
        resolution_buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("FXAA Bind Group"),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(scene_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: resolution_buffer.as_entire_binding(),
                    },
                ],
            })
    }

    /// Rebuild the bind group against a resized scene view and push the new
    /// resolution uniform.
    pub fn rebind(
        &mut self,
        context: &RenderContext,
        scene_view: &wgpu::TextureView,
        size: (u32, u32),
    ) {
        let resolution: [f32; 2] = [size.0 as f32, size.1 as f32];
        context.queue.write_buffer(
            &self.resolution_buffer,
            0,
            bytemuck::cast_slice(&resolution),
        );
        self.bind_group = Self::create_bind_group(
            context,
            &self.bind_group_layout,
            scene_view,
            &self.sampler,
            &self.resolution_buffer,
        );
    }

    /// The full-screen pipeline for this pass.
    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    /// The pass's single bind group.
    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

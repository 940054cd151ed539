//! Final composite: chromatic distortion plus ordered dithering on the way
//! to the swapchain.
//!
//! The carrier is the bloom composite output, or the focus blur result when
//! a zoom transition is live; both cases are prebuilt as separate bind
//! groups so mode changes never allocate. Distortion strength follows the
//! zoom blur factor, so the fringe only appears while zooming.

use wgpu::util::DeviceExt;

use super::plan::FrameMode;
use super::targets::TargetPool;
use crate::error::AfterglowError;
use crate::gpu::pipeline_helpers::{
    create_screen_space_pipeline, filtering_sampler, linear_sampler,
    texture_2d, uniform_buffer,
};
use crate::gpu::render_context::RenderContext;
use crate::gpu::shader_composer::ShaderComposer;

/// Must match the WGSL `CompositeParams` layout.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct CompositeUniform {
    focus: [f32; 2],
    rotation: f32,
    blur_factor: f32,
    distortion: f32,
    aspect: f32,
    _pad: [f32; 2],
}

/// Final composite resources with one bind group per carrier surface.
pub struct FinalCompositePass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    /// `[0]` reads the bloom composite, `[1]` the focus blur result.
    bind_groups: [wgpu::BindGroup; 2],
    sampler: wgpu::Sampler,
    params_buffer: wgpu::Buffer,
}

impl FinalCompositePass {
    /// Build the composite pipeline and bind groups against the pool's
    /// current views.
    ///
    /// # Errors
    ///
    /// Returns [`AfterglowError::ShaderCompose`] when the shader fails to
    /// compose.
    pub fn new(
        context: &RenderContext,
        composer: &mut ShaderComposer,
        pool: &TargetPool,
    ) -> Result<Self, AfterglowError> {
        let sampler =
            linear_sampler(&context.device, "Final Composite Sampler");

        let params_buffer = context.device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("Final Composite Params Buffer"),
                contents: bytemuck::cast_slice(&[CompositeUniform {
                    focus: [0.5, 0.5],
                    rotation: 0.0,
                    blur_factor: 0.0,
                    distortion: 1.0,
                    aspect: 1.0,
                    _pad: [0.0; 2],
                }]),
                usage: wgpu::BufferUsages::UNIFORM
                    | wgpu::BufferUsages::COPY_DST,
            },
        );

        let bind_group_layout = context.device.create_bind_group_layout(
            &wgpu::BindGroupLayoutDescriptor {
                label: Some("Final Composite Bind Group Layout"),
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
            pool,
            &sampler,
            &params_buffer,
        );

        let shader = composer.compose(
            &context.device,
            "Final Composite Shader",
            include_str!("../../../assets/shaders/final_composite.wgsl"),
            "final_composite.wgsl",
        )?;

        let pipeline = create_screen_space_pipeline(
            &context.device,
            "Final Composite",
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
        pool: &TargetPool,
        sampler: &wgpu::Sampler,
        params_buffer: &wgpu::Buffer,
    ) -> [wgpu::BindGroup; 2] {
        let build = |label, carrier: &wgpu::TextureView| {
            context.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(carrier),
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
            build(
                "Final Composite Bind Group Bloom",
                pool.mips.horizontal[0].view(),
            ),
            build("Final Composite Bind Group Focus", pool.smoothed.view()),
        ]
    }

    /// Rebuild bind groups against resized pool views.
    pub fn rebind(&mut self, context: &RenderContext, pool: &TargetPool) {
        self.bind_groups = Self::create_bind_groups(
            context,
            &self.bind_group_layout,
            pool,
            &self.sampler,
            &self.params_buffer,
        );
    }

    /// Push the frame's distortion parameters.
    pub fn write_params(
        &self,
        queue: &wgpu::Queue,
        focus: [f32; 2],
        rotation: f32,
        blur_factor: f32,
        distortion: f32,
        aspect: f32,
    ) {
        let uniform = CompositeUniform {
            focus,
            rotation,
            blur_factor,
            distortion,
            aspect,
            _pad: [0.0; 2],
        };
        queue.write_buffer(
            &self.params_buffer,
            0,
            bytemuck::cast_slice(&[uniform]),
        );
    }

    /// The composite pipeline.
    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    /// The bind group whose carrier matches the frame mode.
    pub fn bind_group(&self, mode: FrameMode) -> &wgpu::BindGroup {
        match mode {
            FrameMode::DirectionalBlur => &self.bind_groups[1],
            FrameMode::MotionBlur | FrameMode::Neither => {
                &self.bind_groups[0]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_size_matches_wgsl_struct() {
        assert_eq!(size_of::<CompositeUniform>(), 32);
    }
}

//! Directional focus blur: two full-resolution passes that smear the scene
//! away from a rotatable focal band while a zoom transition is live.
//!
//! The horizontal pass reads the bloom-composited carrier and the vertical
//! pass reads the horizontal result, bouncing through the pool's full-size
//! scratch surfaces. Both passes share one pipeline; each owns a uniform
//! buffer so the two directions can be encoded back to back without a
//! mid-frame buffer write landing between them.

use wgpu::util::DeviceExt;

use super::targets::TargetPool;
use crate::error::AfterglowError;
use crate::gpu::pipeline_helpers::{
    create_screen_space_pipeline, filtering_sampler, linear_sampler,
    texture_2d, uniform_buffer,
};
use crate::gpu::render_context::RenderContext;
use crate::gpu::shader_composer::ShaderComposer;

/// Must match the WGSL `FocusParams` layout.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct FocusUniform {
    focus: [f32; 2],
    direction: [f32; 2],
    rotation: f32,
    blur_factor: f32,
    aspect: f32,
    _pad: f32,
}

/// Focus blur resources: one pipeline, one uniform buffer and bind group per
/// direction.
pub struct FocusBlurPass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    /// `[0]` horizontal, `[1]` vertical.
    buffers: [wgpu::Buffer; 2],
    bind_groups: [wgpu::BindGroup; 2],
}

impl FocusBlurPass {
    /// Build the focus blur pipeline and per-direction resources against the
    /// pool's current views.
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
        let sampler = linear_sampler(&context.device, "Focus Blur Sampler");

        let buffers = std::array::from_fn(|dir| {
            let tag = if dir == 1 { "V" } else { "H" };
            let uniform = FocusUniform {
                focus: [0.5, 0.5],
                direction: if dir == 1 { [0.0, 1.0] } else { [1.0, 0.0] },
                rotation: 0.0,
                blur_factor: 0.0,
                aspect: 1.0,
                _pad: 0.0,
            };
            context.device.create_buffer_init(
                &wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("Focus Blur Params {tag}")),
                    contents: bytemuck::cast_slice(&[uniform]),
                    usage: wgpu::BufferUsages::UNIFORM
                        | wgpu::BufferUsages::COPY_DST,
                },
            )
        });

        let bind_group_layout = context.device.create_bind_group_layout(
            &wgpu::BindGroupLayoutDescriptor {
                label: Some("Focus Blur Bind Group Layout"),
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
            &buffers,
        );

        let shader = composer.compose(
            &context.device,
            "Focus Blur Shader",
            include_str!("../../../assets/shaders/focus_blur.wgsl"),
            "focus_blur.wgsl",
        )?;

        let pipeline = create_screen_space_pipeline(
            &context.device,
            "Focus Blur",
            &shader,
            context.format(),
            None,
            &[&bind_group_layout],
        );

        Ok(Self {
            pipeline,
            bind_group_layout,
            sampler,
            buffers,
            bind_groups,
        })
    }

    fn create_bind_groups(
        context: &RenderContext,
        layout: &wgpu::BindGroupLayout,
        pool: &TargetPool,
        sampler: &wgpu::Sampler,
        buffers: &[wgpu::Buffer; 2],
    ) -> [wgpu::BindGroup; 2] {
        // Horizontal reads the bloom composite output parked in the level-0
        // horizontal mip surface; vertical reads the horizontal result from
        // the motion scratch surface.
        let inputs = [pool.mips.horizontal[0].view(), pool.motion.view()];
        std::array::from_fn(|dir| {
            let tag = if dir == 1 { "V" } else { "H" };
            context.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("Focus Blur Bind Group {tag}")),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(
                            inputs[dir],
                        ),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: buffers[dir].as_entire_binding(),
                    },
                ],
            })
        })
    }

    /// Rebuild bind groups against resized pool views.
    pub fn rebind(&mut self, context: &RenderContext, pool: &TargetPool) {
        self.bind_groups = Self::create_bind_groups(
            context,
            &self.bind_group_layout,
            pool,
            &self.sampler,
            &self.buffers,
        );
    }

    /// Push the frame's focal parameters to both direction buffers.
    pub fn write_params(
        &self,
        queue: &wgpu::Queue,
        focus: [f32; 2],
        rotation: f32,
        blur_factor: f32,
        aspect: f32,
    ) {
        for (dir, buffer) in self.buffers.iter().enumerate() {
            let uniform = FocusUniform {
                focus,
                direction: if dir == 1 { [0.0, 1.0] } else { [1.0, 0.0] },
                rotation,
                blur_factor,
                aspect,
                _pad: 0.0,
            };
            queue.write_buffer(buffer, 0, bytemuck::cast_slice(&[uniform]));
        }
    }

    /// The shared blur pipeline.
    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    /// The bind group for one direction.
    pub fn bind_group(&self, vertical: bool) -> &wgpu::BindGroup {
        &self.bind_groups[usize::from(vertical)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_size_matches_wgsl_struct() {
        assert_eq!(size_of::<FocusUniform>(), 32);
    }
}

//! Bloom composite: layers the five blurred mip levels back over the scene.
//!
//! Each level contributes with a weight derived from the bloom strength and
//! radius. Radius rebalances the weights between the coarse and fine levels
//! rather than changing kernel sizes, so adjusting it never rebuilds any GPU
//! resource. The composite lands in the level-0 horizontal mip surface,
//! which is free once its vertical pass has read it; that result is the
//! carrier for the remaining stages.

use wgpu::util::DeviceExt;

use super::plan::FrameMode;
use super::targets::{TargetPool, MIP_LEVELS};
use crate::animate::lerp;
use crate::error::AfterglowError;
use crate::gpu::pipeline_helpers::{
    create_screen_space_pipeline, filtering_sampler, linear_sampler,
    texture_2d, uniform_buffer,
};
use crate::gpu::render_context::RenderContext;
use crate::gpu::shader_composer::ShaderComposer;

/// Baseline per-level contribution at radius 0, finest level first.
pub const BLOOM_BASE_FACTORS: [f32; MIP_LEVELS] = [1.0, 0.8, 0.6, 0.4, 0.2];

/// Per-level composite weights for a given strength and radius.
///
/// Radius slides each level's factor from its baseline toward the mirrored
/// value `1.2 - baseline`, so a larger radius shifts energy from the fine
/// levels to the coarse ones while the middle level stays fixed.
#[must_use]
pub fn bloom_weights(strength: f32, radius: f32) -> [f32; MIP_LEVELS] {
    std::array::from_fn(|i| {
        let base = BLOOM_BASE_FACTORS[i];
        strength * lerp(base, 1.2 - base, radius)
    })
}

/// Weight layout matching the WGSL `BloomParams` struct: five floats packed
/// into two vec4 slots to satisfy uniform-buffer alignment.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct BloomUniform {
    weights0: [f32; 4],
    weights1: [f32; 4],
}

impl BloomUniform {
    fn new(weights: [f32; MIP_LEVELS]) -> Self {
        Self {
            weights0: [weights[0], weights[1], weights[2], weights[3]],
            weights1: [weights[4], 0.0, 0.0, 0.0],
        }
    }
}

/// Bloom composite resources with one bind group per carrier surface.
pub struct BloomCompositePass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    /// `[0]` reads the anti-aliased carrier, `[1]` the motion-blurred one.
    bind_groups: [wgpu::BindGroup; 2],
    sampler: wgpu::Sampler,
    params_buffer: wgpu::Buffer,
}

impl BloomCompositePass {
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
            linear_sampler(&context.device, "Bloom Composite Sampler");

        let params_buffer = context.device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("Bloom Composite Params Buffer"),
                contents: bytemuck::cast_slice(&[BloomUniform::new(
                    bloom_weights(0.0, 0.0),
                )]),
                usage: wgpu::BufferUsages::UNIFORM
                    | wgpu::BufferUsages::COPY_DST,
            },
        );

        let bind_group_layout = context.device.create_bind_group_layout(
            &wgpu::BindGroupLayoutDescriptor {
                label: Some("Bloom Composite Bind Group Layout"),
                entries: &[
                    texture_2d(0),
                    texture_2d(1),
                    texture_2d(2),
                    texture_2d(3),
                    texture_2d(4),
                    texture_2d(5),
                    filtering_sampler(6),
                    uniform_buffer(7),
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
            "Bloom Composite Shader",
            include_str!("../../../assets/shaders/bloom_composite.wgsl"),
            "bloom_composite.wgsl",
        )?;

        let pipeline = create_screen_space_pipeline(
            &context.device,
            "Bloom Composite",
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
            let mut entries = vec![wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(carrier),
            }];
            for (i, level) in pool.mips.vertical.iter().enumerate() {
                entries.push(wgpu::BindGroupEntry {
                    binding: (i + 1) as u32,
                    resource: wgpu::BindingResource::TextureView(level.view()),
                });
            }
            entries.push(wgpu::BindGroupEntry {
                binding: 6,
                resource: wgpu::BindingResource::Sampler(sampler),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: 7,
                resource: params_buffer.as_entire_binding(),
            });
            context.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout,
                entries: &entries,
            })
        };
        [
            build("Bloom Composite Bind Group Smoothed", pool.smoothed.view()),
            build("Bloom Composite Bind Group Motion", pool.motion.view()),
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

    /// Push the weights derived from `strength` and `radius`.
    pub fn set_weights(
        &self,
        queue: &wgpu::Queue,
        strength: f32,
        radius: f32,
    ) {
        let uniform = BloomUniform::new(bloom_weights(strength, radius));
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
            FrameMode::MotionBlur => &self.bind_groups[1],
            FrameMode::DirectionalBlur | FrameMode::Neither => {
                &self.bind_groups[0]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_strength_and_radius_give_reference_weights() {
        let weights = bloom_weights(0.3, 0.2);
        let expected = [0.252, 0.216, 0.18, 0.144, 0.108];
        for (got, want) in weights.iter().zip(expected) {
            assert!(
                (got - want).abs() < 1e-6,
                "weight {got} != expected {want}"
            );
        }
    }

    #[test]
    fn radius_shifts_energy_toward_coarse_levels() {
        let narrow = bloom_weights(1.0, 0.0);
        let wide = bloom_weights(1.0, 1.0);
        assert_eq!(narrow, BLOOM_BASE_FACTORS);
        // At full radius the factors mirror around 0.6.
        assert!((wide[0] - 0.2).abs() < 1e-6);
        assert!((wide[4] - 1.0).abs() < 1e-6);
        assert!((wide[2] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn zero_strength_zeroes_every_level() {
        assert_eq!(bloom_weights(0.0, 0.7), [0.0; MIP_LEVELS]);
    }

    #[test]
    fn uniform_packs_fifth_weight_into_second_vec4() {
        let u = BloomUniform::new([0.1, 0.2, 0.3, 0.4, 0.5]);
        assert_eq!(u.weights0, [0.1, 0.2, 0.3, 0.4]);
        assert_eq!(u.weights1[0], 0.5);
        assert_eq!(size_of::<BloomUniform>(), 32);
    }
}

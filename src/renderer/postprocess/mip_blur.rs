//! Progressive mip blur: separable Gaussian over five descending levels.
//!
//! One pipeline serves all ten sub-passes (five levels, horizontal then
//! vertical). Each level/direction pair owns its own uniform buffer holding
//! the level's texel size, the blur axis, and the kernel radius; the texel
//! sizes change only on resize, so no uniform is written mid-frame and the
//! ten encoded passes never race on a shared buffer.

use wgpu::util::DeviceExt;

use super::targets::{PoolSizes, TargetPool, KERNEL_SIZES, MIP_LEVELS};
use crate::error::AfterglowError;
use crate::gpu::pipeline_helpers::{
    create_screen_space_pipeline, filtering_sampler, linear_sampler,
    texture_2d, uniform_buffer,
};
use crate::gpu::render_context::RenderContext;
use crate::gpu::shader_composer::ShaderComposer;

/// Must match the WGSL `BlurParams` layout.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct BlurUniform {
    texel: [f32; 2],
    direction: [f32; 2],
    kernel_radius: f32,
    _pad: [f32; 3],
}

fn blur_uniform(level: usize, vertical: bool, size: (u32, u32)) -> BlurUniform {
    BlurUniform {
        texel: [1.0 / size.0 as f32, 1.0 / size.1 as f32],
        direction: if vertical { [0.0, 1.0] } else { [1.0, 0.0] },
        kernel_radius: (KERNEL_SIZES[level] / 2) as f32,
        _pad: [0.0; 3],
    }
}

/// Mip blur resources: one pipeline, ten parameter buffers and bind groups
/// indexed by `(level, direction)`.
pub struct MipBlurPass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    /// `[level * 2]` horizontal, `[level * 2 + 1]` vertical.
    buffers: Vec<wgpu::Buffer>,
    bind_groups: Vec<wgpu::BindGroup>,
}

impl MipBlurPass {
    /// Build the blur pipeline and all per-level resources against the
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
        let sampler = linear_sampler(&context.device, "Mip Blur Sampler");

        let bind_group_layout = context.device.create_bind_group_layout(
            &wgpu::BindGroupLayoutDescriptor {
                label: Some("Mip Blur Bind Group Layout"),
                entries: &[
                    texture_2d(0),
                    filtering_sampler(1),
                    uniform_buffer(2),
                ],
            },
        );

        let mut buffers = Vec::with_capacity(MIP_LEVELS * 2);
        for level in 0..MIP_LEVELS {
            for vertical in [false, true] {
                let tag = if vertical { "V" } else { "H" };
                let uniform = blur_uniform(level, vertical, (1, 1));
                buffers.push(context.device.create_buffer_init(
                    &wgpu::util::BufferInitDescriptor {
                        label: Some(&format!("Mip Blur Params {tag}{level}")),
                        contents: bytemuck::cast_slice(&[uniform]),
                        usage: wgpu::BufferUsages::UNIFORM
                            | wgpu::BufferUsages::COPY_DST,
                    },
                ));
            }
        }

        let bind_groups = Self::create_bind_groups(
            context,
            &bind_group_layout,
            pool,
            &sampler,
            &buffers,
        );

        let shader = composer.compose(
            &context.device,
            "Mip Blur Shader",
            include_str!("../../../assets/shaders/mip_blur.wgsl"),
            "mip_blur.wgsl",
        )?;

        let pipeline = create_screen_space_pipeline(
            &context.device,
            "Mip Blur",
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
        buffers: &[wgpu::Buffer],
    ) -> Vec<wgpu::BindGroup> {
        let mut bind_groups = Vec::with_capacity(MIP_LEVELS * 2);
        for level in 0..MIP_LEVELS {
            // Horizontal reads the previous level's vertical output (the
            // bright surface for level 0); vertical reads this level's
            // horizontal output.
            let horizontal_input = if level == 0 {
                pool.bright.view()
            } else {
                pool.mips.vertical[level - 1].view()
            };
            let inputs =
                [horizontal_input, pool.mips.horizontal[level].view()];
            for (dir, input) in inputs.into_iter().enumerate() {
                let tag = if dir == 1 { "V" } else { "H" };
                bind_groups.push(context.device.create_bind_group(
                    &wgpu::BindGroupDescriptor {
                        label: Some(&format!("Mip Blur Bind Group {tag}{level}")),
                        layout,
                        entries: &[
                            wgpu::BindGroupEntry {
                                binding: 0,
                                resource: wgpu::BindingResource::TextureView(
                                    input,
                                ),
                            },
                            wgpu::BindGroupEntry {
                                binding: 1,
                                resource: wgpu::BindingResource::Sampler(
                                    sampler,
                                ),
                            },
                            wgpu::BindGroupEntry {
                                binding: 2,
                                resource: buffers[level * 2 + dir]
                                    .as_entire_binding(),
                            },
                        ],
                    },
                ));
            }
        }
        bind_groups
    }

    /// Rebuild bind groups against resized pool views and push each level's
    /// texel size.
    pub fn rebind(
        &mut self,
        context: &RenderContext,
        pool: &TargetPool,
        sizes: &PoolSizes,
    ) {
        for level in 0..MIP_LEVELS {
            for vertical in [false, true] {
                let uniform =
                    blur_uniform(level, vertical, sizes.levels[level]);
                context.queue.write_buffer(
                    &self.buffers[level * 2 + usize::from(vertical)],
                    0,
                    bytemuck::cast_slice(&[uniform]),
                );
            }
        }
        self.bind_groups = Self::create_bind_groups(
            context,
            &self.bind_group_layout,
            pool,
            &self.sampler,
            &self.buffers,
        );
    }

    /// The shared full-screen pipeline.
    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    /// The bind group for one level and direction.
    pub fn bind_group(&self, level: usize, vertical: bool) -> &wgpu::BindGroup {
        &self.bind_groups[level * 2 + usize::from(vertical)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_radius_grows_one_texel_per_level() {
        for level in 0..MIP_LEVELS {
            let u = blur_uniform(level, false, (64, 32));
            assert_eq!(u.kernel_radius, (level + 1) as f32);
        }
    }

    #[test]
    fn direction_selects_axis() {
        let h = blur_uniform(2, false, (64, 32));
        let v = blur_uniform(2, true, (64, 32));
        assert_eq!(h.direction, [1.0, 0.0]);
        assert_eq!(v.direction, [0.0, 1.0]);
        assert_eq!(h.texel, [1.0 / 64.0, 1.0 / 32.0]);
        assert_eq!(h.texel, v.texel);
    }
}

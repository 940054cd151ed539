//! Camera motion blur: per-pixel velocity reconstructed from scene depth
//! and the previous frame's camera matrices.
//!
//! Each pixel's world position is rebuilt from depth via the inverse
//! view-projection, reprojected through both the current and previous
//! frame's matrices, and the clip-space delta drives a directional sample
//! smear. The pass must read [`CameraHistory`] before the pipeline stores
//! this frame's camera into it; that ordering is what makes the velocity a
//! true one-frame difference.

use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use crate::camera::Camera;
use crate::error::AfterglowError;
use crate::gpu::pipeline_helpers::{
    create_screen_space_pipeline, depth_texture_2d, filtering_sampler,
    linear_sampler, nearest_sampler, non_filtering_sampler, texture_2d,
    uniform_buffer,
};
use crate::gpu::render_context::RenderContext;
use crate::gpu::shader_composer::ShaderComposer;

/// The previous frame's camera state, stored once per `update` strictly
/// after the motion blur uniforms are built from it.
pub struct CameraHistory {
    view: Mat4,
    proj: Mat4,
    position: Vec3,
}

impl Default for CameraHistory {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY,
            proj: Mat4::IDENTITY,
            position: Vec3::ZERO,
        }
    }
}

impl CameraHistory {
    /// Capture the camera's current matrices and position.
    pub fn store(&mut self, camera: &Camera) {
        self.view = camera.view_matrix();
        self.proj = camera.projection_matrix();
        self.position = camera.position();
    }
}

/// Must match the WGSL `MotionBlurParams` layout.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct MotionBlurUniform {
    clip_to_world: [[f32; 4]; 4],
    world_to_clip: [[f32; 4]; 4],
    prev_world_to_clip: [[f32; 4]; 4],
    camera_move: [f32; 3],
    velocity_scale: f32,
    delta: f32,
    _pad: [f32; 3],
}

impl MotionBlurUniform {
    fn build(
        camera: &Camera,
        history: &CameraHistory,
        velocity_scale: f32,
        delta: f32,
    ) -> Self {
        let view = camera.view_matrix();
        let proj = camera.projection_matrix();
        let clip_to_world = view.inverse() * proj.inverse();
        let world_to_clip = proj * view;
        let prev_world_to_clip = history.proj * history.view;
        let camera_move = camera.position() - history.position;
        Self {
            clip_to_world: clip_to_world.to_cols_array_2d(),
            world_to_clip: world_to_clip.to_cols_array_2d(),
            prev_world_to_clip: prev_world_to_clip.to_cols_array_2d(),
            camera_move: camera_move.to_array(),
            velocity_scale,
            delta,
            _pad: [0.0; 3],
        }
    }
}

/// Motion blur pass resources. Reads the smoothed surface and the scene
/// depth, writes the motion surface.
pub struct MotionBlurPass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    color_sampler: wgpu::Sampler,
    depth_sampler: wgpu::Sampler,
    params_buffer: wgpu::Buffer,
}

impl MotionBlurPass {
    /// Build the motion blur pipeline reading the given color and depth
    /// views.
    ///
    /// # Errors
    ///
    /// Returns [`AfterglowError::ShaderCompose`] when the shader fails to
    /// compose.
    pub fn new(
        context: &RenderContext,
        composer: &mut ShaderComposer,
        color_view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
    ) -> Result<Self, AfterglowError> {
        let color_sampler =
            linear_sampler(&context.device, "Motion Blur Color Sampler");
        let depth_sampler =
            nearest_sampler(&context.device, "Motion Blur Depth Sampler");

        let params = MotionBlurUniform::build(
            &Camera::new(Vec3::ZERO, Vec3::NEG_Z, 1.0),
            &CameraHistory::default(),
            0.0,
            0.0,
        );
        let params_buffer = context.device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("Motion Blur Params Buffer"),
                contents: bytemuck::cast_slice(&[params]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            },
        );

        let bind_group_layout = context.device.create_bind_group_layout(
            &wgpu::BindGroupLayoutDescriptor {
                label: Some("Motion Blur Bind Group Layout"),
                entries: &[
                    texture_2d(0),
                    depth_texture_2d(1),
                    filtering_sampler(2),
                    non_filtering_sampler(3),
                    uniform_buffer(4),
                ],
            },
        );

        let bind_group = Self::create_bind_group(
            context,
            &bind_group_layout,
            color_view,
            depth_view,
            &color_sampler,
            &depth_sampler,
            &params_buffer,
        );

        let shader = composer.compose(
            &context.device,
            "Motion Blur Shader",
            include_str!("../../../assets/shaders/motion_blur.wgsl"),
            "motion_blur.wgsl",
        )?;

        let pipeline = create_screen_space_pipeline(
            &context.device,
            "Motion Blur",
            &shader,
            context.format(),
            None,
            &[&bind_group_layout],
        );

        Ok(Self {
            pipeline,
            bind_group_layout,
            bind_group,
            color_sampler,
            depth_sampler,
            params_buffer,
        })
    }

    fn create_bind_group(
        context: &RenderContext,
        layout: &wgpu::BindGroupLayout,
        color_view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
        color_sampler: &wgpu::Sampler,
        depth_sampler: &wgpu::Sampler,
        params_buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Motion Blur Bind Group"),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(color_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(depth_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(color_sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::Sampler(depth_sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: params_buffer.as_entire_binding(),
                    },
                ],
            })
    }

    /// Rebuild the bind group against resized color and depth views.
    pub fn rebind(
        &mut self,
        context: &RenderContext,
        color_view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
    ) {
        self.bind_group = Self::create_bind_group(
            context,
            &self.bind_group_layout,
            color_view,
            depth_view,
            &self.color_sampler,
            &self.depth_sampler,
            &self.params_buffer,
        );
    }

    /// Push this frame's matrices. `history` must still hold the previous
    /// frame's camera; store the current camera only after calling this.
    pub fn write_params(
        &self,
        queue: &wgpu::Queue,
        camera: &Camera,
        history: &CameraHistory,
        velocity_scale: f32,
        delta: f32,
    ) {
        let params =
            MotionBlurUniform::build(camera, history, velocity_scale, delta);
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

    /// The pass's single bind group.
    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_defaults_to_identity() {
        let history = CameraHistory::default();
        assert_eq!(history.view, Mat4::IDENTITY);
        assert_eq!(history.proj, Mat4::IDENTITY);
        assert_eq!(history.position, Vec3::ZERO);
    }

    #[test]
    fn uniform_uses_previous_frame_matrices() {
        let mut history = CameraHistory::default();

        let frame1 = Camera::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, 1.6);
        let u1 = MotionBlurUniform::build(&frame1, &history, 1.0, 0.016);
        assert_eq!(
            u1.prev_world_to_clip,
            Mat4::IDENTITY.to_cols_array_2d(),
            "first frame reprojects through the identity history"
        );
        history.store(&frame1);

        let frame2 = Camera::new(Vec3::new(2.0, 0.0, 5.0), Vec3::ZERO, 1.6);
        let u2 = MotionBlurUniform::build(&frame2, &history, 1.0, 0.016);

        let expected_prev =
            frame1.projection_matrix() * frame1.view_matrix();
        assert_eq!(u2.prev_world_to_clip, expected_prev.to_cols_array_2d());
        assert_eq!(u2.camera_move, [2.0, 0.0, 0.0]);

        let expected_current =
            frame2.projection_matrix() * frame2.view_matrix();
        assert_eq!(u2.world_to_clip, expected_current.to_cols_array_2d());
    }

    #[test]
    fn clip_to_world_inverts_world_to_clip() {
        let camera = Camera::new(Vec3::new(1.0, 3.0, 8.0), Vec3::ZERO, 1.777);
        let u = MotionBlurUniform::build(
            &camera,
            &CameraHistory::default(),
            1.0,
            0.016,
        );
        let forward = Mat4::from_cols_array_2d(&u.world_to_clip);
        let inverse = Mat4::from_cols_array_2d(&u.clip_to_world);
        let product = forward * inverse;
        for (i, col) in product.to_cols_array_2d().iter().enumerate() {
            for (j, &value) in col.iter().enumerate() {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!(
                    (value - expected).abs() < 1e-4,
                    "round trip [{i}][{j}] = {value}"
                );
            }
        }
    }

    #[test]
    fn uniform_size_matches_wgsl_struct() {
        assert_eq!(size_of::<MotionBlurUniform>(), 224);
    }
}

//! Demo scene: a field of emissive cubes for exercising the post pipeline.
//!
//! A central beacon and a scattered ring of tinted cubes, some glowing past
//! the bloom threshold. All instances are static; the orbiting camera
//! supplies the motion that motion blur needs.

use glam::{Mat4, Quat, Vec3};
use rand::Rng;
use wgpu::util::DeviceExt;

use crate::camera::Camera;
use crate::error::AfterglowError;
use crate::gpu::render_context::RenderContext;
use crate::gpu::shader_composer::ShaderComposer;
use crate::renderer::{SceneRenderer, DEPTH_FORMAT};

/// Scattered cubes around the central beacon.
const CUBE_COUNT: usize = 120;
/// Outer scatter radius in world units.
const FIELD_RADIUS: f32 = 12.0;
/// Keep-out radius around the beacon.
const INNER_RADIUS: f32 = 2.2;

/// Cube tints; the alpha channel added at scatter time is the emissive
/// boost.
const PALETTE: [[f32; 3]; 6] = [
    [0.95, 0.30, 0.18],
    [0.98, 0.62, 0.12],
    [0.20, 0.75, 0.95],
    [0.45, 0.35, 0.98],
    [0.20, 0.92, 0.55],
    [0.93, 0.88, 0.80],
];

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct CubeVertex {
    position: [f32; 3],
    normal: [f32; 3],
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct CubeInstance {
    model: [[f32; 4]; 4],
    color: [f32; 4],
}

fn cube_vertex_buffer_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: size_of::<CubeVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 0,
                shader_location: 0,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 12,
                shader_location: 1,
            },
        ],
    }
}

fn cube_instance_buffer_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: size_of::<CubeInstance>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &[
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x4,
                offset: 0,
                shader_location: 2,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x4,
                offset: 16,
                shader_location: 3,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x4,
                offset: 32,
                shader_location: 4,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x4,
                offset: 48,
                shader_location: 5,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x4,
                offset: 64,
                shader_location: 6,
            },
        ],
    }
}

/// Unit cube centered on the origin, four vertices per face so normals stay
/// flat.
fn cube_mesh() -> (Vec<CubeVertex>, Vec<u32>) {
    // (normal, u, v) with u x v = normal, so each face winds
    // counter-clockwise seen from outside.
    let faces: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::Z, Vec3::X),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, u, v) in faces {
        let base = vertices.len() as u32;
        for corner in [-u - v, u - v, u + v, -u + v] {
            vertices.push(CubeVertex {
                position: ((normal + corner) * 0.5).to_array(),
                normal: normal.to_array(),
            });
        }
        indices.extend_from_slice(&[
            base,
            base + 1,
            base + 2,
            base,
            base + 2,
            base + 3,
        ]);
    }
    (vertices, indices)
}

fn scatter_instances() -> Vec<CubeInstance> {
    let mut rng = rand::rng();
    let mut instances = Vec::with_capacity(CUBE_COUNT + 1);

    // Central beacon, the brightest bloom source in the scene.
    instances.push(CubeInstance {
        model: Mat4::from_scale_rotation_translation(
            Vec3::splat(1.6),
            Quat::from_rotation_y(0.6),
            Vec3::ZERO,
        )
        .to_cols_array_2d(),
        color: [0.95, 0.85, 0.60, 2.5],
    });

    for _ in 0..CUBE_COUNT {
        let angle = rng.random::<f32>() * std::f32::consts::TAU;
        let radial =
            INNER_RADIUS + rng.random::<f32>().sqrt() * FIELD_RADIUS;
        let position = Vec3::new(
            angle.cos() * radial,
            (rng.random::<f32>() - 0.5) * 6.0,
            angle.sin() * radial,
        );
        let rotation = Quat::from_euler(
            glam::EulerRot::YXZ,
            rng.random::<f32>() * std::f32::consts::TAU,
            rng.random::<f32>() * std::f32::consts::TAU,
            0.0,
        );
        let scale = 0.25 + rng.random::<f32>() * 0.9;
        let tint = PALETTE[rng.random_range(0..PALETTE.len())];
        // Roughly a third of the cubes glow hard enough to bloom.
        let emissive = if rng.random::<f32>() < 0.35 {
            0.8 + rng.random::<f32>() * 1.8
        } else {
            rng.random::<f32>() * 0.15
        };
        instances.push(CubeInstance {
            model: Mat4::from_scale_rotation_translation(
                Vec3::splat(scale),
                rotation,
                position,
            )
            .to_cols_array_2d(),
            color: [tint[0], tint[1], tint[2], emissive],
        });
    }
    instances
}

/// Instanced cube field implementing [`SceneRenderer`].
pub struct DemoScene {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    camera_buffer: wgpu::Buffer,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    index_count: u32,
    instance_count: u32,
}

impl DemoScene {
    /// Build the cube field and its pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`AfterglowError::ShaderCompose`] when the scene shader fails
    /// to compose.
    pub fn new(context: &RenderContext) -> Result<Self, AfterglowError> {
        let mut composer = ShaderComposer::new()?;
        let shader = composer.compose(
            &context.device,
            "Demo Scene Shader",
            include_str!("../assets/shaders/demo_scene.wgsl"),
            "demo_scene.wgsl",
        )?;

        let camera_buffer = context.device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("Demo Camera Buffer"),
                contents: bytemuck::cast_slice(
                    &Mat4::IDENTITY.to_cols_array(),
                ),
                usage: wgpu::BufferUsages::UNIFORM
                    | wgpu::BufferUsages::COPY_DST,
            },
        );

        let bind_group_layout = context.device.create_bind_group_layout(
            &wgpu::BindGroupLayoutDescriptor {
                label: Some("Demo Scene Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            },
        );
        let bind_group =
            context.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Demo Scene Bind Group"),
                layout: &bind_group_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                }],
            });

        let (vertices, indices) = cube_mesh();
        let vertex_buffer = context.device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("Demo Cube Vertex Buffer"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            },
        );
        let index_buffer = context.device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("Demo Cube Index Buffer"),
                contents: bytemuck::cast_slice(&indices),
                usage: wgpu::BufferUsages::INDEX,
            },
        );

        let instances = scatter_instances();
        let instance_buffer = context.device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("Demo Instance Buffer"),
                contents: bytemuck::cast_slice(&instances),
                usage: wgpu::BufferUsages::VERTEX,
            },
        );

        let pipeline_layout = context.device.create_pipeline_layout(
            &wgpu::PipelineLayoutDescriptor {
                label: Some("Demo Scene Pipeline Layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            },
        );
        let pipeline = context.device.create_render_pipeline(
            &wgpu::RenderPipelineDescriptor {
                label: Some("Demo Scene Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[
                        cube_vertex_buffer_layout(),
                        cube_instance_buffer_layout(),
                    ],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: context.format(),
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: Some(wgpu::Face::Back),
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            },
        );

        Ok(Self {
            pipeline,
            bind_group,
            camera_buffer,
            vertex_buffer,
            index_buffer,
            instance_buffer,
            index_count: indices.len() as u32,
            instance_count: instances.len() as u32,
        })
    }
}

impl SceneRenderer for DemoScene {
    fn prepare(&mut self, queue: &wgpu::Queue, camera: &Camera) {
        queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&camera.view_projection().to_cols_array()),
        );
    }

    fn draw(&mut self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        pass.set_index_buffer(
            self.index_buffer.slice(..),
            wgpu::IndexFormat::Uint32,
        );
        pass.draw_indexed(0..self.index_count, 0, 0..self.instance_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_mesh_has_flat_face_normals() {
        let (vertices, indices) = cube_mesh();
        assert_eq!(vertices.len(), 24);
        assert_eq!(indices.len(), 36);
        // Every face's four vertices share one normal.
        for face in vertices.chunks(4) {
            for vertex in face {
                assert_eq!(vertex.normal, face[0].normal);
            }
        }
    }

    #[test]
    fn cube_faces_wind_counter_clockwise() {
        let (vertices, indices) = cube_mesh();
        for triangle in indices.chunks(3) {
            let a = Vec3::from_array(vertices[triangle[0] as usize].position);
            let b = Vec3::from_array(vertices[triangle[1] as usize].position);
            let c = Vec3::from_array(vertices[triangle[2] as usize].position);
            let normal =
                Vec3::from_array(vertices[triangle[0] as usize].normal);
            let winding = (b - a).cross(c - a);
            assert!(
                winding.dot(normal) > 0.0,
                "triangle {triangle:?} winds away from its normal"
            );
        }
    }

    #[test]
    fn scatter_keeps_cubes_outside_the_beacon() {
        for instance in scatter_instances().iter().skip(1) {
            let translation = Vec3::new(
                instance.model[3][0],
                instance.model[3][1],
                instance.model[3][2],
            );
            let planar =
                Vec3::new(translation.x, 0.0, translation.z).length();
            assert!(planar >= INNER_RADIUS - 1e-4);
        }
    }

    #[test]
    fn instance_stride_matches_attribute_offsets() {
        assert_eq!(size_of::<CubeInstance>(), 80);
        let layout = cube_instance_buffer_layout();
        assert_eq!(layout.array_stride, 80);
        assert_eq!(layout.attributes.len(), 5);
    }
}

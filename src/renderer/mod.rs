//! Rendering subsystems.
//!
//! Contains the post-processing pipeline (FXAA, motion blur, progressive
//! mip-chain bloom, directional focus blur, final composite) and the trait
//! external scene renderers implement to feed it.

pub mod postprocess;

use crate::camera::Camera;

/// Depth attachment format for scene rendering. The pipeline attaches a
/// depth buffer of this format to every scene pass, including direct-to-
/// display bypass rendering; scene pipelines must declare it in their
/// depth-stencil state.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// An externally owned 3D scene the pipeline renders each frame.
///
/// The pipeline calls [`prepare`](SceneRenderer::prepare) once per frame
/// before any encoding, then [`draw`](SceneRenderer::draw) inside an open
/// render pass whose color target uses the context's surface format and
/// whose depth target uses [`DEPTH_FORMAT`].
pub trait SceneRenderer {
    /// Upload per-frame data (camera uniforms, instance transforms).
    fn prepare(&mut self, queue: &wgpu::Queue, camera: &Camera);

    /// Record draw commands into the open scene render pass.
    fn draw(&mut self, pass: &mut wgpu::RenderPass<'_>);
}

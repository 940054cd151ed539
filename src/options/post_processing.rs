use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Post-processing tunables. These are the values UI panels read and write;
/// [`crate::renderer::postprocess::PostPipeline::apply_options`] pushes them
/// into live pass parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Effects", inline)]
#[serde(default)]
pub struct PostProcessingOptions {
    /// Luminance below this contributes nothing to bloom.
    #[schemars(title = "Bloom Threshold", range(min = 0.0, max = 1.0), extend("step" = 0.01))]
    pub bloom_threshold: f32,
    /// Width of the soft knee above the threshold.
    #[schemars(title = "Bloom Smoothing", range(min = 0.0, max = 2.0), extend("step" = 0.05))]
    pub bloom_smoothing: f32,
    /// Overall bloom contribution.
    #[schemars(title = "Bloom Strength", range(min = 0.0, max = 3.0), extend("step" = 0.05))]
    pub bloom_strength: f32,
    /// Shifts weight between fine and coarse blur levels.
    #[schemars(title = "Bloom Radius", range(min = 0.0, max = 1.0), extend("step" = 0.01))]
    pub bloom_radius: f32,
    /// Motion-blur velocity scale (0 disables the pass).
    #[schemars(title = "Motion Blur", range(min = 0.0, max = 4.0), extend("step" = 0.1))]
    pub velocity_scale: f32,
    /// Focal-band center in UV space, driven by the pointer rather than
    /// sliders.
    #[schemars(skip)]
    pub focus: [f32; 2],
    /// Focal-band rotation in radians.
    #[schemars(title = "Focus Rotation", range(min = 0.0, max = 6.283), extend("step" = 0.01))]
    pub focus_rotation: f32,
    /// How fast the live focus chases its target, per second.
    #[schemars(title = "Focus Response", range(min = 0.0, max = 20.0), extend("step" = 0.5))]
    pub focus_lerp_speed: f32,
    /// Chromatic offset magnitude during zoom blur.
    #[schemars(title = "Distortion", range(min = 0.0, max = 3.0), extend("step" = 0.05))]
    pub distortion: f32,
}

impl Default for PostProcessingOptions {
    fn default() -> Self {
        Self {
            bloom_threshold: 0.1,
            bloom_smoothing: 1.0,
            bloom_strength: 0.3,
            bloom_radius: 0.2,
            velocity_scale: 1.0,
            focus: [0.5, 0.5],
            focus_rotation: 0.0,
            focus_lerp_speed: 5.0,
            distortion: 1.0,
        }
    }
}

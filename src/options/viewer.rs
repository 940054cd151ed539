use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Viewer", inline)]
#[serde(default)]
/// Windowed-viewer settings.
pub struct ViewerOptions {
    /// Frame-rate cap; 0 leaves presentation uncapped.
    #[schemars(title = "Target FPS", range(min = 0.0, max = 240.0), extend("step" = 1.0))]
    pub target_fps: u32,
    /// Supersampling factor applied to every render target.
    #[schemars(title = "Render Scale", range(min = 1.0, max = 4.0), extend("step" = 1.0))]
    pub render_scale: u32,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            target_fps: 0,
            render_scale: 1,
        }
    }
}

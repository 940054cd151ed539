use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Camera", inline)]
#[serde(default)]
/// Camera projection and orbit parameters for the demo scene.
pub struct CameraOptions {
    /// Vertical field of view in degrees.
    #[schemars(title = "Field of View", range(min = 20.0, max = 90.0), extend("step" = 1.0))]
    pub fovy: f32,
    /// Near clipping plane distance.
    #[schemars(skip)]
    pub znear: f32,
    /// Far clipping plane distance.
    #[schemars(skip)]
    pub zfar: f32,
    /// Orbit angular speed in radians per second.
    #[schemars(title = "Orbit Speed", range(min = 0.0, max = 2.0), extend("step" = 0.05))]
    pub orbit_speed: f32,
    /// Orbit distance from the scene origin.
    #[schemars(title = "Orbit Radius", range(min = 4.0, max = 40.0), extend("step" = 0.5))]
    pub orbit_radius: f32,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            fovy: 45.0,
            znear: 0.1,
            zfar: 500.0,
            orbit_speed: 0.25,
            orbit_radius: 14.0,
        }
    }
}

//! Centralized runtime options with TOML preset support.
//!
//! All tweakable settings (post-processing, camera, viewer) are consolidated
//! here. Options serialize to/from TOML for presets, and each field carries
//! schema annotations so a settings panel can be generated from
//! [`Options::json_schema`] without hand-written UI code.

mod camera;
mod post_processing;
mod viewer;

use std::path::Path;

pub use camera::CameraOptions;
pub use post_processing::PostProcessingOptions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
pub use viewer::ViewerOptions;

use crate::error::AfterglowError;

/// Top-level options container. All sub-structs use `#[serde(default)]` so
/// partial TOML files (e.g. only overriding `[post_processing]`) work
/// correctly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema)]
#[serde(default)]
pub struct Options {
    /// Post-processing effect parameters.
    pub post_processing: PostProcessingOptions,
    /// Camera projection and orbit parameters.
    pub camera: CameraOptions,
    /// Windowed-viewer settings.
    pub viewer: ViewerOptions,
}

impl Options {
    /// Generate JSON Schema describing the UI-exposed options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Options)
    }

    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AfterglowError::Io`] when the file cannot be read and
    /// [`AfterglowError::OptionsParse`] when it is not valid options TOML.
    pub fn load(path: &Path) -> Result<Self, AfterglowError> {
        let content = std::fs::read_to_string(path).map_err(AfterglowError::Io)?;
        toml::from_str(&content).map_err(|e| AfterglowError::OptionsParse(e.to_string()))
    }

    /// Save options to a TOML file (pretty-printed), creating parent
    /// directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`AfterglowError::OptionsParse`] when serialization fails and
    /// [`AfterglowError::Io`] when the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), AfterglowError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| AfterglowError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(AfterglowError::Io)?;
        }
        std::fs::write(path, content).map_err(AfterglowError::Io)
    }

    /// List available preset names (TOML file stems) in a directory.
    #[must_use]
    pub fn list_presets(dir: &Path) -> Vec<String> {
        let mut names = Vec::new();
        if let Ok(entries) = std::fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "toml") {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        names.push(stem.to_owned());
                    }
                }
            }
        }
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_round_trips_through_toml() {
        let opts = Options::default();
        let toml_str = toml::to_string_pretty(&opts).unwrap();
        let parsed: Options = toml::from_str(&toml_str).unwrap();
        assert_eq!(opts, parsed);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r"
[post_processing]
bloom_strength = 0.9

[viewer]
target_fps = 60
";
        let opts: Options = toml::from_str(toml_str).unwrap();
        assert_eq!(opts.post_processing.bloom_strength, 0.9);
        assert_eq!(opts.viewer.target_fps, 60);
        // Everything else should be default
        assert_eq!(opts.post_processing.bloom_threshold, 0.1);
        assert_eq!(opts.camera.fovy, 45.0);
        assert_eq!(opts.viewer.render_scale, 1);
    }

    #[test]
    fn schema_has_expected_properties() {
        let schema_value = serde_json::to_value(Options::json_schema()).unwrap();
        let props = schema_value["properties"].as_object().unwrap();

        // UI-exposed sections should be present
        assert!(props.contains_key("post_processing"));
        assert!(props.contains_key("camera"));
        assert!(props.contains_key("viewer"));

        // Effects should have exposed fields but not pointer-driven ones
        let effects = &props["post_processing"]["properties"];
        assert!(effects.get("bloom_threshold").is_some());
        assert!(effects.get("velocity_scale").is_some());
        assert!(effects.get("focus").is_none());

        // Clip planes are not sliders
        let camera = &props["camera"]["properties"];
        assert!(camera.get("fovy").is_some());
        assert!(camera.get("znear").is_none());
    }

    #[test]
    fn list_presets_sorts_and_strips_extensions() {
        let dir = std::env::temp_dir().join("afterglow_preset_list_test");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        Options::default().save(&dir.join("b.toml")).unwrap();
        Options::default().save(&dir.join("a.toml")).unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();
        assert_eq!(Options::list_presets(&dir), vec!["a", "b"]);
        let _ = std::fs::remove_dir_all(&dir);
    }
}

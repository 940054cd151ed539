use naga_oil::compose::{
    ComposableModuleDescriptor, Composer, NagaModuleDescriptor, ShaderLanguage,
    ShaderType,
};
use std::borrow::Cow;

use crate::error::AfterglowError;

/// Wraps `naga_oil::compose::Composer` to provide shader composition with
/// `#import` support.
///
/// Pre-loads all shared WGSL modules at construction time. Consuming shaders
/// use `#import afterglow::module_name` to pull in shared code. The composer
/// produces `naga::Module` IR directly, skipping WGSL re-parse at runtime.
pub struct ShaderComposer {
    composer: Composer,
}

/// Shared module definition. The import path comes from the
/// `#define_import_path` directive inside each module source.
struct ModuleDef {
    source: &'static str,
    file_path: &'static str,
}

impl ShaderComposer {
    /// Build a composer with every shared module registered.
    ///
    /// # Errors
    ///
    /// Returns [`AfterglowError::ShaderCompose`] if a shared module fails to
    /// parse; pipeline construction cannot proceed without them.
    pub fn new() -> Result<Self, AfterglowError> {
        let mut composer = Composer::default();

        // Register shared modules in dependency order; modules with no
        // dependencies first.
        let modules: &[ModuleDef] = &[
            ModuleDef {
                source: include_str!(
                    "../../assets/shaders/modules/fullscreen.wgsl"
                ),
                file_path: "modules/fullscreen.wgsl",
            },
            ModuleDef {
                source: include_str!("../../assets/shaders/modules/focal.wgsl"),
                file_path: "modules/focal.wgsl",
            },
        ];

        for m in modules {
            let _ = composer
                .add_composable_module(ComposableModuleDescriptor {
                    source: m.source,
                    file_path: m.file_path,
                    language: ShaderLanguage::Wgsl,
                    ..Default::default()
                })
                .map_err(|e| AfterglowError::ShaderCompose {
                    shader: m.file_path.to_owned(),
                    message: e.to_string(),
                })?;
        }

        Ok(Self { composer })
    }

    /// Compose a shader source string (which may contain `#import`
    /// directives) into a `wgpu::ShaderModule` ready for pipeline creation.
    ///
    /// # Errors
    ///
    /// Returns [`AfterglowError::ShaderCompose`] when the source fails to
    /// parse or an import cannot be resolved.
    pub fn compose(
        &mut self,
        device: &wgpu::Device,
        label: &str,
        source: &str,
        file_path: &str,
    ) -> Result<wgpu::ShaderModule, AfterglowError> {
        let naga_module = self
            .composer
            .make_naga_module(NagaModuleDescriptor {
                source,
                file_path,
                shader_type: ShaderType::Wgsl,
                ..Default::default()
            })
            .map_err(|e| AfterglowError::ShaderCompose {
                shader: file_path.to_owned(),
                message: e.to_string(),
            })?;

        Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Naga(Cow::Owned(naga_module)),
        }))
    }

    /// Compose a shader source into a `naga::Module` without creating a wgpu
    /// shader module. Useful for testing shader composition without a GPU
    /// device.
    ///
    /// # Errors
    ///
    /// Returns the composer diagnostic on parse/import failure.
    pub fn compose_naga(
        &mut self,
        source: &str,
        file_path: &str,
    ) -> Result<naga::Module, Box<naga_oil::compose::ComposerError>> {
        self.composer
            .make_naga_module(NagaModuleDescriptor {
                source,
                file_path,
                shader_type: ShaderType::Wgsl,
                ..Default::default()
            })
            .map_err(Box::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every composable shader in the crate, as (source, file_path).
    fn all_shader_sources() -> Vec<(&'static str, &'static str)> {
        vec![
            (
                include_str!("../../assets/shaders/fxaa.wgsl"),
                "fxaa.wgsl",
            ),
            (
                include_str!("../../assets/shaders/motion_blur.wgsl"),
                "motion_blur.wgsl",
            ),
            (
                include_str!("../../assets/shaders/bright_pass.wgsl"),
                "bright_pass.wgsl",
            ),
            (
                include_str!("../../assets/shaders/mip_blur.wgsl"),
                "mip_blur.wgsl",
            ),
            (
                include_str!("../../assets/shaders/bloom_composite.wgsl"),
                "bloom_composite.wgsl",
            ),
            (
                include_str!("../../assets/shaders/focus_blur.wgsl"),
                "focus_blur.wgsl",
            ),
            (
                include_str!("../../assets/shaders/final_composite.wgsl"),
                "final_composite.wgsl",
            ),
            (
                include_str!("../../assets/shaders/demo_scene.wgsl"),
                "demo_scene.wgsl",
            ),
        ]
    }

    #[test]
    fn test_all_shaders_compose() {
        let mut composer = ShaderComposer::new().unwrap();
        for (source, file_path) in all_shader_sources() {
            if let Err(e) = composer.compose_naga(source, file_path) {
                panic!("shader '{file_path}' failed to compose: {e}");
            }
        }
    }

    #[test]
    fn unresolved_import_is_reported() {
        let mut composer = ShaderComposer::new().unwrap();
        let source = "#import afterglow::missing\n\
                      @fragment fn fs_main() -> @location(0) vec4<f32> {\n\
                          return vec4<f32>(0.0);\n\
                      }\n";
        assert!(composer.compose_naga(source, "bad.wgsl").is_err());
    }
}

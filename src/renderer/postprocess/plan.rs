//! Per-frame pass selection.
//!
//! The frame mode is chosen exactly once per `update` from the current
//! parameter values; after that the stage order is fixed. Motion blur and
//! directional focus blur are strictly mutually exclusive because they
//! reuse each other's surfaces as scratch.

use super::targets::MIP_LEVELS;

/// Which optional blur stage runs this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameMode {
    /// Camera motion blur reconstructed from scene depth and the previous
    /// frame's matrices.
    MotionBlur,
    /// Directional focus blur driven by the zoom blur factor.
    DirectionalBlur,
    /// Both optional stages skipped.
    Neither,
}

impl FrameMode {
    /// Select the mode for this frame. A nonzero blur factor always wins;
    /// motion blur otherwise requires a nonzero velocity scale.
    pub fn select(blur_factor: f32, velocity_scale: f32) -> Self {
        if blur_factor > 0.0 {
            Self::DirectionalBlur
        } else if velocity_scale > 0.0 {
            Self::MotionBlur
        } else {
            Self::Neither
        }
    }
}

/// One stage of the frame sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Render the 3D scene into the scene surface.
    Scene,
    /// FXAA over the scene color into the smoothed surface.
    AntiAlias,
    /// Velocity-based blur of the smoothed surface into the motion surface.
    MotionBlur,
    /// Threshold extraction of the carrier into the bright surface.
    BrightPass,
    /// Separable Gaussian blur over all mip levels, horizontal then
    /// vertical per level.
    MipBlur,
    /// Weighted recombination of the blurred levels with the carrier into
    /// the level-0 horizontal mip surface, reused as scratch.
    BloomComposite,
    /// Two-pass directional blur of the composited image through the
    /// full-resolution scratch surfaces.
    FocusBlur,
    /// Chromatic distortion, ordered dithering, and presentation.
    FinalComposite,
}

impl Stage {
    /// How many full-screen passes this stage encodes.
    fn screen_passes(self) -> u32 {
        match self {
            Self::Scene => 0,
            Self::MipBlur => MIP_LEVELS as u32 * 2,
            Self::FocusBlur => 2,
            _ => 1,
        }
    }
}

const MOTION_PLAN: &[Stage] = &[
    Stage::Scene,
    Stage::AntiAlias,
    Stage::MotionBlur,
    Stage::BrightPass,
    Stage::MipBlur,
    Stage::BloomComposite,
    Stage::FinalComposite,
];

const DIRECTIONAL_PLAN: &[Stage] = &[
    Stage::Scene,
    Stage::AntiAlias,
    Stage::BrightPass,
    Stage::MipBlur,
    Stage::BloomComposite,
    Stage::FocusBlur,
    Stage::FinalComposite,
];

const NEITHER_PLAN: &[Stage] = &[
    Stage::Scene,
    Stage::AntiAlias,
    Stage::BrightPass,
    Stage::MipBlur,
    Stage::BloomComposite,
    Stage::FinalComposite,
];

/// The fixed stage order for a frame mode.
pub fn stages(mode: FrameMode) -> &'static [Stage] {
    match mode {
        FrameMode::MotionBlur => MOTION_PLAN,
        FrameMode::DirectionalBlur => DIRECTIONAL_PLAN,
        FrameMode::Neither => NEITHER_PLAN,
    }
}

/// Total full-screen passes a frame in this mode encodes.
pub fn screen_pass_count(mode: FrameMode) -> u32 {
    stages(mode).iter().map(|stage| stage.screen_passes()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonzero_blur_factor_always_wins() {
        assert_eq!(
            FrameMode::select(0.5, 1.0),
            FrameMode::DirectionalBlur
        );
        assert_eq!(
            FrameMode::select(0.001, 0.0),
            FrameMode::DirectionalBlur
        );
    }

    #[test]
    fn motion_blur_requires_velocity_scale() {
        assert_eq!(FrameMode::select(0.0, 1.0), FrameMode::MotionBlur);
        assert_eq!(FrameMode::select(0.0, 0.0), FrameMode::Neither);
    }

    #[test]
    fn plans_share_fixed_skeleton() {
        for mode in [
            FrameMode::MotionBlur,
            FrameMode::DirectionalBlur,
            FrameMode::Neither,
        ] {
            let plan = stages(mode);
            assert_eq!(plan[0], Stage::Scene);
            assert_eq!(plan[1], Stage::AntiAlias);
            assert_eq!(plan[plan.len() - 1], Stage::FinalComposite);
            let bright = plan
                .iter()
                .position(|&s| s == Stage::BrightPass)
                .unwrap();
            assert_eq!(plan[bright + 1], Stage::MipBlur);
            assert_eq!(plan[bright + 2], Stage::BloomComposite);
        }
    }

    #[test]
    fn optional_stages_are_mutually_exclusive() {
        for mode in [
            FrameMode::MotionBlur,
            FrameMode::DirectionalBlur,
            FrameMode::Neither,
        ] {
            let plan = stages(mode);
            let has_motion = plan.contains(&Stage::MotionBlur);
            let has_focus = plan.contains(&Stage::FocusBlur);
            assert!(!(has_motion && has_focus));
        }
        assert!(stages(FrameMode::MotionBlur).contains(&Stage::MotionBlur));
        assert!(stages(FrameMode::DirectionalBlur).contains(&Stage::FocusBlur));
        assert!(!stages(FrameMode::Neither).contains(&Stage::MotionBlur));
        assert!(!stages(FrameMode::Neither).contains(&Stage::FocusBlur));
    }

    #[test]
    fn screen_pass_counts_per_mode() {
        // AA + motion + bright + 5x2 blur + composite + final
        assert_eq!(screen_pass_count(FrameMode::MotionBlur), 15);
        // AA + bright + 5x2 blur + composite + 2x focus + final
        assert_eq!(screen_pass_count(FrameMode::DirectionalBlur), 16);
        // AA + bright + 5x2 blur + composite + final
        assert_eq!(screen_pass_count(FrameMode::Neither), 14);
    }
}

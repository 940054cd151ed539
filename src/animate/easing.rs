//! Easing curves for parameter transitions.
//!
//! Every curve maps normalized time in [0, 1] to a progress value. All are
//! cheap enough to evaluate per frame for every live tween.

/// Easing curve variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    /// Linear interpolation (no easing).
    Linear,
    /// Quadratic ease-in (slow start, fast end).
    QuadraticIn,
    /// Quadratic ease-out (fast start, slow end).
    QuadraticOut,
    /// Cubic ease-out (fast start, long settle).
    CubicOut,
    /// Back ease-out: overshoots the target, then settles. Used for the
    /// zoom-in "camera settle" feel.
    BackOut,
}

impl Easing {
    /// Default curve: cubic ease-out, a neutral settle for most parameters.
    pub const DEFAULT: Easing = Easing::CubicOut;

    /// Evaluate the curve at normalized time `t`.
    ///
    /// Input `t` is clamped to [0.0, 1.0]. Output is in [0.0, 1.0] for every
    /// curve except [`Easing::BackOut`], which overshoots 1.0 mid-curve
    /// before settling back to 1.0 at `t = 1`.
    #[inline]
    #[must_use]
    pub fn evaluate(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            Self::Linear => t,
            Self::QuadraticIn => t * t,
            Self::QuadraticOut => {
                let omt = 1.0 - t;
                1.0 - omt * omt
            }
            Self::CubicOut => {
                let omt = 1.0 - t;
                1.0 - omt * omt * omt
            }
            Self::BackOut => {
                // Standard back-out coefficients; peak overshoot ~1.10 near
                // t = 0.58.
                const C1: f32 = 1.701_58;
                const C3: f32 = C1 + 1.0;
                let tm = t - 1.0;
                1.0 + C3 * tm * tm * tm + C1 * tm * tm
            }
        }
    }
}

impl Default for Easing {
    #[inline]
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_endpoints() {
        let linear = Easing::Linear;
        assert_eq!(linear.evaluate(0.0), 0.0);
        assert_eq!(linear.evaluate(0.5), 0.5);
        assert_eq!(linear.evaluate(1.0), 1.0);
    }

    #[test]
    fn test_all_curves_hit_endpoints() {
        for curve in [
            Easing::Linear,
            Easing::QuadraticIn,
            Easing::QuadraticOut,
            Easing::CubicOut,
            Easing::BackOut,
        ] {
            assert!(
                curve.evaluate(0.0).abs() < 1e-6,
                "{curve:?} should start at 0"
            );
            assert!(
                (curve.evaluate(1.0) - 1.0).abs() < 1e-6,
                "{curve:?} should end at 1"
            );
        }
    }

    #[test]
    fn test_input_clamping() {
        assert_eq!(Easing::Linear.evaluate(-0.5), 0.0);
        assert_eq!(Easing::Linear.evaluate(1.5), 1.0);
        assert!(Easing::BackOut.evaluate(-0.5).abs() < 1e-6);
        assert!((Easing::BackOut.evaluate(1.5) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_quadratic_values() {
        assert_eq!(Easing::QuadraticIn.evaluate(0.5), 0.25); // 0.5² = 0.25
        assert_eq!(Easing::QuadraticOut.evaluate(0.5), 0.75); // 1 - 0.5²
    }

    #[test]
    fn test_cubic_out_value() {
        // 1 - (1 - 0.5)³ = 0.875
        assert!((Easing::CubicOut.evaluate(0.5) - 0.875).abs() < 1e-6);
    }

    #[test]
    fn test_back_out_overshoots() {
        // The defining property: the curve exceeds 1.0 mid-flight.
        let peak = Easing::BackOut.evaluate(0.58);
        assert!(peak > 1.05, "expected overshoot, got {peak}");
        assert!(peak < 1.2, "overshoot should stay modest, got {peak}");
        // But it never undershoots at the start.
        assert!(Easing::BackOut.evaluate(0.1) > -0.1);
    }

    #[test]
    fn test_default_is_cubic_out() {
        assert_eq!(Easing::default(), Easing::CubicOut);
        assert_eq!(Easing::DEFAULT, Easing::CubicOut);
    }
}

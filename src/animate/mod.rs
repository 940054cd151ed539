//! Parameter animation: keyed single-slot tweens on a shared timeline.
//!
//! An [`Animator`] holds at most one live [`Tween`] per key. Starting a new
//! tween on a key replaces (and thereby cancels) the previous one — the
//! single-slot rule that backs cancel-and-reschedule transitions like the
//! pipeline's zoom. Time is an absolute seconds value supplied by the
//! caller, normally the frame clock's monotonic timeline, which keeps the
//! whole module deterministic and testable without real clocks.

pub mod easing;

pub use easing::Easing;

/// Linear interpolation between `a` and `b` by `t`.
#[inline]
#[must_use]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    (b - a).mul_add(t, a)
}

/// Default tween duration in seconds when none is given.
pub const DEFAULT_DURATION: f64 = 0.3;

/// One scheduled value transition: hold `from` through the delay, then move
/// to `to` over `duration` seconds along an easing curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    from: f32,
    to: f32,
    delay: f64,
    duration: f64,
    easing: Easing,
}

impl Tween {
    /// Create a tween from `from` to `to` with the default duration, no
    /// delay, and the default easing.
    #[must_use]
    pub fn new(from: f32, to: f32) -> Self {
        Self {
            from,
            to,
            delay: 0.0,
            duration: DEFAULT_DURATION,
            easing: Easing::DEFAULT,
        }
    }

    /// Set the motion duration in seconds. Negative or non-finite values are
    /// clamped to zero (an instant jump) and logged.
    #[must_use]
    pub fn duration(mut self, seconds: f64) -> Self {
        self.duration = sanitize_seconds("duration", seconds);
        self
    }

    /// Set the delay before motion begins. Negative or non-finite values are
    /// clamped to zero and logged.
    #[must_use]
    pub fn delay(mut self, seconds: f64) -> Self {
        self.delay = sanitize_seconds("delay", seconds);
        self
    }

    /// Set the easing curve.
    #[must_use]
    pub fn easing(mut self, curve: Easing) -> Self {
        self.easing = curve;
        self
    }

    /// Target value of this tween.
    #[must_use]
    pub fn target(&self) -> f32 {
        self.to
    }

    /// Sample at `now`, where motion begins at `begin` (anchor + delay).
    /// Returns the current value and whether the tween has finished.
    fn sample(&self, begin: f64, now: f64) -> (f32, bool) {
        if now < begin {
            return (self.from, false);
        }
        if self.duration <= 0.0 {
            return (self.to, true);
        }
        let t = ((now - begin) / self.duration) as f32;
        (lerp(self.from, self.to, self.easing.evaluate(t)), t >= 1.0)
    }
}

fn sanitize_seconds(what: &str, seconds: f64) -> f64 {
    if seconds.is_finite() && seconds >= 0.0 {
        seconds
    } else {
        log::warn!("tween {what} {seconds} is invalid, clamping to 0");
        0.0
    }
}

#[derive(Debug, Clone, Copy)]
struct Channel<K> {
    key: K,
    /// Timeline second at which the tween was scheduled; motion begins at
    /// `anchor + delay`.
    anchor: f64,
    tween: Tween,
}

/// Keyed tween scheduler with at most one live tween per key.
#[derive(Debug, Default)]
pub struct Animator<K> {
    channels: Vec<Channel<K>>,
}

impl<K: Copy + PartialEq> Animator<K> {
    /// Create an empty animator.
    #[must_use]
    pub fn new() -> Self {
        Self { channels: Vec::new() }
    }

    /// Schedule `tween` on `key` at timeline second `now`. Any tween already
    /// live on the same key is dropped; replacing the slot is the cancel.
    pub fn start(&mut self, key: K, tween: Tween, now: f64) {
        let channel = Channel { key, anchor: now, tween };
        if let Some(existing) =
            self.channels.iter_mut().find(|c| c.key == key)
        {
            *existing = channel;
        } else {
            self.channels.push(channel);
        }
    }

    /// Cancel the tween on `key`, if any. Returns whether one was live.
    pub fn cancel(&mut self, key: K) -> bool {
        if let Some(i) = self.channels.iter().position(|c| c.key == key) {
            let _ = self.channels.swap_remove(i);
            true
        } else {
            false
        }
    }

    /// Whether a tween is live on `key` (pending delay counts as live).
    #[must_use]
    pub fn is_active(&self, key: K) -> bool {
        self.channels.iter().any(|c| c.key == key)
    }

    /// Sample every live tween at timeline second `now`, feeding each
    /// current value into `apply`. Finished tweens are removed and their
    /// keys returned so callers can react to completion.
    pub fn update(
        &mut self,
        now: f64,
        mut apply: impl FnMut(K, f32),
    ) -> Vec<K> {
        let mut completed = Vec::new();
        let mut i = 0;
        while i < self.channels.len() {
            let channel = self.channels[i];
            let begin = channel.anchor + channel.tween.delay;
            let (value, done) = channel.tween.sample(begin, now);
            apply(channel.key, value);
            if done {
                completed.push(channel.key);
                let _ = self.channels.swap_remove(i);
            } else {
                i += 1;
            }
        }
        completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Param {
        Blur,
        Strength,
    }

    fn last_value(animator: &mut Animator<Param>, now: f64) -> Option<f32> {
        let mut out = None;
        let _ = animator.update(now, |_, v| out = Some(v));
        out
    }

    #[test]
    fn test_linear_tween_progress() {
        let mut animator = Animator::new();
        animator.start(
            Param::Blur,
            Tween::new(0.0, 1.0).duration(1.0).easing(Easing::Linear),
            0.0,
        );
        assert_eq!(last_value(&mut animator, 0.5), Some(0.5));
        assert_eq!(last_value(&mut animator, 1.0), Some(1.0));
    }

    #[test]
    fn test_delay_holds_start_value() {
        let mut animator = Animator::new();
        animator.start(
            Param::Blur,
            Tween::new(0.25, 1.0)
                .delay(0.3)
                .duration(1.0)
                .easing(Easing::Linear),
            0.0,
        );
        // Before the delay elapses the value holds at `from`.
        assert_eq!(last_value(&mut animator, 0.1), Some(0.25));
        assert_eq!(last_value(&mut animator, 0.29), Some(0.25));
        // Motion starts at t = 0.3.
        assert_eq!(last_value(&mut animator, 0.8), Some(0.625));
    }

    #[test]
    fn test_starting_same_key_replaces() {
        let mut animator = Animator::new();
        animator.start(
            Param::Blur,
            Tween::new(0.0, 1.0).duration(1.0).easing(Easing::Linear),
            0.0,
        );
        // Replacement cancels the first tween outright.
        animator.start(
            Param::Blur,
            Tween::new(0.5, 0.0).duration(1.0).easing(Easing::Linear),
            0.0,
        );
        assert!(animator.is_active(Param::Blur));
        assert_eq!(last_value(&mut animator, 0.5), Some(0.25));
    }

    #[test]
    fn test_completion_removes_channel() {
        let mut animator = Animator::new();
        animator.start(
            Param::Blur,
            Tween::new(0.0, 1.0).duration(0.5),
            0.0,
        );
        let completed = animator.update(1.0, |_, _| {});
        assert_eq!(completed, vec![Param::Blur]);
        assert!(!animator.is_active(Param::Blur));
        assert!(animator.update(2.0, |_, _| {}).is_empty());
    }

    #[test]
    fn test_zero_duration_jumps_to_target() {
        let mut animator = Animator::new();
        animator.start(Param::Blur, Tween::new(0.0, 1.0).duration(0.0), 5.0);
        assert_eq!(last_value(&mut animator, 5.0), Some(1.0));
    }

    #[test]
    fn test_negative_duration_clamped() {
        let tween = Tween::new(0.0, 1.0).duration(-2.0).delay(-1.0);
        // Clamped to an instant jump with no delay.
        assert_eq!(tween.sample(0.0, 0.0), (1.0, true));
    }

    #[test]
    fn test_cancel() {
        let mut animator = Animator::new();
        animator.start(Param::Blur, Tween::new(0.0, 1.0), 0.0);
        assert!(animator.cancel(Param::Blur));
        assert!(!animator.is_active(Param::Blur));
        assert!(!animator.cancel(Param::Blur));
    }

    #[test]
    fn test_keys_are_independent() {
        let mut animator = Animator::new();
        animator.start(
            Param::Blur,
            Tween::new(0.0, 1.0).duration(1.0).easing(Easing::Linear),
            0.0,
        );
        animator.start(
            Param::Strength,
            Tween::new(1.0, 0.0).duration(1.0).easing(Easing::Linear),
            0.0,
        );
        let mut blur = None;
        let mut strength = None;
        let _ = animator.update(0.5, |k, v| match k {
            Param::Blur => blur = Some(v),
            Param::Strength => strength = Some(v),
        });
        assert_eq!(blur, Some(0.5));
        assert_eq!(strength, Some(0.5));
    }

    #[test]
    fn test_back_out_tween_overshoots_target() {
        let mut animator = Animator::new();
        animator.start(
            Param::Blur,
            Tween::new(0.0, 1.0).duration(1.0).easing(Easing::BackOut),
            0.0,
        );
        let mid = last_value(&mut animator, 0.58).unwrap();
        assert!(mid > 1.0, "back-out should overshoot, got {mid}");
        assert_eq!(last_value(&mut animator, 1.0), Some(1.0));
    }
}

//! Frame clock: monotonic timeline, per-frame callbacks, throttling.
//!
//! The clock owns the application's logical timeline. Each `tick` advances
//! time by a clamped delta and invokes registered callbacks in registration
//! order; a callback can be throttled to a fixed rate, in which case the
//! delta it observes accumulates across the frames it skipped. The logical
//! core (`tick_with`) is driven by plain seconds so it tests without real
//! clocks; `tick` feeds it from a `web_time::Instant` epoch.

use web_time::Instant;

/// Largest delta a single tick may produce, in seconds. A suspended window
/// resuming after minutes must not produce a minutes-long simulation step.
pub const DEFAULT_MAX_DELTA: f64 = 0.25;

/// One frame's timing: monotonic time and delta, both in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    /// Seconds on the clock's logical timeline.
    pub time: f64,
    /// Seconds since the observer last ran (clamped; accumulates across
    /// skipped frames for throttled callbacks).
    pub delta: f64,
}

/// Handle identifying a registered callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

type FrameCallback = Box<dyn FnMut(FrameTick)>;

struct Slot {
    id: CallbackId,
    callback: FrameCallback,
    /// Minimum seconds between invocations (0 = every tick).
    min_interval: f64,
    /// Logical time of the last invocation.
    last_run: f64,
}

/// Monotonic frame clock with ordered, optionally throttled callbacks.
pub struct FrameClock {
    epoch: Instant,
    raw_last: f64,
    time: f64,
    max_delta: f64,
    min_frame_time: f64,
    smoothed_fps: f32,
    smoothing: f32,
    slots: Vec<Slot>,
    next_id: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    /// Create a clock starting at logical time zero, unlimited frame rate.
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            raw_last: 0.0,
            time: 0.0,
            max_delta: DEFAULT_MAX_DELTA,
            min_frame_time: 0.0,
            smoothed_fps: 60.0,
            smoothing: 0.05,
            slots: Vec::new(),
            next_id: 0,
        }
    }

    /// Current logical time in seconds.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Smoothed frames-per-second estimate (exponential moving average).
    #[must_use]
    pub fn fps(&self) -> f32 {
        self.smoothed_fps
    }

    /// Cap the per-tick delta. Non-positive or non-finite caps are ignored.
    pub fn set_max_delta(&mut self, seconds: f64) {
        if seconds.is_finite() && seconds > 0.0 {
            self.max_delta = seconds;
        } else {
            log::warn!("ignoring invalid max delta {seconds}");
        }
    }

    /// Limit the tick rate (0 = unlimited). [`Self::should_tick`] reports
    /// whether enough wall time has passed for the next frame.
    pub fn set_target_fps(&mut self, fps: u32) {
        self.min_frame_time = if fps > 0 { 1.0 / f64::from(fps) } else { 0.0 };
    }

    /// Whether enough wall time has passed since the last tick to honor the
    /// target frame rate. Always true when unlimited.
    #[must_use]
    pub fn should_tick(&self) -> bool {
        if self.min_frame_time <= 0.0 {
            return true;
        }
        self.epoch.elapsed().as_secs_f64() - self.raw_last
            >= self.min_frame_time
    }

    /// Register a per-frame callback; callbacks run in registration order.
    pub fn register(
        &mut self,
        callback: impl FnMut(FrameTick) + 'static,
    ) -> CallbackId {
        let id = CallbackId(self.next_id);
        self.next_id += 1;
        self.slots.push(Slot {
            id,
            callback: Box::new(callback),
            min_interval: 0.0,
            last_run: self.time,
        });
        id
    }

    /// Remove a callback. Returns whether it was registered.
    pub fn unregister(&mut self, id: CallbackId) -> bool {
        let before = self.slots.len();
        self.slots.retain(|s| s.id != id);
        self.slots.len() != before
    }

    /// Throttle a callback to at most `hz` invocations per second
    /// (`hz <= 0` restores every-tick invocation). Returns whether the
    /// callback exists.
    pub fn set_rate(&mut self, id: CallbackId, hz: f64) -> bool {
        if let Some(slot) = self.slots.iter_mut().find(|s| s.id == id) {
            slot.min_interval =
                if hz.is_finite() && hz > 0.0 { 1.0 / hz } else { 0.0 };
            true
        } else {
            false
        }
    }

    /// Advance the clock from the wall-time epoch and run callbacks.
    /// Returns the global tick for the caller's own frame work.
    pub fn tick(&mut self) -> FrameTick {
        self.tick_with(self.epoch.elapsed().as_secs_f64())
    }

    /// Advance the clock to `raw_seconds` on the wall timeline. The logical
    /// delta is `raw_seconds - previous`, clamped to `[0, max_delta]`, so
    /// logical time never runs backwards and never jumps.
    pub fn tick_with(&mut self, raw_seconds: f64) -> FrameTick {
        let raw_delta = raw_seconds - self.raw_last;
        self.raw_last = raw_seconds;
        let delta = raw_delta.clamp(0.0, self.max_delta);
        self.time += delta;

        if delta > 0.0 {
            let instant_fps = (1.0 / delta) as f32;
            self.smoothed_fps = self
                .smoothed_fps
                .mul_add(1.0 - self.smoothing, instant_fps * self.smoothing);
        }

        let now = self.time;
        for slot in &mut self.slots {
            let elapsed = now - slot.last_run;
            if slot.min_interval > 0.0 && elapsed < slot.min_interval {
                continue;
            }
            slot.last_run = now;
            (slot.callback)(FrameTick { time: now, delta: elapsed });
        }

        FrameTick { time: now, delta }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn callbacks_run_in_registration_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut clock = FrameClock::new();

        let a = Rc::clone(&order);
        let _ = clock.register(move |_| a.borrow_mut().push("first"));
        let b = Rc::clone(&order);
        let _ = clock.register(move |_| b.borrow_mut().push("second"));

        let _ = clock.tick_with(0.016);
        assert_eq!(*order.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn unregister_stops_invocation() {
        let count = Rc::new(RefCell::new(0));
        let mut clock = FrameClock::new();
        let c = Rc::clone(&count);
        let id = clock.register(move |_| *c.borrow_mut() += 1);

        let _ = clock.tick_with(0.016);
        assert!(clock.unregister(id));
        let _ = clock.tick_with(0.032);
        assert_eq!(*count.borrow(), 1);
        assert!(!clock.unregister(id));
    }

    #[test]
    fn throttled_callback_accumulates_delta() {
        let ticks = Rc::new(RefCell::new(Vec::new()));
        let mut clock = FrameClock::new();
        let t = Rc::clone(&ticks);
        let id = clock.register(move |tick| t.borrow_mut().push(tick));
        assert!(clock.set_rate(id, 10.0)); // at most every 100 ms

        // 30 ms steps: fires at t=0.12 (first time 100 ms have accumulated)
        // and again at t=0.24.
        for i in 1..=8 {
            let _ = clock.tick_with(f64::from(i) * 0.03);
        }
        let fired = ticks.borrow();
        assert_eq!(fired.len(), 2);
        assert!((fired[0].time - 0.12).abs() < 1e-9);
        assert!((fired[0].delta - 0.12).abs() < 1e-9);
        assert!((fired[1].time - 0.24).abs() < 1e-9);
        assert!((fired[1].delta - 0.12).abs() < 1e-9);
    }

    #[test]
    fn delta_is_clamped() {
        let mut clock = FrameClock::new();
        let tick = clock.tick_with(60.0); // a minute-long stall
        assert_eq!(tick.delta, DEFAULT_MAX_DELTA);
        assert_eq!(clock.time(), DEFAULT_MAX_DELTA);
    }

    #[test]
    fn time_never_runs_backwards() {
        let mut clock = FrameClock::new();
        let _ = clock.tick_with(0.1);
        let tick = clock.tick_with(0.05); // raw time regressed
        assert_eq!(tick.delta, 0.0);
        assert!((clock.time() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn fps_converges_to_tick_rate() {
        let mut clock = FrameClock::new();
        for i in 1..=300 {
            let _ = clock.tick_with(f64::from(i) * 0.02); // steady 50 Hz
        }
        assert!((clock.fps() - 50.0).abs() < 2.0, "fps = {}", clock.fps());
    }

    #[test]
    fn rate_zero_restores_every_tick() {
        let count = Rc::new(RefCell::new(0));
        let mut clock = FrameClock::new();
        let c = Rc::clone(&count);
        let id = clock.register(move |_| *c.borrow_mut() += 1);
        assert!(clock.set_rate(id, 2.0));
        assert!(clock.set_rate(id, 0.0));
        let _ = clock.tick_with(0.016);
        let _ = clock.tick_with(0.032);
        assert_eq!(*count.borrow(), 2);
    }
}

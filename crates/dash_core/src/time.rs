use std::time::Instant;

/// Length of one virtual simulation frame. Every timer in the game advances by
/// this amount per tick, independent of how long the host frame really took.
pub const FRAME_TIME_MS: u32 = 16;

/// Fixed-step scheduler for hosts that run against the wall clock.
///
/// The host calls `begin_frame()` once per presented frame and then drains
/// `should_step()`; each `true` is one call to the simulation tick. Headless
/// hosts skip the wall clock entirely and use `step_once()`.
pub struct FrameClock {
    pub fixed_dt_ms: u32,
    pub max_accumulator_ms: f64,
    accumulator_ms: f64,
    pub total_time_ms: u64,
    pub fixed_step_count: u64,
    pub frame_count: u64,
    pub steps_this_frame: u32,
    pub real_dt_ms: f64,
    last_instant: Instant,
}

impl FrameClock {
    pub fn new(fixed_dt_ms: u32) -> Self {
        Self {
            fixed_dt_ms: fixed_dt_ms.max(1),
            max_accumulator_ms: 250.0,
            accumulator_ms: 0.0,
            total_time_ms: 0,
            fixed_step_count: 0,
            frame_count: 0,
            steps_this_frame: 0,
            real_dt_ms: 0.0,
            last_instant: Instant::now(),
        }
    }

    pub fn begin_frame(&mut self) {
        let now = Instant::now();
        let real_dt_ms = now.duration_since(self.last_instant).as_secs_f64() * 1000.0;
        self.last_instant = now;
        self.feed(real_dt_ms);
    }

    /// Account for `real_dt_ms` of elapsed host time.
    pub fn feed(&mut self, real_dt_ms: f64) {
        self.real_dt_ms = real_dt_ms.max(0.0);

        // Spiral-of-death cap
        if self.real_dt_ms > self.max_accumulator_ms {
            log::warn!(
                "Frame took {:.1}ms, capping accumulator to {}ms",
                self.real_dt_ms,
                self.max_accumulator_ms
            );
            self.real_dt_ms = self.max_accumulator_ms;
        }

        self.accumulator_ms += self.real_dt_ms;
        self.steps_this_frame = 0;
        self.frame_count += 1;
    }

    pub fn should_step(&mut self) -> bool {
        let dt = self.fixed_dt_ms as f64;
        if self.accumulator_ms >= dt {
            self.accumulator_ms -= dt;
            self.record_step();
            true
        } else {
            false
        }
    }

    /// Advance one fixed step without consulting the wall clock.
    pub fn step_once(&mut self) {
        self.frame_count += 1;
        self.steps_this_frame = 0;
        self.record_step();
    }

    pub fn pending_ms(&self) -> f64 {
        self.accumulator_ms
    }

    fn record_step(&mut self) {
        self.total_time_ms += self.fixed_dt_ms as u64;
        self.fixed_step_count += 1;
        self.steps_this_frame += 1;
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(FRAME_TIME_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_produces_whole_steps_and_keeps_remainder() {
        let mut clock = FrameClock::new(16);
        clock.feed(40.0);
        let mut steps = 0;
        while clock.should_step() {
            steps += 1;
        }
        assert_eq!(steps, 2);
        assert_eq!(clock.steps_this_frame, 2);
        assert!((clock.pending_ms() - 8.0).abs() < 1e-9);
        assert_eq!(clock.total_time_ms, 32);
    }

    #[test]
    fn remainder_carries_into_next_frame() {
        let mut clock = FrameClock::new(16);
        clock.feed(10.0);
        assert!(!clock.should_step());
        clock.feed(10.0);
        assert!(clock.should_step());
        assert!(!clock.should_step());
        assert_eq!(clock.fixed_step_count, 1);
    }

    #[test]
    fn long_frames_are_capped() {
        let mut clock = FrameClock::new(16);
        clock.feed(10_000.0);
        assert!((clock.real_dt_ms - 250.0).abs() < 1e-9);
        let mut steps = 0;
        while clock.should_step() {
            steps += 1;
        }
        assert_eq!(steps, 15);
    }

    #[test]
    fn step_once_ignores_wall_clock() {
        let mut clock = FrameClock::default();
        clock.step_once();
        clock.step_once();
        assert_eq!(clock.fixed_step_count, 2);
        assert_eq!(clock.total_time_ms, 2 * FRAME_TIME_MS as u64);
        assert_eq!(clock.pending_ms(), 0.0);
    }

    #[test]
    fn zero_step_length_is_clamped() {
        let clock = FrameClock::new(0);
        assert_eq!(clock.fixed_dt_ms, 1);
    }
}

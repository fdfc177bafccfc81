//! Delta-time bookkeeping, exposed to systems as a `Uniq<Time>`/`UniqMut<Time>` resource
//! rather than threaded through update closures by hand.
//!
//! Grounded on the engine's original `Duration`-based accumulator (its `delta`/
//! `fixed_time`/`accumulator` fields), adapted from a value replaced wholesale every
//! frame into a singleton mutated in place by the [`crate::app::Runner`].

use std::time::{Duration, Instant};

use rusty_macros::Unique;

/// Default fixed timestep: 60 updates per (wall-clock) second.
pub const SIXTY_FPS: u64 = 16_666_666;

/// Frame and fixed-step timing, updated once per tick by the runner.
#[derive(Unique)]
pub struct Time {
    instant: Instant,
    fixed_time_step: u64,
    delta: Duration,
    elapsed: Duration,
    fixed_elapsed: Duration,
    accumulator: u64,
}

impl Time {
    /// Constructs a fresh clock with the given fixed timestep, in nanoseconds.
    pub fn new(fixed_time_step: u64) -> Self {
        Self {
            instant: Instant::now(),
            fixed_time_step,
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            fixed_elapsed: Duration::ZERO,
            accumulator: 0,
        }
    }

    /// Time elapsed since the previous tick.
    #[inline]
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Total wall-clock time elapsed since the clock was created.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Total simulated time consumed via [`consume_fixed_step`](Self::consume_fixed_step).
    #[inline]
    pub fn fixed_elapsed(&self) -> Duration {
        self.fixed_elapsed
    }

    /// The configured fixed timestep.
    #[inline]
    pub fn fixed_time_step(&self) -> Duration {
        Duration::from_nanos(self.fixed_time_step)
    }

    /// Folds the wall time since the last call into `delta`/`elapsed` and the fixed-step
    /// accumulator. Called once per tick by the runner.
    pub fn tick(&mut self) {
        let elapsed = self.instant.elapsed();
        self.instant = Instant::now();
        self.delta = elapsed;
        self.elapsed += elapsed;
        self.accumulator += elapsed.as_nanos() as u64;
    }

    /// Whether at least one fixed step's worth of time has accumulated. A system or
    /// run condition wanting fixed-step semantics (e.g. "once per second") polls this,
    /// or simply compares [`elapsed`](Self::elapsed) against its own threshold.
    #[inline]
    pub fn has_fixed_step(&self) -> bool {
        self.accumulator >= self.fixed_time_step
    }

    /// Consumes one fixed step's worth of accumulated time.
    pub fn consume_fixed_step(&mut self) {
        self.fixed_elapsed += Duration::from_nanos(self.fixed_time_step);
        self.accumulator -= self.fixed_time_step;
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new(SIXTY_FPS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_uses_sixty_fps_step() {
        let time = Time::default();
        assert_eq!(time.fixed_time_step(), Duration::from_nanos(SIXTY_FPS));
    }

    #[test]
    fn consume_fixed_step_drains_accumulator() {
        let mut time = Time::new(1_000_000);
        time.accumulator = 2_500_000;

        assert!(time.has_fixed_step());
        time.consume_fixed_step();
        assert_eq!(time.fixed_elapsed(), Duration::from_nanos(1_000_000));
        assert!(time.has_fixed_step());
        time.consume_fixed_step();
        assert!(!time.has_fixed_step());
    }
}

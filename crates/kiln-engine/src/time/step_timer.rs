use std::time::{Duration, Instant};

/// Deltas within this window of the target are snapped to the target in
/// fixed-step mode, so a vsync'd 59.94 Hz display still steps at 60 Hz.
const SNAP_EPSILON: Duration = Duration::from_micros(250);

const ONE_SECOND: Duration = Duration::from_secs(1);

/// Step lengths are whole 100 ns ticks (10 MHz). A delta of N times the
/// requested step always covers N quantized steps.
const TICK: Duration = Duration::from_nanos(100);

fn quantize(step: Duration) -> Duration {
    let ticks = u32::try_from(step.as_nanos() / TICK.as_nanos()).unwrap_or(u32::MAX);
    TICK * ticks.max(1)
}

/// Timer configuration.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TimerConfig {
    /// Step length used in fixed-timestep mode.
    pub target_elapsed: Duration,
    /// Start in fixed-timestep mode.
    pub fixed_time_step: bool,
    /// Upper bound on a single frame delta (debugger pauses, minimized windows).
    pub max_delta: Duration,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            target_elapsed: Duration::from_secs_f64(1.0 / 60.0),
            fixed_time_step: false,
            max_delta: Duration::from_millis(100),
        }
    }
}

/// Frame stepping timer.
///
/// In variable mode every `tick` runs the update callback exactly once with the
/// measured (clamped) delta. In fixed mode the measured time accumulates and the
/// callback runs once per whole `target_elapsed` step, which may be zero or
/// several times for a single `tick`.
#[derive(Debug, Clone)]
pub struct StepTimer {
    last: Instant,
    max_delta: Duration,

    elapsed: Duration,
    total: Duration,
    left_over: Duration,

    frame_count: u64,
    frames_per_second: u32,
    frames_this_second: u32,
    second_counter: Duration,

    fixed_time_step: bool,
    target_elapsed: Duration,
}

impl StepTimer {
    pub fn new(config: TimerConfig) -> Self {
        Self::starting_at(Instant::now(), config)
    }

    /// Creates a timer whose baseline is `start`. Used with [`tick_at`](Self::tick_at).
    pub fn starting_at(start: Instant, config: TimerConfig) -> Self {
        debug_assert!(config.target_elapsed > Duration::ZERO);
        Self {
            last: start,
            max_delta: config.max_delta,
            elapsed: Duration::ZERO,
            total: Duration::ZERO,
            left_over: Duration::ZERO,
            frame_count: 0,
            frames_per_second: 0,
            frames_this_second: 0,
            second_counter: Duration::ZERO,
            fixed_time_step: config.fixed_time_step,
            target_elapsed: quantize(config.target_elapsed),
        }
    }

    /// Seconds covered by the most recent update step.
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Seconds accumulated over all update steps.
    pub fn total_seconds(&self) -> f64 {
        self.total.as_secs_f64()
    }

    /// Number of update steps taken since creation.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Frames counted over the last full second.
    pub fn frames_per_second(&self) -> u32 {
        self.frames_per_second
    }

    pub fn is_fixed_time_step(&self) -> bool {
        self.fixed_time_step
    }

    pub fn set_fixed_time_step(&mut self, fixed: bool) {
        if self.fixed_time_step != fixed {
            log::debug!("step timer: fixed time step {}", if fixed { "on" } else { "off" });
        }
        self.fixed_time_step = fixed;
    }

    pub fn target_elapsed_seconds(&self) -> f64 {
        self.target_elapsed.as_secs_f64()
    }

    /// Sets the fixed step length. Non-positive or non-finite values are ignored.
    pub fn set_target_elapsed_seconds(&mut self, seconds: f64) {
        if seconds.is_finite() && seconds > 0.0 {
            self.target_elapsed = quantize(Duration::from_secs_f64(seconds));
        }
    }

    /// Discards accumulated time. Call after an intentional stall (asset
    /// reload, device restore) so fixed mode does not try to catch up.
    pub fn reset_elapsed_time(&mut self) {
        self.reset_elapsed_time_at(Instant::now());
    }

    pub fn reset_elapsed_time_at(&mut self, now: Instant) {
        self.last = now;
        self.left_over = Duration::ZERO;
        self.frames_per_second = 0;
        self.frames_this_second = 0;
        self.second_counter = Duration::ZERO;
    }

    /// Advances the timer and runs `update` once per logical step.
    pub fn tick<F>(&mut self, update: F)
    where
        F: FnMut(&StepTimer),
    {
        self.tick_at(Instant::now(), update);
    }

    /// Like [`tick`](Self::tick) with an explicit timestamp.
    pub fn tick_at<F>(&mut self, now: Instant, mut update: F)
    where
        F: FnMut(&StepTimer),
    {
        let mut delta = now.saturating_duration_since(self.last);
        self.last = now;
        self.second_counter += delta;

        if delta > self.max_delta {
            delta = self.max_delta;
        }

        let last_frame_count = self.frame_count;

        if self.fixed_time_step {
            let target = self.target_elapsed;
            if abs_diff(delta, target) < SNAP_EPSILON {
                delta = target;
            }

            self.left_over += delta;

            while self.left_over >= target {
                self.elapsed = target;
                self.total += target;
                self.left_over -= target;
                self.frame_count = self.frame_count.wrapping_add(1);

                update(self);
            }
        } else {
            self.elapsed = delta;
            self.total += delta;
            self.left_over = Duration::ZERO;
            self.frame_count = self.frame_count.wrapping_add(1);

            update(self);
        }

        if self.frame_count != last_frame_count {
            self.frames_this_second += 1;
        }

        if self.second_counter >= ONE_SECOND {
            self.frames_per_second = self.frames_this_second;
            self.frames_this_second = 0;
            self.second_counter = Duration::from_nanos(
                (self.second_counter.as_nanos() % ONE_SECOND.as_nanos()) as u64,
            );
        }
    }
}

impl Default for StepTimer {
    fn default() -> Self {
        Self::new(TimerConfig::default())
    }
}

fn abs_diff(a: Duration, b: Duration) -> Duration {
    if a > b { a - b } else { b - a }
}

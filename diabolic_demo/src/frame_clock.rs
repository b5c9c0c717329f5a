/// Frame clock - delta time between frames and a once-per-second frame rate

use std::time::{Duration, Instant};

/// Delta time between two ticks, clamped
///
/// The minimum keeps the rotation moving when ticks come back to back; the
/// maximum keeps a debugger pause or a drag-resize from spinning the cube.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    dt_min: Duration,
    dt_max: Duration,

    /// Frames and time since the last frame-rate report
    window_frames: u32,
    window_time: Duration,
}

/// Frames per second over the last reporting window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRate {
    pub frames_per_second: f32,
    pub milliseconds_per_frame: f32,
}

const REPORT_INTERVAL: Duration = Duration::from_secs(1);

impl FrameClock {
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: Instant::now(),
            dt_min,
            dt_max,
            window_frames: 0,
            window_time: Duration::ZERO,
        }
    }

    /// Restart timing from now (after a pause or a long stall)
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    /// Advance the clock; returns the clamped delta time in seconds
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let dt = self.advance(now.saturating_duration_since(self.last));
        self.last = now;
        dt
    }

    fn advance(&mut self, elapsed: Duration) -> f32 {
        let dt = elapsed.clamp(self.dt_min, self.dt_max);
        self.window_frames += 1;
        self.window_time += dt;
        dt.as_secs_f32()
    }

    /// Frame rate since the previous report, once at least a second has passed
    pub fn take_frame_rate(&mut self) -> Option<FrameRate> {
        if self.window_time < REPORT_INTERVAL || self.window_frames == 0 {
            return None;
        }
        let seconds = self.window_time.as_secs_f32();
        let rate = FrameRate {
            frames_per_second: self.window_frames as f32 / seconds,
            milliseconds_per_frame: seconds * 1000.0 / self.window_frames as f32,
        };
        self.window_frames = 0;
        self.window_time = Duration::ZERO;
        Some(rate)
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "frame_clock_tests.rs"]
mod tests;

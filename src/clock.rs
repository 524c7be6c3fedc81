use std::time::{Duration, Instant};

/// Paces the frame loop to a fixed rate and measures the time between frames.
pub struct FrameLimiter {
  frame_duration: Duration,
  max_delta: Duration,
  last_frame: Instant,
}

impl FrameLimiter {
  pub fn new(frames_per_second: u32, now: Instant) -> Self {
    let frame_duration = Duration::from_secs_f64(1.0 / f64::from(frames_per_second.max(1)));
    Self {
      frame_duration,
      // a stalled window (drag, minimize) must not fling the planets forward
      max_delta: frame_duration * 4,
      last_frame: now,
    }
  }

  pub fn frame_duration(&self) -> Duration {
    self.frame_duration
  }

  /// Earliest instant the next frame should run.
  pub fn next_deadline(&self) -> Instant {
    self.last_frame + self.frame_duration
  }

  pub fn is_due(&self, now: Instant) -> bool {
    now >= self.next_deadline()
  }

  /// Starts a frame at `now`; returns the (capped) time since the previous one.
  pub fn tick(&mut self, now: Instant) -> Duration {
    let delta = now.saturating_duration_since(self.last_frame);
    self.last_frame = now;
    delta.min(self.max_delta)
  }
}

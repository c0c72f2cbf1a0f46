// Frame timing

use std::time::Instant;

/// Tracks the time elapsed between consecutive frames.
#[derive(Debug)]
pub struct Clock {
    start: Instant,
    last_frame: f32,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            last_frame: 0.0,
        }
    }

    /// Seconds since the clock was created.
    pub fn now(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }

    /// Advance to the current wall time and return the frame's delta time.
    pub fn tick(&mut self) -> f32 {
        let now = self.now();
        self.advance_to(now)
    }

    /// Advance to `current` seconds and return the delta since the last frame.
    /// Never negative.
    pub fn advance_to(&mut self, current: f32) -> f32 {
        let delta = (current - self.last_frame).max(0.0);
        self.last_frame = self.last_frame.max(current);
        delta
    }

    #[cfg(test)]
    pub fn last_frame(&self) -> f32 {
        self.last_frame
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn delta_is_difference_between_frames() {
        let mut clock = Clock::new();
        assert_relative_eq!(clock.advance_to(0.5), 0.5);
        assert_relative_eq!(clock.advance_to(0.75), 0.25);
        assert_relative_eq!(clock.last_frame(), 0.75);
    }

    #[test]
    fn same_timestamp_gives_zero_delta() {
        let mut clock = Clock::new();
        clock.advance_to(1.0);
        assert_eq!(clock.advance_to(1.0), 0.0);
    }

    #[test]
    fn time_going_backwards_is_ignored() {
        let mut clock = Clock::new();
        clock.advance_to(2.0);
        assert_eq!(clock.advance_to(1.0), 0.0);
        assert_relative_eq!(clock.advance_to(2.5), 0.5);
    }

    #[test]
    fn tick_is_monotonic() {
        let mut clock = Clock::new();
        let first = clock.tick();
        let second = clock.tick();
        assert!(first >= 0.0 && second >= 0.0);
    }
}

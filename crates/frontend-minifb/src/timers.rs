//! Presentation timers.
//!
//! Both timers are polled with the caller's `Instant` so the render loop,
//! the headless runner and tests all drive them the same way. Neither one
//! touches the controller: the blink timer only yields a phase and the
//! pulse timer only says when to drop EN.

use std::time::{Duration, Instant};

pub const DEFAULT_BLINK: Duration = Duration::from_millis(500);
pub const DEFAULT_PULSE: Duration = Duration::from_millis(200);

/// Square wave for the blinking-block cursor.
pub struct BlinkTimer {
    interval: Duration,
    last_flip: Instant,
    visible: bool,
}

impl BlinkTimer {
    pub fn new(interval: Duration, now: Instant) -> Self {
        BlinkTimer { interval: interval.max(Duration::from_millis(1)), last_flip: now, visible: true }
    }

    /// Current phase after catching up to `now`.
    pub fn tick(&mut self, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_flip);
        let flips = elapsed.as_nanos() / self.interval.as_nanos();
        if flips > 0 {
            if flips % 2 == 1 {
                self.visible = !self.visible;
            }
            // a gap too long to step over restarts the phase clock at `now`
            match u32::try_from(flips) {
                Ok(n) => self.last_flip += self.interval * n,
                Err(_) => self.last_flip = now,
            }
        }
        self.visible
    }

    /// Restart with the cursor shown, e.g. after it moved.
    pub fn reset(&mut self, now: Instant) {
        self.last_flip = now;
        self.visible = true;
    }
}

/// One-shot delay between raising EN and dropping it again.
pub struct PulseTimer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl PulseTimer {
    pub fn new(delay: Duration) -> Self {
        PulseTimer { delay, deadline: None }
    }

    /// Arm (or re-arm) the release.
    pub fn start(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// True exactly once when the deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

use serde::{Deserialize, Serialize};

/// A timer counting down to zero, advanced once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Countdown {
    pub remaining: f32,
}

impl Countdown {
    pub fn new(duration: f32) -> Self {
        Self {
            remaining: duration.max(0.0),
        }
    }

    /// An already-expired countdown.
    pub fn expired() -> Self {
        Self { remaining: 0.0 }
    }

    /// Advance by `dt`. Returns true on the tick the countdown reaches zero.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.remaining <= 0.0 {
            return false;
        }
        self.remaining = (self.remaining - dt).max(0.0);
        self.remaining <= 0.0
    }

    pub fn is_expired(&self) -> bool {
        self.remaining <= 0.0
    }
}

/// A recharge timer: usable once `elapsed` has recovered to `length`.
///
/// Recovery is linear in elapsed time and capped at `length`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cooldown {
    pub length: f32,
    pub elapsed: f32,
}

impl Cooldown {
    /// A cooldown that starts fully recovered.
    pub fn ready(length: f32) -> Self {
        Self {
            length,
            elapsed: length,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.elapsed >= self.length
    }

    /// Start a new cooldown window.
    pub fn trigger(&mut self) {
        self.elapsed = 0.0;
    }

    pub fn recover(&mut self, dt: f32) {
        self.elapsed = (self.elapsed + dt).min(self.length);
    }
}

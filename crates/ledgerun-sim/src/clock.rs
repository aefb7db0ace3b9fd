use std::time::{Duration, Instant};

/// Blocking fixed-rate tick clock.
///
/// `wait` sleeps until the next tick deadline. When the loop falls behind,
/// missed deadlines are skipped rather than replayed in a burst.
#[derive(Debug)]
pub struct FrameClock {
    interval: Duration,
    next: Instant,
    realtime: bool,
    skipped: u64,
}

impl FrameClock {
    pub fn new(tick_rate_hz: f32, realtime: bool) -> Self {
        let rate = if tick_rate_hz.is_finite() && tick_rate_hz > 0.0 {
            tick_rate_hz
        } else {
            60.0
        };
        let interval = Duration::from_secs_f32(1.0 / rate);
        Self {
            interval,
            next: Instant::now() + interval,
            realtime,
            skipped: 0,
        }
    }

    /// Fixed simulation step in seconds.
    pub fn dt(&self) -> f32 {
        self.interval.as_secs_f32()
    }

    /// Ticks dropped because the loop ran late.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Block until the next tick is due. Returns immediately when not
    /// running in real time.
    pub fn wait(&mut self) {
        if !self.realtime {
            return;
        }
        let now = Instant::now();
        if now < self.next {
            std::thread::sleep(self.next - now);
            self.next += self.interval;
            return;
        }
        let behind = now.duration_since(self.next);
        let missed = (behind.as_nanos() / self.interval.as_nanos().max(1)) as u32;
        self.skipped += u64::from(missed);
        self.next += self.interval * (missed + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dt_matches_rate() {
        let clock = FrameClock::new(60.0, false);
        assert!((clock.dt() - 1.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn bad_rate_falls_back_to_sixty() {
        let clock = FrameClock::new(0.0, false);
        assert!((clock.dt() - 1.0 / 60.0).abs() < 1e-6);
        let clock = FrameClock::new(f32::NAN, false);
        assert!((clock.dt() - 1.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn non_realtime_never_sleeps() {
        let mut clock = FrameClock::new(1.0, false);
        let start = Instant::now();
        for _ in 0..100 {
            clock.wait();
        }
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn realtime_paces_ticks() {
        let mut clock = FrameClock::new(200.0, true);
        let start = Instant::now();
        for _ in 0..4 {
            clock.wait();
        }
        assert!(start.elapsed() >= Duration::from_millis(15));
    }

    #[test]
    fn late_loop_skips_missed_ticks() {
        let mut clock = FrameClock::new(1000.0, true);
        std::thread::sleep(Duration::from_millis(20));
        clock.wait();
        assert!(clock.skipped() >= 5, "skipped {}", clock.skipped());
    }
}

use std::thread;
use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous delivery, in seconds.
    pub dt: f32,

    /// Monotonic timestamp taken once pacing finished.
    pub now: Instant,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Enforces a minimum wall-clock interval between frame deliveries.
///
/// Waiting is hybrid: `thread::sleep` covers the bulk of the remaining time and
/// a spin loop covers the final `spin_window`, absorbing the scheduler's sleep
/// granularity without burning a core for the whole interval.
#[derive(Debug, Clone)]
pub struct FramePacer {
    last: Instant,
    frame_index: u64,
    spin_window: Duration,
}

impl FramePacer {
    /// Creates a pacer whose baseline is "now", with a 2 ms spin window.
    pub fn new() -> Self {
        Self::with_spin_window(Duration::from_millis(2))
    }

    pub fn with_spin_window(spin_window: Duration) -> Self {
        Self {
            last: Instant::now(),
            frame_index: 0,
            spin_window,
        }
    }

    /// Resets the baseline to now.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    /// Blocks until at least `wait` has elapsed since the previous call, then
    /// records the new baseline.
    ///
    /// A zero `wait`, or a deadline already in the past, returns immediately.
    /// A `wait` too large to be represented as an instant blocks indefinitely.
    pub fn pace(&mut self, wait: Duration) -> FrameTime {
        let deadline = self.deadline(wait);

        loop {
            let remaining = match deadline {
                Some(d) => match d.checked_duration_since(Instant::now()) {
                    Some(r) if !r.is_zero() => r,
                    _ => break,
                },
                None => Duration::MAX,
            };
            if remaining > self.spin_window {
                thread::sleep(remaining - self.spin_window);
            } else {
                std::hint::spin_loop();
            }
        }

        let now = Instant::now();
        let dt = now.saturating_duration_since(self.last);
        self.last = now;

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            now,
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);

        ft
    }

    /// `None` when `wait` reaches past the representable range of `Instant`.
    fn deadline(&self, wait: Duration) -> Option<Instant> {
        self.last.checked_add(wait)
    }
}

impl Default for FramePacer {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts a frame rate into the wait passed to [`FramePacer::pace`].
///
/// Non-positive or non-finite rates mean "no pacing"; rates so small that the
/// period overflows saturate to [`Duration::MAX`].
pub fn wait_for_fps(fps: f32) -> Duration {
    if fps.is_finite() && fps > 0.0 {
        Duration::try_from_secs_f32(1.0 / fps).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_wait_does_not_block() {
        let mut pacer = FramePacer::new();
        let start = Instant::now();
        for _ in 0..100 {
            pacer.pace(Duration::ZERO);
        }
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn average_interval_never_undershoots() {
        let target = Duration::from_millis(2);
        let mut pacer = FramePacer::new();
        pacer.pace(Duration::ZERO);

        let start = Instant::now();
        let n = 100;
        for _ in 0..n {
            pacer.pace(target);
        }
        let avg = start.elapsed() / n;
        assert!(avg >= target, "average {avg:?} below target {target:?}");
        assert!(avg < target * 4, "average {avg:?} far above target");
    }

    #[test]
    fn late_caller_is_not_penalised() {
        let mut pacer = FramePacer::new();
        thread::sleep(Duration::from_millis(5));
        let start = Instant::now();
        pacer.pace(Duration::from_millis(1));
        assert!(start.elapsed() < Duration::from_millis(1));
    }

    #[test]
    fn frame_index_advances() {
        let mut pacer = FramePacer::new();
        assert_eq!(pacer.pace(Duration::ZERO).frame_index, 0);
        assert_eq!(pacer.pace(Duration::ZERO).frame_index, 1);
    }

    #[test]
    fn fps_conversion() {
        assert_eq!(wait_for_fps(0.0), Duration::ZERO);
        assert_eq!(wait_for_fps(f32::NAN), Duration::ZERO);
        let w = wait_for_fps(50.0);
        assert!((w.as_secs_f32() - 0.02).abs() < 1e-6);
    }

    #[test]
    fn tiny_fps_saturates() {
        assert_eq!(wait_for_fps(1.0e-30), Duration::MAX);
        assert_eq!(wait_for_fps(f32::MIN_POSITIVE / 4.0), Duration::MAX);
    }

    #[test]
    fn unrepresentable_deadline_does_not_overflow() {
        let pacer = FramePacer::new();
        assert_eq!(pacer.deadline(Duration::MAX), None);
        assert!(pacer.deadline(Duration::from_millis(5)).is_some());
    }
}

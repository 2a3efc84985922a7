use std::time::Instant;

const FPS_SAMPLE_COUNT: usize = 60;

/// Per-frame clock. `ticks_ms()` is the monotonic millisecond counter the
/// match engine runs on; the rest feeds the debug overlay.
pub struct FrameClock {
    start: Instant,
    last_instant: Instant,
    pub frame_count: u64,
    pub real_dt: f64,

    fps_samples: [f64; FPS_SAMPLE_COUNT],
    fps_sample_index: usize,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_instant: now,
            frame_count: 0,
            real_dt: 0.0,
            fps_samples: [1.0 / 60.0; FPS_SAMPLE_COUNT],
            fps_sample_index: 0,
            smoothed_fps: 60.0,
            smoothed_frame_time_ms: 16.667,
        }
    }

    pub fn begin_frame(&mut self) {
        let now = Instant::now();
        self.real_dt = now.duration_since(self.last_instant).as_secs_f64();
        self.last_instant = now;
        self.frame_count += 1;

        self.fps_samples[self.fps_sample_index] = self.real_dt;
        self.fps_sample_index = (self.fps_sample_index + 1) % FPS_SAMPLE_COUNT;
        let avg_dt: f64 = self.fps_samples.iter().sum::<f64>() / FPS_SAMPLE_COUNT as f64;
        self.smoothed_frame_time_ms = avg_dt * 1000.0;
        self.smoothed_fps = if avg_dt > 0.0 { 1.0 / avg_dt } else { 0.0 };
    }

    /// Milliseconds since the clock was created. Never decreases.
    pub fn ticks_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn ticks_are_monotonic() {
        let clock = FrameClock::new();
        let a = clock.ticks_ms();
        std::thread::sleep(Duration::from_millis(5));
        let b = clock.ticks_ms();
        assert!(b >= a + 5, "a={a} b={b}");
    }

    #[test]
    fn begin_frame_counts_frames_and_smooths() {
        let mut clock = FrameClock::new();
        for _ in 0..3 {
            std::thread::sleep(Duration::from_millis(2));
            clock.begin_frame();
        }
        assert_eq!(clock.frame_count, 3);
        assert!(clock.real_dt > 0.0);
        assert!(clock.smoothed_fps > 0.0);
        assert!(clock.smoothed_frame_time_ms > 0.0);
    }
}

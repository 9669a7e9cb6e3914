use std::fmt;

use log::debug;

/// Frame-rate counter published once per window.
#[derive(Debug, Clone)]
pub struct FrameStats {
    window_secs: f64,
    accumulated: f64,
    frames: u32,
    fps: f32,
    frame_ms: f32,
}

/// Snapshot produced when a window closes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsSample {
    pub fps: f32,
    pub frame_ms: f32,
}

impl fmt::Display for StatsSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0} FPS ({:.1} ms)", self.fps, self.frame_ms)
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl FrameStats {
    pub fn new(window_secs: f64) -> Self {
        Self {
            window_secs: window_secs.max(f64::EPSILON),
            accumulated: 0.0,
            frames: 0,
            fps: 0.0,
            frame_ms: 0.0,
        }
    }

    /// Records one frame. Returns a sample when the window rolls over.
    pub fn update(&mut self, delta_secs: f64) -> Option<StatsSample> {
        self.accumulated += delta_secs.max(0.0);
        self.frames += 1;
        if self.accumulated < self.window_secs {
            return None;
        }
        self.fps = (self.frames as f64 / self.accumulated) as f32;
        self.frame_ms = (self.accumulated * 1000.0 / self.frames as f64) as f32;
        self.accumulated = 0.0;
        self.frames = 0;
        let sample = self.latest();
        debug!("stats: {sample}");
        Some(sample)
    }

    pub fn latest(&self) -> StatsSample {
        StatsSample {
            fps: self.fps,
            frame_ms: self.frame_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publishes_once_per_window() {
        let mut stats = FrameStats::new(1.0);
        let mut samples = Vec::new();
        for _ in 0..128 {
            if let Some(sample) = stats.update(1.0 / 64.0) {
                samples.push(sample);
            }
        }
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].fps, 64.0);
        assert_eq!(samples[0].frame_ms, 15.625);
    }

    #[test]
    fn display_is_compact() {
        let sample = StatsSample {
            fps: 59.6,
            frame_ms: 16.78,
        };
        assert_eq!(sample.to_string(), "60 FPS (16.8 ms)");
    }
}

/// Source of monotonic seconds since an arbitrary origin.
pub trait TimeSource {
    fn now_secs(&self) -> f64;
}

#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy)]
pub struct SystemTime {
    origin: std::time::Instant,
}

#[cfg(not(target_arch = "wasm32"))]
impl Default for SystemTime {
    fn default() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl TimeSource for SystemTime {
    fn now_secs(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Browser clock backed by `performance.now()`.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone)]
pub struct SystemTime {
    performance: Option<web_sys::Performance>,
}

#[cfg(target_arch = "wasm32")]
impl Default for SystemTime {
    fn default() -> Self {
        Self {
            performance: web_sys::window().and_then(|window| window.performance()),
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl TimeSource for SystemTime {
    fn now_secs(&self) -> f64 {
        self.performance
            .as_ref()
            .map(|performance| performance.now() / 1000.0)
            .unwrap_or(0.0)
    }
}

/// Tracks elapsed time since start and the delta between ticks.
pub struct FrameClock {
    source: Box<dyn TimeSource>,
    start: f64,
    last_elapsed: f64,
}

impl FrameClock {
    pub fn new(source: Box<dyn TimeSource>) -> Self {
        let start = source.now_secs();
        Self {
            source,
            start,
            last_elapsed: 0.0,
        }
    }

    pub fn system() -> Self {
        Self::new(Box::<SystemTime>::default())
    }

    /// Seconds since the clock was created.
    pub fn elapsed(&self) -> f64 {
        (self.source.now_secs() - self.start).max(0.0)
    }

    /// Reads the elapsed time, stores it and returns `(elapsed, delta)`.
    pub fn tick(&mut self) -> (f64, f64) {
        let elapsed = self.elapsed().max(self.last_elapsed);
        let delta = elapsed - self.last_elapsed;
        self.last_elapsed = elapsed;
        (elapsed, delta)
    }

    pub fn last_elapsed(&self) -> f64 {
        self.last_elapsed
    }
}

/// Manually advanced time source for deterministic runs.
#[derive(Debug, Clone, Default)]
pub struct ManualTime {
    now: std::rc::Rc<std::cell::Cell<f64>>,
}

impl ManualTime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, secs: f64) {
        self.now.set(self.now.get() + secs);
    }
}

impl TimeSource for ManualTime {
    fn now_secs(&self) -> f64 {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_is_measured_against_previous_tick() {
        let time = ManualTime::new();
        let mut clock = FrameClock::new(Box::new(time.clone()));

        time.advance(0.25);
        let (elapsed, delta) = clock.tick();
        assert_eq!(elapsed, 0.25);
        assert_eq!(delta, 0.25);

        time.advance(0.5);
        let (elapsed, delta) = clock.tick();
        assert_eq!(elapsed, 0.75);
        assert_eq!(delta, 0.5);
    }

    #[test]
    fn stalled_source_yields_zero_delta() {
        let time = ManualTime::new();
        let mut clock = FrameClock::new(Box::new(time.clone()));
        time.advance(1.0);
        clock.tick();
        let (_, delta) = clock.tick();
        assert_eq!(delta, 0.0);
        assert_eq!(clock.last_elapsed(), 1.0);
    }
}

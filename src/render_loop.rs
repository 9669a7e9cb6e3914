//! Per-frame scene update.
//!
//! The host drives the loop: it calls [`RenderLoop::tick`] once per display
//! refresh and schedules the next refresh when the tick succeeds. A failed
//! tick halts the loop for good.

use anyhow::{anyhow, Result};

use crate::app::{AppState, SceneState};
use crate::camera::PerspectiveCamera;
use crate::clock::FrameClock;
use crate::params::scene_constants::WATER_TIME_STEP;
use crate::stats::StatsSample;

/// Draws one frame of the scene.
pub trait SceneRenderer {
    fn render(&mut self, scene: &SceneState, camera: &PerspectiveCamera) -> Result<()>;

    /// Called after the host resized the drawable, with the size in
    /// physical pixels.
    fn resize(&mut self, _width: u32, _height: u32) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Halted,
}

/// What the host should do after a successful tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    NextFrame,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub elapsed: f64,
    pub delta: f64,
    pub water_time: f64,
    pub camera_moved: bool,
    /// Set when the stats window rolled over on this frame.
    pub stats: Option<StatsSample>,
    pub schedule: Schedule,
}

pub struct RenderLoop {
    clock: FrameClock,
    state: LoopState,
    frames: u64,
}

impl RenderLoop {
    pub fn new(clock: FrameClock) -> Self {
        Self {
            clock,
            state: LoopState::Idle,
            frames: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Completed iterations.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// Runs one iteration. The first call moves the loop from `Idle` to
    /// `Running`; an error from any step moves it to `Halted`, after which
    /// every call fails.
    pub fn tick(
        &mut self,
        app: &mut AppState,
        renderer: &mut dyn SceneRenderer,
    ) -> Result<FrameReport> {
        match self.state {
            LoopState::Halted => return Err(anyhow!("render loop is halted")),
            LoopState::Idle => self.state = LoopState::Running,
            LoopState::Running => {}
        }

        let (elapsed, delta) = self.clock.tick();
        app.scene.water.time += WATER_TIME_STEP;
        let camera_moved = app.controls.update(&mut app.camera);
        let stats = app.stats.as_mut().and_then(|stats| stats.update(delta));

        if let Err(err) = renderer.render(&app.scene, &app.camera) {
            self.state = LoopState::Halted;
            return Err(err.context(format!("frame {} failed", self.frames + 1)));
        }
        self.frames += 1;

        Ok(FrameReport {
            elapsed,
            delta,
            water_time: app.scene.water.time,
            camera_moved,
            stats,
            schedule: Schedule::NextFrame,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Viewport;
    use crate::clock::ManualTime;
    use crate::environment::NullBaker;
    use crate::render::HeadlessRenderer;
    use crate::scene::ScenePreset;

    #[derive(Default)]
    struct RecordingRenderer {
        times: Vec<f64>,
        fail_on: Option<usize>,
    }

    impl SceneRenderer for RecordingRenderer {
        fn render(&mut self, scene: &SceneState, _camera: &PerspectiveCamera) -> Result<()> {
            if self.fail_on == Some(self.times.len()) {
                return Err(anyhow!("device lost"));
            }
            self.times.push(scene.water.time);
            Ok(())
        }
    }

    fn setup() -> (AppState, RenderLoop, ManualTime) {
        let time = ManualTime::new();
        let mut app = AppState::new(ScenePreset::ocean(), Viewport::new(1280, 720, 1.0));
        app.start(&mut NullBaker::default()).unwrap();
        let render_loop = RenderLoop::new(FrameClock::new(Box::new(time.clone())));
        (app, render_loop, time)
    }

    #[test]
    fn water_time_advances_by_fixed_step() {
        let (mut app, mut render_loop, time) = setup();
        let mut renderer = RecordingRenderer::default();
        assert_eq!(render_loop.state(), LoopState::Idle);
        for i in 0..120 {
            // Irregular frame pacing must not affect the water.
            time.advance(if i % 3 == 0 { 0.05 } else { 0.001 });
            let report = render_loop.tick(&mut app, &mut renderer).unwrap();
            assert_eq!(report.schedule, Schedule::NextFrame);
        }
        assert_eq!(render_loop.state(), LoopState::Running);
        assert_eq!(render_loop.frames(), 120);
        let expected = 120.0 * WATER_TIME_STEP;
        assert!((app.scene.water.time - expected).abs() < 1e-9);
        assert_eq!(renderer.times.len(), 120);
        assert_eq!(renderer.times[0], WATER_TIME_STEP);
    }

    #[test]
    fn water_time_holds_its_step_over_an_hour() {
        let (mut app, mut render_loop, time) = setup();
        let mut renderer = HeadlessRenderer::new();
        let frames = 60 * 60 * 60;
        for _ in 0..frames {
            time.advance(1.0 / 60.0);
            render_loop.tick(&mut app, &mut renderer).unwrap();
        }
        let expected = frames as f64 * WATER_TIME_STEP;
        assert!((app.scene.water.time - expected).abs() < 1e-6);

        let before = app.scene.water.time;
        render_loop.tick(&mut app, &mut renderer).unwrap();
        assert!((app.scene.water.time - before - WATER_TIME_STEP).abs() < 1e-9);
    }

    #[test]
    fn delta_comes_from_the_clock() {
        let (mut app, mut render_loop, time) = setup();
        let mut renderer = RecordingRenderer::default();
        time.advance(0.25);
        let first = render_loop.tick(&mut app, &mut renderer).unwrap();
        time.advance(0.5);
        let second = render_loop.tick(&mut app, &mut renderer).unwrap();
        assert_eq!(first.delta, 0.25);
        assert_eq!(second.elapsed, 0.75);
        assert_eq!(second.delta, 0.5);
    }

    #[test]
    fn render_error_halts_the_loop() {
        let (mut app, mut render_loop, _time) = setup();
        let mut renderer = RecordingRenderer {
            fail_on: Some(2),
            ..Default::default()
        };
        render_loop.tick(&mut app, &mut renderer).unwrap();
        render_loop.tick(&mut app, &mut renderer).unwrap();
        assert!(render_loop.tick(&mut app, &mut renderer).is_err());
        assert_eq!(render_loop.state(), LoopState::Halted);
        renderer.fail_on = None;
        assert!(render_loop.tick(&mut app, &mut renderer).is_err());
        assert_eq!(render_loop.frames(), 2);
    }

    #[test]
    fn stats_publish_once_per_second() {
        let (mut app, mut render_loop, time) = setup();
        let mut renderer = RecordingRenderer::default();
        let mut samples = Vec::new();
        for _ in 0..128 {
            time.advance(1.0 / 64.0);
            if let Some(sample) = render_loop.tick(&mut app, &mut renderer).unwrap().stats {
                samples.push(sample);
            }
        }
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].fps, 64.0);
    }
}

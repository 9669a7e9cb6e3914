use anyhow::Result;

use crate::app::SceneState;
use crate::camera::PerspectiveCamera;
use crate::render_loop::SceneRenderer;

/// Renderer that draws nothing and records what it was asked to draw.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    frames: u64,
    surface: Option<(u32, u32)>,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Last size passed to [`SceneRenderer::resize`].
    pub fn surface_size(&self) -> Option<(u32, u32)> {
        self.surface
    }
}

impl SceneRenderer for HeadlessRenderer {
    fn render(&mut self, _scene: &SceneState, _camera: &PerspectiveCamera) -> Result<()> {
        self.frames += 1;
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.surface = Some((width, height));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppState;
    use crate::camera::Viewport;
    use crate::clock::{FrameClock, ManualTime};
    use crate::render_loop::RenderLoop;
    use crate::scene::ScenePreset;

    #[test]
    fn counts_frames_and_records_resize() {
        let mut app = AppState::new(ScenePreset::ocean(), Viewport::new(800, 600, 1.0));
        let time = ManualTime::new();
        let mut render_loop = RenderLoop::new(FrameClock::new(Box::new(time.clone())));
        let mut renderer = HeadlessRenderer::new();

        for _ in 0..3 {
            time.advance(1.0 / 60.0);
            render_loop.tick(&mut app, &mut renderer).unwrap();
        }
        assert_eq!(renderer.frames(), 3);

        if let Some((width, height)) = app.resize(400, 300, 3.0) {
            renderer.resize(width, height);
        }
        assert_eq!(renderer.surface_size(), Some((800, 600)));
    }
}

//! Application state shared by the native and web hosts.

use anyhow::Result;
use glam::{Mat4, Vec2, Vec3};
use log::{error, info};

use crate::camera::{apply_resize, PerspectiveCamera, Viewport};
use crate::controls::OrbitControls;
use crate::environment::{Environment, EnvironmentBaker};
use crate::input::{
    key_command, InputEvent, KeyCode, KeyCommand, MouseButton, PointerGesture, PointerState,
};
use crate::obj::{load_model, ModelMesh};
use crate::panel::{ControlPanel, ParameterChanged};
use crate::params::{ParamField, ParamGroup, Parameters, SkyUniforms, WaterUniforms};
use crate::scene::ScenePreset;
use crate::stats::FrameStats;
use crate::texture::NormalMap;

/// Height the hand model is scaled to, in world units.
const MODEL_HEIGHT: f32 = 20.0;

/// Rendering state derived from the parameters.
#[derive(Debug, Default)]
pub struct SceneState {
    pub sky: SkyUniforms,
    pub water: WaterUniforms,
    pub environment: Environment,
    pub model_transform: Option<Mat4>,
}

/// Files the renderer uploads once at start-up.
#[derive(Debug, Clone)]
pub struct SceneAssets {
    pub normals: NormalMap,
    pub model: Option<ModelMesh>,
}

impl SceneAssets {
    /// Loads the preset's assets. Failures are logged and the affected
    /// element is left out of the scene.
    pub fn load(preset: &ScenePreset) -> Self {
        let normals = NormalMap::load_or_procedural(preset.normals_path.as_deref());
        let model = match (&preset.model_path, preset.show_model) {
            (Some(path), true) => match load_model(path) {
                Ok(mesh) => {
                    info!(
                        "loaded model {} ({} vertices, {} triangles)",
                        path.display(),
                        mesh.vertices.len(),
                        mesh.indices.len() / 3
                    );
                    Some(mesh)
                }
                Err(err) => {
                    error!("failed to load model {}: {err}", path.display());
                    None
                }
            },
            _ => None,
        };
        Self { normals, model }
    }

    pub fn procedural() -> Self {
        Self {
            normals: NormalMap::procedural(256),
            model: None,
        }
    }
}

/// Result of a key press for the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Ignored,
    Handled,
    Quit,
}

/// Everything the scene needs between frames.
pub struct AppState {
    pub preset: ScenePreset,
    pub params: Parameters,
    pub scene: SceneState,
    pub camera: PerspectiveCamera,
    pub controls: OrbitControls,
    pub viewport: Viewport,
    pub panel: ControlPanel,
    pub pointer: PointerState,
    pub stats: Option<FrameStats>,
}

impl AppState {
    pub fn new(preset: ScenePreset, viewport: Viewport) -> Self {
        let params = preset.parameters();
        let panel = ControlPanel::seascape();
        let camera = PerspectiveCamera::new(55.0, viewport.aspect(), 1.0, 20_000.0);
        let controls = OrbitControls::seascape();

        let scene = SceneState {
            water: WaterUniforms {
                distortion_scale: params.distortion_scale,
                size: params.tile_size,
                ..WaterUniforms::default()
            },
            ..SceneState::default()
        };
        let stats = preset.show_stats.then(FrameStats::default);

        Self {
            preset,
            params,
            scene,
            camera,
            controls,
            viewport,
            panel,
            pointer: PointerState::new(),
            stats,
        }
    }

    /// Stands the model, if the assets carry one, on the water below the
    /// orbit target so it is centred in view.
    pub fn attach_model(&mut self, assets: &SceneAssets) {
        self.scene.model_transform = assets
            .model
            .as_ref()
            .map(|mesh| mesh.fit_to_height(MODEL_HEIGHT, self.controls.target - Vec3::Y * 10.0));
    }

    /// Positions the sun for the initial parameters and bakes the first
    /// environment map.
    pub fn start(&mut self, baker: &mut dyn EnvironmentBaker) -> Result<()> {
        self.controls.update(&mut self.camera);
        self.update_sun(baker)
    }

    fn update_sun(&mut self, baker: &mut dyn EnvironmentBaker) -> Result<()> {
        let SceneState {
            sky,
            water,
            environment,
            ..
        } = &mut self.scene;
        environment.update_sun(&self.params, sky, water, baker)
    }

    /// Applies one parameter edit. Sky edits move the sun and rebake the
    /// environment; water edits only touch the water uniforms.
    pub fn dispatch(
        &mut self,
        event: ParameterChanged,
        baker: &mut dyn EnvironmentBaker,
    ) -> Result<()> {
        self.params.set(event.field, event.value);
        info!("{} = {:.2}", event.field, event.value);
        match event.field.group() {
            ParamGroup::Sky => self.update_sun(baker)?,
            ParamGroup::Water => match event.field {
                ParamField::DistortionScale => self.scene.water.distortion_scale = event.value,
                ParamField::TileSize => self.scene.water.size = event.value,
                ParamField::Elevation | ParamField::Azimuth => {}
            },
        }
        Ok(())
    }

    /// Feeds raw widget input through the panel. Returns whether an event
    /// was dispatched.
    pub fn set_parameter(
        &mut self,
        field: ParamField,
        raw: f32,
        baker: &mut dyn EnvironmentBaker,
    ) -> Result<bool> {
        match self.panel.input(field, raw) {
            Some(event) => {
                self.dispatch(event, baker)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn handle_key(
        &mut self,
        key: KeyCode,
        shift: bool,
        baker: &mut dyn EnvironmentBaker,
    ) -> Result<KeyOutcome> {
        let Some(command) = key_command(key, shift) else {
            return Ok(KeyOutcome::Ignored);
        };
        match command {
            KeyCommand::FocusNext => self.panel.focus_next(),
            KeyCommand::FocusPrev => self.panel.focus_prev(),
            KeyCommand::Nudge(steps) => {
                if let Some(event) = self.panel.nudge(&self.params, steps) {
                    self.dispatch(event, baker)?;
                }
            }
            KeyCommand::ToggleFolders => self.panel.toggle_all(),
            KeyCommand::PrintPanel => info!("\n{}", self.panel.describe(&self.params)),
            KeyCommand::Quit => return Ok(KeyOutcome::Quit),
        }
        Ok(KeyOutcome::Handled)
    }

    /// Routes one host input event. Only key presses can fail, through the
    /// environment rebake they may trigger.
    pub fn handle_input(
        &mut self,
        event: InputEvent,
        baker: &mut dyn EnvironmentBaker,
    ) -> Result<KeyOutcome> {
        match event {
            InputEvent::Key { key, shift } => return self.handle_key(key, shift, baker),
            InputEvent::PointerDown(button) => self.pointer_pressed(button),
            InputEvent::PointerUp(button) => self.pointer_released(button),
            InputEvent::PointerMoved(position) => self.pointer_moved(position),
            InputEvent::PointerLeft => self.pointer.leave(),
            InputEvent::Wheel(notches) => self.wheel(notches),
        }
        Ok(KeyOutcome::Handled)
    }

    pub fn pointer_pressed(&mut self, button: MouseButton) {
        self.pointer.press(button);
    }

    pub fn pointer_released(&mut self, button: MouseButton) {
        self.pointer.release(button);
    }

    pub fn pointer_moved(&mut self, position: Vec2) {
        let height = self.viewport.height as f32;
        match self.pointer.moved_to(position) {
            Some(PointerGesture::Rotate(delta)) => {
                self.controls.rotate_by_pixels(delta.x, delta.y, height)
            }
            Some(PointerGesture::Pan(delta)) => {
                self.controls
                    .pan_by_pixels(delta.x, delta.y, height, &self.camera)
            }
            None => {}
        }
    }

    /// Positive `notches` zoom in.
    pub fn wheel(&mut self, notches: f32) {
        self.controls.zoom(notches);
    }

    /// Applies a host resize. Returns the new physical surface size, or
    /// `None` when the size was ignored.
    pub fn resize(&mut self, width: u32, height: u32, device_pixel_ratio: f64) -> Option<(u32, u32)> {
        apply_resize(
            &mut self.viewport,
            &mut self.camera,
            width,
            height,
            device_pixel_ratio,
        )
        .then(|| self.viewport.physical_size())
    }

    /// Window title with the focused slider and the latest stats sample.
    pub fn title(&self) -> String {
        let mut title = format!("Seascape ({})", self.preset.name);
        if let Some(focus) = self.panel.focus_summary(&self.params) {
            title.push_str(" | ");
            title.push_str(&focus);
        }
        if let Some(stats) = &self.stats {
            title.push_str(" | ");
            title.push_str(&stats.latest().to_string());
        }
        title
    }
}

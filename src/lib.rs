//! Real-time seascape: an animated ocean under a scattering sky lit by a
//! movable sun, viewed through a damped orbit camera.
//!
//! The crate keeps the per-frame update and the parameter bindings free of
//! GPU types so they can run headless. [`render::Renderer`] is the wgpu
//! implementation of the [`SceneRenderer`] and [`EnvironmentBaker`] seams;
//! the native binary and the wasm entry point only host it.

pub mod app;
pub mod camera;
pub mod clock;
pub mod controls;
pub mod environment;
pub mod error;
pub mod input;
pub mod obj;
pub mod panel;
pub mod params;
pub mod render;
pub mod render_loop;
pub mod scene;
pub mod stats;
pub mod sun;
pub mod texture;
#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use app::{AppState, KeyOutcome, SceneAssets, SceneState};
pub use camera::{PerspectiveCamera, Viewport};
pub use clock::{FrameClock, ManualTime, TimeSource};
pub use controls::OrbitControls;
pub use environment::{Environment, EnvironmentBaker, EnvironmentMap, NullBaker};
pub use error::AssetError;
pub use input::{InputEvent, KeyCode, MouseButton, NamedKey};
pub use panel::{ControlPanel, ParameterChanged};
pub use params::{ParamField, ParamGroup, Parameters, SkyUniforms, WaterUniforms};
pub use render::{HeadlessRenderer, Renderer};
pub use render_loop::{FrameReport, LoopState, RenderLoop, SceneRenderer, Schedule};
pub use scene::{PresetError, ScenePreset};
pub use stats::{FrameStats, StatsSample};

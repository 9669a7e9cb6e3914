use std::any::Any;
use std::env;
use std::fmt;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use glam::Vec2;
use log::{error, info};
use pollster::block_on;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey as WinitNamedKey};
use winit::window::{Window, WindowId};

use seascape::{
    AppState, FrameClock, HeadlessRenderer, InputEvent, KeyCode, KeyOutcome, ManualTime,
    MouseButton, NamedKey, NullBaker, RenderLoop, Renderer, SceneAssets, SceneRenderer,
    ScenePreset, Viewport,
};

const WINDOW_WIDTH: u32 = 1280;
const WINDOW_HEIGHT: u32 = 720;
/// Frames simulated when no window can be opened.
const FALLBACK_FRAMES: u64 = 60;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    let preset = options.preset()?;
    let initial = preset.parameters();
    println!(
        "Preset {} (elevation {:.2}, azimuth {:.2}, distortion {:.2}, size {:.2})",
        preset.name,
        initial.elevation,
        initial.azimuth,
        initial.distortion_scale,
        initial.tile_size
    );

    match options.headless {
        Some(frames) => run_headless(preset, frames),
        None => match run_interactive(preset.clone()) {
            Ok(()) => Ok(()),
            Err(err) if err.downcast_ref::<WindowInitError>().is_some() => {
                eprintln!(
                    "{err}. Falling back to --headless {FALLBACK_FRAMES} (set DISPLAY or install X11 libs to enable rendering)."
                );
                run_headless(preset, FALLBACK_FRAMES)
            }
            Err(err) => Err(err),
        },
    }
}

/// Runs `frames` loop iterations at a steady 60 Hz without a GPU and prints
/// the resulting scene state.
fn run_headless(preset: ScenePreset, frames: u64) -> Result<()> {
    let assets = SceneAssets::load(&preset);
    let mut app = AppState::new(preset, Viewport::new(WINDOW_WIDTH, WINDOW_HEIGHT, 1.0));
    app.attach_model(&assets);

    let mut baker = NullBaker::default();
    app.start(&mut baker)?;

    let time = ManualTime::new();
    let mut render_loop = RenderLoop::new(FrameClock::new(Box::new(time.clone())));
    let mut renderer = HeadlessRenderer::new();
    for _ in 0..frames {
        time.advance(1.0 / 60.0);
        render_loop.tick(&mut app, &mut renderer)?;
    }

    print_final_state(&app, render_loop.frames());
    Ok(())
}

fn print_final_state(app: &AppState, frames: u64) {
    let params = &app.params;
    let sun = app.scene.environment.sun();
    println!("Rendered {frames} frame(s)");
    println!(
        "Parameters: elevation={:.2} azimuth={:.2} distortionScale={:.2} size={:.2}",
        params.elevation, params.azimuth, params.distortion_scale, params.tile_size
    );
    println!("Sun direction: ({:.4}, {:.4}, {:.4})", sun.x, sun.y, sun.z);
    println!("Water time: {:.4}", app.scene.water.time);
    println!(
        "Environment map generation: {}",
        app.scene.environment.generation()
    );
    if let Some(transform) = app.scene.model_transform {
        let origin = transform.w_axis;
        println!(
            "Model origin: ({:.2}, {:.2}, {:.2})",
            origin.x, origin.y, origin.z
        );
    }
}

fn run_interactive(preset: ScenePreset) -> Result<()> {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
    panic::set_hook(default_hook);
    let event_loop = event_loop
        .map_err(|panic| WindowInitError::from_panic("event loop", panic))?
        .map_err(|err| WindowInitError::from_error("event loop", err))?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut host = WindowHost::new(preset);
    event_loop
        .run_app(&mut host)
        .context("event loop terminated abnormally")?;

    if let Some(err) = host.last_error {
        return Err(err);
    }
    if let Some(session) = &host.session {
        print_final_state(&session.app, session.render_loop.frames());
    }
    Ok(())
}

/// Window, renderer and scene, created once the event loop resumes.
struct Session {
    window: Arc<Window>,
    renderer: Renderer,
    app: AppState,
    render_loop: RenderLoop,
}

impl Session {
    fn create(event_loop: &ActiveEventLoop, preset: ScenePreset) -> Result<Self> {
        let attributes = Window::default_attributes()
            .with_title("Seascape")
            .with_inner_size(LogicalSize::new(WINDOW_WIDTH as f64, WINDOW_HEIGHT as f64));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .map_err(|err| WindowInitError::from_error("window", err))?,
        );

        let size = window.inner_size();
        let viewport = Viewport::from_physical(size.width, size.height, window.scale_factor());
        // Same capped pixel ratio as every later resize.
        let (width, height) = viewport.physical_size();

        let assets = SceneAssets::load(&preset);
        let renderer = block_on(Renderer::new(Arc::clone(&window), width, height, &assets))?;

        let mut session = Self {
            window,
            renderer,
            app: AppState::new(preset, viewport),
            render_loop: RenderLoop::new(FrameClock::system()),
        };
        session.app.attach_model(&assets);
        session.app.start(&mut session.renderer)?;
        session.window.set_title(&session.app.title());
        Ok(session)
    }

    fn resize(&mut self) {
        let size = self.window.inner_size();
        let scale = self.window.scale_factor();
        if size.width == 0 || size.height == 0 {
            return;
        }
        let viewport = Viewport::from_physical(size.width, size.height, scale);
        if let Some((width, height)) = self.app.resize(viewport.width, viewport.height, scale) {
            self.renderer.resize(width, height);
        }
    }

    fn redraw(&mut self) -> Result<()> {
        let report = self.render_loop.tick(&mut self.app, &mut self.renderer)?;
        if report.stats.is_some() {
            self.window.set_title(&self.app.title());
        }
        self.window.request_redraw();
        Ok(())
    }

    /// Returns whether the host should exit.
    fn input(&mut self, event: InputEvent) -> Result<bool> {
        let outcome = self.app.handle_input(event, &mut self.renderer)?;
        if outcome == KeyOutcome::Handled && matches!(event, InputEvent::Key { .. }) {
            self.window.set_title(&self.app.title());
        }
        Ok(outcome == KeyOutcome::Quit)
    }
}

struct WindowHost {
    preset: ScenePreset,
    session: Option<Session>,
    shift: bool,
    last_error: Option<anyhow::Error>,
}

impl WindowHost {
    fn new(preset: ScenePreset) -> Self {
        Self {
            preset,
            session: None,
            shift: false,
            last_error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        error!("{err:?}");
        self.last_error = Some(err);
        event_loop.exit();
    }

    fn translate(&mut self, event: &WindowEvent) -> Option<InputEvent> {
        match event {
            WindowEvent::ModifiersChanged(modifiers) => {
                self.shift = modifiers.state().shift_key();
                None
            }
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                map_key(&event.logical_key).map(|key| InputEvent::Key {
                    key,
                    shift: self.shift,
                })
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = map_mouse_button(*button)?;
                Some(match state {
                    ElementState::Pressed => InputEvent::PointerDown(button),
                    ElementState::Released => InputEvent::PointerUp(button),
                })
            }
            WindowEvent::CursorMoved { position, .. } => {
                let scale = self
                    .session
                    .as_ref()
                    .map_or(1.0, |session| session.window.scale_factor());
                let logical = position.to_logical::<f64>(scale);
                Some(InputEvent::PointerMoved(Vec2::new(
                    logical.x as f32,
                    logical.y as f32,
                )))
            }
            WindowEvent::CursorLeft { .. } => Some(InputEvent::PointerLeft),
            WindowEvent::MouseWheel { delta, .. } => {
                let y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y as f64,
                    MouseScrollDelta::PixelDelta(position) => position.y,
                };
                (y != 0.0).then(|| InputEvent::Wheel(y.signum() as f32))
            }
            _ => None,
        }
    }
}

impl ApplicationHandler for WindowHost {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_some() {
            return;
        }
        match Session::create(event_loop, self.preset.clone()) {
            Ok(session) => {
                info!("window ready; press P to print the panel, Esc to quit");
                session.window.request_redraw();
                self.session = Some(session);
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if self
            .session
            .as_ref()
            .map_or(true, |session| session.window.id() != window_id)
        {
            return;
        }

        if let Some(input) = self.translate(&event) {
            let Some(session) = self.session.as_mut() else {
                return;
            };
            match session.input(input) {
                Ok(true) => event_loop.exit(),
                Ok(false) => {}
                Err(err) => self.fail(event_loop, err),
            }
            return;
        }

        let Some(session) = self.session.as_mut() else {
            return;
        };
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => session.resize(),
            WindowEvent::RedrawRequested => {
                if let Err(err) = session.redraw() {
                    self.fail(event_loop, err);
                }
            }
            _ => {}
        }
    }
}

fn map_key(key: &Key) -> Option<KeyCode> {
    match key {
        Key::Named(named) => {
            let named = match named {
                WinitNamedKey::Tab => NamedKey::Tab,
                WinitNamedKey::ArrowUp => NamedKey::Up,
                WinitNamedKey::ArrowDown => NamedKey::Down,
                WinitNamedKey::ArrowLeft => NamedKey::Left,
                WinitNamedKey::ArrowRight => NamedKey::Right,
                WinitNamedKey::PageUp => NamedKey::PageUp,
                WinitNamedKey::PageDown => NamedKey::PageDown,
                WinitNamedKey::Escape => NamedKey::Escape,
                _ => return None,
            };
            Some(KeyCode::Named(named))
        }
        Key::Character(text) => KeyCode::from_name(text.as_str()),
        _ => None,
    }
}

fn map_mouse_button(button: WinitMouseButton) -> Option<MouseButton> {
    match button {
        WinitMouseButton::Left => Some(MouseButton::LEFT),
        WinitMouseButton::Middle => Some(MouseButton::MIDDLE),
        WinitMouseButton::Right => Some(MouseButton::RIGHT),
        _ => None,
    }
}

#[derive(Debug)]
struct WindowInitError {
    message: String,
}

impl WindowInitError {
    fn from_panic(stage: &str, panic: Box<dyn Any + Send>) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {}", panic_message(panic)),
        }
    }

    fn from_error(stage: &str, err: impl fmt::Display) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {err}"),
        }
    }
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WindowInitError {}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "unknown panic".into(),
        },
    }
}

const USAGE: &str = "Usage: seascape [--preset ocean|hand] [--config scene.xml] [--model hand.obj] [--normals water-normals.png] [--headless N]";

#[derive(Debug, Default)]
struct CliOptions {
    preset: Option<String>,
    config: Option<PathBuf>,
    model: Option<PathBuf>,
    normals: Option<PathBuf>,
    headless: Option<u64>,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        Self::from_args(env::args().skip(1))
    }

    fn from_args(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut options = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let mut value = || {
                args.next()
                    .ok_or_else(|| anyhow!("{arg} expects a value. {USAGE}"))
            };
            match arg.as_str() {
                "--preset" => options.preset = Some(value()?),
                "--config" => options.config = Some(PathBuf::from(value()?)),
                "--model" => options.model = Some(PathBuf::from(value()?)),
                "--normals" => options.normals = Some(PathBuf::from(value()?)),
                "--headless" => {
                    let raw = value()?;
                    let frames = raw
                        .parse::<u64>()
                        .map_err(|_| anyhow!("--headless expects a frame count, got {raw:?}"))?;
                    options.headless = Some(frames);
                }
                "--help" | "-h" => return Err(anyhow!("{USAGE}")),
                other => return Err(anyhow!("Unknown argument: {other}. {USAGE}")),
            }
        }
        Ok(options)
    }

    /// Named preset or XML file, then the asset path overrides.
    fn preset(&self) -> Result<ScenePreset> {
        let mut preset = match (&self.preset, &self.config) {
            (Some(_), Some(_)) => {
                return Err(anyhow!(
                    "--preset and --config are exclusive; use <preset> inside the XML instead"
                ))
            }
            (_, Some(path)) => {
                let xml = fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                ScenePreset::from_xml(&xml)
                    .with_context(|| format!("failed to parse {}", path.display()))?
            }
            (Some(name), None) => ScenePreset::by_name(name)?,
            (None, None) => ScenePreset::ocean(),
        };
        if let Some(path) = &self.model {
            preset.model_path = Some(path.clone());
            preset.show_model = true;
        }
        if let Some(path) = &self.normals {
            preset.normals_path = Some(path.clone());
        }
        Ok(preset)
    }
}

#![cfg(target_arch = "wasm32")]

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{anyhow, Result};
use log::{error, info};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{window, HtmlCanvasElement};

use crate::app::{AppState, KeyOutcome, SceneAssets};
use crate::camera::Viewport;
use crate::clock::FrameClock;
use crate::input::wasm::{InputQueue, WasmInputHandler};
use crate::params::ParamField;
use crate::render::Renderer;
use crate::render_loop::{RenderLoop, SceneRenderer};
use crate::scene::ScenePreset;

#[wasm_bindgen(start)]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

/// Seascape running on a canvas element.
#[wasm_bindgen]
pub struct WasmApp {
    inner: Rc<RefCell<WebState>>,
}

#[wasm_bindgen]
impl WasmApp {
    /// Creates the scene on the canvas with id `canvas_id`. `preset` is
    /// `ocean` (default) or `hand`.
    pub async fn create(canvas_id: String, preset: Option<String>) -> Result<WasmApp, JsValue> {
        let preset = match preset.as_deref() {
            Some(name) => ScenePreset::by_name(name).map_err(to_js)?,
            None => ScenePreset::ocean(),
        };
        info!("starting seascape with preset {}", preset.name);

        let window = window().ok_or_else(|| JsValue::from_str("window not available"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("document not available"))?;
        let canvas = document
            .get_element_by_id(&canvas_id)
            .ok_or_else(|| JsValue::from_str("canvas element not found"))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| JsValue::from_str("element is not a canvas"))?;

        let viewport = canvas_viewport(&canvas, window.device_pixel_ratio());
        let (width, height) = viewport.physical_size();
        canvas.set_width(width);
        canvas.set_height(height);

        // No filesystem in the browser: the water uses the generated normals.
        let assets = SceneAssets::procedural();
        let target = wgpu::SurfaceTarget::Canvas(canvas.clone());
        let mut renderer = Renderer::new(target, width, height, &assets)
            .await
            .map_err(to_js)?;

        let mut app = AppState::new(preset, viewport);
        app.attach_model(&assets);
        app.start(&mut renderer).map_err(to_js)?;

        let queue = InputQueue::default();
        let input = WasmInputHandler::attach(&canvas, Rc::clone(&queue)).map_err(to_js)?;

        let state = WebState {
            app,
            renderer,
            render_loop: RenderLoop::new(FrameClock::system()),
            canvas,
            queue,
            _input: input,
            resize_closure: None,
        };
        Ok(Self {
            inner: Rc::new(RefCell::new(state)),
        })
    }

    /// Starts the animation loop and the resize listener.
    pub fn start(&self) -> Result<(), JsValue> {
        watch_resize(Rc::clone(&self.inner)).map_err(to_js)?;
        start_animation_loop(Rc::clone(&self.inner)).map_err(to_js)
    }

    /// Applies a slider edit from an external panel. Returns whether the
    /// value was accepted.
    pub fn set_parameter(&self, name: &str, value: f32) -> Result<bool, JsValue> {
        let field = ParamField::from_label(name)
            .ok_or_else(|| JsValue::from_str(&format!("unknown parameter {name}")))?;
        let mut state = self.inner.borrow_mut();
        let WebState { app, renderer, .. } = &mut *state;
        app.set_parameter(field, value, renderer).map_err(to_js)
    }

    /// Current panel listing.
    pub fn panel(&self) -> String {
        let state = self.inner.borrow();
        state.app.panel.describe(&state.app.params)
    }
}

struct WebState {
    app: AppState,
    renderer: Renderer,
    render_loop: RenderLoop,
    canvas: HtmlCanvasElement,
    queue: InputQueue,
    _input: WasmInputHandler,
    resize_closure: Option<Closure<dyn FnMut()>>,
}

impl WebState {
    /// Drains pending input, then runs one loop iteration. Returns whether
    /// the loop should keep running.
    fn frame(&mut self) -> Result<bool> {
        let events: Vec<_> = self.queue.borrow_mut().drain(..).collect();
        for event in events {
            if self.app.handle_input(event, &mut self.renderer)? == KeyOutcome::Quit {
                info!("quit requested; stopping the animation loop");
                return Ok(false);
            }
        }

        let report = self.render_loop.tick(&mut self.app, &mut self.renderer)?;
        if report.stats.is_some() {
            self.update_title();
        }
        Ok(true)
    }

    fn update_title(&self) {
        if let Some(document) = window().and_then(|window| window.document()) {
            document.set_title(&self.app.title());
        }
    }

    fn resize(&mut self) {
        let dpr = window().map(|window| window.device_pixel_ratio()).unwrap_or(1.0);
        let viewport = canvas_viewport(&self.canvas, dpr);
        if let Some((width, height)) = self.app.resize(viewport.width, viewport.height, dpr) {
            self.canvas.set_width(width);
            self.canvas.set_height(height);
            self.renderer.resize(width, height);
        }
    }
}

fn canvas_viewport(canvas: &HtmlCanvasElement, device_pixel_ratio: f64) -> Viewport {
    let width = canvas.client_width().max(1) as u32;
    let height = canvas.client_height().max(1) as u32;
    Viewport::new(width, height, device_pixel_ratio)
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// Registers a self-rescheduling `requestAnimationFrame` callback. The
/// callback stops rescheduling once a frame fails or quit is requested.
fn start_animation_loop(state: Rc<RefCell<WebState>>) -> Result<()> {
    let callback: FrameCallback = Rc::new(RefCell::new(None));
    let next = Rc::clone(&callback);

    *callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        let keep_running = match state.borrow_mut().frame() {
            Ok(keep_running) => keep_running,
            Err(err) => {
                error!("render loop halted: {err:?}");
                false
            }
        };
        if keep_running {
            if let Err(err) = request_frame(&next) {
                error!("{err}");
            }
        }
    }) as Box<dyn FnMut()>));

    request_frame(&callback)
}

fn request_frame(callback: &FrameCallback) -> Result<()> {
    let window = window().ok_or_else(|| anyhow!("window not available"))?;
    let callback = callback.borrow();
    let closure = callback
        .as_ref()
        .ok_or_else(|| anyhow!("animation callback missing"))?;
    window
        .request_animation_frame(closure.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("requestAnimationFrame failed: {err:?}"))?;
    Ok(())
}

fn watch_resize(state: Rc<RefCell<WebState>>) -> Result<()> {
    let window = window().ok_or_else(|| anyhow!("window not available"))?;
    let state_clone = Rc::clone(&state);
    let closure = Closure::wrap(Box::new(move || {
        state_clone.borrow_mut().resize();
    }) as Box<dyn FnMut()>);
    window
        .add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("failed to listen for resize: {err:?}"))?;
    state.borrow_mut().resize_closure = Some(closure);
    Ok(())
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

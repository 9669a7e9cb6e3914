use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{anyhow, Result};
use glam::Vec2;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{window, Event, EventTarget, HtmlCanvasElement, KeyboardEvent, PointerEvent, WheelEvent};

use super::{InputEvent, KeyCode, MouseButton};

/// Events collected since the last frame.
pub type InputQueue = Rc<RefCell<Vec<InputEvent>>>;

struct Listener {
    target: EventTarget,
    kind: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

/// Translates DOM events into [`InputEvent`]s pushed onto a shared queue.
pub struct WasmInputHandler {
    listeners: Vec<Listener>,
}

impl WasmInputHandler {
    pub fn attach(canvas: &HtmlCanvasElement, queue: InputQueue) -> Result<Self> {
        let window = window().ok_or_else(|| anyhow!("window not available"))?;
        let document = window
            .document()
            .ok_or_else(|| anyhow!("document not available"))?;

        let mut handler = Self {
            listeners: Vec::new(),
        };

        // Keys are captured on the document so the canvas does not need focus.
        handler.listen(&document, "keydown", &queue, |event| {
            let event = event.dyn_ref::<KeyboardEvent>()?;
            let key = map_key(event)?;
            event.prevent_default();
            Some(InputEvent::Key {
                key,
                shift: event.shift_key(),
            })
        })?;
        handler.listen(canvas, "pointerdown", &queue, |event| {
            let event = event.dyn_ref::<PointerEvent>()?;
            MouseButton::from_dom(event.button()).map(InputEvent::PointerDown)
        })?;
        handler.listen(&window, "pointerup", &queue, |event| {
            let event = event.dyn_ref::<PointerEvent>()?;
            MouseButton::from_dom(event.button()).map(InputEvent::PointerUp)
        })?;
        handler.listen(canvas, "pointermove", &queue, |event| {
            let event = event.dyn_ref::<PointerEvent>()?;
            Some(InputEvent::PointerMoved(Vec2::new(
                event.offset_x() as f32,
                event.offset_y() as f32,
            )))
        })?;
        handler.listen(canvas, "pointerleave", &queue, |_| Some(InputEvent::PointerLeft))?;
        handler.listen(canvas, "wheel", &queue, |event| {
            let event = event.dyn_ref::<WheelEvent>()?;
            event.prevent_default();
            let delta = event.delta_y();
            (delta != 0.0).then(|| InputEvent::Wheel(-(delta.signum() as f32)))
        })?;
        handler.listen(canvas, "contextmenu", &queue, |event| {
            event.prevent_default();
            None
        })?;

        Ok(handler)
    }

    fn listen(
        &mut self,
        target: &EventTarget,
        kind: &'static str,
        queue: &InputQueue,
        translate: impl Fn(&Event) -> Option<InputEvent> + 'static,
    ) -> Result<()> {
        let queue = Rc::clone(queue);
        let callback = Closure::wrap(Box::new(move |event: Event| {
            if let Some(input) = translate(&event) {
                queue.borrow_mut().push(input);
            }
        }) as Box<dyn FnMut(Event)>);
        target
            .add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())
            .map_err(|err| anyhow!("failed to listen for {kind}: {err:?}"))?;
        self.listeners.push(Listener {
            target: target.clone(),
            kind,
            callback,
        });
        Ok(())
    }
}

impl Drop for WasmInputHandler {
    fn drop(&mut self) {
        for listener in self.listeners.drain(..) {
            let _ = listener.target.remove_event_listener_with_callback(
                listener.kind,
                listener.callback.as_ref().unchecked_ref(),
            );
        }
    }
}

fn map_key(event: &KeyboardEvent) -> Option<KeyCode> {
    KeyCode::from_name(&event.key())
}

//! Platform-neutral input vocabulary and the mapping from raw keys and
//! pointer motion to scene commands.

use glam::Vec2;
use serde::{Deserialize, Serialize};

#[cfg(target_arch = "wasm32")]
pub mod wasm;

/// Identifier for a keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    Named(NamedKey),
    Character(char),
}

impl KeyCode {
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(key) = parse_named_key(name) {
            return Some(key);
        }
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) if ch.is_ascii_alphanumeric() => {
                Some(Self::Character(ch.to_ascii_uppercase()))
            }
            _ => None,
        }
    }
}

fn parse_named_key(name: &str) -> Option<KeyCode> {
    use NamedKey::*;
    let key = match name {
        "Tab" => Tab,
        "Up" | "ArrowUp" => Up,
        "Down" | "ArrowDown" => Down,
        "Left" | "ArrowLeft" => Left,
        "Right" | "ArrowRight" => Right,
        "PageUp" => PageUp,
        "PageDown" => PageDown,
        "Escape" | "Esc" => Escape,
        _ => return None,
    };
    Some(KeyCode::Named(key))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamedKey {
    Tab,
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    Escape,
}

/// Identifier for a mouse button (left button is zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MouseButton(u8);

impl MouseButton {
    pub const LEFT: Self = Self(0);
    pub const MIDDLE: Self = Self(1);
    pub const RIGHT: Self = Self(2);

    pub fn new(index: u8) -> Self {
        Self(index)
    }

    pub fn index(self) -> u8 {
        self.0
    }

    /// Maps a DOM `MouseEvent.button` value. Back, forward and negative
    /// values have no camera gesture.
    pub fn from_dom(button: i16) -> Option<Self> {
        match button {
            0 => Some(Self::LEFT),
            1 => Some(Self::MIDDLE),
            2 => Some(Self::RIGHT),
            _ => None,
        }
    }
}

/// What a key press asks the application to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    FocusNext,
    FocusPrev,
    /// Move the focused slider by this many steps.
    Nudge(i32),
    ToggleFolders,
    PrintPanel,
    Quit,
}

pub fn key_command(key: KeyCode, shift: bool) -> Option<KeyCommand> {
    use NamedKey::*;
    Some(match key {
        KeyCode::Named(Tab) if shift => KeyCommand::FocusPrev,
        KeyCode::Named(Tab) => KeyCommand::FocusNext,
        KeyCode::Named(Up) | KeyCode::Named(Right) => KeyCommand::Nudge(if shift { 10 } else { 1 }),
        KeyCode::Named(Down) | KeyCode::Named(Left) => {
            KeyCommand::Nudge(if shift { -10 } else { -1 })
        }
        KeyCode::Named(PageUp) => KeyCommand::Nudge(10),
        KeyCode::Named(PageDown) => KeyCommand::Nudge(-10),
        KeyCode::Named(Escape) => KeyCommand::Quit,
        KeyCode::Character('H') => KeyCommand::ToggleFolders,
        KeyCode::Character('P') => KeyCommand::PrintPanel,
        KeyCode::Character(_) => return None,
    })
}

/// Input from either host, already translated into the crate's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Key { key: KeyCode, shift: bool },
    PointerDown(MouseButton),
    PointerUp(MouseButton),
    PointerMoved(Vec2),
    PointerLeft,
    /// Wheel movement in notches; positive zooms in.
    Wheel(f32),
}

/// Camera gesture derived from pointer motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerGesture {
    Rotate(Vec2),
    Pan(Vec2),
}

/// Tracks pressed buttons and the last pointer position.
#[derive(Debug, Default)]
pub struct PointerState {
    pressed: Vec<MouseButton>,
    position: Option<Vec2>,
}

impl PointerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, button: MouseButton) {
        if !self.pressed.contains(&button) {
            self.pressed.push(button);
        }
    }

    pub fn release(&mut self, button: MouseButton) {
        self.pressed.retain(|pressed| *pressed != button);
    }

    pub fn is_pressed(&self, button: MouseButton) -> bool {
        self.pressed.contains(&button)
    }

    /// Records a new pointer position and returns the drag it implies.
    pub fn moved_to(&mut self, position: Vec2) -> Option<PointerGesture> {
        let previous = self.position.replace(position)?;
        let delta = position - previous;
        if delta == Vec2::ZERO {
            return None;
        }
        if self.is_pressed(MouseButton::LEFT) {
            Some(PointerGesture::Rotate(delta))
        } else if self.is_pressed(MouseButton::RIGHT) || self.is_pressed(MouseButton::MIDDLE) {
            Some(PointerGesture::Pan(delta))
        } else {
            None
        }
    }

    pub fn leave(&mut self) {
        self.position = None;
        self.pressed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_and_character_keys() {
        assert_eq!(
            KeyCode::from_name("ArrowUp"),
            Some(KeyCode::Named(NamedKey::Up))
        );
        assert_eq!(KeyCode::from_name("h"), Some(KeyCode::Character('H')));
        assert_eq!(KeyCode::from_name("Shift"), None);
    }

    #[test]
    fn keys_map_to_panel_commands() {
        let tab = KeyCode::Named(NamedKey::Tab);
        assert_eq!(key_command(tab, false), Some(KeyCommand::FocusNext));
        assert_eq!(key_command(tab, true), Some(KeyCommand::FocusPrev));
        assert_eq!(
            key_command(KeyCode::Named(NamedKey::Down), true),
            Some(KeyCommand::Nudge(-10))
        );
        assert_eq!(key_command(KeyCode::Character('Z'), false), None);
    }

    #[test]
    fn dom_buttons_map_to_camera_buttons_only() {
        assert_eq!(MouseButton::from_dom(0), Some(MouseButton::LEFT));
        assert_eq!(MouseButton::from_dom(1), Some(MouseButton::MIDDLE));
        assert_eq!(MouseButton::from_dom(2), Some(MouseButton::RIGHT));
        assert_eq!(MouseButton::from_dom(3), None);
        assert_eq!(MouseButton::from_dom(-1), None);
        assert_eq!(MouseButton::from_dom(256), None);
    }

    #[test]
    fn drag_with_left_button_rotates() {
        let mut pointer = PointerState::new();
        assert_eq!(pointer.moved_to(Vec2::new(10.0, 10.0)), None);
        pointer.press(MouseButton::LEFT);
        assert_eq!(
            pointer.moved_to(Vec2::new(15.0, 8.0)),
            Some(PointerGesture::Rotate(Vec2::new(5.0, -2.0)))
        );
        pointer.release(MouseButton::LEFT);
        pointer.press(MouseButton::RIGHT);
        assert_eq!(
            pointer.moved_to(Vec2::new(16.0, 8.0)),
            Some(PointerGesture::Pan(Vec2::new(1.0, 0.0)))
        );
    }

    #[test]
    fn hover_without_buttons_is_ignored() {
        let mut pointer = PointerState::new();
        pointer.moved_to(Vec2::ZERO);
        assert_eq!(pointer.moved_to(Vec2::ONE), None);
    }
}

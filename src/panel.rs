//! Parameter control panel.
//!
//! The panel is a model of labelled sliders grouped into collapsible
//! folders. Edits never touch scene state directly: they come back as
//! [`ParameterChanged`] events for the application dispatcher.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::params::{ParamField, Parameters};

/// A parameter edit requested through the panel. `value` is already clamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterChanged {
    pub field: ParamField,
    pub value: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Slider {
    pub field: ParamField,
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl Slider {
    /// Slider spanning the field's declared range.
    pub fn for_field(field: ParamField, step: f32) -> Self {
        let range = field.range();
        Self {
            field,
            min: *range.start(),
            max: *range.end(),
            step,
        }
    }

    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    fn snap(&self, value: f32) -> f32 {
        if self.step <= 0.0 {
            return self.clamp(value);
        }
        let steps = ((value - self.min) / self.step).round();
        self.clamp(self.min + steps * self.step)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Folder {
    pub name: String,
    pub open: bool,
    pub sliders: Vec<Slider>,
}

#[derive(Debug, Clone)]
pub struct ControlPanel {
    folders: Vec<Folder>,
    focus: usize,
}

impl ControlPanel {
    pub fn new(folders: Vec<Folder>) -> Self {
        Self { folders, focus: 0 }
    }

    /// "Sky" and "Water" folders, both expanded.
    pub fn seascape() -> Self {
        Self::new(vec![
            Folder {
                name: "Sky".into(),
                open: true,
                sliders: vec![
                    Slider::for_field(ParamField::Elevation, 0.1),
                    Slider::for_field(ParamField::Azimuth, 0.1),
                ],
            },
            Folder {
                name: "Water".into(),
                open: true,
                sliders: vec![
                    Slider::for_field(ParamField::DistortionScale, 0.1),
                    Slider::for_field(ParamField::TileSize, 0.1),
                ],
            },
        ])
    }

    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    pub fn folder(&self, name: &str) -> Option<&Folder> {
        self.folders.iter().find(|folder| folder.name == name)
    }

    pub fn slider(&self, field: ParamField) -> Option<&Slider> {
        self.folders
            .iter()
            .flat_map(|folder| folder.sliders.iter())
            .find(|slider| slider.field == field)
    }

    /// Turns raw widget input into an event. Non-finite input and fields
    /// without a slider produce nothing.
    pub fn input(&self, field: ParamField, raw: f32) -> Option<ParameterChanged> {
        if !raw.is_finite() {
            return None;
        }
        let slider = self.slider(field)?;
        Some(ParameterChanged {
            field,
            value: slider.clamp(raw),
        })
    }

    fn visible_sliders(&self) -> Vec<&Slider> {
        self.folders
            .iter()
            .filter(|folder| folder.open)
            .flat_map(|folder| folder.sliders.iter())
            .collect()
    }

    /// Slider receiving keyboard nudges, if any folder is open.
    pub fn focused(&self) -> Option<&Slider> {
        let visible = self.visible_sliders();
        if visible.is_empty() {
            return None;
        }
        Some(visible[self.focus % visible.len()])
    }

    pub fn focus_next(&mut self) {
        let count = self.visible_sliders().len();
        if count > 0 {
            self.focus = (self.focus % count + 1) % count;
        }
    }

    pub fn focus_prev(&mut self) {
        let count = self.visible_sliders().len();
        if count > 0 {
            self.focus = (self.focus % count + count - 1) % count;
        }
    }

    /// Moves the focused slider by `steps` increments from its current value.
    pub fn nudge(&self, params: &Parameters, steps: i32) -> Option<ParameterChanged> {
        let slider = self.focused()?;
        let current = params.get(slider.field);
        let value = slider.snap(current + steps as f32 * slider.step);
        Some(ParameterChanged {
            field: slider.field,
            value,
        })
    }

    pub fn set_all_open(&mut self, open: bool) {
        for folder in &mut self.folders {
            folder.open = open;
        }
        self.focus = 0;
    }

    pub fn toggle_all(&mut self) {
        let any_open = self.folders.iter().any(|folder| folder.open);
        self.set_all_open(!any_open);
    }

    /// Multi-line listing of every folder and slider value.
    pub fn describe(&self, params: &Parameters) -> String {
        let focused = self.focused().map(|slider| slider.field);
        let mut out = String::new();
        for folder in &self.folders {
            let marker = if folder.open { "v" } else { ">" };
            let _ = writeln!(out, "{marker} {}", folder.name);
            if !folder.open {
                continue;
            }
            for slider in &folder.sliders {
                let cursor = if Some(slider.field) == focused { "*" } else { " " };
                let _ = writeln!(
                    out,
                    "  {cursor} {:<16} {:>8.2}  [{} .. {}]",
                    slider.field.label(),
                    params.get(slider.field),
                    slider.min,
                    slider.max
                );
            }
        }
        out
    }

    /// One-line summary of the focused slider for a window title.
    pub fn focus_summary(&self, params: &Parameters) -> Option<String> {
        self.focused().map(|slider| {
            format!(
                "{} = {:.1}",
                slider.field.label(),
                params.get(slider.field)
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_folders_start_open() {
        let panel = ControlPanel::seascape();
        assert!(panel.folder("Sky").unwrap().open);
        assert!(panel.folder("Water").unwrap().open);
        assert_eq!(panel.folder("Sky").unwrap().sliders.len(), 2);
    }

    #[test]
    fn input_is_clamped_to_slider_range() {
        let panel = ControlPanel::seascape();
        let event = panel.input(ParamField::Elevation, 123.0).unwrap();
        assert_eq!(event.value, 90.0);
        let event = panel.input(ParamField::TileSize, -1.0).unwrap();
        assert_eq!(event.value, 0.1);
        assert!(panel.input(ParamField::Azimuth, f32::NAN).is_none());
    }

    #[test]
    fn unbound_fields_produce_no_event() {
        let panel = ControlPanel::new(vec![Folder {
            name: "Sky".into(),
            open: true,
            sliders: vec![Slider::for_field(ParamField::Elevation, 0.1)],
        }]);
        assert!(panel.input(ParamField::TileSize, 1.0).is_none());
    }

    #[test]
    fn focus_cycles_over_open_folders() {
        let mut panel = ControlPanel::seascape();
        assert_eq!(panel.focused().unwrap().field, ParamField::Elevation);
        panel.focus_next();
        panel.focus_next();
        assert_eq!(panel.focused().unwrap().field, ParamField::DistortionScale);
        panel.focus_prev();
        panel.focus_prev();
        panel.focus_prev();
        assert_eq!(panel.focused().unwrap().field, ParamField::TileSize);

        panel.set_all_open(false);
        assert!(panel.focused().is_none());
        panel.toggle_all();
        assert_eq!(panel.focused().unwrap().field, ParamField::Elevation);
    }

    #[test]
    fn nudge_steps_and_clamps() {
        let panel = ControlPanel::seascape();
        let params = Parameters::default();
        let up = panel.nudge(&params, 10).unwrap();
        assert_eq!(up.field, ParamField::Elevation);
        assert!((up.value - 1.5).abs() < 1e-4);
        let down = panel.nudge(&params, -100).unwrap();
        assert_eq!(down.value, 0.0);
    }

    #[test]
    fn describe_lists_values() {
        let panel = ControlPanel::seascape();
        let text = panel.describe(&Parameters::default());
        assert!(text.contains("v Sky"));
        assert!(text.contains("elevation"));
        assert!(text.contains("180.00"));
        assert!(text.contains("distortionScale"));
    }
}

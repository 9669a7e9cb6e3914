use std::path::PathBuf;

use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::params::Parameters;

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("invalid scene XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("expected a <scene> root element, found <{0}>")]
    Root(String),
    #[error("<{tag}> is not a number: {value:?}")]
    Number { tag: String, value: String },
    #[error("<{tag}> is not a boolean: {value:?}")]
    Flag { tag: String, value: String },
    #[error("unknown preset {0:?}, expected `ocean` or `hand`")]
    Unknown(String),
}

/// Everything that distinguishes one seascape variant from another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenePreset {
    pub name: String,
    pub tile_size: f32,
    pub elevation: f32,
    pub azimuth: f32,
    pub distortion_scale: f32,
    /// Load and draw the hand model.
    pub show_model: bool,
    /// Publish the frame-rate overlay.
    pub show_stats: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normals_path: Option<PathBuf>,
}

impl ScenePreset {
    /// Open water with a frame-rate overlay.
    pub fn ocean() -> Self {
        Self {
            name: "ocean".into(),
            tile_size: 1.0,
            elevation: 0.5,
            azimuth: 180.0,
            distortion_scale: 3.7,
            show_model: false,
            show_stats: true,
            model_path: None,
            normals_path: Some(PathBuf::from("assets/water-normals.jpg")),
        }
    }

    /// Water with the hand model floating at the orbit target.
    pub fn hand() -> Self {
        Self {
            name: "hand".into(),
            elevation: 2.0,
            show_model: true,
            show_stats: false,
            model_path: Some(PathBuf::from("assets/hand.obj")),
            ..Self::ocean()
        }
    }

    pub fn by_name(name: &str) -> Result<Self, PresetError> {
        match name.to_ascii_lowercase().as_str() {
            "ocean" => Ok(Self::ocean()),
            "hand" => Ok(Self::hand()),
            _ => Err(PresetError::Unknown(name.to_string())),
        }
    }

    /// Parses a `<scene>` document. A `<preset>` child picks the base preset
    /// (default `ocean`); every other recognised child overrides one field.
    pub fn from_xml(xml: &str) -> Result<Self, PresetError> {
        let document = Document::parse(xml)?;
        let root = document.root_element();
        if !root.has_tag_name("scene") {
            return Err(PresetError::Root(root.tag_name().name().to_string()));
        }

        let mut preset = match optional_text(&root, "preset") {
            Some(name) => Self::by_name(&name)?,
            None => Self::ocean(),
        };
        if let Some(name) = optional_text(&root, "name") {
            preset.name = name;
        }
        preset.tile_size = parse_f32(&root, "tileSize", preset.tile_size)?;
        preset.elevation = parse_f32(&root, "elevation", preset.elevation)?;
        preset.azimuth = parse_f32(&root, "azimuth", preset.azimuth)?;
        preset.distortion_scale = parse_f32(&root, "distortionScale", preset.distortion_scale)?;
        preset.show_model = parse_flag(&root, "model", preset.show_model)?;
        preset.show_stats = parse_flag(&root, "stats", preset.show_stats)?;
        if let Some(path) = optional_text(&root, "modelPath") {
            preset.model_path = Some(PathBuf::from(path));
        }
        if let Some(path) = optional_text(&root, "normalsPath") {
            preset.normals_path = Some(PathBuf::from(path));
        }
        Ok(preset)
    }

    /// Initial parameter values, clamped into their declared ranges.
    pub fn parameters(&self) -> Parameters {
        use crate::params::ParamField::*;
        Parameters {
            elevation: Elevation.clamp(self.elevation),
            azimuth: Azimuth.clamp(self.azimuth),
            distortion_scale: DistortionScale.clamp(self.distortion_scale),
            tile_size: TileSize.clamp(self.tile_size),
        }
    }
}

impl Default for ScenePreset {
    fn default() -> Self {
        Self::ocean()
    }
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_f32(node: &Node<'_, '_>, tag: &str, default: f32) -> Result<f32, PresetError> {
    match optional_text(node, tag) {
        Some(value) => match value.parse::<f32>() {
            Ok(number) if number.is_finite() => Ok(number),
            _ => Err(PresetError::Number {
                tag: tag.to_string(),
                value,
            }),
        },
        None => Ok(default),
    }
}

fn parse_flag(node: &Node<'_, '_>, tag: &str, default: bool) -> Result<bool, PresetError> {
    let Some(value) = optional_text(node, tag) else {
        return Ok(default);
    };
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(PresetError::Flag {
            tag: tag.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
    <scene>
        <preset>hand</preset>
        <tileSize>2.5</tileSize>
        <elevation>12</elevation>
        <stats>on</stats>
        <modelPath>models/left-hand.obj</modelPath>
    </scene>
    "#;

    #[test]
    fn xml_overrides_base_preset() {
        let preset = ScenePreset::from_xml(SAMPLE).unwrap();
        assert_eq!(preset.name, "hand");
        assert!(preset.show_model);
        assert!(preset.show_stats);
        assert_eq!(preset.tile_size, 2.5);
        assert_eq!(preset.elevation, 12.0);
        assert_eq!(preset.azimuth, 180.0);
        assert_eq!(
            preset.model_path.as_deref(),
            Some(std::path::Path::new("models/left-hand.obj"))
        );
    }

    #[test]
    fn empty_scene_is_the_ocean_preset() {
        let preset = ScenePreset::from_xml("<scene/>").unwrap();
        assert_eq!(preset, ScenePreset::ocean());
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        for text in ["NaN", "inf", "-infinity"] {
            let xml = format!("<scene><elevation>{text}</elevation></scene>");
            let err = ScenePreset::from_xml(&xml).unwrap_err();
            assert!(
                matches!(err, PresetError::Number { ref tag, ref value } if tag == "elevation" && value == text)
            );
        }
    }

    #[test]
    fn bad_number_is_an_error() {
        let err = ScenePreset::from_xml("<scene><elevation>high</elevation></scene>").unwrap_err();
        assert!(matches!(err, PresetError::Number { ref tag, .. } if tag == "elevation"));
    }

    #[test]
    fn wrong_root_and_unknown_preset_are_errors() {
        assert!(matches!(
            ScenePreset::from_xml("<world/>"),
            Err(PresetError::Root(_))
        ));
        assert!(matches!(
            ScenePreset::from_xml("<scene><preset>desert</preset></scene>"),
            Err(PresetError::Unknown(_))
        ));
    }

    #[test]
    fn parameters_are_clamped() {
        let preset = ScenePreset {
            elevation: 140.0,
            tile_size: 0.0,
            ..ScenePreset::ocean()
        };
        let params = preset.parameters();
        assert_eq!(params.elevation, 90.0);
        assert_eq!(params.tile_size, 0.1);
    }
}

//! Tunable scene parameters and the fixed uniform blocks they feed.

use std::fmt;
use std::ops::RangeInclusive;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Identifies one tunable scalar in [`Parameters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamField {
    Elevation,
    Azimuth,
    DistortionScale,
    TileSize,
}

/// Which part of the scene a parameter drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamGroup {
    Sky,
    Water,
}

impl ParamField {
    pub const ALL: [ParamField; 4] = [
        ParamField::Elevation,
        ParamField::Azimuth,
        ParamField::DistortionScale,
        ParamField::TileSize,
    ];

    /// Declared range of the field. Inputs are clamped to it by the panel.
    pub fn range(self) -> RangeInclusive<f32> {
        match self {
            ParamField::Elevation => 0.0..=90.0,
            ParamField::Azimuth => -180.0..=180.0,
            ParamField::DistortionScale => 0.0..=8.0,
            ParamField::TileSize => 0.1..=10.0,
        }
    }

    pub fn group(self) -> ParamGroup {
        match self {
            ParamField::Elevation | ParamField::Azimuth => ParamGroup::Sky,
            ParamField::DistortionScale | ParamField::TileSize => ParamGroup::Water,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ParamField::Elevation => "elevation",
            ParamField::Azimuth => "azimuth",
            ParamField::DistortionScale => "distortionScale",
            ParamField::TileSize => "size",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.label().eq_ignore_ascii_case(label))
    }

    /// Clamps `value` into the declared range.
    pub fn clamp(self, value: f32) -> f32 {
        let range = self.range();
        value.clamp(*range.start(), *range.end())
    }
}

impl fmt::Display for ParamField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// User-tunable values. Plain storage: reading returns the last set value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    /// Sun height above the horizon in degrees.
    pub elevation: f32,
    /// Sun bearing around the vertical axis in degrees.
    pub azimuth: f32,
    pub distortion_scale: f32,
    pub tile_size: f32,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            elevation: 0.5,
            azimuth: 180.0,
            distortion_scale: 3.7,
            tile_size: 1.0,
        }
    }
}

impl Parameters {
    pub fn get(&self, field: ParamField) -> f32 {
        match field {
            ParamField::Elevation => self.elevation,
            ParamField::Azimuth => self.azimuth,
            ParamField::DistortionScale => self.distortion_scale,
            ParamField::TileSize => self.tile_size,
        }
    }

    pub fn set(&mut self, field: ParamField, value: f32) {
        match field {
            ParamField::Elevation => self.elevation = value,
            ParamField::Azimuth => self.azimuth = value,
            ParamField::DistortionScale => self.distortion_scale = value,
            ParamField::TileSize => self.tile_size = value,
        }
    }
}

/// Sky dome scattering inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyUniforms {
    pub turbidity: f32,
    pub rayleigh: f32,
    pub mie_coefficient: f32,
    pub mie_directional_g: f32,
    pub sun_position: Vec3,
}

impl Default for SkyUniforms {
    fn default() -> Self {
        Self {
            turbidity: 10.0,
            rayleigh: 2.0,
            mie_coefficient: 0.005,
            mie_directional_g: 0.8,
            sun_position: Vec3::ZERO,
        }
    }
}

/// Water surface shading inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterUniforms {
    pub sun_direction: Vec3,
    pub sun_color: Vec3,
    pub water_color: Vec3,
    pub distortion_scale: f32,
    /// Normal-map tiling factor.
    pub size: f32,
    /// Animation clock, advanced by the render loop. Kept in `f64` so the
    /// fixed step never rounds away; narrowed only for upload.
    pub time: f64,
    pub alpha: f32,
}

impl Default for WaterUniforms {
    fn default() -> Self {
        Self {
            sun_direction: Vec3::ZERO,
            sun_color: rgb_hex(0xffffff),
            water_color: rgb_hex(0x001e0f),
            distortion_scale: 3.7,
            size: 1.0,
            time: 0.0,
            alpha: 1.0,
        }
    }
}

/// Converts a packed `0xRRGGBB` colour into linear-ish `[0, 1]` components.
pub fn rgb_hex(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    )
}

/// Scene geometry constants.
pub mod scene_constants {
    /// Edge length of the square water plane (world units).
    pub const WATER_PLANE_SIZE: f32 = 20_000.0;

    /// Uniform scale of the sky dome.
    pub const SKY_SCALE: f32 = 10_000.0;

    /// Water animation advance per loop iteration.
    pub const WATER_TIME_STEP: f64 = 0.5 / 60.0;

    /// Upper bound on the device pixel ratio used for the drawable.
    pub const MAX_PIXEL_RATIO: f64 = 2.0;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_returns_last_value_without_clamping() {
        let mut params = Parameters::default();
        params.set(ParamField::Elevation, 120.0);
        assert_eq!(params.get(ParamField::Elevation), 120.0);
        params.set(ParamField::TileSize, 2.5);
        assert_eq!(params.tile_size, 2.5);
    }

    #[test]
    fn fields_clamp_into_declared_range() {
        assert_eq!(ParamField::Azimuth.clamp(-200.0), -180.0);
        assert_eq!(ParamField::TileSize.clamp(0.0), 0.1);
        assert_eq!(ParamField::DistortionScale.clamp(4.0), 4.0);
    }

    #[test]
    fn groups_split_sky_and_water() {
        assert_eq!(ParamField::Elevation.group(), ParamGroup::Sky);
        assert_eq!(ParamField::Azimuth.group(), ParamGroup::Sky);
        assert_eq!(ParamField::DistortionScale.group(), ParamGroup::Water);
        assert_eq!(ParamField::TileSize.group(), ParamGroup::Water);
    }

    #[test]
    fn labels_round_trip() {
        for field in ParamField::ALL {
            assert_eq!(ParamField::from_label(field.label()), Some(field));
        }
        assert_eq!(ParamField::from_label("unknown"), None);
    }

    #[test]
    fn water_colour_matches_hex() {
        let water = WaterUniforms::default();
        assert_eq!(water.sun_color, Vec3::ONE);
        assert!((water.water_color.y - 30.0 / 255.0).abs() < 1e-6);
        assert!((water.water_color.z - 15.0 / 255.0).abs() < 1e-6);
    }
}

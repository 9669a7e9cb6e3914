//! Water normal map loading.

use std::f32::consts::TAU;
use std::path::Path;

use glam::Vec3;
use log::{error, info};

use crate::error::AssetError;

/// RGBA8 tangent-space normal map that tiles in both directions.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalMap {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl NormalMap {
    pub fn load(path: &Path) -> Result<Self, AssetError> {
        let image = image::open(path).map_err(|source| match source {
            image::ImageError::IoError(io) => AssetError::Io {
                path: path.to_path_buf(),
                source: io,
            },
            other => AssetError::Image {
                path: path.to_path_buf(),
                source: other,
            },
        })?;
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self {
            width,
            height,
            rgba: rgba.into_raw(),
        })
    }

    /// Ripple pattern built from integer-frequency waves so it tiles exactly.
    pub fn procedural(size: u32) -> Self {
        const WAVES: [(f32, f32, f32, f32); 5] = [
            // (freq_u, freq_v, amplitude, phase)
            (3.0, 1.0, 0.35, 0.0),
            (-2.0, 5.0, 0.25, 1.3),
            (7.0, -4.0, 0.12, 2.1),
            (1.0, 9.0, 0.08, 0.4),
            (-11.0, -6.0, 0.05, 5.0),
        ];
        let size = size.max(1);
        let mut rgba = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let u = x as f32 / size as f32;
                let v = y as f32 / size as f32;
                let (mut dx, mut dy) = (0.0, 0.0);
                for (fu, fv, amp, phase) in WAVES {
                    let slope = amp * (TAU * (fu * u + fv * v) + phase).cos();
                    dx += slope * fu / 4.0;
                    dy += slope * fv / 4.0;
                }
                let n = Vec3::new(-dx, -dy, 1.0).normalize();
                rgba.extend_from_slice(&[encode(n.x), encode(n.y), encode(n.z), 255]);
            }
        }
        Self {
            width: size,
            height: size,
            rgba,
        }
    }

    /// Loads `path` when given. A failed load is logged and replaced by the
    /// procedural pattern, so the water renders without its detail texture.
    pub fn load_or_procedural(path: Option<&Path>) -> Self {
        match path {
            Some(path) => match Self::load(path) {
                Ok(map) => {
                    info!(
                        "loaded water normals {} ({}x{})",
                        path.display(),
                        map.width,
                        map.height
                    );
                    map
                }
                Err(err) => {
                    error!("failed to load water normals: {err}");
                    Self::procedural(256)
                }
            },
            None => Self::procedural(256),
        }
    }
}

fn encode(component: f32) -> u8 {
    ((component * 0.5 + 0.5).clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn procedural_map_tiles_and_points_up() {
        let map = NormalMap::procedural(64);
        assert_eq!(map.rgba.len(), 64 * 64 * 4);
        let texel = |x: u32, y: u32| {
            let i = ((y * 64 + x) * 4) as usize;
            &map.rgba[i..i + 4]
        };
        for y in 0..64 {
            assert!(texel(0, y)[2] > 180, "normal should lean towards +Z");
        }
        let row_start = texel(0, 10)[0] as i32;
        let row_end = texel(63, 10)[0] as i32;
        assert!((row_start - row_end).abs() < 40);
    }

    #[test]
    fn missing_file_falls_back() {
        let map = NormalMap::load_or_procedural(Some(Path::new("/no/such/normals.png")));
        assert_eq!((map.width, map.height), (256, 256));
    }

    #[test]
    fn loads_png_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("normals.png");
        let image = image::RgbaImage::from_pixel(4, 2, image::Rgba([128, 128, 255, 255]));
        image.save(&path).unwrap();
        let map = NormalMap::load(&path).unwrap();
        assert_eq!((map.width, map.height), (4, 2));
        assert_eq!(&map.rgba[..4], &[128, 128, 255, 255]);
    }
}

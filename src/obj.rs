//! Wavefront OBJ reader for the floating hand model.

use std::collections::HashMap;
use std::path::Path;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::error::AssetError;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Indexed triangle mesh with per-vertex normals.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelMesh {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

impl ModelMesh {
    /// Axis-aligned bounds as `(min, max)`.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut points = self.vertices.iter().map(|v| Vec3::from(v.position));
        let first = points.next()?;
        Some(points.fold((first, first), |(min, max), p| (min.min(p), max.max(p))))
    }

    /// Transform that scales the mesh to `height` world units and stands its
    /// base on `anchor`, centred horizontally.
    pub fn fit_to_height(&self, height: f32, anchor: Vec3) -> Mat4 {
        let Some((min, max)) = self.bounds() else {
            return Mat4::from_translation(anchor);
        };
        let extent = (max - min).y.max(f32::EPSILON);
        let scale = height / extent;
        let base = Vec3::new((min.x + max.x) * 0.5, min.y, (min.z + max.z) * 0.5);
        Mat4::from_translation(anchor) * Mat4::from_scale(Vec3::splat(scale)) * Mat4::from_translation(-base)
    }
}

pub fn load_model(path: &Path) -> Result<ModelMesh, AssetError> {
    let text = std::fs::read_to_string(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_obj(&text)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Corner {
    position: usize,
    normal: Option<usize>,
}

/// Parses OBJ text. Only `v`, `vn` and `f` records matter; polygons are fan
/// triangulated and missing normals are computed from face geometry.
pub fn parse_obj(text: &str) -> Result<ModelMesh, AssetError> {
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut raw_faces: Vec<(usize, Vec<(i64, i64)>)> = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("v") => positions.push(parse_vec3(parts, line_no)?),
            Some("vn") => normals.push(parse_vec3(parts, line_no)?),
            Some("f") => {
                let corners = parts
                    .map(|corner| parse_corner(corner, line_no))
                    .collect::<Result<Vec<_>, _>>()?;
                if corners.len() < 3 {
                    return Err(AssetError::Parse {
                        line: line_no,
                        message: "face needs at least three corners".into(),
                    });
                }
                raw_faces.push((line_no, corners));
            }
            _ => {}
        }
    }

    if positions.is_empty() {
        return Err(AssetError::Empty("vertices"));
    }
    if raw_faces.is_empty() {
        return Err(AssetError::Empty("faces"));
    }

    let mut mesh = ModelMesh::default();
    let mut lookup: HashMap<Corner, u32> = HashMap::new();
    let mut missing_normals = false;

    for (line_no, corners) in &raw_faces {
        let mut resolved = Vec::with_capacity(corners.len());
        for &(v, vn) in corners {
            let position = resolve_index(v, positions.len()).ok_or_else(|| AssetError::Parse {
                line: *line_no,
                message: format!("vertex index {v} out of range"),
            })?;
            let normal = resolve_index(vn, normals.len());
            missing_normals |= normal.is_none();
            let corner = Corner { position, normal };
            let id = *lookup.entry(corner).or_insert_with(|| {
                let n = normal.map(|i| normals[i]).unwrap_or(Vec3::ZERO);
                mesh.vertices.push(ModelVertex {
                    position: positions[position].to_array(),
                    normal: n.to_array(),
                });
                (mesh.vertices.len() - 1) as u32
            });
            resolved.push(id);
        }
        for i in 1..resolved.len() - 1 {
            mesh.indices
                .extend_from_slice(&[resolved[0], resolved[i], resolved[i + 1]]);
        }
    }

    if missing_normals {
        smooth_normals(&mut mesh);
    }
    Ok(mesh)
}

fn parse_vec3<'a>(
    mut parts: impl Iterator<Item = &'a str>,
    line: usize,
) -> Result<Vec3, AssetError> {
    let mut next = || -> Result<f32, AssetError> {
        let token = parts.next().ok_or_else(|| AssetError::Parse {
            line,
            message: "expected three components".into(),
        })?;
        token.parse::<f32>().map_err(|err| AssetError::Parse {
            line,
            message: format!("{token:?}: {err}"),
        })
    };
    Ok(Vec3::new(next()?, next()?, next()?))
}

/// Parses `v`, `v/vt`, `v//vn` or `v/vt/vn`. Texture coordinates are ignored.
fn parse_corner(token: &str, line: usize) -> Result<(i64, i64), AssetError> {
    let mut fields = token.split('/');
    let parse = |field: Option<&str>| -> Result<i64, AssetError> {
        match field {
            None | Some("") => Ok(0),
            Some(text) => text.parse::<i64>().map_err(|err| AssetError::Parse {
                line,
                message: format!("{token:?}: {err}"),
            }),
        }
    };
    let v = parse(fields.next())?;
    let _vt = parse(fields.next())?;
    let vn = parse(fields.next())?;
    if v == 0 {
        return Err(AssetError::Parse {
            line,
            message: format!("{token:?}: missing vertex index"),
        });
    }
    Ok((v, vn))
}

/// OBJ indices are 1-based; negative values count back from the end.
fn resolve_index(index: i64, len: usize) -> Option<usize> {
    match index {
        0 => None,
        i if i > 0 => {
            let zero_based = (i - 1) as usize;
            (zero_based < len).then_some(zero_based)
        }
        i => {
            let back = i.unsigned_abs() as usize;
            (back <= len).then(|| len - back)
        }
    }
}

fn smooth_normals(mesh: &mut ModelMesh) {
    let mut accum = vec![Vec3::ZERO; mesh.vertices.len()];
    for tri in mesh.indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let pa = Vec3::from(mesh.vertices[a].position);
        let pb = Vec3::from(mesh.vertices[b].position);
        let pc = Vec3::from(mesh.vertices[c].position);
        let face = (pb - pa).cross(pc - pa);
        for i in [a, b, c] {
            accum[i] += face;
        }
    }
    for (vertex, sum) in mesh.vertices.iter_mut().zip(accum) {
        if vertex.normal == [0.0; 3] {
            vertex.normal = sum.normalize_or_zero().to_array();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "
# unit quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
f 1 2 3 4
";

    #[test]
    fn quad_is_fan_triangulated() {
        let mesh = parse_obj(QUAD).unwrap();
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn missing_normals_are_computed() {
        let mesh = parse_obj(QUAD).unwrap();
        for vertex in &mesh.vertices {
            assert_eq!(vertex.normal, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn negative_indices_and_explicit_normals() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 0 1\nvn 0 1 0\nf -3//1 -1//1 -2//1\n";
        let mesh = parse_obj(obj).unwrap();
        assert_eq!(mesh.indices.len(), 3);
        assert!(mesh.vertices.iter().all(|v| v.normal == [0.0, 1.0, 0.0]));
        assert_eq!(mesh.vertices[1].position, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn out_of_range_index_reports_line() {
        let err = parse_obj("v 0 0 0\nv 1 0 0\nf 1 2 9\n").unwrap_err();
        assert!(matches!(err, AssetError::Parse { line: 3, .. }));
    }

    #[test]
    fn empty_model_is_rejected() {
        assert!(matches!(parse_obj("# nothing"), Err(AssetError::Empty("vertices"))));
    }

    #[test]
    fn fit_to_height_scales_and_grounds() {
        let mesh = parse_obj(QUAD).unwrap();
        let transform = mesh.fit_to_height(20.0, Vec3::new(0.0, 10.0, 0.0));
        let bottom = transform.transform_point3(Vec3::new(0.5, 0.0, 0.0));
        let top = transform.transform_point3(Vec3::new(0.5, 1.0, 0.0));
        assert!((bottom - Vec3::new(0.0, 10.0, 0.0)).length() < 1e-5);
        assert!((top.y - 30.0).abs() < 1e-4);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_model(Path::new("/definitely/not/here.obj")).unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }
}

//! STL reader
//!
//! ASCII files may hold several `solid` blocks; each becomes its own
//! [`StlSolid`]. Binary files always hold exactly one.

use super::mesh_ops::TriMesh;
use nalgebra::Point3;
use super::{SceneError, SceneResult};
use std::path::Path;

const HEADER_SIZE: usize = 80;
const TRIANGLE_SIZE: usize = 50;

/// One named solid from an STL file
#[derive(Debug, Clone, PartialEq)]
pub struct StlSolid {
    /// Name after the `solid` keyword; empty for binary files
    pub name: String,
    pub mesh: TriMesh,
}

pub fn read_stl(path: &Path) -> SceneResult<Vec<StlSolid>> {
    let bytes = std::fs::read(path)?;
    parse_stl(&bytes)
}

pub fn parse_stl(bytes: &[u8]) -> SceneResult<Vec<StlSolid>> {
    if looks_like_ascii(bytes) {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| SceneError::Parse(format!("ASCII STL is not UTF-8: {}", e)))?;
        parse_ascii(text)
    } else {
        parse_binary(bytes).map(|solid| vec![solid])
    }
}

/// "solid" prefix and a size that does not match the binary layout
fn looks_like_ascii(bytes: &[u8]) -> bool {
    let starts_with_solid = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .map(|start| bytes[start..].starts_with(b"solid"))
        .unwrap_or(false);
    if !starts_with_solid {
        return false;
    }
    match binary_face_count(bytes) {
        Some(count) => HEADER_SIZE + 4 + count * TRIANGLE_SIZE != bytes.len(),
        None => true,
    }
}

fn binary_face_count(bytes: &[u8]) -> Option<usize> {
    let raw = bytes.get(HEADER_SIZE..HEADER_SIZE + 4)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize)
}

fn parse_binary(bytes: &[u8]) -> SceneResult<StlSolid> {
    let count = binary_face_count(bytes)
        .ok_or_else(|| SceneError::Parse("file too small to be valid STL".to_string()))?;

    let body = &bytes[HEADER_SIZE + 4..];
    if body.len() < count * TRIANGLE_SIZE {
        return Err(SceneError::Parse(format!(
            "expected {} triangles, file holds {}",
            count,
            body.len() / TRIANGLE_SIZE
        )));
    }

    let triangles: Vec<[Point3<f64>; 3]> = body
        .chunks_exact(TRIANGLE_SIZE)
        .take(count)
        .map(|chunk| {
            // Skip the stored normal
            [
                read_vertex(&chunk[12..24]),
                read_vertex(&chunk[24..36]),
                read_vertex(&chunk[36..48]),
            ]
        })
        .collect();

    Ok(StlSolid {
        name: String::new(),
        mesh: TriMesh::from_triangles(&triangles),
    })
}

fn read_vertex(buf: &[u8]) -> Point3<f64> {
    let coord = |i: usize| {
        f64::from(f32::from_le_bytes([buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]))
    };
    Point3::new(coord(0), coord(4), coord(8))
}

fn parse_ascii(text: &str) -> SceneResult<Vec<StlSolid>> {
    let mut solids = Vec::new();
    let mut current: Option<(String, Vec<[Point3<f64>; 3]>)> = None;
    let mut corners: Vec<Point3<f64>> = Vec::with_capacity(3);

    for (line_no, line) in text.lines().enumerate() {
        let mut parts = line.split_whitespace();
        let Some(keyword) = parts.next() else {
            continue;
        };

        match keyword {
            "solid" => {
                if let Some((name, triangles)) = current.take() {
                    solids.push(finish_solid(name, &triangles));
                }
                current = Some((parts.collect::<Vec<_>>().join(" "), Vec::new()));
            }
            "endsolid" => {
                if let Some((name, triangles)) = current.take() {
                    solids.push(finish_solid(name, &triangles));
                }
            }
            "outer" => corners.clear(),
            "vertex" => {
                let coords: Vec<f64> = parts
                    .map(|p| p.parse::<f64>())
                    .collect::<Result<_, _>>()
                    .map_err(|e| SceneError::Parse(format!("line {}: {}", line_no + 1, e)))?;
                if coords.len() != 3 {
                    return Err(SceneError::Parse(format!(
                        "line {}: vertex needs 3 coordinates",
                        line_no + 1
                    )));
                }
                corners.push(Point3::new(coords[0], coords[1], coords[2]));
            }
            "endloop" => {
                if corners.len() != 3 {
                    return Err(SceneError::Parse(format!(
                        "line {}: facet has {} vertices",
                        line_no + 1,
                        corners.len()
                    )));
                }
                let Some((_, triangles)) = current.as_mut() else {
                    return Err(SceneError::Parse(format!(
                        "line {}: facet outside solid",
                        line_no + 1
                    )));
                };
                triangles.push([corners[0], corners[1], corners[2]]);
                corners.clear();
            }
            _ => {}
        }
    }

    // Tolerate a missing endsolid
    if let Some((name, triangles)) = current.take() {
        solids.push(finish_solid(name, &triangles));
    }
    Ok(solids)
}

fn finish_solid(name: String, triangles: &[[Point3<f64>; 3]]) -> StlSolid {
    StlSolid {
        name,
        mesh: TriMesh::from_triangles(triangles),
    }
}

/// ASCII STL text for one solid
pub fn to_ascii(name: &str, mesh: &TriMesh) -> String {
    let mut out = format!("solid {}\n", name);
    for (face, normal) in mesh.faces.iter().zip(mesh.face_normals()) {
        out.push_str(&format!(
            "  facet normal {} {} {}\n    outer loop\n",
            normal.x, normal.y, normal.z
        ));
        for &i in face {
            let v = mesh.vertices[i];
            out.push_str(&format!("      vertex {} {} {}\n", v.x, v.y, v.z));
        }
        out.push_str("    endloop\n  endfacet\n");
    }
    out.push_str(&format!("endsolid {}\n", name));
    out
}

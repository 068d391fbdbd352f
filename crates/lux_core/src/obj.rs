//! Wavefront OBJ reader.
//!
//! A line-oriented reader for the subset of OBJ that describes geometry:
//!
//! - `v x y z` positions
//! - `vn x y z` normals
//! - `vt u v` texture coordinates
//! - `f a b c ...` faces, each corner as `p`, `p/t`, `p/t/n` or `p//n`
//!
//! Indices are 1-based; negative indices count back from the latest element.
//! Faces with more than three corners are fan-triangulated. Every other
//! record (groups, materials, smoothing) is ignored.

use std::path::Path;

use lux_math::{Vec2, Vec3};
use thiserror::Error;

use crate::mesh::{Polygon, TriangleMesh, Vertex};

/// Errors that can occur during OBJ parsing.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid number at line {line}: {token:?}")]
    InvalidNumber { line: usize, token: String },

    #[error("Index {index} at line {line} is out of range ({count} {kind} defined)")]
    MissingIndex {
        line: usize,
        index: i64,
        count: usize,
        kind: &'static str,
    },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Read and parse an OBJ file.
pub fn load_obj(path: impl AsRef<Path>) -> ParseResult<TriangleMesh> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let mesh = parse_obj(&content)?;
    log::info!(
        "Loaded {} triangles from {}",
        mesh.triangle_count(),
        path.display()
    );
    Ok(mesh)
}

/// Parse OBJ text into a triangle mesh.
pub fn parse_obj(content: &str) -> ParseResult<TriangleMesh> {
    let mut parser = ObjParser::default();
    for (i, line) in content.lines().enumerate() {
        parser.parse_line(i + 1, line)?;
    }
    log::debug!(
        "OBJ: {} positions, {} normals, {} uvs, {} triangles",
        parser.positions.len(),
        parser.normals.len(),
        parser.uvs.len(),
        parser.polygons.len()
    );
    Ok(TriangleMesh::new(parser.polygons))
}

#[derive(Default)]
struct ObjParser {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    uvs: Vec<Vec2>,
    polygons: Vec<Polygon>,
}

/// One face corner before attribute lookup.
struct Corner {
    position: usize,
    uv: Option<usize>,
    normal: Option<usize>,
}

impl ObjParser {
    fn parse_line(&mut self, line_num: usize, line: &str) -> ParseResult<()> {
        let line = line.split('#').next().unwrap_or("");
        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            return Ok(());
        };
        let args: Vec<&str> = tokens.collect();

        match keyword {
            "v" => {
                let [x, y, z] = parse_floats::<3>(&args, line_num)?;
                self.positions.push(Vec3::new(x, y, z));
            }
            "vn" => {
                let [x, y, z] = parse_floats::<3>(&args, line_num)?;
                self.normals.push(Vec3::new(x, y, z));
            }
            "vt" => {
                let [u, v] = parse_floats::<2>(&args, line_num)?;
                self.uvs.push(Vec2::new(u, v));
            }
            "f" => self.parse_face(&args, line_num)?,
            _ => {}
        }
        Ok(())
    }

    fn parse_face(&mut self, args: &[&str], line_num: usize) -> ParseResult<()> {
        if args.len() < 3 {
            return Err(ParseError::Parse {
                line: line_num,
                message: format!("face needs at least 3 corners, got {}", args.len()),
            });
        }

        let corners = args
            .iter()
            .map(|token| self.parse_corner(token, line_num))
            .collect::<ParseResult<Vec<_>>>()?;

        for i in 1..corners.len() - 1 {
            let (a, b, c) = (&corners[0], &corners[i], &corners[i + 1]);
            let face_normal = (self.positions[b.position] - self.positions[a.position])
                .cross(self.positions[c.position] - self.positions[a.position])
                .normalize_or_zero();
            let vertex = |corner: &Corner| {
                Vertex::new(
                    self.positions[corner.position],
                    corner.normal.map_or(face_normal, |n| self.normals[n]),
                    corner.uv.map_or(Vec2::ZERO, |t| self.uvs[t]),
                )
            };
            self.polygons
                .push(Polygon::new(vertex(a), vertex(b), vertex(c)));
        }
        Ok(())
    }

    fn parse_corner(&self, token: &str, line_num: usize) -> ParseResult<Corner> {
        let mut parts = token.split('/');
        let position = parts.next().unwrap_or("");
        let uv = parts.next().filter(|s| !s.is_empty());
        let normal = parts.next().filter(|s| !s.is_empty());
        if parts.next().is_some() {
            return Err(ParseError::Parse {
                line: line_num,
                message: format!("malformed face corner {token:?}"),
            });
        }

        Ok(Corner {
            position: resolve_index(position, self.positions.len(), "positions", line_num)?,
            uv: uv
                .map(|s| resolve_index(s, self.uvs.len(), "texture coordinates", line_num))
                .transpose()?,
            normal: normal
                .map(|s| resolve_index(s, self.normals.len(), "normals", line_num))
                .transpose()?,
        })
    }
}

fn parse_floats<const N: usize>(args: &[&str], line_num: usize) -> ParseResult<[f32; N]> {
    if args.len() < N {
        return Err(ParseError::Parse {
            line: line_num,
            message: format!("expected {N} numbers, got {}", args.len()),
        });
    }
    let mut values = [0.0; N];
    for (value, token) in values.iter_mut().zip(args) {
        *value = token.parse().map_err(|_| ParseError::InvalidNumber {
            line: line_num,
            token: token.to_string(),
        })?;
    }
    Ok(values)
}

/// Turn a 1-based (or negative, relative) OBJ index into a vector index.
fn resolve_index(
    token: &str,
    count: usize,
    kind: &'static str,
    line_num: usize,
) -> ParseResult<usize> {
    let index: i64 = token.parse().map_err(|_| ParseError::InvalidNumber {
        line: line_num,
        token: token.to_string(),
    })?;
    let resolved = match index {
        i if i > 0 => i - 1,
        i if i < 0 => count as i64 + i,
        _ => -1,
    };
    if resolved < 0 || resolved >= count as i64 {
        return Err(ParseError::MissingIndex {
            line: line_num,
            index,
            count,
            kind,
        });
    }
    Ok(resolved as usize)
}

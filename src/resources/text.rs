//! Extruded 3D text meshes from font files.
//!
//! Font parsing is delegated to `ttf-parser` and the 2D triangulation of
//! glyph outlines (including holes, via winding) to `lyon`'s fill
//! tessellator. This module only contributes the glue: laying glyphs out
//! along the pen advance, extruding the fill into a prism of the requested
//! depth, walling the sides along the flattened contours, and centering the
//! result on its bounding box.

use anyhow::anyhow;
use lyon::math::{Point, point};
use lyon::path::{Event, Path};
use lyon::path::iterator::PathIterator;
use lyon::tessellation::{
    BuffersBuilder, FillOptions, FillTessellator, FillVertex, VertexBuffers,
};

use crate::data_structures::mesh::{MeshData, Vertex};

/// Flattening and fill tolerance relative to the glyph size.
const CURVE_TOLERANCE: f32 = 0.005;

/// Fallback advance (relative to size) for characters without a glyph,
/// whitespace included.
const MISSING_GLYPH_ADVANCE: f32 = 0.35;

/// Build a centered, extruded mesh for `content`.
///
/// `size` scales the font's em square, `depth` is the extrusion along Z.
/// The mesh is centered about its own origin so the object's transform can
/// place it directly.
pub fn build_text_mesh(
    font_data: &[u8],
    content: &str,
    size: f32,
    depth: f32,
) -> anyhow::Result<MeshData> {
    let face = ttf_parser::Face::parse(font_data, 0)
        .map_err(|e| anyhow!("parsing font for text meshing: {e}"))?;
    let scale = size / face.units_per_em() as f32;

    let mut builder = Path::builder();
    let mut pen_x = 0.0f32;
    for character in content.chars() {
        match face.glyph_index(character) {
            Some(glyph) => {
                let mut outliner = GlyphOutliner {
                    builder: &mut builder,
                    scale,
                    offset_x: pen_x,
                    contour_open: false,
                };
                face.outline_glyph(glyph, &mut outliner);
                outliner.finish();
                let advance = face.glyph_hor_advance(glyph).unwrap_or(0) as f32 * scale;
                pen_x += advance;
            }
            None => pen_x += size * MISSING_GLYPH_ADVANCE,
        }
    }
    let path = builder.build();

    let tolerance = size * CURVE_TOLERANCE;
    let mut fill: VertexBuffers<[f32; 2], u32> = VertexBuffers::new();
    FillTessellator::new()
        .tessellate_path(
            &path,
            &FillOptions::tolerance(tolerance),
            &mut BuffersBuilder::new(&mut fill, |vertex: FillVertex| {
                let position = vertex.position();
                [position.x, position.y]
            }),
        )
        .map_err(|e| anyhow!("tessellating text outline: {e:?}"))?;
    if fill.indices.is_empty() {
        return Err(anyhow!("text produced no outline geometry"));
    }

    let mut mesh = MeshData::default();
    push_caps(&mut mesh, &fill, depth);
    push_side_walls(&mut mesh, &path, tolerance, depth);
    mesh.center();
    Ok(mesh)
}

/// Front cap at `z = depth` (normal +Z) and back cap at `z = 0`
/// (normal -Z, reversed winding).
fn push_caps(mesh: &mut MeshData, fill: &VertexBuffers<[f32; 2], u32>, depth: f32) {
    let front_base = mesh.vertices.len() as u32;
    for &[x, y] in &fill.vertices {
        mesh.vertices.push(Vertex {
            position: [x, y, depth],
            normal: [0.0, 0.0, 1.0],
        });
    }
    for index in &fill.indices {
        mesh.indices.push(front_base + index);
    }

    let back_base = mesh.vertices.len() as u32;
    for &[x, y] in &fill.vertices {
        mesh.vertices.push(Vertex {
            position: [x, y, 0.0],
            normal: [0.0, 0.0, -1.0],
        });
    }
    for triangle in fill.indices.chunks_exact(3) {
        mesh.indices.extend_from_slice(&[
            back_base + triangle[0],
            back_base + triangle[2],
            back_base + triangle[1],
        ]);
    }
}

/// Quads along every flattened contour edge, spanning the extrusion depth.
fn push_side_walls(mesh: &mut MeshData, path: &Path, tolerance: f32, depth: f32) {
    let mut contour_start: Option<Point> = None;
    let mut previous: Option<Point> = None;

    let mut emit_edge = |from: Point, to: Point| {
        let normal = edge_normal([from.x, from.y], [to.x, to.y]);
        let base = mesh.vertices.len() as u32;
        for position in [
            [from.x, from.y, 0.0],
            [to.x, to.y, 0.0],
            [to.x, to.y, depth],
            [from.x, from.y, depth],
        ] {
            mesh.vertices.push(Vertex { position, normal });
        }
        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    };

    for event in path.iter().flattened(tolerance) {
        match event {
            Event::Begin { at } => {
                contour_start = Some(at);
                previous = Some(at);
            }
            Event::Line { from, to } => {
                emit_edge(from, to);
                previous = Some(to);
            }
            Event::End { close, .. } => {
                if close {
                    if let (Some(last), Some(first)) = (previous, contour_start) {
                        if last != first {
                            emit_edge(last, first);
                        }
                    }
                }
                contour_start = None;
                previous = None;
            }
            _ => {}
        }
    }
}

/// Outward-facing wall normal for a contour edge, perpendicular to the edge
/// in the glyph plane.
fn edge_normal(from: [f32; 2], to: [f32; 2]) -> [f32; 3] {
    let dx = to[0] - from[0];
    let dy = to[1] - from[1];
    let length = (dx * dx + dy * dy).sqrt();
    if length <= f32::EPSILON {
        return [0.0, 0.0, 1.0];
    }
    [dy / length, -dx / length, 0.0]
}

/// Feeds a single glyph's outline into the shared path builder, scaled and
/// offset by the pen position.
struct GlyphOutliner<'a> {
    builder: &'a mut lyon::path::path::Builder,
    scale: f32,
    offset_x: f32,
    contour_open: bool,
}

impl GlyphOutliner<'_> {
    fn map(&self, x: f32, y: f32) -> Point {
        point(x * self.scale + self.offset_x, y * self.scale)
    }

    fn finish(&mut self) {
        if self.contour_open {
            self.builder.end(true);
            self.contour_open = false;
        }
    }
}

impl ttf_parser::OutlineBuilder for GlyphOutliner<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        self.finish();
        let at = self.map(x, y);
        self.builder.begin(at);
        self.contour_open = true;
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let to = self.map(x, y);
        self.builder.line_to(to);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let ctrl = self.map(x1, y1);
        let to = self.map(x, y);
        self.builder.quadratic_bezier_to(ctrl, to);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let ctrl1 = self.map(x1, y1);
        let ctrl2 = self.map(x2, y2);
        let to = self.map(x, y);
        self.builder.cubic_bezier_to(ctrl1, ctrl2, to);
    }

    fn close(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_normal_is_unit_and_perpendicular() {
        let normal = edge_normal([0.0, 0.0], [2.0, 0.0]);
        assert_eq!(normal, [0.0, -1.0, 0.0]);
        let normal = edge_normal([0.0, 0.0], [0.0, 3.0]);
        assert_eq!(normal, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn degenerate_edge_falls_back_to_z() {
        assert_eq!(edge_normal([1.0, 1.0], [1.0, 1.0]), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn caps_duplicate_fill_vertices_front_and_back() {
        let mut fill: VertexBuffers<[f32; 2], u32> = VertexBuffers::new();
        fill.vertices
            .extend_from_slice(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
        fill.indices.extend_from_slice(&[0, 1, 2]);

        let mut mesh = MeshData::default();
        push_caps(&mut mesh, &fill, 0.2);
        assert_eq!(mesh.vertices.len(), 6);
        assert_eq!(mesh.indices.len(), 6);
        // Front cap sits at the extrusion depth, back cap at zero.
        assert_eq!(mesh.vertices[0].position[2], 0.2);
        assert_eq!(mesh.vertices[3].position[2], 0.0);
        assert_eq!(mesh.vertices[0].normal, [0.0, 0.0, 1.0]);
        assert_eq!(mesh.vertices[3].normal, [0.0, 0.0, -1.0]);
    }

    #[test]
    fn garbage_font_data_is_rejected() {
        let result = build_text_mesh(&[0u8; 16], "hi", 0.5, 0.2);
        assert!(result.is_err());
    }
}

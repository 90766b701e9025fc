//! Line and area tessellation.
//!
//! Turns a series of [`Point`]s into triangle lists. Strokes are not expanded
//! on the CPU: every segment becomes a quad of four vertices sitting on the
//! centerline, each carrying a tangent, and the vertex stage pushes them
//! half a line width to either side in pixel space. That keeps line width
//! independent of the data-to-pixel scale and lets zoom reuse the buffers.

use crate::{ParameterSet, Point};
use std::fmt;

/// Vertex attribute holding the data-space position.
pub const POSITION: &str = "position";
/// Vertex attribute holding the segment direction (sign flips per side).
pub const TANGENT: &str = "tangent";
/// Vertex attribute holding the running per-axis length of a dashed run.
pub const LINE_LENGTH: &str = "linelength";

/// Output from tessellation: named 2-component attributes plus indices.
///
/// Every attribute stores two f32 per vertex, so all attributes have
/// `2 * vertex_count()` entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tessellation {
    attributes: Vec<(&'static str, Vec<f32>)>,
    indices: Vec<u32>,
}

impl Tessellation {
    fn with_attributes(names: &[&'static str]) -> Self {
        Self {
            attributes: names.iter().map(|name| (*name, Vec::new())).collect(),
            indices: Vec::new(),
        }
    }

    fn push(&mut self, slot: usize, value: [f32; 2]) {
        self.attributes[slot].1.extend_from_slice(&value);
    }

    pub fn attribute(&self, name: &str) -> Option<&[f32]> {
        self.attributes
            .iter()
            .find(|(attr, _)| *attr == name)
            .map(|(_, data)| data.as_slice())
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&'static str, &[f32])> {
        self.attributes.iter().map(|(name, data)| (*name, data.as_slice()))
    }

    pub fn positions(&self) -> &[f32] {
        self.attribute(POSITION).unwrap_or(&[])
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions().len() / 2
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Stroke vertices pushed out by `half_width` along their normals.
    ///
    /// Mirrors what the stroke vertex stage does, but in the coordinate space
    /// of the positions (no data-to-pixel transform). Returns `None` when the
    /// tessellation carries no tangents.
    pub fn expanded_positions(&self, half_width: f32) -> Option<Vec<[f32; 2]>> {
        let tangents = self.attribute(TANGENT)?;
        let expanded = self
            .positions()
            .chunks_exact(2)
            .zip(tangents.chunks_exact(2))
            .map(|(p, t)| {
                let len = (t[0] * t[0] + t[1] * t[1]).sqrt();
                if len == 0.0 {
                    [p[0], p[1]]
                } else {
                    let (nx, ny) = (-t[1] / len, t[0] / len);
                    [p[0] + nx * half_width, p[1] + ny * half_width]
                }
            })
            .collect();
        Some(expanded)
    }

    /// Twice the signed area of every triangle over `vertices`.
    pub fn signed_areas(&self, vertices: &[[f32; 2]]) -> Vec<f32> {
        self.indices
            .chunks_exact(3)
            .map(|tri| {
                let [a, b, c] = [0, 1, 2].map(|k| vertices[tri[k] as usize]);
                (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
            })
            .collect()
    }
}

/// Turns a series into a triangle list for one material.
pub trait Tessellator: Send + Sync + fmt::Debug {
    /// Attribute names this tessellator fills, in upload order.
    fn attributes(&self) -> &'static [&'static str];

    /// `style` is the material's fully resolved parameter set.
    fn tessellate(&self, points: &[Point], style: &ParameterSet) -> Tessellation;
}

/// Solid polyline: quads per segment, bridged at joints.
#[derive(Debug, Clone, Copy, Default)]
pub struct SolidStroke;

/// Dashed polyline: like [`SolidStroke`] plus a running length attribute.
#[derive(Debug, Clone, Copy, Default)]
pub struct DashedStroke;

/// Filled area between the series and a horizontal baseline.
///
/// The baseline is read from the `baseline` parameter (default 0).
#[derive(Debug, Clone, Copy, Default)]
pub struct FilledArea;

impl Tessellator for SolidStroke {
    fn attributes(&self) -> &'static [&'static str] {
        &[POSITION, TANGENT]
    }

    fn tessellate(&self, points: &[Point], _style: &ParameterSet) -> Tessellation {
        tessellate_stroke(points, false)
    }
}

impl Tessellator for DashedStroke {
    fn attributes(&self) -> &'static [&'static str] {
        &[POSITION, TANGENT, LINE_LENGTH]
    }

    fn tessellate(&self, points: &[Point], _style: &ParameterSet) -> Tessellation {
        tessellate_stroke(points, true)
    }
}

impl Tessellator for FilledArea {
    fn attributes(&self) -> &'static [&'static str] {
        &[POSITION]
    }

    fn tessellate(&self, points: &[Point], style: &ParameterSet) -> Tessellation {
        tessellate_area(points, style.scalar("baseline").unwrap_or(0.0) as f64)
    }
}

/// Tessellate a solid polyline.
pub fn tessellate_solid(points: &[Point]) -> Tessellation {
    tessellate_stroke(points, false)
}

/// Tessellate a dashed polyline.
pub fn tessellate_dashed(points: &[Point]) -> Tessellation {
    tessellate_stroke(points, true)
}

fn tessellate_stroke(points: &[Point], dashed: bool) -> Tessellation {
    let mut mesh = if dashed {
        Tessellation::with_attributes(&[POSITION, TANGENT, LINE_LENGTH])
    } else {
        Tessellation::with_attributes(&[POSITION, TANGENT])
    };

    let mut segments = 0u32;
    // Direction of the previous segment while the run is unbroken.
    let mut previous: Option<(f64, f64)> = None;
    let mut run_length = [0.0f64; 2];

    for window in points.windows(2) {
        let (Some((x0, y0)), Some((x1, y1))) = (window[0].coordinate(), window[1].coordinate())
        else {
            previous = None;
            run_length = [0.0; 2];
            continue;
        };

        let (dx, dy) = (x1 - x0, y1 - y0);
        let forward = [dx as f32, dy as f32];
        let backward = [-dx as f32, -dy as f32];

        // Leading pair at p0, trailing pair at p1. The first vertex of each
        // pair is offset to the left of the direction of travel.
        mesh.push(0, [x0 as f32, y0 as f32]);
        mesh.push(0, [x0 as f32, y0 as f32]);
        mesh.push(0, [x1 as f32, y1 as f32]);
        mesh.push(0, [x1 as f32, y1 as f32]);
        for tangent in [forward, backward, forward, backward] {
            mesh.push(1, tangent);
        }

        if dashed {
            let leading = [run_length[0] as f32, run_length[1] as f32];
            run_length[0] += dx.abs();
            run_length[1] += dy.abs();
            let trailing = [run_length[0] as f32, run_length[1] as f32];
            for length in [leading, leading, trailing, trailing] {
                mesh.push(2, length);
            }
        }

        let base = 4 * segments;
        if let Some((pdx, pdy)) = previous {
            // Joint patch between the previous trailing pair and this
            // leading pair. Its orientation depends on the turn direction.
            let (a, b, c, d) = (base - 2, base - 1, base, base + 1);
            let turn = pdx * dy - pdy * dx;
            if turn > 0.0 {
                mesh.indices.extend_from_slice(&[a, c, b, b, d, c]);
            } else {
                mesh.indices.extend_from_slice(&[a, b, c, b, c, d]);
            }
        }
        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 1, base + 3, base + 2]);

        previous = Some((dx, dy));
        segments += 1;
    }

    mesh
}

/// Tessellate the area between a series and `baseline`.
///
/// Each drawable point contributes itself and its projection onto the
/// baseline; consecutive columns form a quad. A gap restarts the run.
pub fn tessellate_area(points: &[Point], baseline: f64) -> Tessellation {
    let mut mesh = Tessellation::with_attributes(&[POSITION]);
    let mut columns = 0u32;
    let mut last: Option<(f64, f64)> = None;

    for point in points {
        let Some((x, y)) = point.coordinate() else {
            last = None;
            continue;
        };

        mesh.push(0, [x as f32, y as f32]);
        mesh.push(0, [x as f32, baseline as f32]);

        if let Some((lx, ly)) = last {
            let (top0, bottom0, top1, bottom1) =
                (2 * columns - 2, 2 * columns - 1, 2 * columns, 2 * columns + 1);
            // Triangles (top0, bottom0, top1) and (bottom0, bottom1, top1)
            // wind counter-clockwise when the curve is above the baseline
            // and the run goes left to right. Flip both otherwise.
            let above = (ly - baseline) + (y - baseline);
            let ccw = (x - lx) * above >= 0.0;
            if ccw {
                mesh.indices
                    .extend_from_slice(&[top0, bottom1, top1, top0, bottom0, bottom1]);
            } else {
                mesh.indices
                    .extend_from_slice(&[top0, top1, bottom1, top0, bottom1, bottom0]);
            }
        }

        last = Some((x, y));
        columns += 1;
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::points;

    #[test]
    fn test_single_segment_quad() {
        let mesh = tessellate_solid(&points([(0.0, 0.0), (1.0, 0.0)]));
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.indices(), &[0, 1, 2, 1, 3, 2]);
        assert_eq!(
            mesh.attribute(TANGENT).unwrap(),
            &[1.0, 0.0, -1.0, -0.0, 1.0, 0.0, -1.0, -0.0]
        );
    }

    #[test]
    fn test_single_point_is_empty() {
        let mesh = tessellate_solid(&points([(3.0, 4.0)]));
        assert!(mesh.is_empty());
        assert_eq!(mesh.vertex_count(), 0);
    }

    #[test]
    fn test_quad_winding_positive() {
        let mesh = tessellate_solid(&points([(0.0, 0.0), (2.0, 1.0)]));
        let expanded = mesh.expanded_positions(0.5).unwrap();
        assert!(mesh.signed_areas(&expanded).iter().all(|a| *a > 0.0));
    }

    #[test]
    fn test_left_turn_joint_positive() {
        let mesh = tessellate_solid(&points([(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]));
        let expanded = mesh.expanded_positions(0.1).unwrap();
        assert!(mesh.signed_areas(&expanded).iter().all(|a| *a > 0.0));
    }

    #[test]
    fn test_dash_lengths_accumulate_per_axis() {
        let mesh = tessellate_dashed(&points([(0.0, 0.0), (3.0, -4.0), (4.0, -4.0)]));
        let lengths = mesh.attribute(LINE_LENGTH).unwrap();
        assert_eq!(
            lengths,
            &[
                0.0, 0.0, 0.0, 0.0, 3.0, 4.0, 3.0, 4.0, //
                3.0, 4.0, 3.0, 4.0, 4.0, 4.0, 4.0, 4.0,
            ]
        );
    }

    /// Points from a pattern: `p` is a coordinate, `_` a gap.
    fn pattern(shape: &str) -> Vec<Point> {
        shape
            .chars()
            .enumerate()
            .map(|(i, c)| match c {
                '_' => Point::Gap,
                _ => Point::new(i as f64, ((i * i) % 5) as f64),
            })
            .collect()
    }

    #[test]
    fn test_stroke_sizes() {
        // A run of m points has m - 1 quads and m - 2 joints.
        let cases = [
            ("pp", 4, 6),
            ("ppp", 8, 18),
            ("pppp", 12, 30),
            ("pppppp", 20, 54),
            ("pp_ppp", 12, 24),
            ("ppp_ppp", 16, 36),
            ("_ppp_", 8, 18),
            ("pp__pp", 8, 12),
            ("p_p_p", 0, 0),
        ];
        for (shape, vertices, indices) in cases {
            let input = pattern(shape);
            for mesh in [tessellate_solid(&input), tessellate_dashed(&input)] {
                assert_eq!(mesh.vertex_count(), vertices, "vertices of {shape}");
                assert_eq!(mesh.index_count(), indices, "indices of {shape}");
                for (name, data) in mesh.attributes() {
                    assert_eq!(data.len(), 2 * vertices, "{name} of {shape}");
                }
                assert!(mesh.indices().iter().all(|i| (*i as usize) < vertices));
            }
        }
    }

    #[test]
    fn test_dash_lengths_reset_after_gap() {
        let input = vec![
            Point::new(0.0, 0.0),
            Point::new(3.0, 4.0),
            Point::Gap,
            Point::new(10.0, 10.0),
            Point::new(11.0, 10.0),
            Point::new(12.0, 12.0),
        ];
        let mesh = tessellate_dashed(&input);
        assert_eq!(
            mesh.attribute(LINE_LENGTH).unwrap(),
            &[
                0.0, 0.0, 0.0, 0.0, 3.0, 4.0, 3.0, 4.0, //
                0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, //
                1.0, 0.0, 1.0, 0.0, 2.0, 2.0, 2.0, 2.0,
            ]
        );
    }

    #[test]
    fn test_area_columns() {
        let style = ParameterSet::new().with("baseline", -1.0);
        let mesh = FilledArea.tessellate(&points([(0.0, 1.0), (1.0, 2.0)]), &style);
        assert_eq!(mesh.positions(), &[0.0, 1.0, 0.0, -1.0, 1.0, 2.0, 1.0, -1.0]);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn test_attribute_lists() {
        assert_eq!(SolidStroke.attributes(), &[POSITION, TANGENT]);
        assert_eq!(DashedStroke.attributes(), &[POSITION, TANGENT, LINE_LENGTH]);
        assert_eq!(FilledArea.attributes(), &[POSITION]);
    }
}

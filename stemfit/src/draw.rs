//! Visualization of detected edges.

use crate::{analysis::Analysis, fixed::fixed_mul};
use kurbo::{Line, Point};

/// RGBA color with 8 bits per component.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }
}

/// Colors used to distinguish edge types.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct EdgeColors {
    /// Edges that are part of a stem.
    pub linked: Color,
    /// Serif edges without a stem.
    pub serif: Color,
    /// Everything else.
    pub unlinked: Color,
}

impl Default for EdgeColors {
    fn default() -> Self {
        Self {
            linked: Color::rgb(0x00, 0x66, 0xff),
            serif: Color::rgb(0xff, 0x99, 0x00),
            unlinked: Color::rgb(0x80, 0x80, 0x80),
        }
    }
}

/// Receiver for edge lines.
pub trait EdgeCanvas {
    /// Draws a horizontal edge line in pixel coordinates with the y axis
    /// pointing up.
    fn draw_edge(&mut self, line: Line, color: Color);
}

/// Draws one line per vertical edge of the last analyzed glyph.
///
/// Each line spans the horizontal extent of the segments of the edge and
/// sits at the original scaled position of the edge.
pub fn draw_edges(analysis: &Analysis, canvas: &mut impl EdgeCanvas, colors: &EdgeColors) {
    let axis = analysis.axis();
    let x_scale = analysis.outline().scale.x_scale;
    for edge in &axis.edges {
        let Some((min, max)) = axis
            .edge_segments(edge)
            .filter_map(|ix| axis.segments.get(ix))
            .map(|segment| (segment.min_coord as i32, segment.max_coord as i32))
            .reduce(|(min1, max1), (min2, max2)| (min1.min(min2), max1.max(max2)))
        else {
            continue;
        };
        let color = if edge.link_ix.is_some() {
            colors.linked
        } else if edge.serif_ix.is_some() {
            colors.serif
        } else {
            colors.unlinked
        };
        let y = to_pixels(edge.opos);
        let line = Line::new(
            Point::new(to_pixels(fixed_mul(min, x_scale)), y),
            Point::new(to_pixels(fixed_mul(max, x_scale)), y),
        );
        canvas.draw_edge(line, color);
    }
}

fn to_pixels(value: i32) -> f64 {
    value as f64 / 64.0
}

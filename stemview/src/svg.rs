//! SVG rendering of outlines, points and edges.

use std::fmt::Write as _;

use kurbo::{Affine, BezPath, Line, Point};
use stemfit::{fixed::fixed_mul, Bounds, Color, EdgeCanvas, PointKind, RawOutline, RawPoint, Scale};

/// Distance in pixels between the glyph bounds and the image border.
const MARGIN: f64 = 10.0;
const POINT_RADIUS: f64 = 2.0;

/// Placement of the glyph pixel grid in the image.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct View {
    pub width: f64,
    pub height: f64,
    /// Image pixels per glyph pixel.
    pub zoom: f64,
    /// Image position of the glyph origin.
    pub origin: Point,
}

impl View {
    /// Fits bounds in 26.6 into an image of the given size.
    ///
    /// Partial pixels of the bounds count as whole pixels and the bottom
    /// left corner of the bounds is placed at the margin.
    pub fn fit(bounds: Bounds, width: f64, height: f64) -> Self {
        let x_min = bounds.x_min & !63;
        let y_min = bounds.y_min & !63;
        let x_max = (bounds.x_max + 63) & !63;
        let y_max = (bounds.y_max + 63) & !63;
        let zoom_for = |extent: f64, span: i32| {
            if span > 0 {
                (extent - 2.0 * MARGIN) * 64.0 / span as f64
            } else {
                1.0
            }
        };
        let zoom = zoom_for(width, x_max - x_min).min(zoom_for(height, y_max - y_min));
        let origin = Point::new(
            MARGIN - x_min as f64 / 64.0 * zoom,
            height - MARGIN + y_min as f64 / 64.0 * zoom,
        );
        Self {
            width,
            height,
            zoom,
            origin,
        }
    }

    /// Transform from glyph pixels with y up to image coordinates.
    pub fn transform(&self) -> Affine {
        Affine::new([
            self.zoom,
            0.0,
            0.0,
            -self.zoom,
            self.origin.x,
            self.origin.y,
        ])
    }
}

/// Scales font unit bounds to 26.6.
pub fn scaled_bounds(bounds: Bounds, scale: Scale) -> Bounds {
    Bounds {
        x_min: fixed_mul(bounds.x_min, scale.x_scale),
        y_min: fixed_mul(bounds.y_min, scale.y_scale),
        x_max: fixed_mul(bounds.x_max, scale.x_scale),
        y_max: fixed_mul(bounds.y_max, scale.y_scale),
    }
}

/// Bounds of the points of an outline.
pub fn point_bounds(outline: &RawOutline) -> Bounds {
    let mut points = outline.points.iter();
    let Some(first) = points.next() else {
        return Bounds::default();
    };
    points.fold(
        Bounds {
            x_min: first.x,
            y_min: first.y,
            x_max: first.x,
            y_max: first.y,
        },
        |bounds, point| Bounds {
            x_min: bounds.x_min.min(point.x),
            y_min: bounds.y_min.min(point.y),
            x_max: bounds.x_max.max(point.x),
            y_max: bounds.y_max.max(point.y),
        },
    )
}

/// Converts a point in 26.6 to pixels.
fn to_pixels(point: &RawPoint) -> Point {
    Point::new(point.x as f64 / 64.0, point.y as f64 / 64.0)
}

/// Builds a path in pixels from an outline in 26.6.
///
/// Consecutive quadratic control points imply an on-curve point halfway
/// between them.
pub fn outline_path(outline: &RawOutline) -> BezPath {
    let mut path = BezPath::new();
    for range in outline.contours() {
        if let Some(points) = outline.points.get(range) {
            append_contour(&mut path, points);
        }
    }
    path
}

fn append_contour(path: &mut BezPath, points: &[RawPoint]) {
    let len = points.len();
    // Start on the first on-curve point, or between the last and first
    // points when the contour only has quadratic controls
    let (start, first_ix, count) = match points
        .iter()
        .position(|point| point.kind == PointKind::OnCurve)
    {
        Some(ix) => (to_pixels(&points[ix]), ix + 1, len - 1),
        None => match (points.first(), points.last()) {
            (Some(first), Some(last)) => (to_pixels(last).midpoint(to_pixels(first)), 0, len),
            _ => return,
        },
    };
    path.move_to(start);
    let mut quad = None;
    let mut cubic = Vec::with_capacity(2);
    for point in (first_ix..first_ix + count).map(|ix| &points[ix % len]) {
        let p = to_pixels(point);
        match point.kind {
            PointKind::OnCurve => finish_segment(path, &mut quad, &mut cubic, p),
            PointKind::Quad => {
                if let Some(control) = quad.replace(p) {
                    path.quad_to(control, control.midpoint(p));
                }
            }
            PointKind::Cubic => cubic.push(p),
        }
    }
    finish_segment(path, &mut quad, &mut cubic, start);
    path.close_path();
}

/// Adds the segment ending at `to` using any pending control points.
fn finish_segment(path: &mut BezPath, quad: &mut Option<Point>, cubic: &mut Vec<Point>, to: Point) {
    if let Some(control) = quad.take() {
        path.quad_to(control, to);
    } else {
        match cubic.as_slice() {
            [] => path.line_to(to),
            [control] => path.quad_to(*control, to),
            [control0, control1, ..] => path.curve_to(*control0, *control1, to),
        }
    }
    cubic.clear();
}

/// Formats a color and its opacity as attributes named after `attr`.
fn paint(attr: &str, color: Color) -> String {
    format!(
        "{attr}=\"#{:02x}{:02x}{:02x}\" {attr}-opacity=\"{:.3}\"",
        color.r,
        color.g,
        color.b,
        color.a as f64 / 255.0
    )
}

/// Accumulates SVG elements for a single view.
pub struct SvgCanvas {
    view: View,
    body: String,
}

impl SvgCanvas {
    pub fn new(view: View) -> Self {
        Self {
            view,
            body: String::new(),
        }
    }

    /// Draws pixel grid lines with emphasized origin lines.
    pub fn draw_grid(&mut self, color: Color) {
        let View {
            width,
            height,
            zoom,
            origin,
        } = self.view;
        if zoom <= 0.0 {
            return;
        }
        // Offset by half a pixel so lines don't straddle two pixels
        let (x0, y0) = (origin.x - 0.5, origin.y - 0.5);
        let mut path = BezPath::new();
        let mut x = x0 - (x0 / zoom).floor() * zoom;
        while x < width {
            path.move_to((x, 0.0));
            path.line_to((x, height));
            x += zoom;
        }
        let mut y = y0 - (y0 / zoom).floor() * zoom;
        while y < height {
            path.move_to((0.0, y));
            path.line_to((width, y));
            y += zoom;
        }
        self.stroke(&path, Color { a: 77, ..color });
        let mut origin_path = BezPath::new();
        origin_path.move_to((x0, 0.0));
        origin_path.line_to((x0, height));
        origin_path.move_to((0.0, y0));
        origin_path.line_to((width, y0));
        self.stroke(&origin_path, Color { a: 204, ..color });
    }

    /// Draws the outline of a glyph in 26.6.
    pub fn draw_outline(&mut self, outline: &RawOutline, color: Color) {
        let path = self.view.transform() * outline_path(outline);
        self.stroke(&path, color);
    }

    /// Draws a marker for every point of a glyph in 26.6.
    pub fn draw_points(&mut self, outline: &RawOutline, on_curve: Color, control: Color) {
        let transform = self.view.transform();
        for point in &outline.points {
            let color = if point.kind == PointKind::OnCurve {
                on_curve
            } else {
                control
            };
            let center = transform * to_pixels(point);
            let _ = writeln!(
                self.body,
                "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{POINT_RADIUS}\" {}/>",
                center.x,
                center.y,
                paint("fill", color),
            );
        }
    }

    fn stroke(&mut self, path: &BezPath, color: Color) {
        if path.elements().is_empty() {
            return;
        }
        let _ = writeln!(
            self.body,
            "<path d=\"{}\" fill=\"none\" {} stroke-width=\"1\"/>",
            path.to_svg(),
            paint("stroke", color),
        );
    }

    /// Returns the complete document.
    pub fn finish(self) -> String {
        let View { width, height, .. } = self.view;
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" \
             viewBox=\"0 0 {width} {height}\">\n\
             <rect width=\"100%\" height=\"100%\" fill=\"#ffffff\"/>\n{}</svg>\n",
            self.body
        )
    }
}

impl EdgeCanvas for SvgCanvas {
    fn draw_edge(&mut self, line: Line, color: Color) {
        let line = self.view.transform() * line;
        let _ = writeln!(
            self.body,
            "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" {} stroke-width=\"2\"/>",
            line.p0.x,
            line.p0.y,
            line.p1.x,
            line.p1.y,
            paint("stroke", color),
        );
    }
}

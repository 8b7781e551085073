//! Outline representation and point classification.

use crate::{
    collections::SmallVec,
    fixed::{derived_constant, fixed_mul},
    provider::{PointKind, RawOutline, RawPoint, Scale},
    Error,
};

/// Hinting directions.
///
/// The values are such that `dir1 + dir2 == 0` when the directions are
/// opposite.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
#[repr(i8)]
pub enum Direction {
    #[default]
    None = 4,
    Right = 1,
    Left = -1,
    Up = 2,
    Down = -2,
}

impl Direction {
    /// Computes a direction from a vector.
    ///
    /// Returns [`Direction::None`] unless the longer arm of the vector is
    /// more than 14 times the length of the shorter one.
    pub fn new(dx: i32, dy: i32) -> Self {
        let (dir, long_arm, short_arm) = if dy >= dx {
            if dy >= -dx {
                (Direction::Up, dy, dx)
            } else {
                (Direction::Left, -dx, dy)
            }
        } else if dy >= -dx {
            (Direction::Right, dx, dy)
        } else {
            (Direction::Down, -dy, dx)
        };
        if long_arm <= 14 * short_arm.abs() {
            Direction::None
        } else {
            dir
        }
    }

    pub fn is_opposite(self, other: Self) -> bool {
        self as i8 + other as i8 == 0
    }

    pub fn is_same_axis(self, other: Self) -> bool {
        (self as i8).abs() == (other as i8).abs()
    }

    /// Returns the reversed direction.
    pub fn reverse(self) -> Self {
        match self {
            Self::None => Self::None,
            Self::Right => Self::Left,
            Self::Left => Self::Right,
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }
}

/// Fill direction of an outline.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Orientation {
    /// TrueType style.
    Clockwise,
    /// PostScript style.
    CounterClockwise,
}

/// Outline point with context for analysis and hinting.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct Point {
    /// Describes the type and hinting state of the point.
    pub flags: u8,
    /// X coordinate in font units.
    pub fx: i32,
    /// Y coordinate in font units.
    pub fy: i32,
    /// Scaled X coordinate.
    pub ox: i32,
    /// Scaled Y coordinate.
    pub oy: i32,
    /// Hinted X coordinate.
    pub x: i32,
    /// Hinted Y coordinate.
    pub y: i32,
    /// Direction of inwards vector.
    pub in_dir: Direction,
    /// Direction of outwards vector.
    pub out_dir: Direction,
    /// Position along the axis currently being analyzed.
    pub u: i32,
    /// Coordinate orthogonal to `u`.
    pub v: i32,
    /// Index of the next point that is not part of a near cluster.
    pub next_far_ix: u16,
    /// Index of the previous point that is not part of a near cluster.
    pub prev_far_ix: u16,
    /// Index of the next point in the contour.
    pub next_ix: u16,
    /// Index of the previous point in the contour.
    pub prev_ix: u16,
}

/// Point type flags.
impl Point {
    /// Quadratic control point.
    pub const QUAD: u8 = 1 << 0;
    /// Cubic control point.
    pub const CUBIC: u8 = 1 << 1;
    /// Any control point.
    pub const CONTROL: u8 = Self::QUAD | Self::CUBIC;
    /// Adjusted by the hinter.
    pub const DONE: u8 = 1 << 2;
    /// Candidate for weak intepolation.
    pub const WEAK_INTERPOLATION: u8 = 1 << 4;
    /// Distance to next point is very small.
    pub const NEAR: u8 = 1 << 5;
}

impl Point {
    pub fn is_on_curve(&self) -> bool {
        self.flags & Self::CONTROL == 0
    }

    pub fn is_weak(&self) -> bool {
        self.flags & Self::WEAK_INTERPOLATION != 0
    }

    pub fn is_done(&self) -> bool {
        self.flags & Self::DONE != 0
    }

    /// Index of next point in contour.
    pub fn next(&self) -> usize {
        self.next_ix as usize
    }

    /// Index of previous point in contour.
    pub fn prev(&self) -> usize {
        self.prev_ix as usize
    }

    pub fn kind(&self) -> PointKind {
        if self.flags & Self::QUAD != 0 {
            PointKind::Quad
        } else if self.flags & Self::CUBIC != 0 {
            PointKind::Cubic
        } else {
            PointKind::OnCurve
        }
    }
}

/// Closed range of point indices forming a contour.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct Contour {
    first_ix: u16,
    last_ix: u16,
}

impl Contour {
    pub fn new(first_ix: u16, last_ix: u16) -> Self {
        Self { first_ix, last_ix }
    }

    pub fn first(self) -> usize {
        self.first_ix as usize
    }

    pub fn last(self) -> usize {
        self.last_ix as usize
    }

    /// Index of the point after `index`, wrapping to the first point.
    pub fn next(self, index: usize) -> usize {
        if index >= self.last() {
            self.first()
        } else {
            index + 1
        }
    }

    /// Index of the point before `index`, wrapping to the last point.
    pub fn prev(self, index: usize) -> usize {
        if index <= self.first() {
            self.last()
        } else {
            index - 1
        }
    }

    pub fn range(self) -> core::ops::Range<usize> {
        self.first()..self.last() + 1
    }

    /// Number of points; a contour always has at least one.
    pub(crate) fn len(self) -> usize {
        self.last() - self.first() + 1
    }
}

// Inline capacities; anything larger moves to the heap.
const MAX_INLINE_POINTS: usize = 96;
const MAX_INLINE_CONTOURS: usize = 8;

/// Point and contour model of a single glyph.
#[derive(Clone, Default, Debug)]
pub struct Outline {
    pub units_per_em: i32,
    pub scale: Scale,
    pub orientation: Option<Orientation>,
    pub points: SmallVec<Point, MAX_INLINE_POINTS>,
    pub contours: SmallVec<Contour, MAX_INLINE_CONTOURS>,
}

impl Outline {
    /// Fills the outline from unscaled points and classifies each point.
    pub fn fill(&mut self, raw: &RawOutline, units_per_em: u16, scale: Scale) -> Result<(), Error> {
        self.clear();
        validate(raw)?;
        self.units_per_em = units_per_em as i32;
        self.scale = scale;
        self.points.try_reserve(raw.points.len())?;
        self.contours.try_reserve(raw.contour_ends.len())?;
        for range in raw.contours() {
            let first_ix = range.start as u16;
            let last_ix = (range.end - 1) as u16;
            self.contours.try_push(Contour::new(first_ix, last_ix))?;
            for (ix, raw_point) in raw.points[range.clone()].iter().enumerate() {
                let ix = range.start + ix;
                let flags = match raw_point.kind {
                    PointKind::Quad => Point::QUAD,
                    PointKind::Cubic => Point::CUBIC,
                    PointKind::OnCurve => 0,
                };
                let ox = fixed_mul(raw_point.x, scale.x_scale);
                let oy = fixed_mul(raw_point.y, scale.y_scale);
                self.points.try_push(Point {
                    flags,
                    fx: raw_point.x,
                    fy: raw_point.y,
                    ox,
                    oy,
                    x: ox,
                    y: oy,
                    next_ix: if ix == range.end - 1 {
                        first_ix
                    } else {
                        ix as u16 + 1
                    },
                    prev_ix: if ix == range.start {
                        last_ix
                    } else {
                        ix as u16 - 1
                    },
                    ..Default::default()
                })?;
            }
        }
        self.compute_orientation();
        // Heuristic value
        let near_limit = derived_constant(self.units_per_em, 20);
        self.mark_near_points(near_limit);
        self.compute_directions(near_limit);
        self.simplify_topology();
        self.check_remaining_weak_points();
        log::trace!(
            "filled outline with {} points in {} contours, orientation {:?}",
            self.points.len(),
            self.contours.len(),
            self.orientation
        );
        Ok(())
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.contours.clear();
        self.orientation = None;
    }

    /// Writes the current coordinates and curve kinds to `raw`.
    pub fn write(&self, raw: &mut RawOutline) {
        raw.clear();
        raw.points.extend(
            self.points
                .iter()
                .map(|point| RawPoint::new(point.x, point.y, point.kind())),
        );
        raw.contour_ends
            .extend(self.contours.iter().map(|contour| contour.last()));
    }
}

impl Outline {
    /// Computes the fill direction from the signed area of all contours.
    fn compute_orientation(&mut self) {
        let mut area = 0i64;
        for contour in &self.contours {
            let points = &self.points[contour.range()];
            let Some(mut prev) = points.last() else {
                continue;
            };
            for point in points {
                area += (point.fy - prev.fy) as i64 * (point.fx + prev.fx) as i64;
                prev = point;
            }
        }
        self.orientation = match area.cmp(&0) {
            core::cmp::Ordering::Greater => Some(Orientation::CounterClockwise),
            core::cmp::Ordering::Less => Some(Orientation::Clockwise),
            core::cmp::Ordering::Equal => None,
        };
    }

    /// Flags the earlier point of each pair that is very close together.
    fn mark_near_points(&mut self, near_limit: i32) {
        let points = self.points.as_mut_slice();
        for contour in &self.contours {
            let mut prev_ix = contour.last();
            for ix in contour.range() {
                let point = points[ix];
                let prev = &mut points[prev_ix];
                let out_x = point.fx - prev.fx;
                let out_y = point.fy - prev.fy;
                if out_x.abs() + out_y.abs() < near_limit {
                    prev.flags |= Point::NEAR;
                }
                prev_ix = ix;
            }
        }
    }

    /// Computes directions of in and out vectors.
    ///
    /// Vectors between near points are accumulated until they exceed the
    /// near limit and the points in between are flagged weak.
    fn compute_directions(&mut self, near_limit: i32) {
        let near_limit2 = 2 * near_limit - 1;
        let points = self.points.as_mut_slice();
        for contour in &self.contours {
            // Walk backward to find the first non-near point
            let start_ix = contour.first();
            let mut point_ix = start_ix;
            let mut prev_ix = contour.prev(point_ix);
            while prev_ix != start_ix {
                let point = &points[point_ix];
                let prev = &points[prev_ix];
                let out_x = point.fx - prev.fx;
                let out_y = point.fy - prev.fy;
                // The accumulated vector may point the other way so compare
                // against twice the limit
                if out_x.abs() + out_y.abs() >= near_limit2 {
                    break;
                }
                point_ix = prev_ix;
                prev_ix = contour.prev(prev_ix);
            }
            let first_ix = point_ix;
            let mut cur_ix = first_ix;
            points[cur_ix].next_far_ix = first_ix as u16;
            points[first_ix].prev_far_ix = cur_ix as u16;
            let mut out_x = 0;
            let mut out_y = 0;
            let mut next_ix = first_ix;
            loop {
                let point_ix = next_ix;
                next_ix = contour.next(point_ix);
                out_x += points[next_ix].fx - points[point_ix].fx;
                out_y += points[next_ix].fy - points[point_ix].fy;
                if out_x.abs() + out_y.abs() < near_limit {
                    points[next_ix].flags |= Point::WEAK_INTERPOLATION;
                } else {
                    points[cur_ix].next_far_ix = next_ix as u16;
                    points[next_ix].prev_far_ix = cur_ix as u16;
                    let out_dir = Direction::new(out_x, out_y);
                    points[cur_ix].out_dir = out_dir;
                    // Intermediate points take the accumulated direction
                    let mut inter_ix = contour.next(cur_ix);
                    while inter_ix != next_ix {
                        let point = &mut points[inter_ix];
                        point.in_dir = out_dir;
                        point.out_dir = out_dir;
                        inter_ix = contour.next(inter_ix);
                    }
                    points[next_ix].in_dir = out_dir;
                    cur_ix = next_ix;
                    points[cur_ix].next_far_ix = first_ix as u16;
                    points[first_ix].prev_far_ix = cur_ix as u16;
                    out_x = 0;
                    out_y = 0;
                }
                if next_ix == first_ix {
                    break;
                }
            }
        }
    }

    /// Flags points between non-axis-aligned vectors pointing into the
    /// same quadrant as weak, so that local extrema are found reliably.
    fn simplify_topology(&mut self) {
        let points = self.points.as_mut_slice();
        for ix in 0..points.len() {
            let point = points[ix];
            if point.is_weak() {
                continue;
            }
            if point.in_dir == Direction::None && point.out_dir == Direction::None {
                let next_ix = point.next_far_ix as usize;
                let prev_ix = point.prev_far_ix as usize;
                let next = points[next_ix];
                let prev = points[prev_ix];
                let in_x = point.fx - prev.fx;
                let in_y = point.fy - prev.fy;
                let out_x = next.fx - point.fx;
                let out_y = next.fy - point.fy;
                if (in_x ^ out_x) >= 0 && (in_y ^ out_y) >= 0 {
                    points[ix].flags |= Point::WEAK_INTERPOLATION;
                    points[prev_ix].next_far_ix = next_ix as u16;
                    points[next_ix].prev_far_ix = prev_ix as u16;
                }
            }
        }
    }

    /// Flags the remaining weak points: control points, points in the
    /// middle of a straight run, flat corners and spikes.
    fn check_remaining_weak_points(&mut self) {
        let points = self.points.as_mut_slice();
        for ix in 0..points.len() {
            let point = points[ix];
            if point.is_weak() {
                continue;
            }
            let make_weak = if !point.is_on_curve() {
                true
            } else if point.out_dir == point.in_dir {
                if point.out_dir != Direction::None {
                    true
                } else {
                    let next_ix = point.next_far_ix as usize;
                    let prev_ix = point.prev_far_ix as usize;
                    let next = points[next_ix];
                    let prev = points[prev_ix];
                    let is_flat = is_corner_flat(
                        point.fx - prev.fx,
                        point.fy - prev.fy,
                        next.fx - point.fx,
                        next.fy - point.fy,
                    );
                    if is_flat {
                        points[prev_ix].next_far_ix = next_ix as u16;
                        points[next_ix].prev_far_ix = prev_ix as u16;
                    }
                    is_flat
                }
            } else {
                point.in_dir.is_opposite(point.out_dir)
            };
            if make_weak {
                points[ix].flags |= Point::WEAK_INTERPOLATION;
            }
        }
    }
}

fn validate(raw: &RawOutline) -> Result<(), Error> {
    if raw.points.len() > u16::MAX as usize {
        return Err(Error::InvalidOutline(format!(
            "too many points: {}",
            raw.points.len()
        )));
    }
    let mut prev_end: Option<usize> = None;
    for (ix, &end) in raw.contour_ends.iter().enumerate() {
        if end >= raw.points.len() || prev_end.is_some_and(|prev| end <= prev) {
            return Err(Error::InvalidOutline(format!(
                "bad end point {end} for contour {ix}"
            )));
        }
        prev_end = Some(end);
    }
    let covered = prev_end.map(|end| end + 1).unwrap_or_default();
    if covered != raw.points.len() {
        return Err(Error::InvalidOutline(format!(
            "{} points outside of any contour",
            raw.points.len() - covered
        )));
    }
    Ok(())
}

/// Returns true if the corner formed by the two vectors is nearly flat,
/// using an octagonal approximation of the hypotenuse.
fn is_corner_flat(in_x: i32, in_y: i32, out_x: i32, out_y: i32) -> bool {
    let ax = in_x + out_x;
    let ay = in_y + out_y;
    fn hypot(x: i32, y: i32) -> i32 {
        let x = x.abs();
        let y = y.abs();
        if x > y {
            x + ((3 * y) >> 3)
        } else {
            y + ((3 * x) >> 3)
        }
    }
    let d_in = hypot(in_x, in_y);
    let d_out = hypot(out_x, out_y);
    let d_hypot = hypot(ax, ay);
    (d_in + d_out - d_hypot) < (d_hypot >> 4)
}

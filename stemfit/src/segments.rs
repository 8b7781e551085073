//! Segment computation and linking.
//!
//! A segment is a series of consecutive points that are appropriately
//! aligned along a coordinate axis.
//!
//! The linking stage associates pairs of segments to form stems and
//! identifies serifs with a post-process pass.

use crate::{
    axis::{Axis, Dimension, Segment},
    fixed::derived_constant,
    outline::{Outline, Point},
    Error,
};

// Bounds for score, position and coordinate values.
const MAX_SCORE: i32 = 32000;
const MIN_SCORE: i32 = -32000;

/// Contours producing more segments than this are treated as noise.
const MAX_SEGMENTS: usize = 1000;

/// Computes the segments for the given axis.
///
/// Returns `false` and leaves the axis without segments if the outline is
/// too complex.
pub fn compute_segments(outline: &mut Outline, axis: &mut Axis) -> Result<bool, Error> {
    assign_point_uvs(outline, axis.dim);
    if !build_segments(outline, axis)? {
        log::debug!("too many segments, discarding all of them");
        return Ok(false);
    }
    adjust_segment_heights(outline, axis);
    Ok(true)
}

/// Links segments to form stems and serifs.
///
/// A positive `max_distance` rejects candidate stems wider than that many
/// font units.
pub fn link_segments(outline: &Outline, axis: &mut Axis, max_distance: i32) {
    // Heuristic value to set up a minimum for overlapping
    let len_threshold = derived_constant(outline.units_per_em, 8).max(1);
    // Heuristic value to weight lengths
    let len_score = derived_constant(outline.units_per_em, 6000);
    // Compare each segment to the others.. O(n^2)
    let segments = axis.segments.as_mut_slice();
    for ix1 in 0..segments.len() {
        let seg1 = segments[ix1];
        if seg1.dir != axis.major_dir {
            continue;
        }
        let pos1 = seg1.pos as i32;
        // Search for stems having opposite directions with seg1 to the
        // "left" of seg2
        for ix2 in 0..segments.len() {
            let seg1 = segments[ix1];
            let seg2 = segments[ix2];
            let pos2 = seg2.pos as i32;
            if !seg1.dir.is_opposite(seg2.dir) || pos2 <= pos1 {
                continue;
            }
            // Note: the min/max functions chosen here are intentional
            let min = seg1.min_coord.max(seg2.min_coord) as i32;
            let max = seg1.max_coord.min(seg2.max_coord) as i32;
            // Overlap along the segments
            let len = max - min;
            if len < len_threshold {
                continue;
            }
            let dist = pos2 - pos1;
            if max_distance > 0 && dist > max_distance {
                continue;
            }
            // Narrow stems with a long overlap score best
            let score = dist + len_score / len;
            if score < seg1.score {
                let seg1 = &mut segments[ix1];
                seg1.score = score;
                seg1.link_ix = Some(ix2 as u16);
            }
            if score < seg2.score {
                let seg2 = &mut segments[ix2];
                seg2.score = score;
                seg2.link_ix = Some(ix1 as u16);
            }
        }
    }
    // Now compute "serif" segments
    for ix1 in 0..segments.len() {
        let Some(ix2) = segments[ix1].link_ix else {
            continue;
        };
        let seg2_link = segments[ix2 as usize].link_ix;
        if seg2_link != Some(ix1 as u16) {
            let seg1 = &mut segments[ix1];
            seg1.link_ix = None;
            seg1.serif_ix = seg2_link;
        }
    }
}

/// Set the (u, v) values to font unit coords for each point depending
/// on the axis dimension.
fn assign_point_uvs(outline: &mut Outline, dim: Dimension) {
    if dim == Axis::HORIZONTAL {
        for point in &mut outline.points {
            point.u = point.fx;
            point.v = point.fy;
        }
    } else {
        for point in &mut outline.points {
            point.u = point.fy;
            point.v = point.fx;
        }
    }
}

/// What to do when a closing segment starts where the previous one ended.
enum MergeAction {
    /// Same direction: the two become a single segment.
    Unify,
    /// The previous segment is longer and absorbs the current one.
    KeepPrevious,
    /// The current segment is longer and replaces the previous one.
    KeepCurrent,
}

/// Build the set of segments for each contour.
fn build_segments(outline: &mut Outline, axis: &mut Axis) -> Result<bool, Error> {
    let flat_threshold = outline.units_per_em / 14;
    axis.segments.clear();
    let major_dir = axis.major_dir;
    let mut segment_dir = major_dir;
    let points = outline.points.as_slice();
    for contour in &outline.contours {
        let is_single_point_contour = contour.len() == 1;
        let mut point_ix = contour.first();
        let mut last_ix = contour.prev(point_ix);
        let mut state = State::default();
        let mut prev_state = state;
        let mut prev_segment_ix: Option<usize> = None;
        let mut segment_ix = 0;
        // Check if we're starting on an edge and if so, find
        // the starting point
        if points[point_ix].out_dir.is_same_axis(major_dir)
            && points[last_ix].out_dir.is_same_axis(major_dir)
        {
            last_ix = point_ix;
            loop {
                point_ix = contour.prev(point_ix);
                if !points[point_ix].out_dir.is_same_axis(major_dir) {
                    point_ix = contour.next(point_ix);
                    break;
                }
                if point_ix == last_ix {
                    break;
                }
            }
        }
        last_ix = point_ix;
        let mut on_edge = false;
        let mut passed = false;
        loop {
            if on_edge {
                let point = points[point_ix];
                state.add_point(&point);
                if point.out_dir != segment_dir || point_ix == last_ix {
                    let prev_ix = prev_segment_ix
                        .filter(|&ix| axis.segments[segment_ix].first_ix == axis.segments[ix].last_ix);
                    match prev_ix {
                        None => {
                            // We are leaving an edge, so close the segment
                            let segment = &mut axis.segments[segment_ix];
                            segment.last_ix = point_ix as u16;
                            state.apply_to_segment(segment, flat_threshold);
                            prev_segment_ix = Some(segment_ix);
                            prev_state = state;
                        }
                        Some(prev_ix) => {
                            // The segment continues the previous one, so
                            // merge them
                            let prev_segment = axis.segments[prev_ix];
                            let action = if prev_segment.last_point(points).in_dir == point.in_dir {
                                MergeAction::Unify
                            } else if (prev_state.max_coord - prev_state.min_coord).abs()
                                > (state.max_coord - state.min_coord).abs()
                            {
                                MergeAction::KeepPrevious
                            } else {
                                MergeAction::KeepCurrent
                            };
                            match action {
                                MergeAction::Unify => {
                                    state.merge(&prev_state);
                                    let prev_segment = &mut axis.segments[prev_ix];
                                    prev_segment.last_ix = point_ix as u16;
                                    state.apply_to_segment(prev_segment, flat_threshold);
                                }
                                MergeAction::KeepPrevious => {
                                    prev_state.min_pos = prev_state.min_pos.min(state.min_pos);
                                    prev_state.max_pos = prev_state.max_pos.max(state.max_pos);
                                    let prev_segment = &mut axis.segments[prev_ix];
                                    prev_segment.last_ix = point_ix as u16;
                                    prev_state.apply_position(prev_segment);
                                }
                                MergeAction::KeepCurrent => {
                                    state.min_pos = state.min_pos.min(prev_state.min_pos);
                                    state.max_pos = state.max_pos.max(prev_state.max_pos);
                                    let mut segment = axis.segments[segment_ix];
                                    segment.last_ix = point_ix as u16;
                                    state.apply_to_segment(&mut segment, flat_threshold);
                                    axis.segments[prev_ix] = segment;
                                    prev_state = state;
                                }
                            }
                            axis.segments.pop();
                        }
                    }
                    on_edge = false;
                }
            }
            if point_ix == last_ix {
                if passed {
                    break;
                }
                passed = true;
            }
            let point = points[point_ix];
            if !on_edge && (point.out_dir.is_same_axis(major_dir) || is_single_point_contour) {
                if axis.segments.len() > MAX_SEGMENTS {
                    axis.segments.clear();
                    return Ok(false);
                }
                segment_ix = axis.segments.len();
                segment_dir = point.out_dir;
                let mut segment = Segment {
                    dir: segment_dir,
                    first_ix: point_ix as u16,
                    last_ix: point_ix as u16,
                    score: MAX_SCORE,
                    ..Default::default()
                };
                state.start(&point);
                on_edge = true;
                if is_single_point_contour {
                    segment.pos = state.min_pos as i16;
                    if !point.is_on_curve() {
                        segment.flags |= Segment::ROUND;
                    }
                    segment.min_coord = point.v as i16;
                    segment.max_coord = point.v as i16;
                    segment.height = 0;
                    on_edge = false;
                }
                axis.segments.try_push(segment)?;
            }
            point_ix = contour.next(point_ix);
        }
    }
    Ok(true)
}

/// Slightly increase the height of segments when it makes sense to better
/// detect and ignore serifs.
fn adjust_segment_heights(outline: &mut Outline, axis: &mut Axis) {
    let points = outline.points.as_slice();
    for segment in &mut axis.segments {
        let first = segment.first_point(points);
        let last = segment.last_point(points);
        fn adjust_height(segment: &mut Segment, v1: i32, v2: i32) {
            segment.height = (segment.height as i32 + ((v1 - v2) >> 1)) as i16;
        }
        let prev = &points[first.prev()];
        let next = &points[last.next()];
        if first.v < last.v {
            if prev.v < first.v {
                adjust_height(segment, first.v, prev.v);
            }
            if next.v > last.v {
                adjust_height(segment, next.v, last.v);
            }
        } else {
            if prev.v > first.v {
                adjust_height(segment, prev.v, first.v);
            }
            if next.v < last.v {
                adjust_height(segment, last.v, next.v);
            }
        }
    }
}

/// Capture current and previous state while computing segments.
///
/// Values measured along a segment (point.v) are called "coordinates" and
/// values orthogonal to it (point.u) are called "positions"
#[derive(Copy, Clone)]
struct State {
    min_pos: i32,
    max_pos: i32,
    min_coord: i32,
    max_coord: i32,
    min_flags: u8,
    max_flags: u8,
    min_on_coord: i32,
    max_on_coord: i32,
}

impl Default for State {
    fn default() -> Self {
        Self {
            min_pos: MAX_SCORE,
            max_pos: MIN_SCORE,
            min_coord: MAX_SCORE,
            max_coord: MIN_SCORE,
            min_flags: 0,
            max_flags: 0,
            min_on_coord: MAX_SCORE,
            max_on_coord: MIN_SCORE,
        }
    }
}

impl State {
    /// Resets the state to cover a single point.
    fn start(&mut self, point: &Point) {
        self.min_pos = point.u;
        self.max_pos = point.u;
        self.min_coord = point.v;
        self.max_coord = point.v;
        self.min_flags = point.flags;
        self.max_flags = point.flags;
        if point.is_on_curve() {
            self.min_on_coord = point.v;
            self.max_on_coord = point.v;
        } else {
            self.min_on_coord = MAX_SCORE;
            self.max_on_coord = MIN_SCORE;
        }
    }

    fn add_point(&mut self, point: &Point) {
        self.min_pos = self.min_pos.min(point.u);
        self.max_pos = self.max_pos.max(point.u);
        let v = point.v;
        if v < self.min_coord {
            self.min_coord = v;
            self.min_flags = point.flags;
        }
        if v > self.max_coord {
            self.max_coord = v;
            self.max_flags = point.flags;
        }
        if point.is_on_curve() {
            self.min_on_coord = self.min_on_coord.min(v);
            self.max_on_coord = self.max_on_coord.max(v);
        }
    }

    /// Extends all ranges to include those of `other`.
    fn merge(&mut self, other: &State) {
        self.min_pos = other.min_pos.min(self.min_pos);
        self.max_pos = other.max_pos.max(self.max_pos);
        if other.min_coord < self.min_coord {
            self.min_coord = other.min_coord;
            self.min_flags = other.min_flags;
        }
        if other.max_coord > self.max_coord {
            self.max_coord = other.max_coord;
            self.max_flags = other.max_flags;
        }
        self.min_on_coord = other.min_on_coord.min(self.min_on_coord);
        self.max_on_coord = other.max_on_coord.max(self.max_on_coord);
    }

    fn apply_position(&self, segment: &mut Segment) {
        segment.pos = ((self.min_pos + self.max_pos) >> 1) as i16;
        segment.delta = ((self.max_pos - self.min_pos) >> 1) as i16;
    }

    fn apply_to_segment(&self, segment: &mut Segment, flat_threshold: i32) {
        self.apply_position(segment);
        // A segment is round if either end point is a
        // control and the length of the on points in
        // between fits within a heuristic limit.
        if ((self.min_flags | self.max_flags) & Point::CONTROL) != 0
            && (self.max_on_coord - self.min_on_coord) < flat_threshold
        {
            segment.flags |= Segment::ROUND;
        } else {
            segment.flags &= !Segment::ROUND;
        }
        segment.min_coord = self.min_coord as i16;
        segment.max_coord = self.max_coord as i16;
        segment.height = segment.max_coord - segment.min_coord;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        outline::{
            tests::{raw_outline, rectangle},
            Direction,
        },
        provider::{PointKind, Scale},
    };
    use pretty_assertions::assert_eq;

    fn segment_fields(axis: &Axis) -> Vec<(Direction, i16, i16, i16, i16, Option<u16>, Option<u16>)> {
        axis.segments
            .iter()
            .map(|seg| {
                (
                    seg.dir,
                    seg.pos,
                    seg.min_coord,
                    seg.max_coord,
                    seg.height,
                    seg.link_ix,
                    seg.serif_ix,
                )
            })
            .collect()
    }

    fn analyze(
        contours: &[&[(i32, i32, PointKind)]],
        dim: Dimension,
        limit: i32,
    ) -> (Outline, Axis) {
        let raw = raw_outline(contours);
        let mut outline = Outline::default();
        outline.fill(&raw, 1000, Scale::UNIT).unwrap();
        let mut axis = Axis::new(dim, outline.orientation);
        assert!(compute_segments(&mut outline, &mut axis).unwrap());
        link_segments(&outline, &mut axis, limit);
        (outline, axis)
    }

    #[test]
    fn rectangle_horizontal_segments() {
        let (_, axis) = analyze(&[&rectangle(0, 0, 100, 700)], Axis::VERTICAL, 0);
        // top runs right, bottom runs left
        let expected = [
            (Direction::Right, 700, 0, 100, 100, Some(1), None),
            (Direction::Left, 0, 0, 100, 100, Some(0), None),
        ];
        assert_eq!(segment_fields(&axis), expected);
        // score is the distance plus the length penalty
        assert_eq!(axis.segments[0].score, 700 + 2929 / 100);
        assert_eq!(axis.segments[1].first_ix, 3);
        assert_eq!(axis.segments[1].last_ix, 0);
    }

    #[test]
    fn rectangle_vertical_segments() {
        let (_, axis) = analyze(&[&rectangle(0, 0, 100, 700)], Axis::HORIZONTAL, 0);
        let expected = [
            (Direction::Up, 0, 0, 700, 700, Some(1), None),
            (Direction::Down, 100, 0, 700, 700, Some(0), None),
        ];
        assert_eq!(segment_fields(&axis), expected);
    }

    #[test]
    fn linking_limit_rejects_wide_stems() {
        let (_, axis) = analyze(&[&rectangle(0, 0, 100, 700)], Axis::VERTICAL, 600);
        assert!(axis.segments.iter().all(|seg| seg.link_ix.is_none()));
        let (_, axis) = analyze(&[&rectangle(0, 0, 100, 700)], Axis::VERTICAL, 700);
        assert_eq!(axis.segments[0].link_ix, Some(1));
    }

    #[test]
    fn round_segments() {
        use PointKind::*;
        // The top is a pair of quadratic arcs meeting at a flat extremum
        let contour = [
            (0, 0, OnCurve),
            (0, 600, OnCurve),
            (0, 700, Quad),
            (50, 700, OnCurve),
            (100, 700, Quad),
            (100, 600, OnCurve),
            (100, 0, OnCurve),
        ];
        let (_, axis) = analyze(&[&contour], Axis::VERTICAL, 0);
        let flags = axis
            .segments
            .iter()
            .map(|seg| (seg.dir, seg.flags))
            .collect::<Vec<_>>();
        assert_eq!(
            flags,
            [(Direction::Right, Segment::ROUND), (Direction::Left, 0)]
        );
        assert_eq!(axis.segments[0].pos, 700);
        assert_eq!((axis.segments[0].first_ix, axis.segments[0].last_ix), (2, 4));
    }

    /// Segment directions, ranges and end points without linking.
    fn merged_segments(
        outline: &mut Outline,
    ) -> Vec<(Direction, i16, i16, i16, i16, u16, u16)> {
        let mut axis = Axis::new(Axis::VERTICAL, outline.orientation);
        assert!(compute_segments(outline, &mut axis).unwrap());
        axis.segments
            .iter()
            .map(|seg| {
                (
                    seg.dir,
                    seg.pos,
                    seg.min_coord,
                    seg.max_coord,
                    seg.height,
                    seg.first_ix,
                    seg.last_ix,
                )
            })
            .collect()
    }

    fn filled(contour: &[(i32, i32, PointKind)]) -> Outline {
        let mut outline = Outline::default();
        outline
            .fill(&raw_outline(&[contour]), 1000, Scale::UNIT)
            .unwrap();
        outline
    }

    #[test]
    fn reversal_keeps_longer_previous_segment() {
        use PointKind::OnCurve;
        // The top runs right to 300 and comes back to 100 from point 2
        let contour = [
            (0, 0, OnCurve),
            (0, 500, OnCurve),
            (300, 500, OnCurve),
            (100, 500, OnCurve),
            (100, 0, OnCurve),
        ];
        let mut outline = filled(&contour);
        let expected = [
            (Direction::Right, 500, 0, 300, 300, 1, 3),
            (Direction::Left, 0, 0, 100, 100, 4, 0),
        ];
        assert_eq!(merged_segments(&mut outline), expected);
    }

    #[test]
    fn reversal_keeps_longer_current_segment() {
        use PointKind::OnCurve;
        // The top runs right to 100 and comes back past the start to -100
        let contour = [
            (0, 0, OnCurve),
            (0, 500, OnCurve),
            (100, 500, OnCurve),
            (-100, 500, OnCurve),
            (-100, 0, OnCurve),
        ];
        let mut outline = filled(&contour);
        let expected = [
            (Direction::Left, 500, -100, 100, 200, 2, 3),
            (Direction::Right, 0, -100, 0, 100, 4, 0),
        ];
        assert_eq!(merged_segments(&mut outline), expected);
    }

    #[test]
    fn matching_directions_unify_segments() {
        use PointKind::OnCurve;
        let contour = [
            (0, 0, OnCurve),
            (0, 500, OnCurve),
            (100, 500, OnCurve),
            (-100, 500, OnCurve),
            (-100, 0, OnCurve),
        ];
        let mut outline = filled(&contour);
        // Both runs entering in the same direction merge into the first
        // segment with the union of their ranges
        outline.points[3].in_dir = outline.points[2].in_dir;
        let expected = [
            (Direction::Right, 500, -100, 100, 200, 1, 3),
            (Direction::Right, 0, -100, 0, 100, 4, 0),
        ];
        assert_eq!(merged_segments(&mut outline), expected);
    }

    #[test]
    fn too_many_segments() {
        // Each rectangle contributes a top and a bottom segment
        let rectangles = |count: i32| {
            (0..count)
                .map(|ix| rectangle(ix * 200, 0, ix * 200 + 100, 700))
                .collect::<Vec<_>>()
        };
        let mut outline = Outline::default();
        let mut axis = Axis::new(Axis::VERTICAL, None);
        let contours = rectangles(500);
        let contours = contours.iter().map(|c| c.as_slice()).collect::<Vec<_>>();
        outline.fill(&raw_outline(&contours), 1000, Scale::UNIT).unwrap();
        axis.reset(Axis::VERTICAL, outline.orientation);
        assert!(compute_segments(&mut outline, &mut axis).unwrap());
        assert_eq!(axis.segments.len(), MAX_SEGMENTS);
        let contours = rectangles(501);
        let contours = contours.iter().map(|c| c.as_slice()).collect::<Vec<_>>();
        outline.fill(&raw_outline(&contours), 1000, Scale::UNIT).unwrap();
        assert!(!compute_segments(&mut outline, &mut axis).unwrap());
        assert!(axis.segments.is_empty());
    }

    #[test]
    fn single_point_contour_segment() {
        let contours: &[&[_]] = &[&rectangle(0, 0, 100, 700), &[(300, 350, PointKind::OnCurve)]];
        let (_, axis) = analyze(contours, Axis::VERTICAL, 0);
        let seg = axis.segments[2];
        assert_eq!(seg.dir, Direction::None);
        assert_eq!((seg.pos, seg.min_coord, seg.max_coord), (350, 300, 300));
        assert_eq!((seg.first_ix, seg.last_ix), (4, 4));
        assert_eq!(seg.link_ix, None);
    }

    #[test]
    fn serifs_from_unreciprocated_links() {
        use PointKind::OnCurve;
        // The top of the triangle finds the stem bottom, which prefers the
        // nearer stem top
        let stem = rectangle(0, 0, 400, 100);
        let triangle = [(200, 150, OnCurve), (0, 300, OnCurve), (400, 300, OnCurve)];
        let (_, axis) = analyze(&[&stem, &triangle], Axis::VERTICAL, 0);
        let links = axis
            .segments
            .iter()
            .map(|seg| (seg.pos, seg.link_ix, seg.serif_ix))
            .collect::<Vec<_>>();
        let expected = [
            (100, Some(1), None),
            (0, Some(0), None),
            (300, None, Some(0)),
        ];
        assert_eq!(links, expected);
    }

    #[test]
    fn segments_are_recomputed_identically() {
        let raw = raw_outline(&[&rectangle(0, 0, 100, 700), &rectangle(200, 0, 260, 500)]);
        let mut outline = Outline::default();
        outline.fill(&raw, 1000, Scale::UNIT).unwrap();
        let mut axis = Axis::new(Axis::VERTICAL, outline.orientation);
        compute_segments(&mut outline, &mut axis).unwrap();
        let first = axis.segments.clone();
        compute_segments(&mut outline, &mut axis).unwrap();
        assert_eq!(axis.segments, first);
    }

    #[test]
    fn links_are_reciprocal_or_cleared() {
        let contours: &[&[_]] = &[
            &rectangle(0, 0, 100, 700),
            &rectangle(0, 680, 300, 720),
            &rectangle(200, 0, 260, 500),
        ];
        let (_, axis) = analyze(contours, Axis::VERTICAL, 0);
        let segments = axis.segments.as_slice();
        for (ix, seg) in segments.iter().enumerate() {
            if let Some(link) = seg.link(segments) {
                assert_eq!(link.link_ix, Some(ix as u16));
                assert!(seg.dir.is_opposite(link.dir));
            }
        }
    }
}

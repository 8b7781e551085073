//! Apply positioned edges to the points of an outline.
//!
//! This happens in three passes over the vertical axis:
//! 1. Move the points that generated each edge by the edge's adjustment.
//! 2. Move the remaining strong points, either with the cap height when
//!    they lie above it or by interpolating between the enclosing edges.
//! 3. Interpolate the weak points of each contour between their touched
//!    neighbors.
//!
//! Every pass flags the points it adjusts as done.

use crate::{
    axis::{Axis, Edge},
    fixed::{fixed_div, fixed_mul, mul_div},
    metrics::ZoneHeight,
    outline::{Outline, Point},
};

/// Moves every point of a segment by the adjustment of its edge.
pub fn align_edge_points(outline: &mut Outline, axis: &Axis) -> Option<()> {
    let edges = axis.edges.as_slice();
    let points = outline.points.as_mut_slice();
    for segment in &axis.segments {
        let Some(edge) = segment.edge(edges) else {
            continue;
        };
        let delta = edge.pos - edge.opos;
        let mut point_ix = segment.first();
        let last_ix = segment.last();
        loop {
            let point = points.get_mut(point_ix)?;
            point.y += delta;
            point.flags |= Point::DONE;
            if point_ix == last_ix {
                break;
            }
            point_ix = point.next();
        }
    }
    Some(())
}

/// Aligns the strong points that were not moved with an edge.
///
/// Points at or above the cap height shift with it, points at or below the
/// origin stay put and everything in between is interpolated between the
/// closest edges that enclose it, falling back to the origin and the cap
/// height.
pub fn align_strong_points(outline: &mut Outline, axis: &Axis, cap_height: &ZoneHeight) {
    let edges = axis.edges.as_slice();
    for point in &mut outline.points {
        if point.is_weak() || point.is_done() {
            continue;
        }
        if point.oy >= cap_height.scaled {
            point.y += cap_height.delta();
        } else if point.oy > 0 {
            let (before, after) = enclosing_references(edges, point.oy, cap_height);
            let (before_org, before_fit) = before;
            let (after_org, after_fit) = after;
            point.y =
                mul_div(point.oy - before_org, after_fit - before_fit, after_org - before_org)
                    + before_fit;
        }
        point.flags |= Point::DONE;
    }
}

/// Returns the original and fitted positions of the references below and
/// above the scaled coordinate `oy`.
fn enclosing_references(
    edges: &[Edge],
    oy: i32,
    cap_height: &ZoneHeight,
) -> ((i32, i32), (i32, i32)) {
    let mut before = (0, 0);
    let mut after = (cap_height.scaled, cap_height.fitted);
    let (Some(first), Some(last)) = (edges.first(), edges.last()) else {
        return (before, after);
    };
    // Index of the first edge at or above the point
    let upper_ix = if oy > last.opos {
        edges.len()
    } else if oy < first.opos {
        0
    } else if edges.len() > 8 {
        edges.partition_point(|edge| oy > edge.opos)
    } else {
        edges
            .iter()
            .position(|edge| oy <= edge.opos)
            .unwrap_or(edges.len())
    };
    if let Some(edge) = upper_ix.checked_sub(1).and_then(|ix| edges.get(ix)) {
        if edge.opos > 0 {
            before = (edge.opos, edge.pos);
        }
    }
    if let Some(edge) = edges.get(upper_ix) {
        if edge.opos < cap_height.scaled {
            after = (edge.opos, edge.pos);
        }
    }
    (before, after)
}

/// Interpolates the points that have not been touched by the previous
/// passes; similar to the TrueType `IUP` instruction.
///
/// Runs of untouched points between two done points are interpolated
/// between them, wrapping around the end of each contour. A contour with a
/// single done point is shifted by the adjustment of that point.
pub fn align_weak_points(outline: &mut Outline) -> Option<()> {
    for contour in &outline.contours {
        let points = outline.points.get_mut(contour.range())?;
        let Some(first_done_ix) = points.iter().position(|point| point.is_done()) else {
            continue;
        };
        let last_ix = points.len() - 1;
        let mut point_ix = first_done_ix;
        let mut last_done_ix;
        'outer: loop {
            // Skip any done neighbors
            while point_ix < last_ix && points.get(point_ix + 1)?.is_done() {
                point_ix += 1;
            }
            last_done_ix = point_ix;
            // Find the next done point
            point_ix += 1;
            loop {
                if point_ix > last_ix {
                    break 'outer;
                }
                if points[point_ix].is_done() {
                    break;
                }
                point_ix += 1;
            }
            interpolate_range(points, last_done_ix + 1, point_ix - 1, last_done_ix, point_ix)?;
        }
        if last_done_ix == first_done_ix {
            shift_range(points, first_done_ix)?;
        } else {
            // Wrap around the contour end
            if last_done_ix < last_ix {
                interpolate_range(points, last_done_ix + 1, last_ix, last_done_ix, first_done_ix)?;
            }
            if first_done_ix > 0 {
                interpolate_range(points, 0, first_done_ix - 1, last_done_ix, first_done_ix)?;
            }
        }
    }
    Some(())
}

/// Shifts all points of a contour except the reference by the adjustment
/// of the point at `ref_ix`.
fn shift_range(points: &mut [Point], ref_ix: usize) -> Option<()> {
    let ref_point = points.get(ref_ix)?;
    let delta = ref_point.y - ref_point.oy;
    if delta == 0 {
        return Some(());
    }
    for (ix, point) in points.iter_mut().enumerate() {
        if ix != ref_ix {
            point.y = point.oy + delta;
        }
    }
    Some(())
}

/// Interpolates the points from `p1_ix` to `p2_ix` (inclusive) using the
/// points at `ref1_ix` and `ref2_ix` as references.
///
/// Points outside of the reference span take the adjustment of the closer
/// reference.
fn interpolate_range(
    points: &mut [Point],
    p1_ix: usize,
    p2_ix: usize,
    ref1_ix: usize,
    ref2_ix: usize,
) -> Option<()> {
    if p1_ix > p2_ix {
        return Some(());
    }
    let mut ref1 = *points.get(ref1_ix)?;
    let mut ref2 = *points.get(ref2_ix)?;
    if ref1.oy > ref2.oy {
        core::mem::swap(&mut ref1, &mut ref2);
    }
    let delta1 = ref1.y - ref1.oy;
    let delta2 = ref2.y - ref2.oy;
    let scale = if ref1.y == ref2.y || ref1.oy == ref2.oy {
        None
    } else {
        Some(fixed_div(ref2.y - ref1.y, ref2.oy - ref1.oy))
    };
    for point in points.get_mut(p1_ix..=p2_ix)? {
        point.y = if point.oy <= ref1.oy {
            point.oy + delta1
        } else if point.oy >= ref2.oy {
            point.oy + delta2
        } else if let Some(scale) = scale {
            ref1.y + fixed_mul(point.oy - ref1.oy, scale)
        } else {
            ref1.y
        };
    }
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        edges::compute_edges,
        outline::{
            tests::{raw_outline, rectangle},
            Contour,
        },
        provider::Scale,
        segments::{compute_segments, link_segments},
    };
    use pretty_assertions::assert_eq;

    /// Single contour outline with the given scaled y coordinates. Points
    /// with a `Some` value are already done and moved to that coordinate.
    fn outline_with_ys(ys: &[(i32, Option<i32>)]) -> Outline {
        let mut outline = Outline::default();
        for (ix, (oy, y)) in ys.iter().enumerate() {
            outline
                .points
                .try_push(Point {
                    flags: if y.is_some() { Point::DONE } else { 0 },
                    oy: *oy,
                    y: y.unwrap_or(*oy),
                    next_ix: ((ix + 1) % ys.len()) as u16,
                    prev_ix: ((ix + ys.len() - 1) % ys.len()) as u16,
                    ..Default::default()
                })
                .unwrap();
        }
        outline
            .contours
            .try_push(Contour::new(0, ys.len() as u16 - 1))
            .unwrap();
        outline
    }

    fn ys(outline: &Outline) -> Vec<i32> {
        outline.points.iter().map(|point| point.y).collect()
    }

    fn edge(opos: i32, pos: i32) -> Edge {
        Edge {
            fpos: opos as i16,
            opos,
            pos,
            ..Default::default()
        }
    }

    #[test]
    fn edge_points_follow_their_edge() {
        let raw = raw_outline(&[&rectangle(0, 0, 100, 700)]);
        let mut outline = Outline::default();
        outline.fill(&raw, 1000, Scale::UNIT).unwrap();
        let mut axis = Axis::new(Axis::VERTICAL, outline.orientation);
        compute_segments(&mut outline, &mut axis).unwrap();
        link_segments(&outline, &mut axis, 0);
        compute_edges(&mut axis, Scale::UNIT.y_scale).unwrap();
        axis.edges[1].pos = 704;
        align_edge_points(&mut outline, &axis).unwrap();
        assert_eq!(ys(&outline), [0, 704, 704, 0]);
        assert!(outline.points.iter().all(|point| point.is_done()));
    }

    #[test]
    fn strong_points() {
        let cap_height = ZoneHeight::from_scaled(700, 704);
        let mut axis = Axis::new(Axis::VERTICAL, None);
        axis.edges.try_push(edge(0, 0)).unwrap();
        axis.edges.try_push(edge(300, 296)).unwrap();
        let mut outline = outline_with_ys(&[
            (-50, None),
            (0, Some(0)),
            (150, None),
            (300, None),
            (400, None),
            (700, None),
            (800, None),
        ]);
        outline.points[6].flags |= Point::WEAK_INTERPOLATION;
        align_strong_points(&mut outline, &axis, &cap_height);
        // 150: 150 * 296 / 300 = 148
        // 300: on the upper edge
        // 400: 100 * 408 / 400 + 296 = 398
        // 700: shifted with the cap height
        assert_eq!(ys(&outline), [-50, 0, 148, 296, 398, 704, 800]);
        let done = outline
            .points
            .iter()
            .map(|point| point.is_done())
            .collect::<Vec<_>>();
        assert_eq!(done, [true, true, true, true, true, true, false]);
    }

    #[test]
    fn strong_points_without_edges_use_zone() {
        let cap_height = ZoneHeight::from_scaled(700, 704);
        let axis = Axis::new(Axis::VERTICAL, None);
        let mut outline = outline_with_ys(&[(350, None)]);
        align_strong_points(&mut outline, &axis, &cap_height);
        assert_eq!(ys(&outline), [352]);
    }

    #[test]
    fn strong_points_binary_search() {
        let cap_height = ZoneHeight::from_scaled(1000, 1024);
        let mut axis = Axis::new(Axis::VERTICAL, None);
        // Ten edges at 0, 100, ... 900, each moved up by 10 except the
        // one at 500 which moves up by 20
        for ix in 0..10 {
            let opos = ix * 100;
            let shift = if ix == 5 { 20 } else { 10 };
            axis.edges.try_push(edge(opos, opos + shift)).unwrap();
        }
        let mut outline = outline_with_ys(&[(450, None), (500, None), (950, None)]);
        align_strong_points(&mut outline, &axis, &cap_height);
        // 450 lies halfway between 410 and 520; 950 between 910 and 1024
        assert_eq!(ys(&outline), [465, 520, 967]);
    }

    #[test]
    fn weak_points_between_done_points() {
        let mut outline = outline_with_ys(&[
            (0, Some(0)),
            (100, None),
            (200, None),
            (300, None),
            (400, Some(800)),
        ]);
        align_weak_points(&mut outline).unwrap();
        assert_eq!(ys(&outline), [0, 200, 400, 600, 800]);
    }

    #[test]
    fn weak_points_wrap_around_contour() {
        let mut outline = outline_with_ys(&[
            (100, None),
            (200, Some(200)),
            (300, None),
            (400, Some(600)),
            (300, None),
            (200, None),
        ]);
        align_weak_points(&mut outline).unwrap();
        // Points outside the reference span take the closer adjustment
        assert_eq!(ys(&outline), [100, 200, 400, 600, 400, 200]);
    }

    #[test]
    fn weak_points_keep_their_order() {
        let oys = [0, 37, 91, 133, 260, 311, 402, 433, 500];
        let mut points = oys.map(|oy| (oy, None)).to_vec();
        points[0].1 = Some(-5);
        points[8].1 = Some(523);
        let mut outline = outline_with_ys(&points);
        align_weak_points(&mut outline).unwrap();
        let ys = ys(&outline);
        assert!(ys.windows(2).all(|pair| pair[0] <= pair[1]), "{ys:?}");
        assert_eq!((ys[0], ys[8]), (-5, 523));
    }

    #[test]
    fn single_done_point_shifts_contour() {
        let mut outline = outline_with_ys(&[(0, None), (100, Some(110)), (200, None)]);
        align_weak_points(&mut outline).unwrap();
        assert_eq!(ys(&outline), [10, 110, 210]);
    }

    #[test]
    fn references_with_same_original_position() {
        let mut outline = outline_with_ys(&[(100, Some(90)), (150, None), (100, Some(120))]);
        align_weak_points(&mut outline).unwrap();
        assert_eq!(ys(&outline), [90, 170, 120]);
    }

    #[test]
    fn untouched_contours_are_unchanged() {
        let mut outline = outline_with_ys(&[(0, None), (100, None), (200, None)]);
        align_weak_points(&mut outline).unwrap();
        assert_eq!(ys(&outline), [0, 100, 200]);
    }
}

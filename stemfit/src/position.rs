//! Custom vertical edge positioning.
//!
//! Edges are moved so that the cap height and x height land on the pixel
//! grid. Stems are handled first and keep their width, everything else is
//! shifted with the closest reference or interpolated between references.

use crate::{
    axis::{Axis, Edge},
    fixed::mul_div,
    metrics::ZoneHeight,
};

/// Assigns a hinted position to every edge of the vertical axis.
///
/// Positions are in 26.6 and every edge is flagged done afterward.
pub fn position_edges(axis: &mut Axis, cap_height: &ZoneHeight, x_height: &ZoneHeight) {
    position_stems(axis.edges.as_mut_slice(), cap_height, x_height);
    position_remaining_edges(axis.edges.as_mut_slice(), cap_height);
}

/// Moves both edges of each stem, visiting every stem once from its upper
/// edge.
fn position_stems(edges: &mut [Edge], cap_height: &ZoneHeight, x_height: &ZoneHeight) {
    let cap_delta = cap_height.delta();
    let x_delta = x_height.delta();
    for edge_ix in 0..edges.len() {
        let Some(link_ix) = edges[edge_ix].link_ix.map(|ix| ix as usize) else {
            continue;
        };
        if link_ix > edge_ix {
            continue;
        }
        let edge = edges[edge_ix];
        let link = edges[link_ix];
        if link.opos <= 0 {
            // The stem contains the origin so only the upper edge moves and
            // only when it reaches one of the zones
            if edge.opos >= cap_height.scaled {
                edges[edge_ix].pos += cap_delta;
            } else if edge.opos >= x_height.scaled {
                edges[edge_ix].pos += x_delta;
            }
        } else if edge.opos >= cap_height.scaled {
            // The lower edge follows the x height if the stem reaches down
            // that far
            edges[link_ix].pos += if link.opos <= x_height.scaled {
                x_delta
            } else {
                cap_delta
            };
            edges[edge_ix].pos += cap_delta;
        } else {
            // Interpolate the middle of the stem within its zone
            let stem_org = (edge.opos + link.opos) / 2;
            let (bottom, top) = if stem_org < x_height.scaled {
                (ZoneHeight::default(), *x_height)
            } else {
                (*x_height, *cap_height)
            };
            let delta = if top.scaled == bottom.scaled {
                // Empty zone
                bottom.delta()
            } else {
                let stem_fit = mul_div(
                    stem_org - bottom.scaled,
                    top.fitted - bottom.fitted,
                    top.scaled - bottom.scaled,
                ) + bottom.fitted;
                stem_fit - stem_org
            };
            edges[edge_ix].pos += delta;
            edges[link_ix].pos += delta;
        }
        edges[edge_ix].flags |= Edge::DONE;
        edges[link_ix].flags |= Edge::DONE;
    }
}

/// Positions serifs and unlinked edges.
fn position_remaining_edges(edges: &mut [Edge], cap_height: &ZoneHeight) {
    for edge_ix in 0..edges.len() {
        let edge = edges[edge_ix];
        if edge.is_done() {
            continue;
        }
        if let Some(serif) = edge.serif(edges) {
            // Serifs move with their anchor
            let delta = serif.pos - serif.opos;
            edges[edge_ix].pos += delta;
        } else if edge.opos >= cap_height.scaled {
            edges[edge_ix].pos += cap_height.delta();
        } else if edge.opos > 0 {
            // Interpolate between the nearest positioned edges, falling
            // back to the origin and cap height
            let (prev_org, prev_fit) = edges[..edge_ix]
                .iter()
                .rev()
                .find(|edge| edge.is_done())
                .map(|edge| (edge.opos, edge.pos))
                .unwrap_or_default();
            let (next_org, next_fit) = edges[edge_ix + 1..]
                .iter()
                .find(|edge| edge.is_done())
                .map(|edge| (edge.opos, edge.pos))
                .unwrap_or((cap_height.scaled, cap_height.fitted));
            edges[edge_ix].pos = if next_org == prev_org {
                edge.opos + prev_fit - prev_org
            } else {
                mul_div(edge.opos - prev_org, next_fit - prev_fit, next_org - prev_org) + prev_fit
            };
        }
        edges[edge_ix].flags |= Edge::DONE;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::Direction;
    use pretty_assertions::assert_eq;

    fn cap() -> ZoneHeight {
        ZoneHeight::from_scaled(700, 704)
    }

    fn x_height() -> ZoneHeight {
        ZoneHeight::from_scaled(500, 496)
    }

    /// Builds an axis with edges at the given scaled positions, linking
    /// the given pairs.
    fn axis_with_edges(positions: &[i32], links: &[(usize, usize)]) -> Axis {
        let mut axis = Axis::new(Axis::VERTICAL, None);
        for (ix, pos) in positions.iter().enumerate() {
            axis.edges
                .try_push(Edge {
                    fpos: *pos as i16,
                    opos: *pos,
                    pos: *pos,
                    dir: if ix % 2 == 0 {
                        Direction::Left
                    } else {
                        Direction::Right
                    },
                    ..Default::default()
                })
                .unwrap();
        }
        for (a, b) in links {
            axis.edges[*a].link_ix = Some(*b as u16);
            axis.edges[*b].link_ix = Some(*a as u16);
        }
        axis
    }

    fn deltas(axis: &Axis) -> Vec<i32> {
        axis.edges.iter().map(|edge| edge.pos - edge.opos).collect()
    }

    #[test]
    fn stem_on_origin_below_x_height_stays() {
        let mut axis = axis_with_edges(&[-20, 300], &[(0, 1)]);
        position_edges(&mut axis, &cap(), &x_height());
        assert_eq!(deltas(&axis), [0, 0]);
        assert!(axis.edges.iter().all(|edge| edge.is_done()));
    }

    #[test]
    fn stem_on_origin_reaching_x_height() {
        let mut axis = axis_with_edges(&[0, 520], &[(0, 1)]);
        position_edges(&mut axis, &cap(), &x_height());
        assert_eq!(deltas(&axis), [0, -4]);
        let mut axis = axis_with_edges(&[0, 720], &[(0, 1)]);
        position_edges(&mut axis, &cap(), &x_height());
        assert_eq!(deltas(&axis), [0, 4]);
    }

    #[test]
    fn stems_above_cap_height() {
        // Bottom inside the x height zone follows the x height
        let mut axis = axis_with_edges(&[480, 720], &[(0, 1)]);
        position_edges(&mut axis, &cap(), &x_height());
        assert_eq!(deltas(&axis), [-4, 4]);
        // Bottom above the x height follows the cap height
        let mut axis = axis_with_edges(&[660, 720], &[(0, 1)]);
        position_edges(&mut axis, &cap(), &x_height());
        assert_eq!(deltas(&axis), [4, 4]);
    }

    #[test]
    fn interpolated_stems_keep_width() {
        // Centered on the x height
        let mut axis = axis_with_edges(&[480, 520], &[(0, 1)]);
        position_edges(&mut axis, &cap(), &x_height());
        assert_eq!(deltas(&axis), [-4, -4]);
        // Halfway up the x height: 250 * 496 / 500
        let mut axis = axis_with_edges(&[230, 270], &[(0, 1)]);
        position_edges(&mut axis, &cap(), &x_height());
        assert_eq!(deltas(&axis), [-2, -2]);
        // Halfway between x height and cap height
        let mut axis = axis_with_edges(&[580, 620], &[(0, 1)]);
        position_edges(&mut axis, &cap(), &x_height());
        assert_eq!(deltas(&axis), [0, 0]);
    }

    #[test]
    fn missing_x_height_uses_cap_height_zone() {
        let mut axis = axis_with_edges(&[230, 270], &[(0, 1)]);
        position_edges(&mut axis, &cap(), &ZoneHeight::default());
        // 250 * 704 / 700 = 251.9, truncated
        assert_eq!(deltas(&axis), [1, 1]);
    }

    #[test]
    fn remaining_edges() {
        // 0: below origin, 1: serif of the stem 2-3, 2/3: stem,
        // 4: interpolated between the stem and the cap height, 5: above cap
        let mut axis = axis_with_edges(&[-10, 100, 480, 520, 600, 750], &[(2, 3)]);
        axis.edges[1].serif_ix = Some(2);
        position_edges(&mut axis, &cap(), &x_height());
        // (600 - 520) * (704 - 516) / (700 - 520) + 516 = 600
        assert_eq!(deltas(&axis), [0, -4, -4, -4, 0, 4]);
        assert!(axis.edges.iter().all(|edge| edge.is_done()));
    }

    #[test]
    fn unlinked_edges_use_origin_and_cap_height() {
        let mut axis = axis_with_edges(&[350], &[]);
        position_edges(&mut axis, &cap(), &x_height());
        // 350 * 704 / 700 = 352
        assert_eq!(deltas(&axis), [2]);
    }
}

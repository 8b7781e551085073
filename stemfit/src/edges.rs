//! Edge computations.
//!
//! Edges are sets of segments that all lie within a small distance of each
//! other. Here we compute edges from the segment list and assign their
//! properties (round, serif, links).

use crate::{
    axis::{Axis, Edge, Segment},
    fixed::{fixed_div, fixed_mul},
    outline::Direction,
    Error,
};

/// Clusters the segments of an axis into sorted edges.
///
/// The `scale` is the 16.16 scale factor for the axis dimension.
pub fn compute_edges(axis: &mut Axis, scale: i32) -> Result<(), Error> {
    axis.edges.clear();
    // Segment length is not considered
    let segment_length_threshold = 0;
    // Ignore segments with a width delta larger than 0.5 pixels
    let segment_width_threshold = fixed_div(32, scale);
    // Segments closer than 0.25 pixels share an edge
    let edge_distance_threshold = fixed_div(64 / 4, scale);
    // Now build the sorted table of edges by looping over all segments
    // to find a matching edge, adding a new one if not found
    'segments1: for segment_ix in 0..axis.segments.len() {
        let segment = &axis.segments[segment_ix];
        // Ignore segments that are too short, too wide or direction-less
        if (segment.height as i32) < segment_length_threshold
            || (segment.delta as i32 > segment_width_threshold)
            || segment.dir == Direction::None
        {
            continue;
        }
        // Ignore serif edges that are smaller than 1.5 pixels
        if segment.serif_ix.is_some()
            && (2 * segment.height as i32) < (3 * segment_length_threshold)
        {
            continue;
        }
        // Look for a corresponding edge for this segment
        for edge_ix in 0..axis.edges.len() {
            let edge = &axis.edges[edge_ix];
            let dist = (segment.pos as i32 - edge.fpos as i32).abs();
            if dist < edge_distance_threshold && edge.dir == segment.dir {
                axis.append_segment_to_edge(segment_ix, edge_ix);
                continue 'segments1;
            }
        }
        // We couldn't find an edge, so add a new one for this segment
        let opos = fixed_mul(segment.pos as i32, scale);
        let edge = Edge {
            fpos: segment.pos,
            opos,
            pos: opos,
            dir: segment.dir,
            first_ix: segment_ix as u16,
            last_ix: segment_ix as u16,
            ..Default::default()
        };
        axis.insert_edge(edge)?;
        axis.segments[segment_ix].edge_next_ix = Some(segment_ix as u16);
    }
    // Loop again to find single point segments without a direction and
    // associate them with an existing edge if possible
    'segments2: for segment_ix in 0..axis.segments.len() {
        let segment = &axis.segments[segment_ix];
        if segment.dir != Direction::None {
            continue;
        }
        for edge_ix in 0..axis.edges.len() {
            let edge = &axis.edges[edge_ix];
            let dist = (segment.pos as i32 - edge.fpos as i32).abs();
            if dist < edge_distance_threshold {
                axis.append_segment_to_edge(segment_ix, edge_ix);
                continue 'segments2;
            }
        }
    }
    link_segments_to_edges(axis);
    compute_edge_properties(axis);
    log::trace!(
        "dimension {}: {} edges from {} segments",
        axis.dim,
        axis.edges.len(),
        axis.segments.len()
    );
    Ok(())
}

/// Edges get shifted and resorted as they're built so we need to assign
/// edge indices to segments in a second pass.
fn link_segments_to_edges(axis: &mut Axis) {
    for segment in &mut axis.segments {
        segment.edge_ix = None;
    }
    for edge_ix in 0..axis.edges.len() {
        let edge = axis.edges[edge_ix];
        let mut ix = edge.first_ix as usize;
        let last_ix = edge.last_ix as usize;
        loop {
            let segment = &mut axis.segments[ix];
            segment.edge_ix = Some(edge_ix as u16);
            if ix == last_ix {
                break;
            }
            ix = segment
                .edge_next_ix
                .map(|ix| ix as usize)
                .unwrap_or(last_ix);
        }
    }
}

/// Compute the edge properties based on the series of segments that make
/// up the edge.
fn compute_edge_properties(axis: &mut Axis) {
    let edges = axis.edges.as_mut_slice();
    let segments = axis.segments.as_slice();
    for edge_ix in 0..edges.len() {
        let mut roundness = 0;
        let mut straightness = 0;
        let edge = edges[edge_ix];
        let mut segment_ix = edge.first_ix as usize;
        let last_segment_ix = edge.last_ix as usize;
        loop {
            let segment = &segments[segment_ix];
            let next_segment_ix = segment.edge_next_ix;
            if segment.flags & Segment::ROUND != 0 {
                roundness += 1;
            } else {
                straightness += 1;
            }
            // A serif only counts when its anchor lives on another edge
            let serif = segment
                .serif(segments)
                .filter(|serif| serif.edge_ix.is_some() && serif.edge_ix != Some(edge_ix as u16));
            let link = segment.link(segments).filter(|link| link.edge_ix.is_some());
            let relation = if serif.is_some() {
                Some((true, edges[edge_ix].serif_ix, serif))
            } else {
                link.map(|link| (false, edges[edge_ix].link_ix, Some(link)))
            };
            if let Some((is_serif, current_ix, Some(segment2))) = relation {
                // Prefer whichever of the current edge relation and the
                // segment relation is positionally closer
                let edge2_ix = match current_ix {
                    Some(edge2_ix) => {
                        let edge2 = &edges[edge2_ix as usize];
                        let edge_delta = (edge.fpos as i32 - edge2.fpos as i32).abs();
                        let segment_delta = (segment.pos as i32 - segment2.pos as i32).abs();
                        if segment_delta < edge_delta {
                            segment2.edge_ix
                        } else {
                            Some(edge2_ix)
                        }
                    }
                    None => segment2.edge_ix,
                };
                if is_serif {
                    edges[edge_ix].serif_ix = edge2_ix;
                    if let Some(edge2) = edge2_ix.and_then(|ix| edges.get_mut(ix as usize)) {
                        edge2.flags |= Edge::SERIF;
                    }
                } else {
                    edges[edge_ix].link_ix = edge2_ix;
                }
            }
            if segment_ix == last_segment_ix {
                break;
            }
            segment_ix = next_segment_ix
                .map(|ix| ix as usize)
                .unwrap_or(last_segment_ix);
        }
        let edge = &mut edges[edge_ix];
        edge.flags = Edge::NORMAL;
        if roundness > 0 && roundness >= straightness {
            edge.flags |= Edge::ROUND;
        }
        // Drop serifs for linked edges; this avoids artifacts on some
        // compound shapes
        if edge.serif_ix.is_some() && edge.link_ix.is_some() {
            edge.serif_ix = None;
        }
    }
}

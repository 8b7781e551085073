//! Text dump of the analysis of a glyph.

use std::fmt::Write;

use stemfit::{outline::Point, Analysis};

fn point_flags(point: &Point) -> String {
    let mut flags = Vec::new();
    if point.flags & Point::QUAD != 0 {
        flags.push("quad");
    }
    if point.flags & Point::CUBIC != 0 {
        flags.push("cubic");
    }
    if point.is_weak() {
        flags.push("weak");
    }
    if point.flags & Point::NEAR != 0 {
        flags.push("near");
    }
    if point.is_done() {
        flags.push("done");
    }
    flags.join(",")
}

fn index(ix: Option<u16>) -> String {
    ix.map(|ix| ix.to_string()).unwrap_or_else(|| "-".into())
}

/// Writes the points, segments and edges of the last analyzed glyph.
pub fn dump(analysis: &Analysis, out: &mut impl Write) -> std::fmt::Result {
    let outline = analysis.outline();
    let axis = analysis.axis();
    writeln!(out, "points: {}", outline.points.len())?;
    for (ix, point) in outline.points.iter().enumerate() {
        writeln!(
            out,
            "  {ix:4} font ({}, {}) scaled ({}, {}) hinted ({}, {}) in {:?} out {:?} [{}]",
            point.fx,
            point.fy,
            point.ox,
            point.oy,
            point.x,
            point.y,
            point.in_dir,
            point.out_dir,
            point_flags(point)
        )?;
    }
    writeln!(out, "segments: {}", axis.segments.len())?;
    for (ix, segment) in axis.segments.iter().enumerate() {
        writeln!(
            out,
            "  {ix:4} {:?} pos {} range {}..{} height {} points {}..{} link {} serif {} edge {}",
            segment.dir,
            segment.pos,
            segment.min_coord,
            segment.max_coord,
            segment.height,
            segment.first_ix,
            segment.last_ix,
            index(segment.link_ix),
            index(segment.serif_ix),
            index(segment.edge_ix)
        )?;
    }
    writeln!(out, "edges: {}", axis.edges.len())?;
    for (ix, edge) in axis.edges.iter().enumerate() {
        writeln!(
            out,
            "  {ix:4} {:?} fpos {} opos {} pos {} link {} serif {} flags {:#04b}",
            edge.dir,
            edge.fpos,
            edge.opos,
            edge.pos,
            index(edge.link_ix),
            index(edge.serif_ix),
            edge.flags
        )?;
    }
    Ok(())
}

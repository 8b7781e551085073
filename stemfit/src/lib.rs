//! Outline topology analysis and custom vertical alignment.
//!
//! This crate analyzes a glyph outline the way an autohinter does: points
//! are classified as strong or weak, runs of points moving along an axis
//! are grouped into [segments](axis::Segment), opposing segments are paired
//! into stems and clustered into [edges](axis::Edge). A custom alignment
//! pass then moves edges and points vertically so that stems and the cap
//! and x heights of the font land on the pixel grid.
//!
//! The entry point is [`Analysis`], which owns all per-glyph storage:
//!
//! ```no_run
//! use stemfit::{Analysis, AlignmentConfig, FontProvider, RawOutline};
//! # fn run(font_data: &[u8]) -> Result<(), stemfit::Error> {
//! let font = skrifa::FontRef::new(font_data).unwrap();
//! let provider = FontProvider::new(&font, 18, 96);
//! let mut analysis = Analysis::new();
//! let mut hinted = RawOutline::default();
//! let glyph_id = skrifa::GlyphId::new(36);
//! analysis.load_hinted(&provider, glyph_id, &AlignmentConfig::default(), &mut hinted)?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

mod analysis;
pub mod axis;
mod collections;
pub mod draw;
pub mod edges;
pub mod fixed;
pub mod hint;
pub mod metrics;
pub mod outline;
pub mod position;
pub mod provider;
pub mod segments;

pub use analysis::Analysis;
pub use collections::SmallVec;
pub use draw::{draw_edges, Color, EdgeCanvas, EdgeColors};
pub use metrics::{AlignmentConfig, AlignmentMetrics, ZoneHeight};
pub use provider::{Bounds, FontProvider, OutlineProvider, PointKind, RawOutline, RawPoint, Scale};

use skrifa::{outline::DrawError, GlyphId};

/// Errors that may occur while analyzing or hinting an outline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("out of memory while growing analysis storage")]
    OutOfMemory,
    #[error("invalid outline: {0}")]
    InvalidOutline(String),
    #[error("no outline for glyph {}", .0.to_u32())]
    GlyphNotFound(GlyphId),
    #[error("failed to draw outline: {0}")]
    Draw(DrawError),
    #[error("no glyph mapped for character {0:?}")]
    MissingCharacter(char),
}

impl From<DrawError> for Error {
    fn from(value: DrawError) -> Self {
        Self::Draw(value)
    }
}

//! Analysis context tying the pipeline together.

use crate::{
    axis::Axis,
    edges::compute_edges,
    hint::{align_edge_points, align_strong_points, align_weak_points},
    metrics::{stem_linking_limit, AlignmentConfig, AlignmentMetrics},
    outline::Outline,
    position::position_edges,
    provider::{OutlineProvider, RawOutline},
    segments::{compute_segments, link_segments},
    Error,
};
use skrifa::GlyphId;

/// Storage for the analysis of a single glyph.
///
/// The context is reused across glyphs: each call to
/// [`detect_edges`](Self::detect_edges) or [`load_hinted`](Self::load_hinted)
/// replaces the previous results while keeping allocations alive.
#[derive(Clone, Default, Debug)]
pub struct Analysis {
    outline: Outline,
    axis: Axis,
    raw: RawOutline,
}

impl Analysis {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards the results of the last analysis.
    pub fn reset(&mut self) {
        self.outline.clear();
        self.axis.reset(Axis::VERTICAL, None);
        self.raw.clear();
    }

    /// Point and contour model of the last analyzed glyph.
    pub fn outline(&self) -> &Outline {
        &self.outline
    }

    /// Vertical segments and edges of the last analyzed glyph.
    pub fn axis(&self) -> &Axis {
        &self.axis
    }

    /// Detects the vertical segments and edges of a glyph without moving
    /// anything.
    pub fn detect_edges(
        &mut self,
        provider: &impl OutlineProvider,
        glyph_id: GlyphId,
        config: &AlignmentConfig,
    ) -> Result<(), Error> {
        let linking_limit = stem_linking_limit(
            provider,
            &config.stem_width_chars,
            &mut self.outline,
            &mut self.axis,
            &mut self.raw,
        )? * config.linking_margin;
        self.analyze(provider, glyph_id, linking_limit)
    }

    /// Hints a glyph with the custom alignment and writes the result to
    /// `hinted` in 26.6 coordinates.
    ///
    /// Returns the alignment metrics that were applied.
    pub fn load_hinted(
        &mut self,
        provider: &impl OutlineProvider,
        glyph_id: GlyphId,
        config: &AlignmentConfig,
        hinted: &mut RawOutline,
    ) -> Result<AlignmentMetrics, Error> {
        let metrics = AlignmentMetrics::compute_with(
            provider,
            config,
            &mut self.outline,
            &mut self.axis,
            &mut self.raw,
        )?;
        self.analyze(provider, glyph_id, metrics.linking_limit)?;
        position_edges(&mut self.axis, &metrics.cap_height, &metrics.x_height);
        align_edge_points(&mut self.outline, &self.axis).ok_or_else(inconsistent)?;
        align_strong_points(&mut self.outline, &self.axis, &metrics.cap_height);
        align_weak_points(&mut self.outline).ok_or_else(inconsistent)?;
        self.outline.write(hinted);
        log::trace!("hinted glyph {}", glyph_id.to_u32());
        Ok(metrics)
    }

    /// Loads a glyph and computes its vertical segments and edges.
    fn analyze(
        &mut self,
        provider: &impl OutlineProvider,
        glyph_id: GlyphId,
        linking_limit: i32,
    ) -> Result<(), Error> {
        provider.load_unscaled(glyph_id, &mut self.raw)?;
        let scale = provider.scale();
        self.outline.fill(&self.raw, provider.units_per_em(), scale)?;
        self.axis.reset(Axis::VERTICAL, self.outline.orientation);
        compute_segments(&mut self.outline, &mut self.axis)?;
        link_segments(&self.outline, &mut self.axis, linking_limit);
        compute_edges(&mut self.axis, scale.y_scale)?;
        log::debug!(
            "glyph {}: {} segments, {} edges, linking limit {linking_limit}",
            glyph_id.to_u32(),
            self.axis.segments.len(),
            self.axis.edges.len()
        );
        Ok(())
    }
}

fn inconsistent() -> Error {
    Error::InvalidOutline("segment refers to a missing point".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metrics::{
            tests::{counter, ppem16, MockProvider},
            ZoneHeight,
        },
        outline::{
            tests::{raw_outline, rectangle},
            Direction,
        },
        provider::{PointKind, RawPoint, Scale},
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn detect_rectangle_edges() {
        let provider = MockProvider::new(1000, Scale::UNIT)
            .with_glyph('H', raw_outline(&[&rectangle(0, 0, 100, 700)]));
        let mut analysis = Analysis::new();
        analysis
            .detect_edges(&provider, GlyphId::new(0), &AlignmentConfig::default())
            .unwrap();
        let edges = analysis
            .axis()
            .edges
            .iter()
            .map(|edge| (edge.fpos, edge.dir, edge.link_ix))
            .collect::<Vec<_>>();
        // No stem reference characters so stems are unbounded
        let expected = [(0, Direction::Left, Some(1)), (700, Direction::Right, Some(0))];
        assert_eq!(edges, expected);
        assert_eq!(analysis.outline().points.len(), 4);
        analysis.reset();
        assert!(analysis.axis().edges.is_empty());
        assert!(analysis.outline().points.is_empty());
    }

    #[test]
    fn missing_glyph() {
        let provider = MockProvider::new(1000, Scale::UNIT);
        let mut analysis = Analysis::new();
        let result = analysis.detect_edges(&provider, GlyphId::new(5), &AlignmentConfig::default());
        assert!(matches!(result, Err(Error::GlyphNotFound(gid)) if gid == GlyphId::new(5)));
    }

    fn hinting_provider() -> MockProvider {
        use PointKind::OnCurve;
        // A tall stem with an extra point halfway up its left side
        let stem = [
            (0, 0, OnCurve),
            (0, 350, OnCurve),
            (0, 700, OnCurve),
            (100, 700, OnCurve),
            (100, 0, OnCurve),
        ];
        let o = raw_outline(&[&rectangle(0, 0, 500, 500), &counter(100, 80, 400, 420)]);
        MockProvider::new(1000, ppem16())
            .with_glyph('T', raw_outline(&[&stem]))
            .with_glyph('o', o)
    }

    #[test]
    fn hinted_metrics() {
        let provider = hinting_provider();
        let mut analysis = Analysis::new();
        let mut hinted = RawOutline::default();
        let metrics = analysis
            .load_hinted(
                &provider,
                GlyphId::new(0),
                &AlignmentConfig::default(),
                &mut hinted,
            )
            .unwrap();
        let expected = AlignmentMetrics {
            cap_height: ZoneHeight {
                units: 700,
                scaled: 717,
                fitted: 704,
            },
            x_height: ZoneHeight {
                units: 500,
                scaled: 512,
                fitted: 512,
            },
            // stems of the 'o' are 80 units thick
            linking_limit: 240,
        };
        assert_eq!(metrics, expected);
    }

    #[test]
    fn hinted_outline() {
        let provider = hinting_provider();
        let mut analysis = Analysis::new();
        let mut hinted = RawOutline::default();
        analysis
            .load_hinted(
                &provider,
                GlyphId::new(0),
                &AlignmentConfig::default(),
                &mut hinted,
            )
            .unwrap();
        // The stem is wider than the linking limit so its edges are
        // unlinked: the top follows the cap height and the bottom stays on
        // the baseline. The weak point in the middle is interpolated.
        let expected = [
            RawPoint::on(0, 0),
            RawPoint::on(0, 352),
            RawPoint::on(0, 704),
            RawPoint::on(102, 704),
            RawPoint::on(102, 0),
        ];
        assert_eq!(hinted.points, expected);
        assert_eq!(hinted.contour_ends, [4]);
        assert!(analysis.axis().edges.iter().all(|edge| edge.link_ix.is_none()));
        assert!(analysis
            .outline()
            .points
            .iter()
            .all(|point| point.is_done() || point.is_weak()));
    }

    #[test]
    fn context_is_reusable() {
        let provider = hinting_provider();
        let mut analysis = Analysis::new();
        let mut first = RawOutline::default();
        let mut second = RawOutline::default();
        let config = AlignmentConfig::default();
        analysis
            .load_hinted(&provider, GlyphId::new(1), &config, &mut first)
            .unwrap();
        analysis
            .load_hinted(&provider, GlyphId::new(0), &config, &mut second)
            .unwrap();
        analysis
            .load_hinted(&provider, GlyphId::new(1), &config, &mut second)
            .unwrap();
        assert_eq!(first, second);
    }
}

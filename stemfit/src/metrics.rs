//! Alignment references derived from sample glyphs.
//!
//! The cap height and x height are averages of the maximum heights of a few
//! flat and round reference characters. The stem linking limit is based on
//! the widest stem found in characters with well known stems.

use crate::{
    axis::Axis,
    fixed::{fit_height, fixed_mul},
    outline::Outline,
    provider::{OutlineProvider, RawOutline},
    segments::{compute_segments, link_segments},
    Error,
};

/// Reference characters used to compute alignment metrics.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AlignmentConfig {
    /// Characters with flat tops at cap height.
    pub cap_height_chars: String,
    /// Characters with tops at x height.
    pub x_height_chars: String,
    /// Characters with clear vertical stems.
    pub stem_width_chars: String,
    /// Multiplier applied to the widest stem to produce the linking limit.
    pub linking_margin: i32,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            cap_height_chars: "OTHEZD".into(),
            x_height_chars: "aeocsz".into(),
            stem_width_chars: "oO0".into(),
            linking_margin: 3,
        }
    }
}

/// Height of an alignment zone in font units, scaled and fitted to the
/// pixel grid.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct ZoneHeight {
    /// Height in font units.
    pub units: i32,
    /// Scaled height in 26.6.
    pub scaled: i32,
    /// Scaled height fitted to the pixel grid.
    pub fitted: i32,
}

impl ZoneHeight {
    pub fn new(units: i32, y_scale: i32) -> Self {
        let scaled = fixed_mul(units, y_scale);
        Self {
            units,
            scaled,
            fitted: fit_height(scaled),
        }
    }

    /// Creates a zone from already scaled values.
    pub fn from_scaled(scaled: i32, fitted: i32) -> Self {
        Self {
            units: 0,
            scaled,
            fitted,
        }
    }

    /// Distance the zone moves when fitted.
    pub fn delta(&self) -> i32 {
        self.fitted - self.scaled
    }
}

/// Alignment references for a font at a given size.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct AlignmentMetrics {
    pub cap_height: ZoneHeight,
    pub x_height: ZoneHeight,
    /// Maximum distance between linked stem segments in font units, or 0
    /// if unbounded.
    pub linking_limit: i32,
}

impl AlignmentMetrics {
    /// Computes the alignment metrics for the font behind `provider` at its
    /// current size.
    pub fn compute(
        provider: &impl OutlineProvider,
        config: &AlignmentConfig,
    ) -> Result<Self, Error> {
        let mut outline = Outline::default();
        let mut axis = Axis::default();
        let mut raw = RawOutline::default();
        Self::compute_with(provider, config, &mut outline, &mut axis, &mut raw)
    }

    /// Computes the alignment metrics using the given scratch storage.
    pub(crate) fn compute_with(
        provider: &impl OutlineProvider,
        config: &AlignmentConfig,
        outline: &mut Outline,
        axis: &mut Axis,
        raw: &mut RawOutline,
    ) -> Result<Self, Error> {
        let y_scale = provider.scale().y_scale;
        let cap_height = alignment_height(provider, &config.cap_height_chars, raw);
        let x_height = alignment_height(provider, &config.x_height_chars, raw);
        let linking_limit =
            stem_linking_limit(provider, &config.stem_width_chars, outline, axis, raw)?
                * config.linking_margin;
        let metrics = Self {
            cap_height: ZoneHeight::new(cap_height, y_scale),
            x_height: ZoneHeight::new(x_height, y_scale),
            linking_limit,
        };
        log::debug!("alignment metrics: {metrics:?}");
        Ok(metrics)
    }
}

/// Loads the unscaled outline for a reference character.
///
/// Returns `false` if the character is unmapped, fails to load or has too
/// few points to be meaningful.
fn load_reference(provider: &impl OutlineProvider, ch: char, raw: &mut RawOutline) -> bool {
    let Some(glyph_id) = provider.map_char(ch) else {
        log::debug!("reference character {ch:?} is not mapped");
        return false;
    };
    if let Err(e) = provider.load_unscaled(glyph_id, raw) {
        log::debug!("skipping reference character {ch:?}: {e}");
        return false;
    }
    raw.points.len() > 2
}

/// Computes the average maximum height of the given characters in font
/// units.
///
/// Contours with fewer than three points are ignored as are glyphs that lie
/// entirely below the baseline.
pub fn alignment_height(
    provider: &impl OutlineProvider,
    chars: &str,
    raw: &mut RawOutline,
) -> i32 {
    let mut height = 0;
    let mut count = 0;
    for ch in chars.chars() {
        if !load_reference(provider, ch, raw) {
            continue;
        }
        let best_y = raw
            .contours()
            .filter(|range| range.len() > 2)
            .flat_map(|range| raw.points[range].iter().map(|point| point.y))
            .max();
        let Some(best_y) = best_y.filter(|y| *y > 0) else {
            log::debug!("reference character {ch:?} has no height above the baseline");
            continue;
        };
        // Running average
        height = (height * count + best_y) / (count + 1);
        count += 1;
    }
    height
}

/// Computes the distance in font units between the widest pair of linked
/// segments in the given characters.
pub fn stem_linking_limit(
    provider: &impl OutlineProvider,
    chars: &str,
    outline: &mut Outline,
    axis: &mut Axis,
    raw: &mut RawOutline,
) -> Result<i32, Error> {
    let mut max_width = 0;
    for ch in chars.chars() {
        if !load_reference(provider, ch, raw) {
            continue;
        }
        match outline.fill(raw, provider.units_per_em(), provider.scale()) {
            Ok(()) => {}
            Err(Error::InvalidOutline(reason)) => {
                log::debug!("skipping reference character {ch:?}: {reason}");
                continue;
            }
            Err(e) => return Err(e),
        }
        axis.reset(Axis::VERTICAL, outline.orientation);
        compute_segments(outline, axis)?;
        link_segments(outline, axis, 0);
        let segments = axis.segments.as_slice();
        for segment in segments {
            if let Some(link) = segment.link(segments) {
                let dist = (segment.pos as i32 - link.pos as i32).abs();
                max_width = max_width.max(dist);
            }
        }
    }
    Ok(max_width)
}

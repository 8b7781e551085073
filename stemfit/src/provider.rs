//! Source of glyph outlines and font metrics.

use crate::{fixed::fixed_div, Error};
use skrifa::{
    charmap::Charmap,
    instance::{LocationRef, Size},
    outline::{DrawSettings, OutlineGlyphCollection, OutlinePen},
    raw::{
        tables::{
            glyf::{Glyf, Glyph, SimpleGlyph},
            loca::Loca,
        },
        FontRef, TableProvider,
    },
    GlyphId, MetadataProvider, Tag,
};

/// Curve type of an outline point.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub enum PointKind {
    #[default]
    OnCurve,
    /// Quadratic (conic) control point.
    Quad,
    /// Cubic control point.
    Cubic,
}

/// Point in a raw outline.
///
/// Coordinates are in font units when loaded and in 26.6 pixels after an
/// outline has been written back by the hinter.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct RawPoint {
    pub x: i32,
    pub y: i32,
    pub kind: PointKind,
}

impl RawPoint {
    pub fn new(x: i32, y: i32, kind: PointKind) -> Self {
        Self { x, y, kind }
    }

    pub fn on(x: i32, y: i32) -> Self {
        Self::new(x, y, PointKind::OnCurve)
    }
}

/// Flat outline representation: points and contour end indices.
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct RawOutline {
    pub points: Vec<RawPoint>,
    /// Index of the last point of each contour.
    pub contour_ends: Vec<usize>,
}

impl RawOutline {
    pub fn clear(&mut self) {
        self.points.clear();
        self.contour_ends.clear();
    }

    /// Returns an iterator over the point ranges of each contour.
    pub fn contours(&self) -> impl Iterator<Item = core::ops::Range<usize>> + '_ {
        let mut start = 0;
        self.contour_ends.iter().map(move |&end| {
            let range = start..end + 1;
            start = end + 1;
            range
        })
    }
}

/// Scale factors from font units to 26.6 pixels as 16.16 values.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Scale {
    pub x_scale: i32,
    pub y_scale: i32,
}

impl Scale {
    /// Identity scale.
    pub const UNIT: Self = Self {
        x_scale: 0x10000,
        y_scale: 0x10000,
    };

    /// Computes the scale for a pixels per em value in 26.6.
    pub fn from_ppem(ppem: i32, units_per_em: u16) -> Self {
        let scale = fixed_div(ppem, units_per_em.max(1) as i32);
        Self {
            x_scale: scale,
            y_scale: scale,
        }
    }

    /// Computes the scale for a character size in half points at the given
    /// resolution.
    ///
    /// A size of 18 half points is 9pt, which is 12 pixels per em at 96 dpi.
    pub fn from_size(half_points: u32, dpi: u32, units_per_em: u16) -> Self {
        Self::from_ppem(size_to_ppem(half_points, dpi), units_per_em)
    }

    /// Same as [`from_size`](Self::from_size) but with the pixels per em
    /// rounded to a whole pixel.
    ///
    /// This is what TrueType fonts that set bit 3 of the `head` flags get.
    pub fn from_size_integer_ppem(half_points: u32, dpi: u32, units_per_em: u16) -> Self {
        let ppem = size_to_ppem(half_points, dpi).saturating_add(32) & !63;
        Self::from_ppem(ppem, units_per_em)
    }
}

/// Converts a character size in half points to pixels per em in 26.6.
fn size_to_ppem(half_points: u32, dpi: u32) -> i32 {
    let char_size = half_points as i64 * 64 / 2;
    let ppem = (char_size * dpi as i64 + 36) / 72;
    ppem.min(i32::MAX as i64) as i32
}

impl Default for Scale {
    fn default() -> Self {
        Self::UNIT
    }
}

/// Unscaled bounding box in font units.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct Bounds {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

/// Supplies outlines and metrics to the analysis.
pub trait OutlineProvider {
    /// Design units per em.
    fn units_per_em(&self) -> u16;

    /// Scale from font units to 26.6 pixels at the current size.
    fn scale(&self) -> Scale;

    /// Bounding box of all glyphs in font units, if known.
    fn bounds(&self) -> Option<Bounds>;

    /// Maps a character through the Unicode character map.
    fn map_char(&self, ch: char) -> Option<GlyphId>;

    /// Loads the unscaled outline for the given glyph, replacing the
    /// contents of `outline`.
    fn load_unscaled(&self, glyph_id: GlyphId, outline: &mut RawOutline) -> Result<(), Error>;
}

/// Outline provider backed by a font.
///
/// Simple TrueType glyphs are read straight from the `glyf` table so the
/// analysis sees the points stored in the font. Everything else is drawn
/// through [`RawOutlinePen`].
pub struct FontProvider<'a> {
    glyphs: OutlineGlyphCollection<'a>,
    charmap: Charmap<'a>,
    glyf: Option<(Loca<'a>, Glyf<'a>)>,
    units_per_em: u16,
    force_integer_ppem: bool,
    bounds: Option<Bounds>,
    scale: Scale,
}

impl<'a> FontProvider<'a> {
    /// Creates a provider for the font at a character size in half points
    /// and a resolution in dots per inch.
    pub fn new(font: &FontRef<'a>, half_points: u32, dpi: u32) -> Self {
        let metrics = font.metrics(Size::unscaled(), LocationRef::default());
        let units_per_em = metrics.units_per_em;
        let bounds = metrics.bounds.map(|bounds| Bounds {
            x_min: bounds.x_min as i32,
            y_min: bounds.y_min as i32,
            x_max: bounds.x_max as i32,
            y_max: bounds.y_max as i32,
        });
        let glyf = font.loca(None).ok().zip(font.glyf().ok());
        let force_integer_ppem = glyf.is_some() && head_flags(font) & FORCE_INTEGER_PPEM != 0;
        let mut provider = Self {
            glyphs: font.outline_glyphs(),
            charmap: font.charmap(),
            glyf,
            units_per_em,
            force_integer_ppem,
            bounds,
            scale: Scale::default(),
        };
        provider.set_size(half_points, dpi);
        provider
    }

    /// Changes the character size.
    pub fn set_size(&mut self, half_points: u32, dpi: u32) {
        self.scale = if self.force_integer_ppem {
            Scale::from_size_integer_ppem(half_points, dpi, self.units_per_em)
        } else {
            Scale::from_size(half_points, dpi, self.units_per_em)
        };
    }

    fn simple_glyph(&self, glyph_id: GlyphId) -> Option<SimpleGlyph<'a>> {
        let (loca, glyf) = self.glyf.as_ref()?;
        match loca.get_glyf(glyph_id, glyf) {
            Ok(Some(Glyph::Simple(simple))) => Some(simple),
            _ => None,
        }
    }
}

/// Bit 3 of the `head` flags: scale with whole pixels per em.
const FORCE_INTEGER_PPEM: u16 = 1 << 3;

fn head_flags(font: &FontRef) -> u16 {
    // flags follow the version, revision, checksum and magic fields
    font.table_data(Tag::new(b"head"))
        .and_then(|data| data.read_at::<u16>(16).ok())
        .unwrap_or_default()
}

impl OutlineProvider for FontProvider<'_> {
    fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    fn scale(&self) -> Scale {
        self.scale
    }

    fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    fn map_char(&self, ch: char) -> Option<GlyphId> {
        self.charmap.map(ch)
    }

    fn load_unscaled(&self, glyph_id: GlyphId, outline: &mut RawOutline) -> Result<(), Error> {
        outline.clear();
        if let Some(simple) = self.simple_glyph(glyph_id) {
            outline.points.extend(simple.points().map(|point| {
                let kind = if point.on_curve {
                    PointKind::OnCurve
                } else {
                    PointKind::Quad
                };
                RawPoint::new(point.x as i32, point.y as i32, kind)
            }));
            outline.contour_ends.extend(
                simple
                    .end_pts_of_contours()
                    .iter()
                    .map(|end| end.get() as usize),
            );
            return Ok(());
        }
        let glyph = self
            .glyphs
            .get(glyph_id)
            .ok_or(Error::GlyphNotFound(glyph_id))?;
        let mut pen = RawOutlinePen::new(outline);
        glyph.draw(
            DrawSettings::unhinted(Size::unscaled(), LocationRef::default()),
            &mut pen,
        )?;
        pen.finish();
        Ok(())
    }
}

/// Pen that rebuilds points, curve kinds and contour ends from path
/// commands.
///
/// Coordinates are truncated to integers. Drawing a TrueType contour
/// inserts an on-curve point halfway between consecutive quadratic control
/// points; those are removed again so the result matches the stored
/// points up to the choice of the first point. An explicit on-curve point
/// at the exact midpoint can't be told apart and goes as well. Unused moves
/// and lines to the current point are dropped, as is a final point that
/// repeats the start of its contour.
pub(crate) struct RawOutlinePen<'a> {
    outline: &'a mut RawOutline,
    contour_start: usize,
    pending_move: Option<RawPoint>,
    /// Unrounded start of the current contour.
    start: (f32, f32),
    /// Control point of the first command when it was a quadratic curve.
    first_control: Option<(f32, f32)>,
    /// Control and end point of the previous command when it was a
    /// quadratic curve.
    last_quad: Option<[(f32, f32); 2]>,
}

impl<'a> RawOutlinePen<'a> {
    pub fn new(outline: &'a mut RawOutline) -> Self {
        let contour_start = outline.points.len();
        Self {
            outline,
            contour_start,
            pending_move: None,
            start: (0.0, 0.0),
            first_control: None,
            last_quad: None,
        }
    }

    /// Closes a trailing contour that was not explicitly closed.
    pub fn finish(&mut self) {
        self.close();
    }

    fn flush_pending_move(&mut self) {
        if let Some(start) = self.pending_move.take() {
            self.contour_start = self.outline.points.len();
            self.outline.points.push(start);
        }
    }

    fn current(&self) -> Option<RawPoint> {
        self.pending_move.or_else(|| {
            self.outline
                .points
                .get(self.contour_start..)
                .and_then(|points| points.last())
                .copied()
        })
    }

    fn push(&mut self, x: f32, y: f32, kind: PointKind) {
        self.outline
            .points
            .push(RawPoint::new(x as i32, y as i32, kind));
    }
}

/// Returns true if `point` lies halfway between `a` and `b`, allowing for
/// the 26.6 rounding of the outline loader.
fn is_midpoint(a: (f32, f32), b: (f32, f32), point: (f32, f32)) -> bool {
    const TOLERANCE: f32 = 1.0 / 64.0;
    ((a.0 + b.0) * 0.5 - point.0).abs() <= TOLERANCE
        && ((a.1 + b.1) * 0.5 - point.1).abs() <= TOLERANCE
}

impl OutlinePen for RawOutlinePen<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        self.close();
        self.pending_move = Some(RawPoint::on(x as i32, y as i32));
        self.start = (x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.last_quad = None;
        let to = RawPoint::on(x as i32, y as i32);
        if self.current() == Some(to) {
            return;
        }
        self.flush_pending_move();
        self.outline.points.push(to);
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        let is_first = self.pending_move.is_some();
        self.flush_pending_move();
        if is_first {
            self.first_control = Some((cx0, cy0));
        }
        if let Some([control, end]) = self.last_quad {
            if is_midpoint(control, (cx0, cy0), end)
                && self.outline.points.len() > self.contour_start + 1
            {
                self.outline.points.pop();
            }
        }
        self.push(cx0, cy0, PointKind::Quad);
        self.push(x, y, PointKind::OnCurve);
        self.last_quad = Some([(cx0, cy0), (x, y)]);
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        self.last_quad = None;
        self.flush_pending_move();
        self.push(cx0, cy0, PointKind::Cubic);
        self.push(cx1, cy1, PointKind::Cubic);
        self.push(x, y, PointKind::OnCurve);
    }

    fn close(&mut self) {
        // A move that was never followed by a drawing command is dropped
        self.pending_move = None;
        let last_quad = self.last_quad.take();
        let first_control = self.first_control.take();
        let points = &mut self.outline.points;
        let start = self.contour_start;
        if points.len() <= start {
            return;
        }
        if points.len() - start > 1 {
            let first = points[start];
            if points.last() == Some(&first) && first.kind == PointKind::OnCurve {
                points.pop();
                // A contour made only of control points starts on an
                // implied point between the last and first controls
                if let (Some([last_control, _]), Some(first_control)) = (last_quad, first_control)
                {
                    if points.len() - start > 2
                        && is_midpoint(last_control, first_control, self.start)
                    {
                        points.remove(start);
                    }
                }
            }
        }
        self.outline.contour_ends.push(points.len() - 1);
        self.contour_start = points.len();
    }
}

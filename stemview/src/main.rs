//! Glyph viewer for outline analysis.
//!
//! Renders a glyph to SVG on a pixel grid along with the edges detected in
//! its outline, optionally after applying the custom vertical alignment.

use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use skrifa::{raw::ReadError, FontRef, GlyphId};
use stemfit::{
    draw_edges, AlignmentConfig, Analysis, Color, EdgeColors, FontProvider, OutlineProvider,
    RawOutline,
};

mod dump;
mod svg;

use svg::{point_bounds, scaled_bounds, SvgCanvas, View};

/// Size of the rendered image in pixels.
const IMAGE_WIDTH: f64 = 600.0;
const IMAGE_HEIGHT: f64 = 450.0;

const GRID_COLOR: Color = Color::rgb(0, 0, 0);
const OUTLINE_COLOR: Color = Color::rgb(255, 0, 0);
const CONTROL_POINT_COLOR: Color = Color::rgb(0, 179, 0);

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The font file.
    font: PathBuf,

    /// Index of the glyph to display.
    #[arg(short, long, conflicts_with = "char")]
    glyph: Option<u32>,

    /// Character to display, mapped through the character map of the font.
    #[arg(short, long)]
    char: Option<char>,

    /// Character size in half points.
    #[arg(short, long, default_value_t = 18, value_parser = clap::value_parser!(u32).range(2..=100))]
    size: u32,

    /// Resolution in dots per inch.
    #[arg(long, default_value_t = 96)]
    dpi: u32,

    /// What to display.
    #[arg(short, long, value_enum, default_value_t)]
    mode: Mode,

    /// The output SVG file. Written to stdout when missing, unless dumping.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the points, segments and edges of the glyph.
    #[arg(long)]
    dump: bool,

    /// Don't draw the pixel grid.
    #[arg(long)]
    no_grid: bool,

    /// Don't draw the outline and its points.
    #[arg(long)]
    no_outline: bool,

    /// Color of edges that are part of a stem, as #rrggbb or #rrggbbaa.
    #[arg(long, value_parser = parse_color)]
    linked_color: Option<Color>,

    /// Color of serif edges.
    #[arg(long, value_parser = parse_color)]
    serif_color: Option<Color>,

    /// Color of all other edges.
    #[arg(long, value_parser = parse_color)]
    unlinked_color: Option<Color>,
}

/// Specifies how the glyph is processed.
#[derive(clap::ValueEnum, Copy, Clone, PartialEq, Eq, Default, Debug)]
enum Mode {
    /// The scaled outline with its detected edges.
    Edges,
    /// The scaled outline without any adjustments.
    Uniform,
    /// The outline after custom alignment, with its detected edges.
    #[default]
    Custom,
}

#[derive(Debug, thiserror::Error)]
enum ViewError {
    #[error("failed to read '{}': {}", .0.display(), .1)]
    Read(PathBuf, std::io::Error),
    #[error("failed to write '{}': {}", .0.display(), .1)]
    Write(PathBuf, std::io::Error),
    #[error("failed to parse font: {0}")]
    Font(#[from] ReadError),
    #[error(transparent)]
    Analysis(#[from] stemfit::Error),
}

/// Parses a color in the form #rrggbb or #rrggbbaa.
fn parse_color(value: &str) -> Result<Color, String> {
    let digits = value
        .strip_prefix('#')
        .ok_or_else(|| format!("color '{value}' must start with '#'"))?;
    if !(digits.len() == 6 || digits.len() == 8) || !digits.is_ascii() {
        return Err(format!("color '{value}' must have 6 or 8 hex digits"));
    }
    let component = |ix: usize| {
        digits
            .get(ix..ix + 2)
            .and_then(|digits| u8::from_str_radix(digits, 16).ok())
            .ok_or_else(|| format!("invalid hex digits in color '{value}'"))
    };
    let alpha = if digits.len() == 8 { component(6)? } else { 255 };
    Ok(Color::new(component(0)?, component(2)?, component(4)?, alpha))
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), ViewError> {
    let data = std::fs::read(&args.font).map_err(|e| ViewError::Read(args.font.clone(), e))?;
    let font = FontRef::new(&data)?;
    let provider = FontProvider::new(&font, args.size, args.dpi);
    let glyph_id = match args.char {
        Some(ch) => provider
            .map_char(ch)
            .ok_or(stemfit::Error::MissingCharacter(ch))?,
        None => GlyphId::new(args.glyph.unwrap_or_default()),
    };
    let config = AlignmentConfig::default();
    let mut analysis = Analysis::new();
    let mut outline = RawOutline::default();
    match args.mode {
        Mode::Edges | Mode::Uniform => {
            analysis.detect_edges(&provider, glyph_id, &config)?;
            analysis.outline().write(&mut outline);
        }
        Mode::Custom => {
            let metrics = analysis.load_hinted(&provider, glyph_id, &config, &mut outline)?;
            log::info!(
                "cap height {} -> {}, x height {} -> {}",
                metrics.cap_height.scaled,
                metrics.cap_height.fitted,
                metrics.x_height.scaled,
                metrics.x_height.fitted
            );
        }
    }
    if args.dump {
        let mut text = String::new();
        // Writing to a string can't fail
        let _ = dump::dump(&analysis, &mut text);
        print!("{text}");
    }
    if args.output.is_none() && args.dump {
        return Ok(());
    }
    let bounds = provider
        .bounds()
        .map(|bounds| scaled_bounds(bounds, provider.scale()))
        .unwrap_or_else(|| point_bounds(&outline));
    let mut canvas = SvgCanvas::new(View::fit(bounds, IMAGE_WIDTH, IMAGE_HEIGHT));
    if !args.no_grid {
        canvas.draw_grid(GRID_COLOR);
    }
    if !args.no_outline {
        canvas.draw_outline(&outline, OUTLINE_COLOR);
        canvas.draw_points(&outline, OUTLINE_COLOR, CONTROL_POINT_COLOR);
    }
    if args.mode != Mode::Uniform {
        let defaults = EdgeColors::default();
        let colors = EdgeColors {
            linked: args.linked_color.unwrap_or(defaults.linked),
            serif: args.serif_color.unwrap_or(defaults.serif),
            unlinked: args.unlinked_color.unwrap_or(defaults.unlinked),
        };
        draw_edges(&analysis, &mut canvas, &colors);
    }
    let document = canvas.finish();
    match &args.output {
        Some(path) => {
            std::fs::write(path, document).map_err(|e| ViewError::Write(path.clone(), e))?;
            log::info!("wrote {}", path.display());
        }
        None => print!("{document}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn colors() {
        assert_eq!(parse_color("#ff8000"), Ok(Color::new(255, 128, 0, 255)));
        assert_eq!(parse_color("#0000ff80"), Ok(Color::new(0, 0, 255, 128)));
        assert!(parse_color("ff8000").is_err());
        assert!(parse_color("#ff80").is_err());
        assert!(parse_color("#gg8000").is_err());
        assert!(parse_color("#ff80é0").is_err());
    }

    #[test]
    fn arguments() {
        let args = Args::try_parse_from(["stemview", "font.ttf", "--char", "H", "--mode", "edges"])
            .unwrap();
        assert_eq!(args.char, Some('H'));
        assert_eq!(args.mode, Mode::Edges);
        assert_eq!(args.size, 18);
        assert_eq!(args.dpi, 96);
        // Sizes are limited to 1 through 50 points
        assert!(Args::try_parse_from(["stemview", "font.ttf", "--size", "101"]).is_err());
        assert!(Args::try_parse_from(["stemview", "font.ttf", "--size", "1"]).is_err());
        assert!(Args::try_parse_from(["stemview", "font.ttf", "-g", "3", "-c", "a"]).is_err());
    }
}

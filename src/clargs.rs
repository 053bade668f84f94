use crate::render_loop::DEFAULT_GLYPH_SIZE;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about=None)]
pub(crate) struct RainArgs {
    /// Initial width of the window, in pixels
    #[arg(short = 'x', long, default_value = "800")]
    pub width: f32,

    /// Initial height of the window, in pixels
    #[arg(short = 'y', long, default_value = "600")]
    pub height: f32,

    /// Path to the settings storage file [default: storage.json in the platform config directory]
    #[arg(short, long)]
    pub storage: Option<PathBuf>,

    /// Size of each glyph cell, in pixels
    #[arg(short, long, default_value_t = DEFAULT_GLYPH_SIZE, value_parser = parse_glyph_size)]
    pub glyph_size: f32,

    /// Seed for the glyph and column reset randomness, for a repeatable animation
    #[arg(long)]
    pub seed: Option<u64>,

    /// Path to a TTF or OTF font to draw glyphs with, e.g. one that covers katakana
    #[arg(short, long)]
    pub font: Option<PathBuf>,

    /// Maximum level of log messages to print
    #[arg(long, default_value = "info")]
    pub log_level: log::LevelFilter,
}

fn parse_glyph_size(s: &str) -> Result<f32, String> {
    let size: f32 = s.parse().map_err(|e| format!("{e}"))?;
    if size.is_finite() && size >= 4.0 {
        Ok(size)
    } else {
        Err("glyph size must be at least 4 pixels".to_string())
    }
}

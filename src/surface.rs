use crate::render_config::HexColor;

/// Something the render loop can draw onto
pub trait Surface {
    /// Composite `color` at the given alpha over the whole surface
    fn fill_rect(&mut self, color: HexColor, alpha: f32);

    /// Draw a glyph with its baseline at pixel `(x, y)`
    fn fill_text(&mut self, glyph: char, x: f32, y: f32, color: HexColor);
}

/// Glyphs fainter than this against the background are not worth drawing
const INVISIBLE_INK: f32 = 1.0 / 255.0;

fn blend(dst: &mut [f32; 3], src: [f32; 3], alpha: f32) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d += (s - *d) * alpha;
    }
}

/// A glyph left on the surface, along with its current, faded color
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacedGlyph {
    pub column: usize,
    pub row: usize,
    pub glyph: char,
    pub ink: [f32; 3],
}

/// A grid of glyph sized cells that keeps whatever was drawn into it.
///
/// Every fill covers the whole surface, so the background is one color shared by all cells.
/// Translucent fills fade earlier glyphs instead of clearing them, which is what leaves trails
/// behind the falling columns.
#[derive(Clone, Debug)]
pub struct GlyphSurface {
    glyph_size: f32,
    columns: usize,
    rows: usize,
    fill: [f32; 3],
    glyphs: Vec<Option<(char, [f32; 3])>>,
}

impl GlyphSurface {
    /// An empty (black) surface covering `width` by `height` pixels
    pub fn new(width: f32, height: f32, glyph_size: f32) -> Self {
        let columns = (width.max(0.0) / glyph_size).ceil() as usize;
        let rows = (height.max(0.0) / glyph_size).ceil() as usize;

        Self {
            glyph_size,
            columns,
            rows,
            fill: [0.0; 3],
            glyphs: vec![None; columns * rows],
        }
    }

    pub fn glyph_size(&self) -> f32 {
        self.glyph_size
    }

    /// Background color of the whole surface
    pub fn fill(&self) -> [f32; 3] {
        self.fill
    }

    /// Glyphs that still stand out from the background
    pub fn visible_glyphs(&self) -> impl Iterator<Item = PlacedGlyph> + '_ {
        let columns = self.columns.max(1);
        let fill = self.fill;

        self.glyphs
            .iter()
            .enumerate()
            .filter_map(move |(i, cell)| {
                let (glyph, ink) = (*cell)?;
                Some(PlacedGlyph {
                    column: i % columns,
                    row: i / columns,
                    glyph,
                    ink,
                })
            })
            .filter(move |placed| {
                placed
                    .ink
                    .iter()
                    .zip(fill)
                    .any(|(i, f)| (i - f).abs() > INVISIBLE_INK)
            })
    }
}

impl Surface for GlyphSurface {
    fn fill_rect(&mut self, color: HexColor, alpha: f32) {
        let color = color.to_unit_rgb();
        let alpha = alpha.clamp(0.0, 1.0);

        blend(&mut self.fill, color, alpha);
        for (_, ink) in self.glyphs.iter_mut().flatten() {
            blend(ink, color, alpha);
        }
    }

    fn fill_text(&mut self, glyph: char, x: f32, y: f32, color: HexColor) {
        if x < 0.0 || y < self.glyph_size {
            return;
        }

        // The glyph sits in the row above its baseline
        let column = (x / self.glyph_size) as usize;
        let row = (y / self.glyph_size) as usize - 1;

        if column < self.columns && row < self.rows {
            self.glyphs[row * self.columns + column] = Some((glyph, color.to_unit_rgb()));
        }
    }
}

use crate::render_config::RenderConfig;
use crate::surface::Surface;
use rand::Rng;

/// Edge length of one glyph cell, in pixels
pub const DEFAULT_GLYPH_SIZE: f32 = 12.0;

/// Glyphs the rain is drawn from
pub const GLYPHS: &str =
    "アァイイウエオカキクケコサシスセソタチツテトナニヌネノハヒフヘホ0123456789";

/// A column past the bottom edge restarts at the top when a uniform draw exceeds this
const RESET_THRESHOLD: f64 = 0.98;

/// Column layout and fall progress for the current surface size
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationState {
    pub surface_width: f32,
    pub surface_height: f32,
    /// Next glyph row to draw for each column
    pub column_positions: Vec<u32>,
}

impl AnimationState {
    pub fn new(width: f32, height: f32, glyph_size: f32) -> Self {
        let column_count = (width.max(0.0) / glyph_size).floor() as usize;

        Self {
            surface_width: width,
            surface_height: height,
            column_positions: vec![1; column_count],
        }
    }

    pub fn column_count(&self) -> usize {
        self.column_positions.len()
    }
}

/// What a call to [`RenderLoop::tick`] did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Too soon after the previous frame, nothing drawn
    Skipped,
    Rendered,
}

/// Throttled digital rain animation.
///
/// The host calls [`RenderLoop::tick`] as often as it likes; frames are only drawn once the
/// configured frame interval has passed.
pub struct RenderLoop<R: Rng> {
    state: AnimationState,
    glyph_size: f32,
    glyphs: Vec<char>,
    last_frame_time: f64,
    rng: R,
}

impl<R: Rng> RenderLoop<R> {
    pub fn new(width: f32, height: f32, glyph_size: f32, rng: R) -> Self {
        Self {
            state: AnimationState::new(width, height, glyph_size),
            glyph_size,
            glyphs: GLYPHS.chars().collect(),
            last_frame_time: 0.0,
            rng,
        }
    }

    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    pub fn glyph_size(&self) -> f32 {
        self.glyph_size
    }

    /// Lay the columns out again for a new surface size, restarting every column
    pub fn reinitialize(&mut self, width: f32, height: f32) {
        self.state = AnimationState::new(width, height, self.glyph_size);
        log::debug!(
            "Reinitialized rain for {width}x{height} with {} columns.",
            self.state.column_count()
        );
    }

    /// Forget all progress and frame timing, keeping the current surface size
    pub fn restart(&mut self) {
        self.last_frame_time = 0.0;
        self.reinitialize(self.state.surface_width, self.state.surface_height);
    }

    /// Draw the next frame if enough time has passed since the last one.
    ///
    /// `timestamp` is in milliseconds, from any fixed origin.
    pub fn tick(
        &mut self,
        timestamp: f64,
        config: &RenderConfig,
        surface: &mut impl Surface,
    ) -> TickOutcome {
        if timestamp - self.last_frame_time < config.frame_interval_ms() {
            return TickOutcome::Skipped;
        }

        self.last_frame_time = timestamp;
        self.render_step(config, surface);
        TickOutcome::Rendered
    }

    fn render_step(&mut self, config: &RenderConfig, surface: &mut impl Surface) {
        surface.fill_rect(config.background_color, config.trail_opacity as f32);

        for (column, position) in self.state.column_positions.iter_mut().enumerate() {
            let glyph = self.glyphs[self.rng.gen_range(0..self.glyphs.len())];
            let x = column as f32 * self.glyph_size;
            let y = *position as f32 * self.glyph_size;
            surface.fill_text(glyph, x, y, config.text_color);

            if y > self.state.surface_height && self.rng.gen::<f64>() > RESET_THRESHOLD {
                *position = 0;
            }

            *position += 1;
        }
    }
}

use crate::error::SettingsError;
use crate::render_config::{ConfigChange, ControlValues, RenderConfig};
use crate::render_loop::{RenderLoop, TickOutcome};
use crate::settings_store::{RestartRequired, SettingsStore};
use crate::storage::KeyValueStore;
use crate::surface::GlyphSurface;
use rand::Rng;
use std::path::Path;

/// Everything the rain needs at runtime, owned by the host and driven through explicit calls
pub struct RainContext<S: KeyValueStore, R: Rng> {
    store: SettingsStore<S>,
    controls: ControlValues,
    render_loop: RenderLoop<R>,
    surface: GlyphSurface,
}

impl<S: KeyValueStore, R: Rng> RainContext<S, R> {
    /// Load settings from `storage` and lay out a `width` by `height` surface
    pub fn start(storage: S, width: f32, height: f32, glyph_size: f32, rng: R) -> Self {
        let mut store = SettingsStore::new(storage);
        let controls = store.load_or_default();

        Self {
            store,
            controls,
            render_loop: RenderLoop::new(width, height, glyph_size, rng),
            surface: GlyphSurface::new(width, height, glyph_size),
        }
    }

    /// Reload settings from storage and start the animation over, as if the program had been relaunched
    pub fn restart(&mut self) {
        log::info!("Restarting with stored settings.");
        self.controls = self.store.load_or_default();

        let state = self.render_loop.state();
        let (width, height) = (state.surface_width, state.surface_height);
        self.render_loop.restart();
        self.surface = GlyphSurface::new(width, height, self.render_loop.glyph_size());
    }

    pub fn config(&self) -> &RenderConfig {
        self.store.config()
    }

    pub fn store(&self) -> &SettingsStore<S> {
        &self.store
    }

    pub fn surface(&self) -> &GlyphSurface {
        &self.surface
    }

    /// Current values for the settings panel's input controls
    pub fn controls_mut(&mut self) -> &mut ControlValues {
        &mut self.controls
    }

    /// Resize the drawing surface if its dimensions changed
    pub fn resize(&mut self, width: f32, height: f32) {
        let state = self.render_loop.state();
        if state.surface_width == width && state.surface_height == height {
            return;
        }

        log::info!("Surface resized to {width}x{height}.");
        self.render_loop.reinitialize(width, height);
        self.surface = GlyphSurface::new(width, height, self.render_loop.glyph_size());
    }

    pub fn on_config_change(&mut self, change: ConfigChange) -> Result<(), SettingsError> {
        self.store.on_config_change(change)
    }

    pub fn tick(&mut self, timestamp: f64) -> TickOutcome {
        self.render_loop
            .tick(timestamp, self.store.config(), &mut self.surface)
    }

    pub fn reset(&mut self) -> Result<(), SettingsError> {
        let RestartRequired = self.store.reset()?;
        self.restart();
        Ok(())
    }

    pub fn export_to_file(&self, path: &Path) -> Result<(), SettingsError> {
        self.store.export_to_file(path)
    }

    /// Import settings from `path`; on failure nothing changes
    pub fn import_from_file(&mut self, path: &Path) -> Result<(), SettingsError> {
        let RestartRequired = self.store.import_from_file(path)?;
        self.restart();
        Ok(())
    }
}

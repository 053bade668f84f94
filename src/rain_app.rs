use crate::clargs::RainArgs;
use crate::context::RainContext;
use crate::render_config::{ConfigChange, HexColor};
use crate::settings_store::EXPORT_FILE_NAME;
use crate::storage::{default_storage_path, FileStore};
use eframe::egui::{
    Align2, Color32, Context, FontData, FontDefinitions, FontFamily, FontId, Rounding, Sense,
    Vec2,
};
use eframe::{egui, App, CreationContext, Frame};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::path::Path;

const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

/// Something the user asked for from the menu bar or settings panel
enum UiAction {
    Change(ConfigChange),
    CloseSettings,
    Reset,
    Export,
    Import,
}

pub struct RainApp {
    context: RainContext<FileStore, StdRng>,
    settings_open: bool,
    status_msg: String,
}

impl RainApp {
    pub(crate) fn new(cc: &CreationContext<'_>, args: &RainArgs) -> Self {
        if let Some(font) = &args.font {
            install_font(&cc.egui_ctx, font);
        }

        let storage = FileStore::open(args.storage.clone().unwrap_or_else(default_storage_path));

        let rng = match args.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let context = RainContext::start(storage, args.width, args.height, args.glyph_size, rng);
        log::info!(
            "Using settings storage at {}.",
            context.store().storage().path().display()
        );

        Self {
            context,
            settings_open: false,
            status_msg: format!("Welcome to Matrix Rain v{}", VERSION.unwrap_or("unknown")),
        }
    }

    fn set_status_msg(&mut self, msg: String) {
        self.status_msg = format!(">> {msg}");
    }

    fn settings_window(&mut self, ctx: &Context) -> Vec<UiAction> {
        let mut actions = Vec::new();
        let mut open = self.settings_open;

        egui::Window::new("Settings")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                let controls = self.context.controls_mut();

                ui.horizontal(|ui| {
                    if ui.color_edit_button_srgb(&mut controls.text_color).changed() {
                        actions.push(UiAction::Change(ConfigChange::TextColor(HexColor(
                            controls.text_color,
                        ))));
                    }
                    ui.label("Text color");
                });

                ui.horizontal(|ui| {
                    if ui.color_edit_button_srgb(&mut controls.background_color).changed() {
                        actions.push(UiAction::Change(ConfigChange::BackgroundColor(HexColor(
                            controls.background_color,
                        ))));
                    }
                    ui.label("Background color");
                });

                if ui
                    .add(egui::Slider::new(&mut controls.opacity_percent, 0..=100).text("Trail opacity (%)"))
                    .changed()
                {
                    actions.push(UiAction::Change(ConfigChange::OpacityPercent(
                        controls.opacity_percent,
                    )));
                }

                if ui
                    .add(egui::Slider::new(&mut controls.speed, 1..=120).text("Speed (FPS)"))
                    .changed()
                {
                    actions.push(UiAction::Change(ConfigChange::Speed(controls.speed)));
                }

                ui.separator();

                ui.horizontal(|ui| {
                    if ui.button("Close").clicked() {
                        actions.push(UiAction::CloseSettings);
                    }
                    if ui.button("Reset").clicked() {
                        actions.push(UiAction::Reset);
                    }
                    if ui.button("Export").clicked() {
                        actions.push(UiAction::Export);
                    }
                    if ui.button("Import").clicked() {
                        actions.push(UiAction::Import);
                    }
                });
            });

        self.settings_open = open;
        actions
    }

    fn handle(&mut self, action: UiAction) {
        match action {
            UiAction::Change(change) => {
                if let Err(e) = self.context.on_config_change(change) {
                    log::error!("Failed to save settings.");
                    log::debug!("Failed to save settings with the following error: {e}");
                    self.set_status_msg(format!("Unable to save settings: {e}"));
                }
            }
            UiAction::CloseSettings => self.settings_open = false,
            UiAction::Reset => match self.context.reset() {
                Ok(()) => self.set_status_msg("Settings reset to defaults".to_string()),
                Err(e) => {
                    log::error!("Failed to reset settings.");
                    self.set_status_msg(format!("Unable to reset settings: {e}"));
                }
            },
            UiAction::Export => {
                let path = rfd::FileDialog::new()
                    .set_title("Export settings")
                    .set_file_name(EXPORT_FILE_NAME)
                    .add_filter("Settings", &["json"])
                    .save_file();

                if let Some(path) = path {
                    match self.context.export_to_file(&path) {
                        Ok(()) => self.set_status_msg(format!("Exported settings to {}", path.display())),
                        Err(e) => {
                            log::error!("Failed to export settings.");
                            self.set_status_msg(format!("Unable to export settings: {e}"));
                        }
                    }
                }
            }
            UiAction::Import => {
                let path = rfd::FileDialog::new()
                    .set_title("Import settings")
                    .add_filter("Settings", &["json"])
                    .pick_file();

                if let Some(path) = path {
                    match self.context.import_from_file(&path) {
                        Ok(()) => self.set_status_msg(format!("Imported settings from {}", path.display())),
                        Err(e) => {
                            log::error!("Failed to import settings.");
                            log::debug!("Failed to import settings with the following error: {e}");
                            self.set_status_msg(format!("Invalid settings file: {e}"));
                        }
                    }
                }
            }
        }
    }
}

impl App for RainApp {
    fn update(&mut self, ctx: &Context, _frame: &mut Frame) {
        // Render the menu bar
        egui::TopBottomPanel::top("menu bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                if ui.button("Settings").clicked() {
                    self.settings_open = !self.settings_open;
                }
            });
        });

        // Render the settings panel, then apply whatever was changed in it
        for action in self.settings_window(ctx) {
            self.handle(action);
        }

        // Render the status message at the bottom of the screen
        egui::TopBottomPanel::bottom("status_msg").show(ctx, |ui| {
            ui.label(self.status_msg.clone());
        });

        // Advance and render the rain
        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::hover());
                let size = response.rect.size();

                self.context.resize(size.x, size.y);
                self.context.tick(ctx.input(|i| i.time) * 1000.0);

                let surface = self.context.surface();
                let glyph_size = surface.glyph_size();
                let font = FontId::monospace(glyph_size);

                painter.rect_filled(response.rect, Rounding::none(), to_color32(surface.fill()));

                for placed in surface.visible_glyphs() {
                    painter.text(
                        response.rect.min
                            + Vec2::new(
                                placed.column as f32 * glyph_size,
                                placed.row as f32 * glyph_size,
                            ),
                        Align2::LEFT_TOP,
                        placed.glyph,
                        font.clone(),
                        to_color32(placed.ink),
                    );
                }
            });

        // Keep the tick chain going
        ctx.request_repaint();
    }
}

fn to_color32(rgb: [f32; 3]) -> Color32 {
    let [r, g, b] = rgb.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
    Color32::from_rgb(r, g, b)
}

/// Put the font at `path` ahead of the built in monospace fonts
fn install_font(ctx: &Context, path: &Path) {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("Unable to read font {}, using the default font.", path.display());
            log::debug!("Failed to read font with the following error: {e}");
            return;
        }
    };

    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "glyph-font".to_string());

    let mut fonts = FontDefinitions::default();
    fonts
        .font_data
        .insert(name.clone(), FontData::from_owned(bytes));
    fonts
        .families
        .entry(FontFamily::Monospace)
        .or_default()
        .insert(0, name);
    ctx.set_fonts(fonts);

    log::info!("Loaded glyph font from {}.", path.display());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_round_to_nearest_byte() {
        assert_eq!(to_color32([0.0, 0.5, 1.0]), Color32::from_rgb(0, 128, 255));
        assert_eq!(to_color32([-1.0, 2.0, 0.2]), Color32::from_rgb(0, 255, 51));
    }
}

mod clargs;
mod context;
mod error;
mod rain_app;
mod render_config;
mod render_loop;
mod settings_store;
mod storage;
mod surface;

use crate::clargs::RainArgs;
use crate::rain_app::RainApp;
use clap::Parser;
use eframe::{egui, NativeOptions};
use simple_logger::SimpleLogger;

fn main() -> Result<(), eframe::Error> {
    let args = RainArgs::parse();

    if let Err(e) = SimpleLogger::new().with_level(args.log_level).init() {
        eprintln!("Unable to start logger: {e}");
    }

    // Setup window options
    let options = NativeOptions {
        initial_window_size: Some(egui::Vec2::new(args.width, args.height)),
        ..Default::default()
    };

    // Start the GUI
    eframe::run_native(
        "Matrix Rain",
        options,
        Box::new(move |cc| Box::new(RainApp::new(cc, &args))),
    )
}

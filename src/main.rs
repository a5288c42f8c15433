mod annotation;
mod app;
mod canvas;
mod capture;
mod compositor;
mod config;
mod controller;
mod history;
mod mapper;
mod overlay;
mod recorder;
mod report;
mod session;
mod store;
mod theme;
mod toolbar;
mod ui_controls;

use std::sync::Arc;

use eframe::egui;

use crate::recorder::ActivityRecorder;

fn main() -> eframe::Result<()> {
    let recorder = Arc::new(ActivityRecorder::default());
    if let Err(err) = recorder::init_logging(Arc::clone(&recorder)) {
        eprintln!("cannot install logger: {err}");
    }

    let viewport = egui::ViewportBuilder::default()
        .with_title("Bugmark")
        .with_inner_size([1080.0, 760.0])
        .with_min_inner_size([640.0, 480.0]);

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        "Bugmark",
        options,
        Box::new(move |cc| Box::new(app::BugmarkApp::new(cc, recorder))),
    )
}

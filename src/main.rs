mod app;
mod color;
mod data;
mod error;
mod state;
mod ui;

use app::VehicleDashApp;
use data::loader::{resolve_data_path, DATA_FILE_NAME};
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let data_path = resolve_data_path(DATA_FILE_NAME);
    log::info!("Using listings file {}", data_path.display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "US Vehicle Listings – Dashboard",
        options,
        Box::new(move |_cc| Ok(Box::new(VehicleDashApp::new(data_path)))),
    )
}

use std::path::PathBuf;

use eframe::egui::{self, RichText, ScrollArea, Ui};

use crate::state::AppState;
use crate::ui::{panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct VehicleDashApp {
    pub state: AppState,
}

impl VehicleDashApp {
    /// Build the app and load `data_path` straight away.
    pub fn new(data_path: PathBuf) -> Self {
        let mut state = AppState::new(data_path.clone());
        state.load(&data_path);
        Self { state }
    }
}

impl eframe::App for VehicleDashApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: metrics, charts, table ----
        egui::CentralPanel::default().show(ctx, |ui| {
            dashboard(ui, &self.state);
        });
    }
}

fn dashboard(ui: &mut Ui, state: &AppState) {
    if state.table.is_none() {
        let message = state
            .status_message
            .clone()
            .unwrap_or_else(|| "Open a listings file to begin  (File → Open…)".to_string());
        let color = if state.status_message.is_some() {
            ui.visuals().error_fg_color
        } else {
            ui.visuals().text_color()
        };
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading(RichText::new(message).color(color));
        });
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("US vehicle listings");
            ui.label(
                "Explore prices, mileage, model years and posting dates by vehicle type.",
            );
            ui.add_space(8.0);

            panels::metrics_row(ui, state);
            ui.separator();

            ui.columns(2, |cols| {
                plot::posting_year_chart(&mut cols[0], state);
                plot::price_distribution(&mut cols[1], state);
            });
            ui.separator();

            plot::price_scatter(ui, state);
            ui.separator();

            table::listings_table(ui, state);
        });
}

use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::Listing;
use crate::state::AppState;

const ROW_HEIGHT: f32 = 18.0;
const MAX_TABLE_HEIGHT: f32 = 320.0;

/// Display order; a column is shown only if the source file had it.
const COLUMNS: [&str; 13] = [
    "price",
    "model_year",
    "model",
    "condition",
    "cylinders",
    "fuel",
    "odometer",
    "transmission",
    "type",
    "paint_color",
    "is_4wd",
    "date_posted",
    "days_listed",
];

// ---------------------------------------------------------------------------
// Filtered listings table
// ---------------------------------------------------------------------------

/// Scrollable table of the visible listings. Only on-screen rows are laid out.
pub fn listings_table(ui: &mut Ui, state: &AppState) {
    let Some(table) = &state.table else {
        return;
    };
    let columns: Vec<&str> = COLUMNS
        .into_iter()
        .filter(|c| table.schema().has(c))
        .collect();

    ui.strong(format!("Listings ({})", state.visible_indices.len()));

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .columns(Column::auto().at_least(60.0), columns.len())
        .min_scrolled_height(0.0)
        .max_scroll_height(MAX_TABLE_HEIGHT)
        .header(20.0, |mut header| {
            for name in &columns {
                header.col(|ui| {
                    ui.strong(*name);
                });
            }
        })
        .body(|body| {
            body.rows(ROW_HEIGHT, state.visible_indices.len(), |mut row| {
                let Some(listing) = state.visible_row(row.index()) else {
                    return;
                };
                for name in &columns {
                    row.col(|ui| {
                        ui.label(cell(listing, name));
                    });
                }
            });
        });
}

/// Text of one cell; nulls render blank.
fn cell(l: &Listing, column: &str) -> String {
    let num = |v: Option<f64>| v.map(|x| format!("{x:.0}")).unwrap_or_default();
    let text = |v: &Option<String>| v.clone().unwrap_or_default();
    match column {
        "price" => num(l.price),
        "model_year" => num(l.model_year),
        "model" => text(&l.model),
        "condition" => text(&l.condition),
        "cylinders" => num(l.cylinders),
        "fuel" => text(&l.fuel),
        "odometer" => num(l.odometer),
        "transmission" => text(&l.transmission),
        "type" => text(&l.vehicle_type),
        "paint_color" => text(&l.paint_color),
        "is_4wd" => num(l.is_4wd),
        "date_posted" => l
            .date_posted
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        "days_listed" => num(l.days_listed),
        _ => String::new(),
    }
}

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::model::CategoryField;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let table = match &state.table {
        Some(t) => t.clone(),
        None => {
            ui.label("No data loaded.");
            return;
        }
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Per-column multi-selects (collapsible) ----
            for field in CategoryField::ALL {
                let all_values = table.category_values(field);
                if all_values.is_empty() {
                    continue;
                }

                let n_selected = state.selection.accepted(field).map_or(0, |s| s.len());
                let header_text = format!("{field}  ({n_selected}/{})", all_values.len());

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(field.column())
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| {
                        ui.horizontal(|ui: &mut Ui| {
                            if ui.small_button("All").clicked() {
                                state.select_all(field);
                            }
                            if ui.small_button("None").clicked() {
                                state.select_none(field);
                            }
                        });

                        for val in all_values {
                            let mut text = RichText::new(val);
                            if field == CategoryField::VehicleType {
                                if let Some(cm) = &state.color_map {
                                    text = text.color(cm.color_for(Some(val.as_str())));
                                }
                            }

                            let mut checked = state.selection.is_selected(field, val);
                            if ui.checkbox(&mut checked, text).changed() {
                                state.toggle_filter_value(field, val);
                            }
                        }
                    });
            }

            ui.separator();

            // ---- Model year range ----
            if let Some((min, max)) = table.year_bounds() {
                ui.strong("Model year");
                let (mut lo, mut hi) = state.selection.year_range().unwrap_or((min, max));
                let from = ui.add(egui::Slider::new(&mut lo, min..=max).integer().text("from"));
                let to = ui.add(egui::Slider::new(&mut hi, min..=max).integer().text("to"));
                if from.changed() || to.changed() {
                    state.set_year_range(lo, hi);
                }
                ui.separator();
            }

            if ui.button("Reset filters").clicked() {
                state.reset_filters();
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(table) = &state.table {
            ui.label(format!(
                "{} listings loaded, {} visible",
                table.len(),
                state.visible_indices.len()
            ));
        }

        ui.separator();

        if ui
            .selectable_label(state.show_trendline, "Trend line")
            .clicked()
        {
            state.show_trendline = !state.show_trendline;
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Metric cards
// ---------------------------------------------------------------------------

/// The four headline numbers of the current view.
pub fn metrics_row(ui: &mut Ui, state: &AppState) {
    let s = &state.summary;
    let cards = [
        ("Listings", group_thousands(s.count as i64)),
        (
            "Median price",
            s.median_price
                .map_or_else(na, |p| format!("${}", group_thousands(p.round() as i64))),
        ),
        (
            "Median odometer",
            s.median_odometer
                .map_or_else(na, |o| format!("{} mi", group_thousands(o.round() as i64))),
        ),
        (
            "Median model year",
            s.median_model_year.map_or_else(na, |y| y.to_string()),
        ),
    ];

    ui.columns(cards.len(), |cols| {
        for (col, (label, value)) in cols.iter_mut().zip(cards) {
            col.vertical_centered(|ui: &mut Ui| {
                ui.label(RichText::new(label).weak());
                ui.label(RichText::new(value).size(24.0).strong());
            });
        }
    });
}

fn na() -> String {
    "N/A".to_string()
}

/// `1234567` → `"1,234,567"`.
fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open vehicle listings")
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        state.load(&path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_are_grouped() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(145000), "145,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
        assert_eq!(group_thousands(-25500), "-25,500");
    }
}

use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, Points};

use crate::state::AppState;

const CHART_HEIGHT: f32 = 280.0;

// ---------------------------------------------------------------------------
// Listings per posting year (bar chart)
// ---------------------------------------------------------------------------

/// Bar chart of how many visible listings were posted each year.
pub fn posting_year_chart(ui: &mut Ui, state: &AppState) {
    ui.strong("Listings by posting year");

    let bars: Vec<Bar> = state
        .summary
        .posting_year_histogram
        .iter()
        .map(|&(year, count)| {
            Bar::new(f64::from(year), count as f64)
                .width(0.6)
                .name(year.to_string())
        })
        .collect();

    Plot::new("posting_year_plot")
        .height(CHART_HEIGHT)
        .x_axis_label("Posting year")
        .y_axis_label("Listings")
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(
                BarChart::new(bars)
                    .color(Color32::LIGHT_BLUE)
                    .name("listings"),
            );
        });
}

// ---------------------------------------------------------------------------
// Price vs odometer (scatter + optional trend)
// ---------------------------------------------------------------------------

/// Scatter of price against odometer, one series per vehicle type.
pub fn price_scatter(ui: &mut Ui, state: &AppState) {
    ui.strong("Price vs odometer");

    let color_map = &state.color_map;

    Plot::new("price_scatter_plot")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Odometer (mi)")
        .y_axis_label("Price ($)")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .label_formatter(|name, value| {
            let coords = format!("odometer: {:.0}\nprice: ${:.0}", value.x, value.y);
            if name.is_empty() {
                coords
            } else {
                format!("{name}\n{coords}")
            }
        })
        .show(ui, |plot_ui| {
            // One series per vehicle type so each type gets a legend entry.
            if let Some(cm) = color_map {
                for (vehicle_type, color) in cm.legend_entries() {
                    let points: Vec<[f64; 2]> = state
                        .scatter
                        .iter()
                        .filter(|p| p.vehicle_type.as_deref() == Some(vehicle_type))
                        .map(|p| [p.odometer, p.price])
                        .collect();
                    if points.is_empty() {
                        continue;
                    }
                    plot_ui.points(
                        Points::new(PlotPoints::new(points))
                            .radius(2.0)
                            .color(color)
                            .name(vehicle_type),
                    );
                }
            }

            let untyped: Vec<[f64; 2]> = state
                .scatter
                .iter()
                .filter(|p| color_map.is_none() || p.vehicle_type.is_none())
                .map(|p| [p.odometer, p.price])
                .collect();
            if !untyped.is_empty() {
                plot_ui.points(
                    Points::new(PlotPoints::new(untyped))
                        .radius(2.0)
                        .color(Color32::GRAY)
                        .name("unknown type"),
                );
            }

            if state.show_trendline {
                if let Some(fit) = state.trend {
                    let (min_x, max_x) = state.scatter.iter().fold(
                        (f64::INFINITY, f64::NEG_INFINITY),
                        |(lo, hi), p| (lo.min(p.odometer), hi.max(p.odometer)),
                    );
                    let line: PlotPoints = [min_x, max_x]
                        .into_iter()
                        .map(|x| [x, fit.predict(x)])
                        .collect();
                    plot_ui.line(
                        Line::new(line)
                            .color(Color32::WHITE)
                            .width(2.0)
                            .name(format!("OLS trend (R² {:.2})", fit.r_squared)),
                    );
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Price distribution (histogram)
// ---------------------------------------------------------------------------

/// Histogram of visible listing prices.
pub fn price_distribution(ui: &mut Ui, state: &AppState) {
    ui.strong("Price distribution");

    let bars: Vec<Bar> = state
        .price_bins
        .iter()
        .map(|bin| {
            Bar::new(bin.center(), bin.count as f64)
                .width(bin.width().max(1.0))
                .name(format!("${:.0} – ${:.0}", bin.lo, bin.hi))
        })
        .collect();

    Plot::new("price_distribution_plot")
        .height(CHART_HEIGHT)
        .x_axis_label("Price ($)")
        .y_axis_label("Listings")
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(
                BarChart::new(bars)
                    .color(Color32::from_rgb(240, 160, 80))
                    .name("listings"),
            );
        });
}

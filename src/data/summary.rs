use std::collections::BTreeMap;

use super::filter::FilteredView;
use super::stats::{self, Bin, LinearFit};

// ---------------------------------------------------------------------------
// Summary – headline numbers for the current view
// ---------------------------------------------------------------------------

/// Aggregates over a filtered view. `None` stands for "no data".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub median_price: Option<f64>,
    pub median_odometer: Option<f64>,
    /// Rounded to the nearest year, ties to even.
    pub median_model_year: Option<i64>,
    /// Listings per posting year, ascending; rows without a posting date
    /// are left out.
    pub posting_year_histogram: Vec<(i32, usize)>,
}

impl Summary {
    pub fn from_view(view: &FilteredView<'_>) -> Self {
        let prices: Vec<f64> = view.iter().filter_map(|l| l.price).collect();
        let odometers: Vec<f64> = view.iter().filter_map(|l| l.odometer).collect();
        let years: Vec<f64> = view.iter().filter_map(|l| l.model_year).collect();

        Summary {
            count: view.len(),
            median_price: stats::median(&prices),
            median_odometer: stats::median(&odometers),
            median_model_year: stats::median(&years).map(|y| y.round_ties_even() as i64),
            posting_year_histogram: posting_year_histogram(view),
        }
    }
}

/// Count listings per posting year.
pub fn posting_year_histogram(view: &FilteredView<'_>) -> Vec<(i32, usize)> {
    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for year in view.iter().filter_map(|l| l.posting_year()) {
        *counts.entry(year).or_default() += 1;
    }
    counts.into_iter().collect()
}

// ---------------------------------------------------------------------------
// Chart inputs
// ---------------------------------------------------------------------------

/// One point of the odometer/price scatter plot.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub odometer: f64,
    pub price: f64,
    pub vehicle_type: Option<String>,
    pub model: Option<String>,
    pub model_year: Option<f64>,
    pub condition: Option<String>,
}

/// Rows of the view that have both an odometer reading and a price.
pub fn scatter_points(view: &FilteredView<'_>) -> Vec<ScatterPoint> {
    view.iter()
        .filter_map(|l| {
            Some(ScatterPoint {
                odometer: l.odometer?,
                price: l.price?,
                vehicle_type: l.vehicle_type.clone(),
                model: l.model.clone(),
                model_year: l.model_year,
                condition: l.condition.clone(),
            })
        })
        .collect()
}

/// Least-squares price-by-odometer trend over the scatter points.
pub fn price_trend(points: &[ScatterPoint]) -> Option<LinearFit> {
    let xy: Vec<(f64, f64)> = points.iter().map(|p| (p.odometer, p.price)).collect();
    stats::linear_fit(&xy)
}

/// Equal-width price histogram of the view.
pub fn price_distribution(view: &FilteredView<'_>, bins: usize) -> Vec<Bin> {
    let prices: Vec<f64> = view.iter().filter_map(|l| l.price).collect();
    stats::bin_values(&prices, bins)
}

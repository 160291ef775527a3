use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::color::ColorMap;
use crate::data::filter::{apply_filter, FilterSelection};
use crate::data::loader::ListingCache;
use crate::data::model::{CategoryField, Listing, ListingTable};
use crate::data::stats::{Bin, LinearFit};
use crate::data::summary::{self, ScatterPoint, Summary};

/// Number of buckets in the price distribution chart.
const PRICE_BINS: usize = 30;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// File the current table was (or failed to be) loaded from.
    pub data_path: PathBuf,

    cache: ListingCache,

    /// Loaded table (None until a load succeeds).
    pub table: Option<Arc<ListingTable>>,

    /// Current filter choices.
    pub selection: FilterSelection,

    /// Table positions of listings passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    /// Aggregates of the visible listings.
    pub summary: Summary,

    /// Odometer/price points of the visible listings.
    pub scatter: Vec<ScatterPoint>,

    /// Trend of `scatter`, if it has one.
    pub trend: Option<LinearFit>,

    /// Price histogram of the visible listings.
    pub price_bins: Vec<Bin>,

    /// Whether the scatter plot shows the trend line.
    pub show_trendline: bool,

    /// Colours per vehicle type.
    pub color_map: Option<ColorMap>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(data_path: PathBuf) -> Self {
        Self {
            data_path,
            cache: ListingCache::new(),
            table: None,
            selection: FilterSelection::default(),
            visible_indices: Vec::new(),
            summary: Summary::default(),
            scatter: Vec::new(),
            trend: None,
            price_bins: Vec::new(),
            show_trendline: true,
            color_map: None,
            status_message: None,
        }
    }

    /// Load `path` (through the cache) and make it the current table.
    ///
    /// On failure the previous table is dropped so nothing stale is shown.
    pub fn load(&mut self, path: &Path) {
        self.data_path = path.to_path_buf();
        let cached = self.cache.is_cached(path);
        match self.cache.get_or_load(path) {
            Ok(table) => {
                log::info!(
                    "Showing {} listings from {}{}",
                    table.len(),
                    path.display(),
                    if cached { " (cached)" } else { "" }
                );
                if table.is_empty() {
                    log::warn!("{} contains no listings", path.display());
                }
                self.set_table(table);
            }
            Err(e) => {
                log::error!("Failed to load listings: {e}");
                self.status_message = Some(format!("Error: {e}"));
                self.table = None;
                self.visible_indices.clear();
                self.summary = Summary::default();
                self.scatter.clear();
                self.trend = None;
                self.price_bins.clear();
                self.color_map = None;
            }
        }
    }

    /// Drop the cached table and read the current file again.
    pub fn reload(&mut self) {
        self.cache.invalidate();
        let path = self.data_path.clone();
        self.load(&path);
    }

    /// Ingest a newly loaded table, reset filters and colours.
    pub fn set_table(&mut self, table: Arc<ListingTable>) {
        self.selection = FilterSelection::unconstrained(&table);
        self.color_map = Some(ColorMap::new(
            table.category_values(CategoryField::VehicleType),
        ));
        self.table = Some(table);
        self.status_message = None;
        self.refilter();
    }

    /// Recompute the view and everything derived from it after a selection
    /// change.
    pub fn refilter(&mut self) {
        let Some(table) = &self.table else {
            return;
        };
        let view = apply_filter(table, &self.selection);
        self.summary = Summary::from_view(&view);
        self.scatter = summary::scatter_points(&view);
        self.trend = summary::price_trend(&self.scatter);
        self.price_bins = summary::price_distribution(&view, PRICE_BINS);
        if view.is_empty() {
            log::debug!("No listings match the current filters");
        } else {
            log::debug!("{} of {} listings visible", view.len(), table.len());
        }
        self.visible_indices = view.into_indices();
    }

    /// The `i`-th visible listing.
    pub fn visible_row(&self, i: usize) -> Option<&Listing> {
        let table = self.table.as_deref()?;
        table.rows().get(*self.visible_indices.get(i)?)
    }

    /// Toggle a single value in a categorical filter.
    pub fn toggle_filter_value(&mut self, field: CategoryField, value: &str) {
        self.selection.toggle(field, value);
        self.refilter();
    }

    /// Select every observed value of a column (excludes its nulls).
    pub fn select_all(&mut self, field: CategoryField) {
        if let Some(table) = &self.table {
            self.selection.select_all(field, table);
            self.refilter();
        }
    }

    /// Deselect all values of a column, i.e. stop filtering on it.
    pub fn select_none(&mut self, field: CategoryField) {
        self.selection.clear(field);
        self.refilter();
    }

    pub fn set_year_range(&mut self, lo: f64, hi: f64) {
        if self.selection.year_range() != Some((lo, hi)) {
            self.selection.set_year_range(lo, hi);
            self.refilter();
        }
    }

    pub fn reset_filters(&mut self) {
        if let Some(table) = &self.table {
            self.selection.reset(table);
            self.refilter();
        }
    }
}

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{Datelike, NaiveDateTime};

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

/// Columns every listings file is expected to carry.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "price",
    "model_year",
    "odometer",
    "fuel",
    "transmission",
    "type",
    "condition",
    "model",
    "date_posted",
];

/// Columns that may be absent without comment.
pub const OPTIONAL_COLUMNS: &[&str] = &["cylinders", "is_4wd", "paint_color", "days_listed"];

// ---------------------------------------------------------------------------
// CategoryField – the categorical filter dimensions
// ---------------------------------------------------------------------------

/// A categorical column the user can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CategoryField {
    Fuel,
    Transmission,
    VehicleType,
    Condition,
}

impl CategoryField {
    pub const ALL: [CategoryField; 4] = [
        CategoryField::Fuel,
        CategoryField::Transmission,
        CategoryField::VehicleType,
        CategoryField::Condition,
    ];

    /// Header name in the CSV file.
    pub fn column(self) -> &'static str {
        match self {
            CategoryField::Fuel => "fuel",
            CategoryField::Transmission => "transmission",
            CategoryField::VehicleType => "type",
            CategoryField::Condition => "condition",
        }
    }

    /// Human readable label for the filter panel.
    pub fn label(self) -> &'static str {
        match self {
            CategoryField::Fuel => "Fuel",
            CategoryField::Transmission => "Transmission",
            CategoryField::VehicleType => "Vehicle type",
            CategoryField::Condition => "Condition",
        }
    }

    /// The listing's value for this dimension, if any.
    pub fn value_of(self, listing: &Listing) -> Option<&str> {
        let value = match self {
            CategoryField::Fuel => &listing.fuel,
            CategoryField::Transmission => &listing.transmission,
            CategoryField::VehicleType => &listing.vehicle_type,
            CategoryField::Condition => &listing.condition,
        };
        value.as_deref()
    }
}

impl fmt::Display for CategoryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Listing – one row of the CSV
// ---------------------------------------------------------------------------

/// A single vehicle advertisement after type coercion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Listing {
    pub price: Option<f64>,
    pub model_year: Option<f64>,
    pub model: Option<String>,
    pub condition: Option<String>,
    pub cylinders: Option<f64>,
    pub fuel: Option<String>,
    pub odometer: Option<f64>,
    pub transmission: Option<String>,
    /// The `type` column (body style: sedan, SUV, truck, ...).
    pub vehicle_type: Option<String>,
    pub paint_color: Option<String>,
    pub is_4wd: Option<f64>,
    pub date_posted: Option<NaiveDateTime>,
    pub days_listed: Option<f64>,
}

impl Listing {
    /// Calendar year of `date_posted`.
    pub fn posting_year(&self) -> Option<i32> {
        self.date_posted.map(|d| d.year())
    }
}

// ---------------------------------------------------------------------------
// Schema – which columns the source file actually had
// ---------------------------------------------------------------------------

/// Column presence, checked once when the header row is read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    present: BTreeSet<String>,
}

impl Schema {
    pub fn from_headers<'a, I>(headers: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Schema {
            present: headers.into_iter().map(|h| h.trim().to_string()).collect(),
        }
    }

    pub fn has(&self, column: &str) -> bool {
        self.present.contains(column)
    }

    /// Required columns absent from the header.
    pub fn missing_required(&self) -> Vec<&'static str> {
        REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| !self.has(c))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// ListingTable – the canonical, immutable dataset
// ---------------------------------------------------------------------------

/// The full loaded dataset plus the value domains the filter panel needs.
#[derive(Debug, Clone, Default)]
pub struct ListingTable {
    rows: Vec<Listing>,
    schema: Schema,
    /// Sorted distinct non-null values per categorical dimension.
    category_values: BTreeMap<CategoryField, Vec<String>>,
    /// Observed (min, max) model year, widened to whole years. Kept as `f64`
    /// so a far out-of-range year still lies inside its own bounds.
    year_bounds: Option<(f64, f64)>,
}

impl ListingTable {
    /// Build the table and its value domains from coerced rows.
    pub fn from_listings(rows: Vec<Listing>, schema: Schema) -> Self {
        let mut distinct: BTreeMap<CategoryField, BTreeSet<String>> = CategoryField::ALL
            .iter()
            .map(|&f| (f, BTreeSet::new()))
            .collect();
        let mut bounds: Option<(f64, f64)> = None;

        for row in &rows {
            for field in CategoryField::ALL {
                if let Some(v) = field.value_of(row) {
                    distinct.entry(field).or_default().insert(v.to_string());
                }
            }
            if let Some(y) = row.model_year {
                bounds = Some(match bounds {
                    Some((lo, hi)) => (lo.min(y), hi.max(y)),
                    None => (y, y),
                });
            }
        }

        let category_values = distinct
            .into_iter()
            .map(|(f, set)| (f, set.into_iter().collect()))
            .collect();
        let year_bounds = bounds.map(|(lo, hi)| (lo.floor(), hi.ceil()));

        ListingTable {
            rows,
            schema,
            category_values,
            year_bounds,
        }
    }

    pub fn rows(&self) -> &[Listing] {
        &self.rows
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Sorted distinct non-null values of `field`.
    pub fn category_values(&self, field: CategoryField) -> &[String] {
        self.category_values
            .get(&field)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Observed model-year range; `None` when no row has a model year.
    pub fn year_bounds(&self) -> Option<(f64, f64)> {
        self.year_bounds
    }

    /// Number of listings.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

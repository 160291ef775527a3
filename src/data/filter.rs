use std::collections::{BTreeMap, BTreeSet};

use super::model::{CategoryField, Listing, ListingTable};

// ---------------------------------------------------------------------------
// FilterSelection – what the user currently asks for
// ---------------------------------------------------------------------------

/// Accepted values per categorical dimension plus a model-year range.
///
/// An empty (or absent) value set means the dimension is unconstrained and
/// accepts every row, nulls included.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSelection {
    categories: BTreeMap<CategoryField, BTreeSet<String>>,
    /// Inclusive model-year bounds; `None` imposes no range constraint.
    year_range: Option<(f64, f64)>,
}

impl FilterSelection {
    /// Selection that keeps the whole table: no categories picked, range set
    /// to the observed model-year bounds.
    pub fn unconstrained(table: &ListingTable) -> Self {
        FilterSelection {
            categories: BTreeMap::new(),
            year_range: table.year_bounds(),
        }
    }

    pub fn accepted(&self, field: CategoryField) -> Option<&BTreeSet<String>> {
        self.categories.get(&field)
    }

    pub fn is_selected(&self, field: CategoryField, value: &str) -> bool {
        self.categories
            .get(&field)
            .is_some_and(|set| set.contains(value))
    }

    /// Replace the accepted set of `field`.
    pub fn set_accepted<I, S>(&mut self, field: CategoryField, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories
            .insert(field, values.into_iter().map(Into::into).collect());
    }

    /// Add `value` to the accepted set, or remove it if already there.
    pub fn toggle(&mut self, field: CategoryField, value: &str) {
        let set = self.categories.entry(field).or_default();
        if !set.remove(value) {
            set.insert(value.to_string());
        }
    }

    /// Accept every observed value of `field`. Unlike an empty set this
    /// excludes rows where the field is null.
    pub fn select_all(&mut self, field: CategoryField, table: &ListingTable) {
        self.set_accepted(field, table.category_values(field).iter().cloned());
    }

    /// Remove the constraint on `field`.
    pub fn clear(&mut self, field: CategoryField) {
        self.categories.remove(&field);
    }

    pub fn year_range(&self) -> Option<(f64, f64)> {
        self.year_range
    }

    /// Set the inclusive model-year range, swapping reversed bounds.
    pub fn set_year_range(&mut self, lo: f64, hi: f64) {
        self.year_range = Some(if lo <= hi { (lo, hi) } else { (hi, lo) });
    }

    /// Back to [`FilterSelection::unconstrained`].
    pub fn reset(&mut self, table: &ListingTable) {
        *self = Self::unconstrained(table);
    }

    /// Whether `listing` passes every predicate.
    pub fn accepts(&self, listing: &Listing) -> bool {
        self.accepts_categories(listing) && self.accepts_model_year(listing)
    }

    fn accepts_categories(&self, listing: &Listing) -> bool {
        self.categories.iter().all(|(field, accepted)| {
            accepted.is_empty()
                || field
                    .value_of(listing)
                    .is_some_and(|v| accepted.contains(v))
        })
    }

    /// A missing model year is replaced by the lower bound for the lower
    /// test and by the upper bound for the upper test, so it always passes.
    fn accepts_model_year(&self, listing: &Listing) -> bool {
        let Some((lo, hi)) = self.year_range else {
            return true;
        };
        listing.model_year.unwrap_or(lo) >= lo && listing.model_year.unwrap_or(hi) <= hi
    }
}

// ---------------------------------------------------------------------------
// FilteredView – rows of the table that pass a selection
// ---------------------------------------------------------------------------

/// A read-only subset of a [`ListingTable`], in table order.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    table: &'a ListingTable,
    indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    /// Positions of the visible rows in the canonical table.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn into_indices(self) -> Vec<usize> {
        self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Listing> + '_ {
        let rows = self.table.rows();
        self.indices.iter().map(move |&idx| &rows[idx])
    }
}

/// Return the view of `table` that passes `selection`.
pub fn apply_filter<'a>(table: &'a ListingTable, selection: &FilterSelection) -> FilteredView<'a> {
    let indices = table
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| selection.accepts(row))
        .map(|(i, _)| i)
        .collect();
    FilteredView { table, indices }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Schema;

    fn listing(fuel: Option<&str>, year: Option<f64>, condition: Option<&str>) -> Listing {
        Listing {
            fuel: fuel.map(String::from),
            model_year: year,
            condition: condition.map(String::from),
            ..Default::default()
        }
    }

    fn sample_table() -> ListingTable {
        ListingTable::from_listings(
            vec![
                listing(Some("gas"), Some(2005.0), Some("good")),
                listing(Some("diesel"), Some(2012.0), Some("excellent")),
                listing(None, Some(2018.0), Some("good")),
                listing(Some("gas"), None, None),
                listing(Some("electric"), Some(1998.0), Some("fair")),
                listing(Some("gas"), Some(2015.0), Some("excellent")),
            ],
            Schema::default(),
        )
    }

    #[test]
    fn unconstrained_selection_keeps_everything() {
        let table = sample_table();
        let selection = FilterSelection::unconstrained(&table);
        assert_eq!(selection.year_range(), Some((1998.0, 2018.0)));

        let view = apply_filter(&table, &selection);
        assert_eq!(view.indices(), &[0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn category_filter_excludes_nulls_once_non_empty() {
        let table = sample_table();
        let mut selection = FilterSelection::unconstrained(&table);
        selection.set_accepted(CategoryField::Fuel, ["gas"]);

        let view = apply_filter(&table, &selection);
        assert_eq!(view.indices(), &[0, 3, 5]);
        assert!(view.iter().all(|l| l.fuel.as_deref() == Some("gas")));
    }

    #[test]
    fn select_all_differs_from_no_constraint() {
        let table = sample_table();
        let mut selection = FilterSelection::unconstrained(&table);
        selection.select_all(CategoryField::Fuel, &table);
        // the row with no fuel drops out
        assert_eq!(apply_filter(&table, &selection).indices(), &[0, 1, 3, 4, 5]);

        selection.clear(CategoryField::Fuel);
        assert_eq!(apply_filter(&table, &selection).len(), table.len());
    }

    #[test]
    fn dimensions_are_anded() {
        let table = sample_table();
        let mut selection = FilterSelection::unconstrained(&table);
        selection.set_accepted(CategoryField::Fuel, ["gas", "diesel"]);
        selection.set_accepted(CategoryField::Condition, ["excellent"]);

        assert_eq!(apply_filter(&table, &selection).indices(), &[1, 5]);
    }

    #[test]
    fn null_model_year_passes_every_range() {
        let table = sample_table();
        let mut selection = FilterSelection::unconstrained(&table);
        for (lo, hi) in [(1998.0, 2018.0), (2010.0, 2012.0), (2030.0, 2040.0), (1900.0, 1901.0), (2005.0, 2005.0)] {
            selection.set_year_range(lo, hi);
            let view = apply_filter(&table, &selection);
            assert!(view.indices().contains(&3), "range {lo}..={hi}");
        }
    }

    #[test]
    fn year_range_is_inclusive() {
        let table = sample_table();
        let mut selection = FilterSelection::unconstrained(&table);
        selection.set_year_range(2005.0, 2015.0);
        assert_eq!(apply_filter(&table, &selection).indices(), &[0, 1, 3, 5]);
    }

    #[test]
    fn reversed_range_is_swapped() {
        let mut selection = FilterSelection::default();
        selection.set_year_range(2015.0, 2005.0);
        assert_eq!(selection.year_range(), Some((2005.0, 2015.0)));
    }

    #[test]
    fn toggle_adds_then_removes() {
        let table = sample_table();
        let mut selection = FilterSelection::unconstrained(&table);
        selection.toggle(CategoryField::Fuel, "diesel");
        assert!(selection.is_selected(CategoryField::Fuel, "diesel"));
        assert_eq!(apply_filter(&table, &selection).indices(), &[1]);

        selection.toggle(CategoryField::Fuel, "diesel");
        assert!(!selection.is_selected(CategoryField::Fuel, "diesel"));
        assert_eq!(apply_filter(&table, &selection).len(), table.len());
    }

    #[test]
    fn reset_restores_unconstrained() {
        let table = sample_table();
        let mut selection = FilterSelection::unconstrained(&table);
        selection.set_accepted(CategoryField::Condition, ["fair"]);
        selection.set_year_range(2000.0, 2001.0);
        selection.reset(&table);
        assert_eq!(selection, FilterSelection::unconstrained(&table));
    }

    #[test]
    fn view_is_exactly_the_accepted_rows() {
        let table = sample_table();
        let selections = {
            let mut out = Vec::new();
            for fuels in [vec![], vec!["gas"], vec!["diesel", "electric"]] {
                for conds in [vec![], vec!["good"], vec!["excellent", "fair"]] {
                    for range in [(1998.0, 2018.0), (2004.0, 2013.0), (2016.0, 2020.0)] {
                        let mut s = FilterSelection::unconstrained(&table);
                        s.set_accepted(CategoryField::Fuel, fuels.clone());
                        s.set_accepted(CategoryField::Condition, conds.clone());
                        s.set_year_range(range.0, range.1);
                        out.push(s);
                    }
                }
            }
            out
        };

        for selection in &selections {
            let view = apply_filter(&table, selection);
            let kept: BTreeSet<usize> = view.indices().iter().copied().collect();
            assert_eq!(kept.len(), view.len(), "duplicate rows in view");

            for (i, row) in table.rows().iter().enumerate() {
                let fuel_ok = selection
                    .accepted(CategoryField::Fuel)
                    .map_or(true, |s| s.is_empty() || row.fuel.as_ref().is_some_and(|f| s.contains(f)));
                let cond_ok = selection
                    .accepted(CategoryField::Condition)
                    .map_or(true, |s| {
                        s.is_empty() || row.condition.as_ref().is_some_and(|c| s.contains(c))
                    });
                let (lo, hi) = selection.year_range().unwrap();
                let year_ok = row
                    .model_year
                    .map_or(true, |y| y >= lo && y <= hi);
                assert_eq!(kept.contains(&i), fuel_ok && cond_ok && year_ok, "row {i}");
            }
        }
    }

    #[test]
    fn unconstrained_keeps_rows_with_huge_model_year() {
        let table = ListingTable::from_listings(
            vec![
                listing(Some("gas"), Some(2010.0), None),
                listing(Some("gas"), Some(99_999_999_999.0), None),
                listing(Some("gas"), Some(-99_999_999_999.0), None),
            ],
            Schema::default(),
        );
        let selection = FilterSelection::unconstrained(&table);
        assert_eq!(apply_filter(&table, &selection).indices(), &[0, 1, 2]);
    }

    #[test]
    fn view_rows_come_from_the_table() {
        let table = sample_table();
        let mut selection = FilterSelection::unconstrained(&table);
        selection.set_accepted(CategoryField::Fuel, ["gas"]);
        let view = apply_filter(&table, &selection);

        assert_eq!(view.len(), 3);
        for (row, &idx) in view.iter().zip(view.indices()) {
            assert!(std::ptr::eq(row, &table.rows()[idx]));
        }
    }
}

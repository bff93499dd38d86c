use std::collections::HashSet;

use chrono::NaiveDate;

use super::model::{Dataset, Transaction};
use crate::error::InvalidRange;

// ---------------------------------------------------------------------------
// DateRange – the inclusive purchase-date selection
// ---------------------------------------------------------------------------

/// Inclusive `[start, end]` range of purchase dates. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, InvalidRange> {
        if start > end {
            return Err(InvalidRange { start, end });
        }
        Ok(DateRange { start, end })
    }

    /// The dataset's whole purchase-date span; the default selection.
    pub fn full_span(dataset: &Dataset) -> Self {
        DateRange {
            start: dataset.first_purchase_date(),
            end: dataset.last_purchase_date(),
        }
    }

    /// Restrict both bounds to the dataset's span. A range lying wholly
    /// outside the span collapses onto the nearest edge day.
    pub fn clamp_to(self, dataset: &Dataset) -> Self {
        let lo = dataset.first_purchase_date();
        let hi = dataset.last_purchase_date();
        DateRange {
            start: self.start.clamp(lo, hi),
            end: self.end.clamp(lo, hi),
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of calendar days covered, both ends included.
    pub fn days(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    /// Every date in the range, in order.
    pub fn iter_days(&self) -> impl Iterator<Item = NaiveDate> {
        self.start.iter_days().take(self.days())
    }
}

// ---------------------------------------------------------------------------
// Row selection
// ---------------------------------------------------------------------------

/// Rows whose `order_purchase_date` falls within `range`, in source order.
pub fn filter_by_date(rows: &[Transaction], range: &DateRange) -> Vec<Transaction> {
    rows.iter()
        .filter(|tx| range.contains(tx.order_purchase_date))
        .cloned()
        .collect()
}

/// Keep the first row of each `(order_id, order_item_id)` pair.
pub fn dedup_order_items(rows: &[Transaction]) -> Vec<Transaction> {
    let mut seen: HashSet<(&str, u32)> = HashSet::with_capacity(rows.len());
    rows.iter()
        .filter(|tx| seen.insert(tx.line_key()))
        .cloned()
        .collect()
}

/// The two views every aggregation reads from.
#[derive(Debug, Clone)]
pub struct FilteredView {
    pub range: DateRange,
    /// Raw filtered rows; feeds the customer-by-region counts.
    pub rows: Vec<Transaction>,
    /// `rows` deduplicated per order item; feeds the daily, category and
    /// RFM rollups.
    pub unique_items: Vec<Transaction>,
}

impl FilteredView {
    pub fn new(dataset: &Dataset, range: &DateRange) -> Self {
        let rows = filter_by_date(&dataset.rows, range);
        let unique_items = dedup_order_items(&rows);
        FilteredView {
            range: *range,
            rows,
            unique_items,
        }
    }
}

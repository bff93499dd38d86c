use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::DataError;

// ---------------------------------------------------------------------------
// Transaction – one order-item line
// ---------------------------------------------------------------------------

/// One order-item line of the pre-joined transactions table.
///
/// An order spanning several items appears once per item; the pair
/// `(order_id, order_item_id)` identifies the line.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub order_id: String,
    pub order_item_id: u32,
    pub customer_id: String,
    /// Customer identity shared across all of a customer's orders.
    pub customer_unique_id: String,
    pub customer_city: String,
    pub customer_state: String,
    pub order_purchase_timestamp: NaiveDateTime,
    pub order_approved_at: Option<NaiveDateTime>,
    pub order_delivered_carrier_date: Option<NaiveDateTime>,
    pub review_answer_timestamp: Option<NaiveDateTime>,
    /// Date-only purchase field the date filter compares against.
    pub order_purchase_date: NaiveDate,
    pub price: f64,
    /// English category name; `None` when the product is uncategorised.
    pub product_category: Option<String>,
}

impl Transaction {
    /// Key used to deduplicate order-item lines.
    pub fn line_key(&self) -> (&str, u32) {
        (&self.order_id, self.order_item_id)
    }
}

// ---------------------------------------------------------------------------
// Dataset – the immutable snapshot loaded at startup
// ---------------------------------------------------------------------------

/// The full loaded table plus values precomputed over the *unfiltered* rows.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// All rows in file order.
    pub rows: Vec<Transaction>,
    /// Where the rows were read from.
    pub source: PathBuf,
    first_purchase_date: NaiveDate,
    last_purchase_date: NaiveDate,
    latest_purchase: NaiveDateTime,
}

impl Dataset {
    /// Build the snapshot, computing the purchase-date span and the global
    /// latest purchase timestamp.
    pub fn from_rows(rows: Vec<Transaction>, source: impl Into<PathBuf>) -> Result<Self, DataError> {
        let first = rows.first().ok_or(DataError::EmptyDataset)?;

        let mut first_purchase_date = first.order_purchase_date;
        let mut last_purchase_date = first.order_purchase_date;
        let mut latest_purchase = first.order_purchase_timestamp;

        for row in &rows {
            first_purchase_date = first_purchase_date.min(row.order_purchase_date);
            last_purchase_date = last_purchase_date.max(row.order_purchase_date);
            latest_purchase = latest_purchase.max(row.order_purchase_timestamp);
        }

        Ok(Dataset {
            rows,
            source: source.into(),
            first_purchase_date,
            last_purchase_date,
            latest_purchase,
        })
    }

    /// Earliest `order_purchase_date`.
    pub fn first_purchase_date(&self) -> NaiveDate {
        self.first_purchase_date
    }

    /// Latest `order_purchase_date`.
    pub fn last_purchase_date(&self) -> NaiveDate {
        self.last_purchase_date
    }

    /// Most recent purchase timestamp across the whole dataset; the RFM
    /// recency reference point.
    pub fn latest_purchase(&self) -> NaiveDateTime {
        self.latest_purchase
    }
}

// ---------------------------------------------------------------------------
// Test fixtures
// ---------------------------------------------------------------------------

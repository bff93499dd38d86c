use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::DataError;

pub const ORDER_ID: &str = "order_id";
pub const ORDER_ITEM_ID: &str = "order_item_id";
pub const CUSTOMER_ID: &str = "customer_id";
pub const CUSTOMER_UNIQUE_ID: &str = "customer_unique_id";
pub const CUSTOMER_CITY: &str = "customer_city";
pub const CUSTOMER_STATE: &str = "customer_state";
pub const PURCHASE_TIMESTAMP: &str = "order_purchase_timestamp";
pub const APPROVED_AT: &str = "order_approved_at";
pub const DELIVERED_CARRIER: &str = "order_delivered_carrier_date";
pub const REVIEW_ANSWER: &str = "review_answer_timestamp";
pub const PURCHASE_DATE: &str = "order_purchase_date";
pub const PRICE: &str = "price";
pub const CATEGORY: &str = "product_category_name_english";

/// Every column the loader reads. Other columns in the source are ignored.
pub const REQUIRED: &[&str] = &[
    ORDER_ID,
    ORDER_ITEM_ID,
    CUSTOMER_ID,
    CUSTOMER_UNIQUE_ID,
    CUSTOMER_CITY,
    CUSTOMER_STATE,
    PURCHASE_TIMESTAMP,
    APPROVED_AT,
    DELIVERED_CARRIER,
    REVIEW_ANSWER,
    PURCHASE_DATE,
    PRICE,
    CATEGORY,
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];
const DATE_FMT: &str = "%Y-%m-%d";

/// Maps column names to their position in a header row.
pub struct ColumnMap {
    indices: HashMap<String, usize>,
}

impl ColumnMap {
    /// Header names are trimmed; a leading UTF-8 BOM is dropped.
    pub fn from_headers<'a>(headers: impl IntoIterator<Item = &'a str>) -> Self {
        let indices = headers
            .into_iter()
            .enumerate()
            .map(|(i, h)| (h.trim_start_matches('\u{feff}').trim().to_string(), i))
            .collect();
        ColumnMap { indices }
    }

    pub fn index(&self, col: &str) -> Option<usize> {
        self.indices.get(col).copied()
    }

    pub fn has(&self, col: &str) -> bool {
        self.indices.contains_key(col)
    }

    /// Fails with every required column that is absent.
    pub fn validate(&self) -> Result<(), DataError> {
        let missing: Vec<String> = REQUIRED
            .iter()
            .filter(|c| !self.has(c))
            .map(|c| c.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(DataError::MissingColumns(missing))
        }
    }
}

/// "2017-10-02 10:56:33" → NaiveDateTime. A bare date reads as midnight;
/// an RFC 3339 value with an offset is converted to UTC.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let trimmed = s.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(trimmed).ok().map(|dt| dt.naive_utc()))
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, DATE_FMT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// "2017-10-02" → NaiveDate; a full timestamp contributes its date part.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let trimmed = s.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FMT)
        .ok()
        .or_else(|| parse_timestamp(trimmed).map(|dt| dt.date()))
}

/// "3" → 3, "3.0" → 3. Fractional or negative values are rejected.
pub fn parse_item_id(s: &str) -> Option<u32> {
    let trimmed = s.trim();
    if let Ok(n) = trimmed.parse::<u32>() {
        return Some(n);
    }
    let f = trimmed.parse::<f64>().ok()?;
    if f.fract() == 0.0 && f >= 0.0 && f <= u32::MAX as f64 {
        Some(f as u32)
    } else {
        None
    }
}

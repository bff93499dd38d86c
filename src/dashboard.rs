//! Presentation model: everything the UI draws for one date selection.
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};
use serde::Serialize;

use crate::config::DashboardConfig;
use crate::data::aggregate::{
    CategoryCount, DailyRollup, RegionCount, RfmRow, bottom_categories, category_rollup,
    customers_by_city, customers_by_state, daily_rollup, rfm_table, top_categories,
};
use crate::data::filter::{DateRange, FilteredView};
use crate::data::model::Dataset;

// ---------------------------------------------------------------------------
// View types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Rows in the raw filtered view.
    pub rows_in_range: usize,
    pub total_orders: usize,
    pub total_revenue: f64,
    pub total_revenue_label: String,
    pub daily_orders: Vec<SeriesPoint>,
    pub daily_revenue: Vec<SeriesPoint>,
    pub best_categories: Vec<CategoryCount>,
    pub worst_categories: Vec<CategoryCount>,
    pub top_states: Vec<RegionCount>,
    pub top_cities: Vec<RegionCount>,
    pub rfm: RfmSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RfmSummary {
    pub customers: usize,
    pub avg_recency_days: f64,
    pub avg_frequency: f64,
    pub avg_monetary: f64,
    pub avg_monetary_label: String,
    /// Most recent buyers first.
    pub by_recency: Vec<RfmRow>,
    pub by_frequency: Vec<RfmRow>,
    pub by_monetary: Vec<RfmRow>,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

impl DashboardView {
    /// Run filter → aggregate → present for one selection.
    pub fn build(dataset: &Dataset, range: &DateRange, config: &DashboardConfig) -> Self {
        let view = FilteredView::new(dataset, range);

        let daily = daily_rollup(&view.unique_items, range);
        let categories = category_rollup(&view.unique_items);
        let rfm = rfm_table(&view.unique_items, dataset.latest_purchase());
        let mut states = customers_by_state(&view.rows);
        let mut cities = customers_by_city(&view.rows);
        states.truncate(config.top_regions);
        cities.truncate(config.top_regions);

        log::debug!(
            "view {}..={}: {} rows, {} unique items, {} categories, {} customers",
            range.start(),
            range.end(),
            view.rows.len(),
            view.unique_items.len(),
            categories.len(),
            rfm.len()
        );

        let total_orders = daily.iter().map(|d| d.order_count).sum();
        let total_revenue: f64 = daily.iter().map(|d| d.revenue).sum();

        DashboardView {
            start_date: range.start(),
            end_date: range.end(),
            rows_in_range: view.rows.len(),
            total_orders,
            total_revenue,
            total_revenue_label: format_currency(total_revenue, &config.currency_symbol),
            daily_orders: series(&daily, |d| d.order_count as f64),
            daily_revenue: series(&daily, |d| d.revenue),
            best_categories: top_categories(&categories, config.top_categories),
            worst_categories: bottom_categories(&categories, config.top_categories),
            top_states: states,
            top_cities: cities,
            rfm: RfmSummary::from_table(rfm, config),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows_in_range == 0
    }
}

fn series(daily: &[DailyRollup], value: impl Fn(&DailyRollup) -> f64) -> Vec<SeriesPoint> {
    daily
        .iter()
        .map(|d| SeriesPoint {
            date: d.date,
            value: value(d),
        })
        .collect()
}

impl RfmSummary {
    fn from_table(rows: Vec<RfmRow>, config: &DashboardConfig) -> Self {
        let n = rows.len();
        let mean = |f: fn(&RfmRow) -> f64| {
            if n == 0 {
                0.0
            } else {
                rows.iter().map(f).sum::<f64>() / n as f64
            }
        };
        let avg_recency_days = mean(|r| r.recency_hours) / 24.0;
        let avg_frequency = mean(|r| r.frequency as f64);
        let avg_monetary = mean(|r| r.monetary);

        // rows arrive sorted by customer id, so a stable sort breaks ties by id
        let top = |cmp: fn(&RfmRow, &RfmRow) -> std::cmp::Ordering| {
            let mut sorted = rows.clone();
            sorted.sort_by(cmp);
            sorted.truncate(config.top_customers);
            sorted
        };

        RfmSummary {
            customers: n,
            avg_recency_days,
            avg_frequency,
            avg_monetary,
            avg_monetary_label: format_currency(avg_monetary, &config.currency_symbol),
            by_recency: top(|a, b| a.recency_hours.total_cmp(&b.recency_hours)),
            by_frequency: top(|a, b| b.frequency.cmp(&a.frequency)),
            by_monetary: top(|a, b| b.monetary.total_cmp(&a.monetary)),
        }
    }
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// `1234.5` with symbol `"R$ "` → `"R$ 1,234.50"`. en-US grouping, two
/// decimals, sign before the symbol.
pub fn format_currency(amount: f64, symbol: &str) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!(
        "{sign}{symbol}{}.{:02}",
        (cents / 100).to_formatted_string(&Locale::en),
        cents % 100
    )
}

//! Pure rollups over a filtered slice of transactions.
//!
//! None of these functions keep state between calls; each one derives its
//! table from the rows it is handed, so they can run in any order.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use super::filter::DateRange;
use super::model::Transaction;

// ---------------------------------------------------------------------------
// Output rows
// ---------------------------------------------------------------------------

/// Distinct customers in one state or city.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionCount {
    pub region: String,
    pub customers: usize,
}

/// Orders and revenue for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRollup {
    pub date: NaiveDate,
    pub order_count: usize,
    pub revenue: f64,
}

/// Order-item lines sold in one product category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub items: usize,
}

/// Recency / frequency / monetary summary of one customer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RfmRow {
    pub customer_unique_id: String,
    /// Hours between the customer's last purchase and the reference instant.
    pub recency_hours: f64,
    /// Distinct orders placed.
    pub frequency: usize,
    /// Total item price spent.
    pub monetary: f64,
}

// ---------------------------------------------------------------------------
// Customers by region
// ---------------------------------------------------------------------------

pub fn customers_by_state(rows: &[Transaction]) -> Vec<RegionCount> {
    customers_by(rows, |tx| &tx.customer_state)
}

pub fn customers_by_city(rows: &[Transaction]) -> Vec<RegionCount> {
    customers_by(rows, |tx| &tx.customer_city)
}

/// Count distinct `customer_unique_id` per region, largest first. Equal
/// counts are ordered by region name.
fn customers_by<F>(rows: &[Transaction], region_of: F) -> Vec<RegionCount>
where
    F: Fn(&Transaction) -> &String,
{
    let mut groups: HashMap<&str, HashSet<&str>> = HashMap::new();
    for tx in rows {
        groups
            .entry(region_of(tx).as_str())
            .or_default()
            .insert(tx.customer_unique_id.as_str());
    }

    let mut counts: Vec<RegionCount> = groups
        .into_iter()
        .map(|(region, customers)| RegionCount {
            region: region.to_string(),
            customers: customers.len(),
        })
        .collect();
    counts.sort_by(|a, b| {
        b.customers
            .cmp(&a.customers)
            .then_with(|| a.region.cmp(&b.region))
    });
    counts
}

// ---------------------------------------------------------------------------
// Daily rollup
// ---------------------------------------------------------------------------

/// One row per calendar day of `range`, including days without orders.
///
/// Rows are bucketed by the date of `order_purchase_timestamp`; a row whose
/// timestamp falls outside `range` is ignored.
pub fn daily_rollup(rows: &[Transaction], range: &DateRange) -> Vec<DailyRollup> {
    let mut orders: HashMap<NaiveDate, HashSet<&str>> = HashMap::new();
    let mut revenue: HashMap<NaiveDate, f64> = HashMap::new();

    for tx in rows {
        let day = tx.order_purchase_timestamp.date();
        if !range.contains(day) {
            continue;
        }
        orders.entry(day).or_default().insert(tx.order_id.as_str());
        *revenue.entry(day).or_default() += tx.price;
    }

    range
        .iter_days()
        .map(|date| DailyRollup {
            date,
            order_count: orders.get(&date).map_or(0, HashSet::len),
            revenue: revenue.get(&date).copied().unwrap_or(0.0),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Category rollup
// ---------------------------------------------------------------------------

/// Order-item lines per category, sorted by category name. Uncategorised
/// rows are skipped.
pub fn category_rollup(rows: &[Transaction]) -> Vec<CategoryCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for tx in rows {
        if let Some(category) = &tx.product_category {
            *counts.entry(category.as_str()).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .map(|(category, items)| CategoryCount {
            category: category.to_string(),
            items,
        })
        .collect()
}

/// The `n` categories with the most items, largest first.
pub fn top_categories(counts: &[CategoryCount], n: usize) -> Vec<CategoryCount> {
    ranked(counts, n, |a, b| b.items.cmp(&a.items))
}

/// The `n` categories with the fewest items, smallest first.
pub fn bottom_categories(counts: &[CategoryCount], n: usize) -> Vec<CategoryCount> {
    ranked(counts, n, |a, b| a.items.cmp(&b.items))
}

fn ranked<F>(counts: &[CategoryCount], n: usize, by_items: F) -> Vec<CategoryCount>
where
    F: Fn(&CategoryCount, &CategoryCount) -> Ordering,
{
    let mut sorted = counts.to_vec();
    sorted.sort_by(|a, b| by_items(a, b).then_with(|| a.category.cmp(&b.category)));
    sorted.truncate(n);
    sorted
}

// ---------------------------------------------------------------------------
// RFM
// ---------------------------------------------------------------------------

/// Per-customer recency, frequency and monetary value, sorted by customer id.
///
/// `reference` must be the latest purchase of the *unfiltered* dataset so
/// recency stays comparable across date windows.
pub fn rfm_table(rows: &[Transaction], reference: NaiveDateTime) -> Vec<RfmRow> {
    struct Acc<'a> {
        last_purchase: NaiveDateTime,
        orders: HashSet<&'a str>,
        monetary: f64,
    }

    let mut customers: BTreeMap<&str, Acc> = BTreeMap::new();
    for tx in rows {
        let acc = customers
            .entry(tx.customer_unique_id.as_str())
            .or_insert_with(|| Acc {
                last_purchase: tx.order_purchase_timestamp,
                orders: HashSet::new(),
                monetary: 0.0,
            });
        acc.last_purchase = acc.last_purchase.max(tx.order_purchase_timestamp);
        acc.orders.insert(tx.order_id.as_str());
        acc.monetary += tx.price;
    }

    customers
        .into_iter()
        .map(|(id, acc)| RfmRow {
            customer_unique_id: id.to_string(),
            recency_hours: hours_between(acc.last_purchase, reference),
            frequency: acc.orders.len(),
            monetary: acc.monetary,
        })
        .collect()
}

/// Elapsed hours from `from` to `to`, keeping sub-second precision.
fn hours_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    let delta = to - from;
    match delta.num_microseconds() {
        Some(us) => us as f64 / 3_600_000_000.0,
        None => delta.num_seconds() as f64 / 3600.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::fixtures::{date, located, ts, tx};

    const EPS: f64 = 1e-9;

    fn range(a: &str, b: &str) -> DateRange {
        DateRange::new(date(a), date(b)).unwrap()
    }

    #[test]
    fn test_daily_rollup_fills_gaps() {
        let rows = vec![
            tx("o1", 1, "a", "2018-01-01 09:00:00", 40.0, None),
            tx("o2", 1, "b", "2018-01-01 10:00:00", 30.0, None),
            tx("o3", 1, "c", "2018-01-01 23:59:59", 30.0, None),
            tx("o4", 1, "a", "2018-01-03 00:00:00", 20.0, None),
            tx("o5", 1, "d", "2018-01-03 12:00:00", 30.0, None),
        ];
        let daily = daily_rollup(&rows, &range("2018-01-01", "2018-01-03"));

        assert_eq!(daily.len(), 3);
        assert_eq!(daily[0].date, date("2018-01-01"));
        assert_eq!(daily[0].order_count, 3);
        assert!((daily[0].revenue - 100.0).abs() < EPS);
        assert_eq!(daily[1].date, date("2018-01-02"));
        assert_eq!(daily[1].order_count, 0);
        assert_eq!(daily[1].revenue, 0.0);
        assert_eq!(daily[2].order_count, 2);
        assert!((daily[2].revenue - 50.0).abs() < EPS);

        let total: usize = daily.iter().map(|d| d.order_count).sum();
        assert_eq!(total, 5);
    }

    #[test]
    fn test_daily_rollup_counts_distinct_orders_but_sums_items() {
        let rows = vec![
            tx("o1", 1, "a", "2018-05-01 09:00:00", 10.0, None),
            tx("o1", 2, "a", "2018-05-01 09:00:00", 15.0, None),
        ];
        let daily = daily_rollup(&rows, &range("2018-05-01", "2018-05-01"));
        assert_eq!(daily[0].order_count, 1);
        assert!((daily[0].revenue - 25.0).abs() < EPS);
    }

    #[test]
    fn test_daily_rollup_empty_input_is_zero_calendar() {
        let daily = daily_rollup(&[], &range("2018-02-27", "2018-03-02"));
        assert_eq!(daily.len(), 4);
        assert!(daily.iter().all(|d| d.order_count == 0 && d.revenue == 0.0));
    }

    #[test]
    fn test_customers_by_state_counts_distinct() {
        let rows = vec![
            located(tx("o1", 1, "a", "2018-01-01 09:00:00", 1.0, None), "sao paulo", "SP"),
            located(tx("o2", 1, "a", "2018-01-02 09:00:00", 1.0, None), "sao paulo", "SP"),
            located(tx("o3", 1, "b", "2018-01-02 09:00:00", 1.0, None), "campinas", "SP"),
            located(tx("o4", 1, "c", "2018-01-02 09:00:00", 1.0, None), "niteroi", "RJ"),
        ];
        let states = customers_by_state(&rows);
        assert_eq!(
            states,
            vec![
                RegionCount { region: "SP".into(), customers: 2 },
                RegionCount { region: "RJ".into(), customers: 1 },
            ]
        );

        let cities = customers_by_city(&rows);
        let names: Vec<&str> = cities.iter().map(|c| c.region.as_str()).collect();
        assert_eq!(names, vec!["campinas", "niteroi", "sao paulo"]);
        assert!(cities.iter().all(|c| c.customers == 1));
    }

    #[test]
    fn test_region_ties_break_alphabetically() {
        let rows = vec![
            located(tx("o1", 1, "a", "2018-01-01 09:00:00", 1.0, None), "x", "RS"),
            located(tx("o2", 1, "b", "2018-01-01 09:00:00", 1.0, None), "x", "MG"),
            located(tx("o3", 1, "c", "2018-01-01 09:00:00", 1.0, None), "x", "BA"),
        ];
        let regions: Vec<String> = customers_by_state(&rows).into_iter().map(|r| r.region).collect();
        assert_eq!(regions, vec!["BA", "MG", "RS"]);
    }

    #[test]
    fn test_category_rollup_and_ranking() {
        let mut rows = Vec::new();
        for (cat, n) in [("A", 10), ("B", 3), ("C", 7)] {
            for i in 0..n {
                rows.push(tx(&format!("{cat}{i}"), 1, "u", "2018-01-01 09:00:00", 1.0, Some(cat)));
            }
        }
        rows.push(tx("z", 1, "u", "2018-01-01 09:00:00", 1.0, None));

        let counts = category_rollup(&rows);
        assert_eq!(counts.len(), 3);
        assert_eq!(counts[1], CategoryCount { category: "B".into(), items: 3 });

        assert_eq!(top_categories(&counts, 1)[0].category, "A");
        assert_eq!(bottom_categories(&counts, 1)[0].category, "B");
        let top: Vec<usize> = top_categories(&counts, 5).iter().map(|c| c.items).collect();
        assert_eq!(top, vec![10, 7, 3]);
    }

    #[test]
    fn test_rfm_uses_reference_instant() {
        let rows = vec![
            tx("o1", 1, "a", "2018-01-01 00:00:00", 10.0, None),
            tx("o1", 2, "a", "2018-01-01 00:00:00", 5.0, None),
            tx("o2", 1, "a", "2018-01-02 06:00:00", 20.0, None),
            tx("o3", 1, "b", "2018-01-03 00:30:00", 7.5, None),
        ];
        let reference = ts("2018-01-03 00:30:00");
        let rfm = rfm_table(&rows, reference);

        assert_eq!(rfm.len(), 2);
        assert_eq!(rfm[0].customer_unique_id, "a");
        assert_eq!(rfm[0].frequency, 2);
        assert!((rfm[0].monetary - 35.0).abs() < EPS);
        assert!((rfm[0].recency_hours - 18.5).abs() < EPS);
        assert_eq!(rfm[1].recency_hours, 0.0);
    }

    #[test]
    fn test_rfm_recency_non_negative_against_global_max() {
        let rows = vec![
            tx("o1", 1, "a", "2017-03-01 10:00:00", 1.0, None),
            tx("o2", 1, "b", "2017-12-24 18:45:10", 1.0, None),
            tx("o3", 1, "c", "2018-08-29 15:00:37", 1.0, None),
        ];
        let global_max = rows.iter().map(|t| t.order_purchase_timestamp).max().unwrap();
        let rfm = rfm_table(&rows[..2], global_max);
        assert!(rfm.iter().all(|r| r.recency_hours >= 0.0));
        assert!(rfm[1].recency_hours > 0.0);
    }

    #[test]
    fn test_rfm_recency_keeps_fractional_seconds() {
        let at = |s: &str| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").unwrap();
        let mut row = tx("o1", 1, "a", "2018-01-01 00:00:00", 5.0, None);
        row.order_purchase_timestamp = at("2018-01-01 00:00:00.5");

        let rfm = rfm_table(&[row], at("2018-01-01 00:00:01.25"));
        assert!((rfm[0].recency_hours - 0.75 / 3600.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(customers_by_state(&[]).is_empty());
        assert!(customers_by_city(&[]).is_empty());
        assert!(category_rollup(&[]).is_empty());
        assert!(rfm_table(&[], ts("2018-01-01 00:00:00")).is_empty());
        assert!(top_categories(&[], 5).is_empty());
    }
}

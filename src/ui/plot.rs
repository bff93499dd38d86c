use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate};
use eframe::egui::{RichText, ScrollArea, Ui};
use egui_plot::{Bar, BarChart, GridMark, Line, Plot, PlotPoints, Points};

use crate::color;
use crate::dashboard::{DashboardView, SeriesPoint};
use crate::data::aggregate::{CategoryCount, RegionCount, RfmRow};
use crate::state::AppState;

const CHART_HEIGHT: f32 = 260.0;

// ---------------------------------------------------------------------------
// Dashboard (central panel)
// ---------------------------------------------------------------------------

/// Render the metrics and charts for the current selection.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    let Some(view) = &state.view else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to view the dashboard  (File → Open…)");
        });
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading(&state.config.window_title);
            if view.is_empty() {
                ui.label(RichText::new("No orders in the selected range.").weak());
            }
            ui.add_space(8.0);

            orders_section(ui, view);
            categories_section(ui, view);
            customers_section(ui, view);
            rfm_section(ui, view);
        });
}

fn orders_section(ui: &mut Ui, view: &DashboardView) {
    ui.strong("Daily Order and Revenue");
    ui.columns(2, |cols: &mut [Ui]| {
        metric(&mut cols[0], "Total Order", &view.total_orders.to_string());
        metric(&mut cols[1], "Total Revenue", &view.total_revenue_label);
    });
    time_series(ui, "daily_orders", "Daily Order", "Orders", &view.daily_orders);
    time_series(ui, "daily_revenue", "Daily Revenue", "Revenue", &view.daily_revenue);
    ui.separator();
}

fn categories_section(ui: &mut Ui, view: &DashboardView) {
    ui.strong("Best and Worst Performing Product Category");
    ui.columns(2, |cols: &mut [Ui]| {
        ranking_chart(
            &mut cols[0],
            "best_categories",
            "Best Performing Product Category",
            "Number of Order",
            &category_entries(&view.best_categories),
            true,
        );
        ranking_chart(
            &mut cols[1],
            "worst_categories",
            "Worst Performing Product Category",
            "Number of Order",
            &category_entries(&view.worst_categories),
            true,
        );
    });
    ui.separator();
}

fn customers_section(ui: &mut Ui, view: &DashboardView) {
    ui.strong("Top Customer's Origin");
    ranking_chart(
        ui,
        "top_states",
        "Number of Customer by State (10 Highest)",
        "Customers",
        &region_entries(&view.top_states),
        false,
    );
    ranking_chart(
        ui,
        "top_cities",
        "Number of Customer by City (10 Highest)",
        "Customers",
        &region_entries(&view.top_cities),
        true,
    );
    ui.separator();
}

fn rfm_section(ui: &mut Ui, view: &DashboardView) {
    let rfm = &view.rfm;
    ui.strong("Best Customer Based on RFM Parameters");
    ui.columns(3, |cols: &mut [Ui]| {
        metric(&mut cols[0], "Average Recency (days)", &format!("{:.1}", rfm.avg_recency_days));
        metric(&mut cols[1], "Average Frequency", &format!("{:.2}", rfm.avg_frequency));
        metric(&mut cols[2], "Average Monetary", &rfm.avg_monetary_label);
    });
    ui.columns(3, |cols: &mut [Ui]| {
        ranking_chart(
            &mut cols[0],
            "rfm_recency",
            "By Recency (days)",
            "Days",
            &rfm_entries(&rfm.by_recency, |r| r.recency_hours / 24.0),
            false,
        );
        ranking_chart(
            &mut cols[1],
            "rfm_frequency",
            "By Frequency",
            "Orders",
            &rfm_entries(&rfm.by_frequency, |r| r.frequency as f64),
            false,
        );
        ranking_chart(
            &mut cols[2],
            "rfm_monetary",
            "By Monetary",
            "Revenue",
            &rfm_entries(&rfm.by_monetary, |r| r.monetary),
            false,
        );
    });
}

// ---------------------------------------------------------------------------
// Widgets
// ---------------------------------------------------------------------------

fn metric(ui: &mut Ui, label: &str, value: &str) {
    ui.vertical(|ui: &mut Ui| {
        ui.label(RichText::new(label).weak());
        ui.label(RichText::new(value).size(28.0).strong());
    });
}

/// Line + markers over calendar days.
fn time_series(ui: &mut Ui, id: &str, title: &str, y_label: &str, points: &[SeriesPoint]) {
    ui.label(RichText::new(title).strong());

    let xy: Vec<[f64; 2]> = points
        .iter()
        .map(|p| [day_number(p.date), p.value])
        .collect();
    let line = Line::new(PlotPoints::from(xy.clone()))
        .color(color::accent())
        .width(2.0);
    let markers = Points::new(PlotPoints::from(xy))
        .color(color::accent())
        .radius(3.0);

    Plot::new(id)
        .height(CHART_HEIGHT)
        .x_axis_label("Date")
        .y_axis_label(y_label)
        .x_axis_formatter(|mark: GridMark, _range: &RangeInclusive<f64>| date_label(mark.value))
        .label_formatter(|_name, value| format!("{}\n{:.2}", date_label(value.x), value.y))
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.line(line);
            plot_ui.points(markers);
        });
}

/// Bar chart of a ranking. The first entry is highlighted; horizontal charts
/// list it at the top.
fn ranking_chart(
    ui: &mut Ui,
    id: &str,
    title: &str,
    value_label: &str,
    entries: &[(String, f64)],
    horizontal: bool,
) {
    ui.label(RichText::new(title).strong());
    if entries.is_empty() {
        ui.label(RichText::new("No data in range.").weak());
        return;
    }

    let n = entries.len();
    let position = |i: usize| if horizontal { n - 1 - i } else { i };

    let mut labels = vec![String::new(); n];
    let bars: Vec<Bar> = entries
        .iter()
        .zip(color::rank_colors(n))
        .enumerate()
        .map(|(i, ((name, value), fill))| {
            labels[position(i)] = name.clone();
            Bar::new(position(i) as f64, *value)
                .name(name)
                .fill(fill)
                .width(0.7)
        })
        .collect();

    let mut chart = BarChart::new(bars);
    if horizontal {
        chart = chart.horizontal();
    }

    let axis_labels =
        move |mark: GridMark, _range: &RangeInclusive<f64>| label_at(&labels, mark.value);
    let plot = Plot::new(id)
        .height(CHART_HEIGHT)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false);
    let plot = if horizontal {
        plot.x_axis_label(value_label).y_axis_formatter(axis_labels)
    } else {
        plot.y_axis_label(value_label).x_axis_formatter(axis_labels)
    };

    plot.show(ui, |plot_ui| plot_ui.bar_chart(chart));
}

// ---------------------------------------------------------------------------
// Axis helpers
// ---------------------------------------------------------------------------

fn day_number(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

/// Label integral day numbers as ISO dates; leave sub-day marks blank.
fn date_label(x: f64) -> String {
    let day = x.round();
    if (x - day).abs() > 1e-6 {
        return String::new();
    }
    NaiveDate::from_num_days_from_ce_opt(day as i32)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Category label for an integral bar position.
fn label_at(labels: &[String], x: f64) -> String {
    let pos = x.round();
    if (x - pos).abs() > 1e-6 || pos < 0.0 {
        return String::new();
    }
    labels.get(pos as usize).cloned().unwrap_or_default()
}

fn category_entries(counts: &[CategoryCount]) -> Vec<(String, f64)> {
    counts
        .iter()
        .map(|c| (c.category.clone(), c.items as f64))
        .collect()
}

fn region_entries(counts: &[RegionCount]) -> Vec<(String, f64)> {
    counts
        .iter()
        .map(|r| (r.region.clone(), r.customers as f64))
        .collect()
}

/// Customer ids are long hashes; charts show the first eight characters.
fn rfm_entries(rows: &[RfmRow], value: fn(&RfmRow) -> f64) -> Vec<(String, f64)> {
    rows.iter()
        .map(|r| {
            let short: String = r.customer_unique_id.chars().take(8).collect();
            (short, value(r))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_label_round_trips_day_numbers() {
        let d = NaiveDate::from_ymd_opt(2018, 1, 3).unwrap();
        assert_eq!(date_label(day_number(d)), "2018-01-03");
        assert_eq!(date_label(day_number(d) + 0.5), "");
    }

    #[test]
    fn test_label_at() {
        let labels = vec!["SP".to_string(), "RJ".to_string()];
        assert_eq!(label_at(&labels, 1.0), "RJ");
        assert_eq!(label_at(&labels, 0.25), "");
        assert_eq!(label_at(&labels, -1.0), "");
        assert_eq!(label_at(&labels, 5.0), "");
    }

    #[test]
    fn test_rfm_entries_shorten_ids() {
        let rows = vec![RfmRow {
            customer_unique_id: "0a0a92112bd4c708ca5fde585afaa872".into(),
            recency_hours: 48.0,
            frequency: 1,
            monetary: 13440.0,
        }];
        let entries = rfm_entries(&rows, |r| r.recency_hours / 24.0);
        assert_eq!(entries, vec![("0a0a9211".to_string(), 2.0)]);
    }
}

use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::DatePickerButton;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – date-range selector
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let (Some(dataset), Some(range)) = (&state.dataset, state.range) else {
        ui.label("No dataset loaded.");
        return;
    };
    let first = dataset.first_purchase_date();
    let last = dataset.last_purchase_date();

    ui.strong("Select Date Range");
    ui.label(RichText::new(format!("Data covers {first} to {last}")).weak());
    ui.add_space(4.0);

    let mut start = range.start();
    let mut end = range.end();
    let mut changed = false;

    egui::Grid::new("date_range")
        .num_columns(2)
        .spacing([8.0, 6.0])
        .show(ui, |ui: &mut Ui| {
            ui.label("From");
            changed |= ui
                .add(DatePickerButton::new(&mut start).id_salt("start_date"))
                .changed();
            ui.end_row();

            ui.label("To");
            changed |= ui
                .add(DatePickerButton::new(&mut end).id_salt("end_date"))
                .changed();
            ui.end_row();
        });

    ui.add_space(4.0);
    if ui.button("Reset to full span").clicked() {
        start = first;
        end = last;
        changed = true;
    }

    if changed {
        // a rejected range is reported through `status_message`
        let _ = state.set_range(start, end);
    }

    if let Some(view) = &state.view {
        ui.separator();
        ui.label(format!("{} days selected", view.daily_orders.len()));
        ui.label(format!("{} rows in range", view.rows_in_range));
        ui.label(format!("{} customers", view.rfm.customers));
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let can_export = state.view.is_some();
            if ui
                .add_enabled(can_export, egui::Button::new("Export view…"))
                .clicked()
            {
                export_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(ds), Some(view)) = (&state.dataset, &state.view) {
            ui.label(format!(
                "{} rows loaded from {}, {} in range",
                ds.rows.len(),
                ds.source.display(),
                view.rows_in_range
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open transactions data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        if let Err(e) = state.open(&path) {
            log::error!("Failed to load file: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

pub fn export_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export dashboard view")
        .add_filter("JSON", &["json"])
        .set_file_name("dashboard_view.json")
        .save_file();

    if let Some(path) = file {
        if let Err(e) = state.export_view(&path) {
            log::error!("Failed to export view: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

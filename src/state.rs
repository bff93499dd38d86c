use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::config::DashboardConfig;
use crate::dashboard::DashboardView;
use crate::data::filter::DateRange;
use crate::data::loader::load_file;
use crate::data::model::Dataset;
use crate::error::InvalidRange;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Loaded snapshot (None only if a startup load was skipped).
    pub dataset: Option<Dataset>,

    /// Current purchase-date selection.
    pub range: Option<DateRange>,

    /// Metrics and charts for `range` (recomputed on every change).
    pub view: Option<DashboardView>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            dataset: None,
            range: None,
            view: None,
            status_message: None,
        }
    }

    /// Ingest a newly loaded dataset and select its full span.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        let range = DateRange::full_span(&dataset);
        log::info!(
            "Loaded {} rows from {} spanning {} to {}",
            dataset.rows.len(),
            dataset.source.display(),
            range.start(),
            range.end()
        );

        self.view = Some(DashboardView::build(&dataset, &range, &self.config));
        self.range = Some(range);
        self.dataset = Some(dataset);
        self.status_message = None;
    }

    /// Load a file and make it the current dataset. On failure the previous
    /// dataset stays in place.
    pub fn open(&mut self, path: &Path) -> Result<()> {
        let dataset =
            load_file(path).with_context(|| format!("loading {}", path.display()))?;
        self.set_dataset(dataset);
        Ok(())
    }

    /// Select a new date range and rebuild the view. The range is clamped to
    /// the dataset's span; an inverted range is rejected and the previous
    /// view is kept.
    pub fn set_range(&mut self, start: NaiveDate, end: NaiveDate) -> Result<(), InvalidRange> {
        let Some(dataset) = &self.dataset else {
            return Ok(());
        };

        let range = match DateRange::new(start, end) {
            Ok(r) => r.clamp_to(dataset),
            Err(e) => {
                log::warn!("Rejected date range: {e}");
                self.status_message = Some(format!("Invalid range: {e}"));
                return Err(e);
            }
        };

        if self.range != Some(range) {
            self.view = Some(DashboardView::build(dataset, &range, &self.config));
            self.range = Some(range);
        }
        self.status_message = None;
        Ok(())
    }

    /// Write the current view as pretty-printed JSON.
    pub fn export_view(&self, path: &Path) -> Result<()> {
        let view = self.view.as_ref().context("no view to export")?;
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, view).context("writing view JSON")?;
        writer.flush().context("flushing view JSON")?;
        log::info!("Exported view to {}", path.display());
        Ok(())
    }
}

//! Output formatting and persistence for the dataset and dashboard report.
//!
//! Supports pretty-printing, JSON serialization, and CSV export.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::dashboard::DashboardReport;
use crate::model::Dataset;
use csv::WriterBuilder;
use std::fs::File;
use std::path::Path;

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty(value: &impl std::fmt::Debug) {
    debug!("{:#?}", value);
}

/// Logs a value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes the cleaned dataset to a comma-separated UTF-8 CSV with headers.
///
/// Overwrites `path` if it exists.
pub fn write_dataset(path: impl AsRef<Path>, dataset: &Dataset) -> Result<()> {
    let path = path.as_ref();
    debug!(path = %path.display(), rows = dataset.len(), "Writing dataset CSV");

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

    for record in dataset.iter() {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}

/// Writes the dashboard report as pretty JSON.
pub fn write_report(path: impl AsRef<Path>, report: &DashboardReport) -> Result<()> {
    let path = path.as_ref();
    debug!(path = %path.display(), tabs = report.tabs.len(), "Writing dashboard report");

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(file, report)?;

    Ok(())
}

//! PDF incident report: chart rasterization, page layout, PDF output.

pub mod charts;
pub mod layout;
pub mod pdf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};

use crate::filter::FilterCriteria;
use crate::models::Ticket;

pub fn report_file_name(date: NaiveDate) -> String {
    format!("reporte-{}.pdf", date.format("%Y-%m-%d"))
}

#[derive(Debug)]
pub struct GeneratedReport {
    pub path: PathBuf,
    pub pages: usize,
    pub table_rows: usize,
}

/// Build the report for an already filtered ticket set and write it into
/// `out_dir`. Charts that fail to render are left out.
pub fn generate(
    tickets: &[Ticket],
    criteria: &FilterCriteria,
    out_dir: &Path,
    generated_at: NaiveDateTime,
) -> Result<GeneratedReport> {
    let charts = charts::render_all(tickets);
    let doc = layout::assemble(tickets, criteria, &charts, generated_at);
    let bytes = pdf::render(&doc, &charts)?;

    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;
    let path = out_dir.join(report_file_name(generated_at.date()));
    fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::info!(path = %path.display(), pages = doc.pages.len(), "report written");
    Ok(GeneratedReport {
        path,
        pages: doc.pages.len(),
        table_rows: doc.table_rows().len(),
    })
}

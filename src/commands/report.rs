use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use std::fs;
use std::path::Path;

use crate::filter::{filter, FilterCriteria};
use crate::models::Ticket;
use crate::report::{self, charts};

use super::confirm;

pub fn run(tickets: &[Ticket], criteria: &FilterCriteria, out_dir: &Path, yes: bool) -> Result<()> {
    run_at(tickets, criteria, out_dir, yes, Local::now().naive_local())
}

fn run_at(
    tickets: &[Ticket],
    criteria: &FilterCriteria,
    out_dir: &Path,
    yes: bool,
    now: NaiveDateTime,
) -> Result<()> {
    let selected = filter(tickets, criteria);
    let file_name = report::report_file_name(now.date());

    if !yes && !confirm(&format!("Download report {}?", file_name))? {
        println!("Cancelled.");
        return Ok(());
    }

    let generated = report::generate(&selected, criteria, out_dir, now)?;
    println!(
        "Saved {} ({} tickets, {} page(s))",
        generated.path.display(),
        selected.len(),
        generated.pages
    );
    Ok(())
}

/// Write each chart as a PNG; charts that fail to render are skipped.
pub fn export_charts(tickets: &[Ticket], criteria: &FilterCriteria, out_dir: &Path) -> Result<()> {
    let selected = filter(tickets, criteria);
    let set = charts::render_all(&selected);

    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    for kind in charts::ChartKind::ALL {
        let Some(image) = set.get(kind) else {
            println!("Skipped {} (unavailable)", kind.title());
            continue;
        };
        let path = out_dir.join(format!("{}.png", kind.file_stem()));
        fs::write(&path, image.to_png()?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{parse_ticket_date, TicketStatus};
    use crate::store::TicketStore;
    use tempfile::tempdir;

    #[test]
    fn test_report_written_with_yes() {
        let dir = tempdir().unwrap();
        let store = TicketStore::demo().unwrap();
        let now = parse_ticket_date("2024-02-03T12:00:00").unwrap();

        run_at(store.tickets(), &FilterCriteria::default(), dir.path(), true, now).unwrap();

        let path = dir.path().join("reporte-2024-02-03.pdf");
        assert!(path.exists());
        assert!(fs::read(path).unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn test_report_respects_filters() {
        let dir = tempdir().unwrap();
        let store = TicketStore::demo().unwrap();
        let criteria = FilterCriteria {
            status: Some(TicketStatus::Resolved),
            ..Default::default()
        };
        assert!(run(store.tickets(), &criteria, dir.path(), true).is_ok());
        let written: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(written.len(), 1);
    }

    #[test]
    fn test_export_charts() {
        let dir = tempdir().unwrap();
        let store = TicketStore::demo().unwrap();

        export_charts(store.tickets(), &FilterCriteria::default(), dir.path()).unwrap();

        for stem in ["company-pie", "status-doughnut", "technician-bar"] {
            let png = fs::read(dir.path().join(format!("{}.png", stem))).unwrap();
            assert_eq!(&png[1..4], b"PNG");
        }
    }
}

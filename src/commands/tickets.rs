use anyhow::Result;

use crate::aggregate::{
    resolved_by_technician, tally_by_company, tally_by_technician, total_hours, Aggregates,
};
use crate::filter::{filter, FilterCriteria};
use crate::models::{Ticket, TicketStatus};

use super::truncate;

pub fn list(tickets: &[Ticket], criteria: &FilterCriteria) -> Result<()> {
    print!("{}", render_list(&filter(tickets, criteria)));
    Ok(())
}

pub fn stats(tickets: &[Ticket], criteria: &FilterCriteria) -> Result<()> {
    print!("{}", render_stats(&filter(tickets, criteria)));
    Ok(())
}

pub fn render_list(tickets: &[Ticket]) -> String {
    if tickets.is_empty() {
        return "No tickets found.\n".to_string();
    }

    let mut out = String::new();
    for t in tickets {
        let status_display = format!("[{}]", t.status_label());
        out.push_str(&format!(
            "#{:<4} {:<10} {:10} {:<20} {:<24} {:<24} {}\n",
            t.id,
            t.code,
            status_display,
            truncate(&t.technician, 20),
            truncate(&t.company, 24),
            truncate(&t.fault_type, 24),
            t.date.format("%Y-%m-%d")
        ));
    }
    out.push_str(&summary_line(&Aggregates::compute(tickets)));
    out
}

fn summary_line(agg: &Aggregates) -> String {
    let per_status: Vec<String> = TicketStatus::ALL
        .iter()
        .map(|s| format!("{}: {}", s.label(), agg.count(*s)))
        .collect();
    format!(
        "\n{} tickets | {} | Resolved/Closed: {}\n",
        agg.total,
        per_status.join(" | "),
        agg.closed_or_resolved
    )
}

pub fn render_stats(tickets: &[Ticket]) -> String {
    let agg = Aggregates::compute(tickets);
    let mut out = String::new();

    out.push_str(&format!("Total: {}\n", agg.total));
    for (status, count) in &agg.counts_by_status {
        out.push_str(&format!("  {:<10} {}\n", status.label(), count));
    }
    out.push_str(&format!("  {:<10} {}\n", "Resolved/Closed", agg.closed_or_resolved));
    out.push_str(&format!("Hours logged: {:.1}\n", total_hours(tickets)));

    let sections = [
        ("By technician", tally_by_technician(tickets)),
        ("By company", tally_by_company(tickets)),
        ("Resolved by technician", resolved_by_technician(tickets)),
    ];
    for (title, tally) in sections {
        out.push_str(&format!("\n{}:\n", title));
        if tally.is_empty() {
            out.push_str("  (none)\n");
        }
        for (key, count) in tally {
            out.push_str(&format!("  {:<28} {}\n", truncate(&key, 28), count));
        }
    }
    out
}

use std::collections::BTreeMap;

use crate::models::{Ticket, TicketStatus};

/// Counters derived from a ticket subsequence. Never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregates {
    pub total: usize,
    pub counts_by_status: BTreeMap<TicketStatus, usize>,
    /// `closed` plus `resolved`, the "resolved/closed" KPI.
    pub closed_or_resolved: usize,
}

impl Aggregates {
    pub fn compute(tickets: &[Ticket]) -> Self {
        let mut counts_by_status: BTreeMap<TicketStatus, usize> =
            TicketStatus::ALL.iter().map(|s| (*s, 0)).collect();
        for ticket in tickets {
            *counts_by_status.entry(ticket.status).or_insert(0) += 1;
        }

        let closed_or_resolved = tickets
            .iter()
            .filter(|t| t.status.is_closed_or_resolved())
            .count();

        Aggregates {
            total: tickets.len(),
            counts_by_status,
            closed_or_resolved,
        }
    }

    pub fn count(&self, status: TicketStatus) -> usize {
        self.counts_by_status.get(&status).copied().unwrap_or(0)
    }
}

/// Count tickets per key. Keys are sorted so output order is stable.
pub fn tally_by<F>(tickets: &[Ticket], key_fn: F) -> BTreeMap<String, usize>
where
    F: Fn(&Ticket) -> String,
{
    let mut tally = BTreeMap::new();
    for ticket in tickets {
        *tally.entry(key_fn(ticket)).or_insert(0) += 1;
    }
    tally
}

pub fn tally_by_technician(tickets: &[Ticket]) -> BTreeMap<String, usize> {
    tally_by(tickets, |t| t.technician.clone())
}

pub fn tally_by_company(tickets: &[Ticket]) -> BTreeMap<String, usize> {
    tally_by(tickets, |t| t.company.clone())
}

/// Per-technician count of closed-or-resolved tickets, for performance charts.
pub fn resolved_by_technician(tickets: &[Ticket]) -> BTreeMap<String, usize> {
    let resolved: Vec<Ticket> = tickets
        .iter()
        .filter(|t| t.status.is_closed_or_resolved())
        .cloned()
        .collect();
    tally_by_technician(&resolved)
}

pub fn total_hours(tickets: &[Ticket]) -> f64 {
    tickets.iter().map(|t| t.duration_hours).sum()
}

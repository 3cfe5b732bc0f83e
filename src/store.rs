use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::models::{parse_ticket_date, DashboardData, Ticket, TicketStatus, NOT_AVAILABLE};

// Embedded at compile time; see build.rs
const DEMO_TICKETS: &str = include_str!("../demo/tickets.json");

/// Ordered in-memory ticket collection owned by the application root.
#[derive(Debug, Clone, Default)]
pub struct TicketStore {
    tickets: Vec<Ticket>,
}

impl TicketStore {
    pub fn new(tickets: Vec<Ticket>) -> Self {
        TicketStore { tickets }
    }

    pub fn demo() -> Result<Self> {
        let tickets: Vec<Ticket> =
            serde_json::from_str(DEMO_TICKETS).context("Bundled demo tickets are malformed")?;
        Ok(TicketStore::new(tickets))
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let tickets: Vec<Ticket> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse tickets from {}", path.display()))?;
        Ok(TicketStore::new(tickets))
    }

    pub fn save_json_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.tickets)?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Build the store from the dashboard payload. Ids follow response order.
    /// A ticket with several technical sheets arrives once per sheet; only its
    /// first row is kept.
    pub fn from_dashboard(data: &DashboardData) -> Self {
        let mut tickets = Vec::with_capacity(data.tickets.len());
        let mut seen = HashSet::new();

        for row in &data.tickets {
            if !row.codigo.is_empty() && !seen.insert(row.codigo.as_str()) {
                tracing::debug!(codigo = %row.codigo, "skipping repeated ticket row");
                continue;
            }
            let status = match row.estado.parse::<TicketStatus>() {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(codigo = %row.codigo, "skipping ticket: {}", e);
                    continue;
                }
            };
            let Some(date) = parse_ticket_date(&row.fecha) else {
                tracing::warn!(codigo = %row.codigo, fecha = %row.fecha, "skipping ticket with unreadable date");
                continue;
            };

            tickets.push(Ticket {
                id: tickets.len() as i64 + 1,
                code: row.codigo.clone(),
                technician: or_not_available(row.tecnico_nombre.as_deref()),
                date,
                company: or_not_available(row.empresa.as_deref()),
                duration_hours: 0.0,
                fault_type: String::new(),
                status,
            });
        }

        TicketStore::new(tickets)
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    pub fn get(&self, id: i64) -> Option<&Ticket> {
        self.tickets.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    /// The only mutation the store supports. The label is derived from the
    /// status, so it follows automatically.
    pub fn set_status(&mut self, id: i64, status: TicketStatus) -> Result<()> {
        match self.tickets.iter_mut().find(|t| t.id == id) {
            Some(ticket) => {
                tracing::debug!(id, from = %ticket.status, to = %status, "status change");
                ticket.status = status;
                Ok(())
            }
            None => bail!("Ticket #{} not found", id),
        }
    }
}

fn or_not_available(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

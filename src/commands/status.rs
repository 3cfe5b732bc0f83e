use anyhow::{bail, Result};
use std::path::Path;

use crate::models::TicketStatus;
use crate::store::TicketStore;

/// Change one ticket's status in a ticket file and write the file back.
pub fn set(path: &Path, id: i64, status: TicketStatus) -> Result<()> {
    let mut store = TicketStore::from_json_file(path)?;

    let previous = match store.get(id) {
        Some(t) => t.status,
        None => bail!("Ticket #{} not found", id),
    };
    if previous == status {
        println!("Ticket #{} is already {}", id, status.label());
        return Ok(());
    }

    store.set_status(id, status)?;
    store.save_json_file(path)?;
    println!("Ticket #{}: {} -> {}", id, previous.label(), status.label());
    Ok(())
}

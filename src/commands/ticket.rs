use anyhow::{bail, Result};

use crate::api::ApiClient;
use crate::models::NewTicket;

pub fn create(
    api: &ApiClient,
    client_id: i64,
    bus_number: &str,
    fault_id: i64,
    technician_id: Option<i64>,
) -> Result<()> {
    let bus_number = bus_number.trim();
    if bus_number.is_empty() {
        bail!("Bus number cannot be empty");
    }

    let ticket = NewTicket {
        id_cliente: client_id,
        num_autobus: bus_number.to_string(),
        id_falla: fault_id,
        id_tecnico: technician_id,
    };

    match api.create_ticket(&ticket) {
        Ok(created) => {
            match created.codigo {
                Some(code) => println!("Created ticket {}", code),
                None => println!("Created ticket"),
            }
            Ok(())
        }
        Err(e) => bail!("Failed to create ticket: {}", e),
    }
}

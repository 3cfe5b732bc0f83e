use anyhow::Result;

use crate::api::ApiClient;
use crate::models::{Client, Technician, NOT_AVAILABLE};

use super::truncate;

fn badge(active: bool) -> &'static str {
    if active {
        "ACTIVO"
    } else {
        "INACTIVO"
    }
}

fn telegram(id: Option<&impl ToString>) -> String {
    id.map(|t| t.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

pub fn technicians(api: &ApiClient) -> Result<()> {
    match api.technicians() {
        Ok(list) => print!("{}", render_technicians(&list)),
        Err(e) => {
            tracing::error!("failed to load technicians: {}", e);
            println!("No data.");
        }
    }
    Ok(())
}

pub fn clients(api: &ApiClient) -> Result<()> {
    match api.clients() {
        Ok(list) => print!("{}", render_clients(&list)),
        Err(e) => {
            tracing::error!("failed to load clients: {}", e);
            println!("No data.");
        }
    }
    Ok(())
}

pub fn render_technicians(list: &[Technician]) -> String {
    if list.is_empty() {
        return "No technicians.\n".to_string();
    }
    list.iter()
        .map(|t| {
            format!(
                "#{:<4} {:<28} {:<20} {:<14} {}\n",
                t.id,
                truncate(&t.full_name(), 28),
                truncate(t.nombre_especialidad.as_deref().unwrap_or(NOT_AVAILABLE), 20),
                telegram(t.id_telegram.as_ref()),
                badge(t.activo)
            )
        })
        .collect()
}

pub fn render_clients(list: &[Client]) -> String {
    if list.is_empty() {
        return "No clients.\n".to_string();
    }
    list.iter()
        .map(|c| {
            format!(
                "#{:<4} {:<28} {:<24} {:<14} {}\n",
                c.id,
                truncate(&c.full_name(), 28),
                truncate(c.nombre_empresa.as_deref().unwrap_or(NOT_AVAILABLE), 24),
                telegram(c.id_telegram.as_ref()),
                badge(c.activo)
            )
        })
        .collect()
}

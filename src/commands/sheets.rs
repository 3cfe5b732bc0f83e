use anyhow::Result;

use crate::api::ApiClient;
use crate::models::{TechnicalSheet, NOT_AVAILABLE};

pub fn run(api: &ApiClient) -> Result<()> {
    match api.technical_sheets() {
        Ok(sheets) => print!("{}", render(&sheets)),
        Err(e) => {
            tracing::error!("failed to load technical sheets: {}", e);
            println!("No data.");
        }
    }
    Ok(())
}

fn or_na(value: &Option<String>) -> &str {
    value
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(NOT_AVAILABLE)
}

pub fn render(sheets: &[TechnicalSheet]) -> String {
    if sheets.is_empty() {
        return "No technical sheets.\n".to_string();
    }

    let mut out = String::new();
    for s in sheets {
        out.push_str(&format!(
            "Sheet #{} - ticket {} [{}]\n",
            s.ficha_id,
            or_na(&s.ticket_cod),
            or_na(&s.estado)
        ));
        out.push_str(&format!("  Technician: {}\n", or_na(&s.tecnico)));
        out.push_str(&format!(
            "  Element: {} / {}\n",
            or_na(&s.elemento),
            or_na(&s.accesorio)
        ));
        out.push_str(&format!(
            "  Period: {} -> {}\n",
            or_na(&s.fecha_inicio),
            or_na(&s.fecha_cierre)
        ));
        out.push_str(&format!("  Review: {}\n", or_na(&s.detalle_revision)));
        out.push_str(&format!("  Solution: {}\n", or_na(&s.solucion)));
        if let Some(obs) = s.observacion.as_deref().filter(|o| !o.trim().is_empty()) {
            out.push_str(&format!("  Notes: {}\n", obs));
        }
        if let Some(url) = s.evidencia_url.as_deref().filter(|u| !u.trim().is_empty()) {
            out.push_str(&format!("  Evidence: {}\n", url));
        }
        out.push('\n');
    }
    out
}

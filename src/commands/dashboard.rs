use anyhow::Result;

use crate::api::ApiClient;
use crate::models::{DashboardData, NOT_AVAILABLE};

use super::truncate;

pub fn run(api: &ApiClient) -> Result<()> {
    match api.dashboard() {
        Ok(data) => print!("{}", render(&data)),
        Err(e) => {
            tracing::error!("failed to load dashboard: {}", e);
            println!("No data.");
        }
    }
    Ok(())
}

pub fn render(data: &DashboardData) -> String {
    let s = &data.stats;
    let mut out = String::new();

    out.push_str(&format!(
        "Tickets: {}  Open: {}  In attention: {}  Waiting: {}  Resolved: {}\n",
        s.total, s.abiertas, s.atencion, s.espera, s.resueltos
    ));
    out.push_str(&format!(
        "Technicians: {}  Clients: {}  Companies: {}\n",
        s.total_tecnicos, s.total_clientes, s.total_empresas
    ));
    out.push('\n');

    if data.tickets.is_empty() {
        out.push_str("No tickets.\n");
        return out;
    }

    for t in &data.tickets {
        out.push_str(&format!(
            "{:<10} {:<30} {:<30} {}\n",
            t.codigo,
            truncate(&t.fecha, 30),
            truncate(t.empresa.as_deref().unwrap_or(NOT_AVAILABLE), 30),
            t.estado
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::stub::{self, Route};

    const DASHBOARD: &str = r#"{"status":"success",
        "stats":{"total":1,"abiertas":1,"atencion":0,"espera":0,"resueltos":0,
                 "total_tecnicos":2,"total_clientes":3,"total_empresas":1},
        "tickets":[{"codigo":"INT-0001","fecha":"2024-01-05","empresa":null,"estado":"ABIERTO"}]}"#;

    #[test]
    fn test_render_counters_and_rows() {
        let data: DashboardData = serde_json::from_str(DASHBOARD).unwrap();
        let out = render(&data);
        assert!(out.contains("Tickets: 1"));
        assert!(out.contains("Companies: 1"));
        assert!(out.contains("INT-0001"));
        assert!(out.contains("N/A"));
    }

    #[test]
    fn test_render_without_tickets() {
        let data: DashboardData = serde_json::from_str(r#"{"status":"success"}"#).unwrap();
        assert!(render(&data).contains("No tickets."));
    }

    #[test]
    fn test_run_against_backend() {
        let server = stub::spawn(vec![Route {
            method: "GET",
            path: "/api/dashboard-data",
            status: 200,
            body: DASHBOARD,
        }]);
        assert!(run(&ApiClient::new(&server.base_url)).is_ok());
    }

    #[test]
    fn test_run_backend_down_is_not_fatal() {
        let server = stub::spawn(vec![]);
        assert!(run(&ApiClient::new(&server.base_url)).is_ok());
    }
}

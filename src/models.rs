use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::filter::normalize;

/// Placeholder shown for missing text fields.
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Open,
    Waiting,
    Closed,
    Resolved,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 4] = [
        TicketStatus::Open,
        TicketStatus::Waiting,
        TicketStatus::Closed,
        TicketStatus::Resolved,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::Waiting => "waiting",
            TicketStatus::Closed => "closed",
            TicketStatus::Resolved => "resolved",
        }
    }

    /// Display label, always the capitalized status name.
    pub fn label(self) -> &'static str {
        match self {
            TicketStatus::Open => "Open",
            TicketStatus::Waiting => "Waiting",
            TicketStatus::Closed => "Closed",
            TicketStatus::Resolved => "Resolved",
        }
    }

    /// Part of the "resolved/closed" reporting bucket.
    pub fn is_closed_or_resolved(self) -> bool {
        matches!(self, TicketStatus::Closed | TicketStatus::Resolved)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize(s.trim()).replace(['_', '-'], " ");
        match key.as_str() {
            "open" | "abierto" | "abierta" | "en atencion" => Ok(TicketStatus::Open),
            "waiting" | "espera" | "espera refaccion" | "en espera" => Ok(TicketStatus::Waiting),
            "closed" | "cerrado" | "cerrada" => Ok(TicketStatus::Closed),
            "resolved" | "resuelto" | "resuelta" => Ok(TicketStatus::Resolved),
            _ => Err(format!(
                "Unknown status '{}'. Expected one of: open, waiting, closed, resolved",
                s
            )),
        }
    }
}

impl<'de> Deserialize<'de> for TicketStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    #[serde(default)]
    pub code: String,
    pub technician: String,
    #[serde(deserialize_with = "de::flexible_datetime")]
    pub date: NaiveDateTime,
    pub company: String,
    #[serde(default)]
    pub duration_hours: f64,
    #[serde(default)]
    pub fault_type: String,
    pub status: TicketStatus,
}

impl Ticket {
    pub fn status_label(&self) -> &'static str {
        self.status.label()
    }
}

/// Parse the date renderings the backend and ticket files use.
/// A bare calendar date means midnight of that day. Offset-bearing values keep
/// the wall-clock time they were written with.
pub fn parse_ticket_date(s: &str) -> Option<NaiveDateTime> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    // Also covers the "Fri, 05 Jan 2024 10:00:00 GMT" rendering of the backend
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed)
        .or_else(|_| DateTime::parse_from_rfc2822(trimmed))
    {
        return Some(dt.naive_local());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub mod de {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer};

    use super::{parse_ticket_date, TelegramId};

    pub fn flexible_datetime<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_ticket_date(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid ticket date '{}'", s)))
    }

    /// "" and null both become None.
    pub fn telegram_opt<'de, D>(deserializer: D) -> Result<Option<TelegramId>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<TelegramId>::deserialize(deserializer)?;
        Ok(value.filter(|id| !matches!(id, TelegramId::Text(s) if s.trim().is_empty())))
    }
}

// ---- REST payloads ----

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardStats {
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub abiertas: i64,
    #[serde(default)]
    pub atencion: i64,
    #[serde(default)]
    pub espera: i64,
    #[serde(default)]
    pub resueltos: i64,
    #[serde(default)]
    pub total_tecnicos: i64,
    #[serde(default)]
    pub total_clientes: i64,
    #[serde(default)]
    pub total_empresas: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardTicket {
    pub codigo: String,
    pub fecha: String,
    pub empresa: Option<String>,
    pub estado: String,
    #[serde(default)]
    pub tecnico_nombre: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardData {
    pub status: String,
    #[serde(default)]
    pub stats: DashboardStats,
    #[serde(default)]
    pub tickets: Vec<DashboardTicket>,
    #[serde(default)]
    pub message: Option<String>,
}

impl DashboardData {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Telegram ids arrive as numbers from some rows and strings from others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TelegramId {
    Number(i64),
    Text(String),
}

impl fmt::Display for TelegramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelegramId::Number(n) => write!(f, "{}", n),
            TelegramId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Technician {
    pub id: i64,
    #[serde(default, deserialize_with = "de::telegram_opt")]
    pub id_telegram: Option<TelegramId>,
    pub nombre: Option<String>,
    #[serde(default)]
    pub primer_apellido: Option<String>,
    #[serde(default)]
    pub nombre_especialidad: Option<String>,
    #[serde(default)]
    pub activo: bool,
}

impl Technician {
    pub fn full_name(&self) -> String {
        full_name(self.nombre.as_deref(), self.primer_apellido.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    #[serde(default, deserialize_with = "de::telegram_opt")]
    pub id_telegram: Option<TelegramId>,
    pub nombre: Option<String>,
    #[serde(default)]
    pub primer_apellido: Option<String>,
    #[serde(default)]
    pub nombre_empresa: Option<String>,
    #[serde(default)]
    pub activo: bool,
}

impl Client {
    pub fn full_name(&self) -> String {
        full_name(self.nombre.as_deref(), self.primer_apellido.as_deref())
    }
}

fn full_name(first: Option<&str>, last: Option<&str>) -> String {
    let parts: Vec<&str> = [first, last]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        parts.join(" ")
    }
}

/// Reference lists managed from the catalogs view, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Catalog {
    Empresas,
    Equipo,
    CatElementos,
    FallaReportada,
    Solucion,
}

impl Catalog {
    pub const ALL: [Catalog; 5] = [
        Catalog::Empresas,
        Catalog::Equipo,
        Catalog::CatElementos,
        Catalog::FallaReportada,
        Catalog::Solucion,
    ];

    /// Path segment under `/catalogos/`.
    pub fn path(self) -> &'static str {
        match self {
            Catalog::Empresas => "empresas",
            Catalog::Equipo => "equipo",
            Catalog::CatElementos => "cat_elementos",
            Catalog::FallaReportada => "falla_reportada",
            Catalog::Solucion => "solucion",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Catalog::Empresas => "Companies",
            Catalog::Equipo => "Equipment",
            Catalog::CatElementos => "Elements",
            Catalog::FallaReportada => "Reported faults",
            Catalog::Solucion => "Solutions",
        }
    }
}

impl fmt::Display for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Catalog {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Catalog::ALL
            .into_iter()
            .find(|c| c.path().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let names: Vec<&str> = Catalog::ALL.iter().map(|c| c.path()).collect();
                format!("Unknown catalog '{}'. Expected one of: {}", s, names.join(", "))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: i64,
    pub nombre: String,
}

/// Row of `/fichas-completas`: a technician's work sheet for one ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnicalSheet {
    pub ficha_id: i64,
    #[serde(default)]
    pub ticket_cod: Option<String>,
    #[serde(default)]
    pub estado: Option<String>,
    #[serde(default)]
    pub tecnico: Option<String>,
    #[serde(default)]
    pub elemento: Option<String>,
    #[serde(default)]
    pub accesorio: Option<String>,
    #[serde(default)]
    pub detalle_revision: Option<String>,
    #[serde(default, rename = "solución")]
    pub solucion: Option<String>,
    #[serde(default)]
    pub fecha_inicio: Option<String>,
    #[serde(default)]
    pub fecha_cierre: Option<String>,
    #[serde(default)]
    pub observacion: Option<String>,
    #[serde(default)]
    pub evidencia_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsResponse {
    pub status: String,
    #[serde(default)]
    pub data: Vec<TechnicalSheet>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTicket {
    pub id_cliente: i64,
    pub num_autobus: String,
    pub id_falla: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_tecnico: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedTicket {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub codigo: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_label_is_capitalized_name() {
        for status in TicketStatus::ALL {
            let mut chars = status.as_str().chars();
            let first = chars.next().unwrap().to_uppercase().to_string();
            assert_eq!(status.label(), format!("{}{}", first, chars.as_str()));
        }
    }

    #[test]
    fn test_status_parses_backend_values() {
        assert_eq!("ABIERTO".parse::<TicketStatus>().unwrap(), TicketStatus::Open);
        assert_eq!("EN ATENCIÓN".parse::<TicketStatus>().unwrap(), TicketStatus::Open);
        assert_eq!(
            "ESPERA_REFACCION".parse::<TicketStatus>().unwrap(),
            TicketStatus::Waiting
        );
        assert_eq!("RESUELTO".parse::<TicketStatus>().unwrap(), TicketStatus::Resolved);
        assert_eq!("Cerrado".parse::<TicketStatus>().unwrap(), TicketStatus::Closed);
        assert_eq!("closed".parse::<TicketStatus>().unwrap(), TicketStatus::Closed);
    }

    #[test]
    fn test_status_parse_unknown() {
        let err = "cancelado".parse::<TicketStatus>().unwrap_err();
        assert!(err.contains("Unknown status"));
    }

    #[test]
    fn test_closed_or_resolved_bucket() {
        assert!(TicketStatus::Closed.is_closed_or_resolved());
        assert!(TicketStatus::Resolved.is_closed_or_resolved());
        assert!(!TicketStatus::Open.is_closed_or_resolved());
        assert!(!TicketStatus::Waiting.is_closed_or_resolved());
    }

    #[test]
    fn test_parse_ticket_date_formats() {
        let midnight = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_ticket_date("2024-01-05"), Some(midnight));
        assert_eq!(parse_ticket_date("2024-01-05T00:00:00"), Some(midnight));
        assert_eq!(parse_ticket_date("2024-01-05 00:00:00"), Some(midnight));
        assert_eq!(parse_ticket_date("2024-01-05T00:00:00Z"), Some(midnight));
        assert_eq!(
            parse_ticket_date("Fri, 05 Jan 2024 00:00:00 GMT"),
            Some(midnight)
        );
        assert_eq!(parse_ticket_date(""), None);
        assert_eq!(parse_ticket_date("yesterday"), None);
    }

    #[test]
    fn test_offset_dates_keep_calendar_day() {
        let evening = NaiveDate::from_ymd_opt(2024, 1, 10)
            .unwrap()
            .and_hms_opt(20, 0, 0)
            .unwrap();
        assert_eq!(parse_ticket_date("2024-01-10T20:00:00-06:00"), Some(evening));
        assert_eq!(parse_ticket_date("Wed, 10 Jan 2024 20:00:00 -0600"), Some(evening));
        assert_eq!(parse_ticket_date("2024-01-10T20:00:00+09:00"), Some(evening));
    }

    #[test]
    fn test_ticket_json_with_bare_date() {
        let json = r#"{"id":1,"technician":"Ana Pérez","date":"2024-01-05",
            "company":"Acme","duration_hours":1.5,"fault_type":"Pantalla","status":"RESUELTO"}"#;
        let ticket: Ticket = serde_json::from_str(json).unwrap();
        assert_eq!(ticket.status, TicketStatus::Resolved);
        assert_eq!(ticket.status_label(), "Resolved");
        assert_eq!(ticket.code, "");
    }

    #[test]
    fn test_ticket_serializes_lowercase_status() {
        let json = r#"{"id":1,"technician":"A","date":"2024-01-05","company":"B","status":"waiting"}"#;
        let ticket: Ticket = serde_json::from_str(json).unwrap();
        let out = serde_json::to_string(&ticket).unwrap();
        assert!(out.contains(r#""status":"waiting""#));
    }

    #[test]
    fn test_telegram_id_number_or_text() {
        let json = r#"[{"id":1,"id_telegram":12345,"nombre":"Luis","primer_apellido":"Núñez","activo":true},
            {"id":2,"id_telegram":"","nombre":"Eva","primer_apellido":null,"activo":false}]"#;
        let techs: Vec<Technician> = serde_json::from_str(json).unwrap();
        assert_eq!(techs[0].id_telegram, Some(TelegramId::Number(12345)));
        assert_eq!(techs[0].full_name(), "Luis Núñez");
        assert_eq!(techs[1].id_telegram, None);
        assert_eq!(techs[1].full_name(), "Eva");
    }

    #[test]
    fn test_catalog_paths_roundtrip() {
        for catalog in Catalog::ALL {
            assert_eq!(catalog.path().parse::<Catalog>().unwrap(), catalog);
        }
        assert!("accesorios".parse::<Catalog>().is_err());
    }

    #[test]
    fn test_technical_sheet_accented_key() {
        let json = r#"{"status":"success","data":[{"ficha_id":3,"ticket_cod":"INT-0003","solución":"Cambio de cable"}]}"#;
        let resp: SheetsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.data[0].solucion.as_deref(), Some("Cambio de cable"));
    }

    #[test]
    fn test_dashboard_error_payload() {
        let json = r#"{"status":"error","message":"db down"}"#;
        let data: DashboardData = serde_json::from_str(json).unwrap();
        assert!(!data.is_success());
        assert!(data.tickets.is_empty());
        assert_eq!(data.stats.total, 0);
    }
}

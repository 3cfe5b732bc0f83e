//! Blocking client for the ticketing backend's REST API.
//!
//! Requests are issued one at a time; callers that load several resources
//! await each before starting the next. There are no retries.

use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::models::{
    Catalog, CatalogEntry, Client as ClientRecord, CreatedTicket, DashboardData, NewTicket,
    SheetsResponse, TechnicalSheet, Technician,
};

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: StatusCode },

    #[error("unexpected response body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("backend error: {0}")]
    Backend(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        ApiClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn send_checked(&self, url: &str, result: reqwest::Result<Response>) -> ApiResult<Response> {
        let response = result.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(response)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = self.url(path);
        tracing::debug!(%url, "GET");
        let response = self.send_checked(&url, self.http.get(&url).send())?;
        response
            .json::<T>()
            .map_err(|source| ApiError::Decode { url, source })
    }

    pub fn dashboard(&self) -> ApiResult<DashboardData> {
        let data: DashboardData = self.get_json("dashboard-data")?;
        if !data.is_success() {
            return Err(ApiError::Backend(
                data.message.unwrap_or_else(|| data.status.clone()),
            ));
        }
        Ok(data)
    }

    pub fn technicians(&self) -> ApiResult<Vec<Technician>> {
        self.get_json("tecnicos-detallados")
    }

    pub fn clients(&self) -> ApiResult<Vec<ClientRecord>> {
        self.get_json("clientes-detallados")
    }

    pub fn catalog(&self, catalog: Catalog) -> ApiResult<Vec<CatalogEntry>> {
        self.get_json(&format!("catalogos/{}", catalog.path()))
    }

    /// Fetch every catalog in display order, one request after another.
    /// A catalog that fails to load is logged and reported as `None`.
    pub fn all_catalogs(&self) -> Vec<(Catalog, Option<Vec<CatalogEntry>>)> {
        let mut loaded = Vec::with_capacity(Catalog::ALL.len());
        for catalog in Catalog::ALL {
            match self.catalog(catalog) {
                Ok(entries) => loaded.push((catalog, Some(entries))),
                Err(e) => {
                    tracing::error!(catalog = catalog.path(), "failed to load catalog: {}", e);
                    loaded.push((catalog, None));
                }
            }
        }
        loaded
    }

    pub fn delete_catalog_entry(&self, catalog: Catalog, id: i64) -> ApiResult<()> {
        let url = self.url(&format!("catalogos/{}/{}", catalog.path(), id));
        tracing::debug!(%url, "DELETE");
        self.send_checked(&url, self.http.delete(&url).send())?;
        Ok(())
    }

    pub fn technical_sheets(&self) -> ApiResult<Vec<TechnicalSheet>> {
        let resp: SheetsResponse = self.get_json("fichas-completas")?;
        if resp.status != "success" {
            return Err(ApiError::Backend(resp.message.unwrap_or(resp.status)));
        }
        Ok(resp.data)
    }

    pub fn create_ticket(&self, ticket: &NewTicket) -> ApiResult<CreatedTicket> {
        let url = self.url("tickets/crear");
        tracing::debug!(%url, "POST");
        let response = self.send_checked(&url, self.http.post(&url).json(ticket).send())?;
        let created: CreatedTicket = response
            .json()
            .map_err(|source| ApiError::Decode { url, source })?;
        if created.status != "success" {
            return Err(ApiError::Backend(
                created.message.unwrap_or_else(|| created.status.clone()),
            ));
        }
        Ok(created)
    }
}

#[cfg(test)]
pub(crate) mod stub {
    //! Minimal HTTP/1.1 responder for exercising the client without a backend.

    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::sync::{Arc, Mutex};
    use std::thread;

    pub struct Route {
        pub method: &'static str,
        pub path: &'static str,
        pub status: u16,
        pub body: &'static str,
    }

    pub struct StubServer {
        pub base_url: String,
        pub requests: Arc<Mutex<Vec<String>>>,
    }

    pub fn spawn(routes: Vec<Route>) -> StubServer {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&requests);

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                let mut reader = BufReader::new(stream.try_clone().unwrap());

                let mut request_line = String::new();
                if reader.read_line(&mut request_line).is_err() {
                    continue;
                }
                let mut content_length = 0usize;
                loop {
                    let mut header = String::new();
                    if reader.read_line(&mut header).unwrap_or(0) == 0 || header == "\r\n" {
                        break;
                    }
                    let lower = header.to_ascii_lowercase();
                    if let Some(value) = lower.strip_prefix("content-length:") {
                        content_length = value.trim().parse().unwrap_or(0);
                    }
                }
                let mut body = vec![0u8; content_length];
                let _ = reader.read_exact(&mut body);

                let mut parts = request_line.split_whitespace();
                let method = parts.next().unwrap_or("").to_string();
                let path = parts.next().unwrap_or("").to_string();
                log.lock()
                    .unwrap()
                    .push(format!("{} {} {}", method, path, String::from_utf8_lossy(&body)).trim_end().to_string());

                let (status, payload) = routes
                    .iter()
                    .find(|r| r.method == method && path.ends_with(r.path))
                    .map(|r| (r.status, r.body))
                    .unwrap_or((404, r#"{"status":"error","message":"not found"}"#));

                let response = format!(
                    "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    payload.len(),
                    payload
                );
                let _ = stream.write_all(response.as_bytes());
                let _ = stream.flush();
            }
        });

        StubServer {
            base_url: format!("http://{}/api", addr),
            requests,
        }
    }
}

pub mod catalogs;
pub mod dashboard;
pub mod init;
pub mod people;
pub mod report;
pub mod session;
pub mod sheets;
pub mod status;
pub mod ticket;
pub mod tickets;

use anyhow::Result;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::api::ApiClient;
use crate::store::TicketStore;

/// Where the filtering and report commands read tickets from.
#[derive(Debug, Clone)]
pub enum TicketSource {
    File(PathBuf),
    Demo,
    Api,
}

impl TicketSource {
    /// A dashboard fetch failure is logged and yields an empty store.
    pub fn load(&self, api: &ApiClient) -> Result<TicketStore> {
        match self {
            TicketSource::File(path) => TicketStore::from_json_file(path),
            TicketSource::Demo => TicketStore::demo(),
            TicketSource::Api => match api.dashboard() {
                Ok(data) => Ok(TicketStore::from_dashboard(&data)),
                Err(e) => {
                    tracing::error!("failed to load tickets: {}", e);
                    Ok(TicketStore::default())
                }
            },
        }
    }
}

/// Blocking yes/no prompt. Anything but `y` declines.
pub(crate) fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

/// Shorten for a terminal column, marking the cut with `...`.
pub(crate) fn truncate(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

use anyhow::{bail, Result};

use crate::api::ApiClient;
use crate::models::{Catalog, CatalogEntry};

use super::confirm;

pub fn list(api: &ApiClient) -> Result<()> {
    print!("{}", render(&api.all_catalogs()));
    Ok(())
}

pub fn render(catalogs: &[(Catalog, Option<Vec<CatalogEntry>>)]) -> String {
    let mut out = String::new();
    for (catalog, entries) in catalogs {
        out.push_str(&format!("{} ({})\n", catalog.title(), catalog.path()));
        match entries {
            None => out.push_str("  No data.\n"),
            Some(entries) if entries.is_empty() => out.push_str("  (empty)\n"),
            Some(entries) => {
                for entry in entries {
                    out.push_str(&format!("  #{:<4} {}\n", entry.id, entry.nombre));
                }
            }
        }
        out.push('\n');
    }
    out
}

pub fn delete(api: &ApiClient, catalog: Catalog, id: i64, force: bool) -> Result<()> {
    if !force && !confirm(&format!("Delete entry #{} from {}?", id, catalog.path()))? {
        println!("Cancelled.");
        return Ok(());
    }

    if let Err(e) = api.delete_catalog_entry(catalog, id) {
        bail!("Failed to delete entry #{} from {}: {}", id, catalog.path(), e);
    }
    println!("Deleted entry #{} from {}", id, catalog.path());

    // Reload everything so the listing reflects the backend.
    list(api)
}

/// Internal function for testing without stdin interaction
#[cfg(test)]
pub fn run_force(api: &ApiClient, catalog: Catalog, id: i64) -> Result<()> {
    delete(api, catalog, id, true)
}

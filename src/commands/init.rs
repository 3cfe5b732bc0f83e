use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::db::Database;

pub const STORAGE_DIR: &str = ".deskboard";
pub const STORAGE_DB: &str = "storage.db";

pub fn run(path: &Path) -> Result<()> {
    let storage_dir = path.join(STORAGE_DIR);

    if storage_dir.exists() {
        println!("Already initialized at {}", path.display());
        return Ok(());
    }

    fs::create_dir_all(&storage_dir).context("Failed to create .deskboard directory")?;
    Database::open(&storage_dir.join(STORAGE_DB))?;
    println!("Created {}", storage_dir.display());

    println!("Deskboard initialized successfully!");
    println!("\nNext steps:");
    println!("  deskboard login --session <BLOB>   # Store the session issued by the backend");
    println!("  deskboard dashboard                # Show ticket KPIs");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_run_fresh_init() {
        let dir = tempdir().unwrap();
        let result = run(dir.path());
        assert!(result.is_ok());

        assert!(dir.path().join(".deskboard").is_dir());
        assert!(dir.path().join(".deskboard/storage.db").exists());
    }

    #[test]
    fn test_run_already_initialized() {
        let dir = tempdir().unwrap();
        run(dir.path()).unwrap();

        let db = Database::open(&dir.path().join(".deskboard/storage.db")).unwrap();
        db.set_item("sesion", "keep").unwrap();
        drop(db);

        // Second init leaves existing state alone
        assert!(run(dir.path()).is_ok());
        let db = Database::open(&dir.path().join(".deskboard/storage.db")).unwrap();
        assert_eq!(db.get_item("sesion").unwrap().as_deref(), Some("keep"));
    }

    #[test]
    fn test_run_database_usable() {
        let dir = tempdir().unwrap();
        run(dir.path()).unwrap();

        let db = Database::open(&dir.path().join(STORAGE_DIR).join(STORAGE_DB)).unwrap();
        db.set_item("k", "v").unwrap();
        assert_eq!(db.get_item("k").unwrap().as_deref(), Some("v"));
    }
}

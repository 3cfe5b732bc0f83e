use anyhow::Result;

use crate::db::Database;
use crate::session;

pub fn login(db: &Database, blob: &str) -> Result<()> {
    let s = session::store(db, blob)?;
    match s.display_name() {
        Some(name) => println!("Logged in as {}", name),
        None => println!("Session stored."),
    }
    Ok(())
}

pub fn logout(db: &Database) -> Result<()> {
    if session::clear(db)? {
        println!("Logged out.");
    } else {
        println!("No active session.");
    }
    Ok(())
}

pub fn whoami(db: &Database) -> Result<()> {
    let s = session::require(db)?;
    println!("User: {}", s.display_name().as_deref().unwrap_or("(unknown)"));
    println!("Role: {}", s.role().as_deref().unwrap_or("(unknown)"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn setup_test_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(&db_path).unwrap();
        (db, dir)
    }

    #[test]
    fn test_login_logout_cycle() {
        let (db, _dir) = setup_test_db();
        login(&db, r#"{"nombre":"Admin"}"#).unwrap();
        assert!(whoami(&db).is_ok());

        logout(&db).unwrap();
        assert!(whoami(&db).is_err());
    }

    #[test]
    fn test_logout_without_session() {
        let (db, _dir) = setup_test_db();
        assert!(logout(&db).is_ok());
    }

    #[test]
    fn test_login_rejects_blank() {
        let (db, _dir) = setup_test_db();
        assert!(login(&db, "").is_err());
    }
}

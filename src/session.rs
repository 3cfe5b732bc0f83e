use anyhow::{bail, Result};
use serde_json::Value;

use crate::db::Database;

/// Storage key of the externally issued session blob.
pub const SESSION_KEY: &str = "sesion";

/// Opaque session blob. Name and role are read opportunistically if the
/// blob happens to be a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    raw: String,
}

impl Session {
    pub fn new(raw: impl Into<String>) -> Self {
        Session { raw: raw.into() }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn display_name(&self) -> Option<String> {
        self.field(&["nombre", "name", "usuario", "user"])
    }

    pub fn role(&self) -> Option<String> {
        self.field(&["rol", "role"])
    }

    fn field(&self, keys: &[&str]) -> Option<String> {
        let value: Value = serde_json::from_str(&self.raw).ok()?;
        let object = value.as_object()?;
        keys.iter()
            .filter_map(|k| object.get(*k))
            .find_map(|v| match v {
                Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
    }
}

pub fn load(db: &Database) -> Result<Option<Session>> {
    Ok(db.get_item(SESSION_KEY)?.map(Session::new))
}

/// Access gate for every data command.
pub fn require(db: &Database) -> Result<Session> {
    match load(db)? {
        Some(session) => Ok(session),
        None => bail!("No active session. Run 'deskboard login' first."),
    }
}

pub fn store(db: &Database, blob: &str) -> Result<Session> {
    if blob.trim().is_empty() {
        bail!("Session blob is empty");
    }
    db.set_item(SESSION_KEY, blob)?;
    Ok(Session::new(blob))
}

pub fn clear(db: &Database) -> Result<bool> {
    db.remove_item(SESSION_KEY)
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
    fn test_require_without_session_fails() {
        let (db, _dir) = setup_test_db();
        let err = require(&db).unwrap_err();
        assert!(err.to_string().contains("No active session"));
    }

    #[test]
    fn test_store_then_require() {
        let (db, _dir) = setup_test_db();
        store(&db, r#"{"nombre":"Admin Uno","rol":"administrador"}"#).unwrap();
        let session = require(&db).unwrap();
        assert_eq!(session.display_name().as_deref(), Some("Admin Uno"));
        assert_eq!(session.role().as_deref(), Some("administrador"));
    }

    #[test]
    fn test_opaque_blob_has_no_name() {
        let session = Session::new("eyJhbGciOiJIUzI1NiJ9.token");
        assert_eq!(session.display_name(), None);
        assert_eq!(session.role(), None);
    }

    #[test]
    fn test_empty_blob_rejected() {
        let (db, _dir) = setup_test_db();
        assert!(store(&db, "  ").is_err());
        assert!(load(&db).unwrap().is_none());
    }

    #[test]
    fn test_clear_removes_session() {
        let (db, _dir) = setup_test_db();
        store(&db, "blob").unwrap();
        assert!(clear(&db).unwrap());
        assert!(require(&db).is_err());
    }
}

//! Key-value operations.

use rusqlite::{params, OptionalExtension, TransactionBehavior};

use super::{Database, DbResult};

/// Bearer token.
pub const KEY_TOKEN: &str = "token";
/// Cached user object (JSON).
pub const KEY_USER: &str = "user";
/// Session identity.
pub const KEY_USER_ID: &str = "user_id";
/// Local status overrides (JSON map).
pub const KEY_STATUS_OVERRIDES: &str = "doctor_status_updates";

impl Database {
    /// Get a value by key.
    pub fn get_value(&self, key: &str) -> DbResult<Option<String>> {
        self.conn
            .query_row("SELECT value FROM kv_store WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(Into::into)
    }

    /// Set a value, replacing any previous one.
    pub fn set_value(&self, key: &str, value: &str) -> DbResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?, ?, datetime('now'))",
            params![key, value],
        )?;
        Ok(())
    }

    /// Delete a value. Returns whether a row was removed.
    pub fn delete_value(&self, key: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM kv_store WHERE key = ?", [key])?;
        Ok(rows_affected > 0)
    }

    /// Write several keys in one transaction; `None` deletes the key.
    pub fn set_values(&mut self, entries: &[(&str, Option<&str>)]) -> DbResult<()> {
        let tx = self.conn.transaction()?;
        for (key, value) in entries {
            match value {
                Some(value) => {
                    tx.execute(
                        "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?, ?, datetime('now'))",
                        params![key, value],
                    )?;
                }
                None => {
                    tx.execute("DELETE FROM kv_store WHERE key = ?", [key])?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Atomically read, transform and write back a value.
    ///
    /// `f` receives the current value and returns the new one; `None`
    /// deletes the key. The whole cycle runs inside an `IMMEDIATE`
    /// transaction, so concurrent writers on other connections serialize.
    /// If `f` fails nothing is written.
    pub fn update_value<F>(&mut self, key: &str, f: F) -> DbResult<()>
    where
        F: FnOnce(Option<String>) -> DbResult<Option<String>>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current: Option<String> = tx
            .query_row("SELECT value FROM kv_store WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?;

        match f(current)? {
            Some(value) => {
                tx.execute(
                    "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?, ?, datetime('now'))",
                    params![key, value],
                )?;
            }
            None => {
                tx.execute("DELETE FROM kv_store WHERE key = ?", [key])?;
            }
        }

        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbError;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_set_get_delete() {
        let db = setup_db();

        assert_eq!(db.get_value(KEY_TOKEN).unwrap(), None);

        db.set_value(KEY_TOKEN, "abc").unwrap();
        assert_eq!(db.get_value(KEY_TOKEN).unwrap(), Some("abc".into()));

        db.set_value(KEY_TOKEN, "def").unwrap();
        assert_eq!(db.get_value(KEY_TOKEN).unwrap(), Some("def".into()));

        assert!(db.delete_value(KEY_TOKEN).unwrap());
        assert!(!db.delete_value(KEY_TOKEN).unwrap());
        assert_eq!(db.get_value(KEY_TOKEN).unwrap(), None);
    }

    #[test]
    fn test_set_values_writes_and_deletes_together() {
        let mut db = setup_db();
        db.set_value(KEY_USER, "{}").unwrap();

        db.set_values(&[(KEY_TOKEN, Some("t")), (KEY_USER_ID, Some("u")), (KEY_USER, None)])
            .unwrap();

        assert_eq!(db.get_value(KEY_TOKEN).unwrap(), Some("t".into()));
        assert_eq!(db.get_value(KEY_USER_ID).unwrap(), Some("u".into()));
        assert_eq!(db.get_value(KEY_USER).unwrap(), None);
    }

    #[test]
    fn test_update_value_sees_current_and_writes() {
        let mut db = setup_db();
        db.set_value("counter", "1").unwrap();

        db.update_value("counter", |current| {
            let n: i64 = current.as_deref().unwrap_or("0").parse().unwrap();
            Ok(Some((n + 1).to_string()))
        })
        .unwrap();

        assert_eq!(db.get_value("counter").unwrap(), Some("2".into()));
    }

    #[test]
    fn test_update_value_none_deletes() {
        let mut db = setup_db();
        db.set_value("gone", "x").unwrap();

        db.update_value("gone", |_| Ok(None)).unwrap();
        assert_eq!(db.get_value("gone").unwrap(), None);
    }

    #[test]
    fn test_update_value_failure_rolls_back() {
        let mut db = setup_db();
        db.set_value("kept", "original").unwrap();

        let result = db.update_value("kept", |_| {
            let bad: Result<serde_json::Value, _> = serde_json::from_str("{not json");
            bad.map_err(DbError::from)?;
            Ok(Some("changed".into()))
        });

        assert!(result.is_err());
        assert_eq!(db.get_value("kept").unwrap(), Some("original".into()));
    }
}

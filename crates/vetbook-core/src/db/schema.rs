//! SQLite schema definition.

/// Complete database schema for vetbook.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Key-value store
--
-- Well-known keys:
--   token                  bearer token (string)
--   user                   cached user object (JSON)
--   user_id                session identity (string)
--   doctor_status_updates  local status overrides (JSON object keyed by
--                          appointment id)
-- ============================================================================

CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

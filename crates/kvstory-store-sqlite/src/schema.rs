//! SQL schema for the kvstory SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per key. `value` holds the serialised JSON document verbatim.
CREATE TABLE IF NOT EXISTS entries (
    namespace   TEXT NOT NULL,
    key         TEXT NOT NULL,
    value       TEXT NOT NULL,
    updated_at  TEXT NOT NULL,   -- RFC 3339 UTC
    PRIMARY KEY (namespace, key)
);

PRAGMA user_version = 1;
";

//! SQL schema for the Gatehouse SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS users (
    id           TEXT PRIMARY KEY,
    email        TEXT NOT NULL UNIQUE,
    subject      TEXT NOT NULL UNIQUE,   -- provider-issued id
    name         TEXT,
    picture_url  TEXT,
    is_active    INTEGER NOT NULL DEFAULT 1,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL,
    last_login   TEXT,
    preferences  TEXT                    -- JSON or NULL
);

-- Activity logs are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS activity_logs (
    id           TEXT PRIMARY KEY,
    actor_email  TEXT NOT NULL,
    action       TEXT NOT NULL,
    page         TEXT,
    details      TEXT,                   -- JSON object or NULL
    timestamp    TEXT NOT NULL,          -- RFC 3339 UTC; store-assigned
    ip_address   TEXT,
    user_agent   TEXT
);

CREATE TABLE IF NOT EXISTS data_entries (
    id           TEXT PRIMARY KEY,
    title        TEXT NOT NULL,
    description  TEXT,
    value        REAL NOT NULL DEFAULT 0,
    category     TEXT,
    owner_email  TEXT NOT NULL,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS activity_actor_idx     ON activity_logs(actor_email);
CREATE INDEX IF NOT EXISTS activity_action_idx    ON activity_logs(action);
CREATE INDEX IF NOT EXISTS activity_timestamp_idx ON activity_logs(timestamp);
CREATE INDEX IF NOT EXISTS entries_owner_idx      ON data_entries(owner_email);

PRAGMA user_version = 1;
";

/// Drops every table created by [`SCHEMA`].
pub const DROP_ALL: &str = "
DROP TABLE IF EXISTS data_entries;
DROP TABLE IF EXISTS activity_logs;
DROP TABLE IF EXISTS users;
PRAGMA user_version = 0;
";

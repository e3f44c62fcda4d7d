//! SQL schema for the Gatehouse PostgreSQL store.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id           UUID PRIMARY KEY,
    email        TEXT NOT NULL UNIQUE,
    subject      TEXT NOT NULL UNIQUE,
    name         TEXT,
    picture_url  TEXT,
    is_active    BOOLEAN NOT NULL DEFAULT TRUE,
    created_at   TIMESTAMPTZ NOT NULL,
    updated_at   TIMESTAMPTZ NOT NULL,
    last_login   TIMESTAMPTZ,
    preferences  JSONB
);

-- Activity logs are strictly append-only. `seq` orders rows written within
-- the same microsecond.
CREATE TABLE IF NOT EXISTS activity_logs (
    id           UUID PRIMARY KEY,
    seq          BIGINT GENERATED ALWAYS AS IDENTITY,
    actor_email  TEXT NOT NULL,
    action       TEXT NOT NULL,
    page         TEXT,
    details      JSONB,
    timestamp    TIMESTAMPTZ NOT NULL,
    ip_address   TEXT,
    user_agent   TEXT
);

CREATE TABLE IF NOT EXISTS data_entries (
    id           UUID PRIMARY KEY,
    seq          BIGINT GENERATED ALWAYS AS IDENTITY,
    title        TEXT NOT NULL,
    description  TEXT,
    value        DOUBLE PRECISION NOT NULL DEFAULT 0,
    category     TEXT,
    owner_email  TEXT NOT NULL,
    created_at   TIMESTAMPTZ NOT NULL,
    updated_at   TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS activity_actor_idx     ON activity_logs(actor_email);
CREATE INDEX IF NOT EXISTS activity_action_idx    ON activity_logs(action);
CREATE INDEX IF NOT EXISTS activity_timestamp_idx ON activity_logs(timestamp);
CREATE INDEX IF NOT EXISTS entries_owner_idx      ON data_entries(owner_email);
";

pub const DROP_ALL: &str = "
DROP TABLE IF EXISTS data_entries;
DROP TABLE IF EXISTS activity_logs;
DROP TABLE IF EXISTS users;
";

//! SQL schema for the Roster SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! layout so a later change can be detected.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per (id, version). Rows are inserted and deleted, never edited,
-- except for the is_latest flag.
CREATE TABLE IF NOT EXISTS persons (
    record       INTEGER PRIMARY KEY AUTOINCREMENT,
    id           TEXT    NOT NULL,  -- identity shared by all versions
    first_name   TEXT    NOT NULL CHECK (length(first_name) <= 50),
    middle_name  TEXT             CHECK (length(middle_name) <= 50),
    last_name    TEXT    NOT NULL CHECK (length(last_name) <= 50),
    email        TEXT    NOT NULL CHECK (length(email) <= 50),
    age          INTEGER NOT NULL CHECK (age >= 0),
    version      INTEGER NOT NULL DEFAULT 1 CHECK (version >= 1),
    is_latest    INTEGER NOT NULL DEFAULT 1 CHECK (is_latest IN (0, 1)),
    created_date TEXT    NOT NULL,  -- ISO 8601 UTC; server-assigned
    CONSTRAINT id_version_uc UNIQUE (id, version)
);

-- At most one latest row per identity.
CREATE UNIQUE INDEX IF NOT EXISTS persons_latest_idx
    ON persons(id) WHERE is_latest = 1;

PRAGMA user_version = 1;
";

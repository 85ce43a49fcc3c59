//! SQL schema for the Tally SQLite store.
//!
//! Executed once at connection startup. The version is stamped into
//! `PRAGMA user_version`; there is no migration tooling.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Catalogs share one shape so that a CatalogKind maps to a table name only.
CREATE TABLE IF NOT EXISTS plants (
    id    INTEGER PRIMARY KEY AUTOINCREMENT,
    name  TEXT NOT NULL UNIQUE      -- normalised: trimmed, upper-case
);

CREATE TABLE IF NOT EXISTS incident_types (
    id    INTEGER PRIMARY KEY AUTOINCREMENT,
    name  TEXT NOT NULL UNIQUE
);

-- Incidents are append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS incidents (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    occurred_on  TEXT NOT NULL,     -- YYYY-MM-DD
    plant_id     INTEGER NOT NULL REFERENCES plants(id) ON DELETE RESTRICT,
    type_id      INTEGER NOT NULL REFERENCES incident_types(id) ON DELETE RESTRICT,
    description  TEXT NOT NULL,
    reporter     TEXT,
    created_at   TEXT NOT NULL      -- RFC 3339 UTC; server-assigned
);

CREATE INDEX IF NOT EXISTS incidents_date_idx  ON incidents(occurred_on);
CREATE INDEX IF NOT EXISTS incidents_plant_idx ON incidents(plant_id);
CREATE INDEX IF NOT EXISTS incidents_type_idx  ON incidents(type_id);

PRAGMA user_version = 1;
";

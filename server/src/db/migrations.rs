use rusqlite_migration::{Migrations, M};

/// Define all schema migrations.
/// Uses SQLite user_version pragma for tracking — no migration table needed.
pub fn migrations() -> Migrations<'static> {
    Migrations::new(vec![M::up(
        "-- Migration 1: processed agent data

CREATE TABLE processed_agent_data (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    road_state TEXT NOT NULL,
    user_id INTEGER NOT NULL,
    x REAL NOT NULL,
    y REAL NOT NULL,
    z REAL NOT NULL,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    timestamp TEXT NOT NULL
);

CREATE INDEX idx_processed_agent_data_user ON processed_agent_data(user_id);
",
    )])
}

//! Database row types.
//! These correspond 1:1 to the SQLite schema defined in migrations.rs.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the processed_agent_data table.
///
/// Also the body of the read endpoints, so the JSON field names are the
/// column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedAgentDataRow {
    pub id: i64,
    pub road_state: String,
    pub user_id: i64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(with = "crate::agent_data::timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// Column list shared by every SELECT so `from_row` indexes stay in sync.
pub const PROCESSED_AGENT_DATA_COLUMNS: &str =
    "id, road_state, user_id, x, y, z, latitude, longitude, timestamp";

impl ProcessedAgentDataRow {
    /// Build a row from a SELECT over [`PROCESSED_AGENT_DATA_COLUMNS`].
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        let raw_timestamp: String = row.get(8)?;
        let timestamp = crate::agent_data::timestamp::parse(&raw_timestamp).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                8,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })?;

        Ok(Self {
            id: row.get(0)?,
            road_state: row.get(1)?,
            user_id: row.get(2)?,
            x: row.get(3)?,
            y: row.get(4)?,
            z: row.get(5)?,
            latitude: row.get(6)?,
            longitude: row.get(7)?,
            timestamp,
        })
    }
}

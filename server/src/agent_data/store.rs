//! Synchronous SQLite access for processed agent data.
//!
//! Every function takes a borrowed connection so callers decide the locking
//! and threading (handlers run these inside `spawn_blocking`).

use rusqlite::{params, Connection, OptionalExtension};

use super::model::ProcessedAgentData;
use super::timestamp;
use crate::db::models::{ProcessedAgentDataRow, PROCESSED_AGENT_DATA_COLUMNS};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("processed agent data {0} not found")]
    NotFound(i64),

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Insert a whole batch in one transaction and return the stored rows in input order.
///
/// Nothing is visible to readers until the commit succeeds; any failure rolls
/// the whole batch back.
pub fn insert_batch(
    conn: &mut Connection,
    batch: &[ProcessedAgentData],
) -> Result<Vec<ProcessedAgentDataRow>, StoreError> {
    let tx = conn.transaction()?;
    let mut rows = Vec::with_capacity(batch.len());

    {
        let mut stmt = tx.prepare(
            "INSERT INTO processed_agent_data
                (road_state, user_id, x, y, z, latitude, longitude, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;

        for item in batch {
            let agent = &item.agent_data;
            let id = stmt.insert(params![
                item.road_state,
                agent.user_id,
                agent.accelerometer.x,
                agent.accelerometer.y,
                agent.accelerometer.z,
                agent.gps.latitude,
                agent.gps.longitude,
                timestamp::format(&agent.timestamp),
            ])?;
            rows.push(to_row(id, item));
        }
    }

    tx.commit()?;
    Ok(rows)
}

pub fn get(conn: &Connection, id: i64) -> Result<ProcessedAgentDataRow, StoreError> {
    conn.query_row(
        &format!("SELECT {PROCESSED_AGENT_DATA_COLUMNS} FROM processed_agent_data WHERE id = ?1"),
        params![id],
        ProcessedAgentDataRow::from_row,
    )
    .optional()?
    .ok_or(StoreError::NotFound(id))
}

pub fn list(conn: &Connection) -> Result<Vec<ProcessedAgentDataRow>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PROCESSED_AGENT_DATA_COLUMNS} FROM processed_agent_data ORDER BY id ASC"
    ))?;
    let rows = stmt
        .query_map([], ProcessedAgentDataRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Overwrite every column of `id`, then read it back.
pub fn update(
    conn: &Connection,
    id: i64,
    data: &ProcessedAgentData,
) -> Result<ProcessedAgentDataRow, StoreError> {
    let agent = &data.agent_data;
    conn.execute(
        "UPDATE processed_agent_data
         SET road_state = ?1, user_id = ?2, x = ?3, y = ?4, z = ?5,
             latitude = ?6, longitude = ?7, timestamp = ?8
         WHERE id = ?9",
        params![
            data.road_state,
            agent.user_id,
            agent.accelerometer.x,
            agent.accelerometer.y,
            agent.accelerometer.z,
            agent.gps.latitude,
            agent.gps.longitude,
            timestamp::format(&agent.timestamp),
            id,
        ],
    )?;
    get(conn, id)
}

pub fn delete(conn: &Connection, id: i64) -> Result<(), StoreError> {
    let removed = conn.execute(
        "DELETE FROM processed_agent_data WHERE id = ?1",
        params![id],
    )?;
    if removed == 0 {
        return Err(StoreError::NotFound(id));
    }
    Ok(())
}

fn to_row(id: i64, item: &ProcessedAgentData) -> ProcessedAgentDataRow {
    let agent = &item.agent_data;
    ProcessedAgentDataRow {
        id,
        road_state: item.road_state.clone(),
        user_id: agent.user_id,
        x: agent.accelerometer.x,
        y: agent.accelerometer.y,
        z: agent.accelerometer.z,
        latitude: agent.gps.latitude,
        longitude: agent.gps.longitude,
        timestamp: agent.timestamp,
    }
}

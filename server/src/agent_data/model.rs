use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::models::ProcessedAgentDataRow;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccelerometerData {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsData {
    pub latitude: f64,
    pub longitude: f64,
}

/// Raw sample from one agent: who sent it, what the sensors read, and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentData {
    pub user_id: i64,
    pub accelerometer: AccelerometerData,
    pub gps: GpsData,
    #[serde(with = "super::timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// Request body for ingest and update: a classified sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedAgentData {
    pub road_state: String,
    pub agent_data: AgentData,
}

/// Message pushed to live subscribers after a record is committed.
///
/// Same nesting as the ingest body, plus the identifier the store assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedAgentDataEvent {
    pub id: i64,
    pub road_state: String,
    pub agent_data: AgentData,
}

impl From<&ProcessedAgentDataRow> for ProcessedAgentDataEvent {
    fn from(row: &ProcessedAgentDataRow) -> Self {
        Self {
            id: row.id,
            road_state: row.road_state.clone(),
            agent_data: AgentData {
                user_id: row.user_id,
                accelerometer: AccelerometerData {
                    x: row.x,
                    y: row.y,
                    z: row.z,
                },
                gps: GpsData {
                    latitude: row.latitude,
                    longitude: row.longitude,
                },
                timestamp: row.timestamp,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub status: String,
    pub ids: Vec<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeletedResponse {
    pub status: String,
}

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use rusqlite::Connection;
use serde::de::DeserializeOwned;

use super::model::{CreatedResponse, DeletedResponse, ProcessedAgentData, ProcessedAgentDataEvent};
use super::store::{self, StoreError};
use crate::db::models::ProcessedAgentDataRow;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::state::AppState;
use crate::ws::broadcast;

/// Run a store operation on the blocking pool with the connection locked.
async fn with_db<T, F>(db: &DbPool, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
{
    let db = db.clone();
    tokio::task::spawn_blocking(move || {
        let mut conn = db.lock().map_err(|_| StoreError::LockPoisoned)?;
        op(&mut *conn)
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Database task failed");
        ApiError::Internal("Storage failure".to_string())
    })?
    .map_err(ApiError::from)
}

/// Decode a JSON body regardless of its Content-Type.
///
/// The hub posts pre-serialized JSON without a content type, so the header is
/// not required. Body-level rejections (size limit) are left to the `Bytes`
/// extractor and keep their own status.
fn decode_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::Validation(format!("Failed to deserialize the JSON body: {e}")))
}

/// POST /processed_agent_data/ — Store a batch, then push each record to its user's live subscribers.
pub async fn create_processed_agent_data(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CreatedResponse>, ApiError> {
    let batch: Vec<ProcessedAgentData> = decode_body(&body)?;
    let batch_len = batch.len();

    let rows = with_db(&state.db, move |conn| store::insert_batch(conn, &batch)).await?;

    // Committed; from here on nothing can fail the request
    let delivered: usize = rows
        .iter()
        .map(|row| {
            let event = ProcessedAgentDataEvent::from(row);
            broadcast::dispatch(&state.subscriptions, row.user_id, &event)
        })
        .sum();

    tracing::info!(records = batch_len, "Processed agent data batch stored");
    tracing::debug!(records = batch_len, delivered, "Batch pushed to live subscribers");

    Ok(Json(CreatedResponse {
        status: "success".to_string(),
        ids: rows.iter().map(|row| row.id).collect(),
    }))
}

/// GET /processed_agent_data/{id}
pub async fn read_processed_agent_data(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProcessedAgentDataRow>, ApiError> {
    let row = with_db(&state.db, move |conn| store::get(conn, id)).await?;
    Ok(Json(row))
}

/// GET /processed_agent_data/
pub async fn list_processed_agent_data(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProcessedAgentDataRow>>, ApiError> {
    let rows = with_db(&state.db, |conn| store::list(conn)).await?;
    Ok(Json(rows))
}

/// PUT /processed_agent_data/{id} — Overwrite a stored record. Subscribers are not notified.
pub async fn update_processed_agent_data(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<Json<ProcessedAgentDataRow>, ApiError> {
    let data: ProcessedAgentData = decode_body(&body)?;
    let row = with_db(&state.db, move |conn| store::update(conn, id, &data)).await?;
    tracing::info!(id, "Processed agent data updated");
    Ok(Json(row))
}

/// DELETE /processed_agent_data/{id}
pub async fn delete_processed_agent_data(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeletedResponse>, ApiError> {
    with_db(&state.db, move |conn| store::delete(conn, id)).await?;
    tracing::info!(id, "Processed agent data deleted");
    Ok(Json(DeletedResponse {
        status: "deleted".to_string(),
    }))
}

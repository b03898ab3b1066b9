use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use super::hazards::GeoPoint;
use super::LiveError;
use crate::agent_data::model::ProcessedAgentDataEvent;

/// What the client keeps from each push.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleUpdate {
    pub id: i64,
    pub road_state: String,
    pub position: GeoPoint,
    pub timestamp: DateTime<Utc>,
}

/// Live feed URL for `user_id` on a server given as `ws://host:port`.
pub fn live_url(server: &str, user_id: i64) -> String {
    format!("{}/ws/{}", server.trim_end_matches('/'), user_id)
}

/// Decode one push message.
///
/// Older servers sent the record as a JSON-encoded string; both forms are accepted.
pub fn parse_push(text: &str) -> Result<VehicleUpdate, LiveError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    let value = match value {
        serde_json::Value::String(inner) => serde_json::from_str(&inner)?,
        other => other,
    };
    let event: ProcessedAgentDataEvent = serde_json::from_value(value)?;
    let gps = event.agent_data.gps;

    Ok(VehicleUpdate {
        id: event.id,
        road_state: event.road_state,
        position: GeoPoint::new(gps.latitude, gps.longitude),
        timestamp: event.agent_data.timestamp,
    })
}

/// Follow a live feed, forwarding decoded updates to `updates`.
///
/// Returns `Ok` when the server closes the feed or the receiver is dropped.
/// Pushes that do not decode are logged and skipped.
pub async fn subscribe(url: &str, updates: mpsc::Sender<VehicleUpdate>) -> Result<(), LiveError> {
    let (mut stream, _) = tokio_tungstenite::connect_async(url).await?;
    tracing::info!(url, "Connected to live feed");

    while let Some(frame) = stream.next().await {
        match frame? {
            Message::Text(text) => match parse_push(text.as_str()) {
                Ok(update) => {
                    if updates.send(update).await.is_err() {
                        tracing::debug!("Update receiver dropped, leaving live feed");
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping live message");
                }
            },
            Message::Close(frame) => {
                tracing::info!(reason = ?frame, "Live feed closed by server");
                break;
            }
            _ => {}
        }
    }

    Ok(())
}

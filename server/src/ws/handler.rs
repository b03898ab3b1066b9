use axum::{
    extract::{ws::WebSocketUpgrade, Path, State},
    response::Response,
};

use crate::state::AppState;
use crate::ws::actor;

/// GET /ws/{user_id}
/// Live feed of records ingested for one user. A non-integer user id is
/// rejected by the path extractor before the upgrade happens.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    ws: WebSocketUpgrade,
) -> Response {
    tracing::info!(user_id, "Live subscription requested");
    ws.on_upgrade(move |socket| actor::run_connection(socket, state, user_id))
}

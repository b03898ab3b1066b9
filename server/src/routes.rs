use axum::{routing::get, Router};

use crate::agent_data::crud;
use crate::state::AppState;
use crate::ws::handler as ws_handler;

/// Build the full axum Router.
pub fn build_router(state: AppState) -> Router {
    // Agents post to the collection with a trailing slash; accept both forms
    let agent_data_routes = Router::new()
        .route(
            "/processed_agent_data/",
            get(crud::list_processed_agent_data).post(crud::create_processed_agent_data),
        )
        .route(
            "/processed_agent_data",
            get(crud::list_processed_agent_data).post(crud::create_processed_agent_data),
        )
        .route(
            "/processed_agent_data/{id}",
            get(crud::read_processed_agent_data)
                .put(crud::update_processed_agent_data)
                .delete(crud::delete_processed_agent_data),
        );

    let ws_routes = Router::new().route("/ws/{user_id}", get(ws_handler::ws_upgrade));

    let health = Router::new().route("/health", get(health_check));

    Router::new()
        .merge(agent_data_routes)
        .merge(ws_routes)
        .merge(health)
        .with_state(state)
}

/// Basic health check endpoint
async fn health_check() -> &'static str {
    "ok"
}

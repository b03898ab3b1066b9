use crate::config::LiveConfig;
use crate::db::DbPool;
use crate::ws::SubscriptionRegistry;

/// Shared application state passed to all handlers via axum State extractor.
#[derive(Clone)]
pub struct AppState {
    /// SQLite connection wrapped in Arc<Mutex>
    pub db: DbPool,
    /// Live WebSocket connections per user id
    pub subscriptions: SubscriptionRegistry,
    /// Keepalive settings for live connections
    pub live: LiveConfig,
}

impl AppState {
    pub fn new(db: DbPool, live: LiveConfig) -> Self {
        Self {
            db,
            subscriptions: SubscriptionRegistry::new(),
            live,
        }
    }
}

//! Processed agent data: the road-state records produced by the hub.
//!
//! `model` holds the wire shapes, `store` the synchronous SQLite access,
//! and `crud` the axum handlers that tie the store to live fan-out.

pub mod crud;
pub mod model;
pub mod store;
pub mod timestamp;

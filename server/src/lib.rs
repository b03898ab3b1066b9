//! Roadwatch telemetry store library.
//! Exposes the server modules for integration testing and the live client
//! used by the `roadwatch-live` binary.

pub mod agent_data;
pub mod config;
pub mod db;
pub mod error;
pub mod live;
pub mod logging;
pub mod routes;
pub mod state;
pub mod ws;

//! Headless live client: follows one user's feed and relates each vehicle
//! position to the known road hazards.

pub mod client;
pub mod hazards;

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum LiveError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: {reason}")]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("undecodable push: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("websocket: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),
}

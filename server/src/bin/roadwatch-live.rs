//! Follow one user's live feed and log each position against known hazards.

use clap::Parser;
use std::path::PathBuf;
use tokio::sync::mpsc;

use roadwatch_server::live::client::{self, live_url};
use roadwatch_server::live::hazards::HazardMap;
use roadwatch_server::logging;

/// Roadwatch live feed follower
#[derive(Parser, Debug)]
#[command(name = "roadwatch-live", version, about = "Follow a Roadwatch live feed")]
struct Args {
    /// Server base URL
    #[arg(long, env = "ROADWATCH_LIVE_SERVER", default_value = "ws://localhost:8000")]
    server: String,

    /// User whose vehicle to follow
    #[arg(long, env = "ROADWATCH_LIVE_USER_ID", default_value = "1")]
    user_id: i64,

    /// Pothole coordinates, one `latitude,longitude` per line
    #[arg(long)]
    potholes: Option<PathBuf>,

    /// Speed bump coordinates, one `latitude,longitude` per line
    #[arg(long)]
    speed_bumps: Option<PathBuf>,

    /// Enable structured JSON logging
    #[arg(long, env = "ROADWATCH_JSON_LOGS")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logging::init_tracing(args.json_logs, "roadwatch_live=info,roadwatch_server=info");

    let hazards = HazardMap::load(args.potholes.as_deref(), args.speed_bumps.as_deref())?;
    tracing::info!(
        potholes = hazards.potholes.len(),
        speed_bumps = hazards.speed_bumps.len(),
        "Hazards loaded"
    );

    let url = live_url(&args.server, args.user_id);
    let (tx, mut rx) = mpsc::channel(64);
    let feed = tokio::spawn(async move { client::subscribe(&url, tx).await });

    while let Some(update) = rx.recv().await {
        match hazards.nearest(&update.position) {
            Some(hazard) => tracing::info!(
                id = update.id,
                road_state = %update.road_state,
                latitude = update.position.latitude,
                longitude = update.position.longitude,
                nearest = %hazard.kind,
                distance_m = hazard.distance_m.round(),
                "Vehicle position"
            ),
            None => tracing::info!(
                id = update.id,
                road_state = %update.road_state,
                latitude = update.position.latitude,
                longitude = update.position.longitude,
                "Vehicle position"
            ),
        }
    }

    feed.await??;
    Ok(())
}

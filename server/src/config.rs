use clap::Parser;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Roadwatch telemetry store
///
/// Only flags that were actually given are merged, so unset flags never
/// shadow the TOML file.
#[derive(Parser, Serialize, Clone, Debug, Default)]
#[command(name = "roadwatch-server", version, about = "Road telemetry store with live fan-out")]
pub struct Cli {
    /// Port to listen on [default: 8000]
    #[arg(long, env = "ROADWATCH_PORT")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Bind address [default: 0.0.0.0]
    #[arg(long, env = "ROADWATCH_BIND_ADDRESS")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_address: Option<String>,

    /// Path to TOML config file
    #[arg(long, env = "ROADWATCH_CONFIG", default_value = "./roadwatch.toml")]
    #[serde(skip)]
    pub config: String,

    /// Enable structured JSON logging (for Docker/production)
    #[arg(long, env = "ROADWATCH_JSON_LOGS")]
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub json_logs: bool,

    /// Output a commented TOML config template and exit
    #[arg(long)]
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub generate_config: bool,

    /// Data directory for the SQLite database [default: ./data]
    #[arg(long, env = "ROADWATCH_DATA_DIR")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
}

/// Effective server configuration after all layers are merged.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub bind_address: String,
    pub json_logs: bool,
    pub generate_config: bool,
    pub data_dir: String,

    /// Live connection keepalive ([live] section in TOML)
    #[serde(default)]
    pub live: LiveConfig,
}

/// Keepalive settings for live WebSocket subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveConfig {
    /// Seconds between server pings (default: 30)
    #[serde(default = "default_ping_interval")]
    pub ping_interval_secs: u64,

    /// Seconds to wait for a pong before closing (default: 10)
    #[serde(default = "default_pong_timeout")]
    pub pong_timeout_secs: u64,
}

impl LiveConfig {
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs.max(1))
    }

    pub fn pong_timeout(&self) -> Duration {
        Duration::from_secs(self.pong_timeout_secs.max(1))
    }
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            ping_interval_secs: default_ping_interval(),
            pong_timeout_secs: default_pong_timeout(),
        }
    }
}

fn default_ping_interval() -> u64 {
    30
}

fn default_pong_timeout() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            bind_address: "0.0.0.0".to_string(),
            json_logs: false,
            generate_config: false,
            data_dir: "./data".to_string(),
            live: LiveConfig::default(),
        }
    }
}

impl Config {
    /// Load config with layered precedence:
    /// built-in defaults < TOML file < env vars (ROADWATCH_*) < CLI args
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment(Cli::parse()).extract()
    }

    fn figment(cli: Cli) -> Figment {
        let config_path = cli.config.clone();

        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_path))
            .merge(Env::prefixed("ROADWATCH_").split("__"))
            .merge(Serialized::defaults(cli))
    }
}

/// Generate a commented TOML config template
pub fn generate_config_template() -> String {
    r#"# Roadwatch Server Configuration
# Place this file at ./roadwatch.toml or specify with --config <path>
# All settings can be overridden via environment variables (ROADWATCH_PORT, etc.)
# or CLI flags (--port, etc.)

# Server port (default: 8000)
# port = 8000

# Bind address (default: 0.0.0.0 — all interfaces)
# bind_address = "0.0.0.0"

# Enable structured JSON logging for Docker/production
# json_logs = false

# Data directory for the SQLite database
# data_dir = "./data"

# ---- Live subscriptions (/ws/{user_id}) ----
# [live]

# Seconds between server pings (default: 30)
# ping_interval_secs = 30

# Seconds to wait for a pong before the connection is dropped (default: 10)
# pong_timeout_secs = 10
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_survive_an_absent_file() {
        let cli = Cli {
            config: "/nonexistent/roadwatch.toml".to_string(),
            ..Cli::default()
        };
        let config: Config = Config::figment(cli).extract().unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.live.ping_interval_secs, 30);
        assert_eq!(config.live.pong_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn template_is_valid_toml_once_uncommented() {
        let uncommented: String = generate_config_template()
            .lines()
            .filter_map(|line| line.strip_prefix("# "))
            .filter(|line| line.starts_with('[') || line.contains(" = "))
            .collect::<Vec<_>>()
            .join("\n");

        let parsed: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string(&uncommented))
            .extract()
            .unwrap();
        assert_eq!(parsed.port, 8000);
        assert_eq!(parsed.live.pong_timeout_secs, 10);
    }

    #[test]
    fn toml_file_applies_when_flags_are_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roadwatch.toml");
        std::fs::write(&path, "port = 9100\n[live]\nping_interval_secs = 5\n").unwrap();

        let cli = Cli {
            config: path.to_str().unwrap().to_string(),
            ..Cli::default()
        };
        let config: Config = Config::figment(cli).extract().unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.live.ping_interval_secs, 5);
        assert_eq!(config.live.pong_timeout_secs, 10);

        let cli = Cli {
            config: path.to_str().unwrap().to_string(),
            port: Some(9200),
            ..Cli::default()
        };
        let config: Config = Config::figment(cli).extract().unwrap();
        assert_eq!(config.port, 9200);
    }

    #[test]
    fn zero_durations_are_clamped() {
        let live = LiveConfig {
            ping_interval_secs: 0,
            pong_timeout_secs: 0,
        };
        assert_eq!(live.ping_interval(), Duration::from_secs(1));
        assert_eq!(live.pong_timeout(), Duration::from_secs(1));
    }
}

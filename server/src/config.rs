use crate::error::ServerError;
use crate::state::{PopulateRequest, WorldMode};
use explorer_shared::config::WorldConfig;
use std::time::Duration;

/// Environment variable naming an optional JSON config file
pub const CONFIG_PATH_ENV: &str = "EXPLORER_CONFIG";
pub const LISTEN_ADDR_ENV: &str = "EXPLORER_LISTEN_ADDR";
pub const IDLE_TIMEOUT_ENV: &str = "EXPLORER_IDLE_TIMEOUT_SECS";

/// Server configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Particle simulation rate
    pub tick_rate_hz: u32,
    /// Per-explorer STATE broadcast rate
    pub broadcast_rate_hz: u32,
    pub rng_seed: u64,
    /// Live sessions beyond this are refused at accept time
    pub max_connections: usize,
    /// Close control connections that stay silent this long. None keeps them forever.
    pub idle_timeout_secs: Option<u64>,
    pub mode: WorldMode,
    pub world: WorldConfig,
    /// Particles added when the world loop starts
    pub initial_population: Vec<PopulateRequest>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:12345".to_string(),
            tick_rate_hz: 60,
            broadcast_rate_hz: 60,
            rng_seed: 42,
            max_connections: 256,
            idle_timeout_secs: None,
            mode: WorldMode::Populating,
            world: WorldConfig::default(),
            initial_population: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Defaults, replaced by the JSON file in `EXPLORER_CONFIG` if set, then
    /// individual environment overrides.
    pub fn load() -> Result<Self, ServerError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };

        if let Ok(addr) = std::env::var(LISTEN_ADDR_ENV) {
            config.listen_addr = addr;
        }
        if let Ok(secs) = std::env::var(IDLE_TIMEOUT_ENV) {
            let secs = secs.trim().parse::<u64>().map_err(|_| {
                ServerError::Config(format!(
                    "{} must be a whole number of seconds",
                    IDLE_TIMEOUT_ENV
                ))
            })?;
            config.idle_timeout_secs = Some(secs);
        }

        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, ServerError> {
        let text = std::fs::read_to_string(path).map_err(|source| ServerError::ConfigFile {
            path: path.to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ServerError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.listen_addr.is_empty() {
            return Err("listen_addr must not be empty".to_string());
        }
        if self.tick_rate_hz == 0 {
            return Err("tick_rate_hz must be > 0".to_string());
        }
        if self.broadcast_rate_hz == 0 {
            return Err("broadcast_rate_hz must be > 0".to_string());
        }
        if self.max_connections == 0 {
            return Err("max_connections must be > 0".to_string());
        }
        if self.idle_timeout_secs == Some(0) {
            return Err("idle_timeout_secs must be > 0 when set".to_string());
        }
        self.world.validate()
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate_hz as f64)
    }

    pub fn broadcast_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.broadcast_rate_hz as f64)
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_secs.map(Duration::from_secs)
    }
}

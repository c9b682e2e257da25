use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub use firmware_store::config::{StatsConfig, StorageConfig};

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    /// Allowed origins. Empty means any origin.
    #[serde(default)]
    pub allow_origins: Vec<String>,
    #[serde(default = "default_cors_max_age")]
    pub max_age: u64,
}

fn default_cors_max_age() -> u64 {
    3600
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origins: Vec::new(),
            max_age: default_cors_max_age(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Externally reachable base URL, e.g. `http://192.168.1.20:3000`.
    /// Falls back to `http://{host}:{port}`.
    #[serde(default)]
    pub public_url: Option<String>,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub stats: StatsConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("OTA_CONFIG").unwrap_or_else(|_| "config/config".to_string());

        let s = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .add_source(File::with_name(&config_path).required(false))
            // Override from environment (e.g., OTA__STORAGE__MAX_ARTIFACT_SIZE)
            .add_source(Environment::with_prefix("OTA").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Base URL devices and operators should use to reach this server.
    pub fn base_url(&self) -> String {
        match &self.server.public_url {
            Some(url) if !url.trim().is_empty() => url.trim().trim_end_matches('/').to_string(),
            _ => {
                let host = match self.server.host.as_str() {
                    "0.0.0.0" | "::" => "localhost",
                    other => other,
                };
                format!("http://{}:{}", host, self.server.port)
            }
        }
    }

    /// URL devices poll for OTA updates.
    pub fn firmware_url(&self) -> String {
        format!("{}/api/firmware/latest.bin", self.base_url())
    }
}

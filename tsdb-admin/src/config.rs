use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Configuration for the admin service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Address to bind the HTTP server to
    pub bind_address: String,

    /// Storage engine configuration
    pub storage: StorageConfig,

    /// Administration switch
    pub admin: AdminSwitchConfig,

    /// Remote-write ingestion settings
    pub ingestion: IngestionConfig,

    /// Metrics and monitoring configuration
    pub metrics: MetricsConfig,

    /// Health check configuration
    pub health: HealthConfig,
}

/// Storage engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Engine data directory; snapshots are written below it
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminSwitchConfig {
    /// Serve snapshot, tombstone cleanup, deletion and remote write.
    /// When false every one of them answers "Admin APIs are disabled".
    pub enable_admin: bool,
}

/// Ingestion-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Number of series between checkpoint commits
    pub commit_chunk_size: usize,

    /// Maximum body size in bytes for the unary admin requests.
    /// The remote-write stream is not capped.
    pub max_request_size: usize,
}

/// Metrics and monitoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Metrics endpoint path
    pub metrics_path: String,
}

/// Health check configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Health check endpoint path
    pub health_path: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:9090".to_string(),
            storage: StorageConfig::default(),
            admin: AdminSwitchConfig::default(),
            ingestion: IngestionConfig::default(),
            metrics: MetricsConfig::default(),
            health: HealthConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
        }
    }
}

impl Default for AdminSwitchConfig {
    fn default() -> Self {
        Self {
            enable_admin: false,
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            commit_chunk_size: 500,
            max_request_size: 100 * 1024 * 1024, // 100MB
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            metrics_path: "/metrics".to_string(),
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            health_path: "/health".to_string(),
        }
    }
}

impl AdminConfig {
    /// Load configuration from file, environment variables, and defaults
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            config = Self::load_from_file(&config_path)?;
        } else if std::path::Path::new("config/development.yaml").exists() {
            config = Self::load_from_file("config/development.yaml")?;
        } else if std::path::Path::new("config/production.yaml").exists() {
            config = Self::load_from_file("config/production.yaml")?;
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn load_from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Self = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(bind_addr) = env::var("TSDB_ADMIN_BIND_ADDRESS") {
            self.bind_address = bind_addr;
        }

        if let Ok(data_dir) = env::var("TSDB_ADMIN_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(enable_admin) = env::var("TSDB_ADMIN_ENABLE_ADMIN") {
            self.admin.enable_admin = enable_admin
                .parse()
                .with_context(|| format!("Invalid TSDB_ADMIN_ENABLE_ADMIN: {}", enable_admin))?;
        }

        if let Ok(chunk) = env::var("TSDB_ADMIN_COMMIT_CHUNK_SIZE") {
            self.ingestion.commit_chunk_size = chunk
                .parse()
                .with_context(|| format!("Invalid TSDB_ADMIN_COMMIT_CHUNK_SIZE: {}", chunk))?;
        }

        if let Ok(max_request_size) = env::var("TSDB_ADMIN_MAX_REQUEST_SIZE") {
            self.ingestion.max_request_size = max_request_size.parse()?;
        }

        if let Ok(metrics_path) = env::var("TSDB_ADMIN_METRICS_PATH") {
            self.metrics.metrics_path = metrics_path;
        }

        if let Ok(health_path) = env::var("TSDB_ADMIN_HEALTH_PATH") {
            self.health.health_path = health_path;
        }

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.bind_address.is_empty() {
            return Err(anyhow::anyhow!("Bind address cannot be empty"));
        }

        if self.storage.data_dir.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("Storage data directory cannot be empty"));
        }

        if self.ingestion.commit_chunk_size == 0 {
            return Err(anyhow::anyhow!("Commit chunk size must be greater than 0"));
        }

        if self.ingestion.max_request_size == 0 {
            return Err(anyhow::anyhow!("Max request size must be greater than 0"));
        }

        if !self.metrics.metrics_path.starts_with('/') || !self.health.health_path.starts_with('/') {
            return Err(anyhow::anyhow!("Endpoint paths must start with '/'"));
        }

        Ok(())
    }
}

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::RetryPolicy;

/// Well-known engine socket
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/handmouse.sock";

/// Global handmouse configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Control client configuration
    pub client: ClientConfig,

    /// Live dashboard configuration
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Engine socket path (default: /tmp/handmouse.sock)
    pub socket_path: Option<PathBuf>,

    /// Connection attempts before giving up
    pub connect_attempts: u32,

    /// Delay between connection attempts (milliseconds)
    pub retry_interval_ms: u64,

    /// Read/write timeout for one exchange (milliseconds, 0 = none)
    pub io_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Poll cadence (milliseconds)
    pub tick_ms: u64,

    /// Connection attempts per poll
    pub poll_attempts: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            socket_path: None,
            connect_attempts: 10,
            retry_interval_ms: 500,
            io_timeout_ms: 5_000,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            tick_ms: 100,
            poll_attempts: 1,
        }
    }
}

impl Config {
    /// Load config from default locations (in order of precedence):
    /// 1. $PWD/.handmouse.toml
    /// 2. $XDG_CONFIG_HOME/handmouse/config.toml
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(content) = std::fs::read_to_string(".handmouse.toml") {
            match toml::from_str(&content) {
                Ok(config) => return config,
                Err(e) => tracing::warn!("Ignoring .handmouse.toml: {}", e),
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("handmouse").join("config.toml");
            if let Ok(content) = std::fs::read_to_string(&config_path) {
                match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => tracing::warn!("Ignoring {}: {}", config_path.display(), e),
                }
            }
        }

        Self::default()
    }

    /// Load config from a specific file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Get the socket path, using default if not specified
    pub fn socket_path(&self) -> PathBuf {
        self.client
            .socket_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SOCKET_PATH))
    }

    /// Retry policy for one-shot commands
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.client.connect_attempts,
            Duration::from_millis(self.client.retry_interval_ms),
        )
    }

    /// Retry policy for dashboard polls; the tick itself is the retry
    pub fn poll_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.dashboard.poll_attempts,
            Duration::from_millis(self.client.retry_interval_ms),
        )
    }

    pub fn io_timeout(&self) -> Option<Duration> {
        match self.client.io_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.dashboard.tick_ms.max(1))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.socket_path(), PathBuf::from("/tmp/handmouse.sock"));

        let policy = config.retry_policy();
        assert_eq!(policy.attempts(), 10);
        assert_eq!(policy.interval(), Duration::from_millis(500));
        assert_eq!(policy.budget(), Duration::from_secs(5));

        assert_eq!(config.poll_policy().attempts(), 1);
        assert_eq!(config.tick_interval(), Duration::from_millis(100));
        assert_eq!(config.io_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_load_from_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[client]\nsocket_path = \"/run/hm.sock\"\nio_timeout_ms = 0\n\n[dashboard]\ntick_ms = 250\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.socket_path(), PathBuf::from("/run/hm.sock"));
        assert_eq!(config.io_timeout(), None);
        assert_eq!(config.tick_interval(), Duration::from_millis(250));
        // untouched keys keep their defaults
        assert_eq!(config.client.connect_attempts, 10);
        assert_eq!(config.dashboard.poll_attempts, 1);
    }

    #[test]
    fn test_load_from_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[client\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse(_))));
        assert!(matches!(
            Config::load_from(&dir.path().join("missing.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}

//! Configuration loading and parsing

use anyhow::{Context, Result};
use can_debug_decoder::ReportConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub render: ReportConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// TOML layout file with message descriptors
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CaptureConfig {
    /// candump log to read frames from
    pub path: Option<PathBuf>,
    /// Stop after this many frames
    pub max_frames: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use can_debug_decoder::{FailurePolicy, RuleWidth};

    #[test]
    fn test_config_deserialization() {
        let toml_content = r#"
            [catalog]
            path = "layout.toml"

            [capture]
            path = "trace.log"
            max_frames = 50

            [render]
            rule_width = "widest_header"
            failure_policy = "skip"

            [server]
            listen = "0.0.0.0:9000"
        "#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.catalog.path, Some(PathBuf::from("layout.toml")));
        assert_eq!(config.capture.max_frames, Some(50));
        assert_eq!(config.render.render.rule_width, RuleWidth::WidestHeader);
        assert_eq!(config.render.failure_policy, FailurePolicy::Skip);
        assert_eq!(config.server.listen.port(), 9000);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert!(config.catalog.path.is_none());
        assert_eq!(config.render, ReportConfig::default());
        assert_eq!(config.server.listen, default_listen());
    }

    #[test]
    fn test_load_missing_config() {
        assert!(load_config(Path::new("missing-config.toml")).is_err());
    }
}

use super::types::MonitorConfig;
use crate::error::Result;
use config::{Config, Environment, File};

/// Configuration loader with builder pattern
///
/// Layers, lowest to highest priority: built-in defaults, an optional file,
/// `WEBPERF__*` environment variables.
pub struct ConfigLoader {
    config_file: Option<String>,
    load_env: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            config_file: None,
            load_env: false,
        }
    }

    /// Load configuration from file
    pub fn load_from_file(mut self, path: Option<&str>) -> Self {
        self.config_file = path.map(String::from);
        self
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Build the final configuration
    pub fn build(self) -> Result<MonitorConfig> {
        let mut builder =
            Config::builder().add_source(Config::try_from(&MonitorConfig::default())?);

        if let Some(config_path) = &self.config_file {
            builder = builder.add_source(File::with_name(config_path).required(true));
        } else {
            builder = builder.add_source(File::with_name("webperf-monitor").required(false));
        }

        if self.load_env {
            builder = builder.add_source(
                Environment::with_prefix("WEBPERF")
                    .prefix_separator("__")
                    .separator("__"),
            );
        }

        let config: MonitorConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorConfig {
    /// Loads configuration from an optional file plus the environment
    pub fn load(path: Option<&str>) -> Result<Self> {
        ConfigLoader::new()
            .load_from_file(path)
            .load_from_env()
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_defaults_without_file() {
        let config = assert_ok!(ConfigLoader::new().build());
        assert_eq!(config.thresholds.page_load_time, 1500.0);
        assert_eq!(config.intervals.cleanup_secs, 300);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            "retention_secs = 600\n\n[thresholds]\napi_response_time = 800.0\n\n[optimizations]\nenable_code_splitting = false"
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let config = assert_ok!(ConfigLoader::new().load_from_file(Some(&path)).build());

        assert_eq!(config.retention_secs, 600);
        assert_eq!(config.thresholds.api_response_time, 800.0);
        // untouched keys keep their defaults
        assert_eq!(config.thresholds.page_load_time, 1500.0);
        assert!(!config.optimizations.enable_code_splitting);
        assert!(config.optimizations.enable_image_lazy_loading);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        assert_err!(ConfigLoader::new()
            .load_from_file(Some("/nonexistent/webperf-monitor-config"))
            .build());
    }
}

//! Configuration file loader.

use std::path::PathBuf;

use super::{default_profiles, MonitorConfig};

/// Configuration loader that searches multiple locations.
#[derive(Debug)]
pub struct ConfigLoader {
    /// Search paths in order of priority.
    search_paths: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with default search paths.
    #[must_use]
    pub fn new() -> Self {
        let mut search_paths = Vec::new();

        // 1. Current directory: .build-monitor.toml
        search_paths.push(PathBuf::from(".build-monitor.toml"));

        // 2. User config directory: ~/.config/build-monitor/config.toml
        if let Some(config_dir) = dirs::config_dir() {
            search_paths.push(config_dir.join("build-monitor").join("config.toml"));
        }

        Self { search_paths }
    }

    /// Create a config loader with a specific config file path.
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            search_paths: vec![path],
        }
    }

    /// Load configuration from the first available file, or return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed.
    pub fn load(&self) -> Result<MonitorConfig, ConfigError> {
        for path in &self.search_paths {
            if path.exists() {
                tracing::debug!(path = %path.display(), "Loading config file");
                return Self::load_from_path(path);
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(MonitorConfig::default())
    }

    /// Load configuration from a specific path.
    fn load_from_path(path: &PathBuf) -> Result<MonitorConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.clone(),
            source: e,
        })?;

        parse_config(&content).map_err(|e| ConfigError::ParseError {
            path: path.clone(),
            source: e,
        })
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse TOML into a config, keeping built-in profiles the file does not
/// redefine.
///
/// # Errors
///
/// Returns the TOML error if the content is not a valid config.
pub fn parse_config(content: &str) -> Result<MonitorConfig, toml::de::Error> {
    let mut config: MonitorConfig = toml::from_str(content)?;
    for (name, profile) in default_profiles() {
        config.profiles.entry(name).or_insert(profile);
    }
    Ok(config)
}

/// Errors that can occur during configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Unknown build profile '{name}' (available: {available})")]
    UnknownProfile { name: String, available: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_loader_returns_defaults_when_no_file() {
        let loader = ConfigLoader::with_path(PathBuf::from("/nonexistent/path.toml"));
        let config = loader.load().unwrap();
        assert_eq!(config.refresh_interval_ms, 1000);
    }

    #[test]
    fn test_parse_toml_config() {
        let toml_str = r#"
            state_dir = "/var/lib/circuits"
            refresh_interval_ms = 500
            log_tail_lines = 8

            [profiles.nightly]
            script = "run_nightly.sh"
            mode = "nightly"
            total_parts = 5
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.state_dir, PathBuf::from("/var/lib/circuits"));
        assert_eq!(config.refresh_interval_ms, 500);
        assert_eq!(config.poll_slice_ms, 100);
        assert_eq!(config.log_tail_lines, 8);

        let nightly = config.profile("nightly").unwrap();
        assert_eq!(nightly.total_parts, 5);
        assert_eq!(nightly.compile_flag, "--compile-only");
        assert!(config.profile("128-mini").is_some());
    }

    #[test]
    fn test_file_profile_overrides_builtin() {
        let config = parse_config(
            r#"
            [profiles.mini]
            script = "custom_mini.sh"
            mode = "mini-custom"
            total_parts = 3
            compile_flag = "--dry"
        "#,
        )
        .unwrap();
        let mini = config.profile("mini").unwrap();
        assert_eq!(mini.script, PathBuf::from("custom_mini.sh"));
        assert_eq!(mini.total_parts, 3);
        assert_eq!(mini.compile_flag, "--dry");
    }

    #[test]
    fn test_load_reports_parse_error_with_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "refresh_interval_ms = \"fast\"").unwrap();
        file.flush().unwrap();

        let err = ConfigLoader::with_path(file.path().to_path_buf())
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_unknown_profile_display() {
        let err = ConfigError::UnknownProfile {
            name: "256".to_string(),
            available: "128, 128-mini, mini".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unknown build profile '256' (available: 128, 128-mini, mini)"
        );
    }
}

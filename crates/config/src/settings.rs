// Application settings
// Loaded from ~/.config/slicecheck/config.toml

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Defaults for `slicecheck compare`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareSettings {
    /// Header rows in the source extract
    pub source_header_rows: usize,
    /// Header rows in the target extract
    pub target_header_rows: usize,
    /// Dimension columns shared by both extracts
    pub dimensions: Vec<String>,
    /// Report path
    pub output: PathBuf,
}

impl Default for CompareSettings {
    fn default() -> Self {
        Self {
            source_header_rows: 2,
            target_header_rows: 2,
            dimensions: Vec::new(),
            output: PathBuf::from("comparison.xlsx"),
        }
    }
}

/// Planning-service connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpmSettings {
    pub base_url: Option<String>,
    pub api_version: String,
    pub application: Option<String>,
    pub plan_type: Option<String>,
    pub username: Option<String>,
    /// Name of the environment variable holding the password.
    /// Passwords are never stored in the config file.
    pub password_env: String,
    pub poll_interval_secs: u64,
    pub max_retries: u32,
}

impl Default for EpmSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            api_version: "v3".to_string(),
            application: None,
            plan_type: None,
            username: None,
            password_env: "EPM_PASSWORD".to_string(),
            poll_interval_secs: 10,
            max_retries: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter used when RUST_LOG is unset (e.g. "info", "slicecheck_io=debug")
    pub level: String,
    /// Also append logs to this file
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub compare: CompareSettings,
    pub epm: EpmSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Get the default config file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("slicecheck");
        config_dir.join("config.toml")
    }

    /// Load from `path` if given, else from the default location.
    ///
    /// A missing default file yields defaults; an explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load_from(p),
            None => {
                let default_path = Self::config_path();
                if !default_path.exists() {
                    tracing::debug!(path = %default_path.display(), "no config file, using defaults");
                    return Ok(Self::default());
                }
                Self::load_from(&default_path)
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_toml(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(settings)
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Get the config file path for display
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.compare.source_header_rows, 2);
        assert_eq!(s.compare.target_header_rows, 2);
        assert!(s.compare.dimensions.is_empty());
        assert_eq!(s.compare.output, PathBuf::from("comparison.xlsx"));
        assert_eq!(s.epm.api_version, "v3");
        assert_eq!(s.epm.password_env, "EPM_PASSWORD");
        assert_eq!(s.epm.poll_interval_secs, 10);
        assert_eq!(s.epm.max_retries, 30);
        assert_eq!(s.logging.level, "info");
        assert!(s.logging.file.is_none());
    }

    #[test]
    fn test_empty_file_is_defaults() {
        assert_eq!(Settings::from_toml("").unwrap(), Settings::default());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let s = Settings::from_toml(
            r#"
[compare]
dimensions = ["Entity", "Account"]
target_header_rows = 1

[epm]
base_url = "https://planning.example.com"
application = "Vision"
max_retries = 5
"#,
        )
        .unwrap();
        assert_eq!(s.compare.dimensions, vec!["Entity", "Account"]);
        assert_eq!(s.compare.source_header_rows, 2);
        assert_eq!(s.compare.target_header_rows, 1);
        assert_eq!(s.epm.base_url.as_deref(), Some("https://planning.example.com"));
        assert_eq!(s.epm.application.as_deref(), Some("Vision"));
        assert_eq!(s.epm.max_retries, 5);
        assert_eq!(s.epm.poll_interval_secs, 10);
        assert_eq!(s.logging, LoggingSettings::default());
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[logging]\nlevel = \"debug\"\nfile = \"run.log\"\n").unwrap();
        let s = Settings::load(Some(&path)).unwrap();
        assert_eq!(s.logging.level, "debug");
        assert_eq!(s.logging.file, Some(PathBuf::from("run.log")));
    }

    #[test]
    fn test_missing_explicit_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[compare]\nsource_header_rows = \"two\"\n").unwrap();
        let err = Settings::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_config_path_ends_with_app_dir() {
        let path = Settings::config_path();
        assert!(path.ends_with("slicecheck/config.toml"));
    }
}

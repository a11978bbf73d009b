//! Store configuration.
//!
//! Layers, lowest first: built-in defaults, an optional `kanban.toml`, then
//! `KANBAN_*` environment variables
//! (e.g. `KANBAN_DEFAULT_ADDED_BY=ci-bot`).

use std::path::Path;
use std::path::PathBuf;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Config file looked up in the project directory.
pub const CONFIG_FILENAME: &str = "kanban.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "KANBAN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found at path: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to load configuration: {0}")]
    Load(String),

    #[error("invalid configuration value: {0}")]
    Validation(String),

    #[error("failed to serialize configuration: {0}")]
    Serialize(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Load(err.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KanbanConfig {
    /// Store root, relative to the project directory unless absolute.
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,

    /// Attribution for references added without `addedBy`.
    #[serde(default = "default_added_by")]
    pub default_added_by: String,

    /// Pretty-print persisted JSON documents.
    #[serde(default = "default_true")]
    pub pretty_json: bool,

    /// Hold an advisory lock file in the store root while each document is
    /// written. Read-modify-write cycles across documents are not covered.
    #[serde(default = "default_true")]
    pub lock_writes: bool,
}

fn default_root_dir() -> PathBuf {
    PathBuf::from("kanban")
}

fn default_added_by() -> String {
    kanban_types::DEFAULT_ADDED_BY.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for KanbanConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            default_added_by: default_added_by(),
            pretty_json: true,
            lock_writes: true,
        }
    }
}

impl KanbanConfig {
    /// Load configuration for `project_dir`, reading `kanban.toml` there if
    /// present.
    pub fn discover(project_dir: &Path) -> Result<Self, ConfigError> {
        let candidate = project_dir.join(CONFIG_FILENAME);
        let loader = if candidate.exists() {
            ConfigLoader::new().with_file(candidate)
        } else {
            ConfigLoader::new()
        };
        loader.load()
    }

    /// Absolute store root for `project_dir`.
    pub fn store_root(&self, project_dir: &Path) -> PathBuf {
        if self.root_dir.is_absolute() {
            self.root_dir.clone()
        } else {
            project_dir.join(&self.root_dir)
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.root_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation("root_dir must not be empty".into()));
        }
        if self.default_added_by.trim().is_empty() {
            return Err(ConfigError::Validation(
                "default_added_by must not be blank".into(),
            ));
        }
        Ok(())
    }

    /// Render as TOML, suitable for writing a starter `kanban.toml`.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}

/// Builds a [`KanbanConfig`] from the configured layers.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit config file. Loading fails if it does not exist.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn load(&self) -> Result<KanbanConfig, ConfigError> {
        let mut builder = Config::builder();

        let defaults_json = serde_json::to_string(&KanbanConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        builder = builder.add_source(File::from_str(&defaults_json, config::FileFormat::Json));

        if let Some(ref path) = self.config_path {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
            builder = builder.add_source(File::from(path.as_path()));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: KanbanConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        tracing::debug!(
            root_dir = %config.root_dir.display(),
            lock_writes = config.lock_writes,
            "kanban config loaded"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn defaults_only() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, KanbanConfig::default());
        assert_eq!(config.root_dir, PathBuf::from("kanban"));
        assert_eq!(config.default_added_by, "system");
    }

    #[test]
    #[serial]
    fn toml_file_overrides_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(CONFIG_FILENAME),
            "root_dir = \".boards\"\ndefault_added_by = \"planner\"\nlock_writes = false\n",
        )
        .unwrap();

        let config = KanbanConfig::discover(tmp.path()).unwrap();
        assert_eq!(config.root_dir, PathBuf::from(".boards"));
        assert_eq!(config.default_added_by, "planner");
        assert!(!config.lock_writes);
        assert!(config.pretty_json);
        assert_eq!(config.store_root(tmp.path()), tmp.path().join(".boards"));
    }

    #[test]
    #[serial]
    fn env_overrides_file() {
        unsafe {
            env::set_var("KANBAN_DEFAULT_ADDED_BY", "ci-bot");
            env::set_var("KANBAN_PRETTY_JSON", "false");
        }
        let config = ConfigLoader::new().load();
        unsafe {
            env::remove_var("KANBAN_DEFAULT_ADDED_BY");
            env::remove_var("KANBAN_PRETTY_JSON");
        }
        let config = config.unwrap();
        assert_eq!(config.default_added_by, "ci-bot");
        assert!(!config.pretty_json);
    }

    #[test]
    #[serial]
    fn missing_explicit_file_is_an_error() {
        let err = ConfigLoader::new()
            .with_file("/definitely/not/here/kanban.toml")
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn blank_attribution_fails_validation() {
        let config = KanbanConfig {
            default_added_by: " ".to_string(),
            ..KanbanConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn to_toml_round_trips_through_loader() {
        let tmp = tempfile::TempDir::new().unwrap();
        let original = KanbanConfig {
            root_dir: PathBuf::from("boards-root"),
            ..KanbanConfig::default()
        };
        let path = tmp.path().join(CONFIG_FILENAME);
        std::fs::write(&path, original.to_toml().unwrap()).unwrap();
        let loaded = ConfigLoader::new().with_file(path).load().unwrap();
        assert_eq!(loaded, original);
    }
}

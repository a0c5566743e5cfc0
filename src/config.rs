//! Layered configuration loading.
//!
//! Sources, highest priority first:
//! 1. Command-line flags (applied by [`BoardConfig::with_overrides`])
//! 2. Environment variables `KANBAN_DATA_DIR`, `KANBAN_HORIZON_DAYS`
//! 3. A TOML file: `--config <path>` or `~/.config/kanban/config.toml`
//! 4. Built-in defaults

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::notify::DEFAULT_HORIZON_DAYS;

/// Upper bound on the notification horizon (ten years).
pub const MAX_HORIZON_DAYS: u32 = 3650;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Figment extraction or merge error.
    #[error("Configuration error: {0}")]
    Figment(#[from] figment::Error),

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BoardConfig {
    /// Directory holding `tasks.json` and `users.json`.
    pub data_dir: PathBuf,
    /// Look-ahead window for due-date notices.
    pub horizon_days: u32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        BoardConfig {
            data_dir: home.join(".kanban"),
            horizon_days: DEFAULT_HORIZON_DAYS,
        }
    }
}

impl BoardConfig {
    /// Load from defaults, config file and environment.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment(config_file))
    }

    /// Build the provider chain. An explicit file replaces the user-global one.
    pub fn figment(config_file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        let file = config_file.map(Path::to_path_buf).or_else(Self::global_config_path);
        if let Some(path) = file.filter(|p| p.exists()) {
            debug!(path = %path.display(), "reading config file");
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed("KANBAN_").only(&["data_dir", "horizon_days"]))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()
    }

    /// Apply command-line overrides on top of the loaded values.
    pub fn with_overrides(mut self, data_dir: Option<PathBuf>, horizon_days: Option<u32>) -> Result<Self, ConfigError> {
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        if let Some(days) = horizon_days {
            self.horizon_days = days;
        }
        self.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.horizon_days > MAX_HORIZON_DAYS {
            return Err(ConfigError::InvalidValue {
                field: "horizon_days".into(),
                reason: format!("{} exceeds the maximum of {MAX_HORIZON_DAYS}", self.horizon_days),
            });
        }
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "data_dir".into(),
                reason: "must not be empty".into(),
            });
        }
        Ok(self)
    }

    pub fn tasks_path(&self) -> PathBuf {
        self.data_dir.join("tasks.json")
    }

    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join("users.json")
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("kanban").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_correct() {
        let config = BoardConfig::default();
        assert_eq!(config.horizon_days, 14);
        assert!(config.data_dir.ends_with(".kanban"));
        assert_eq!(config.tasks_path(), config.data_dir.join("tasks.json"));
    }

    #[test]
    fn file_then_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file("board.toml", "data_dir = \"/srv/board\"\nhorizon_days = 7")?;
            let config = BoardConfig::load(Some(Path::new("board.toml"))).expect("config");
            assert_eq!(config.data_dir, PathBuf::from("/srv/board"));
            assert_eq!(config.horizon_days, 7);

            jail.set_env("KANBAN_HORIZON_DAYS", "21");
            let config = BoardConfig::load(Some(Path::new("board.toml"))).expect("config");
            assert_eq!(config.data_dir, PathBuf::from("/srv/board"));
            assert_eq!(config.horizon_days, 21);
            Ok(())
        });
    }

    #[test]
    fn overrides_win_and_are_validated() {
        let config = BoardConfig::default()
            .with_overrides(Some(PathBuf::from("/tmp/k")), Some(30))
            .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/k"));
        assert_eq!(config.horizon_days, 30);

        let err = BoardConfig::default().with_overrides(None, Some(5000)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field, .. } if field == "horizon_days"));
    }

    #[test]
    fn bad_env_value_is_an_error() {
        Jail::expect_with(|jail| {
            jail.set_env("KANBAN_HORIZON_DAYS", "soon");
            assert!(matches!(
                BoardConfig::load(Some(Path::new("missing.toml"))),
                Err(ConfigError::Figment(_))
            ));
            Ok(())
        });
    }
}

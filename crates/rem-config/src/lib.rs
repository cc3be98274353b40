//! Configuration management for rem.
//!
//! Parses `rem.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ```toml
//! [markup]
//! mode = "untrusted"
//! max_input_chars = 65536
//! max_steps = 10000000
//! ```

use std::path::{Path, PathBuf};

use rem_markup::{Limits, Mode};
use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override render mode.
    pub mode: Option<Mode>,
    /// Override input length limit.
    pub max_input_chars: Option<usize>,
    /// Override step limit (0 disables it).
    pub max_steps: Option<u64>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "rem.toml";

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Markup rendering configuration.
    pub markup: MarkupConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Markup rendering configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MarkupConfig {
    /// Grammar used when the caller doesn't pick one.
    pub mode: Mode,
    /// Longest input accepted, in characters.
    pub max_input_chars: usize,
    /// Rule applications allowed per render. 0 means unlimited.
    pub max_steps: u64,
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Untrusted,
            max_input_chars: 65_536,
            max_steps: 10_000_000,
        }
    }
}

impl MarkupConfig {
    /// Render limits described by this configuration.
    pub fn limits(&self) -> Limits {
        Limits {
            max_input_chars: Some(self.max_input_chars),
            max_steps: (self.max_steps > 0).then_some(self.max_steps),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `rem.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading, so CLI arguments take
    /// precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the final configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::discover_config(&cwd))
        {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(mode) = settings.mode {
            self.markup.mode = mode;
        }
        if let Some(max_input_chars) = settings.max_input_chars {
            self.markup.max_input_chars = max_input_chars;
        }
        if let Some(max_steps) = settings.max_steps {
            self.markup.max_steps = max_steps;
        }
    }

    /// Search for config file in `start` and its parents.
    fn discover_config(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.markup.max_input_chars == 0 {
            return Err(ConfigError::Validation(
                "markup.max_input_chars must be greater than 0".to_owned(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.markup.mode, Mode::Untrusted);
        assert_eq!(config.markup.max_input_chars, 65_536);
        assert_eq!(config.markup.max_steps, 10_000_000);
        assert!(config.config_path.is_none());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.markup.mode, Mode::Untrusted);
    }

    #[test]
    fn test_parse_markup_config() {
        let toml = r#"
[markup]
mode = "trusted"
max_input_chars = 1000
max_steps = 0
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.markup.mode, Mode::Trusted);
        assert_eq!(config.markup.max_input_chars, 1000);
        assert_eq!(config.markup.max_steps, 0);
    }

    #[test]
    fn test_parse_unknown_mode_fails() {
        let toml = r#"
[markup]
mode = "sanitized"
"#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn test_limits() {
        let config = Config::default();
        assert_eq!(
            config.markup.limits(),
            Limits {
                max_input_chars: Some(65_536),
                max_steps: Some(10_000_000),
            }
        );
    }

    #[test]
    fn test_limits_zero_steps_is_unlimited() {
        let mut config = Config::default();
        config.markup.max_steps = 0;
        assert_eq!(config.markup.limits().max_steps, None);
    }

    #[test]
    fn test_apply_cli_settings_mode() {
        let mut config = Config::default();
        let overrides = CliSettings {
            mode: Some(Mode::Trusted),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.markup.mode, Mode::Trusted);
        assert_eq!(config.markup.max_input_chars, 65_536); // Unchanged
    }

    #[test]
    fn test_apply_cli_settings_limits() {
        let mut config = Config::default();
        let overrides = CliSettings {
            max_input_chars: Some(10),
            max_steps: Some(500),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.markup.max_input_chars, 10);
        assert_eq!(config.markup.max_steps, 500);
        assert_eq!(config.markup.mode, Mode::Untrusted); // Unchanged
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default();
        config.apply_cli_settings(&CliSettings::default());
        assert_eq!(config.markup.mode, Mode::Untrusted);
        assert_eq!(config.markup.max_steps, 10_000_000);
    }

    #[test]
    fn test_validate_default_config_passes() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_input_limit() {
        let mut config = Config::default();
        config.markup.max_input_chars = 0;
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
        assert!(err.to_string().contains("markup.max_input_chars"));
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(p) if p == path));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[markup]\nmode = \"trusted\"\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.markup.mode, Mode::Trusted);
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_invalid_file_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[markup]\nmax_input_chars = 0\n").unwrap();

        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_load_cli_settings_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[markup]\nmode = \"trusted\"\n").unwrap();
        let overrides = CliSettings {
            mode: Some(Mode::Untrusted),
            ..Default::default()
        };

        let config = Config::load(Some(&path), Some(&overrides)).unwrap();

        assert_eq!(config.markup.mode, Mode::Untrusted);
    }

    #[test]
    fn test_load_cli_settings_are_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "").unwrap();
        let overrides = CliSettings {
            max_input_chars: Some(0),
            ..Default::default()
        };

        let err = Config::load(Some(&path), Some(&overrides)).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[markup\n").unwrap();

        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_discover_config_in_parent() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "").unwrap();

        assert_eq!(
            Config::discover_config(&nested),
            Some(dir.path().join(CONFIG_FILENAME))
        );
    }

    #[test]
    fn test_discover_config_prefers_nearest() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "").unwrap();
        std::fs::write(nested.join(CONFIG_FILENAME), "").unwrap();

        assert_eq!(
            Config::discover_config(&nested),
            Some(nested.join(CONFIG_FILENAME))
        );
    }
}

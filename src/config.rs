use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ai::{GenerationOptions, DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_TEMPERATURE};
use crate::provider::Provider;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Please provide your {provider} API key in the {var} environment variable or a .env file to start.")]
    MissingApiKey {
        provider: &'static str,
        var: &'static str,
    },
    #[error("Could not determine config directory")]
    NoConfigDir,
    #[error("Failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Optional user settings stored as JSON. Secrets never live here.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub provider: Provider,
    pub model: Option<String>,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub request_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: None,
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            request_timeout_secs: Some(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Load from the default location, falling back to defaults when the
    /// file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("web-builder").join("config.json"))
    }

    /// Configured model, or the provider's default one
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Config plus the credential it needs. Constructing one is the startup
/// gate: without an API key there is no session.
#[derive(Clone)]
pub struct Settings {
    pub config: Config,
    pub api_key: String,
}

impl Settings {
    /// Resolve the API key from the process environment.
    pub fn resolve(config: Config) -> Result<Self, ConfigError> {
        Self::resolve_with(config, |var| std::env::var(var).ok())
    }

    pub fn resolve_with<F>(config: Config, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = config.provider.api_key_env();
        let api_key = lookup(var)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey {
                provider: config.provider.display_name(),
                var,
            })?;

        Ok(Self { config, api_key })
    }
}

/// Read `.env` from the working directory (or a parent) into the process
/// environment. Variables that are already set win. Returns the file used,
/// or `None` when there is none.
pub fn load_dotenv() -> Result<Option<PathBuf>, dotenvy::Error> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Like [`load_dotenv`] for an explicit file. Returns whether it existed.
pub fn load_dotenv_from(path: &Path) -> Result<bool, dotenvy::Error> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("config", &self.config)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.json")).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.model(), "gemini-1.5-flash");
        assert_eq!(config.generation_options(), GenerationOptions::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"provider": "claude", "temperature": 0.7}"#).unwrap();

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.provider, Provider::Claude);
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.max_output_tokens, 1500);
        assert_eq!(config.model(), Provider::Claude.default_model());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        let err = Settings::resolve_with(Config::default(), |_| None).unwrap_err();

        assert!(matches!(
            err,
            ConfigError::MissingApiKey {
                var: "GEMINI_API_KEY",
                ..
            }
        ));
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let result = Settings::resolve_with(Config::default(), |_| Some("   ".to_string()));
        assert!(matches!(result, Err(ConfigError::MissingApiKey { .. })));
    }

    #[test]
    fn test_api_key_read_from_provider_variable() {
        let config = Config {
            provider: Provider::OpenAI,
            ..Config::default()
        };
        let settings = Settings::resolve_with(config, |var| {
            (var == "OPENAI_API_KEY").then(|| "sk-test".to_string())
        })
        .unwrap();

        assert_eq!(settings.api_key, "sk-test");
        assert!(!format!("{:?}", settings).contains("sk-test"));
    }

    #[test]
    fn test_dotenv_file_fills_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(
            &path,
            "WEB_BUILDER_TEST_DOTENV_KEY=from-file\nWEB_BUILDER_TEST_DOTENV_KEEP=from-file\n",
        )
        .unwrap();
        std::env::set_var("WEB_BUILDER_TEST_DOTENV_KEEP", "from-shell");

        assert!(load_dotenv_from(&path).unwrap());

        assert_eq!(std::env::var("WEB_BUILDER_TEST_DOTENV_KEY").unwrap(), "from-file");
        assert_eq!(std::env::var("WEB_BUILDER_TEST_DOTENV_KEEP").unwrap(), "from-shell");
    }

    #[test]
    fn test_missing_dotenv_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!load_dotenv_from(&dir.path().join(".env")).unwrap());
    }
}

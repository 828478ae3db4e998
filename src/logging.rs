//! Structured logging setup

use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use regex::Regex;
use std::sync::LazyLock;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info,web_builder=debug";
const PREVIEW_CHARS: usize = 100;

/// Where log lines go
#[derive(Debug, Clone)]
pub enum LogTarget {
    Stderr,
    /// Append to a file; used while the TUI owns the terminal
    File(PathBuf),
}

pub struct LogConfig {
    pub target: LogTarget,
    pub json_format: bool,
}

impl LogConfig {
    pub fn new(target: LogTarget) -> Self {
        Self {
            target,
            json_format: std::env::var("LOG_FORMAT")
                .map(|v| v.to_lowercase() == "json")
                .unwrap_or(false),
        }
    }
}

/// Default log file under the user's cache directory
pub fn default_log_file() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("web-builder").join("webbuilder.log"))
}

/// Install the global tracing subscriber. `RUST_LOG` overrides the filter.
pub fn init_logging(config: LogConfig) -> io::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let layer = fmt::layer().with_target(true);

    match &config.target {
        LogTarget::Stderr => {
            if config.json_format {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(layer.json().with_writer(io::stderr))
                    .init();
            } else {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(layer.with_writer(io::stderr))
                    .init();
            }
        }
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let writer = Mutex::new(file);

            if config.json_format {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(layer.json().with_writer(writer))
                    .init();
            } else {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(layer.with_ansi(false).with_writer(writer))
                    .init();
            }
        }
    }

    tracing::info!(
        target_kind = ?config.target,
        json_format = config.json_format,
        version = env!("CARGO_PKG_VERSION"),
        "Logging initialized"
    );
    Ok(())
}

static SECRET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(bearer\s+|api[_-]?key\s*[=:]\s*|password\s*[=:]\s*)\S+")
        .expect("valid secret regex")
});

/// Short, credential-free preview of user text for log lines.
pub fn preview_for_log(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "[EMPTY]".to_string();
    }

    let redacted = SECRET.replace_all(trimmed, "${1}[REDACTED]");
    let total = redacted.chars().count();
    if total <= PREVIEW_CHARS {
        return redacted.into_owned();
    }

    let head: String = redacted.chars().take(PREVIEW_CHARS).collect();
    format!("{}... ({} chars total)", head, total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_marks_empty() {
        assert_eq!(preview_for_log("  "), "[EMPTY]");
    }

    #[test]
    fn test_preview_keeps_short_text() {
        assert_eq!(preview_for_log("  a cafe menu  "), "a cafe menu");
    }

    #[test]
    fn test_preview_truncates_long_text() {
        let preview = preview_for_log(&"x".repeat(150));
        assert!(preview.starts_with(&"x".repeat(100)));
        assert!(preview.ends_with("... (150 chars total)"));
    }

    #[test]
    fn test_preview_redacts_credentials() {
        let preview = preview_for_log("use api_key=AIzaSecret and Bearer sk-123");
        assert!(!preview.contains("AIzaSecret"));
        assert!(!preview.contains("sk-123"));
        assert!(preview.contains("api_key=[REDACTED]"));
        assert!(preview.contains("Bearer [REDACTED]"));
    }

    #[test]
    fn test_unwritable_log_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();

        let config = LogConfig {
            target: LogTarget::File(blocker.join("webbuilder.log")),
            json_format: false,
        };

        // Fails before any subscriber is installed, so the caller can go on
        assert!(init_logging(config).is_err());
    }
}

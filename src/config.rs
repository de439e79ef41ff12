//! Application-level configuration loading, including storage backend selection.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "TRIVIA_BOARD_BACK_CONFIG_PATH";

/// Storage backend the server should install. Chosen by configuration, not
/// by sniffing the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackendKind {
    /// Durable MongoDB-backed store.
    Mongo,
    /// In-process ephemeral store.
    Memory,
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    storage: StorageBackendKind,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// built-in defaults when the file is missing or malformed.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        backend = ?app_config.storage,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Storage backend to install.
    pub fn storage(&self) -> StorageBackendKind {
        self.storage
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: default_backend(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    storage: Option<RawStorage>,
}

#[derive(Debug, Deserialize)]
/// JSON representation of the storage section of the configuration file.
struct RawStorage {
    backend: String,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let storage = value
            .storage
            .and_then(|raw| match parse_backend(&raw.backend) {
                Some(kind) => Some(kind),
                None => {
                    warn!(
                        backend = %raw.backend,
                        "unknown storage backend in config; falling back to the default"
                    );
                    None
                }
            })
            .unwrap_or_else(default_backend);

        Self { storage }
    }
}

fn parse_backend(raw: &str) -> Option<StorageBackendKind> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "mongo" | "mongodb" => Some(StorageBackendKind::Mongo),
        "memory" | "ephemeral" => Some(StorageBackendKind::Memory),
        _ => None,
    }
}

fn default_backend() -> StorageBackendKind {
    if cfg!(feature = "mongo-store") {
        StorageBackendKind::Mongo
    } else {
        StorageBackendKind::Memory
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_names_parse_case_insensitively() {
        assert_eq!(parse_backend("Mongo"), Some(StorageBackendKind::Mongo));
        assert_eq!(parse_backend(" mongodb "), Some(StorageBackendKind::Mongo));
        assert_eq!(parse_backend("MEMORY"), Some(StorageBackendKind::Memory));
        assert_eq!(parse_backend("postgres"), None);
    }

    #[test]
    fn unknown_backend_falls_back_to_the_default() {
        let config: AppConfig = RawConfig {
            storage: Some(RawStorage {
                backend: "postgres".into(),
            }),
        }
        .into();
        assert_eq!(config.storage(), default_backend());
    }
}

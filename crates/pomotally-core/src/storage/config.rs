//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Focus and rest lengths
//! - The signed-in identity used for session-log keys
//! - Which document store backs the session log
//! - Log filter
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::ConfigError;
use crate::identity::UserId;
use crate::timer::{Durations, DEFAULT_FOCUS_MINUTES, DEFAULT_REST_MINUTES, MIN_DURATION_MINUTES};

/// Environment variable that overrides `identity.id_token`.
pub const ID_TOKEN_ENV: &str = "POMOTALLY_ID_TOKEN";

/// Timer lengths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_focus_minutes")]
    pub focus_minutes: u32,
    #[serde(default = "default_rest_minutes")]
    pub rest_minutes: u32,
}

/// Signed-in identity supplied to the controller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// User identity (e-mail). Persistence is skipped when unset.
    #[serde(default)]
    pub user: Option<String>,
    /// Bearer token for the hosted store.
    #[serde(default)]
    pub id_token: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    #[default]
    Sqlite,
    Firestore,
}

/// Hosted document database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirestoreSection {
    #[serde(default)]
    pub project_id: String,
    #[serde(default = "default_firestore_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default)]
    pub firestore: FirestoreSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

// Default functions
fn default_focus_minutes() -> u32 {
    DEFAULT_FOCUS_MINUTES
}
fn default_rest_minutes() -> u32 {
    DEFAULT_REST_MINUTES
}
fn default_firestore_url() -> String {
    "https://firestore.googleapis.com".into()
}
fn default_log_filter() -> String {
    "warn".into()
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            focus_minutes: default_focus_minutes(),
            rest_minutes: default_rest_minutes(),
        }
    }
}

impl Default for FirestoreSection {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            base_url: default_firestore_url(),
            api_key: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    // Strings and unset optionals.
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Location of `config.toml`.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing the defaults when no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Get a config value as string by dot-separated key.
    /// Unset optional values read as an empty string.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => Some(String::new()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit the
    /// field's type.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (key, minutes) in [
            ("timer.focus_minutes", self.timer.focus_minutes),
            ("timer.rest_minutes", self.timer.rest_minutes),
        ] {
            if minutes < MIN_DURATION_MINUTES {
                return Err(ConfigError::InvalidValue {
                    key: key.into(),
                    message: format!("must be at least {MIN_DURATION_MINUTES} minute"),
                });
            }
        }
        Ok(())
    }

    /// Defaults for everything except the identity, so the session-log key
    /// stays the same across a reset.
    pub fn reset_keeping_identity(&mut self) {
        let identity = std::mem::take(&mut self.identity);
        *self = Self {
            identity,
            ..Self::default()
        };
    }

    /// Configured focus/rest lengths.
    pub fn durations(&self) -> Durations {
        Durations::new(self.timer.focus_minutes, self.timer.rest_minutes)
    }

    /// Configured identity, if any. Blank values count as signed out.
    pub fn user(&self) -> Option<UserId> {
        self.identity
            .user
            .as_deref()
            .and_then(|raw| UserId::new(raw).ok())
    }

    /// Bearer token for the hosted store; the environment wins over the file.
    pub fn id_token(&self) -> Option<String> {
        std::env::var(ID_TOKEN_ENV)
            .ok()
            .filter(|t| !t.is_empty())
            .or_else(|| self.identity.id_token.clone())
    }
}

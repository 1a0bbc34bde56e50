//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Burn pacing and tap classification windows
//! - Unit price and minutes lost per cigarette
//! - Completion settle delay and interstitial behaviour
//! - Remote realtime database connection
//!
//! Configuration is stored at `~/.config/smoketrace/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::data_dir;
use crate::error::{ConfigError, ValidationError};

/// Burn pacing and input classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Progress added per tick.
    #[serde(default = "default_burn_step")]
    pub burn_step: u8,
    /// Presses closer together than this are duplicate deliveries, not a double-tap.
    #[serde(default = "default_double_tap_min_ms")]
    pub double_tap_min_ms: u64,
    #[serde(default = "default_double_tap_max_ms")]
    pub double_tap_max_ms: u64,
    /// How long a press must be held before manual burning starts.
    #[serde(default = "default_hold_arm_ms")]
    pub hold_arm_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingConfig {
    #[serde(default = "default_unit_price")]
    pub unit_price: u64,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    #[serde(default = "default_unit_minutes")]
    pub unit_minutes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionConfig {
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

/// Remote realtime database connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Root URL of the realtime database; empty means offline.
    #[serde(default)]
    pub database_url: String,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,
    /// Presence older than this is not counted as active.
    #[serde(default = "default_active_window_secs")]
    pub active_window_secs: u64,
    #[serde(default = "default_poll_secs")]
    pub poll_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterstitialConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_interstitial_secs")]
    pub duration_secs: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/smoketrace/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub burn: BurnConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub interstitial: InterstitialConfig,
}

// Default functions
fn default_tick_interval_ms() -> u64 {
    150
}
fn default_burn_step() -> u8 {
    1
}
fn default_double_tap_min_ms() -> u64 {
    50
}
fn default_double_tap_max_ms() -> u64 {
    400
}
fn default_hold_arm_ms() -> u64 {
    400
}
fn default_unit_price() -> u64 {
    250
}
fn default_currency_symbol() -> String {
    "₩".into()
}
fn default_unit_minutes() -> u64 {
    11
}
fn default_settle_delay_ms() -> u64 {
    500
}
fn default_true() -> bool {
    true
}
fn default_heartbeat_secs() -> u64 {
    15
}
fn default_active_window_secs() -> u64 {
    30
}
fn default_poll_secs() -> u64 {
    5
}
fn default_interstitial_secs() -> u64 {
    3
}

impl Default for BurnConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            burn_step: default_burn_step(),
            double_tap_min_ms: default_double_tap_min_ms(),
            double_tap_max_ms: default_double_tap_max_ms(),
            hold_arm_ms: default_hold_arm_ms(),
        }
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            unit_price: default_unit_price(),
            currency_symbol: default_currency_symbol(),
            unit_minutes: default_unit_minutes(),
        }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            database_url: String::new(),
            auth_token: None,
            heartbeat_secs: default_heartbeat_secs(),
            active_window_secs: default_active_window_secs(),
            poll_secs: default_poll_secs(),
        }
    }
}

impl Default for InterstitialConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            duration_secs: default_interstitial_secs(),
        }
    }
}

impl CompletionConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl StoreConfig {
    /// Whether a remote database should be contacted at all.
    pub fn is_remote(&self) -> bool {
        self.enabled && !self.database_url.trim().is_empty()
    }

    /// Heartbeat period, never shorter than one second.
    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs.max(1))
    }

    pub fn active_window(&self) -> Duration {
        Duration::from_secs(self.active_window_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_secs)
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
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(invalid("cannot replace a whole section".into()));
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/smoketrace"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Location of the config file.
    pub fn file_path() -> Result<PathBuf, ConfigError> {
        Self::path()
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults there if it is missing.
    ///
    /// A file that exists but cannot be read, parsed or validated is an
    /// error and is left untouched.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                return Ok(cfg);
            }
            Err(e) => {
                return Err(ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
        };
        let cfg: Self = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        cfg.validate().map_err(|e| ConfigError::InvalidValue {
            key: e.field().to_string(),
            message: e.to_string(),
        })?;
        Ok(cfg)
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without touching disk.
    ///
    /// The updated configuration is validated before it replaces `self`.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| {
            ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            }
        })?;
        updated.validate().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and persist. Returns error if key is unknown.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Check bounds the state machine relies on.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let positive = |field: &str, value: u64| {
            if value == 0 {
                Err(ValidationError::NotPositive {
                    field: field.to_string(),
                })
            } else {
                Ok(())
            }
        };

        positive("burn.tick_interval_ms", self.burn.tick_interval_ms)?;
        positive("burn.burn_step", u64::from(self.burn.burn_step))?;
        positive("store.poll_secs", self.store.poll_secs)?;
        positive("store.heartbeat_secs", self.store.heartbeat_secs)?;

        if self.burn.burn_step > 100 {
            return Err(ValidationError::InvalidValue {
                field: "burn.burn_step".into(),
                message: "must not exceed 100".into(),
            });
        }
        if self.burn.double_tap_min_ms >= self.burn.double_tap_max_ms {
            return Err(ValidationError::InvertedRange {
                lower: "burn.double_tap_min_ms".into(),
                lower_value: self.burn.double_tap_min_ms,
                upper: "burn.double_tap_max_ms".into(),
                upper_value: self.burn.double_tap_max_ms,
            });
        }
        Ok(())
    }
}

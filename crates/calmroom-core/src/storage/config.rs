//! TOML-based application configuration.
//!
//! Stores the tunables of every controller:
//! - Breathing phases
//! - Reaction delay bounds
//! - Pattern board size and playback timings
//! - Extra stretches appended to the built-in catalog
//! - Memory, color tap and word scramble timings
//!
//! Configuration is stored at `~/.config/calmroom/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, CoreError, Result};
use crate::games::{
    BreathingSettings, ColorTapSettings, MemorySettings, PatternSettings, ReactionSettings,
    ScrambleSettings,
};
use crate::stretch::{Stretch, StretchCatalog};

/// Stretch catalog configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StretchConfig {
    /// Appended after the built-in stretches.
    #[serde(default)]
    pub custom: Vec<Stretch>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/calmroom/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// How often the CLI ticks the active controller, in milliseconds.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default)]
    pub breathing: BreathingSettings,
    #[serde(default)]
    pub reaction: ReactionSettings,
    #[serde(default)]
    pub pattern: PatternSettings,
    #[serde(default)]
    pub stretch: StretchConfig,
    #[serde(default)]
    pub memory: MemorySettings,
    #[serde(default)]
    pub color_tap: ColorTapSettings,
    #[serde(default)]
    pub scramble: ScrambleSettings,
}

fn default_tick_ms() -> u64 {
    50
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            breathing: BreathingSettings::default(),
            reaction: ReactionSettings::default(),
            pattern: PatternSettings::default(),
            stretch: StretchConfig::default(),
            memory: MemorySettings::default(),
            color_tap: ColorTapSettings::default(),
            scramble: ScrambleSettings::default(),
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

    fn set_json_value_by_path(root: &mut serde_json::Value, key: &str, value: &str) -> Result<()> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        if key.is_empty() {
            return Err(unknown().into());
        }

        let mut parts = key.split('.').peekable();
        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;
            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                ),
                serde_json::Value::Number(_) => {
                    let n = value
                        .parse::<u64>()
                        .map_err(|_| invalid(format!("cannot parse '{value}' as integer")))?;
                    serde_json::Value::Number(n.into())
                }
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::from_str(value)
                        .map_err(|e| invalid(format!("expected JSON: {e}")))?
                }
                _ => serde_json::Value::String(value.into()),
            };
            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown().into())
    }

    /// Path of the config file in the data directory.
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing the defaults if no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            Ok(cfg)
        }
    }

    /// Load from an explicit path. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
                .into())
            }
        };
        let cfg: Config =
            toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Load from disk, falling back to defaults on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default configuration");
            Self::default()
        })
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

    /// Set a config value by dot-separated key, keeping the existing type.
    /// The change is validated but not written to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the resulting configuration is invalid.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Check every section.
    pub fn validate(&self) -> Result<()> {
        if self.tick_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "tick_ms".into(),
                message: "must be greater than 0".into(),
            }
            .into());
        }
        self.breathing.validate()?;
        self.reaction.validate()?;
        self.pattern.validate()?;
        self.memory.validate()?;
        self.color_tap.validate()?;
        self.stretch_catalog()?;
        Ok(())
    }

    /// Built-in stretches plus the configured extras.
    pub fn stretch_catalog(&self) -> Result<StretchCatalog> {
        StretchCatalog::with_custom(&self.stretch.custom).map_err(CoreError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.breathing.phases.len(), 3);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [reaction]
            max_delay_ms = 3000
            "#,
        )
        .unwrap();
        assert_eq!(parsed.reaction.min_delay_ms, 1_500);
        assert_eq!(parsed.reaction.max_delay_ms, 3_000);
        assert_eq!(parsed.pattern.tile_count, 4);
        assert_eq!(parsed.tick_ms, 50);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("pattern.tile_count").as_deref(), Some("4"));
        assert_eq!(cfg.get("reaction.min_delay_ms").as_deref(), Some("1500"));
        assert!(cfg.get("pattern.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_updates_nested_number() {
        let mut cfg = Config::default();
        cfg.set("color_tap.round_secs", "30").unwrap();
        assert_eq!(cfg.color_tap.round_secs, 30);
    }

    #[test]
    fn set_accepts_json_for_arrays() {
        let mut cfg = Config::default();
        cfg.set(
            "breathing.phases",
            r#"[{"label":"In","duration_ms":4000},{"label":"Out","duration_ms":4000}]"#,
        )
        .unwrap();
        assert_eq!(cfg.breathing.phases.len(), 2);
        assert_eq!(cfg.breathing.phases[1].label, "Out");
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        let err = cfg.set("pattern.nonexistent_key", "1").unwrap_err();
        assert!(matches!(err, CoreError::Config(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn set_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.set("pattern.tile_count", "four").is_err());
        assert_eq!(cfg.pattern.tile_count, 4);
    }

    #[test]
    fn set_rejects_values_that_fail_validation() {
        let mut cfg = Config::default();
        assert!(cfg.set("reaction.max_delay_ms", "1000").is_err());
        assert_eq!(cfg.reaction.max_delay_ms, 5_000);
    }

    #[test]
    fn custom_stretches_extend_catalog() {
        let mut cfg = Config::default();
        cfg.stretch
            .custom
            .push(Stretch::new("Ankle Circles", 10, &["Lift a foot", "Circle it"]));
        assert_eq!(cfg.stretch_catalog().unwrap().len(), 7);
        cfg.validate().unwrap();
    }
}

//! Configuration for Mind operations.

use std::path::PathBuf;

use directories::ProjectDirs;
use mind_core::Identity;
use serde::{Deserialize, Serialize};

use crate::error::{MindError, MindResult};

/// Highest Deflate level; mind-files are always written at maximum compression by default.
pub const MAX_COMPRESSION_LEVEL: i64 = 9;

/// Lowest Deflate level the archive writer accepts.
pub const MIN_COMPRESSION_LEVEL: i64 = 1;

/// Configuration for Mind operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Default owner identity (`"Name <email>"` or a bare name).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    /// Deflate level used when exporting mind-files (1-9).
    #[serde(default = "default_compression_level")]
    pub compression_level: i64,

    /// Parent directory for ephemeral extractions. System temp dir when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<PathBuf>,
}

fn default_compression_level() -> i64 {
    MAX_COMPRESSION_LEVEL
}

impl Default for Config {
    fn default() -> Self {
        Self {
            owner: None,
            compression_level: default_compression_level(),
            scratch_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from disk with environment overrides.
    pub fn load() -> MindResult<Self> {
        let config: Self = match Self::config_file_path() {
            Some(path) if path.exists() => {
                let contents = std::fs::read_to_string(&path)?;
                serde_json::from_str(&contents)?
            }
            _ => Self::default(),
        };
        check_level(config.compression_level)?;

        config.with_env_overrides()
    }

    /// Apply `MIND_OWNER`, `MIND_COMPRESSION_LEVEL` and `MIND_SCRATCH_DIR`.
    pub fn with_env_overrides(self) -> MindResult<Self> {
        let compression_level = match std::env::var("MIND_COMPRESSION_LEVEL") {
            Ok(level) => parse_level(&level)?,
            Err(_) => self.compression_level,
        };

        Ok(Self {
            owner: std::env::var("MIND_OWNER").ok().or(self.owner),
            compression_level,
            scratch_dir: std::env::var("MIND_SCRATCH_DIR")
                .ok()
                .map(PathBuf::from)
                .or(self.scratch_dir),
        })
    }

    /// Save configuration to disk.
    pub fn save(&self) -> MindResult<()> {
        if let Some(path) = Self::config_file_path() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let contents = serde_json::to_string_pretty(self)?;
            std::fs::write(&path, contents)?;
        }
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// `MIND_CONFIG_FILE` takes precedence over the platform config directory.
    pub fn config_file_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("MIND_CONFIG_FILE") {
            return Some(PathBuf::from(path));
        }
        ProjectDirs::from("dev", "mind", "mind").map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// The configured owner as an identity.
    pub fn owner_identity(&self) -> MindResult<Identity> {
        let owner = self.owner.as_deref().ok_or_else(|| {
            MindError::Config(
                "no owner configured. Set MIND_OWNER, pass --owner or run `mind config set owner <name>`"
                    .to_string(),
            )
        })?;
        owner
            .parse()
            .map_err(|e| MindError::Config(format!("invalid owner '{owner}': {e}")))
    }

    /// Get a configuration value by key.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "owner" => self.owner.clone(),
            "compression_level" => Some(self.compression_level.to_string()),
            "scratch_dir" => self.scratch_dir.as_ref().map(|p| p.display().to_string()),
            _ => None,
        }
    }

    /// Set a configuration value by key.
    pub fn set(&mut self, key: &str, value: &str) -> MindResult<()> {
        match key {
            "owner" => {
                value
                    .parse::<Identity>()
                    .map_err(|e| MindError::Config(format!("invalid owner '{value}': {e}")))?;
                self.owner = Some(value.to_string());
            }
            "compression_level" => {
                self.compression_level = parse_level(value)?;
            }
            "scratch_dir" => {
                self.scratch_dir = Some(PathBuf::from(value));
            }
            _ => {
                return Err(MindError::Config(format!("Unknown config key: {}", key)));
            }
        }
        Ok(())
    }
}

fn parse_level(value: &str) -> MindResult<i64> {
    let level: i64 = value
        .trim()
        .parse()
        .map_err(|_| MindError::Config(format!("Invalid number: {}", value)))?;
    check_level(level)
}

fn check_level(level: i64) -> MindResult<i64> {
    if !(MIN_COMPRESSION_LEVEL..=MAX_COMPRESSION_LEVEL).contains(&level) {
        return Err(MindError::Config(format!(
            "compression_level must be between {MIN_COMPRESSION_LEVEL} and {MAX_COMPRESSION_LEVEL}, got {level}"
        )));
    }
    Ok(level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_use_maximum_compression() {
        let config = Config::default();
        assert_eq!(config.compression_level, MAX_COMPRESSION_LEVEL);
        assert!(config.owner.is_none());
    }

    #[test]
    fn test_set_and_get() {
        let mut config = Config::default();
        config.set("owner", "Ada <ada@example.com>").unwrap();
        config.set("compression_level", "6").unwrap();
        config.set("scratch_dir", "/tmp/minds").unwrap();

        assert_eq!(config.get("owner").as_deref(), Some("Ada <ada@example.com>"));
        assert_eq!(config.get("compression_level").as_deref(), Some("6"));
        assert_eq!(config.get("scratch_dir").as_deref(), Some("/tmp/minds"));
        assert_eq!(config.get("nope"), None);

        let owner = config.owner_identity().unwrap();
        assert_eq!(owner.email, "ada@example.com");
    }

    #[test]
    fn test_set_rejects_invalid_values() {
        let mut config = Config::default();
        assert!(matches!(
            config.set("compression_level", "12"),
            Err(MindError::Config(_))
        ));
        assert!(matches!(
            config.set("compression_level", "0"),
            Err(MindError::Config(_))
        ));
        assert!(matches!(
            config.set("compression_level", "max"),
            Err(MindError::Config(_))
        ));
        assert!(matches!(config.set("owner", ""), Err(MindError::Config(_))));
        assert!(matches!(config.set("colour", "blue"), Err(MindError::Config(_))));
    }

    #[test]
    fn test_lowest_level_is_accepted() {
        let mut config = Config::default();
        config
            .set("compression_level", &MIN_COMPRESSION_LEVEL.to_string())
            .unwrap();
        assert_eq!(config.compression_level, MIN_COMPRESSION_LEVEL);
    }

    #[test]
    fn test_missing_owner_is_a_config_error() {
        assert!(matches!(
            Config::default().owner_identity(),
            Err(MindError::Config(_))
        ));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{ "owner": "TC-J" }"#).unwrap();
        assert_eq!(config.owner.as_deref(), Some("TC-J"));
        assert_eq!(config.compression_level, MAX_COMPRESSION_LEVEL);
        assert_eq!(config.scratch_dir, None);
    }
}

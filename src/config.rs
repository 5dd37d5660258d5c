use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::ai::AiConfig;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

fn default_decay_interval() -> u64 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip)]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub ai: AiConfig,
    /// Seconds between mascot decay ticks while a long-running command is open
    #[serde(default = "default_decay_interval")]
    pub mascot_decay_interval_secs: u64,
}

impl Config {
    pub fn new(data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("declutter")
        });

        std::fs::create_dir_all(&data_dir).context("Failed to create data directory")?;

        let config_path = data_dir.join("config.json");
        if config_path.exists() {
            let config_str =
                std::fs::read_to_string(&config_path).context("Failed to read config.json")?;

            if config_str.trim().is_empty() {
                tracing::warn!("Config file is empty, recreating with defaults");
            } else {
                match serde_json::from_str::<Config>(&config_str) {
                    Ok(mut config) => {
                        config.data_dir = data_dir;
                        apply_env_key(&mut config.ai, std::env::var(API_KEY_ENV).ok());
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config.json ({}), recreating with defaults", e);
                    }
                }
            }
        }

        let mut config = Self::default_config(data_dir);
        config.save()?;
        apply_env_key(&mut config.ai, std::env::var(API_KEY_ENV).ok());
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let json_str =
            serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(self.config_file(), json_str).context("Failed to write config.json")?;
        Ok(())
    }

    fn default_config(data_dir: PathBuf) -> Self {
        Config {
            data_dir,
            ai: AiConfig::default(),
            mascot_decay_interval_secs: default_decay_interval(),
        }
    }

    pub fn config_file(&self) -> PathBuf {
        self.data_dir.join("config.json")
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.data_dir.join("storage")
    }

    /// AI settings with the key saved in app storage taking precedence
    pub fn ai_config_with_key(&self, stored_key: Option<&str>) -> AiConfig {
        let mut ai = self.ai.clone();
        if let Some(key) = stored_key.map(str::trim).filter(|k| !k.is_empty()) {
            ai.api_key = Some(key.to_string());
        }
        ai
    }
}

/// Fill an empty key from the environment
fn apply_env_key(ai: &mut AiConfig, env_key: Option<String>) {
    if ai.has_api_key() {
        return;
    }
    if let Some(key) = env_key.filter(|k| !k.trim().is_empty()) {
        ai.api_key = Some(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_creates_default_config() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("declutter");
        let config = Config::new(Some(dir.clone())).unwrap();

        assert!(dir.join("config.json").exists());
        assert_eq!(config.ai.model, crate::ai::client::DEFAULT_MODEL);
        assert_eq!(config.mascot_decay_interval_secs, 60);
        assert_eq!(config.storage_dir(), dir.join("storage"));
    }

    #[test]
    fn test_loads_existing_config() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("config.json"),
            r#"{"ai": {"model": "gemini-2.0-flash", "api_key": null, "temperature": 0.2}}"#,
        )
        .unwrap();

        let config = Config::new(Some(temp.path().to_path_buf())).unwrap();
        assert_eq!(config.ai.model, "gemini-2.0-flash");
        assert_eq!(config.ai.temperature, 0.2);
        assert_eq!(config.ai.max_output_tokens, 2048);
    }

    #[test]
    fn test_broken_config_is_replaced() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("config.json"), "{ not json").unwrap();

        let config = Config::new(Some(temp.path().to_path_buf())).unwrap();
        assert_eq!(config.ai.base_url, crate::ai::client::DEFAULT_BASE_URL);

        let saved = std::fs::read_to_string(temp.path().join("config.json")).unwrap();
        assert!(serde_json::from_str::<Config>(&saved).is_ok());
    }

    #[test]
    fn test_env_key_only_fills_empty() {
        let mut ai = AiConfig::default();
        apply_env_key(&mut ai, Some("from-env".to_string()));
        assert_eq!(ai.api_key.as_deref(), Some("from-env"));

        apply_env_key(&mut ai, Some("other".to_string()));
        assert_eq!(ai.api_key.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_stored_key_takes_precedence() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::new(Some(temp.path().to_path_buf())).unwrap();
        config.ai.api_key = Some("config-key".to_string());

        assert_eq!(config.ai_config_with_key(Some("stored")).api_key.as_deref(), Some("stored"));
        assert_eq!(config.ai_config_with_key(Some("  ")).api_key.as_deref(), Some("config-key"));
        assert_eq!(config.ai_config_with_key(None).api_key.as_deref(), Some("config-key"));
    }
}

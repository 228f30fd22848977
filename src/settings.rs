use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ExpandError;
use crate::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

/// Persisted user settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub theme: Theme,
    pub api_base_url: String,
    pub model: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            theme: Theme::Dark,
            api_base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl AppConfig {
    /// `<config dir>/ImageExpander/config.json`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ImageExpander")
            .join("config.json")
    }

    pub fn load(path: &Path) -> Result<Self, ExpandError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Falls back to defaults when the file is missing or broken.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::info!("ℹ️ Config file does not exist at: {:?}", path);
            return Self::default();
        }

        match Self::load(path) {
            Ok(config) => {
                log::info!("✅ Successfully loaded config from {:?}", path);
                config
            }
            Err(e) => {
                log::error!("❌ Failed to load config: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ExpandError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("💾 Saved config to {:?}", path);
        Ok(())
    }

    /// Stores the key, or forgets it when `key` is blank.
    pub fn set_api_key(&mut self, key: &str) {
        let key = key.trim();
        self.api_key = if key.is_empty() {
            None
        } else {
            Some(key.to_string())
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("image-expander-{}", uuid::Uuid::new_v4()))
            .join("config.json")
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_config_path();
        let mut config = AppConfig::default();
        config.set_api_key("  secret-key ");
        config.theme = Theme::Light;

        config.save(&path).unwrap();
        let loaded = AppConfig::load(&path).unwrap();

        assert_eq!(loaded, config);
        assert_eq!(loaded.api_key.as_deref(), Some("secret-key"));
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = AppConfig::load_or_default(&temp_config_path());
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_broken_file_gives_defaults() {
        let path = temp_config_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(AppConfig::load(&path), Err(ExpandError::Settings(_))));
        assert_eq!(AppConfig::load_or_default(&path), AppConfig::default());
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let path = temp_config_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{ "theme": "light" }"#).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.theme, Theme::Light);
        assert_eq!(config.api_base_url, DEFAULT_BASE_URL);
        assert!(config.api_key.is_none());
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_blank_key_removes_it() {
        let mut config = AppConfig::default();
        config.set_api_key("abc");
        config.set_api_key("   ");
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_theme_toggle() {
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
    }
}

//! Configuration management

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Environment variable that overrides the stored API key
pub const API_KEY_ENV: &str = "TMDB_API_KEY";

const APP_DIR: &str = "movie_finder";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub include_adult: bool,
    #[serde(default = "default_poster_size")]
    pub poster_size: String,
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_true")]
    pub dark_mode: bool,
    /// Key from the environment; used but never written back
    #[serde(skip)]
    pub env_api_key: Option<String>,
}

fn default_language() -> String { "en-US".to_string() }
fn default_poster_size() -> String { "w500".to_string() }
fn default_timeout() -> u64 { 30 }
fn default_true() -> bool { true }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            language: default_language(),
            include_adult: false,
            poster_size: default_poster_size(),
            request_timeout_secs: default_timeout(),
            dark_mode: true,
            env_api_key: None,
        }
    }
}

/// Per-user data directory, e.g. `~/.config/movie_finder`
pub fn app_dir() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path
}

impl AppConfig {
    fn config_path() -> PathBuf {
        app_dir().join("config.json")
    }

    pub fn load() -> Self {
        let mut config = Self::load_from(&Self::config_path());
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            config.apply_env_key(&key);
        }
        config
    }

    /// Read a config file, falling back to defaults when absent or malformed
    pub fn load_from(path: &std::path::Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!("Ignoring malformed config {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    fn apply_env_key(&mut self, key: &str) {
        let key = key.trim();
        self.env_api_key = (!key.is_empty()).then(|| key.to_string());
    }

    /// The key requests should use: environment first, then the stored one
    pub fn effective_api_key(&self) -> &str {
        self.env_api_key.as_deref().unwrap_or(self.api_key.trim())
    }

    pub fn has_api_key(&self) -> bool {
        !self.effective_api_key().is_empty()
    }

    pub fn save(&self) {
        self.save_to(&Self::config_path());
    }

    pub fn save_to(&self, path: &std::path::Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).ok();
        }
        match serde_json::to_string_pretty(self) {
            Ok(content) => {
                if let Err(e) = fs::write(path, content) {
                    log::warn!("Failed to save config to {}: {}", path.display(), e);
                }
            }
            Err(e) => log::warn!("Failed to serialize config: {}", e),
        }
    }
}

/// Settings dialog edits, applied to the config only on save
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsDraft {
    pub api_key: String,
    pub language: String,
    pub include_adult: bool,
}

impl SettingsDraft {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            language: config.language.clone(),
            include_adult: config.include_adult,
        }
    }

    pub fn apply_to(&self, config: &mut AppConfig) {
        config.api_key = self.api_key.trim().to_string();
        let language = self.language.trim();
        if !language.is_empty() {
            config.language = language.to_string();
        }
        config.include_adult = self.include_adult;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("config.json"));
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.language, "en-US");
        assert_eq!(config.poster_size, "w500");
        assert!(!config.has_api_key());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"api_key": "abc123", "dark_mode": false}"#).unwrap();

        let config = AppConfig::load_from(&path);
        assert_eq!(config.api_key, "abc123");
        assert!(!config.dark_mode);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert_eq!(AppConfig::load_from(&path), AppConfig::default());
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = AppConfig { api_key: "k".to_string(), ..AppConfig::default() };
        config.save_to(&path);
        assert_eq!(AppConfig::load_from(&path), config);
    }

    #[test]
    fn test_env_key_overrides_unless_blank() {
        let mut config = AppConfig { api_key: "stored".to_string(), ..AppConfig::default() };
        config.apply_env_key("   ");
        assert_eq!(config.effective_api_key(), "stored");
        config.apply_env_key(" from-env ");
        assert_eq!(config.effective_api_key(), "from-env");
        assert_eq!(config.api_key, "stored");
    }

    #[test]
    fn test_settings_draft_applies_only_on_save() {
        let mut config = AppConfig::default();
        let mut draft = SettingsDraft::from_config(&config);
        draft.include_adult = true;
        draft.api_key = "  new-key ".to_string();
        draft.language = "   ".to_string();
        assert!(!config.include_adult);
        assert_eq!(config.api_key, "");

        draft.apply_to(&mut config);
        assert!(config.include_adult);
        assert_eq!(config.api_key, "new-key");
        assert_eq!(config.language, "en-US");
    }

    #[test]
    fn test_env_key_is_never_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = AppConfig::load_from(&path);
        config.apply_env_key("secret-from-env");
        assert!(config.has_api_key());

        config.save_to(&path);
        let content = fs::read_to_string(&path).unwrap();
        assert!(!content.contains("secret-from-env"));

        let reloaded = AppConfig::load_from(&path);
        assert_eq!(reloaded.api_key, "");
        assert!(!reloaded.has_api_key());
    }
}

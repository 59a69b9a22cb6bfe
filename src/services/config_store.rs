// Configuration Storage Service
// Handles config file read/write and version backup

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::humanize::{DEFAULT_EDUCATION_LEVEL, DEFAULT_MAX_INPUT_CHARS};

const MAX_BACKUPS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub version: String,
    pub default_provider: Option<String>,
    pub proxy: Option<ProxyConfig>,
    #[serde(default)]
    pub humanizer: HumanizerConfig,
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    #[serde(default)]
    pub api_keys: HashMap<String, String>,
}

impl AppConfig {
    /// Proxy URL to use for provider calls, if enabled.
    pub fn proxy_url(&self) -> Option<String> {
        self.proxy
            .as_ref()
            .filter(|p| p.enabled)
            .and_then(|p| p.https.clone().or_else(|| p.http.clone()))
            .filter(|u| !u.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfig {
    pub enabled: bool,
    pub http: Option<String>,
    pub https: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanizerConfig {
    #[serde(default = "default_pipeline")]
    pub pipeline: String,
    #[serde(default = "default_education_level")]
    pub education_level: String,
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
    /// Overrides the preset's humanization pass count.
    #[serde(default)]
    pub stage2_passes: Option<u32>,
}

impl Default for HumanizerConfig {
    fn default() -> Self {
        Self {
            pipeline: default_pipeline(),
            education_level: default_education_level(),
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            stage2_passes: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    pub enabled: bool,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

fn default_pipeline() -> String { "comprehensive".to_string() }
fn default_education_level() -> String { DEFAULT_EDUCATION_LEVEL.to_string() }
fn default_max_input_chars() -> usize { DEFAULT_MAX_INPUT_CHARS }

pub struct ConfigStore {
    config_dir: PathBuf,
    config_file: PathBuf,
}

impl ConfigStore {
    pub fn new(config_dir: PathBuf) -> Self {
        let config_file = config_dir.join("config.json");
        Self { config_dir, config_file }
    }

    /// Get default config directory
    pub fn default_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("rehumanizer"))
    }

    /// Store at the default location, if the platform has one
    pub fn open_default() -> Option<Self> {
        Self::default_config_dir().map(Self::new)
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Ensure config directory exists
    pub fn ensure_dir(&self) -> Result<(), String> {
        fs::create_dir_all(&self.config_dir)
            .map_err(|e| format!("Failed to create config dir: {}", e))
    }

    /// Load configuration from file
    pub fn load(&self) -> Result<AppConfig, String> {
        if !self.config_file.exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_file)
            .map_err(|e| format!("Failed to read config: {}", e))?;

        serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config: {}", e))
    }

    /// Save configuration to file
    pub fn save(&self, config: &AppConfig) -> Result<(), String> {
        self.ensure_dir()?;

        if self.config_file.exists() {
            self.create_backup()?;
        }

        let content = serde_json::to_string_pretty(config)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        fs::write(&self.config_file, content)
            .map_err(|e| format!("Failed to write config: {}", e))
    }

    fn backup_dir(&self) -> PathBuf {
        self.config_dir.join("backups")
    }

    /// Copy the current config into `backups/` with a timestamped name
    fn create_backup(&self) -> Result<(), String> {
        let backup_dir = self.backup_dir();
        fs::create_dir_all(&backup_dir)
            .map_err(|e| format!("Failed to create backup dir: {}", e))?;

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S%.3f");
        let backup_file = backup_dir.join(format!("config_{}.json", timestamp));

        fs::copy(&self.config_file, &backup_file)
            .map_err(|e| format!("Failed to create backup: {}", e))?;

        self.cleanup_old_backups(&backup_dir, MAX_BACKUPS)
    }

    /// Remove old backups, keeping only the most recent N
    fn cleanup_old_backups(&self, backup_dir: &Path, keep: usize) -> Result<(), String> {
        let mut entries: Vec<_> = fs::read_dir(backup_dir)
            .map_err(|e| format!("Failed to read backup dir: {}", e))?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map_or(false, |ext| ext == "json"))
            .collect();

        if entries.len() <= keep {
            return Ok(());
        }

        // Oldest first; names sort by timestamp when mtimes tie
        entries.sort_by_key(|e| {
            (
                e.metadata()
                    .and_then(|m| m.modified())
                    .unwrap_or(std::time::SystemTime::UNIX_EPOCH),
                e.file_name(),
            )
        });

        let remove_count = entries.len() - keep;
        for entry in entries.iter().take(remove_count) {
            let _ = fs::remove_file(entry.path());
        }

        Ok(())
    }

    /// Get provider API key from config file
    pub fn get_api_key(&self, provider: &str) -> Result<Option<String>, String> {
        let config = self.load()?;
        Ok(config.api_keys.get(provider).cloned())
    }

    /// Store provider API key in config file
    pub fn set_api_key(&self, provider: &str, key: &str) -> Result<(), String> {
        let mut config = self.load()?;
        config.api_keys.insert(provider.to_string(), key.to_string());
        self.save(&config)
    }

    /// Delete provider API key from config file
    pub fn delete_api_key(&self, provider: &str) -> Result<(), String> {
        let mut config = self.load()?;
        config.api_keys.remove(provider);
        self.save(&config)
    }

    /// Get provider base URL from config file
    pub fn get_provider_url(&self, provider: &str) -> Result<Option<String>, String> {
        let config = self.load()?;
        Ok(config.providers.get(provider).and_then(|p| p.base_url.clone()))
    }

    /// Set provider base URL in config file
    pub fn set_provider_url(&self, provider: &str, url: &str) -> Result<(), String> {
        let mut config = self.load()?;
        let provider_config = config.providers.entry(provider.to_string()).or_default();
        provider_config.base_url = Some(url.to_string());
        self.save(&config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (ConfigStore, PathBuf) {
        let dir = std::env::temp_dir().join(format!("rehumanizer_test_{}", uuid::Uuid::new_v4()));
        (ConfigStore::new(dir.clone()), dir)
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.humanizer.pipeline, "comprehensive");
        assert_eq!(config.humanizer.education_level, "undergraduate");
        assert_eq!(config.humanizer.max_input_chars, 10_000);
        assert!(config.humanizer.stage2_passes.is_none());
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig {
            version: "1.0.0".to_string(),
            default_provider: Some("gemini".to_string()),
            proxy: None,
            humanizer: HumanizerConfig::default(),
            providers: HashMap::new(),
            api_keys: HashMap::new(),
        };

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"defaultProvider\""));
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.version, "1.0.0");
        assert_eq!(parsed.default_provider.as_deref(), Some("gemini"));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{"humanizer": {"pipeline": "quick"}}"#).unwrap();
        assert_eq!(parsed.humanizer.pipeline, "quick");
        assert_eq!(parsed.humanizer.education_level, "undergraduate");
        assert_eq!(parsed.humanizer.max_input_chars, 10_000);
    }

    #[test]
    fn test_proxy_url() {
        let mut config = AppConfig::default();
        assert!(config.proxy_url().is_none());
        config.proxy = Some(ProxyConfig {
            enabled: false,
            http: Some("http://127.0.0.1:8080".to_string()),
            https: None,
        });
        assert!(config.proxy_url().is_none());
        if let Some(p) = config.proxy.as_mut() {
            p.enabled = true;
        }
        assert_eq!(config.proxy_url().as_deref(), Some("http://127.0.0.1:8080"));
    }

    #[test]
    fn test_missing_file_loads_default() {
        let (store, _dir) = temp_store();
        let config = store.load().unwrap();
        assert!(config.api_keys.is_empty());
    }

    #[test]
    fn test_api_key_and_url_roundtrip_with_backup() {
        let (store, dir) = temp_store();

        store.set_api_key("gemini", "k-123").unwrap();
        assert_eq!(store.get_api_key("gemini").unwrap().as_deref(), Some("k-123"));

        store.set_provider_url("gemini", "https://proxy.example/v1beta").unwrap();
        assert_eq!(
            store.get_provider_url("gemini").unwrap().as_deref(),
            Some("https://proxy.example/v1beta")
        );

        store.delete_api_key("gemini").unwrap();
        assert!(store.get_api_key("gemini").unwrap().is_none());

        let backups = fs::read_dir(dir.join("backups")).unwrap().count();
        assert!(backups >= 1 && backups <= MAX_BACKUPS);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_backups_are_capped() {
        let (store, dir) = temp_store();
        let backup_dir = dir.join("backups");
        fs::create_dir_all(&backup_dir).unwrap();
        for i in 0..(MAX_BACKUPS + 3) {
            fs::write(backup_dir.join(format!("config_old_{:02}.json", i)), "{}").unwrap();
        }

        store.cleanup_old_backups(&backup_dir, MAX_BACKUPS).unwrap();
        assert_eq!(fs::read_dir(&backup_dir).unwrap().count(), MAX_BACKUPS);

        let _ = fs::remove_dir_all(&dir);
    }
}

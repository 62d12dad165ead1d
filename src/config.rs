use color_eyre::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Environment variable consulted when `gemini.api_key` is left empty
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Gemini API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

/// Document store location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Empty means `./data`
    #[serde(default)]
    pub data_dir: String,
    pub namespace: String,
    pub database: String,
}

/// Admin assistant behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// How many previous turns are replayed into each prompt
    pub history_turns: usize,
    /// Mirror every chat turn into `ai_chat_logs`
    pub log_chats: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-2.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: String::new(),
            namespace: "ecm".to_string(),
            database: "agency".to_string(),
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            history_turns: 10,
            log_chats: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl GeminiConfig {
    /// Returns the configured key, falling back to the environment
    pub fn resolve_api_key(&self) -> Result<String> {
        resolve_key(&self.api_key, std::env::var(GEMINI_API_KEY_ENV).ok())
    }
}

impl StorageConfig {
    /// Directory holding the RocksDB files
    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        if self.data_dir.trim().is_empty() {
            return Ok(std::env::current_dir()?.join("data"));
        }
        Ok(PathBuf::from(self.data_dir.trim()))
    }
}

fn resolve_key(configured: &str, from_env: Option<String>) -> Result<String> {
    if !configured.trim().is_empty() {
        return Ok(configured.trim().to_string());
    }
    from_env
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .ok_or_else(|| {
            color_eyre::eyre::eyre!(
                "Gemini API key not configured. Set gemini.api_key in {} or ${}",
                Config::config_path()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|_| "config.toml".to_string()),
                GEMINI_API_KEY_ENV
            )
        })
}

impl Config {
    /// Loads configuration from disk or creates default if not found
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = Config::default();
            config.save()?;
            return Ok(config);
        }

        let contents = fs::read_to_string(&config_path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Saves configuration to disk
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&config_path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Returns the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("pl", "ECM Digital", "ecm-desk")
            .ok_or_else(|| color_eyre::eyre::eyre!("Could not determine config directory"))?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }
}

//! Configuration loading, validation, and management for WOPR.
//!
//! Loads configuration from `~/.wopr/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use wopr_core::error::MemoryError;
use wopr_core::memory::{ProfileStore, UserProfile};
use wopr_core::persona::{Preset, SystemPromptContext};
use wopr_core::provider::{ChatOptions, ProviderConfig};

pub const CONFIG_FILE: &str = "config.toml";

/// The root configuration structure.
///
/// Maps directly to `~/.wopr/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Name the companion answers to
    #[serde(default = "default_persona_name")]
    pub persona_name: String,

    /// How the companion addresses the user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,

    /// Provider tag: "openai", "anthropic" or "gemini"
    #[serde(default = "default_provider")]
    pub ai_provider: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub ai_model: String,

    /// "retro" or "cozy"
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Ask for web-search augmentation where the model supports it
    #[serde(default)]
    pub web_search: bool,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_chat_max_tokens")]
    pub chat_max_tokens: u32,

    #[serde(default = "default_vision_max_tokens")]
    pub vision_max_tokens: u32,

    /// Where `brain/knowledge.md` lives (default: `~/.wopr`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_folder: Option<PathBuf>,

    /// Provider-specific overrides, keyed by provider tag
    #[serde(default)]
    pub providers: HashMap<String, ProviderSettings>,
}

fn default_persona_name() -> String {
    "Joshua".into()
}
fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_preset() -> String {
    "retro".into()
}
fn default_temperature() -> f32 {
    wopr_core::provider::DEFAULT_TEMPERATURE
}
fn default_chat_max_tokens() -> u32 {
    wopr_core::provider::DEFAULT_CHAT_MAX_TOKENS
}
fn default_vision_max_tokens() -> u32 {
    wopr_core::provider::DEFAULT_VISION_MAX_TOKENS
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("persona_name", &self.persona_name)
            .field("user_name", &self.user_name)
            .field("ai_provider", &self.ai_provider)
            .field("api_key", &redact(&self.api_key))
            .field("ai_model", &self.ai_model)
            .field("preset", &self.preset)
            .field("web_search", &self.web_search)
            .field("temperature", &self.temperature)
            .field("chat_max_tokens", &self.chat_max_tokens)
            .field("vision_max_tokens", &self.vision_max_tokens)
            .field("data_folder", &self.data_folder)
            .field("providers", &self.providers)
            .finish()
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Used when the top-level `api_key` is unset and this provider is active
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL override (proxies, test servers)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Vendor-specific API key variables, consulted after `WOPR_API_KEY`.
fn provider_key_var(provider: &str) -> Option<&'static str> {
    match provider.trim().to_ascii_lowercase().as_str() {
        "openai" => Some("OPENAI_API_KEY"),
        "anthropic" => Some("ANTHROPIC_API_KEY"),
        "gemini" => Some("GEMINI_API_KEY"),
        _ => None,
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.wopr/config.toml).
    ///
    /// Environment overrides:
    /// - `WOPR_PROVIDER`, `WOPR_MODEL`
    /// - `WOPR_API_KEY`, then the active provider's own variable
    ///   (`OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, `GEMINI_API_KEY`),
    ///   applied only when the file sets no key
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(provider) = non_empty("WOPR_PROVIDER") {
            self.ai_provider = provider;
        }

        if let Some(model) = non_empty("WOPR_MODEL") {
            self.ai_model = model;
        }

        if self.api_key.is_none() {
            self.api_key = non_empty("WOPR_API_KEY")
                .or_else(|| provider_key_var(&self.ai_provider).and_then(&non_empty));
        }
    }

    /// Write this configuration as TOML, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_error = |reason: String| ConfigError::WriteError {
            path: path.to_path_buf(),
            reason,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| write_error(e.to_string()))?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| write_error(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| write_error(e.to_string()))?;

        tracing::debug!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".wopr")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join(CONFIG_FILE)
    }

    /// Directory holding `brain/`: `data_folder` if set, else `~/.wopr`.
    pub fn data_dir(&self) -> PathBuf {
        self.data_folder.clone().unwrap_or_else(Self::config_dir)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.persona_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "persona_name must not be empty".into(),
            ));
        }

        if self.preset.parse::<Preset>().is_err() {
            return Err(ConfigError::ValidationError(format!(
                "preset must be \"retro\" or \"cozy\", got \"{}\"",
                self.preset
            )));
        }

        Ok(())
    }

    /// The key for the active provider: top-level `api_key`, else
    /// `[providers.<tag>] api_key`.
    pub fn resolved_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .or_else(|| {
                self.providers
                    .get(&self.ai_provider)
                    .and_then(|p| p.api_key.as_deref())
            })
            .filter(|k| !k.trim().is_empty())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.resolved_api_key().is_some()
    }

    /// Provider selection for the facade. A missing key becomes the empty
    /// string so the facade reports it.
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig::new(
            &self.ai_provider,
            self.resolved_api_key().unwrap_or_default(),
            &self.ai_model,
        )
    }

    pub fn chat_options(&self) -> ChatOptions {
        ChatOptions {
            web_search: self.web_search,
            max_tokens: self.chat_max_tokens,
            temperature: self.temperature,
            ..ChatOptions::default()
        }
    }

    pub fn vision_options(&self) -> ChatOptions {
        ChatOptions {
            max_tokens: self.vision_max_tokens,
            temperature: self.temperature,
            ..ChatOptions::vision()
        }
    }

    pub fn preset(&self) -> Preset {
        self.preset.parse().unwrap_or_default()
    }

    /// Prompt context with persona, user name and preset filled in.
    /// The user is "User" until a name is known.
    pub fn prompt_context(&self) -> SystemPromptContext {
        let user_name = self
            .user_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("User");
        SystemPromptContext::new(&self.persona_name, user_name).with_preset(self.preset())
    }

    /// Generate a default config TOML string (for `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            persona_name: default_persona_name(),
            user_name: None,
            ai_provider: default_provider(),
            api_key: None,
            ai_model: default_model(),
            preset: default_preset(),
            web_search: false,
            temperature: default_temperature(),
            chat_max_tokens: default_chat_max_tokens(),
            vision_max_tokens: default_vision_max_tokens(),
            data_folder: None,
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Failed to write config file at {path}: {reason}")]
    WriteError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for wopr_core::Error {
    fn from(e: ConfigError) -> Self {
        wopr_core::Error::Config {
            message: e.to_string(),
        }
    }
}

/// Persists the user's name into the config file.
///
/// Only `user_name` is rewritten; every other setting in the file is kept.
pub struct ConfigProfileStore {
    path: PathBuf,
}

impl ConfigProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for ConfigProfileStore {
    fn default() -> Self {
        Self::new(AppConfig::config_path())
    }
}

#[async_trait]
impl ProfileStore for ConfigProfileStore {
    async fn load_profile(&self) -> Result<UserProfile, MemoryError> {
        let path = self.path.clone();
        let config = tokio::task::spawn_blocking(move || AppConfig::load_from(&path))
            .await
            .map_err(|e| MemoryError::Profile(e.to_string()))?
            .map_err(|e| MemoryError::Profile(e.to_string()))?;
        Ok(UserProfile {
            user_name: config.user_name,
        })
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<(), MemoryError> {
        let path = self.path.clone();
        let user_name = profile.user_name.clone();
        tokio::task::spawn_blocking(move || {
            let mut config = AppConfig::load_from(&path)?;
            config.user_name = user_name;
            config.save_to(&path)
        })
        .await
        .map_err(|e| MemoryError::Profile(e.to_string()))?
        .map_err(|e| MemoryError::Profile(e.to_string()))
    }
}

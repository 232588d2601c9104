use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use sitebot_provider::{DEFAULT_MODEL, OPENROUTER_API_BASE};

/// Environment variable that overrides the configured API key.
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

fn default_api_base() -> String {
    OPENROUTER_API_BASE.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Application settings. The only required piece of configuration is the
/// API key, and even that is optional: without it the chatbot still scrapes
/// and answers canned intents, it just cannot call the language model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: default_api_base(),
            model: default_model(),
            server: ServerConfig::default(),
        }
    }
}

impl Settings {
    /// Parse settings from YAML.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw).context("parsing settings yaml")
    }

    /// Load settings from an optional YAML file, then apply the
    /// `OPENROUTER_API_KEY` environment override. A missing file is not an
    /// error; defaults apply.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) if path.exists() => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("reading settings file {}", path.display()))?;
                Self::from_yaml(&raw)
                    .with_context(|| format!("in settings file {}", path.display()))?
            }
            _ => Self::default(),
        };

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                settings.api_key = Some(key.trim().to_string());
            }
        }

        Ok(settings)
    }

    pub fn llm_enabled(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}

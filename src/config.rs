use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

use crate::pipeline::table::TableFormat;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub prompts: PromptsConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provider {
    #[serde(rename = "ollama")]
    Ollama,
    #[serde(rename = "openai")]
    OpenAI,
    #[serde(rename = "openai-compatible")]
    OpenAICompatible,
    #[serde(rename = "anthropic")]
    Anthropic,
}

impl Provider {
    pub fn as_str(&self) -> &str {
        match self {
            Provider::Ollama => "ollama",
            Provider::OpenAI => "openai",
            Provider::OpenAICompatible => "openai-compatible",
            Provider::Anthropic => "anthropic",
        }
    }

    /// Local providers run without a key; a missing env var is not fatal.
    pub fn key_optional(&self) -> bool {
        matches!(self, Provider::Ollama | Provider::OpenAICompatible)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Provider::Ollama),
            "openai" => Ok(Provider::OpenAI),
            "openai-compatible" | "openai_compatible" => Ok(Provider::OpenAICompatible),
            "anthropic" | "claude" => Ok(Provider::Anthropic),
            _ => bail!("Unknown LLM provider: {}", s),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub provider: Provider,
    pub model: String,
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// Endpoint root; provider default when unset
    #[serde(default)]
    pub base_url: Option<String>,

    /// Optional: Override max_tokens for LLM requests
    /// If not specified, uses provider-specific defaults:
    /// - ollama: unset (model decides)
    /// - openai / openai-compatible: 1024
    /// - anthropic: 1024
    #[serde(default)]
    pub max_tokens: Option<u32>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Context window requested from Ollama (`options.num_ctx`)
    #[serde(default = "default_num_ctx")]
    pub num_ctx: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_temperature() -> f32 {
    0.3
}

fn default_num_ctx() -> u32 {
    4096
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Ollama,
            model: "mistral:7b-instruct".to_string(),
            api_key_env: None,
            base_url: None,
            max_tokens: None,
            temperature: default_temperature(),
            num_ctx: default_num_ctx(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmConfig {
    /// Get max_tokens value, using provider-specific default if not specified
    pub fn get_max_tokens(&self) -> Option<u32> {
        if let Some(tokens) = self.max_tokens {
            return Some(tokens);
        }
        match self.provider {
            Provider::Ollama => None,
            Provider::OpenAI | Provider::OpenAICompatible | Provider::Anthropic => Some(1024),
        }
    }

    pub fn get_base_url(&self) -> String {
        if let Some(ref url) = self.base_url {
            return url.trim_end_matches('/').to_string();
        }
        match self.provider {
            Provider::Ollama => "http://localhost:11434",
            Provider::OpenAI => "https://api.openai.com/v1",
            Provider::OpenAICompatible => "http://localhost:11434/v1",
            Provider::Anthropic => "https://api.anthropic.com",
        }
        .to_string()
    }

    /// Resolve the API key from the environment variable named in config
    pub fn get_api_key(&self) -> Result<String> {
        match &self.api_key_env {
            Some(env_var) => {
                // Special case: "none" means no API key needed
                if env_var.eq_ignore_ascii_case("none") {
                    return Ok(String::new());
                }
                if self.provider.key_optional() {
                    return Ok(env::var(env_var).unwrap_or_default());
                }
                env::var(env_var).map_err(|_| {
                    anyhow::anyhow!("API key not found in environment variable: {}", env_var)
                })
            }
            None => Ok(String::new()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    #[serde(default)]
    pub format: TableFormat,

    /// File stem of the source-level table (extension follows `format`)
    #[serde(default = "default_sources_stem")]
    pub sources_stem: String,

    /// File stem of the long-format lightcurve table
    #[serde(default = "default_lightcurves_stem")]
    pub lightcurves_stem: String,

    /// Fail the build on the first invalid record instead of skipping it
    #[serde(default)]
    pub strict: bool,
}

fn default_sources_stem() -> String {
    "sources".to_string()
}

fn default_lightcurves_stem() -> String {
    "lightcurves".to_string()
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            format: TableFormat::default(),
            sources_stem: default_sources_stem(),
            lightcurves_stem: default_lightcurves_stem(),
            strict: false,
        }
    }
}

impl DatasetConfig {
    pub fn sources_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.{}", self.sources_stem, self.format.extension()))
    }

    pub fn lightcurves_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!(
            "{}.{}",
            self.lightcurves_stem,
            self.format.extension()
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptMode {
    #[default]
    Append,
    Overwrite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptsConfig {
    /// Transient classes the astronomer wants to hear about
    #[serde(default = "default_interests")]
    pub interests: Vec<String>,

    /// Classes the astronomer wants filtered out
    #[serde(default = "default_avoid")]
    pub avoid: Vec<String>,

    /// Custom system prompt text, appended to or replacing the default
    #[serde(default)]
    pub system_custom: Option<String>,

    #[serde(default)]
    pub system_mode: PromptMode,

    /// Extra instructions appended after the task list
    #[serde(default)]
    pub task_custom: Option<String>,
}

fn default_interests() -> Vec<String> {
    vec![
        "Supernovae".to_string(),
        "Kilonovae".to_string(),
        "Other extragalactic transients".to_string(),
    ]
}

fn default_avoid() -> Vec<String> {
    vec![
        "Galactic variable stars".to_string(),
        "Minor objects".to_string(),
        "Artifacts".to_string(),
    ]
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            interests: default_interests(),
            avoid: default_avoid(),
            system_custom: None,
            system_mode: PromptMode::Append,
            task_custom: None,
        }
    }
}

impl Config {
    /// Load config from the working directory or user config directory
    pub fn load() -> Result<Self> {
        Self::load_with_path(None)
    }

    /// Load configuration from a specific path, or use default search paths
    pub fn load_with_path(path: Option<String>) -> Result<Self> {
        // An explicit path must exist and parse
        if let Some(config_path) = path {
            debug!("Loading config from explicit path: {}", config_path);
            return Self::load_from_path(&config_path);
        }

        if Path::new("skyvet.toml").exists() {
            debug!("Loading config from ./skyvet.toml");
            return Self::load_from_path("skyvet.toml");
        }

        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("skyvet").join("config.toml");
            if config_path.exists() {
                debug!("Loading config from {:?}", config_path);
                return Self::load_from_path(&config_path);
            }
        }

        debug!("Using default config");
        Ok(Self::default())
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }
}

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Main harvest configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct HarvestConfig {
    /// Directory the recipe corpus is written to and scanned from
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Completion service settings
    #[serde(default)]
    pub provider: ProviderConfig,
}

/// Configuration for the completion service provider
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// Model identifier (e.g., "gpt-4o-mini")
    #[serde(default = "default_model")]
    pub model: String,
    /// API key for authentication (can also be set via OPENAI_API_KEY)
    pub api_key: Option<String>,
    /// Base URL for API endpoint (for custom or proxy endpoints)
    pub base_url: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Maximum characters of message text sent per request
    #[serde(default = "default_max_prompt_chars")]
    pub max_prompt_chars: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            base_url: None,
            timeout: default_timeout(),
            max_prompt_chars: default_max_prompt_chars(),
        }
    }
}

// Default value functions
fn default_output_dir() -> String {
    "recipes".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_prompt_chars() -> usize {
    6000
}

impl HarvestConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with HARVEST__ prefix
    /// 2. config.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: HARVEST__PROVIDER__MODEL
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            // Optional config file (can be missing)
            .add_source(File::with_name("config").required(false))
            // Use double underscore for nested: HARVEST__PROVIDER__API_KEY
            .add_source(
                Environment::with_prefix("HARVEST")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

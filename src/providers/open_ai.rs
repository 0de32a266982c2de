use crate::config::ProviderConfig;
use crate::error::HarvestError;
use crate::model::{Classification, RecipeCandidate};
use crate::providers::{
    CompletionService, ServiceError, CLASSIFIER_PROMPT, COMPLETION_PROMPT, EXTRACTION_PROMPT,
    MULTI_EXTRACTION_PROMPT,
};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

/// Environment variable holding the API credential.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

// Per-call generation limits. Classification is a short verdict, the
// multi-recipe extraction has to fit several candidates.
const CLASSIFY_MAX_TOKENS: u32 = 150;
const EXTRACT_MAX_TOKENS: u32 = 500;
const EXTRACT_ALL_MAX_TOKENS: u32 = 1200;
const COMPLETE_MAX_TOKENS: u32 = 700;

/// OpenAI-compatible chat-completions backend for [`CompletionService`].
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_prompt_chars: usize,
}

impl OpenAIProvider {
    /// Create a provider from configuration.
    ///
    /// The API key comes from the config file or the `OPENAI_API_KEY`
    /// environment variable; missing both is a startup error.
    pub fn new(config: &ProviderConfig) -> Result<Self, HarvestError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or(HarvestError::MissingCredential(API_KEY_ENV))?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| "https://api.openai.com".to_string());

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        Ok(OpenAIProvider {
            client,
            api_key,
            base_url,
            model: config.model.clone(),
            max_prompt_chars: config.max_prompt_chars,
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(api_key: String, base_url: String, model: String) -> Self {
        OpenAIProvider {
            client: Client::new(),
            api_key,
            base_url,
            model,
            max_prompt_chars: 6000,
        }
    }

    /// One chat-completions exchange; returns the completion content.
    async fn chat(
        &self,
        system_prompt: &str,
        text: &str,
        max_tokens: u32,
    ) -> Result<String, ServiceError> {
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({
                "model": self.model,
                "max_tokens": max_tokens,
                "messages": [
                    {"role": "system", "content": system_prompt},
                    {"role": "user", "content": truncate_chars(text, self.max_prompt_chars)}
                ]
            }))
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response.json().await?;
        debug!("completion response: {:?}", body);

        body["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ServiceError::Response("missing completion content".to_string()))
    }
}

#[async_trait]
impl CompletionService for OpenAIProvider {
    async fn classify(&self, text: &str) -> Result<Classification, ServiceError> {
        let content = self.chat(CLASSIFIER_PROMPT, text, CLASSIFY_MAX_TOKENS).await?;

        let parsed: Value = match serde_json::from_str(&content) {
            Ok(value) => value,
            // Not JSON: weak textual heuristic, no categories.
            Err(_) => {
                return Ok(Classification {
                    is_recipe: content.trim().to_lowercase().starts_with("recipe"),
                    categories: Vec::new(),
                })
            }
        };

        let raw_categories: Vec<String> = match &parsed["categories"] {
            Value::String(single) => vec![single.clone()],
            Value::Array(items) => items
                .iter()
                .filter_map(|item| item.as_str().map(String::from))
                .collect(),
            _ => Vec::new(),
        };
        let categories = raw_categories
            .iter()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect();

        Ok(Classification {
            is_recipe: parsed["is_recipe"].as_bool().unwrap_or(false),
            categories,
        })
    }

    async fn extract(&self, text: &str) -> Result<RecipeCandidate, ServiceError> {
        let content = self.chat(EXTRACTION_PROMPT, text, EXTRACT_MAX_TOKENS).await?;
        Ok(serde_json::from_str(&content).unwrap_or_default())
    }

    async fn extract_all(&self, text: &str) -> Result<Vec<RecipeCandidate>, ServiceError> {
        let content = self
            .chat(MULTI_EXTRACTION_PROMPT, text, EXTRACT_ALL_MAX_TOKENS)
            .await?;

        let parsed: Value = match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(_) => return Ok(Vec::new()),
        };

        let candidates = match parsed {
            // A single object counts as a one-element extraction.
            Value::Object(_) => vec![serde_json::from_value(parsed).unwrap_or_default()],
            // Unparseable elements stay as empty candidates so positional
            // indices remain stable.
            Value::Array(items) => items
                .into_iter()
                .map(|item| serde_json::from_value(item).unwrap_or_default())
                .collect(),
            _ => Vec::new(),
        };

        Ok(candidates)
    }

    async fn complete(&self, text: &str) -> Result<RecipeCandidate, ServiceError> {
        let content = self.chat(COMPLETION_PROMPT, text, COMPLETE_MAX_TOKENS).await?;
        Ok(serde_json::from_str(&content).unwrap_or_default())
    }
}

/// Truncate on a char boundary without copying when already short enough.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

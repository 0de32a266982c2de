mod open_ai;
mod prompt;

pub use open_ai::OpenAIProvider;
pub use prompt::{CLASSIFIER_PROMPT, COMPLETION_PROMPT, EXTRACTION_PROMPT, MULTI_EXTRACTION_PROMPT};

use crate::model::{Classification, RecipeCandidate};
use async_trait::async_trait;
use thiserror::Error;

/// A per-item failure talking to the completion service.
///
/// Malformed-but-received content never lands here: the provider degrades
/// gracefully on parse failures (heuristic classification, empty candidate
/// lists). This error means the exchange itself failed and the item should
/// be skipped and retried on a later run.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Request did not complete (connect, timeout, TLS, non-success body read)
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response arrived but did not carry completion content
    #[error("unexpected response shape: {0}")]
    Response(String),
}

/// Capability interface over the text-completion service.
///
/// Injected into the pipeline so tests can substitute a deterministic
/// implementation without a live network dependency.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Decide whether the text contains a recipe and which categories apply.
    async fn classify(&self, text: &str) -> Result<Classification, ServiceError>;

    /// Extract a single recipe candidate; an empty candidate when the
    /// response cannot be parsed.
    async fn extract(&self, text: &str) -> Result<RecipeCandidate, ServiceError>;

    /// Extract every distinct recipe in the text; an empty list when the
    /// response cannot be parsed.
    async fn extract_all(&self, text: &str) -> Result<Vec<RecipeCandidate>, ServiceError>;

    /// Repair pass: infer missing fields for an incomplete candidate from
    /// the original message text.
    async fn complete(&self, text: &str) -> Result<RecipeCandidate, ServiceError>;
}

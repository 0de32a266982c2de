use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A normalized chat message, ready for classification.
///
/// Produced by the sources module; immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMessage {
    pub id: String,
    pub thread_id: String,
    /// Creation time in seconds since the epoch
    pub created_at: f64,
    pub text: String,
}

/// Outcome of the recipe classifier. Not persisted on its own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub is_recipe: bool,
    /// Lowercase category tags (soup, meat, fish, ...)
    pub categories: Vec<String>,
}

/// A structured recipe extracted from message text, not yet accepted.
///
/// Every field is optional at this stage; empty strings and empty lists
/// mean "absent". Acceptance is decided by [`RecipeCandidate::is_complete`]
/// and, for repaired candidates, [`RecipeCandidate::meets_completion_target`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecipeCandidate {
    pub title: String,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub time: String,
    pub temperature: String,
    pub notes: String,
    pub image_ref: String,
}

impl RecipeCandidate {
    /// Minimum bar for a first-pass candidate: a title plus at least
    /// 2 ingredients and 2 steps.
    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && self.ingredients.len() >= 2 && self.steps.len() >= 2
    }

    /// Acceptance bar for completer output: a title plus at least
    /// 5 ingredients and 3 steps.
    pub fn meets_completion_target(&self) -> bool {
        !self.title.trim().is_empty() && self.ingredients.len() >= 5 && self.steps.len() >= 3
    }
}

// The completion service is free to omit fields or emit nulls; both are
// treated as absent rather than failing the whole candidate.
impl<'de> Deserialize<'de> for RecipeCandidate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Fields {
            #[serde(default)]
            title: Option<String>,
            #[serde(default)]
            ingredients: Option<Vec<String>>,
            #[serde(default)]
            steps: Option<Vec<String>>,
            #[serde(default)]
            time: Option<String>,
            #[serde(default)]
            temperature: Option<String>,
            #[serde(default)]
            notes: Option<String>,
            #[serde(default, alias = "image")]
            image_ref: Option<String>,
        }

        let fields = Fields::deserialize(deserializer)?;
        Ok(RecipeCandidate {
            title: fields.title.unwrap_or_default(),
            ingredients: fields.ingredients.unwrap_or_default(),
            steps: fields.steps.unwrap_or_default(),
            time: fields.time.unwrap_or_default(),
            temperature: fields.temperature.unwrap_or_default(),
            notes: fields.notes.unwrap_or_default(),
            image_ref: fields.image_ref.unwrap_or_default(),
        })
    }
}

/// The deduplication key for a persisted recipe: which message it came
/// from and its position within that message's extraction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecipeIdentity {
    pub message_id: String,
    pub index: u32,
}

impl RecipeIdentity {
    pub fn new(message_id: impl Into<String>, index: u32) -> Self {
        Self {
            message_id: message_id.into(),
            index,
        }
    }
}

impl fmt::Display for RecipeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.message_id, self.index)
    }
}

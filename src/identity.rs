//! The set of already-persisted recipe identities.

use crate::model::RecipeIdentity;
use crate::writer::parse_metadata_block;
use log::{debug, warn};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Append-only set of `(message_id, candidate_index)` pairs, the sole
/// shared state of a run. Loaded from the corpus once at startup, consulted
/// before any service call for a message and again before each candidate
/// is committed.
#[derive(Debug, Default)]
pub struct IdentityTracker {
    identities: HashSet<RecipeIdentity>,
    messages: HashSet<String>,
}

impl IdentityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan every persisted record under `corpus_dir`.
    ///
    /// Records predating multi-recipe support carry no index; they count
    /// as index 0. Unreadable or metadata-less files are skipped with a
    /// warning rather than failing the scan.
    pub fn load(corpus_dir: &Path) -> Self {
        let mut tracker = Self::new();
        for entry in WalkDir::new(corpus_dir)
            .into_iter()
            .filter_map(|entry| entry.ok())
        {
            if !entry.file_type().is_file()
                || entry.path().extension().and_then(|ext| ext.to_str()) != Some("md")
            {
                continue;
            }
            let text = match fs::read_to_string(entry.path()) {
                Ok(text) => text,
                Err(err) => {
                    warn!("skipping unreadable record {}: {err}", entry.path().display());
                    continue;
                }
            };
            let Some(fields) = parse_metadata_block(&text) else {
                warn!(
                    "skipping record without metadata block: {}",
                    entry.path().display()
                );
                continue;
            };
            let Some(message_id) = fields.get("source_message_id").filter(|id| !id.is_empty())
            else {
                continue;
            };
            let index = fields
                .get("source_recipe_index")
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(0);
            tracker.add(RecipeIdentity::new(message_id.clone(), index));
        }
        debug!(
            "identity scan of {}: {} identities",
            corpus_dir.display(),
            tracker.len()
        );
        tracker
    }

    pub fn contains(&self, identity: &RecipeIdentity) -> bool {
        self.identities.contains(identity)
    }

    /// Whether any candidate of this message has been accepted. Used to
    /// skip classification/extraction entirely for already-handled messages.
    pub fn contains_message(&self, message_id: &str) -> bool {
        self.messages.contains(message_id)
    }

    pub fn add(&mut self, identity: RecipeIdentity) {
        self.messages.insert(identity.message_id.clone());
        self.identities.insert(identity);
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

//! The extraction-and-deduplication pipeline.
//!
//! For each raw message: classify, extract candidates, then per candidate
//! check identity, validate completeness, repair if needed, and persist.
//! No per-item failure terminates the batch; items that fail leave no
//! identity behind and are retried on the next run.

use crate::identity::IdentityTracker;
use crate::model::{RawMessage, RecipeIdentity};
use crate::providers::CompletionService;
use crate::writer::{RecipeRecord, RecipeWriter, WriteOutcome};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};

/// Final tally of one run.
#[derive(Debug, Default, PartialEq)]
pub struct RunSummary {
    /// Messages that went through classification this run
    pub scanned: usize,
    /// Recipe files created this run
    pub written: usize,
    /// Items dropped by per-item errors or failed validation
    pub skipped: usize,
}

/// Process every message sequentially, in the order given by the source
/// (ascending creation time within each thread).
pub async fn run(
    service: &dyn CompletionService,
    tracker: &mut IdentityTracker,
    writer: &RecipeWriter,
    messages: &[RawMessage],
) -> RunSummary {
    let mut summary = RunSummary::default();

    for message in messages {
        // Identity pre-check saves the classification and extraction calls
        // for messages already handled by an earlier run.
        if tracker.contains_message(&message.id) {
            debug!("[{}] already processed", message.id);
            continue;
        }
        summary.scanned += 1;

        let classification = match service.classify(&message.text).await {
            Ok(classification) => classification,
            Err(err) => {
                warn!("[{}] classification error: {err}", message.id);
                summary.skipped += 1;
                continue;
            }
        };
        if !classification.is_recipe {
            debug!("[{}] not a recipe", message.id);
            continue;
        }

        let candidates = match service.extract_all(&message.text).await {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!("[{}] extraction error: {err}", message.id);
                summary.skipped += 1;
                continue;
            }
        };
        if candidates.is_empty() {
            info!("[{}] no recipes found in message", message.id);
            continue;
        }

        let created = created_datetime(message.created_at);

        for (index, candidate) in candidates.into_iter().enumerate() {
            let identity = RecipeIdentity::new(message.id.clone(), index as u32);
            if tracker.contains(&identity) {
                continue;
            }

            let accepted = if candidate.is_complete() {
                candidate
            } else {
                // Repair pass; its output must clear the stricter bar.
                match service.complete(&message.text).await {
                    Ok(filled) if filled.meets_completion_target() => filled,
                    Ok(_) => {
                        info!("[{identity}] skipped: incomplete recipe after completion");
                        summary.skipped += 1;
                        continue;
                    }
                    Err(err) => {
                        warn!("[{identity}] completion error: {err}");
                        summary.skipped += 1;
                        continue;
                    }
                }
            };

            let record = RecipeRecord {
                candidate: accepted,
                categories: classification.categories.clone(),
                thread_id: message.thread_id.clone(),
                identity: identity.clone(),
                created,
            };

            // Identity is recorded only after a successful write or a
            // confirmed pre-existing path, so a crash mid-write self-heals.
            match writer.write(&record) {
                Ok(WriteOutcome::Written(path)) => {
                    tracker.add(identity.clone());
                    summary.written += 1;
                    info!("[{identity}] recipe saved to {}", path.display());
                }
                Ok(WriteOutcome::AlreadyExists(path)) => {
                    tracker.add(identity.clone());
                    debug!("[{identity}] already on disk at {}", path.display());
                }
                Err(err) => {
                    warn!("[{identity}] failed to write recipe: {err}");
                    summary.skipped += 1;
                }
            }
        }
    }

    summary
}

/// Epoch seconds to UTC, falling back to the epoch itself for timestamps
/// outside the representable range.
fn created_datetime(seconds: f64) -> DateTime<Utc> {
    DateTime::from_timestamp(seconds as i64, 0).unwrap_or_default()
}

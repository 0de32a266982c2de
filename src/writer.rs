//! Persisting accepted recipe candidates as metadata+body Markdown records.

use crate::error::HarvestError;
use crate::model::{RecipeCandidate, RecipeIdentity};
use crate::slug::slugify;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Slug used when a title transliterates to nothing.
const SLUG_PLACEHOLDER: &str = "recipe";

/// Everything needed to persist one accepted candidate.
#[derive(Debug, Clone)]
pub struct RecipeRecord {
    pub candidate: RecipeCandidate,
    pub categories: Vec<String>,
    pub thread_id: String,
    pub identity: RecipeIdentity,
    pub created: DateTime<Utc>,
}

/// Result of an idempotent write attempt.
#[derive(Debug, PartialEq)]
pub enum WriteOutcome {
    /// File was created at the given path
    Written(PathBuf),
    /// Path already existed; nothing was written
    AlreadyExists(PathBuf),
}

/// Writes records under `<out_dir>/<year>/<month>/<day>/<slug>[-<index>].md`.
pub struct RecipeWriter {
    out_dir: PathBuf,
}

impl RecipeWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Create the corpus root so the startup scan has something to walk.
    pub fn ensure_out_dir(&self) -> Result<(), HarvestError> {
        fs::create_dir_all(&self.out_dir).map_err(|source| HarvestError::OutputUnavailable {
            path: self.out_dir.clone(),
            source,
        })
    }

    /// Deterministic record path. The numeric suffix appears only for
    /// candidate indices past the first, disambiguating slug collisions
    /// within one multi-recipe message.
    pub fn build_path(&self, title: &str, created: &DateTime<Utc>, index: u32) -> PathBuf {
        let mut slug = slugify(title);
        if slug.is_empty() {
            slug = SLUG_PLACEHOLDER.to_string();
        }
        if index > 0 {
            slug = format!("{slug}-{index}");
        }
        self.out_dir
            .join(created.format("%Y/%m/%d").to_string())
            .join(format!("{slug}.md"))
    }

    /// Write the record unless its path already exists on disk.
    ///
    /// The existence check is a second idempotency gate, independent of the
    /// identity set, guarding against identity staleness or manually placed
    /// files. Existing files are never overwritten.
    pub fn write(&self, record: &RecipeRecord) -> io::Result<WriteOutcome> {
        let path = self.build_path(
            &record.candidate.title,
            &record.created,
            record.identity.index,
        );
        if path.exists() {
            return Ok(WriteOutcome::AlreadyExists(path));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, render_record(record))?;
        Ok(WriteOutcome::Written(path))
    }
}

/// Render the metadata block and human-readable body.
///
/// Empty fields are omitted from the metadata block entirely.
pub fn render_record(record: &RecipeRecord) -> String {
    let candidate = &record.candidate;
    let mut lines = Vec::new();

    lines.push(format!("title: {}", quote(&candidate.title)));
    lines.push(format!("date: {}", record.created.to_rfc3339()));

    let mut tags = vec!["recipe".to_string()];
    tags.extend(record.categories.iter().cloned());
    lines.push(format!("tags: [{}]", tags.join(", ")));
    if !record.categories.is_empty() {
        lines.push(format!("categories: [{}]", record.categories.join(", ")));
    }

    if !record.thread_id.is_empty() {
        lines.push(format!("source_thread: {}", quote(&record.thread_id)));
    }
    lines.push(format!(
        "source_message_id: {}",
        quote(&record.identity.message_id)
    ));
    if record.identity.index > 0 {
        lines.push(format!("source_recipe_index: {}", record.identity.index));
    }

    for (key, value) in [
        ("image", &candidate.image_ref),
        ("temperature", &candidate.temperature),
        ("time", &candidate.time),
        ("notes", &candidate.notes),
    ] {
        if !value.trim().is_empty() {
            lines.push(format!("{key}: {}", quote(value)));
        }
    }

    for (key, values) in [
        ("ingredients", &candidate.ingredients),
        ("steps", &candidate.steps),
    ] {
        if !values.is_empty() {
            let quoted: Vec<String> = values.iter().map(|v| quote(v)).collect();
            lines.push(format!("{key}: [{}]", quoted.join(", ")));
        }
    }

    let mut body = Vec::new();
    if !candidate.ingredients.is_empty() {
        let items: Vec<String> = candidate
            .ingredients
            .iter()
            .map(|item| format!("- {item}"))
            .collect();
        body.push(format!("## Ingredients\n{}", items.join("\n")));
    }
    if !candidate.steps.is_empty() {
        let items: Vec<String> = candidate
            .steps
            .iter()
            .enumerate()
            .map(|(i, step)| format!("{}. {step}", i + 1))
            .collect();
        body.push(format!("## Steps\n{}", items.join("\n")));
    }
    if !candidate.notes.trim().is_empty() {
        body.push(format!("## Notes\n{}", candidate.notes));
    }

    format!("---\n{}\n---\n\n{}\n", lines.join("\n"), body.join("\n\n"))
}

/// Parse the scalar lines of a record's metadata block.
///
/// Only what the identity scan needs: top-level `key: value` pairs with
/// quoted values unescaped. Records without a metadata block yield `None`.
pub fn parse_metadata_block(text: &str) -> Option<HashMap<String, String>> {
    let rest = text.strip_prefix("---\n")?;
    let end = rest.find("\n---")?;

    let mut fields = HashMap::new();
    for line in rest[..end].lines() {
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim();
            if key.is_empty() || key.starts_with('-') || key.starts_with('#') {
                continue;
            }
            fields.insert(key.to_string(), unquote(value.trim()));
        }
    }
    Some(fields)
}

/// Double-quote a scalar so the metadata block stays line-based no matter
/// what the completion service put in the field.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

fn unquote(value: &str) -> String {
    let inner = match value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
        Some(inner) => inner,
        None => return value.to_string(),
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some(escaped) => out.push(escaped),
                None => break,
            }
        } else {
            out.push(c);
        }
    }
    out
}

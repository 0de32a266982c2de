//! Loading raw messages from the fetch collaborator's on-disk documents.
//!
//! Two shapes are supported: a directory of per-thread JSON documents
//! (`{thread, messages: [...]}`) and a single conversations-export document
//! (an array of conversations, each with a `mapping` of nodes). Both are
//! flattened into [`RawMessage`] values with messages ordered by creation
//! time within their thread.

use crate::error::HarvestError;
use crate::model::RawMessage;
use log::debug;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Load messages from either input shape: a directory selects per-thread
/// documents, a file selects the export document.
pub fn load_messages(path: &Path) -> Result<Vec<RawMessage>, HarvestError> {
    if path.is_dir() {
        load_thread_dir(path)
    } else if path.is_file() {
        load_export_file(path)
    } else {
        Err(HarvestError::InputMissing(path.to_path_buf()))
    }
}

/// Load every `*.json` per-thread document under `dir`.
pub fn load_thread_dir(dir: &Path) -> Result<Vec<RawMessage>, HarvestError> {
    let mut paths: Vec<_> = fs::read_dir(dir)
        .map_err(|source| HarvestError::InputUnreadable {
            path: dir.to_path_buf(),
            source,
        })?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().and_then(|ext| ext.to_str()) == Some("json"))
        .collect();
    paths.sort();

    let mut messages = Vec::new();
    for path in paths {
        let raw = fs::read_to_string(&path).map_err(|source| HarvestError::InputUnreadable {
            path: path.clone(),
            source,
        })?;
        let fallback_thread_id = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut thread =
            parse_thread_document(&raw, &fallback_thread_id).map_err(|source| {
                HarvestError::InputMalformed {
                    path: path.clone(),
                    source,
                }
            })?;
        debug!("{}: {} usable messages", path.display(), thread.len());
        messages.append(&mut thread);
    }
    Ok(messages)
}

/// Load the single conversations-export document.
pub fn load_export_file(path: &Path) -> Result<Vec<RawMessage>, HarvestError> {
    let raw = fs::read_to_string(path).map_err(|source| HarvestError::InputUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    parse_export_document(&raw).map_err(|source| HarvestError::InputMalformed {
        path: path.to_path_buf(),
        source,
    })
}

// ---- per-thread documents -------------------------------------------------

#[derive(Deserialize)]
struct ThreadDocument {
    #[serde(default)]
    thread: ThreadInfo,
    #[serde(default)]
    messages: Vec<ThreadMessage>,
}

#[derive(Deserialize, Default)]
struct ThreadInfo {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Deserialize)]
struct ThreadMessage {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    created_at: Option<f64>,
    #[serde(default)]
    content: Option<MessageContent>,
}

fn parse_thread_document(
    raw: &str,
    fallback_thread_id: &str,
) -> Result<Vec<RawMessage>, serde_json::Error> {
    let document: ThreadDocument = serde_json::from_str(raw)?;
    let thread_id = document
        .thread
        .id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| fallback_thread_id.to_string());

    let mut messages: Vec<RawMessage> = document
        .messages
        .into_iter()
        .filter_map(|message| {
            let id = message.id.filter(|id| !id.is_empty())?;
            let text = message.content.as_ref().map(flatten_content).unwrap_or_default();
            if text.is_empty() {
                return None;
            }
            Some(RawMessage {
                id,
                thread_id: thread_id.clone(),
                created_at: message.created_at.unwrap_or(0.0),
                text,
            })
        })
        .collect();

    messages.sort_by(|a, b| a.created_at.total_cmp(&b.created_at));
    Ok(messages)
}

// ---- conversations export --------------------------------------------------

#[derive(Deserialize)]
struct Conversation {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    conversation_id: Option<String>,
    #[serde(default)]
    create_time: Option<f64>,
    #[serde(default)]
    mapping: HashMap<String, MappingNode>,
}

#[derive(Deserialize)]
struct MappingNode {
    #[serde(default)]
    message: Option<ExportMessage>,
}

#[derive(Deserialize)]
struct ExportMessage {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    create_time: Option<f64>,
    #[serde(default)]
    content: Option<MessageContent>,
}

fn parse_export_document(raw: &str) -> Result<Vec<RawMessage>, serde_json::Error> {
    let conversations: Vec<Conversation> = serde_json::from_str(raw)?;

    let mut messages = Vec::new();
    for conversation in conversations {
        let thread_id = conversation
            .id
            .or(conversation.conversation_id)
            .unwrap_or_default();
        let conversation_created = conversation.create_time.unwrap_or(0.0);

        let mut thread_messages: Vec<RawMessage> = conversation
            .mapping
            .into_values()
            .filter_map(|node| {
                let message = node.message?;
                let id = message.id.filter(|id| !id.is_empty())?;
                let text = message.content.as_ref().map(flatten_content).unwrap_or_default();
                if text.is_empty() {
                    return None;
                }
                Some(RawMessage {
                    id,
                    thread_id: thread_id.clone(),
                    // A message without its own timestamp inherits the
                    // conversation's.
                    created_at: message.create_time.unwrap_or(conversation_created),
                    text,
                })
            })
            .collect();

        thread_messages.sort_by(|a, b| a.created_at.total_cmp(&b.created_at));
        messages.append(&mut thread_messages);
    }
    Ok(messages)
}

// ---- content normalization --------------------------------------------------

/// The shapes a message body arrives in: a plain string, a list of content
/// parts, or an object wrapping such a list under `parts`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
    Wrapped {
        #[serde(default)]
        parts: Vec<ContentPart>,
    },
    Other(serde_json::Value),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentPart {
    Text(String),
    Typed { text: TextPayload },
    // Attachments, tool calls and other non-text parts
    Other(serde_json::Value),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextPayload {
    Plain(String),
    Valued { value: String },
    Other(serde_json::Value),
}

/// Concatenate the textual parts in original order, newline-separated,
/// trimmed. Non-text parts contribute nothing.
fn flatten_content(content: &MessageContent) -> String {
    match content {
        MessageContent::Text(text) => text.trim().to_string(),
        MessageContent::Parts(parts) | MessageContent::Wrapped { parts } => parts
            .iter()
            .filter_map(part_text)
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string(),
        MessageContent::Other(_) => String::new(),
    }
}

fn part_text(part: &ContentPart) -> Option<String> {
    match part {
        ContentPart::Text(text) => Some(text.clone()),
        ContentPart::Typed {
            text: TextPayload::Plain(text),
        } => Some(text.clone()),
        ContentPart::Typed {
            text: TextPayload::Valued { value },
        } => Some(value.clone()),
        _ => None,
    }
}

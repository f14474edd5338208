//! Client for the element file-browser helper
//!
//! The helper listens on a loopback port and takes one JSON action per
//! POST. Most actions answer with a short status string; the strict-mode
//! filter instead returns the helper's whole directory listing, which we
//! thin down to the hard-to-dictate names and post back.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::config::ElementConfig;

/// The helper was unreachable or answered with something unusable
#[derive(Debug)]
pub enum RemoteCommandError {
    Unreachable(String),
    BadResponse(String),
}

impl fmt::Display for RemoteCommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteCommandError::Unreachable(msg) => {
                write!(f, "element helper unreachable: {}", msg)
            }
            RemoteCommandError::BadResponse(msg) => {
                write!(f, "element helper sent malformed data: {}", msg)
            }
        }
    }
}

impl std::error::Error for RemoteCommandError {}

/// One message to the helper. Index fields are 0-based on the wire; the
/// dispatcher normalizes spoken 1-based numbers before building these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementAction {
    Retrieve { index: u32 },
    Scroll { index: u32 },
    Rescan,
    Sticky { index: u32, sticky_index: u32, auto_sticky: String },
    Add { name: String },
    Remove { index: u32 },
    Search,
    Extensions,
    TriggerDirectoryBox,
    FilterStrictRequest,
    FilterStrictReturn { processed_data: String },
    Kill,
}

impl ElementAction {
    pub fn action_type(&self) -> &'static str {
        match self {
            ElementAction::Retrieve { .. } => "retrieve",
            ElementAction::Scroll { .. } => "scroll",
            ElementAction::Rescan => "rescan",
            ElementAction::Sticky { .. } => "sticky",
            ElementAction::Add { .. } => "add",
            ElementAction::Remove { .. } => "remove",
            ElementAction::Search => "search",
            ElementAction::Extensions => "extensions",
            ElementAction::TriggerDirectoryBox => "trigger_directory_box",
            ElementAction::FilterStrictRequest => "filter_strict_request_for_data",
            ElementAction::FilterStrictReturn { .. } => "filter_strict_return_processed_data",
            ElementAction::Kill => "kill",
        }
    }

    /// Wire payload for this action
    pub fn payload(&self) -> Value {
        let mut body = json!({ "action_type": self.action_type() });
        let fields = body.as_object_mut().expect("payload is an object");
        match self {
            ElementAction::Retrieve { index }
            | ElementAction::Scroll { index }
            | ElementAction::Remove { index } => {
                fields.insert("index".into(), json!(index));
            }
            ElementAction::Sticky {
                index,
                sticky_index,
                auto_sticky,
            } => {
                fields.insert("index".into(), json!(index));
                fields.insert("sticky_index".into(), json!(sticky_index));
                fields.insert("auto_sticky".into(), json!(auto_sticky));
            }
            ElementAction::Add { name } => {
                fields.insert("name".into(), json!(name));
            }
            ElementAction::FilterStrictReturn { processed_data } => {
                fields.insert("processed_data".into(), json!(processed_data));
            }
            _ => {}
        }
        body
    }
}

/// Directory listing returned by the strict-filter request. Unknown
/// fields ride along untouched so the helper gets its own data back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryListing {
    pub files: HashMap<String, FileEntry>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub names: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Blocking HTTP client for the helper
pub struct ElementClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl ElementClient {
    pub fn new(config: &ElementConfig) -> Result<Self, RemoteCommandError> {
        Self::with_base_url(config.base_url(), config.timeout())
    }

    pub fn with_base_url(
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, RemoteCommandError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteCommandError::Unreachable(e.to_string()))?;
        Ok(Self { base_url, http })
    }

    fn post(&self, action: &ElementAction) -> Result<String, RemoteCommandError> {
        let url = format!("{}/process", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&action.payload())
            .send()
            .map_err(|e| RemoteCommandError::Unreachable(e.to_string()))?;
        response
            .text()
            .map_err(|e| RemoteCommandError::BadResponse(e.to_string()))
    }

    /// Send an action and return the helper's status line.
    pub fn send(&self, action: &ElementAction) -> Result<String, RemoteCommandError> {
        let status = self.post(action)?;
        log::debug!("element {} -> {}", action.action_type(), status.trim());
        Ok(status.trim().to_string())
    }

    /// Run the strict-mode round trip: fetch the directory listing, drop
    /// every name that dictates easily, and hand the rest back to the
    /// helper. Returns how many names survived.
    pub fn run_strict_filter(&self) -> Result<usize, RemoteCommandError> {
        let body = self.post(&ElementAction::FilterStrictRequest)?;
        let mut directory: DirectoryListing = serde_json::from_str(&body)
            .map_err(|e| RemoteCommandError::BadResponse(e.to_string()))?;

        let kept = filter_difficult_names(&mut directory);

        let processed = serde_json::to_string(&directory)
            .map_err(|e| RemoteCommandError::BadResponse(e.to_string()))?;
        self.send(&ElementAction::FilterStrictReturn {
            processed_data: processed,
        })?;
        Ok(kept)
    }
}

/// Keep only names worth a dedicated voice alias; returns the number kept.
pub fn filter_difficult_names(directory: &mut DirectoryListing) -> usize {
    let mut kept = 0;
    for entry in directory.files.values_mut() {
        entry.names.retain(|name| is_difficult_to_type(name));
        kept += entry.names.len();
    }
    kept
}

/// A name is difficult when any of its identifier pieces is not a plain
/// dictionary word, e.g. "getHttpCtx" (ctx) but not "getUserName".
pub fn is_difficult_to_type(name: &str) -> bool {
    split_identifier(name)
        .iter()
        .any(|piece| piece.len() > 1 && !COMMON_WORDS.contains(&piece.as_str()))
}

/// Break an identifier on underscores and camelCase humps, lowercased:
/// "XmlHttpRequest_v2" -> ["xml", "http", "request", "v2"]
pub fn split_identifier(name: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = name.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' || c == ' ' {
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() {
            let after_lower = i > 0 && chars[i - 1].is_lowercase();
            let before_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if (after_lower || (i > 0 && before_lower)) && !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
            }
        }
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Words the recognizer spells effortlessly; name pieces outside this list
/// are what strict mode is for. Stand-in for asking the engine vocabulary.
const COMMON_WORDS: &[&str] = &[
    "add", "all", "and", "app", "back", "bar", "base", "box", "build", "but", "call", "case",
    "check", "class", "clear", "click", "close", "code", "con", "config", "copy", "count",
    "create", "data", "date", "delete", "dir", "down", "edit", "end", "enter", "error", "event",
    "file", "filter", "find", "first", "for", "form", "free", "from", "get", "grid", "group",
    "handle", "has", "head", "help", "home", "index", "info", "input", "item", "key", "last",
    "left", "line", "link", "list", "load", "lock", "log", "main", "make", "map", "max", "menu",
    "min", "mode", "move", "name", "new", "next", "node", "not", "off", "old", "open", "out",
    "over", "page", "parse", "path", "play", "point", "post", "print", "read", "remove", "request",
    "reset", "right", "root", "row", "run", "save", "search", "select", "send", "set", "show",
    "size", "sort", "start", "state", "stop", "style", "tab", "table", "test", "text", "the",
    "time", "title", "top", "type", "under", "update", "use", "user", "value", "view", "when",
    "width", "window", "word", "work", "write",
];

//! Schema documents and the artifact kinds they describe

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use url::Url;

/// Discriminator field read from an instance when no schema is given
pub const KIND_FIELD: &str = "kind";

/// Schema used for event logs and `.jsonl` inputs
pub const EVENT_SCHEMA: &str = "event.json";

/// Kind of ICEP artifact, selected by an instance's `kind` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Intent,
    Constraint,
    Evidence,
    WorldState,
    Arbitration,
    Event,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 6] = [
        ArtifactKind::Intent,
        ArtifactKind::Constraint,
        ArtifactKind::Evidence,
        ArtifactKind::WorldState,
        ArtifactKind::Arbitration,
        ArtifactKind::Event,
    ];

    /// The value carried in the `kind` field
    pub fn tag(&self) -> &'static str {
        match self {
            ArtifactKind::Intent => "intent",
            ArtifactKind::Constraint => "constraint",
            ArtifactKind::Evidence => "evidence",
            ArtifactKind::WorldState => "world_state",
            ArtifactKind::Arbitration => "arbitration",
            ArtifactKind::Event => "event",
        }
    }

    /// File name of the schema describing this kind
    pub fn schema_name(&self) -> &'static str {
        match self {
            ArtifactKind::Intent => "intent.json",
            ArtifactKind::Constraint => "constraint.json",
            ArtifactKind::Evidence => "evidence.json",
            ArtifactKind::WorldState => "world_state.json",
            ArtifactKind::Arbitration => "arbitration.json",
            ArtifactKind::Event => EVENT_SCHEMA,
        }
    }
}

impl FromStr for ArtifactKind {
    type Err = String;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        ArtifactKind::ALL
            .into_iter()
            .find(|kind| kind.tag() == tag)
            .ok_or_else(|| tag.to_string())
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A parsed schema file, immutable once loaded
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    /// Self-declared `$id`, if the document has one
    pub id: Option<String>,
    /// Bare file name, e.g. `intent.json`
    pub file_name: String,
    /// Canonical path on disk
    pub path: PathBuf,
    /// `file://` URI of the canonical path
    pub uri: Url,
    /// Parsed schema body
    pub body: Arc<Value>,
}

impl SchemaDocument {
    pub(crate) fn new(path: &Path, file_name: String, uri: Url, body: Value) -> Self {
        let id = body
            .get("$id")
            .and_then(Value::as_str)
            .map(String::from);
        Self {
            id,
            file_name,
            path: path.to_path_buf(),
            uri,
            body: Arc::new(body),
        }
    }

    /// Every key this document is reachable under, in registration order
    pub fn lookup_keys(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(3);
        if let Some(id) = &self.id {
            keys.push(id.clone());
        }
        keys.push(self.file_name.clone());
        keys.push(self.uri.to_string());
        keys
    }

    /// The `title` keyword, when present
    pub fn title(&self) -> Option<&str> {
        self.body.get("title").and_then(Value::as_str)
    }
}

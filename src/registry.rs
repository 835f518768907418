//! Schema Registry
//!
//! Loads every schema document in a directory and indexes each one under
//! its `$id`, its bare file name and its canonical `file://` URI. The
//! registry also backs `$ref` resolution, so a schema can point at any
//! other loaded document by any of those keys.
//!
//! Loading is all-or-nothing: one unreadable or malformed file fails the
//! whole load. When two files claim the same key the one loaded later wins;
//! files are loaded in file-name order, so the outcome is deterministic.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use jsonschema::{SchemaResolver, SchemaResolverError};
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;
use walkdir::WalkDir;

use crate::checksum::Checksum;
use crate::error::{Result, SchemaError};
use crate::schema::SchemaDocument;

type Index = HashMap<String, Arc<SchemaDocument>>;

/// Immutable set of schema documents, built once per process
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    /// Canonical schema directory
    root: PathBuf,
    /// Documents in load order
    documents: Vec<Arc<SchemaDocument>>,
    /// Every lookup key -> document
    index: Arc<Index>,
    /// SHA256 over every loaded file name and its contents
    fingerprint: Checksum,
}

impl SchemaRegistry {
    /// Load all `*.json` files directly inside `dir`
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let root = fs::canonicalize(dir).map_err(|e| SchemaError::SchemaLoad {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut documents = Vec::new();
        let mut index = Index::new();
        let mut contents = Vec::new();

        let walker = WalkDir::new(&root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry.map_err(|e| SchemaError::SchemaLoad {
                path: e.path().unwrap_or(&root).to_path_buf(),
                reason: e.to_string(),
            })?;
            let path = entry.path();
            if !path.is_file() || path.extension().map(|e| e != "json").unwrap_or(true) {
                continue;
            }

            let raw = fs::read(path).map_err(|e| load_error(path, e))?;
            let document = parse_document(path, &raw)?;
            contents.push(document.file_name.clone().into_bytes());
            contents.push(raw);

            debug!(file = %document.file_name, id = ?document.id, "registering schema");
            let document = Arc::new(document);
            for key in document.lookup_keys() {
                if let Some(previous) = index.insert(key.clone(), Arc::clone(&document)) {
                    if previous.path != document.path {
                        warn!(
                            key = %key,
                            replaced = %previous.path.display(),
                            by = %document.path.display(),
                            "schema key overwritten by later file"
                        );
                    }
                }
            }
            documents.push(document);
        }

        let fingerprint = Checksum::from_parts(contents.iter().map(Vec::as_slice));
        info!(
            dir = %root.display(),
            documents = documents.len(),
            keys = index.len(),
            fingerprint = %fingerprint.short(),
            "schema registry loaded"
        );

        Ok(Self {
            root,
            documents,
            index: Arc::new(index),
            fingerprint,
        })
    }

    /// Canonical directory the registry was loaded from
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Look a document up by `$id`, file name or `file://` URI
    pub fn get(&self, key: &str) -> Option<&SchemaDocument> {
        self.index.get(key).map(Arc::as_ref)
    }

    /// Look a document up by its file-name key, failing if absent
    pub fn get_by_name(&self, name: &str) -> Result<&SchemaDocument> {
        self.get(name)
            .ok_or_else(|| SchemaError::SchemaNotFound(name.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// All lookup keys, sorted
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<_> = self.index.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Loaded documents in load order
    pub fn documents(&self) -> impl Iterator<Item = &SchemaDocument> {
        self.documents.iter().map(Arc::as_ref)
    }

    /// Number of loaded documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn fingerprint(&self) -> &Checksum {
        &self.fingerprint
    }

    /// `$ref` resolver covering every loaded document
    pub(crate) fn resolver(&self) -> RegistryResolver {
        RegistryResolver {
            index: Arc::clone(&self.index),
        }
    }
}

fn load_error(path: &Path, err: impl ToString) -> SchemaError {
    SchemaError::SchemaLoad {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

fn parse_document(path: &Path, raw: &[u8]) -> Result<SchemaDocument> {
    let body: Value = serde_json::from_slice(raw).map_err(|e| load_error(path, e))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| load_error(path, "file name is not valid UTF-8"))?
        .to_string();
    let canonical = fs::canonicalize(path).map_err(|e| load_error(path, e))?;
    let uri = Url::from_file_path(&canonical)
        .map_err(|_| load_error(path, "path cannot be expressed as a file URI"))?;
    Ok(SchemaDocument::new(&canonical, file_name, uri, body))
}

/// Resolves `$ref` targets against the registry index.
///
/// A target is tried as its absolute URI, then as the literal reference,
/// then by its last path segment as a file name. Fragments are applied by
/// the engine after the document is returned.
pub(crate) struct RegistryResolver {
    index: Arc<Index>,
}

impl SchemaResolver for RegistryResolver {
    fn resolve(
        &self,
        _root_schema: &Value,
        url: &Url,
        original_reference: &str,
    ) -> std::result::Result<Arc<Value>, SchemaResolverError> {
        let mut target = url.clone();
        target.set_fragment(None);
        let reference = original_reference.split('#').next().unwrap_or_default();
        let file_name = target
            .path_segments()
            .and_then(|segments| segments.last())
            .unwrap_or_default();

        let found = [target.as_str(), reference, file_name]
            .into_iter()
            .filter(|key| !key.is_empty())
            .find_map(|key| self.index.get(key))
            .map(|document| Arc::clone(&document.body));
        found.ok_or_else(|| anyhow::anyhow!("no schema registered for {}", url))
    }
}

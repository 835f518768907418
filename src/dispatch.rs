//! Validation Dispatcher
//!
//! Routes a decoded instance to its schema, either by an explicit schema
//! name or by the instance's `kind` field, and runs it through the JSON
//! Schema engine with the whole registry available for `$ref` resolution.
//!
//! Multi-record inputs (NDJSON) are validated in file order and stop at the
//! first bad record; the error carries the 1-based physical line number.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, JSONSchema, ValidationError};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, SchemaError};
use crate::registry::SchemaRegistry;
use crate::schema::{ArtifactKind, EVENT_SCHEMA, KIND_FIELD};

/// Pick the schema for `instance`.
///
/// An override always wins. Otherwise the `kind` field decides; absent,
/// `null` or empty is a missing field, anything unmapped is an unknown kind.
pub fn select_schema(instance: &Value, schema_override: Option<&str>) -> Result<String> {
    if let Some(name) = schema_override {
        return Ok(name.to_string());
    }

    let kind = match instance.get(KIND_FIELD) {
        None | Some(Value::Null) => return Err(missing_kind()),
        Some(Value::String(tag)) if tag.is_empty() => return Err(missing_kind()),
        Some(Value::String(tag)) => tag
            .parse::<ArtifactKind>()
            .map_err(SchemaError::UnknownKind)?,
        Some(other) => return Err(SchemaError::UnknownKind(other.to_string())),
    };
    Ok(kind.schema_name().to_string())
}

fn missing_kind() -> SchemaError {
    SchemaError::MissingField { field: KIND_FIELD }
}

/// Outcome of validating a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Schema the input was checked against
    pub schema: String,
    /// Records validated (1 for single documents)
    pub records: usize,
}

/// A schema compiled against the registry, reusable across instances
pub struct CompiledSchema {
    name: String,
    schema: JSONSchema,
}

impl CompiledSchema {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check one instance, reporting the first violation the engine finds
    pub fn check(&self, instance: &Value) -> Result<()> {
        if let Err(mut errors) = self.schema.validate(instance) {
            if let Some(first) = errors.next() {
                return Err(violation(&self.name, first));
            }
        }
        Ok(())
    }
}

fn violation(schema_name: &str, error: ValidationError<'_>) -> SchemaError {
    if matches!(error.kind, ValidationErrorKind::Resolver { .. }) {
        return SchemaError::InvalidSchema {
            name: schema_name.to_string(),
            message: error.to_string(),
        };
    }

    let mut location = error.instance_path.to_string();
    if location.is_empty() {
        location.push('/');
    }
    SchemaError::Validation {
        line: None,
        message: error.to_string(),
        location,
    }
}

/// Decode one JSON document from bytes
pub(crate) fn decode(raw: &[u8]) -> Result<Value> {
    serde_json::from_slice(raw).map_err(|source| SchemaError::Decode { line: None, source })
}

fn trim_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}

/// Dispatches instances to schemas held by a registry
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher<'r> {
    registry: &'r SchemaRegistry,
}

impl<'r> Dispatcher<'r> {
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r SchemaRegistry {
        self.registry
    }

    /// Compile the schema registered under file name `schema_name`
    pub fn compile(&self, schema_name: &str) -> Result<CompiledSchema> {
        let document = self.registry.get_by_name(schema_name)?;
        let schema = JSONSchema::options()
            .with_draft(Draft::Draft202012)
            .with_resolver(self.registry.resolver())
            .compile(document.body.as_ref())
            .map_err(|e| SchemaError::InvalidSchema {
                name: schema_name.to_string(),
                message: e.to_string(),
            })?;
        Ok(CompiledSchema {
            name: schema_name.to_string(),
            schema,
        })
    }

    /// Validate one instance against a named schema
    pub fn validate(&self, instance: &Value, schema_name: &str) -> Result<()> {
        self.compile(schema_name)?.check(instance)
    }

    /// Select a schema for `instance` and validate against it.
    ///
    /// Returns the schema name that was used.
    pub fn validate_document(&self, instance: &Value, schema_override: Option<&str>) -> Result<String> {
        let schema_name = select_schema(instance, schema_override)?;
        debug!(schema = %schema_name, "dispatching instance");
        self.validate(instance, &schema_name)?;
        Ok(schema_name)
    }

    /// Decode a single JSON document and dispatch it
    pub fn validate_str(&self, raw: &str, schema_override: Option<&str>) -> Result<String> {
        self.validate_slice(raw.as_bytes(), schema_override)
    }

    /// Like [`validate_str`](Self::validate_str), for raw bytes. Input that
    /// is not UTF-8 is a decode error.
    pub fn validate_slice(&self, raw: &[u8], schema_override: Option<&str>) -> Result<String> {
        let instance = decode(raw)?;
        self.validate_document(&instance, schema_override)
    }

    /// Validate newline-delimited records against one schema.
    ///
    /// Blank lines are skipped but still counted, so reported line numbers
    /// match the physical file. Lines are read as bytes, so a line that is
    /// not UTF-8 fails as a decode error on that line. Returns the number
    /// of records validated.
    pub fn validate_sequence<R: BufRead>(&self, reader: R, schema_name: &str) -> Result<usize> {
        let compiled = self.compile(schema_name)?;
        let mut records = 0;

        for (index, line) in reader.split(b'\n').enumerate() {
            let line_no = index + 1;
            let line = line?;
            let record = trim_whitespace(&line);
            if record.is_empty() {
                continue;
            }

            let instance = decode(record).map_err(|e| e.at_line(line_no))?;
            compiled.check(&instance).map_err(|e| e.at_line(line_no))?;
            debug!(line = line_no, schema = %schema_name, "record valid");
            records += 1;
        }

        Ok(records)
    }

    /// Validate a file on disk.
    ///
    /// `.jsonl` files are treated as record sequences and default to the
    /// event schema; anything else is a single document dispatched by kind.
    pub fn validate_path(&self, path: &Path, schema_override: Option<&str>) -> Result<ValidationReport> {
        let is_sequence = path.extension().map(|e| e == "jsonl").unwrap_or(false);

        if is_sequence {
            let schema = schema_override.unwrap_or(EVENT_SCHEMA).to_string();
            let reader = BufReader::new(File::open(path)?);
            let records = self.validate_sequence(reader, &schema)?;
            Ok(ValidationReport { schema, records })
        } else {
            let raw = fs::read(path)?;
            let schema = self.validate_slice(&raw, schema_override)?;
            Ok(ValidationReport { schema, records: 1 })
        }
    }
}

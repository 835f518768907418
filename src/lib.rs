//! ICEP schema registry and validation
//!
//! Validates ICEP artifacts (intents, constraints, evidence, world states,
//! arbitration decisions and events) against a directory of JSON Schema
//! (Draft 2020-12) documents, and maintains an append-only NDJSON event log
//! whose records are validated before they are written.
//!
//! ## Components
//!
//! - **Registry**: loads every schema in a directory and indexes it by
//!   `$id`, file name and `file://` URI; also resolves cross-schema `$ref`s
//! - **Dispatcher**: picks a schema by override or by the `kind` field and
//!   validates single documents or NDJSON record sequences
//! - **Event log**: validate-then-append store for `event` records
//!
//! ```text
//! schemas/
//! ├── common.json        shared $defs
//! ├── intent.json
//! ├── constraint.json
//! ├── evidence.json
//! ├── world_state.json
//! ├── arbitration.json
//! └── event.json
//! ```
//!
//! The registry is built once at program entry and passed down by
//! reference; nothing here keeps global state.

pub mod checksum;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod event_log;
pub mod registry;
pub mod schema;
pub mod suite;

pub use checksum::Checksum;
pub use config::IcepConfig;
pub use dispatch::{select_schema, CompiledSchema, Dispatcher, ValidationReport};
pub use error::{Result, SchemaError};
pub use event_log::EventLog;
pub use registry::SchemaRegistry;
pub use schema::{ArtifactKind, SchemaDocument, EVENT_SCHEMA, KIND_FIELD};
pub use suite::{ExampleEntry, ExampleOutcome, ExampleSuite, SuiteReport};

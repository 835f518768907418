//! Append-only NDJSON event log
//!
//! Every append is validated against the event schema before the file is
//! touched. A rejected event leaves the log byte-for-byte unchanged, and a
//! log that did not exist is not created.
//!
//! Single writer only: nothing here locks the file, so concurrent appenders
//! from other processes must coordinate among themselves.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info};

use crate::dispatch::{decode, Dispatcher};
use crate::error::Result;
use crate::registry::SchemaRegistry;
use crate::schema::EVENT_SCHEMA;

/// An event log file bound to a registry
#[derive(Debug, Clone)]
pub struct EventLog<'r> {
    dispatcher: Dispatcher<'r>,
    path: PathBuf,
    sync: bool,
}

impl<'r> EventLog<'r> {
    pub fn new(registry: &'r SchemaRegistry, path: impl Into<PathBuf>) -> Self {
        Self {
            dispatcher: Dispatcher::new(registry),
            path: path.into(),
            sync: true,
        }
    }

    /// Whether to `fsync` file data after each append (default: on)
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decode `raw` as a single event and append it
    pub fn append_str(&self, raw: &str) -> Result<()> {
        self.append_slice(raw.as_bytes())
    }

    /// Like [`append_str`](Self::append_str), for bytes read straight from a file
    pub fn append_slice(&self, raw: &[u8]) -> Result<()> {
        let event = decode(raw)?;
        self.append(&event)
    }

    /// Validate `event` and append it as one compact line
    pub fn append(&self, event: &Value) -> Result<()> {
        self.dispatcher.validate(event, EVENT_SCHEMA)?;

        let mut line = serde_json::to_string(event).map_err(std::io::Error::from)?;
        line.push('\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        if self.sync {
            file.sync_data()?;
        }

        info!(
            log = %self.path.display(),
            id = ?event.get("id"),
            bytes = line.len(),
            "event appended"
        );
        Ok(())
    }

    /// Re-validate every record in the log, returning how many there are
    pub fn validate(&self) -> Result<usize> {
        let reader = BufReader::new(File::open(&self.path)?);
        let records = self.dispatcher.validate_sequence(reader, EVENT_SCHEMA)?;
        debug!(log = %self.path.display(), records, "event log valid");
        Ok(records)
    }
}

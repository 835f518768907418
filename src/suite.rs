//! Example payload suite
//!
//! Checks a directory of sample artifacts against fixed schemas, so a
//! schema change that breaks the published examples is caught early.
//! Missing files are skipped rather than failed.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::dispatch::{decode, Dispatcher};
use crate::error::Result;
use crate::schema::{ArtifactKind, EVENT_SCHEMA};

/// One example file and the schema it must satisfy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExampleEntry {
    pub file_name: String,
    pub schema: String,
    /// NDJSON records rather than a single document
    pub sequence: bool,
}

impl ExampleEntry {
    pub fn document(file_name: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            schema: schema.into(),
            sequence: false,
        }
    }

    pub fn sequence(file_name: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            schema: schema.into(),
            sequence: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum ExampleOutcome {
    Passed,
    Skipped,
    Failed(String),
}

#[derive(Debug, Default, Serialize)]
pub struct SuiteReport {
    pub results: Vec<(ExampleEntry, ExampleOutcome)>,
}

impl SuiteReport {
    pub fn failures(&self) -> usize {
        self.results
            .iter()
            .filter(|(_, outcome)| matches!(outcome, ExampleOutcome::Failed(_)))
            .count()
    }

    pub fn is_clean(&self) -> bool {
        self.failures() == 0
    }
}

/// Ordered list of example files to check
#[derive(Debug, Clone)]
pub struct ExampleSuite {
    entries: Vec<ExampleEntry>,
}

impl Default for ExampleSuite {
    /// Every artifact kind except events as `<kind>.json`, plus
    /// `event-log.jsonl` checked record by record.
    fn default() -> Self {
        let mut entries: Vec<_> = [
            ArtifactKind::Intent,
            ArtifactKind::Constraint,
            ArtifactKind::WorldState,
            ArtifactKind::Evidence,
            ArtifactKind::Arbitration,
        ]
        .into_iter()
        .map(|kind| ExampleEntry::document(kind.schema_name(), kind.schema_name()))
        .collect();
        entries.push(ExampleEntry::sequence("event-log.jsonl", EVENT_SCHEMA));
        Self { entries }
    }
}

impl ExampleSuite {
    pub fn new(entries: Vec<ExampleEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[ExampleEntry] {
        &self.entries
    }

    /// Validate every entry found under `dir`.
    ///
    /// Infrastructure failures (bad schema set, unreadable file) abort the
    /// run; rejected examples are recorded and the run continues.
    pub fn run(&self, dispatcher: &Dispatcher<'_>, dir: &Path) -> Result<SuiteReport> {
        let mut report = SuiteReport::default();

        for entry in &self.entries {
            let path = dir.join(&entry.file_name);
            let outcome = if !path.is_file() {
                ExampleOutcome::Skipped
            } else {
                match check_entry(dispatcher, entry, &path) {
                    Ok(()) => ExampleOutcome::Passed,
                    Err(e) if e.is_validation_failure() => ExampleOutcome::Failed(e.to_string()),
                    Err(e) => return Err(e),
                }
            };
            debug!(file = %entry.file_name, outcome = ?outcome, "example checked");
            report.results.push((entry.clone(), outcome));
        }

        Ok(report)
    }
}

fn check_entry(dispatcher: &Dispatcher<'_>, entry: &ExampleEntry, path: &Path) -> Result<()> {
    if entry.sequence {
        let reader = BufReader::new(File::open(path)?);
        dispatcher.validate_sequence(reader, &entry.schema)?;
    } else {
        let raw = std::fs::read(path)?;
        let instance = decode(&raw)?;
        dispatcher.validate(&instance, &entry.schema)?;
    }
    Ok(())
}

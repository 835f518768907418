//! Dispatch and validation against the shipped schema set

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use icep::{ArtifactKind, Dispatcher, ExampleOutcome, ExampleSuite, SchemaError, SchemaRegistry};
use serde_json::{json, Value};
use tempfile::tempdir;

fn schema_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("schemas")
}

fn examples_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/examples")
}

fn load_example(name: &str) -> Value {
    let raw = fs::read_to_string(examples_dir().join(name)).unwrap();
    serde_json::from_str(&raw).unwrap()
}

// =============================================================================
// Kind dispatch
// =============================================================================

#[test]
fn test_every_kind_dispatches_and_validates() {
    let registry = SchemaRegistry::load(schema_dir()).unwrap();
    let dispatcher = Dispatcher::new(&registry);

    for kind in ArtifactKind::ALL {
        let instance = match kind {
            ArtifactKind::Event => json!({ "kind": "event", "id": "e1", "ts": 1, "type": "ping" }),
            other => load_example(other.schema_name()),
        };
        let schema = dispatcher.validate_document(&instance, None).unwrap();
        assert_eq!(schema, kind.schema_name(), "kind {}", kind);
    }
}

#[test]
fn test_unknown_kind_fails_dispatch() {
    let registry = SchemaRegistry::load(schema_dir()).unwrap();
    let dispatcher = Dispatcher::new(&registry);

    match dispatcher.validate_document(&json!({ "kind": "prophecy", "id": "x" }), None) {
        Err(SchemaError::UnknownKind(kind)) => assert_eq!(kind, "prophecy"),
        other => panic!("Expected UnknownKind, got {:?}", other),
    }
}

#[test]
fn test_missing_kind_fails_dispatch() {
    let registry = SchemaRegistry::load(schema_dir()).unwrap();
    let dispatcher = Dispatcher::new(&registry);

    let result = dispatcher.validate_document(&json!({ "id": "x" }), None);
    assert!(matches!(result, Err(SchemaError::MissingField { field: "kind" })));
}

#[test]
fn test_override_skips_kind_sniffing() {
    let registry = SchemaRegistry::load(schema_dir()).unwrap();
    let dispatcher = Dispatcher::new(&registry);

    // No kind field, but the override names the schema outright
    let mut intent = load_example("intent.json");
    intent.as_object_mut().unwrap().remove("kind");
    let result = dispatcher.validate_document(&intent, Some("intent.json"));
    assert!(matches!(result, Err(SchemaError::Validation { .. })));

    let intent = load_example("intent.json");
    assert_eq!(
        dispatcher.validate_document(&intent, Some("intent.json")).unwrap(),
        "intent.json"
    );
}

#[test]
fn test_override_to_unknown_schema() {
    let registry = SchemaRegistry::load(schema_dir()).unwrap();
    let dispatcher = Dispatcher::new(&registry);

    let result = dispatcher.validate_document(&json!({ "kind": "event" }), Some("ghost.json"));
    assert!(matches!(result, Err(SchemaError::SchemaNotFound(name)) if name == "ghost.json"));
}

// =============================================================================
// Cross-schema references
// =============================================================================

#[test]
fn test_ref_into_common_definitions_is_enforced() {
    let registry = SchemaRegistry::load(schema_dir()).unwrap();
    let dispatcher = Dispatcher::new(&registry);

    let mut evidence = load_example("evidence.json");
    evidence["confidence"] = json!(1.5);

    match dispatcher.validate_document(&evidence, None) {
        Err(SchemaError::Validation { location, .. }) => assert_eq!(location, "/confidence"),
        other => panic!("Expected Validation, got {:?}", other),
    }
}

#[test]
fn test_nested_ref_inside_common_definitions() {
    let registry = SchemaRegistry::load(schema_dir()).unwrap();
    let dispatcher = Dispatcher::new(&registry);

    let mut arbitration = load_example("arbitration.json");
    arbitration["intents"] = json!(["int-001", ""]);

    match dispatcher.validate_document(&arbitration, None) {
        Err(SchemaError::Validation { location, .. }) => assert_eq!(location, "/intents/1"),
        other => panic!("Expected Validation, got {:?}", other),
    }
}

// =============================================================================
// Sequences
// =============================================================================

#[test]
fn test_fail_fast_reports_first_bad_line() {
    let registry = SchemaRegistry::load(schema_dir()).unwrap();
    let dispatcher = Dispatcher::new(&registry);

    let input = [
        r#"{"kind":"event","id":"e1","ts":1,"type":"ping"}"#,
        r#"{"kind":"event","id":"e2","ts":2,"type":"ping"}"#,
        r#"{"kind":"event","id":"e3","ts":-1,"type":"ping"}"#,
        r#"{"broken"#,
    ]
    .join("\n");

    // Line 4 is malformed JSON, but line 3 fails first and halts the scan
    let err = dispatcher
        .validate_sequence(Cursor::new(input), "event.json")
        .unwrap_err();
    assert!(matches!(err, SchemaError::Validation { line: Some(3), .. }));
}

#[test]
fn test_blank_line_still_counts() {
    let registry = SchemaRegistry::load(schema_dir()).unwrap();
    let dispatcher = Dispatcher::new(&registry);

    let input = "{\"kind\":\"event\",\"id\":\"e1\",\"ts\":1,\"type\":\"ping\"}\n\n{\"kind\":\"event\"}\n";
    let err = dispatcher
        .validate_sequence(Cursor::new(input), "event.json")
        .unwrap_err();
    assert!(err.to_string().starts_with("Line 3: "), "{}", err);
}

#[test]
fn test_jsonl_path_defaults_to_event_schema() {
    let registry = SchemaRegistry::load(schema_dir()).unwrap();
    let dispatcher = Dispatcher::new(&registry);

    let report = dispatcher
        .validate_path(&examples_dir().join("event-log.jsonl"), None)
        .unwrap();
    assert_eq!(report.schema, "event.json");
    assert_eq!(report.records, 3);
}

#[test]
fn test_json_path_with_bad_syntax_is_decode_error() {
    let registry = SchemaRegistry::load(schema_dir()).unwrap();
    let dispatcher = Dispatcher::new(&registry);

    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{\"kind\": \"intent\",").unwrap();

    let result = dispatcher.validate_path(&path, None);
    assert!(matches!(result, Err(SchemaError::Decode { line: None, .. })));
}

// =============================================================================
// Example suite
// =============================================================================

#[test]
fn test_shipped_examples_pass() {
    let registry = SchemaRegistry::load(schema_dir()).unwrap();
    let dispatcher = Dispatcher::new(&registry);

    let report = ExampleSuite::default().run(&dispatcher, &examples_dir()).unwrap();
    for (entry, outcome) in &report.results {
        assert_eq!(outcome, &ExampleOutcome::Passed, "{}", entry.file_name);
    }
}

#[test]
fn test_broken_example_is_reported_not_fatal() {
    let registry = SchemaRegistry::load(schema_dir()).unwrap();
    let dispatcher = Dispatcher::new(&registry);

    let dir = tempdir().unwrap();
    fs::write(dir.path().join("intent.json"), r#"{"kind": "intent", "id": "i"}"#).unwrap();
    fs::write(dir.path().join("event-log.jsonl"), "{\"kind\":\"event\"}\n").unwrap();

    let report = ExampleSuite::default().run(&dispatcher, dir.path()).unwrap();
    assert_eq!(report.failures(), 2);
    let skipped = report
        .results
        .iter()
        .filter(|(_, outcome)| *outcome == ExampleOutcome::Skipped)
        .count();
    assert_eq!(skipped, 4);
}

//! Schema registry: compiled JSON-schema validators gating produce on the
//! owning node. Ported from `internal/broker/broker.go`'s
//! `RegisterSchemaHandler` (there backed by `gojsonschema`; here by the
//! `jsonschema` crate already used elsewhere in this workspace).

use std::path::{Path, PathBuf};

use crate::error::BrokerError;

/// A schema and its compiled validator, kept together since the raw
/// document is what gets persisted and served back (it is never
/// re-derived from the compiled form).
pub struct CompiledSchema {
    pub doc: serde_json::Value,
    validator: jsonschema::Validator,
}

impl CompiledSchema {
    pub fn compile(doc: serde_json::Value) -> Result<Self, BrokerError> {
        let validator = jsonschema::validator_for(&doc)
            .map_err(|err| BrokerError::SchemaCompile(err.to_string()))?;
        Ok(Self { doc, validator })
    }

    /// Validates a produce payload against this schema. `NotJson` if the
    /// message isn't itself parseable JSON; otherwise the validator's
    /// error list, one string per violation.
    pub fn validate(&self, message: &str) -> Result<(), BrokerError> {
        let instance: serde_json::Value =
            serde_json::from_str(message).map_err(|_| BrokerError::NotJson)?;

        let errors: Vec<String> = self
            .validator
            .iter_errors(&instance)
            .map(|e| format!("{} at {}", e, e.instance_path))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(BrokerError::SchemaValidation(errors))
        }
    }
}

fn schema_path(data_dir: &Path, topic: &str) -> PathBuf {
    data_dir.join(format!("{topic}.schema.json"))
}

/// Persists the raw schema document verbatim (spec.md §4.3).
pub fn persist(data_dir: &Path, topic: &str, doc: &serde_json::Value) -> std::io::Result<()> {
    std::fs::create_dir_all(data_dir)?;
    let text = serde_json::to_vec_pretty(doc).expect("serde_json::Value always serializes");
    std::fs::write(schema_path(data_dir, topic), text)
}

/// Loads every persisted schema at startup. Best-effort: a topic whose
/// document can't be read, parsed, or compiled is skipped with a warning,
/// never aborts the broker (spec.md §4.3, §7).
pub fn load_all(data_dir: &Path) -> std::collections::HashMap<String, CompiledSchema> {
    let mut out = std::collections::HashMap::new();
    let Ok(entries) = std::fs::read_dir(data_dir) else {
        return out;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(topic) = name.strip_suffix(".schema.json") else {
            continue;
        };

        let result = std::fs::read(&path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| serde_json::from_slice::<serde_json::Value>(&bytes).map_err(|e| e.to_string()))
            .and_then(|doc| CompiledSchema::compile(doc).map_err(|e| e.to_string()));

        match result {
            Ok(compiled) => {
                out.insert(topic.to_string(), compiled);
            }
            Err(err) => {
                tracing::warn!(topic, %err, "skipping unreadable or invalid persisted schema");
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn compiles_and_rejects_non_json_payloads() {
        let schema = CompiledSchema::compile(json!({"type": "object", "required": ["id"]})).unwrap();
        assert!(matches!(schema.validate("not json"), Err(BrokerError::NotJson)));
    }

    #[test]
    fn validates_against_required_fields() {
        let schema = CompiledSchema::compile(json!({"type": "object", "required": ["id"]})).unwrap();
        assert!(schema.validate(r#"{"x":1}"#).is_err());
        assert!(schema.validate(r#"{"id":7}"#).is_ok());
    }

    #[test]
    fn rejects_uncompilable_schema() {
        assert!(CompiledSchema::compile(json!({"type": "not-a-real-type"})).is_err());
    }

    #[test]
    fn persist_and_load_all_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        persist(dir.path(), "events", &json!({"type": "object", "required": ["id"]})).unwrap();

        let loaded = load_all(dir.path());
        let compiled = loaded.get("events").expect("events schema present");
        assert!(compiled.validate(r#"{"id":1}"#).is_ok());
        assert!(compiled.validate(r#"{}"#).is_err());
    }

    #[test]
    fn load_all_skips_invalid_entries_without_failing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.schema.json"), b"not json at all").unwrap();
        assert!(load_all(dir.path()).is_empty());
    }
}

//! Result normalization ("reason")
//!
//! Folds scored search hits, bare catalog plans and anything else a tool
//! returns into `EvidenceItem`s. Payload contents are not validated here.

use crate::models::{EvidenceItem, EvidenceSet};
use serde_json::{Map, Value};

/// Normalize one raw tool record. Always yields a payload object.
pub fn normalize(raw: Value) -> EvidenceItem {
    match raw {
        Value::Object(mut record) if record.contains_key("payload") => {
            let payload = record.remove("payload").map(into_payload).unwrap_or_default();
            let score = record.get("score").and_then(Value::as_f64);
            let source_id = record.get("id").and_then(id_string);
            EvidenceItem {
                payload,
                score,
                source_id,
            }
        }
        // Bare plan dictionaries (`name` present) and unknown shapes alike
        // keep the whole record as payload.
        Value::Object(record) => EvidenceItem {
            payload: record,
            score: None,
            source_id: None,
        },
        other => EvidenceItem {
            payload: into_payload(other),
            score: None,
            source_id: None,
        },
    }
}

/// Normalize a batch of records, appending them to `evidence` in arrival order.
pub fn absorb(evidence: &mut EvidenceSet, records: Vec<Value>) {
    evidence.extend(records.into_iter().map(normalize));
}

fn into_payload(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}

fn id_string(id: &Value) -> Option<String> {
    match id {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

//! Core data models for the retrieval orchestrator

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

//
// ================= Query =================
//

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    pub region: String,
}

impl Query {
    pub fn new(text: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            region: region.into(),
        }
    }
}

//
// ================= Plan =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    SemanticSearch,
    CatalogLookup,
    WebSearch,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanStep {
    pub tool: ToolKind,
    pub args: Value,
}

impl PlanStep {
    pub fn new(tool: ToolKind, args: Value) -> Self {
        Self { tool, args }
    }
}

//
// ================= Execution =================
//

/// Which retrieval cycle a step belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Cycle {
    Initial,
    Fallback,
}

/// Result of one capability call. Every variant folds into a record list,
/// but a failure stays distinguishable from a legitimately empty answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutcome {
    Completed { records: Vec<Value> },
    Failed { reason: String },
    TimedOut,
    Unavailable,
}

impl ToolOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ToolOutcome::Completed { .. })
    }

    pub fn records(&self) -> &[Value] {
        match self {
            ToolOutcome::Completed { records } => records,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub tool: ToolKind,
    pub cycle: Cycle,
    pub args: Value,
    pub outcome: ToolOutcome,
    pub execution_time_ms: u64,
}

//
// ================= Evidence =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvidenceItem {
    pub payload: Map<String, Value>,
    pub score: Option<f64>,
    pub source_id: Option<String>,
}

impl EvidenceItem {
    pub fn last_updated(&self) -> Option<&str> {
        self.payload.get("last_updated").and_then(Value::as_str)
    }
}

/// Arrival-ordered, append-only evidence. Duplicates are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidenceSet {
    items: Vec<EvidenceItem>,
}

impl EvidenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EvidenceItem> {
        self.items.iter()
    }
}

impl Extend<EvidenceItem> for EvidenceSet {
    fn extend<I: IntoIterator<Item = EvidenceItem>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

//
// ================= Verdict =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ConfidenceVerdict {
    pub score: f64,
    pub accepted: bool,
}

//
// ================= Answer =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerCandidate {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub data_per_day: Option<String>,
    pub validity_days: Option<i64>,
    pub source: String,
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub query: String,
    pub candidates: Vec<AnswerCandidate>,
    pub generated_at: String,
    pub confidence: f64,
    pub summary: Option<String>,
}

//
// ================= Run =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Planning,
    Acting,
    Reasoning,
    Reflecting,
    FallbackActing,
    FallbackReasoning,
    FallbackReflecting,
    Generating,
    Done,
}

/// Answer plus the trace of the run that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: uuid::Uuid,
    pub answer: Answer,
    pub phases: Vec<RunPhase>,
    pub observations: Vec<Observation>,
    pub fallback_ran: bool,
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ToolKind::SemanticSearch => "semantic_search",
            ToolKind::CatalogLookup => "catalog_lookup",
            ToolKind::WebSearch => "web_search",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunPhase::Planning => "PLAN",
            RunPhase::Acting => "ACT",
            RunPhase::Reasoning => "REASON",
            RunPhase::Reflecting => "REFLECT",
            RunPhase::FallbackActing => "FALLBACK-ACT",
            RunPhase::FallbackReasoning => "FALLBACK-REASON",
            RunPhase::FallbackReflecting => "FALLBACK-REFLECT",
            RunPhase::Generating => "GENERATE",
            RunPhase::Done => "DONE",
        };
        write!(f, "{}", s)
    }
}

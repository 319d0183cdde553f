//! Fallback controller
//!
//! One extra retrieval cycle when the first verdict is rejected: web search
//! with the original query, then the catalog again for the same region.
//! Both calls are issued regardless of which initial step under-performed.

use crate::models::{ConfidenceVerdict, PlanStep, Query, ToolKind};
use serde_json::json;

#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackPolicy;

impl FallbackPolicy {
    /// The fallback runs at most once per query.
    pub fn should_run(&self, verdict: &ConfidenceVerdict, already_ran: bool) -> bool {
        !verdict.accepted && !already_ran
    }

    pub fn steps(&self, query: &Query) -> Vec<PlanStep> {
        vec![
            PlanStep::new(ToolKind::WebSearch, json!({ "query": query.text })),
            PlanStep::new(ToolKind::CatalogLookup, json!({ "region": query.region })),
        ]
    }
}

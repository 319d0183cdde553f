//! Plan generation
//!
//! The plan is a fixed retrieval heuristic, not an open-ended planner:
//! check the knowledge base, then the live catalog for the region.

use crate::models::{PlanStep, Query, ToolKind};
use serde_json::json;
use tracing::info;

pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// Trait for plan generation
pub trait Planner: Send + Sync {
    fn plan(&self, query: &Query) -> Vec<PlanStep>;
}

/// Two-step plan: semantic search over the query text, then a catalog lookup
/// scoped to the query's region.
#[derive(Debug, Clone)]
pub struct HeuristicPlanner {
    search_limit: usize,
}

impl HeuristicPlanner {
    pub fn new(search_limit: usize) -> Self {
        Self { search_limit }
    }
}

impl Default for HeuristicPlanner {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_LIMIT)
    }
}

impl Planner for HeuristicPlanner {
    fn plan(&self, query: &Query) -> Vec<PlanStep> {
        let steps = vec![
            PlanStep::new(
                ToolKind::SemanticSearch,
                json!({ "query": query.text, "limit": self.search_limit }),
            ),
            PlanStep::new(ToolKind::CatalogLookup, json!({ "region": query.region })),
        ];

        info!(
            steps = ?steps.iter().map(|s| s.tool).collect::<Vec<_>>(),
            region = %query.region,
            "Planned steps"
        );

        steps
    }
}

//! Web search capability
//!
//! No search backend is wired in yet. Register another `Tool` of kind
//! `WebSearch` to replace the stub.

use super::{require_str, Tool};
use crate::models::ToolKind;
use crate::Result;
use serde_json::Value;
use tracing::info;

pub struct StubWebSearch;

#[async_trait::async_trait]
impl Tool for StubWebSearch {
    fn kind(&self) -> ToolKind {
        ToolKind::WebSearch
    }

    fn description(&self) -> &'static str {
        "Search the public web for recent plan announcements"
    }

    async fn execute(&self, args: &Value) -> Result<Vec<Value>> {
        let query = require_str(args, "query")?;
        info!(query = %query, "web_search called");
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_stub_returns_nothing() {
        let records = StubWebSearch
            .execute(&json!({"query": "new jio plans"}))
            .await
            .unwrap();
        assert!(records.is_empty());
    }
}

//! Live product catalog lookup
//!
//! Calls the configured catalog endpoint, or serves the built-in sample
//! plans when no endpoint is configured.

use super::{ensure_object_parameters, require_str, Tool};
use crate::error::OrchestrationError;
use crate::models::ToolKind;
use crate::Result;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

pub struct ProductCatalogTool {
    client: Client,
    url: Option<String>,
}

impl ProductCatalogTool {
    pub fn new(url: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(8)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, url })
    }

    async fn fetch(&self, url: &str, region: &str) -> Result<Vec<Value>> {
        let response = self
            .client
            .get(url)
            .query(&[("region", region)])
            .send()
            .await
            .map_err(|e| {
                OrchestrationError::ToolError(format!("Product catalog request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(OrchestrationError::ToolError(format!(
                "Product catalog returned {} for region {}",
                status, region
            )));
        }

        let body = response.json::<Value>().await.map_err(|e| {
            OrchestrationError::ToolError(format!("Invalid catalog JSON response: {}", e))
        })?;

        Ok(catalog_records(body))
    }
}

/// Flatten a catalog response body into plan records.
fn catalog_records(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("plans") {
            Some(Value::Array(items)) => items,
            Some(other) => {
                obj.insert("plans".to_string(), other);
                vec![Value::Object(obj)]
            }
            None => vec![Value::Object(obj)],
        },
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

/// Sample plans served when no catalog endpoint is configured.
pub fn sample_catalog() -> Vec<Value> {
    vec![
        json!({
            "name": "Super 2GB/day",
            "price": 199,
            "data_per_day": "2GB",
            "validity_days": 28,
            "last_updated": "2025-08-12T10:00:00Z",
        }),
        json!({
            "name": "Ultra 3GB/day",
            "price": 299,
            "data_per_day": "3GB",
            "validity_days": 30,
            "last_updated": "2025-08-13T09:00:00Z",
        }),
    ]
}

#[async_trait::async_trait]
impl Tool for ProductCatalogTool {
    fn kind(&self) -> ToolKind {
        ToolKind::CatalogLookup
    }

    fn description(&self) -> &'static str {
        "Look up live prepaid plans for a region from the product catalog"
    }

    async fn execute(&self, args: &Value) -> Result<Vec<Value>> {
        ensure_object_parameters(args)?;
        let region = require_str(args, "region")?;

        match self.url.as_deref() {
            Some(url) => self.fetch(url, region).await,
            None => {
                debug!(region = %region, "No catalog endpoint configured, serving sample plans");
                Ok(sample_catalog())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sample_catalog_without_endpoint() {
        let tool = ProductCatalogTool::new(None, Duration::from_secs(1)).unwrap();
        let records = tool.execute(&json!({"region": "Maharashtra"})).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["name"], "Super 2GB/day");
        assert_eq!(records[1]["price"], 299);
    }

    #[tokio::test]
    async fn test_missing_region_is_rejected() {
        let tool = ProductCatalogTool::new(None, Duration::from_secs(1)).unwrap();
        let result = tool.execute(&json!({})).await;
        assert!(matches!(result, Err(OrchestrationError::InvalidToolInput(_))));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_tool_error() {
        let tool = ProductCatalogTool::new(
            Some("http://127.0.0.1:9/catalog".to_string()),
            Duration::from_secs(2),
        )
        .unwrap();

        let result = tool.execute(&json!({"region": "Kerala"})).await;
        assert!(matches!(result, Err(OrchestrationError::ToolError(_))));
    }

    #[test]
    fn test_catalog_records_shapes() {
        let list = catalog_records(json!([{"name": "a"}, {"name": "b"}]));
        assert_eq!(list.len(), 2);

        let wrapped = catalog_records(json!({"plans": [{"name": "a"}], "region": "Goa"}));
        assert_eq!(wrapped, vec![json!({"name": "a"})]);

        let single = catalog_records(json!({"name": "solo"}));
        assert_eq!(single, vec![json!({"name": "solo"})]);

        assert!(catalog_records(Value::Null).is_empty());
    }
}

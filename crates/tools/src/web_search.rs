//! Web search tool (stub implementation).
//!
//! Returns canned results. A production deployment would back this with a
//! real search API; the tool surface and outcome shape stay the same.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use benchpilot_core::{Tool, ToolError, ToolOutcome};

pub struct WebSearchTool {
    max_results: usize,
}

impl WebSearchTool {
    pub fn new() -> Self {
        Self { max_results: 5 }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for reference material, e.g. component datasheets"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "Search query"}
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<ToolOutcome, ToolError> {
        let query = arguments
            .get("query")
            .and_then(Value::as_str)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| ToolError::InvalidArguments("missing required argument 'query'".into()))?;

        debug!(query = %query, "web search (stub)");
        let results: Vec<Value> = (1..=self.max_results.min(3))
            .map(|i| {
                json!({
                    "title": format!("Result {i} for '{query}'"),
                    "url": format!("https://example.com/search/{i}"),
                    "snippet": format!("Placeholder search result {i}."),
                })
            })
            .collect();

        Ok(
            ToolOutcome::success(format!("{} result(s) for '{query}'", results.len()))
                .with_data(json!({"results": results})),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn search_returns_results() {
        let tool = WebSearchTool::new();
        let outcome = tool
            .execute(json!({"query": "2N7002 datasheet"}))
            .await
            .unwrap();
        assert!(outcome.is_success());
        assert!(!outcome.data.unwrap()["results"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_query_is_rejected() {
        let tool = WebSearchTool::new();
        let err = tool.execute(json!({"query": ""})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}

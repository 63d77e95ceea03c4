// Telemetry source trait - Where raw meter pages come from
use crate::domain::selection::Selection;
use async_trait::async_trait;
use serde_json::Value;

/// Parameters for one page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub selection: Selection,
    pub max_pages: u32,
}

#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Fetch one raw page (`device_info`, `threshold_values`, `mapped_data`) for the selection.
    /// Transport failures are errors; payload shape is checked by the normalizer.
    async fn fetch_page(&self, query: &PageQuery) -> anyhow::Result<Value>;
}

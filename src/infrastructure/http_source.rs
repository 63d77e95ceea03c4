// HTTP telemetry source - Fetches raw meter pages from the transform endpoint
use crate::application::telemetry_source::{PageQuery, TelemetrySource};
use crate::infrastructure::config::{SourceSettings, prepare_url};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpTelemetrySource {
    client: reqwest::Client,
    url_template: String,
}

impl HttpTelemetrySource {
    pub fn new(settings: &SourceSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, url_template: settings.url_template.clone() })
    }

    fn build_url(&self, query: &PageQuery) -> String {
        let selection = &query.selection;
        let mut vars = HashMap::new();
        vars.insert("meter".to_string(), selection.meter.clone());
        vars.insert("start_date".to_string(), selection.range.start_date.to_string());
        vars.insert("end_date".to_string(), selection.range.end_date.to_string());
        vars.insert("max_pages".to_string(), query.max_pages.to_string());
        prepare_url(&self.url_template, &vars)
    }
}

#[async_trait]
impl TelemetrySource for HttpTelemetrySource {
    async fn fetch_page(&self, query: &PageQuery) -> Result<Value> {
        let url = self.build_url(query);
        tracing::debug!(%url, "fetching telemetry page");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request to telemetry endpoint")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Telemetry request failed with status {}: {}", status, body);
        }

        response
            .json::<Value>()
            .await
            .context("Failed to parse telemetry response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::selection::{DateRange, Selection};
    use chrono::NaiveDate;

    #[test]
    fn test_build_url() {
        let source = HttpTelemetrySource::new(&SourceSettings {
            url_template: "http://meters/fetch?device_serial_number=${meter}&start_date=${start_date}&end_date=${end_date}&max_pages=${max_pages}".into(),
            max_pages: 1000,
            timeout_secs: 5,
        })
        .unwrap();
        let range = DateRange {
            start_date: NaiveDate::from_ymd_opt(2024, 4, 28).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        };
        let query = PageQuery { selection: Selection::new("WR2001000008", range), max_pages: 250 };

        assert_eq!(
            source.build_url(&query),
            "http://meters/fetch?device_serial_number=WR2001000008&start_date=2024-04-28&end_date=2024-05-01&max_pages=250"
        );
    }
}

// Export rendering - Row projections as CSV or JSON files
use crate::domain::chart::RowSet;
use anyhow::{Context, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Json => "application/json",
        }
    }
}

/// `{meter}_{view}.{ext}`
pub fn file_name(meter: &str, view: &str, format: ExportFormat) -> String {
    format!("{}_{}.{}", meter, view, format.extension())
}

pub fn render(rows: &RowSet, format: ExportFormat) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Csv => render_csv(rows),
        ExportFormat::Json => {
            serde_json::to_vec(&rows.records()).context("Failed to serialize rows as JSON")
        }
    }
}

fn render_csv(rows: &RowSet) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&rows.columns)?;

    for row in &rows.rows {
        let mut record = Vec::with_capacity(row.values.len() + 1);
        record.push(row.timestamp.clone().unwrap_or_default());
        // empty cell for a missing reading
        record.extend(row.values.iter().map(|v| v.map(|v| v.to_string()).unwrap_or_default()));
        writer.write_record(&record)?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e.error()))
}

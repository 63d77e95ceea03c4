// Chart-ready output models
use super::view::BaseKind;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Axis {
    #[serde(rename = "y1")]
    Left,
    #[serde(rename = "y2")]
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesRole {
    Data,
    ThresholdHigh,
    ThresholdLow,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub label: String,
    pub axis: Axis,
    pub role: SeriesRole,
    pub x: Vec<Option<String>>,
    pub y: Vec<Option<f64>>,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisTitle {
    pub axis: Axis,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDataset {
    pub view: String,
    pub title: String,
    pub kind: BaseKind,
    pub series: Vec<Series>,
    pub axis_titles: Vec<AxisTitle>,
}

impl ChartDataset {
    pub fn data_series(&self) -> impl Iterator<Item = &Series> {
        self.series.iter().filter(|s| s.role == SeriesRole::Data)
    }
}

/// Tabular projection: the first column is always the formatted timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub timestamp: Option<String>,
    pub values: Vec<Option<f64>>,
}

pub const TIMESTAMP_COLUMN: &str = "timestamp";

impl RowSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows as flat records keyed by column, preserving column order.
    pub fn records(&self) -> Vec<RowRecord<'_>> {
        self.rows
            .iter()
            .map(|row| RowRecord { columns: &self.columns, row })
            .collect()
    }
}

pub struct RowRecord<'a> {
    columns: &'a [String],
    row: &'a Row,
}

impl Serialize for RowRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        let mut columns = self.columns.iter();
        if let Some(first) = columns.next() {
            map.serialize_entry(first, &self.row.timestamp)?;
        }
        for (column, value) in columns.zip(&self.row.values) {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

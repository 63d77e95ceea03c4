// Series assembler - Chart datasets and row projections from a normalized set
use crate::application::metric_catalog::MetricCatalog;
use crate::application::palette::{THRESHOLD_HIGH_COLOR, THRESHOLD_LOW_COLOR, colors};
use crate::domain::chart::{
    Axis, AxisTitle, ChartDataset, Row, RowSet, Series, SeriesRole, TIMESTAMP_COLUMN,
};
use crate::domain::error::{EngineError, Result};
use crate::domain::field::{as_number, leaf, resolve};
use crate::domain::metric::{APPARENT_POWER, MetricConfig, REACTIVE_POWER, ThresholdPointer};
use crate::domain::telemetry::NormalizedSeriesSet;
use crate::domain::view::{BaseKind, ViewDescriptor};
use serde_json::Value;

/// One metric placed on one axis of a view.
struct Side<'a> {
    metric: &'a MetricConfig,
    axis: Axis,
    /// Row-projection column prefix; `None` keeps the bare field name.
    column_prefix: Option<String>,
}

struct Layout<'a> {
    title: String,
    sides: Vec<Side<'a>>,
    axis_titles: Vec<AxisTitle>,
}

/// A field together with its channel data, checked before any output is built.
struct Column<'a> {
    field: &'a str,
    values: &'a [Option<f64>],
}

pub struct SeriesAssembler<'a> {
    set: &'a NormalizedSeriesSet,
    catalog: &'a MetricCatalog,
}

impl<'a> SeriesAssembler<'a> {
    pub fn new(set: &'a NormalizedSeriesSet, catalog: &'a MetricCatalog) -> Self {
        Self { set, catalog }
    }

    pub fn assemble(&self, view: &ViewDescriptor) -> Result<ChartDataset> {
        let layout = self.layout(view)?;
        let columns = self.columns(&layout.sides, view)?;
        let kind = view.render_kind();
        let x = self.set.x_axis();

        let total: usize = columns.iter().map(Vec::len).sum();
        let mut palette = colors(total).into_iter();

        let mut series = Vec::with_capacity(total);
        for (side, side_columns) in layout.sides.iter().zip(&columns) {
            for column in side_columns {
                let label = phase_label(&side.metric.title, column.field);
                let color = palette.next().map(|c| c.to_string()).unwrap_or_default();
                let (x, y) = if kind.is_radial() {
                    (vec![Some(label.clone())], vec![mean(column.values)])
                } else {
                    (x.clone(), column.values.to_vec())
                };
                series.push(Series {
                    label,
                    axis: side.axis,
                    role: SeriesRole::Data,
                    x,
                    y,
                    color,
                });
            }
        }

        if matches!(view, ViewDescriptor::Base { chart: BaseKind::Line | BaseKind::Bar, .. }) {
            for side in &layout.sides {
                series.extend(self.threshold_overlay(side.metric, side.axis));
            }
        }

        tracing::debug!("Assembled view '{}' with {} series", view.name(), series.len());
        Ok(ChartDataset {
            view: view.name(),
            title: layout.title,
            kind,
            series,
            axis_titles: if kind.is_radial() { Vec::new() } else { layout.axis_titles },
        })
    }

    /// One row per timestamp, one column per field of the view's metrics.
    pub fn assemble_rows(&self, view: &ViewDescriptor) -> Result<RowSet> {
        let layout = self.layout(view)?;
        let columns = self.columns(&layout.sides, view)?;

        let mut names = vec![TIMESTAMP_COLUMN.to_string()];
        let mut sources = Vec::new();
        for (side, side_columns) in layout.sides.iter().zip(&columns) {
            for column in side_columns {
                let name = leaf(column.field);
                names.push(match &side.column_prefix {
                    Some(prefix) => format!("{}_{}", prefix, name),
                    None => name.to_string(),
                });
                sources.push(column.values);
            }
        }

        let rows = self
            .set
            .timestamps
            .iter()
            .enumerate()
            .map(|(i, timestamp)| Row {
                timestamp: timestamp.as_deref().map(format_timestamp),
                values: sources.iter().map(|values| values[i]).collect(),
            })
            .collect();

        Ok(RowSet { columns: names, rows })
    }

    /// Flat high/low reference lines for every threshold of `metric`. Pointers that resolve to
    /// nothing numeric are left out.
    pub fn threshold_overlay(&self, metric: &MetricConfig, axis: Axis) -> Vec<Series> {
        let x = self.set.x_axis();
        let mut overlay = Vec::new();

        for (key, bounds) in &metric.thresholds {
            let levels = [
                (&bounds.high, SeriesRole::ThresholdHigh, "High", THRESHOLD_HIGH_COLOR),
                (&bounds.low, SeriesRole::ThresholdLow, "Low", THRESHOLD_LOW_COLOR),
            ];
            for (pointer, role, name, color) in levels {
                let Some(pointer) = pointer else { continue };
                for (phase, value) in self.threshold_levels(key, pointer) {
                    overlay.push(Series {
                        label: format!("{} {} {} Threshold", metric.title, phase, name),
                        axis,
                        role,
                        x: x.clone(),
                        y: vec![Some(value); x.len()],
                        color: color.to_string(),
                    });
                }
            }
        }
        overlay
    }

    fn threshold_levels(&self, key: &str, pointer: &ThresholdPointer) -> Vec<(String, f64)> {
        let paths = pointer.paths();
        let per_phase = paths.len() > 1;
        let mut levels = Vec::new();

        for (i, path) in paths.iter().enumerate() {
            let phase = if per_phase { (i + 1).to_string() } else { phase_suffix(key).to_string() };
            match resolve(&self.set.threshold_values, path) {
                Some(Value::Array(items)) => {
                    for (j, item) in items.iter().enumerate() {
                        if let Some(value) = as_number(item) {
                            let phase = if per_phase { format!("{}.{}", phase, j + 1) } else { (j + 1).to_string() };
                            levels.push((phase, value));
                        }
                    }
                }
                Some(value) => {
                    if let Some(value) = as_number(value) {
                        levels.push((phase, value));
                    }
                }
                None => tracing::debug!("Threshold '{}' not present, skipping", path),
            }
        }
        levels
    }

    fn layout(&self, view: &ViewDescriptor) -> Result<Layout<'a>> {
        match view {
            ViewDescriptor::Base { metric, .. } => {
                let metric = self.catalog.get(metric)?;
                if metric.is_composite_alias() {
                    let sides = self.pinned(Axis::Left, Axis::Right)?;
                    let axis_titles = sides
                        .iter()
                        .map(|side| AxisTitle { axis: side.axis, title: side.metric.axis_title() })
                        .collect();
                    return Ok(Layout { title: metric.title.clone(), sides, axis_titles });
                }
                Ok(Layout {
                    title: metric.title.clone(),
                    sides: vec![Side { metric, axis: Axis::Left, column_prefix: None }],
                    axis_titles: vec![AxisTitle { axis: Axis::Left, title: metric.axis_title() }],
                })
            }
            ViewDescriptor::Combo { metric_a, metric_b } => {
                let a = self.catalog.get(metric_a)?;
                let b = self.catalog.get(metric_b)?;
                let mut sides = self.side(a, Axis::Left)?;
                sides.extend(self.side(b, Axis::Right)?);
                Ok(Layout {
                    title: format!("{} vs {}", a.title, b.title),
                    sides,
                    axis_titles: vec![
                        AxisTitle { axis: Axis::Left, title: a.axis_title() },
                        AxisTitle { axis: Axis::Right, title: b.axis_title() },
                    ],
                })
            }
        }
    }

    fn side(&self, metric: &'a MetricConfig, axis: Axis) -> Result<Vec<Side<'a>>> {
        if metric.is_composite_alias() {
            return self.pinned(axis, axis);
        }
        Ok(vec![Side { metric, axis, column_prefix: Some(metric.title.clone()) }])
    }

    /// The composite alias always stands for exactly these two metrics.
    fn pinned(&self, apparent_axis: Axis, reactive_axis: Axis) -> Result<Vec<Side<'a>>> {
        Ok(vec![
            Side {
                metric: self.catalog.get(APPARENT_POWER)?,
                axis: apparent_axis,
                column_prefix: Some("Apparent".to_string()),
            },
            Side {
                metric: self.catalog.get(REACTIVE_POWER)?,
                axis: reactive_axis,
                column_prefix: Some("Reactive".to_string()),
            },
        ])
    }

    fn columns(&self, sides: &[Side<'a>], view: &ViewDescriptor) -> Result<Vec<Vec<Column<'a>>>> {
        let set = self.set;
        sides
            .iter()
            .map(|side| {
                side.metric
                    .fields
                    .iter()
                    .map(|field| {
                        let values = set.channel(field).ok_or_else(|| EngineError::MissingChannel {
                            field: field.clone(),
                            view: view.name(),
                        })?;
                        Ok(Column { field: field.as_str(), values })
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect()
    }
}

/// `("Voltage", "voltage.V1")` -> `"Voltage Phase 1"`.
fn phase_label(title: &str, field: &str) -> String {
    format!("{} Phase {}", title, phase_suffix(leaf(field)))
}

fn phase_suffix(name: &str) -> &str {
    name.char_indices().last().map(|(i, _)| &name[i..]).unwrap_or(name)
}

fn mean(values: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        None
    } else {
        Some(present.iter().sum::<f64>() / present.len() as f64)
    }
}

/// RFC3339 instant as local wall-clock time; unparsable text is kept as is.
fn format_timestamp(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

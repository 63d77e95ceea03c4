// Chart view descriptors
use super::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseKind {
    #[default]
    Line,
    Bar,
    Pie,
    Doughnut,
}

impl BaseKind {
    pub const ALL: [BaseKind; 4] = [BaseKind::Line, BaseKind::Bar, BaseKind::Pie, BaseKind::Doughnut];

    pub fn as_str(&self) -> &'static str {
        match self {
            BaseKind::Line => "line",
            BaseKind::Bar => "bar",
            BaseKind::Pie => "pie",
            BaseKind::Doughnut => "doughnut",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
    }

    /// Pie and doughnut collapse each series to a single mean value.
    pub fn is_radial(&self) -> bool {
        matches!(self, BaseKind::Pie | BaseKind::Doughnut)
    }
}

/// A requested chart view. In a combo, `metric_a` goes on the left axis and `metric_b` on the right.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewDescriptor {
    Base {
        #[serde(rename = "type")]
        chart: BaseKind,
        metric: String,
    },
    Combo { metric_a: String, metric_b: String },
}

impl ViewDescriptor {
    pub fn base(kind: BaseKind, metric: impl Into<String>) -> Self {
        ViewDescriptor::Base { chart: kind, metric: metric.into() }
    }

    pub fn combo(metric_a: impl Into<String>, metric_b: impl Into<String>) -> Self {
        ViewDescriptor::Combo { metric_a: metric_a.into(), metric_b: metric_b.into() }
    }

    /// Parse a view name as used by the chart-type selector: a base kind (`"bar"`) applied to
    /// `current_metric`, or a pair (`"voltage-current"`).
    pub fn parse(name: &str, current_metric: &str) -> Result<Self> {
        if let Some(kind) = BaseKind::parse(name) {
            return Ok(Self::base(kind, current_metric));
        }
        match name.split_once('-') {
            Some((a, b)) if !a.is_empty() && !b.is_empty() => Ok(Self::combo(a, b)),
            _ => Err(EngineError::UnknownView(name.to_string())),
        }
    }

    pub fn name(&self) -> String {
        match self {
            ViewDescriptor::Base { chart, .. } => chart.as_str().to_string(),
            ViewDescriptor::Combo { metric_a, metric_b } => {
                format!("{}-{}", metric_a.to_lowercase(), metric_b.to_lowercase())
            }
        }
    }

    /// Human label: `"apparent_power-voltage"` -> `"Apparent Power Vs Voltage"`.
    pub fn label(&self) -> String {
        let spaced = self.name().replace('_', " ").replace('-', " vs ");
        spaced
            .split(' ')
            .map(capitalize)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Metric the view is anchored on.
    pub fn primary_metric(&self) -> &str {
        match self {
            ViewDescriptor::Base { metric, .. } => metric,
            ViewDescriptor::Combo { metric_a, .. } => metric_a,
        }
    }

    /// Chart kind the renderer should use; combos always draw lines.
    pub fn render_kind(&self) -> BaseKind {
        match self {
            ViewDescriptor::Base { chart, .. } => *chart,
            ViewDescriptor::Combo { .. } => BaseKind::Line,
        }
    }

    /// Two views match when they have the same name and anchor metric.
    pub fn matches(&self, other: &ViewDescriptor) -> bool {
        self.name() == other.name() && self.primary_metric().eq_ignore_ascii_case(other.primary_metric())
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

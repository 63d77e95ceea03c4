// Metric configuration domain model
use super::view::BaseKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reserved title of the composite metric that pins Apparent_Power against Reactive_Power.
pub const COMPOSITE_ALIAS: &str = "apparent_vs_reactive_power";
pub const APPARENT_POWER: &str = "Apparent_Power";
pub const REACTIVE_POWER: &str = "Reactive_Power";

/// Unordered metric pairs that may never be combined.
pub const BANNED_PAIRS: &[(&str, &str)] = &[("apparent_power", "reactive_power")];

/// A threshold pointer: one path into the threshold snapshot, or one path per phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThresholdPointer {
    One(String),
    Many(Vec<String>),
}

impl ThresholdPointer {
    pub fn paths(&self) -> &[String] {
        match self {
            ThresholdPointer::One(path) => std::slice::from_ref(path),
            ThresholdPointer::Many(paths) => paths,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdBounds {
    pub high: Option<ThresholdPointer>,
    pub low: Option<ThresholdPointer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricConfig {
    pub title: String,
    /// Fallback unit, replaced by the unit reported in the data when there is one.
    pub unit: String,
    /// Channel group whose unit overrides `unit`.
    #[serde(default)]
    pub unit_group: Option<String>,
    #[serde(default)]
    pub chart_type: BaseKind,
    pub fields: Vec<String>,
    #[serde(default)]
    pub thresholds: BTreeMap<String, ThresholdBounds>,
}

impl MetricConfig {
    pub fn is_titled(&self, title: &str) -> bool {
        self.title.eq_ignore_ascii_case(title)
    }

    pub fn is_composite_alias(&self) -> bool {
        self.is_titled(COMPOSITE_ALIAS)
    }

    /// `"Voltage (V)"`, or the bare title when there is no unit.
    pub fn axis_title(&self) -> String {
        if self.unit.is_empty() {
            self.title.clone()
        } else {
            format!("{} ({})", self.title, self.unit)
        }
    }
}

pub fn is_banned_pair(a: &str, b: &str) -> bool {
    let (a, b) = (a.to_lowercase(), b.to_lowercase());
    BANNED_PAIRS
        .iter()
        .any(|(x, y)| (a == *x && b == *y) || (a == *y && b == *x))
}

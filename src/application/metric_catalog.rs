// Metric catalog - Declarative per-metric configuration and unit backfill
use crate::domain::error::{EngineError, Result};
use crate::domain::metric::{APPARENT_POWER, MetricConfig, REACTIVE_POWER};
use crate::domain::telemetry::{NormalizedSeriesSet, is_known_channel};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const BUILTIN_CATALOG: &str = include_str!("../../config/metrics.toml");

/// On-disk shape of `config/metrics.toml`.
#[derive(Debug, Deserialize, Clone)]
pub struct CatalogFile {
    #[serde(default)]
    pub metrics: Vec<MetricConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCatalog {
    metrics: Vec<MetricConfig>,
}

impl MetricCatalog {
    /// Validate and wrap a metric list.
    ///
    /// Titles must be unique ignoring case and every field must be a channel the normalizer
    /// produces. A catalog that declares the composite alias must also declare both metrics it pins.
    pub fn new(metrics: Vec<MetricConfig>) -> Result<Self> {
        let mut seen = HashSet::new();
        for metric in &metrics {
            if !seen.insert(metric.title.to_lowercase()) {
                return Err(EngineError::InvalidCatalog(format!(
                    "duplicate metric title '{}'",
                    metric.title
                )));
            }
            if metric.fields.is_empty() {
                return Err(EngineError::InvalidCatalog(format!(
                    "metric '{}' has no fields",
                    metric.title
                )));
            }
            if let Some(field) = metric.fields.iter().find(|f| !is_known_channel(f)) {
                return Err(EngineError::InvalidCatalog(format!(
                    "metric '{}' references unknown channel '{}'",
                    metric.title, field
                )));
            }
        }

        let catalog = Self { metrics };
        if catalog.metrics.iter().any(MetricConfig::is_composite_alias) {
            for pinned in [APPARENT_POWER, REACTIVE_POWER] {
                catalog.get(pinned).map_err(|_| {
                    EngineError::InvalidCatalog(format!("composite alias requires '{}'", pinned))
                })?;
            }
        }
        Ok(catalog)
    }

    pub fn from_file(file: CatalogFile) -> Result<Self> {
        Self::new(file.metrics)
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        let file: CatalogFile =
            toml::from_str(source).map_err(|e| EngineError::InvalidCatalog(e.to_string()))?;
        Self::from_file(file)
    }

    /// Catalog compiled into the binary from `config/metrics.toml`.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_CATALOG)
    }

    pub fn metrics(&self) -> &[MetricConfig] {
        &self.metrics
    }

    /// Case-insensitive lookup by title.
    pub fn get(&self, title: &str) -> Result<&MetricConfig> {
        self.metrics
            .iter()
            .find(|m| m.is_titled(title))
            .ok_or_else(|| EngineError::UnknownMetric(title.to_string()))
    }

    /// Copy of the catalog with each unit replaced by the unit the data reports for its group.
    pub fn resolve(&self, set: &NormalizedSeriesSet) -> MetricCatalog {
        let metrics = self
            .metrics
            .iter()
            .map(|metric| {
                let mut resolved = metric.clone();
                if let Some(unit) = metric
                    .unit_group
                    .as_deref()
                    .and_then(|group| set.unit(group))
                    .filter(|unit| !unit.is_empty())
                {
                    resolved.unit = unit.to_string();
                }
                resolved
            })
            .collect();
        MetricCatalog { metrics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fixtures::sample_page;
    use crate::application::normalizer::normalize;
    use crate::domain::metric::ThresholdPointer;
    use crate::domain::view::BaseKind;

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = MetricCatalog::builtin().unwrap();
        let titles: Vec<&str> = catalog.metrics().iter().map(|m| m.title.as_str()).collect();
        assert_eq!(
            titles,
            [
                "Voltage",
                "Current",
                "Power",
                "Apparent_vs_Reactive_Power",
                "Total_Power",
                "Frequency",
                "Apparent_Power",
                "Reactive_Power"
            ]
        );

        let apparent = catalog.get("apparent_power").unwrap();
        let kva = &apparent.thresholds["KVA"];
        assert!(matches!(kva.high, Some(ThresholdPointer::Many(ref paths)) if paths.len() == 3));
        assert!(catalog.metrics().iter().all(|m| m.chart_type == BaseKind::Line));

        let alias = catalog.get("apparent_vs_reactive_power").unwrap();
        let keys: Vec<&str> = alias.thresholds.keys().map(String::as_str).collect();
        assert_eq!(keys, ["KVA1", "KVA2", "KVA3", "Kvar1", "Kvar2", "Kvar3"]);
        assert_eq!(
            alias.thresholds["Kvar2"].low,
            Some(ThresholdPointer::One("power.Kvar.Kvar2.L2L".to_string()))
        );
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let catalog = MetricCatalog::builtin().unwrap();
        assert_eq!(catalog.get("VOLTAGE").unwrap().title, "Voltage");
        assert_eq!(
            catalog.get("humidity"),
            Err(EngineError::UnknownMetric("humidity".to_string()))
        );
    }

    #[test]
    fn test_units_backfilled_from_data() {
        let catalog = MetricCatalog::builtin().unwrap();
        let set = normalize(&sample_page(2)).unwrap();
        let resolved = catalog.resolve(&set);

        // fixture reports "kVar" where the static fallback says "kvar"
        assert_eq!(resolved.get("Reactive_Power").unwrap().unit, "kVar");
        assert_eq!(resolved.get("Voltage").unwrap().unit, "V");
        // no unit group, fallback kept
        assert_eq!(resolved.get("Apparent_vs_Reactive_Power").unwrap().unit, "kva/kvar");
        // the static catalog is left alone
        assert_eq!(catalog.get("Reactive_Power").unwrap().unit, "kvar");
    }

    #[test]
    fn test_fallback_unit_when_data_has_none() {
        let catalog = MetricCatalog::builtin().unwrap();
        let resolved = catalog.resolve(&NormalizedSeriesSet::default());
        assert_eq!(resolved.get("Frequency").unwrap().unit, "Hz");
        assert_eq!(resolved.get("Total_Power").unwrap().unit, "kW");
    }

    #[test]
    fn test_rejects_duplicate_titles() {
        let source = r#"
            [[metrics]]
            title = "Voltage"
            unit = "V"
            fields = ["voltage.V1"]

            [[metrics]]
            title = "VOLTAGE"
            unit = "V"
            fields = ["voltage.V2"]
        "#;
        assert!(matches!(
            MetricCatalog::from_toml_str(source),
            Err(EngineError::InvalidCatalog(msg)) if msg.contains("duplicate")
        ));
    }

    #[test]
    fn test_rejects_unknown_channel() {
        let source = r#"
            [[metrics]]
            title = "Humidity"
            unit = "%"
            fields = ["climate.RH"]
        "#;
        assert!(matches!(
            MetricCatalog::from_toml_str(source),
            Err(EngineError::InvalidCatalog(msg)) if msg.contains("climate.RH")
        ));
    }

    #[test]
    fn test_alias_requires_pinned_metrics() {
        let source = r#"
            [[metrics]]
            title = "Apparent_vs_Reactive_Power"
            unit = "kva/kvar"
            fields = ["power.KVA.L1"]

            [[metrics]]
            title = "Apparent_Power"
            unit = "kVA"
            fields = ["power.KVA.L1"]
        "#;
        assert!(matches!(
            MetricCatalog::from_toml_str(source),
            Err(EngineError::InvalidCatalog(msg)) if msg.contains("Reactive_Power")
        ));
    }
}

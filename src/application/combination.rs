// Combination rule engine - Which chart views are legal for a metric
use crate::application::metric_catalog::MetricCatalog;
use crate::domain::error::Result;
use crate::domain::metric::{MetricConfig, is_banned_pair};
use crate::domain::view::{BaseKind, ViewDescriptor};
use serde::Deserialize;

/// Every legal view for `current`: the four base kinds, then one combo per combinable metric in
/// catalog order.
pub fn legal_views(current: &str, catalog: &MetricCatalog) -> Result<Vec<ViewDescriptor>> {
    let current = catalog.get(current)?;

    let mut views: Vec<ViewDescriptor> = BaseKind::ALL
        .into_iter()
        .map(|kind| ViewDescriptor::base(kind, &current.title))
        .collect();

    views.extend(
        catalog
            .metrics()
            .iter()
            .filter(|candidate| is_combinable(current, candidate))
            .map(|candidate| ViewDescriptor::combo(&current.title, &candidate.title)),
    );
    Ok(views)
}

/// A candidate pairs with `current` unless it is `current` itself, the pre-combined alias, or
/// half of a banned pair.
pub fn is_combinable(current: &MetricConfig, candidate: &MetricConfig) -> bool {
    !candidate.is_titled(&current.title)
        && !candidate.is_composite_alias()
        && !is_banned_pair(&current.title, &candidate.title)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
}

/// Circular cursor over the legal views of one metric.
#[derive(Debug, Clone)]
pub struct ViewCycle {
    views: Vec<ViewDescriptor>,
    index: usize,
}

impl ViewCycle {
    /// Recompute the legal views and place the cursor on `active`, or on the first view when
    /// `active` is no longer legal.
    pub fn for_metric(
        current: &str,
        catalog: &MetricCatalog,
        active: Option<&ViewDescriptor>,
    ) -> Result<Self> {
        let views = legal_views(current, catalog)?;
        let index = active
            .and_then(|active| views.iter().position(|view| view.matches(active)))
            .unwrap_or(0);
        Ok(Self { views, index })
    }

    pub fn views(&self) -> &[ViewDescriptor] {
        &self.views
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn active(&self) -> &ViewDescriptor {
        &self.views[self.index]
    }

    pub fn step(&mut self, direction: Direction) -> &ViewDescriptor {
        let len = self.views.len();
        self.index = match direction {
            Direction::Left => (self.index + len - 1) % len,
            Direction::Right => (self.index + 1) % len,
        };
        self.active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::EngineError;
    use pretty_assertions::assert_eq;

    fn names(views: &[ViewDescriptor]) -> Vec<String> {
        views.iter().map(ViewDescriptor::name).collect()
    }

    #[test]
    fn test_voltage_views() {
        let catalog = MetricCatalog::builtin().unwrap();
        let views = legal_views("voltage", &catalog).unwrap();
        assert_eq!(
            names(&views),
            [
                "line",
                "bar",
                "pie",
                "doughnut",
                "voltage-current",
                "voltage-power",
                "voltage-total_power",
                "voltage-frequency",
                "voltage-apparent_power",
                "voltage-reactive_power"
            ]
        );
    }

    #[test]
    fn test_never_pairs_with_itself() {
        let catalog = MetricCatalog::builtin().unwrap();
        for metric in catalog.metrics() {
            let views = legal_views(&metric.title, &catalog).unwrap();
            let own = format!("{0}-{0}", metric.title.to_lowercase());
            assert!(!names(&views).contains(&own), "{} paired with itself", metric.title);
        }
    }

    #[test]
    fn test_alias_is_never_a_candidate() {
        let catalog = MetricCatalog::builtin().unwrap();
        for metric in catalog.metrics() {
            let views = legal_views(&metric.title, &catalog).unwrap();
            assert!(views.iter().all(|v| match v {
                ViewDescriptor::Combo { metric_b, .. } => !metric_b.eq_ignore_ascii_case("apparent_vs_reactive_power"),
                ViewDescriptor::Base { .. } => true,
            }));
        }
    }

    #[test]
    fn test_banned_pair_excluded_both_ways() {
        let catalog = MetricCatalog::builtin().unwrap();
        let apparent = names(&legal_views("apparent_power", &catalog).unwrap());
        let reactive = names(&legal_views("Reactive_Power", &catalog).unwrap());
        assert!(!apparent.contains(&"apparent_power-reactive_power".to_string()));
        assert!(!reactive.contains(&"reactive_power-apparent_power".to_string()));
        assert!(apparent.contains(&"apparent_power-voltage".to_string()));
    }

    #[test]
    fn test_combinability_is_symmetric() {
        let catalog = MetricCatalog::builtin().unwrap();
        let metrics = catalog.metrics();
        for a in metrics.iter().filter(|m| !m.is_composite_alias()) {
            for b in metrics.iter().filter(|m| !m.is_composite_alias()) {
                assert_eq!(is_combinable(a, b), is_combinable(b, a), "{} / {}", a.title, b.title);
            }
        }
    }

    #[test]
    fn test_unknown_metric_is_reported() {
        let catalog = MetricCatalog::builtin().unwrap();
        assert!(matches!(legal_views("humidity", &catalog), Err(EngineError::UnknownMetric(_))));
    }

    #[test]
    fn test_cycle_wraps_both_ways() {
        let catalog = MetricCatalog::builtin().unwrap();
        let mut cycle = ViewCycle::for_metric("current", &catalog, None).unwrap();
        assert_eq!(cycle.active().name(), "line");

        let last = cycle.views().last().unwrap().clone();
        assert_eq!(cycle.step(Direction::Left), &last);
        assert_eq!(cycle.step(Direction::Right).name(), "line");
        assert_eq!(cycle.step(Direction::Right).name(), "bar");
    }

    #[test]
    fn test_cycle_keeps_active_view() {
        let catalog = MetricCatalog::builtin().unwrap();
        let active = ViewDescriptor::combo("Current", "Frequency");
        let cycle = ViewCycle::for_metric("current", &catalog, Some(&active)).unwrap();
        assert_eq!(cycle.active().name(), "current-frequency");
    }

    #[test]
    fn test_cycle_falls_back_to_first_view() {
        let catalog = MetricCatalog::builtin().unwrap();
        let stale = ViewDescriptor::combo("current", "humidity");
        let cycle = ViewCycle::for_metric("current", &catalog, Some(&stale)).unwrap();
        assert_eq!(cycle.index(), 0);
    }
}

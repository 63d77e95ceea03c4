// Chart service - Use cases for views, charts and tables over the current snapshot
use crate::application::assembler::SeriesAssembler;
use crate::application::combination::{Direction, ViewCycle, legal_views};
use crate::application::meter_session::{MeterSession, SeriesSnapshot};
use crate::application::metric_catalog::MetricCatalog;
use crate::domain::chart::{ChartDataset, RowSet};
use crate::domain::error::{EngineError, Result};
use crate::domain::selection::Selection;
use crate::domain::view::ViewDescriptor;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct ViewEntry {
    pub name: String,
    pub label: String,
    pub descriptor: ViewDescriptor,
}

impl From<&ViewDescriptor> for ViewEntry {
    fn from(view: &ViewDescriptor) -> Self {
        Self { name: view.name(), label: view.label(), descriptor: view.clone() }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ViewList {
    pub metric: String,
    pub index: usize,
    pub active: ViewEntry,
    pub views: Vec<ViewEntry>,
}

/// Rows plus the selection they were fetched for.
#[derive(Debug, Clone)]
pub struct TableExport {
    pub selection: Selection,
    pub view: String,
    pub rows: RowSet,
}

#[derive(Clone)]
pub struct ChartService {
    session: Arc<MeterSession>,
}

impl ChartService {
    pub fn new(session: Arc<MeterSession>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Arc<MeterSession> {
        &self.session
    }

    /// The catalog resolved against the current data, or the static one before the first fetch.
    pub fn catalog(&self) -> MetricCatalog {
        match self.session.snapshot() {
            Some(snapshot) => snapshot.catalog.clone(),
            None => self.session.catalog().clone(),
        }
    }

    /// Legal views for `metric`, with the cursor on `active` (moved one step if asked).
    pub fn views(
        &self,
        metric: &str,
        active: Option<&str>,
        step: Option<Direction>,
    ) -> Result<ViewList> {
        let catalog = self.catalog();
        let active = active.map(|name| ViewDescriptor::parse(name, metric)).transpose()?;
        let mut cycle = ViewCycle::for_metric(metric, &catalog, active.as_ref())?;
        if let Some(direction) = step {
            cycle.step(direction);
        }

        Ok(ViewList {
            metric: catalog.get(metric)?.title.clone(),
            index: cycle.index(),
            active: cycle.active().into(),
            views: cycle.views().iter().map(ViewEntry::from).collect(),
        })
    }

    pub fn chart(&self, metric: &str, view: Option<&str>) -> Result<ChartDataset> {
        let snapshot = self.loaded()?;
        let view = resolve_view(&snapshot.catalog, metric, view)?;
        SeriesAssembler::new(&snapshot.series, &snapshot.catalog).assemble(&view)
    }

    pub fn table(&self, metric: &str, view: Option<&str>) -> Result<TableExport> {
        let snapshot = self.loaded()?;
        let view = resolve_view(&snapshot.catalog, metric, view)?;
        let rows = SeriesAssembler::new(&snapshot.series, &snapshot.catalog).assemble_rows(&view)?;
        Ok(TableExport { selection: snapshot.selection.clone(), view: view.name(), rows })
    }

    pub fn loaded(&self) -> Result<Arc<SeriesSnapshot>> {
        self.session.snapshot().ok_or(EngineError::NotLoaded)
    }
}

/// Parse `view` against `metric`, defaulting to the metric's configured chart type. Only views
/// the combination rules allow for `metric` resolve.
fn resolve_view(catalog: &MetricCatalog, metric: &str, view: Option<&str>) -> Result<ViewDescriptor> {
    let config = catalog.get(metric)?;
    let requested = match view {
        Some(name) => ViewDescriptor::parse(name, &config.title)?,
        None => ViewDescriptor::base(config.chart_type, &config.title),
    };
    legal_views(&config.title, catalog)?
        .into_iter()
        .find(|legal| legal.matches(&requested))
        .ok_or_else(|| EngineError::UnknownView(requested.name()))
}

// Meter session - Session-scoped state and the single-consumer fetch pipeline
use crate::application::metric_catalog::MetricCatalog;
use crate::application::normalizer::normalize;
use crate::application::telemetry_source::{PageQuery, TelemetrySource};
use crate::domain::selection::Selection;
use crate::domain::telemetry::NormalizedSeriesSet;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// A normalized set with the catalog resolved against it. Published whole, never patched.
#[derive(Debug)]
pub struct SeriesSnapshot {
    pub request_id: u64,
    pub selection: Selection,
    pub series: NormalizedSeriesSet,
    pub catalog: MetricCatalog,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FetchStatus {
    /// Requests fully processed, whatever their outcome.
    pub completed: u64,
    /// Results thrown away because the selection changed while they were in flight.
    pub discarded: u64,
    pub in_flight: bool,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchAck {
    Accepted { request_id: u64 },
    /// Another fetch was already running.
    Dropped,
}

#[derive(Debug)]
struct FetchRequest {
    id: u64,
    generation: u64,
    query: PageQuery,
}

enum Outcome {
    Published,
    Failed(String),
    Stale,
}

struct Shared {
    catalog: MetricCatalog,
    max_pages: u32,
    selection: RwLock<Selection>,
    /// Bumped on every selection change; results from older generations are stale.
    generation: AtomicU64,
    next_request: AtomicU64,
    in_flight: AtomicBool,
    snapshot: watch::Sender<Option<Arc<SeriesSnapshot>>>,
    status: watch::Sender<FetchStatus>,
}

impl Shared {
    /// Take the in-flight guard; `false` when a fetch is already running.
    fn claim(&self) -> bool {
        self.in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Release the guard after serving `served` generation. If the selection moved on meanwhile,
    /// a request for it may have been dropped by the guard, so the guard is taken back and `true`
    /// tells the worker to fetch again.
    fn release(&self, served: u64) -> bool {
        self.in_flight.store(false, Ordering::SeqCst);
        self.generation.load(Ordering::SeqCst) != served && self.claim()
    }

    async fn next_request(&self) -> FetchRequest {
        let selection = self.selection.read().await;
        FetchRequest {
            id: self.next_request.fetch_add(1, Ordering::Relaxed) + 1,
            generation: self.generation.load(Ordering::SeqCst),
            query: PageQuery { selection: selection.clone(), max_pages: self.max_pages },
        }
    }
}

pub struct MeterSession {
    shared: Arc<Shared>,
    requests: mpsc::Sender<FetchRequest>,
}

impl MeterSession {
    /// Create the session and spawn its fetch worker. Nothing is fetched until asked.
    pub fn start(
        source: Arc<dyn TelemetrySource>,
        catalog: MetricCatalog,
        selection: Selection,
        max_pages: u32,
    ) -> Arc<Self> {
        let (requests, rx) = mpsc::channel(1);
        let shared = Arc::new(Shared {
            catalog,
            max_pages,
            selection: RwLock::new(selection),
            generation: AtomicU64::new(0),
            next_request: AtomicU64::new(0),
            in_flight: AtomicBool::new(false),
            snapshot: watch::Sender::new(None),
            status: watch::Sender::new(FetchStatus::default()),
        });

        let worker = FetchWorker { shared: shared.clone(), source };
        tokio::spawn(worker.run(rx));

        Arc::new(Self { shared, requests })
    }

    pub fn catalog(&self) -> &MetricCatalog {
        &self.shared.catalog
    }

    pub async fn selection(&self) -> Selection {
        self.shared.selection.read().await.clone()
    }

    /// Switch meter or date range and fetch for it.
    pub async fn select(&self, selection: Selection) -> FetchAck {
        {
            let mut current = self.shared.selection.write().await;
            if *current != selection {
                tracing::info!(
                    "Selection changed to {} ({} .. {})",
                    selection.meter,
                    selection.range.start_date,
                    selection.range.end_date
                );
                *current = selection;
                self.shared.generation.fetch_add(1, Ordering::SeqCst);
            }
        }
        self.request_fetch().await
    }

    /// Enqueue a fetch for the current selection unless one is already running.
    pub async fn request_fetch(&self) -> FetchAck {
        if !self.shared.claim() {
            tracing::warn!("Fetch already in flight, dropping request");
            return FetchAck::Dropped;
        }

        let request = self.shared.next_request().await;
        let request_id = request.id;
        self.shared.status.send_modify(|s| s.in_flight = true);

        if let Err(e) = self.requests.try_send(request) {
            tracing::error!("Fetch worker unavailable: {}", e);
            self.shared.in_flight.store(false, Ordering::Release);
            self.shared.status.send_modify(|s| s.in_flight = false);
            return FetchAck::Dropped;
        }

        tracing::debug!("Accepted fetch request {}", request_id);
        FetchAck::Accepted { request_id }
    }

    /// Poll tick: fetch only while the selected range ends `today`.
    pub async fn poll_tick(&self, today: NaiveDate) -> Option<FetchAck> {
        let selection = self.selection().await;
        if !selection.range.ends_on(today) {
            tracing::debug!("Polling suspended, range ends {}", selection.range.end_date);
            return None;
        }
        Some(self.request_fetch().await)
    }

    pub fn snapshot(&self) -> Option<Arc<SeriesSnapshot>> {
        self.shared.snapshot.borrow().clone()
    }

    #[cfg(test)]
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<SeriesSnapshot>>> {
        self.shared.snapshot.subscribe()
    }

    pub fn status(&self) -> FetchStatus {
        self.shared.status.borrow().clone()
    }

    pub fn status_updates(&self) -> watch::Receiver<FetchStatus> {
        self.shared.status.subscribe()
    }
}

/// Re-trigger fetches on a fixed interval.
pub fn spawn_poller(session: Arc<MeterSession>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // the first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            session.poll_tick(chrono::Local::now().date_naive()).await;
        }
    })
}

struct FetchWorker {
    shared: Arc<Shared>,
    source: Arc<dyn TelemetrySource>,
}

impl FetchWorker {
    async fn run(self, mut rx: mpsc::Receiver<FetchRequest>) {
        while let Some(mut request) = rx.recv().await {
            loop {
                let outcome = loop {
                    match self.process(&request).await {
                        Outcome::Stale => {
                            self.shared.status.send_modify(|s| s.discarded += 1);
                            request = self.shared.next_request().await;
                            tracing::info!("Catching up with current selection as request {}", request.id);
                        }
                        outcome => break outcome,
                    }
                };

                let catch_up = self.shared.release(request.generation);
                self.shared.status.send_modify(|s| {
                    s.completed += 1;
                    s.in_flight = catch_up;
                    s.last_error = match &outcome {
                        Outcome::Failed(message) => Some(message.clone()),
                        _ => None,
                    };
                });
                if !catch_up {
                    break;
                }

                request = self.shared.next_request().await;
                tracing::info!("Selection changed while publishing, fetching again as request {}", request.id);
            }
        }
        tracing::debug!("Fetch worker stopped");
    }

    async fn process(&self, request: &FetchRequest) -> Outcome {
        let selection = &request.query.selection;
        tracing::debug!("Fetching request {} for meter {}", request.id, selection.meter);

        let result = match self.source.fetch_page(&request.query).await {
            Ok(page) => normalize(&page).map_err(anyhow::Error::from),
            Err(e) => Err(e),
        };

        if request.generation != self.shared.generation.load(Ordering::SeqCst) {
            tracing::warn!("Discarding stale result for request {}", request.id);
            return Outcome::Stale;
        }

        match result {
            Ok(series) => {
                let snapshot = SeriesSnapshot {
                    request_id: request.id,
                    selection: selection.clone(),
                    catalog: self.shared.catalog.resolve(&series),
                    series,
                    fetched_at: Utc::now(),
                };
                if snapshot.series.is_empty() {
                    tracing::warn!("Meter {} returned no records for {}", selection.meter, selection.range.start_date);
                }
                tracing::info!(
                    "Published {} records for meter {} (request {})",
                    snapshot.series.len(),
                    selection.meter,
                    request.id
                );
                self.shared.snapshot.send_replace(Some(Arc::new(snapshot)));
                Outcome::Published
            }
            Err(e) => {
                tracing::error!("Fetch {} for meter {} failed: {:#}", request.id, selection.meter, e);
                Outcome::Failed(format!("{:#}", e))
            }
        }
    }
}

//! The crawl controller: lifecycle, worker pool and link admission.

use crate::canonical::{self, CanonicalUrl};
use crate::config::CrawlConfig;
use crate::error::{CrawlError, Result};
use crate::extract::{self, Extraction};
use crate::fetch::{FetchOutcome, Fetcher};
use crate::frontier::{Frontier, FrontierEntry};
use crate::graph::{Graph, PageStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

/// Lifecycle of one crawl run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlState {
    Idle,
    Running,
    Paused,
    Completed,
    Cancelled,
    Failed,
}

/// Emitted once per completed fetch, in completion order. Consumers use this
/// for live display only; the graph snapshot is the source of truth.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlEvent {
    pub url: CanonicalUrl,
    pub depth: usize,
    pub status: PageStatus,
    pub out_degree: usize,
    pub timestamp: DateTime<Utc>,
}

pub type EventCallback = Arc<dyn Fn(CrawlEvent) + Send + Sync>;

/// Frontier plus the bookkeeping the workers need to agree on: how many
/// entries are being processed right now and which BFS level is open.
///
/// Entries deeper than the open level are held back until every fetch at the
/// current level has finished, so a recorded depth is always the true
/// shortest link-distance from the seed, independent of worker count.
struct Scheduler {
    frontier: Frontier,
    in_flight: usize,
    level: usize,
}

enum Dispatch {
    Work(FrontierEntry),
    Wait,
    Done,
}

impl Scheduler {
    fn next(&mut self) -> Dispatch {
        match self.frontier.peek_depth() {
            None if self.in_flight == 0 => Dispatch::Done,
            None => Dispatch::Wait,
            Some(depth) if depth <= self.level || self.in_flight == 0 => {
                if depth > self.level {
                    self.level = depth;
                }
                match self.frontier.pop() {
                    Some(entry) => {
                        self.in_flight += 1;
                        Dispatch::Work(entry)
                    }
                    None => Dispatch::Wait,
                }
            }
            Some(_) => Dispatch::Wait,
        }
    }
}

/// Orchestrates one crawl: owns the frontier and the graph, drives a bounded
/// pool of fetch workers, and exposes progress and results.
///
/// A `Crawler` runs exactly once; build a new one per run.
pub struct Crawler {
    config: CrawlConfig,
    scheduler: Arc<Mutex<Scheduler>>,
    graph: Arc<Mutex<Graph>>,
    state: Arc<StdMutex<CrawlState>>,
    cancelled: Arc<AtomicBool>,
    event_callback: Option<EventCallback>,
}

impl Crawler {
    pub fn new(config: CrawlConfig) -> Self {
        let scheduler = Scheduler {
            frontier: Frontier::new(config.max_depth, config.max_pages),
            in_flight: 0,
            level: 0,
        };
        Self {
            config,
            scheduler: Arc::new(Mutex::new(scheduler)),
            graph: Arc::new(Mutex::new(Graph::new())),
            state: Arc::new(StdMutex::new(CrawlState::Idle)),
            cancelled: Arc::new(AtomicBool::new(false)),
            event_callback: None,
        }
    }

    pub fn with_event_callback(mut self, callback: EventCallback) -> Self {
        self.event_callback = Some(callback);
        self
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    pub fn state(&self) -> CrawlState {
        *self.state.lock().unwrap()
    }

    fn set_state(&self, next: CrawlState) {
        *self.state.lock().unwrap() = next;
    }

    /// Stop dispatching new fetches. In-flight fetches finish and their
    /// results are still recorded.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Hold back new fetch dispatch without ending the run.
    pub fn pause(&self) {
        let mut state = self.state.lock().unwrap();
        if *state == CrawlState::Running {
            *state = CrawlState::Paused;
        }
    }

    pub fn resume(&self) {
        let mut state = self.state.lock().unwrap();
        if *state == CrawlState::Paused {
            *state = CrawlState::Running;
        }
    }

    /// Read-only snapshot of the graph, valid at any point during the run
    /// and stable once the run reaches a terminal state.
    pub async fn graph(&self) -> Graph {
        self.graph.lock().await.clone()
    }

    /// Execute the crawl to a terminal state and return the final graph.
    pub async fn run(&self) -> Result<Graph> {
        {
            let mut state = self.state.lock().unwrap();
            if *state != CrawlState::Idle {
                return Err(CrawlError::Other("crawl already started".into()));
            }
            *state = CrawlState::Running;
        }

        let (fetcher, seed_entry, seed_host) = match self.prepare() {
            Ok(parts) => parts,
            Err(e) => {
                self.set_state(CrawlState::Failed);
                return Err(e);
            }
        };

        info!(
            "Starting crawl of {} with {} workers",
            self.config.seed_url, self.config.workers
        );

        {
            let mut scheduler = self.scheduler.lock().await;
            scheduler.frontier.push(seed_entry);
        }

        let fetcher = Arc::new(fetcher);
        let mut handles = Vec::new();
        for worker_id in 0..self.config.workers {
            let worker = Worker {
                config: self.config.clone(),
                seed_host: seed_host.clone(),
                fetcher: fetcher.clone(),
                scheduler: self.scheduler.clone(),
                graph: self.graph.clone(),
                state: self.state.clone(),
                cancelled: self.cancelled.clone(),
                event_callback: self.event_callback.clone(),
            };
            handles.push(tokio::spawn(worker.run(worker_id)));
        }

        for joined in futures::future::join_all(handles).await {
            joined?;
        }

        let terminal = if self.cancelled.load(Ordering::SeqCst) {
            CrawlState::Cancelled
        } else {
            CrawlState::Completed
        };
        self.set_state(terminal);

        let graph = self.graph.lock().await.clone();
        info!(
            "Crawl {:?}: {} pages, {} edges, {} parameter endpoints",
            terminal,
            graph.page_count(),
            graph.edge_count(),
            graph.endpoints.len()
        );
        Ok(graph)
    }

    /// Validate the configuration and build the seed entry. Any error here
    /// fails the run before a single request goes out.
    fn prepare(&self) -> Result<(Fetcher, FrontierEntry, String)> {
        self.config.validate()?;

        let mut seed = Url::parse(&self.config.seed_url)
            .map_err(|e| CrawlError::InvalidUrl(format!("{}: {}", self.config.seed_url, e)))?;
        seed.set_fragment(None);

        let key = canonical::canonical_key(&seed);
        let seed_host = key.host().unwrap_or_default().to_string();
        let fetcher = Fetcher::new(&self.config)?;

        Ok((
            fetcher,
            FrontierEntry {
                key,
                raw: seed,
                depth: 0,
            },
            seed_host,
        ))
    }
}

struct Worker {
    config: CrawlConfig,
    seed_host: String,
    fetcher: Arc<Fetcher>,
    scheduler: Arc<Mutex<Scheduler>>,
    graph: Arc<Mutex<Graph>>,
    state: Arc<StdMutex<CrawlState>>,
    cancelled: Arc<AtomicBool>,
    event_callback: Option<EventCallback>,
}

impl Worker {
    async fn run(self, worker_id: usize) {
        debug!("Worker {} started", worker_id);

        loop {
            if self.cancelled.load(Ordering::SeqCst) {
                break;
            }
            if *self.state.lock().unwrap() == CrawlState::Paused {
                tokio::time::sleep(Duration::from_millis(50)).await;
                continue;
            }

            let dispatch = { self.scheduler.lock().await.next() };
            let entry = match dispatch {
                Dispatch::Work(entry) => entry,
                Dispatch::Wait => {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    continue;
                }
                Dispatch::Done => break,
            };

            let outcome = self.fetcher.fetch(&entry.raw).await;
            let (status, out_degree, admitted) = self.process(&entry, &outcome).await;

            {
                // push discovered work and retire this entry under one lock,
                // so "frontier empty and nothing in flight" means done
                let mut scheduler = self.scheduler.lock().await;
                for next in admitted {
                    scheduler.frontier.push(next);
                }
                scheduler.in_flight -= 1;
            }

            if let Some(ref callback) = self.event_callback {
                callback(CrawlEvent {
                    url: entry.key.clone(),
                    depth: entry.depth,
                    status,
                    out_degree,
                    timestamp: Utc::now(),
                });
            }

            if !self.config.delay.is_zero() {
                tokio::time::sleep(self.config.delay).await;
            }
        }

        debug!("Worker {} finished", worker_id);
    }

    /// Record the fetch outcome and, for HTML successes, walk the extracted
    /// links and forms. Returns the page status, its out-degree and the
    /// entries admitted for the frontier.
    async fn process(
        &self,
        entry: &FrontierEntry,
        outcome: &FetchOutcome,
    ) -> (PageStatus, usize, Vec<FrontierEntry>) {
        let status = match outcome {
            FetchOutcome::Success { status, .. } => PageStatus::Http(*status),
            FetchOutcome::HttpError { status } => PageStatus::Http(*status),
            FetchOutcome::NetworkError { kind } => PageStatus::Failed(*kind),
            FetchOutcome::TooLarge { .. } => PageStatus::TooLarge,
        };

        {
            let mut graph = self.graph.lock().await;
            graph.record_page(entry.key.clone(), entry.depth, status);
            // the fetched URL itself may carry query parameters (seed included)
            if entry.key.has_query() {
                graph.record_query_endpoint(entry.key.clone(), entry.key.query_param_names());
            }
        }

        let FetchOutcome::Success {
            content_type, body, ..
        } = outcome
        else {
            return (status, 0, Vec::new());
        };
        if !extract::looks_like_html(content_type.as_deref(), body) {
            return (status, 0, Vec::new());
        }

        let extraction = extract::extract(&entry.raw, body);
        let (out_degree, admitted) = self.walk_targets(entry, extraction).await;
        self.graph.lock().await.set_out_degree(&entry.key, out_degree);

        (status, out_degree, admitted)
    }

    /// Turn extracted links and forms into edges, parameter endpoints and
    /// frontier candidates. Out-degree is the count of distinct targets,
    /// whether or not the domain filter admits them.
    async fn walk_targets(
        &self,
        entry: &FrontierEntry,
        extraction: Extraction,
    ) -> (usize, Vec<FrontierEntry>) {
        let mut targets: HashSet<CanonicalUrl> = HashSet::new();
        let mut admitted = Vec::new();
        let mut graph = self.graph.lock().await;

        for link in extraction.links {
            let resolved = match canonical::resolve(&entry.raw, &link) {
                Ok(url) => url,
                Err(e) => {
                    debug!("Dropping link on {}: {}", entry.key, e);
                    continue;
                }
            };
            self.admit(&mut graph, entry, resolved, &mut targets, &mut admitted);
        }

        for form in extraction.forms {
            let resolved = match canonical::resolve(&entry.raw, &form.action) {
                Ok(url) => url,
                Err(e) => {
                    debug!("Dropping form action on {}: {}", entry.key, e);
                    continue;
                }
            };
            if !form.inputs.is_empty() {
                let key = canonical::canonical_key(&resolved);
                graph.record_form_endpoint(key, form.method, form.inputs);
            }
            self.admit(&mut graph, entry, resolved, &mut targets, &mut admitted);
        }

        (targets.len(), admitted)
    }

    fn admit(
        &self,
        graph: &mut Graph,
        entry: &FrontierEntry,
        resolved: Url,
        targets: &mut HashSet<CanonicalUrl>,
        admitted: &mut Vec<FrontierEntry>,
    ) {
        let key = canonical::canonical_key(&resolved);
        let first_time = targets.insert(key.clone());

        graph.record_edge(entry.key.clone(), key.clone());
        if key.has_query() {
            graph.record_query_endpoint(key.clone(), key.query_param_names());
        }

        if !first_time {
            return;
        }
        let candidate_host = key.host().unwrap_or_default();
        if canonical::host_allowed(&self.seed_host, candidate_host, self.config.same_domain_only) {
            admitted.push(FrontierEntry {
                key,
                raw: resolved,
                depth: entry.depth + 1,
            });
        }
    }
}

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use newsroom_core::sources::SourcesDescriptor;
use newsroom_core::types::{RawItem, ScrapeCounters, SourceKind};
use newsroom_logstore::LogManager;
use newsroom_sources::SourceDriver;

use crate::orchestrator::{Ingested, ItemOptions, Orchestrator};
use crate::outcome::ItemOutcome;
use crate::params::JobParams;

/// Pause before the single retry of a retryable fetch failure.
const FETCH_RETRY_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobResult {
    #[serde(flatten)]
    pub counters: ScrapeCounters,
    pub fetched: u32,
    pub duration_ms: u64,
}

/// One job's full state. Terminal records stay queryable until cleanup.
#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub job_id: Uuid,
    pub source_kind: SourceKind,
    pub params: JobParams,
    pub state: JobState,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub result: Option<JobResult>,
    pub error: Option<String>,
    pub session_id: Option<String>,
}

/// Owns job lifecycle and drives orchestrations in background tasks.
///
/// A cheap handle around shared runner state: job records in a dashmap,
/// polled by id, with a runner-wide semaphore capping concurrent jobs.
pub struct JobRunner {
    inner: Arc<RunnerInner>,
}

struct RunnerInner {
    jobs: DashMap<Uuid, JobRecord>,
    cancel_tokens: DashMap<Uuid, CancellationToken>,
    job_slots: Semaphore,
    orchestrator: Arc<Orchestrator>,
    drivers: HashMap<SourceKind, Arc<dyn SourceDriver>>,
    descriptor: Arc<SourcesDescriptor>,
    logs: Arc<LogManager>,
    max_parallel_tasks: usize,
}

impl JobRunner {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        drivers: HashMap<SourceKind, Arc<dyn SourceDriver>>,
        descriptor: Arc<SourcesDescriptor>,
        logs: Arc<LogManager>,
        max_concurrent_jobs: usize,
        max_parallel_tasks: usize,
    ) -> Self {
        Self {
            inner: Arc::new(RunnerInner {
                jobs: DashMap::new(),
                cancel_tokens: DashMap::new(),
                job_slots: Semaphore::new(max_concurrent_jobs.max(1)),
                orchestrator,
                drivers,
                descriptor,
                logs,
                max_parallel_tasks: max_parallel_tasks.max(1),
            }),
        }
    }

    /// Accept a job, store it as pending, and schedule it in the background.
    pub fn submit(&self, kind: SourceKind, params: JobParams) -> Result<JobRecord, String> {
        params.validate()?;
        if !self.inner.drivers.contains_key(&kind) {
            return Err(format!("no driver configured for {}", kind));
        }

        let job_id = Uuid::new_v4();
        let record = JobRecord {
            job_id,
            source_kind: kind,
            params: params.clone(),
            state: JobState::Pending,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            result: None,
            error: None,
            session_id: None,
        };
        self.inner.jobs.insert(job_id, record.clone());

        let token = CancellationToken::new();
        self.inner.cancel_tokens.insert(job_id, token.clone());

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            inner.run_job(job_id, kind, params, token).await;
        });

        info!(%job_id, %kind, "job accepted");
        Ok(record)
    }

    pub fn status(&self, job_id: Uuid) -> Option<JobRecord> {
        self.inner.jobs.get(&job_id).map(|r| r.clone())
    }

    /// Recent jobs, newest first.
    pub fn list(&self, limit: usize) -> Vec<JobRecord> {
        let mut jobs: Vec<JobRecord> = self.inner.jobs.iter().map(|r| r.clone()).collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs.truncate(limit);
        jobs
    }

    /// Drop completed and failed jobs; pending and running stay.
    pub fn cleanup(&self) -> usize {
        let before = self.inner.jobs.len();
        self.inner.jobs.retain(|_, record| !record.state.is_terminal());
        before - self.inner.jobs.len()
    }

    /// Cooperative cancellation: the job finishes its current item and stops
    /// fetching. Reserved: not routed through the REST surface by default.
    pub fn cancel(&self, job_id: Uuid) -> bool {
        match self.inner.cancel_tokens.get(&job_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}

impl RunnerInner {
    async fn run_job(
        self: Arc<Self>,
        job_id: Uuid,
        kind: SourceKind,
        params: JobParams,
        token: CancellationToken,
    ) {
        let _permit = match self.job_slots.acquire().await {
            Ok(p) => p,
            Err(_) => {
                self.fail_job(job_id, "runner shutting down".to_string()).await;
                return;
            }
        };

        let started = std::time::Instant::now();
        let session_id = match self.logs.create_session().await {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "log session creation failed, logging unscoped");
                "default".to_string()
            }
        };

        if let Some(mut record) = self.jobs.get_mut(&job_id) {
            record.state = JobState::Running;
            record.started_at = Some(Utc::now());
            record.session_id = Some(session_id.clone());
        }
        self.log(
            &session_id,
            "INFO",
            &format!("job {} started: {} (max_items={})", job_id, kind, params.max_items),
        )
        .await;

        let filters: Vec<String> = if params.filters.is_empty() {
            self.descriptor.default_filters(kind).to_vec()
        } else {
            params.filters.clone()
        };
        if filters.is_empty() {
            self.log(&session_id, "ERROR", "no filters configured for source").await;
            self.fail_job(job_id, format!("no filters configured for {}", kind))
                .await;
            self.close_session(&session_id).await;
            return;
        }

        let items = match self.fetch_items(kind, &filters, params.max_items as usize).await {
            Ok(items) => items,
            Err(e) => {
                self.log(&session_id, "ERROR", &format!("fetch failed: {}", e)).await;
                self.fail_job(job_id, e).await;
                self.close_session(&session_id).await;
                return;
            }
        };
        let fetched = items.len() as u32;
        self.log(&session_id, "INFO", &format!("fetched {} items", fetched)).await;

        let opts = ItemOptions {
            enable_llm: params.enable_llm,
            enable_deduplication: params.enable_deduplication,
        };
        let mut counters = ScrapeCounters::default();
        let mut cancelled = false;

        // Editorial is the only stage worth a worker pool; ingest stays
        // sequential so the semantic gate sees each item before the next.
        let enrich_slots = Arc::new(Semaphore::new(self.max_parallel_tasks));
        let mut enrichments: JoinSet<(String, ItemOutcome)> = JoinSet::new();

        for item in items {
            if token.is_cancelled() {
                cancelled = true;
                self.log(&session_id, "WARNING", "job cancelled, stopping at item boundary")
                    .await;
                break;
            }

            let source_id = item.source_id.clone();
            match self.orchestrator.ingest(&item, opts).await {
                Ingested::Stop(outcome) => {
                    outcome.tally(&mut counters);
                    self.log_outcome(&session_id, &source_id, &outcome).await;
                }
                Ingested::Enrich { vector_id } => {
                    let permit = Arc::clone(&enrich_slots).acquire_owned().await.ok();
                    let orchestrator = Arc::clone(&self.orchestrator);
                    enrichments.spawn(async move {
                        let _permit = permit;
                        let outcome =
                            orchestrator.enrich(&item, vector_id.as_deref()).await;
                        (item.source_id, outcome)
                    });
                }
            }
        }

        while let Some(joined) = enrichments.join_next().await {
            match joined {
                Ok((source_id, outcome)) => {
                    outcome.tally(&mut counters);
                    self.log_outcome(&session_id, &source_id, &outcome).await;
                }
                Err(e) => {
                    error!(%job_id, error = %e, "enrichment task panicked");
                    counters.errors += 1;
                }
            }
        }

        let result = JobResult {
            counters,
            fetched,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        self.log(
            &session_id,
            "INFO",
            &format!(
                "job {} finished: saved={} skipped={} semantic_duplicates={} \
                 editorial_processed={} errors={}{}",
                job_id,
                counters.saved,
                counters.skipped,
                counters.semantic_duplicates,
                counters.editorial_processed,
                counters.errors,
                if cancelled { " (cancelled)" } else { "" },
            ),
        )
        .await;

        if let Some(mut record) = self.jobs.get_mut(&job_id) {
            record.state = JobState::Completed;
            record.completed_at = Some(Utc::now());
            record.result = Some(result);
        }
        self.cancel_tokens.remove(&job_id);
        self.close_session(&session_id).await;
    }

    /// One fetch per job, with a single delayed retry on retryable failures.
    async fn fetch_items(
        &self,
        kind: SourceKind,
        filters: &[String],
        max_items: usize,
    ) -> Result<Vec<RawItem>, String> {
        let driver = self
            .drivers
            .get(&kind)
            .ok_or_else(|| format!("no driver configured for {}", kind))?;

        match driver.fetch(filters, max_items).await {
            Ok(items) => Ok(items),
            Err(e) if e.is_retryable() => {
                warn!(%kind, error = %e, "fetch failed, retrying once");
                tokio::time::sleep(FETCH_RETRY_DELAY).await;
                driver
                    .fetch(filters, max_items)
                    .await
                    .map_err(|e| e.to_string())
            }
            Err(e) => Err(e.to_string()),
        }
    }

    async fn fail_job(&self, job_id: Uuid, error: String) {
        error!(%job_id, %error, "job failed");
        if let Some(mut record) = self.jobs.get_mut(&job_id) {
            record.state = JobState::Failed;
            record.completed_at = Some(Utc::now());
            record.error = Some(error);
        }
        self.cancel_tokens.remove(&job_id);
    }

    async fn log(&self, session_id: &str, level: &str, message: &str) {
        self.logs.add_log(message, level, Some(session_id), None).await;
    }

    async fn log_outcome(&self, session_id: &str, source_id: &str, outcome: &ItemOutcome) {
        let level = match outcome {
            ItemOutcome::Error { .. } => "ERROR",
            ItemOutcome::Invalid { .. } => "WARNING",
            ItemOutcome::DuplicateId => "DEBUG",
            _ => "INFO",
        };
        self.log(session_id, level, &format!("{}: {}", source_id, outcome.describe()))
            .await;
    }

    async fn close_session(&self, session_id: &str) {
        if session_id != "default" {
            if let Err(e) = self.logs.close_session(session_id).await {
                warn!(error = %e, "failed to close log session");
            }
        }
    }
}

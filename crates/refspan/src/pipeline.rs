// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Streaming range pipeline
//!
//! A run moves through
//! `Idle → ResolvingRefs → Fetching → (Filtering → Emitting)* → Completing`
//! and ends in `Done`, `Failed` or `Cancelled`. Commits are filtered, parsed
//! and delivered to an [`EventSink`] in batches; the run always ends with
//! exactly one [`StreamSummary`].
//!
//! # Example
//!
//! ```no_run
//! use refspan::config::RangeOptions;
//! use refspan::pipeline::Pipeline;
//! use refspan_github::{GithubClient, GithubConfig};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let options = RangeOptions::new("rust-lang/cargo")
//!     .with_from("0.80.0")
//!     .with_to("0.81.0");
//! let client = GithubClient::new(options.github_config())?;
//! let result = Pipeline::new(client, options).collect().await?;
//! println!("{} commits", result.total_commits);
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use refspan_git::{
    CommitId, FilterCriteria, GitError, ParsedCommit, RawCommit, RepositoryCoordinate,
};
use refspan_github::{CountingProvider, GithubClient, HistoryProvider, ProviderError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::RangeOptions;
use crate::events::CollectingSink;
use crate::fetcher::{
    ApiStrategy, FetchConfig, FetchError, FetchOutcome, RangeFetcher, ensure_files,
    select_strategy,
};
use crate::resolver::{ResolveError, resolve};

// ============================================================================
// States and outcomes
// ============================================================================

/// Lifecycle state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    /// Not started
    Idle,
    /// Resolving the two references
    ResolvingRefs,
    /// Enumerating the range
    Fetching,
    /// Looking up files and applying the directory filter
    Filtering,
    /// Delivering a batch
    Emitting,
    /// Reporting completion
    Completing,
    /// Finished successfully
    Done,
    /// Stopped by an error
    Failed,
    /// Stopped by the consumer
    Cancelled,
}

impl PipelineState {
    /// Whether the run has ended
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Cancelled)
    }
}

/// Terminal outcome of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    /// Every batch was produced
    Done,
    /// An error ended the run; delivered batches stay delivered
    Failed,
    /// The consumer went away or the run was cancelled
    Cancelled,
}

impl From<RunOutcome> for PipelineState {
    fn from(outcome: RunOutcome) -> Self {
        match outcome {
            RunOutcome::Done => Self::Done,
            RunOutcome::Failed => Self::Failed,
            RunOutcome::Cancelled => Self::Cancelled,
        }
    }
}

/// Position of a batch within the fetched range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchProgress {
    /// Fetched commits examined so far
    pub processed: usize,
    /// Fetched commits in the range, before filtering
    pub total: usize,
}

/// Terminal aggregate of a run, produced exactly once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamSummary {
    /// Commits delivered after filtering
    pub total_commits: usize,
    /// Fetched commits examined
    pub checked: usize,
    /// Provider requests issued
    pub request_count: usize,
    /// Wall-clock duration of the run
    pub elapsed_millis: u64,
    /// Strategy that produced the range
    pub api_strategy_used: ApiStrategy,
    /// Whether the lower boundary of the range was located
    pub boundary_confirmed: bool,
    /// How the run ended
    pub outcome: RunOutcome,
    /// `owner/name`, once the repository URL has been parsed
    pub repository: Option<String>,
    /// Resolved older endpoint
    pub from_sha: Option<CommitId>,
    /// Resolved newer endpoint
    pub to_sha: Option<CommitId>,
    /// Non-fatal degradations
    #[serde(default)]
    pub warnings: Vec<String>,
    /// Failure message when the run failed
    pub error: Option<String>,
    /// Batch or progress deliveries that failed and were skipped
    #[serde(default)]
    pub callback_failures: usize,
    /// Commits whose changed files could not be listed
    #[serde(default)]
    pub file_lookup_failures: usize,
}

impl StreamSummary {
    fn new(strategy: ApiStrategy) -> Self {
        Self {
            total_commits: 0,
            checked: 0,
            request_count: 0,
            elapsed_millis: 0,
            api_strategy_used: strategy,
            boundary_confirmed: false,
            outcome: RunOutcome::Done,
            repository: None,
            from_sha: None,
            to_sha: None,
            warnings: Vec::new(),
            error: None,
            callback_failures: 0,
            file_lookup_failures: 0,
        }
    }

    /// Warnings joined into one sentence list, if any
    #[must_use]
    pub fn warning(&self) -> Option<String> {
        (!self.warnings.is_empty()).then(|| self.warnings.join(" "))
    }
}

/// Details announced when a run starts delivering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStart {
    /// `owner/name`
    pub repository: String,
    /// Older reference as given
    pub from_ref: Option<String>,
    /// Newer reference as given
    pub to_ref: Option<String>,
}

// ============================================================================
// Sink contract
// ============================================================================

/// Why a delivery did not go through
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallbackError {
    /// The consumer is gone; the run stops without error
    #[error("Consumer closed the stream")]
    Closed,

    /// This delivery failed; the run continues
    #[error("Callback failed: {0}")]
    Failed(String),
}

/// Receiver of a run's output
///
/// Every method reports whether delivery succeeded. `Closed` cancels the run;
/// `Failed` is counted in [`StreamSummary::callback_failures`] and ignored.
#[async_trait]
pub trait EventSink: Send {
    /// The run has parsed the repository and is about to resolve references
    async fn on_start(&mut self, _start: &RunStart) -> Result<(), CallbackError> {
        Ok(())
    }

    /// A milestone status message
    async fn on_progress(&mut self, message: &str) -> Result<(), CallbackError>;

    /// A batch of filtered, parsed commits, newest first
    async fn on_batch(
        &mut self,
        commits: &[ParsedCommit],
        progress: FetchProgress,
    ) -> Result<(), CallbackError>;

    /// The run finished or failed; not called after cancellation
    async fn on_finish(&mut self, _summary: &StreamSummary) -> Result<(), CallbackError> {
        Ok(())
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors that end a run
#[derive(Debug, Error)]
pub enum RunError {
    /// The repository URL does not parse
    #[error("Invalid repository: {0}")]
    InvalidRepository(#[from] GitError),

    /// A reference could not be resolved
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The range could not be enumerated
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A provider call outside resolution and fetching failed
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Why a run stopped early
enum Stop {
    Cancelled,
    Failed(RunError),
}

impl Stop {
    fn failed(err: impl Into<RunError>) -> Self {
        Self::Failed(err.into())
    }
}

/// Await `fut` unless `cancel` fires first
async fn guarded<F: Future>(cancel: &CancellationToken, fut: F) -> Result<F::Output, Stop> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(Stop::Cancelled),
        output = fut => Ok(output),
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Runs range resolutions against one provider
pub struct Pipeline<P> {
    provider: P,
    options: RangeOptions,
}

impl<P: HistoryProvider> Pipeline<P> {
    /// Create a pipeline for `options`
    #[must_use]
    pub fn new(provider: P, options: RangeOptions) -> Self {
        Self { provider, options }
    }

    /// The options every run uses
    #[must_use]
    pub fn options(&self) -> &RangeOptions {
        &self.options
    }

    /// The underlying provider
    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Run once, delivering batches to `sink`
    ///
    /// Never fails: errors end the run with [`RunOutcome::Failed`] and the
    /// message in [`StreamSummary::error`]. Cancelling `cancel`, or the sink
    /// reporting [`CallbackError::Closed`], ends it with
    /// [`RunOutcome::Cancelled`] and no further callbacks.
    pub async fn run<S: EventSink + ?Sized>(
        &self,
        sink: &mut S,
        cancel: &CancellationToken,
    ) -> StreamSummary {
        let strategy = ApiStrategy::from(select_strategy(
            self.options.strategy_override,
            self.provider.supports_graph(),
        ));
        let mut run = Run {
            provider: CountingProvider::new(&self.provider),
            options: &self.options,
            sink,
            cancel: cancel.child_token(),
            summary: StreamSummary::new(strategy),
            state: PipelineState::Idle,
            started: Instant::now(),
        };
        let result = run.execute().await;
        run.finish(result).await
    }

    /// Run once and gather every batch into a single result
    ///
    /// # Errors
    ///
    /// Returns a `RunFailure` if the run failed.
    pub async fn collect(&self) -> Result<RangeResult, RunFailure> {
        let mut sink = CollectingSink::default();
        let summary = self.run(&mut sink, &CancellationToken::new()).await;
        RangeResult::from_run(&self.options, summary, sink.into_commits())
    }
}

/// Run `options` against GitHub, streaming into `sink`
pub async fn run<S: EventSink + ?Sized>(
    options: RangeOptions,
    sink: &mut S,
    cancel: &CancellationToken,
) -> StreamSummary {
    match GithubClient::new(options.github_config()) {
        Ok(client) => Pipeline::new(client, options).run(sink, cancel).await,
        Err(err) => {
            error!(error = %err, "Failed to create GitHub client");
            let mut summary = StreamSummary::new(ApiStrategy::from(select_strategy(
                options.strategy_override,
                options.token.is_some(),
            )));
            summary.outcome = RunOutcome::Failed;
            summary.error = Some(err.to_string());
            summary.repository = options.coordinate().ok().map(|r| r.full_name());
            // Nothing follows the final event, so only a failure is recorded.
            if let Err(CallbackError::Failed(message)) = sink.on_finish(&summary).await {
                summary.callback_failures += 1;
                warn!(callback = "finish", error = %message, "Callback failed, continuing");
            }
            summary
        }
    }
}

/// Run `options` against GitHub and gather the result
///
/// # Errors
///
/// Returns a `RunFailure` if the client cannot be created or the run fails.
pub async fn collect(options: RangeOptions) -> Result<RangeResult, RunFailure> {
    let mut sink = CollectingSink::default();
    let summary = run(options.clone(), &mut sink, &CancellationToken::new()).await;
    RangeResult::from_run(&options, summary, sink.into_commits())
}

// ============================================================================
// Single run
// ============================================================================

struct Run<'a, P: HistoryProvider, S: EventSink + ?Sized> {
    provider: CountingProvider<&'a P>,
    options: &'a RangeOptions,
    sink: &'a mut S,
    cancel: CancellationToken,
    summary: StreamSummary,
    state: PipelineState,
    started: Instant,
}

impl<P: HistoryProvider, S: EventSink + ?Sized> Run<'_, P, S> {
    async fn execute(&mut self) -> Result<(), Stop> {
        info!(repository = %self.options.repository_url, "Starting range resolution");
        if self.cancel.is_cancelled() {
            return Err(Stop::Cancelled);
        }

        let repo = self.options.coordinate().map_err(Stop::failed)?;
        self.summary.repository = Some(repo.full_name());
        let start = RunStart {
            repository: repo.full_name(),
            from_ref: self.options.from.clone(),
            to_ref: self.options.to.clone(),
        };
        let delivered = guarded(&self.cancel, self.sink.on_start(&start)).await?;
        self.deliver(delivered, "start")?;
        self.progress(format!("Initializing range for {}", repo.full_name()))
            .await?;

        self.set_state(PipelineState::ResolvingRefs);
        let (base, head) = self.resolve_endpoints(&repo).await?;
        self.summary.from_sha = base.clone();
        self.summary.to_sha = Some(head.clone());

        let criteria = self.options.filter_criteria();
        let outcome = match base {
            Some(base) if base == head => {
                warn!(sha = %head, "Both references resolve to the same commit");
                self.summary.warnings.push(format!(
                    "Both references resolve to {}; the range is empty",
                    head.short()
                ));
                self.summary.boundary_confirmed = true;
                return self.complete().await;
            }
            Some(base) => self.fetch(&repo, &base, &head, &criteria).await?,
            None => self.newest_commit(&repo, &head).await?,
        };

        self.summary.api_strategy_used = outcome.strategy_used;
        self.summary.boundary_confirmed = outcome.boundary_confirmed;
        self.summary.warnings.extend(outcome.notes);

        self.emit(&repo, outcome.commits, outcome.path_scoped, &criteria)
            .await?;
        self.complete().await
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Resolve the endpoints, substituting defaults for missing references
    async fn resolve_endpoints(
        &mut self,
        repo: &RepositoryCoordinate,
    ) -> Result<(Option<CommitId>, CommitId), Stop> {
        let from = self.options.from.clone();
        let to = self.options.to.clone();
        match (from, to) {
            (Some(from), Some(to)) => {
                let base = self.resolve(repo, &from).await?;
                let head = self.resolve(repo, &to).await?;
                Ok((Some(base), head))
            }
            (None, None) => {
                let (branch, head) = self.default_head(repo).await?;
                self.summary.warnings.push(format!(
                    "No references given; returning the most recent commit on {branch}"
                ));
                Ok((None, head))
            }
            (Some(label), None) | (None, Some(label)) => {
                let base = self.resolve(repo, &label).await?;
                let (branch, head) = self.default_head(repo).await?;
                self.summary.warnings.push(format!(
                    "Only one reference given; listing commits from {label} to the head of {branch}"
                ));
                Ok((Some(base), head))
            }
        }
    }

    async fn resolve(&mut self, repo: &RepositoryCoordinate, label: &str) -> Result<CommitId, Stop> {
        self.progress(format!("Resolving {label}")).await?;
        let id = guarded(&self.cancel, resolve(&self.provider, repo, label))
            .await?
            .map_err(Stop::failed)?;
        info!(label = %label, sha = %id, "Resolved reference");
        self.progress(format!("Resolved {label} to {}", id.short()))
            .await?;
        Ok(id)
    }

    async fn default_head(
        &mut self,
        repo: &RepositoryCoordinate,
    ) -> Result<(String, CommitId), Stop> {
        self.progress("Looking up the default branch".to_string())
            .await?;
        let branch = guarded(&self.cancel, self.provider.default_branch(repo))
            .await?
            .map_err(Stop::failed)?;
        let head = self.resolve(repo, &format!("refs/heads/{branch}")).await?;
        Ok((branch, head))
    }

    // ========================================================================
    // Fetching
    // ========================================================================

    async fn fetch(
        &mut self,
        repo: &RepositoryCoordinate,
        base: &CommitId,
        head: &CommitId,
        criteria: &FilterCriteria,
    ) -> Result<FetchOutcome, Stop> {
        self.set_state(PipelineState::Fetching);
        let config = FetchConfig::from(self.options);
        let strategy = select_strategy(config.strategy_override, self.provider.supports_graph());
        self.progress(format!(
            "Fetching commits from {} to {} using the {strategy} strategy",
            base.short(),
            head.short(),
        ))
        .await?;

        let fetcher = RangeFetcher::new(&self.provider, repo, config);
        let outcome = guarded(
            &self.cancel,
            fetcher.fetch_range(base, head, criteria.target_dir.as_deref()),
        )
        .await?
        .map_err(Stop::failed)?;

        info!(
            commits = outcome.commits.len(),
            strategy = %outcome.strategy_used,
            boundary_confirmed = outcome.boundary_confirmed,
            "Fetched commit range"
        );
        self.progress(format!("Fetched {} commits", outcome.commits.len()))
            .await?;
        Ok(outcome)
    }

    /// The degenerate range used when no reference was given
    async fn newest_commit(
        &mut self,
        repo: &RepositoryCoordinate,
        head: &CommitId,
    ) -> Result<FetchOutcome, Stop> {
        self.set_state(PipelineState::Fetching);
        let commit = guarded(&self.cancel, self.provider.commit(repo, head.as_str()))
            .await?
            .map_err(Stop::failed)?;
        Ok(FetchOutcome {
            commits: vec![commit],
            strategy_used: self.summary.api_strategy_used,
            boundary_confirmed: true,
            path_scoped: false,
            notes: Vec::new(),
        })
    }

    // ========================================================================
    // Filtering and delivery
    // ========================================================================

    async fn emit(
        &mut self,
        repo: &RepositoryCoordinate,
        commits: Vec<RawCommit>,
        path_scoped: bool,
        criteria: &FilterCriteria,
    ) -> Result<(), Stop> {
        let total = commits.len();
        let batch_size = self.options.batch_size.max(1);
        // Path-scoped listings already prove inclusion; excludes still need files.
        let needs_files = criteria.is_active() && !(path_scoped && !criteria.has_excludes());
        let mut batch = Vec::with_capacity(batch_size);

        for (idx, mut commit) in commits.into_iter().enumerate() {
            let processed = idx + 1;
            self.summary.checked = processed;

            if needs_files {
                self.set_state(PipelineState::Filtering);
                if !self.passes_filter(repo, &mut commit, criteria).await? {
                    debug!(sha = %commit.id.short(), "Filtered out");
                    continue;
                }
            }

            batch.push(ParsedCommit::from_raw(commit));
            if batch.len() >= batch_size {
                self.emit_batch(&mut batch, FetchProgress { processed, total })
                    .await?;
                if processed < total {
                    self.pause().await?;
                }
            }
        }

        if !batch.is_empty() {
            self.emit_batch(
                &mut batch,
                FetchProgress {
                    processed: total,
                    total,
                },
            )
            .await?;
        }
        Ok(())
    }

    async fn passes_filter(
        &mut self,
        repo: &RepositoryCoordinate,
        commit: &mut RawCommit,
        criteria: &FilterCriteria,
    ) -> Result<bool, Stop> {
        let lookup = guarded(&self.cancel, ensure_files(&self.provider, repo, commit))
            .await?
            .map(|files| files.len());

        if let Err(err) = lookup {
            self.summary.file_lookup_failures += 1;
            if criteria.requires_target() {
                warn!(error = %err, "Skipping commit: cannot prove it touches the target directory");
                return Ok(false);
            }
            warn!(error = %err, "Treating commit as having no changed files");
            commit.fill_files(Vec::new());
        }

        Ok(criteria.include(commit.changed_files.as_deref().unwrap_or_default()))
    }

    async fn emit_batch(
        &mut self,
        batch: &mut Vec<ParsedCommit>,
        progress: FetchProgress,
    ) -> Result<(), Stop> {
        self.set_state(PipelineState::Emitting);
        let commits = std::mem::take(batch);
        self.summary.total_commits += commits.len();

        let delivered = guarded(&self.cancel, self.sink.on_batch(&commits, progress)).await?;
        self.deliver(delivered, "batch")?;
        self.progress(format!(
            "Processed {}/{} commits ({} matched)",
            progress.processed, progress.total, self.summary.total_commits
        ))
        .await
    }

    async fn pause(&self) -> Result<(), Stop> {
        let delay: Duration = self.options.batch_delay;
        if !delay.is_zero() {
            guarded(&self.cancel, tokio::time::sleep(delay)).await?;
        }
        Ok(())
    }

    async fn progress(&mut self, message: String) -> Result<(), Stop> {
        debug!(message = %message, "Progress");
        let delivered = guarded(&self.cancel, self.sink.on_progress(&message)).await?;
        self.deliver(delivered, "progress")
    }

    /// Inspect a delivery result once
    fn deliver(&mut self, result: Result<(), CallbackError>, what: &str) -> Result<(), Stop> {
        match result {
            Ok(()) => Ok(()),
            Err(CallbackError::Closed) => {
                info!(callback = what, "Consumer closed the stream, stopping");
                self.cancel.cancel();
                Err(Stop::Cancelled)
            }
            Err(CallbackError::Failed(message)) => {
                self.summary.callback_failures += 1;
                warn!(callback = what, error = %message, "Callback failed, continuing");
                Ok(())
            }
        }
    }

    // ========================================================================
    // Completion
    // ========================================================================

    async fn complete(&mut self) -> Result<(), Stop> {
        self.set_state(PipelineState::Completing);
        self.progress(format!(
            "Completed: {} commits ({} checked)",
            self.summary.total_commits, self.summary.checked
        ))
        .await
    }

    async fn finish(mut self, result: Result<(), Stop>) -> StreamSummary {
        self.summary.request_count = self.provider.request_count();
        self.summary.elapsed_millis = self
            .started
            .elapsed()
            .as_millis()
            .try_into()
            .unwrap_or(u64::MAX);

        let outcome = match result {
            Ok(()) => RunOutcome::Done,
            Err(Stop::Cancelled) => RunOutcome::Cancelled,
            Err(Stop::Failed(err)) => {
                error!(error = %err, "Range resolution failed");
                self.summary.error = Some(err.to_string());
                RunOutcome::Failed
            }
        };
        self.summary.outcome = outcome;
        self.set_state(outcome.into());

        info!(
            outcome = ?outcome,
            commits = self.summary.total_commits,
            checked = self.summary.checked,
            requests = self.summary.request_count,
            elapsed_ms = self.summary.elapsed_millis,
            "Range resolution finished"
        );

        if outcome != RunOutcome::Cancelled
            && let Ok(delivered) = guarded(&self.cancel, self.sink.on_finish(&self.summary)).await
        {
            // Nothing follows the final event, so a closed consumer changes nothing.
            let _ = self.deliver(delivered, "finish");
        }
        self.summary
    }

    fn set_state(&mut self, state: PipelineState) {
        if self.state != state {
            debug!(from = ?self.state, to = ?state, "Pipeline state");
            self.state = state;
        }
    }
}

// ============================================================================
// Non-streaming result
// ============================================================================

/// Everything a run produced, gathered into one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeResult {
    /// Commits in the range, newest first
    pub commits: Vec<ParsedCommit>,
    /// Number of commits
    pub total_commits: usize,
    /// Wall-clock duration in milliseconds
    pub elapsed_time: u64,
    /// Strategy that produced the range
    pub api_strategy_used: ApiStrategy,
    /// `owner/name`
    pub repository: String,
    /// Older reference as given
    pub from_ref: Option<String>,
    /// Newer reference as given
    pub to_ref: Option<String>,
    /// Resolved older endpoint
    pub from_sha: Option<CommitId>,
    /// Resolved newer endpoint
    pub to_sha: Option<CommitId>,
    /// Non-fatal degradations
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub warning: Option<String>,
    /// Whether the lower boundary of the range was located
    pub boundary_confirmed: bool,
}

impl RangeResult {
    /// Assemble a result from a finished run
    ///
    /// # Errors
    ///
    /// Returns a `RunFailure` if the run failed.
    pub fn from_run(
        options: &RangeOptions,
        summary: StreamSummary,
        commits: Vec<ParsedCommit>,
    ) -> Result<Self, RunFailure> {
        if summary.outcome == RunOutcome::Failed {
            return Err(RunFailure {
                error: summary.error.unwrap_or_else(|| "Unknown failure".to_string()),
                repository: summary.repository,
                elapsed_time: summary.elapsed_millis,
            });
        }
        let warning = summary.warning();
        Ok(Self {
            total_commits: commits.len(),
            commits,
            elapsed_time: summary.elapsed_millis,
            api_strategy_used: summary.api_strategy_used,
            repository: summary.repository.unwrap_or_default(),
            from_ref: options.from.clone(),
            to_ref: options.to.clone(),
            from_sha: summary.from_sha,
            to_sha: summary.to_sha,
            warning,
            boundary_confirmed: summary.boundary_confirmed,
        })
    }
}

/// A failed run, reported as data
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{error}")]
#[serde(rename_all = "camelCase")]
pub struct RunFailure {
    /// Human-readable failure message
    pub error: String,
    /// `owner/name`, when the repository URL parsed
    pub repository: Option<String>,
    /// Wall-clock duration in milliseconds
    pub elapsed_time: u64,
}

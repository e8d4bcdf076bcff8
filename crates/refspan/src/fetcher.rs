// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Commit range enumeration
//!
//! Lists the commits reachable from a head commit back to (but excluding) a
//! base commit. Two strategies exist:
//!
//! - **Graph**: cursor-paginated backward history walk from the head, stopping
//!   as soon as the base is seen.
//! - **Linear**: with a target directory, the path-scoped history listing
//!   from the head, followed by a boundary-intersection search when the base
//!   itself never touched the directory. Without one, a single paginated
//!   two-endpoint comparison.
//!
//! Every call is awaited before the next is issued, so a walk stops as soon
//! as the page containing the base has been processed.

use std::collections::HashMap;
use std::fmt;

use refspan_git::{CommitId, RawCommit, RepositoryCoordinate};
use refspan_github::{Comparison, HistoryProvider, ProviderError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::RangeOptions;

// ============================================================================
// Strategy selection
// ============================================================================

/// How the range is enumerated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStrategy {
    /// Cursor-paginated backward history walk
    Graph,
    /// Path-scoped history listing or two-endpoint comparison
    Linear,
}

impl fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Graph => "graph",
            Self::Linear => "linear",
        })
    }
}

/// Choose the strategy for a run
///
/// An explicit override always wins; otherwise the graph walk is used when
/// the provider can serve it.
#[must_use]
pub fn select_strategy(override_: Option<FetchStrategy>, supports_graph: bool) -> FetchStrategy {
    match override_ {
        Some(strategy) => strategy,
        None if supports_graph => FetchStrategy::Graph,
        None => FetchStrategy::Linear,
    }
}

/// Strategy reported to callers once a fetch has finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApiStrategy {
    /// The graph walk produced the range
    Graph,
    /// The linear strategy produced the range
    Linear,
    /// The graph walk failed and the linear strategy took over
    LinearFallback,
}

impl ApiStrategy {
    /// Wire name of the strategy
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Graph => "graph",
            Self::Linear => "linear",
            Self::LinearFallback => "linear-fallback",
        }
    }
}

impl fmt::Display for ApiStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<FetchStrategy> for ApiStrategy {
    fn from(strategy: FetchStrategy) -> Self {
        match strategy {
            FetchStrategy::Graph => Self::Graph,
            FetchStrategy::Linear => Self::Linear,
        }
    }
}

// ============================================================================
// Configuration, results and errors
// ============================================================================

/// Paging and budget settings for the fetcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Commits per graph history page
    pub page_size: usize,
    /// Commits per linear listing or comparison page
    pub linear_page_size: usize,
    /// Safety cap on commits walked from the head
    pub max_commits: usize,
    /// Pages of base-side history scanned by the intersection search
    pub intersection_pages: u32,
    /// Forced strategy, if any
    pub strategy_override: Option<FetchStrategy>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::from(&RangeOptions::new(String::new()))
    }
}

impl From<&RangeOptions> for FetchConfig {
    fn from(options: &RangeOptions) -> Self {
        Self {
            page_size: options.page_size.max(1),
            linear_page_size: options.linear_page_size.max(1),
            max_commits: options.max_commits.max(1),
            intersection_pages: options.intersection_pages,
            strategy_override: options.strategy_override,
        }
    }
}

/// Result of enumerating a range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// Commits in the range, newest first
    pub commits: Vec<RawCommit>,
    /// Strategy that produced the range
    pub strategy_used: ApiStrategy,
    /// Whether the lower boundary was actually located
    pub boundary_confirmed: bool,
    /// Whether every commit is already known to touch the target directory
    pub path_scoped: bool,
    /// Degradations worth surfacing to the caller
    pub notes: Vec<String>,
}

/// Range enumeration errors
#[derive(Debug, Error)]
pub enum FetchError {
    /// The strategy could not complete
    #[error("Fetching commits with the {strategy} strategy failed: {source}")]
    FetchFailed {
        /// Strategy that failed
        strategy: FetchStrategy,
        /// Underlying provider failure
        #[source]
        source: ProviderError,
    },

    /// The changed files of a commit could not be looked up
    #[error("Failed to look up files of {id}: {source}")]
    FileLookupFailed {
        /// Commit whose files were requested
        id: CommitId,
        /// Underlying provider failure
        #[source]
        source: ProviderError,
    },
}

// ============================================================================
// Fetcher
// ============================================================================

/// Enumerates commit ranges within one repository
pub struct RangeFetcher<'a, P: ?Sized> {
    provider: &'a P,
    repo: &'a RepositoryCoordinate,
    config: FetchConfig,
}

impl<'a, P: HistoryProvider + ?Sized> RangeFetcher<'a, P> {
    /// Create a fetcher for `repo`
    #[must_use]
    pub fn new(provider: &'a P, repo: &'a RepositoryCoordinate, config: FetchConfig) -> Self {
        Self {
            provider,
            repo,
            config,
        }
    }

    /// The strategy a fetch would start with
    #[must_use]
    pub fn strategy(&self) -> FetchStrategy {
        select_strategy(self.config.strategy_override, self.provider.supports_graph())
    }

    /// List the commits reachable from `head` but not past `base`
    ///
    /// A failing graph walk falls back to the linear strategy unless the graph
    /// strategy was forced.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::FetchFailed` if the linear strategy fails, or if a
    /// forced graph walk fails.
    pub async fn fetch_range(
        &self,
        base: &CommitId,
        head: &CommitId,
        target_dir: Option<&str>,
    ) -> Result<FetchOutcome, FetchError> {
        let strategy = self.strategy();
        info!(
            repo = %self.repo,
            base = %base.short(),
            head = %head.short(),
            strategy = %strategy,
            "Fetching commit range"
        );

        match strategy {
            FetchStrategy::Linear => self.linear(base, head, target_dir).await,
            FetchStrategy::Graph => match self.graph(base, head).await {
                Ok(outcome) => Ok(outcome),
                Err(err) if self.config.strategy_override == Some(FetchStrategy::Graph) => {
                    Err(err)
                }
                Err(err) => {
                    warn!(error = %err, "Graph history walk failed, falling back to linear history");
                    let mut outcome = self.linear(base, head, target_dir).await?;
                    outcome.strategy_used = ApiStrategy::LinearFallback;
                    outcome.notes.insert(
                        0,
                        format!("Graph history walk failed ({err}); used linear history instead"),
                    );
                    Ok(outcome)
                }
            },
        }
    }

    // ========================================================================
    // Graph strategy
    // ========================================================================

    async fn graph(&self, base: &CommitId, head: &CommitId) -> Result<FetchOutcome, FetchError> {
        let failed = |source| FetchError::FetchFailed {
            strategy: FetchStrategy::Graph,
            source,
        };

        let mut commits = Vec::new();
        let mut cursor: Option<String> = None;
        let mut found = false;
        let mut capped = false;

        'pages: loop {
            let page = self
                .provider
                .history_page(self.repo, head, cursor.as_deref(), self.config.page_size)
                .await
                .map_err(failed)?;
            debug!(
                commits = page.commits.len(),
                has_next = page.has_next_page,
                "Graph history page"
            );

            for commit in page.commits {
                if commit.id == *base {
                    found = true;
                    break 'pages;
                }
                commits.push(commit);
                if commits.len() >= self.config.max_commits {
                    capped = true;
                    break 'pages;
                }
            }

            match page.end_cursor {
                Some(next) if page.has_next_page => cursor = Some(next),
                _ => break,
            }
        }

        let mut notes = Vec::new();
        if capped {
            notes.push(cap_note(self.config.max_commits));
        } else if !found {
            notes.push(format!(
                "History ended before reaching {}; the range may include older commits",
                base.short()
            ));
        }

        Ok(FetchOutcome {
            commits,
            strategy_used: ApiStrategy::Graph,
            boundary_confirmed: found,
            path_scoped: false,
            notes,
        })
    }

    // ========================================================================
    // Linear strategy
    // ========================================================================

    async fn linear(
        &self,
        base: &CommitId,
        head: &CommitId,
        target_dir: Option<&str>,
    ) -> Result<FetchOutcome, FetchError> {
        match target_dir {
            Some(dir) => self.path_history(base, head, dir).await,
            None => self.comparison(base, head).await,
        }
    }

    /// Fast path: one paginated comparison between the endpoints
    ///
    /// The comparison lists oldest first. When the range exceeds the cap the
    /// pages are read from the last one backwards so the commits nearest the
    /// head are kept, matching the graph walk.
    async fn comparison(
        &self,
        base: &CommitId,
        head: &CommitId,
    ) -> Result<FetchOutcome, FetchError> {
        let per_page = self.config.linear_page_size;
        let max_commits = self.config.max_commits;
        let first = self.compare_page(base, head, 1).await?;
        let total = first.total_commits;
        let capped = total > max_commits;

        let mut commits = Vec::new();
        if capped {
            let last_page = u32::try_from(total.div_ceil(per_page)).unwrap_or(u32::MAX);
            let mut first = Some(first);
            let mut page = last_page.max(1);
            while commits.len() < max_commits {
                let reuse = if page == 1 { first.take() } else { None };
                let listed = match reuse {
                    Some(listed) => listed,
                    None => self.compare_page(base, head, page).await?,
                };
                let received = listed.commits.len();
                commits.extend(listed.commits.into_iter().rev());
                if received == 0 || page == 1 {
                    break;
                }
                page -= 1;
            }
            debug!(total, last_page, kept = commits.len(), "Comparison capped");
        } else {
            let mut oldest_first = first.commits;
            let mut page = 1u32;
            while !oldest_first.is_empty() && oldest_first.len() < total {
                page += 1;
                let listed = self.compare_page(base, head, page).await?;
                if listed.commits.is_empty() {
                    break;
                }
                oldest_first.extend(listed.commits);
            }
            oldest_first.reverse();
            commits = oldest_first;
        }
        commits.truncate(max_commits);

        Ok(FetchOutcome {
            commits,
            strategy_used: ApiStrategy::Linear,
            boundary_confirmed: !capped,
            path_scoped: false,
            notes: if capped {
                vec![cap_note(max_commits)]
            } else {
                Vec::new()
            },
        })
    }

    async fn compare_page(
        &self,
        base: &CommitId,
        head: &CommitId,
        page: u32,
    ) -> Result<Comparison, FetchError> {
        self.provider
            .compare(self.repo, base, head, page, self.config.linear_page_size)
            .await
            .map_err(linear_failed)
    }

    /// Path-scoped history from the head, with the intersection search
    async fn path_history(
        &self,
        base: &CommitId,
        head: &CommitId,
        dir: &str,
    ) -> Result<FetchOutcome, FetchError> {
        let per_page = self.config.linear_page_size;
        let mut commits = Vec::new();
        let mut page = 1u32;
        let mut found = false;
        let mut capped = false;

        'pages: loop {
            let batch = self
                .provider
                .list_commits(self.repo, head, Some(dir), page, per_page)
                .await
                .map_err(linear_failed)?;
            let received = batch.len();

            for commit in batch {
                if commit.id == *base {
                    found = true;
                    break 'pages;
                }
                commits.push(commit);
                if commits.len() >= self.config.max_commits {
                    capped = true;
                    break 'pages;
                }
            }

            if received < per_page {
                break;
            }
            page += 1;
        }

        let mut notes = Vec::new();
        let boundary_confirmed = if found {
            true
        } else {
            debug!(
                base = %base.short(),
                collected = commits.len(),
                "Base not in path history, searching for the intersection"
            );
            match self.intersection(base, dir, &commits).await? {
                Some(position) => {
                    commits.truncate(position);
                    true
                }
                None => {
                    notes.push(format!(
                        "Could not locate the boundary below {} within {} page(s); \
                         the range may include older commits",
                        base.short(),
                        self.config.intersection_pages.max(1)
                    ));
                    false
                }
            }
        };
        if capped && !boundary_confirmed {
            notes.push(cap_note(self.config.max_commits));
        }

        Ok(FetchOutcome {
            commits,
            strategy_used: ApiStrategy::Linear,
            boundary_confirmed,
            path_scoped: true,
            notes,
        })
    }

    /// Walk the path-scoped history from `base` looking for a commit the head
    /// side already collected; returns its position in `collected`
    async fn intersection(
        &self,
        base: &CommitId,
        dir: &str,
        collected: &[RawCommit],
    ) -> Result<Option<usize>, FetchError> {
        if collected.is_empty() {
            return Ok(None);
        }
        let positions: HashMap<&CommitId, usize> = collected
            .iter()
            .enumerate()
            .map(|(i, c)| (&c.id, i))
            .collect();

        let per_page = self.config.linear_page_size;
        for page in 1..=self.config.intersection_pages.max(1) {
            let batch = self
                .provider
                .list_commits(self.repo, base, Some(dir), page, per_page)
                .await
                .map_err(linear_failed)?;
            let received = batch.len();

            if let Some(position) = batch.iter().find_map(|c| positions.get(&c.id).copied()) {
                debug!(
                    intersection = %collected[position].id.short(),
                    page,
                    "Found history intersection"
                );
                return Ok(Some(position));
            }
            if received < per_page {
                break;
            }
        }
        Ok(None)
    }
}

fn linear_failed(source: ProviderError) -> FetchError {
    FetchError::FetchFailed {
        strategy: FetchStrategy::Linear,
        source,
    }
}

fn cap_note(max_commits: usize) -> String {
    format!("Stopped after {max_commits} commits; the range may be incomplete")
}

// ============================================================================
// Changed files
// ============================================================================

/// Make sure the changed files of `commit` are known
///
/// Files already on the record are returned as-is; otherwise they are looked
/// up once and cached on the record.
///
/// # Errors
///
/// Returns `FetchError::FileLookupFailed` if the lookup fails; the record is
/// left unchanged.
pub async fn ensure_files<'c, P: HistoryProvider + ?Sized>(
    provider: &P,
    repo: &RepositoryCoordinate,
    commit: &'c mut RawCommit,
) -> Result<&'c [String], FetchError> {
    if !commit.has_files() {
        let files = provider
            .changed_files(repo, &commit.id)
            .await
            .map_err(|source| FetchError::FileLookupFailed {
                id: commit.id.clone(),
                source,
            })?;
        return Ok(commit.fill_files(files));
    }
    Ok(commit.changed_files.as_deref().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_strategy() {
        assert_eq!(select_strategy(None, true), FetchStrategy::Graph);
        assert_eq!(select_strategy(None, false), FetchStrategy::Linear);
        assert_eq!(
            select_strategy(Some(FetchStrategy::Linear), true),
            FetchStrategy::Linear
        );
        assert_eq!(
            select_strategy(Some(FetchStrategy::Graph), false),
            FetchStrategy::Graph
        );
    }

    #[test]
    fn test_api_strategy_wire_names() {
        assert_eq!(
            serde_json::to_string(&ApiStrategy::LinearFallback).expect("serialize"),
            "\"linear-fallback\""
        );
        assert_eq!(ApiStrategy::from(FetchStrategy::Graph).as_str(), "graph");
        assert_eq!(ApiStrategy::Linear.to_string(), "linear");
    }

    #[test]
    fn test_fetch_strategy_serde() {
        let strategy: FetchStrategy = serde_json::from_str("\"graph\"").expect("deserialize");
        assert_eq!(strategy, FetchStrategy::Graph);
    }

    #[test]
    fn test_fetch_config_from_options() {
        let options = RangeOptions::new("octocat/Hello-World")
            .with_page_size(0)
            .with_max_commits(50)
            .with_strategy(FetchStrategy::Linear);
        let config = FetchConfig::from(&options);
        assert_eq!(config.page_size, 1);
        assert_eq!(config.max_commits, 50);
        assert_eq!(config.strategy_override, Some(FetchStrategy::Linear));
        assert_eq!(FetchConfig::default().page_size, 20);
    }

    #[test]
    fn test_fetch_failed_display() {
        let err = FetchError::FetchFailed {
            strategy: FetchStrategy::Linear,
            source: ProviderError::not_found("compare"),
        };
        assert_eq!(
            err.to_string(),
            "Fetching commits with the linear strategy failed: Not found: compare"
        );
    }
}

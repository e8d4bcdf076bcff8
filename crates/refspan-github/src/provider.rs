// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! The read-only history provider contract
//!
//! Range resolution only ever needs a handful of remote queries. They are
//! collected in [`HistoryProvider`] so the resolver, fetcher and pipeline can
//! run against the GitHub API or against an in-memory history in tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use refspan_git::{CommitId, RawCommit, RepositoryCoordinate};
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Namespace a reference name is looked up in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefKind {
    /// `refs/tags/*`
    Tag,
    /// `refs/heads/*`
    Branch,
}

impl RefKind {
    /// The `refs/...` namespace segment
    #[must_use]
    pub fn namespace(self) -> &'static str {
        match self {
            Self::Tag => "tags",
            Self::Branch => "heads",
        }
    }
}

/// Kind of object a reference points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// A commit
    Commit,
    /// An annotated tag object, which must be peeled
    Tag,
    /// Trees or blobs; never a valid range endpoint
    #[serde(other)]
    Other,
}

/// The object a reference resolves to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefTarget {
    /// Kind of the target object
    pub kind: ObjectKind,
    /// Object identifier
    pub sha: String,
}

impl RefTarget {
    /// A reference pointing directly at a commit
    #[must_use]
    pub fn commit(sha: impl Into<String>) -> Self {
        Self {
            kind: ObjectKind::Commit,
            sha: sha.into(),
        }
    }

    /// A reference pointing at an annotated tag object
    #[must_use]
    pub fn tag(sha: impl Into<String>) -> Self {
        Self {
            kind: ObjectKind::Tag,
            sha: sha.into(),
        }
    }
}

/// One page of a backward history walk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryPage {
    /// Commits, newest first
    pub commits: Vec<RawCommit>,
    /// Cursor to pass for the next page
    pub end_cursor: Option<String>,
    /// Whether another page exists
    pub has_next_page: bool,
}

/// Result page of a two-endpoint comparison
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comparison {
    /// Commits reachable from head but not from base, oldest first
    pub commits: Vec<RawCommit>,
    /// Total number of commits in the comparison across all pages
    pub total_commits: usize,
}

/// Read-only queries against a hosted repository's history
///
/// Implementations must be safe to share between tasks; a single range
/// resolution issues its calls strictly one after another.
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    /// Whether the cursor-based history walk is available
    fn supports_graph(&self) -> bool;

    /// Look a commit up by full or abbreviated identifier
    async fn commit(
        &self,
        repo: &RepositoryCoordinate,
        id: &str,
    ) -> Result<RawCommit, ProviderError>;

    /// Look up a tag or branch reference
    async fn reference(
        &self,
        repo: &RepositoryCoordinate,
        kind: RefKind,
        name: &str,
    ) -> Result<RefTarget, ProviderError>;

    /// Dereference an annotated tag object one level
    async fn tag_target(
        &self,
        repo: &RepositoryCoordinate,
        tag_sha: &str,
    ) -> Result<RefTarget, ProviderError>;

    /// Name of the repository's default branch
    async fn default_branch(&self, repo: &RepositoryCoordinate) -> Result<String, ProviderError>;

    /// One page of history walking backward from `head`
    async fn history_page(
        &self,
        repo: &RepositoryCoordinate,
        head: &CommitId,
        after: Option<&str>,
        page_size: usize,
    ) -> Result<HistoryPage, ProviderError>;

    /// One page (1-based) of the linear history from `head`, optionally
    /// restricted to commits touching `path`
    async fn list_commits(
        &self,
        repo: &RepositoryCoordinate,
        head: &CommitId,
        path: Option<&str>,
        page: u32,
        per_page: usize,
    ) -> Result<Vec<RawCommit>, ProviderError>;

    /// One page (1-based) of the commits between `base` and `head`
    async fn compare(
        &self,
        repo: &RepositoryCoordinate,
        base: &CommitId,
        head: &CommitId,
        page: u32,
        per_page: usize,
    ) -> Result<Comparison, ProviderError>;

    /// Paths changed by a commit
    async fn changed_files(
        &self,
        repo: &RepositoryCoordinate,
        id: &CommitId,
    ) -> Result<Vec<String>, ProviderError>;
}

#[async_trait]
impl<P: HistoryProvider + ?Sized> HistoryProvider for &P {
    fn supports_graph(&self) -> bool {
        (**self).supports_graph()
    }

    async fn commit(
        &self,
        repo: &RepositoryCoordinate,
        id: &str,
    ) -> Result<RawCommit, ProviderError> {
        (**self).commit(repo, id).await
    }

    async fn reference(
        &self,
        repo: &RepositoryCoordinate,
        kind: RefKind,
        name: &str,
    ) -> Result<RefTarget, ProviderError> {
        (**self).reference(repo, kind, name).await
    }

    async fn tag_target(
        &self,
        repo: &RepositoryCoordinate,
        tag_sha: &str,
    ) -> Result<RefTarget, ProviderError> {
        (**self).tag_target(repo, tag_sha).await
    }

    async fn default_branch(&self, repo: &RepositoryCoordinate) -> Result<String, ProviderError> {
        (**self).default_branch(repo).await
    }

    async fn history_page(
        &self,
        repo: &RepositoryCoordinate,
        head: &CommitId,
        after: Option<&str>,
        page_size: usize,
    ) -> Result<HistoryPage, ProviderError> {
        (**self).history_page(repo, head, after, page_size).await
    }

    async fn list_commits(
        &self,
        repo: &RepositoryCoordinate,
        head: &CommitId,
        path: Option<&str>,
        page: u32,
        per_page: usize,
    ) -> Result<Vec<RawCommit>, ProviderError> {
        (**self).list_commits(repo, head, path, page, per_page).await
    }

    async fn compare(
        &self,
        repo: &RepositoryCoordinate,
        base: &CommitId,
        head: &CommitId,
        page: u32,
        per_page: usize,
    ) -> Result<Comparison, ProviderError> {
        (**self).compare(repo, base, head, page, per_page).await
    }

    async fn changed_files(
        &self,
        repo: &RepositoryCoordinate,
        id: &CommitId,
    ) -> Result<Vec<String>, ProviderError> {
        (**self).changed_files(repo, id).await
    }
}

/// Wraps a provider and counts every request issued through it
///
/// One counter is created per range resolution, so counts never leak between
/// concurrent runs.
pub struct CountingProvider<P> {
    inner: P,
    requests: AtomicUsize,
}

impl<P: HistoryProvider> CountingProvider<P> {
    /// Start counting requests made through `inner`
    #[must_use]
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            requests: AtomicUsize::new(0),
        }
    }

    /// Number of requests issued so far
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }

    /// The wrapped provider
    #[must_use]
    pub fn inner(&self) -> &P {
        &self.inner
    }

    fn tick(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }
}

#[async_trait]
impl<P: HistoryProvider> HistoryProvider for CountingProvider<P> {
    fn supports_graph(&self) -> bool {
        self.inner.supports_graph()
    }

    async fn commit(
        &self,
        repo: &RepositoryCoordinate,
        id: &str,
    ) -> Result<RawCommit, ProviderError> {
        self.tick();
        self.inner.commit(repo, id).await
    }

    async fn reference(
        &self,
        repo: &RepositoryCoordinate,
        kind: RefKind,
        name: &str,
    ) -> Result<RefTarget, ProviderError> {
        self.tick();
        self.inner.reference(repo, kind, name).await
    }

    async fn tag_target(
        &self,
        repo: &RepositoryCoordinate,
        tag_sha: &str,
    ) -> Result<RefTarget, ProviderError> {
        self.tick();
        self.inner.tag_target(repo, tag_sha).await
    }

    async fn default_branch(&self, repo: &RepositoryCoordinate) -> Result<String, ProviderError> {
        self.tick();
        self.inner.default_branch(repo).await
    }

    async fn history_page(
        &self,
        repo: &RepositoryCoordinate,
        head: &CommitId,
        after: Option<&str>,
        page_size: usize,
    ) -> Result<HistoryPage, ProviderError> {
        self.tick();
        self.inner.history_page(repo, head, after, page_size).await
    }

    async fn list_commits(
        &self,
        repo: &RepositoryCoordinate,
        head: &CommitId,
        path: Option<&str>,
        page: u32,
        per_page: usize,
    ) -> Result<Vec<RawCommit>, ProviderError> {
        self.tick();
        self.inner
            .list_commits(repo, head, path, page, per_page)
            .await
    }

    async fn compare(
        &self,
        repo: &RepositoryCoordinate,
        base: &CommitId,
        head: &CommitId,
        page: u32,
        per_page: usize,
    ) -> Result<Comparison, ProviderError> {
        self.tick();
        self.inner.compare(repo, base, head, page, per_page).await
    }

    async fn changed_files(
        &self,
        repo: &RepositoryCoordinate,
        id: &CommitId,
    ) -> Result<Vec<String>, ProviderError> {
        self.tick();
        self.inner.changed_files(repo, id).await
    }
}

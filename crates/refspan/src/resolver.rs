// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Reference resolution
//!
//! Turns a human label (tag, branch or commit identifier) into the full
//! identifier of the commit it denotes. Attempts run in a fixed order and the
//! first success wins:
//!
//! 1. the label as a commit identifier (only when it is 4 to 40 hex characters)
//! 2. the label as a tag, peeling annotated tags down to their commit
//! 3. the label as a branch head
//!
//! A `refs/tags/` or `refs/heads/` prefix restricts resolution to that kind.

use refspan_git::{CommitId, RepositoryCoordinate};
use refspan_github::{HistoryProvider, ObjectKind, ProviderError, RefKind, RefTarget};
use thiserror::Error;
use tracing::debug;

/// Annotated tags pointing at annotated tags are followed this many levels
pub const MAX_TAG_DEPTH: usize = 5;

/// Reference resolution errors
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No attempt produced a commit
    #[error("Reference not found: {label}{}", .last_error.as_ref().map(|e| format!(" ({e})")).unwrap_or_default())]
    ReferenceNotFound {
        /// The label as given by the caller
        label: String,
        /// Most informative failure among the attempts, if any was not a plain miss
        last_error: Option<String>,
    },

    /// The host refused the request outright; further attempts cannot succeed
    #[error("Failed to resolve {label}: {source}")]
    Provider {
        /// The label as given by the caller
        label: String,
        /// Underlying provider failure
        #[source]
        source: ProviderError,
    },
}

impl ResolveError {
    /// The label that failed to resolve
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::ReferenceNotFound { label, .. } | Self::Provider { label, .. } => label,
        }
    }
}

/// Outcome of one resolution attempt
enum Attempt {
    Resolved(CommitId),
    Missed(Option<String>),
}

/// Resolves labels within one repository
pub struct Resolver<'a, P: ?Sized> {
    provider: &'a P,
    repo: &'a RepositoryCoordinate,
}

impl<'a, P: HistoryProvider + ?Sized> Resolver<'a, P> {
    /// Create a resolver for `repo`
    #[must_use]
    pub fn new(provider: &'a P, repo: &'a RepositoryCoordinate) -> Self {
        Self { provider, repo }
    }

    /// Resolve `label` to a full commit identifier
    ///
    /// Resolution is idempotent: the same label against the same history
    /// always yields the same identifier.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::ReferenceNotFound` if no attempt succeeds, or
    /// `ResolveError::Provider` if the host rejects the credential or the
    /// rate limit is exhausted.
    pub async fn resolve(&self, label: &str) -> Result<CommitId, ResolveError> {
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return Err(ResolveError::ReferenceNotFound {
                label: label.to_string(),
                last_error: None,
            });
        }

        let (kinds, name, try_commit): (&[RefKind], &str, bool) =
            if let Some(name) = trimmed.strip_prefix("refs/tags/") {
                (&[RefKind::Tag], name, false)
            } else if let Some(name) = trimmed.strip_prefix("refs/heads/") {
                (&[RefKind::Branch], name, false)
            } else {
                (
                    &[RefKind::Tag, RefKind::Branch],
                    trimmed,
                    CommitId::looks_like_sha(trimmed),
                )
            };

        let mut last_error = None;

        if try_commit {
            match self.as_commit(trimmed).await? {
                Attempt::Resolved(id) => return Ok(id),
                Attempt::Missed(err) => last_error = err.or(last_error),
            }
        }

        for &kind in kinds {
            match self.as_reference(kind, name, trimmed).await? {
                Attempt::Resolved(id) => return Ok(id),
                Attempt::Missed(err) => last_error = err.or(last_error),
            }
        }

        Err(ResolveError::ReferenceNotFound {
            label: trimmed.to_string(),
            last_error,
        })
    }

    async fn as_commit(&self, label: &str) -> Result<Attempt, ResolveError> {
        match self.provider.commit(self.repo, label).await {
            Ok(commit) => {
                debug!(label = %label, sha = %commit.id, "Resolved as commit");
                Ok(Attempt::Resolved(commit.id))
            }
            Err(err) => classify_miss(label, err),
        }
    }

    async fn as_reference(
        &self,
        kind: RefKind,
        name: &str,
        label: &str,
    ) -> Result<Attempt, ResolveError> {
        let target = match self.provider.reference(self.repo, kind, name).await {
            Ok(target) => target,
            Err(err) => return classify_miss(label, err),
        };
        match self.peel(target).await {
            Ok(Some(id)) => {
                debug!(label = %label, kind = kind.namespace(), sha = %id, "Resolved reference");
                Ok(Attempt::Resolved(id))
            }
            Ok(None) => Ok(Attempt::Missed(Some(format!(
                "refs/{}/{name} does not point at a commit",
                kind.namespace()
            )))),
            Err(err) => classify_miss(label, err),
        }
    }

    /// Follow annotated tag objects down to a commit
    ///
    /// Returns `None` when the chain ends at a non-commit object or is deeper
    /// than [`MAX_TAG_DEPTH`].
    async fn peel(&self, mut target: RefTarget) -> Result<Option<CommitId>, ProviderError> {
        for _ in 0..=MAX_TAG_DEPTH {
            match target.kind {
                ObjectKind::Commit => return Ok(Some(CommitId::new(target.sha))),
                ObjectKind::Tag => {
                    target = self.provider.tag_target(self.repo, &target.sha).await?;
                }
                ObjectKind::Other => return Ok(None),
            }
        }
        Ok(None)
    }
}

/// Classify a failed attempt: plain misses move on, fatal errors stop
fn classify_miss(label: &str, err: ProviderError) -> Result<Attempt, ResolveError> {
    match err {
        ProviderError::NotFound { .. } => Ok(Attempt::Missed(None)),
        ProviderError::Unauthorized { .. } | ProviderError::RateLimited { .. } => {
            Err(ResolveError::Provider {
                label: label.to_string(),
                source: err,
            })
        }
        other => {
            debug!(label = %label, error = %other, "Resolution attempt failed");
            Ok(Attempt::Missed(Some(other.to_string())))
        }
    }
}

/// Resolve `label` in `repo`
///
/// # Errors
///
/// See [`Resolver::resolve`].
pub async fn resolve<P: HistoryProvider + ?Sized>(
    provider: &P,
    repo: &RepositoryCoordinate,
    label: &str,
) -> Result<CommitId, ResolveError> {
    Resolver::new(provider, repo).resolve(label).await
}

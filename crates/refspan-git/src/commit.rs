// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Commit types shared by the resolver, fetcher and pipeline

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GitError;
use crate::message::{MessageInfo, parse_message};

/// Canonical commit identifier (a hexadecimal object hash)
///
/// Identifiers are stored lowercase so that equality is the identity
/// comparison used everywhere else in the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(String);

impl CommitId {
    /// Wrap an identifier reported by the host without validating it
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().to_ascii_lowercase())
    }

    /// Parse a full 40-character identifier
    ///
    /// # Errors
    ///
    /// Returns `GitError::InvalidCommitId` if `id` is not 40 hex characters.
    pub fn parse(id: &str) -> Result<Self, GitError> {
        let id = id.trim();
        if Self::is_valid_sha(id) {
            Ok(Self::new(id))
        } else {
            Err(GitError::InvalidCommitId { id: id.to_string() })
        }
    }

    /// Validate that a SHA is a valid 40-character hex string
    #[must_use]
    pub fn is_valid_sha(sha: &str) -> bool {
        sha.len() == 40 && sha.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// Whether a label could be an abbreviated or full commit identifier
    #[must_use]
    pub fn looks_like_sha(label: &str) -> bool {
        (4..=40).contains(&label.len()) && label.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// The identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the short SHA (first 7 characters)
    #[must_use]
    pub fn short(&self) -> &str {
        &self.0[..7.min(self.0.len())]
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CommitId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A commit as reported by the history provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCommit {
    /// Commit identifier
    #[serde(rename = "sha")]
    pub id: CommitId,
    /// Full commit message
    pub message: String,
    /// Author name
    pub author_name: String,
    /// Author timestamp
    pub author_date: DateTime<Utc>,
    /// Changed file paths, `None` until looked up
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub changed_files: Option<Vec<String>>,
}

impl RawCommit {
    /// Create a commit whose changed files are not yet known
    #[must_use]
    pub fn new(
        id: CommitId,
        message: impl Into<String>,
        author_name: impl Into<String>,
        author_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            message: message.into(),
            author_name: author_name.into(),
            author_date,
            changed_files: None,
        }
    }

    /// Attach a known changed-file list
    #[must_use]
    pub fn with_files(mut self, files: Vec<String>) -> Self {
        self.changed_files = Some(files);
        self
    }

    /// Get the first line of the commit message (subject)
    #[must_use]
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    /// Whether the changed-file list has been filled
    #[must_use]
    pub fn has_files(&self) -> bool {
        self.changed_files.is_some()
    }

    /// Fill the changed-file cache unless it is already populated
    ///
    /// Returns the cached list, which is the previously stored one when the
    /// cache was already full.
    pub fn fill_files(&mut self, files: Vec<String>) -> &[String] {
        self.changed_files.get_or_insert(files)
    }
}

/// A commit enriched with metadata parsed from its message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedCommit {
    /// The underlying commit
    #[serde(flatten)]
    pub commit: RawCommit,
    /// Release classifier keyword, lowercase
    pub classifier: Option<String>,
    /// Conventional-commit scope, e.g. `api` in `feat(api): ...`
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub scope: Option<String>,
    /// Whether the header carried the `!` breaking-change marker
    #[serde(default)]
    pub breaking: bool,
    /// Issue-tracker ticket such as `ABC-123`
    pub ticket_id: Option<String>,
    /// Subject line without classifier and ticket
    pub clean_message: String,
}

impl ParsedCommit {
    /// Parse the message of `commit` and attach the extracted metadata
    #[must_use]
    pub fn from_raw(commit: RawCommit) -> Self {
        let MessageInfo {
            classifier,
            scope,
            breaking,
            ticket_id,
            clean_message,
        } = parse_message(&commit.message);
        Self {
            commit,
            classifier,
            scope,
            breaking,
            ticket_id,
            clean_message,
        }
    }

    /// Identifier of the underlying commit
    #[must_use]
    pub fn id(&self) -> &CommitId {
        &self.commit.id
    }
}

impl From<RawCommit> for ParsedCommit {
    fn from(commit: RawCommit) -> Self {
        Self::from_raw(commit)
    }
}

// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! GitHub API response types
//!
//! Only the fields range resolution needs are modelled; everything else in
//! the responses is ignored.

use chrono::{DateTime, FixedOffset, Utc};
use refspan_git::{CommitId, RawCommit};
use serde::{Deserialize, Serialize};

use crate::provider::{HistoryPage, ObjectKind, RefTarget};

// ============================================================================
// REST v3
// ============================================================================

/// A commit from `GET /repos/{owner}/{repo}/commits[/{ref}]`
#[derive(Debug, Clone, Deserialize)]
pub struct CommitResponse {
    /// Full commit SHA
    pub sha: String,
    /// Git-level commit data
    pub commit: CommitDetails,
    /// Changed files; only present on single-commit lookups
    #[serde(default)]
    pub files: Option<Vec<FileEntry>>,
}

/// Message and author of a commit
#[derive(Debug, Clone, Deserialize)]
pub struct CommitDetails {
    /// Commit message
    pub message: String,
    /// Git author signature
    pub author: Option<Signature>,
}

/// A git signature
#[derive(Debug, Clone, Deserialize)]
pub struct Signature {
    /// Author name
    pub name: Option<String>,
    /// Author date
    pub date: Option<DateTime<Utc>>,
}

/// One changed file of a commit
#[derive(Debug, Clone, Deserialize)]
pub struct FileEntry {
    /// Path after the change
    pub filename: String,
    /// Path before a rename
    #[serde(default)]
    pub previous_filename: Option<String>,
}

/// Largest file listing GitHub returns on one page of a commit
pub const FILES_PER_PAGE: usize = 100;

impl CommitResponse {
    /// Convert a single-commit lookup, keeping the files only when complete
    ///
    /// A listing that fills the page may continue on later pages, so the
    /// files are left unset for the paginated lookup to fill.
    #[must_use]
    pub fn into_raw_paged(mut self, per_page: usize) -> RawCommit {
        if self.files.as_ref().is_some_and(|files| files.len() >= per_page) {
            self.files = None;
        }
        self.into_raw()
    }

    /// Convert into the workspace commit model
    #[must_use]
    pub fn into_raw(self) -> RawCommit {
        let (author_name, author_date) = match self.commit.author {
            Some(sig) => (sig.name.unwrap_or_default(), sig.date.unwrap_or_default()),
            None => (String::new(), DateTime::<Utc>::default()),
        };
        let raw = RawCommit::new(
            CommitId::new(self.sha),
            self.commit.message,
            author_name,
            author_date,
        );
        match self.files {
            Some(files) => raw.with_files(flatten_files(files)),
            None => raw,
        }
    }
}

/// Changed paths, counting a rename under both its old and new path
#[must_use]
pub fn flatten_files(files: Vec<FileEntry>) -> Vec<String> {
    let mut paths = Vec::with_capacity(files.len());
    for file in files {
        if let Some(previous) = file.previous_filename
            && previous != file.filename
        {
            paths.push(previous);
        }
        paths.push(file.filename);
    }
    paths
}

/// A git object pointer inside a ref or tag response
#[derive(Debug, Clone, Deserialize)]
pub struct GitObject {
    /// `commit`, `tag`, `tree` or `blob`
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    /// Object SHA
    pub sha: String,
}

impl From<GitObject> for RefTarget {
    fn from(object: GitObject) -> Self {
        Self {
            kind: object.kind,
            sha: object.sha,
        }
    }
}

/// `GET /repos/{owner}/{repo}/git/ref/{ref}`
#[derive(Debug, Clone, Deserialize)]
pub struct RefResponse {
    /// Object the reference points at
    pub object: GitObject,
}

/// `GET /repos/{owner}/{repo}/git/tags/{sha}`
#[derive(Debug, Clone, Deserialize)]
pub struct TagResponse {
    /// Object the annotated tag points at
    pub object: GitObject,
}

/// `GET /repos/{owner}/{repo}`
#[derive(Debug, Clone, Deserialize)]
pub struct RepoResponse {
    /// Default branch name
    pub default_branch: String,
}

/// `GET /repos/{owner}/{repo}/compare/{base}...{head}`
#[derive(Debug, Clone, Deserialize)]
pub struct CompareResponse {
    /// Commits across all pages
    pub total_commits: usize,
    /// Commits on this page, oldest first
    #[serde(default)]
    pub commits: Vec<CommitResponse>,
}

/// Error body returned with non-success statuses
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message
    #[serde(default)]
    pub message: String,
}

// ============================================================================
// GraphQL v4
// ============================================================================

/// Query for one page of history starting at a commit
///
/// The GraphQL `Commit` type exposes only a changed-file count, so history
/// nodes carry no file list and the REST lookup fills it when a filter needs it.
pub const HISTORY_QUERY: &str = r#"query($owner: String!, $name: String!, $oid: GitObjectID!, $first: Int!, $after: String) {
  repository(owner: $owner, name: $name) {
    object(oid: $oid) {
      ... on Commit {
        history(first: $first, after: $after) {
          pageInfo { hasNextPage endCursor }
          nodes { oid message author { name date } }
        }
      }
    }
  }
}"#;

/// Request body for a GraphQL call
#[derive(Debug, Clone, Serialize)]
pub struct GraphQlRequest<'a, V> {
    /// Query document
    pub query: &'a str,
    /// Query variables
    pub variables: V,
}

/// Variables of [`HISTORY_QUERY`]
#[derive(Debug, Clone, Serialize)]
pub struct HistoryVariables<'a> {
    /// Repository owner
    pub owner: &'a str,
    /// Repository name
    pub name: &'a str,
    /// Commit to walk back from
    pub oid: &'a str,
    /// Page size
    pub first: usize,
    /// Cursor from the previous page
    pub after: Option<&'a str>,
}

/// GraphQL response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlResponse<T> {
    /// Query result
    pub data: Option<T>,
    /// Errors reported by the endpoint
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

/// One GraphQL error
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
    /// Error message
    pub message: String,
    /// Error type such as `NOT_FOUND`
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// `data` of [`HISTORY_QUERY`]
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryData {
    /// The repository, null when not visible
    pub repository: Option<HistoryRepository>,
}

/// Repository node of [`HistoryData`]
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryRepository {
    /// The starting commit, null when unknown
    pub object: Option<HistoryObject>,
}

/// Commit node of [`HistoryRepository`]
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryObject {
    /// History connection; absent when the object is not a commit
    pub history: Option<HistoryConnection>,
}

/// One page of commit history
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryConnection {
    /// Pagination state
    pub page_info: PageInfo,
    /// Commits, newest first
    pub nodes: Vec<HistoryNode>,
}

/// Relay-style pagination state
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Whether another page exists
    pub has_next_page: bool,
    /// Cursor of the last node
    pub end_cursor: Option<String>,
}

/// A commit in a history page
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryNode {
    /// Commit SHA
    pub oid: String,
    /// Commit message
    pub message: String,
    /// Git author
    pub author: Option<GraphQlAuthor>,
}

/// Git actor in a GraphQL response
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlAuthor {
    /// Author name
    pub name: Option<String>,
    /// Author timestamp with the author's offset
    pub date: Option<DateTime<FixedOffset>>,
}

impl From<HistoryNode> for RawCommit {
    fn from(node: HistoryNode) -> Self {
        let (name, date) = match node.author {
            Some(author) => (
                author.name.unwrap_or_default(),
                author
                    .date
                    .map(|d| d.with_timezone(&Utc))
                    .unwrap_or_default(),
            ),
            None => (String::new(), DateTime::<Utc>::default()),
        };
        RawCommit::new(CommitId::new(node.oid), node.message, name, date)
    }
}

impl From<HistoryConnection> for HistoryPage {
    fn from(history: HistoryConnection) -> Self {
        Self {
            commits: history.nodes.into_iter().map(RawCommit::from).collect(),
            end_cursor: history.page_info.end_cursor,
            has_next_page: history.page_info.has_next_page,
        }
    }
}

// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for refspan-git

use thiserror::Error;

/// Errors raised while building commit-model values from untrusted input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GitError {
    /// The repository URL could not be split into owner and name
    #[error("Invalid repository URL '{url}': {reason}")]
    InvalidRepositoryUrl {
        /// The URL as supplied by the caller
        url: String,
        /// What was wrong with it
        reason: String,
    },

    /// Owner segment violates the host's naming rules
    #[error("Invalid repository owner: {owner}")]
    InvalidOwner {
        /// The rejected owner
        owner: String,
    },

    /// Repository name violates the host's naming rules
    #[error("Invalid repository name: {name}")]
    InvalidName {
        /// The rejected name
        name: String,
    },

    /// Not a full hexadecimal commit identifier
    #[error("Invalid commit identifier: {id}")]
    InvalidCommitId {
        /// The rejected identifier
        id: String,
    },
}

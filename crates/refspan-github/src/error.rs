// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for refspan-github

use thiserror::Error;

/// Errors returned by a history provider
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested object does not exist (or is not visible to the token)
    #[error("Not found: {what}")]
    NotFound {
        /// Description of the missing object
        what: String,
    },

    /// The credential was rejected
    #[error("Authentication failed: {message}")]
    Unauthorized {
        /// Message returned by the host
        message: String,
    },

    /// The host's rate limit is exhausted
    #[error("Rate limit exceeded{}", .reset.map(|r| format!(" (resets at unix time {r})")).unwrap_or_default())]
    RateLimited {
        /// Unix timestamp at which the limit resets, when reported
        reset: Option<i64>,
    },

    /// The host answered with an unexpected status
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Message returned by the host
        message: String,
    },

    /// The GraphQL endpoint reported errors
    #[error("GraphQL error: {0}")]
    GraphQl(String),

    /// The operation needs a capability this provider does not have
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Connection, TLS or timeout failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Error decoding a response body
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl ProviderError {
    /// Shorthand for a `NotFound` error
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Whether this error means the object simply does not exist
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::Transport(format!("undecodable response: {err}"));
        }
        match err.status() {
            Some(status) => Self::Http {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => Self::Transport(err.to_string()),
        }
    }
}

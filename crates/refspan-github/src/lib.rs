// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! refspan-github: commit history provider for refspan
//!
//! This library crate defines the read-only queries range resolution issues
//! against a hosted repository ([`HistoryProvider`]) and implements them for
//! GitHub and GitHub Enterprise over the REST v3 and GraphQL v4 APIs.

#![warn(missing_docs)]

//! ## Authentication
//!
//! The bearer token is passed through unchanged. Without one, the REST API
//! still answers (at a much lower rate limit) but the GraphQL history walk is
//! unavailable, so [`HistoryProvider::supports_graph`] reports `false`.
//!
//! ```rust,no_run
//! use refspan_github::{GithubClient, GithubConfig, HistoryProvider};
//!
//! let config = GithubConfig::default().with_token("ghp_example");
//! let client = GithubClient::new(config).expect("build client");
//! assert!(client.supports_graph());
//! ```

pub mod client;
pub mod error;
pub mod provider;
pub mod wire;

pub use client::{DEFAULT_API_URL, GithubClient, GithubConfig};
pub use error::ProviderError;
pub use provider::{
    Comparison, CountingProvider, HistoryPage, HistoryProvider, ObjectKind, RefKind, RefTarget,
};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::client::{GithubClient, GithubConfig};
    pub use crate::error::ProviderError;
    pub use crate::provider::{CountingProvider, HistoryProvider, RefKind, RefTarget};
}

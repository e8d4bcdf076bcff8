// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! refspan-git: commit model and pure commit processing for refspan
//!
//! This library crate holds the parts of range resolution that need no
//! network access: repository coordinates, the commit model, the commit
//! message parser and the directory filter.

#![warn(missing_docs)]

//! # Example
//!
//! ```
//! use refspan_git::{FilterCriteria, RepositoryCoordinate, parse_message};
//!
//! let repo = RepositoryCoordinate::parse("git@github.com:rust-lang/cargo.git").unwrap();
//! assert_eq!(repo.to_string(), "rust-lang/cargo");
//!
//! let info = parse_message("fix: [CARGO-12] handle empty lockfile");
//! assert_eq!(info.classifier.as_deref(), Some("fix"));
//!
//! let excludes = vec!["tests".to_string()];
//! let criteria = FilterCriteria::new(Some("src/cargo"), Some(&excludes));
//! assert!(criteria.include(&["src/cargo/core/resolver.rs"]));
//! ```

pub mod commit;
pub mod coordinate;
pub mod error;
pub mod filter;
pub mod message;

pub use commit::{CommitId, ParsedCommit, RawCommit};
pub use coordinate::RepositoryCoordinate;
pub use error::GitError;
pub use filter::FilterCriteria;
pub use message::{MessageInfo, parse_message};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::commit::{CommitId, ParsedCommit, RawCommit};
    pub use crate::coordinate::RepositoryCoordinate;
    pub use crate::error::GitError;
    pub use crate::filter::FilterCriteria;
    pub use crate::message::parse_message;
}

// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Repository coordinates
//!
//! A [`RepositoryCoordinate`] is the `owner/name` pair derived once from the
//! URL a caller supplies. Every provider call is addressed by it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GitError;

/// Maximum length of a GitHub account name
const MAX_OWNER_LEN: usize = 39;

/// Maximum length of a GitHub repository name
const MAX_NAME_LEN: usize = 100;

/// The `owner/name` pair identifying a hosted repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryCoordinate {
    owner: String,
    name: String,
}

impl RepositoryCoordinate {
    /// Build a coordinate from its parts, validating both
    ///
    /// # Errors
    ///
    /// Returns `GitError::InvalidOwner` or `GitError::InvalidName` when a part
    /// violates the host's naming rules.
    pub fn new(owner: &str, name: &str) -> Result<Self, GitError> {
        if !is_valid_owner(owner) {
            return Err(GitError::InvalidOwner {
                owner: owner.to_string(),
            });
        }
        if !is_valid_name(name) {
            return Err(GitError::InvalidName {
                name: name.to_string(),
            });
        }
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    /// Parse a repository URL
    ///
    /// Accepts HTTPS and HTTP URLs (with or without `.git`, trailing slash,
    /// or extra path segments such as `/tree/main`), scp-style SSH
    /// (`git@host:owner/name.git`), `ssh://` URLs, `host/owner/name`, and a
    /// bare `owner/name`.
    ///
    /// # Errors
    ///
    /// Returns `GitError::InvalidRepositoryUrl` if no owner and name can be
    /// found, or a naming error if they are malformed.
    pub fn parse(url: &str) -> Result<Self, GitError> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(invalid(url, "empty URL"));
        }

        let path = if let Some((_, rest)) = trimmed.split_once("://") {
            // Drop the authority (userinfo, host, port)
            match rest.split_once('/') {
                Some((_, path)) => path,
                None => return Err(invalid(url, "missing repository path")),
            }
        } else if let Some(rest) = scp_path(trimmed) {
            rest
        } else {
            let mut segments = trimmed.split('/').filter(|s| !s.is_empty());
            match (segments.next(), segments.clone().count()) {
                // `github.com/owner/name`: first segment is a host
                (Some(first), n) if n >= 2 && first.contains('.') => {
                    &trimmed[trimmed.find(first).unwrap_or(0) + first.len()..]
                }
                _ => trimmed,
            }
        };

        let mut segments = path
            .split(['/', '?', '#'])
            .filter(|s| !s.is_empty());
        let owner = segments
            .next()
            .ok_or_else(|| invalid(url, "missing owner"))?;
        let name = segments
            .next()
            .ok_or_else(|| invalid(url, "missing repository name"))?;
        let name = name.strip_suffix(".git").unwrap_or(name);

        Self::new(owner, name)
    }

    /// Repository owner (user or organization)
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Repository name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `owner/name`
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepositoryCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepositoryCoordinate {
    type Err = GitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Path part of `user@host:path`, if `s` has that shape
fn scp_path(s: &str) -> Option<&str> {
    let (authority, path) = s.split_once(':')?;
    if authority.contains('/') || !authority.contains('@') {
        return None;
    }
    Some(path)
}

fn invalid(url: &str, reason: &str) -> GitError {
    GitError::InvalidRepositoryUrl {
        url: url.to_string(),
        reason: reason.to_string(),
    }
}

fn is_valid_owner(owner: &str) -> bool {
    !owner.is_empty()
        && owner.len() <= MAX_OWNER_LEN
        && !owner.starts_with('-')
        && !owner.ends_with('-')
        && !owner.contains("--")
        && owner.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

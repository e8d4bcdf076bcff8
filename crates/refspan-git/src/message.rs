// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Commit message parsing
//!
//! Extracts a release classifier and an issue-tracker ticket from the first
//! line of a commit message. The grammar is a relaxed form of conventional
//! commits:
//!
//! ```text
//! <classifier>[(<scope>)][!][:] [[<TICKET>]] <message>
//! ```
//!
//! The keyword is case-insensitive when followed by a colon; without one it
//! must be lowercase. When the header does not start with a known classifier
//! the whole message is scanned for a bracketed ticket instead.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Release classifiers recognized at the start of a subject line
pub const CLASSIFIERS: &[&str] = &[
    "major", "minor", "patch", "breaking", "feature", "feat", "bugfix", "hotfix", "fix", "chore",
    "docs", "doc", "style", "refactor", "perf", "tests", "test", "build", "ci", "revert",
    "release", "security", "deps",
];

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    let kinds = CLASSIFIERS.join("|");
    Regex::new(&format!(
        r"^(?i-u:(?P<kind>{kinds}))(?:\((?P<scope>[^()]*)\))?(?P<bang>!)?(?:(?P<colon>\s*:\s*)|\s+|$)(?P<rest>.*)$"
    ))
    .expect("classifier header pattern is valid")
});

static LEADING_TICKET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(?P<ticket>[A-Z]+-[0-9]+)\]\s*(?P<rest>.*)$").expect("ticket pattern is valid")
});

static ANY_TICKET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([A-Z]+-[0-9]+)\]").expect("ticket pattern is valid"));

/// Metadata extracted from a commit message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageInfo {
    /// Lowercase classifier keyword, if the header starts with one
    pub classifier: Option<String>,
    /// Parenthesized scope after the classifier
    pub scope: Option<String>,
    /// `!` marker after the classifier
    pub breaking: bool,
    /// Ticket identifier such as `ABC-123`
    pub ticket_id: Option<String>,
    /// Subject line without classifier and ticket
    pub clean_message: String,
}

/// Parse a commit message
///
/// Never fails: a message that matches nothing yields no classifier, no
/// ticket, and its trimmed first line as the clean message.
#[must_use]
pub fn parse_message(message: &str) -> MessageInfo {
    let subject = message.lines().next().unwrap_or("").trim();

    if let Some(caps) = HEADER.captures(subject).filter(is_header) {
        let rest = caps.name("rest").map_or("", |m| m.as_str()).trim();
        let (ticket_id, clean) = match LEADING_TICKET.captures(rest) {
            Some(t) => (
                Some(t["ticket"].to_string()),
                t.name("rest").map_or("", |m| m.as_str()).trim(),
            ),
            None => (None, rest),
        };
        return MessageInfo {
            classifier: Some(caps["kind"].to_ascii_lowercase()),
            scope: caps
                .name("scope")
                .map(|m| m.as_str().trim().to_string())
                .filter(|s| !s.is_empty()),
            breaking: caps.name("bang").is_some(),
            ticket_id,
            clean_message: clean.to_string(),
        };
    }

    let ticket_id = ANY_TICKET
        .captures(message)
        .map(|caps| caps[1].to_string());
    let clean_message = match &ticket_id {
        Some(ticket) => collapse_spaces(&subject.replacen(&format!("[{ticket}]"), "", 1)),
        None => subject.to_string(),
    };

    MessageInfo {
        ticket_id,
        clean_message,
        ..MessageInfo::default()
    }
}

/// Without a colon only a lowercase keyword starts a header, so prose such
/// as "Release notes for 2.0" stays unclassified.
fn is_header(caps: &regex::Captures<'_>) -> bool {
    caps.name("colon").is_some() || caps["kind"].bytes().all(|b| b.is_ascii_lowercase())
}

fn collapse_spaces(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Outbound event framing
//!
//! A streamed run is a sequence of self-contained JSON records tagged by
//! `type`: one `start`, any number of `progress` and `commits`, then a single
//! terminal `complete` or `error`. [`NdjsonSink`] writes them one per line,
//! [`ChannelSink`] hands them to another task, and [`read_events`] decodes
//! such a stream while skipping records it cannot understand.

use std::io::{BufRead, ErrorKind, Write};

use async_trait::async_trait;
use refspan_git::ParsedCommit;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;

use crate::pipeline::{
    CallbackError, EventSink, FetchProgress, RunOutcome, RunStart, StreamSummary,
};

// ============================================================================
// Events
// ============================================================================

/// One record of a streamed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum StreamEvent {
    /// The run is under way
    Start {
        /// `owner/name`
        repository: String,
        /// Older reference as given
        from_ref: Option<String>,
        /// Newer reference as given
        to_ref: Option<String>,
    },
    /// A milestone status message
    Progress {
        /// Human-readable status
        message: String,
    },
    /// A batch of commits
    Commits {
        /// Filtered, parsed commits, newest first
        commits: Vec<ParsedCommit>,
        /// Fetched commits examined so far
        processed: usize,
        /// Fetched commits in the range
        total: usize,
    },
    /// The run finished
    Complete {
        /// Final summary
        summary: StreamSummary,
    },
    /// The run failed
    Error {
        /// Failure message
        message: String,
        /// Final summary
        summary: StreamSummary,
    },
}

impl StreamEvent {
    /// The terminal event for a finished run; cancelled runs have none
    #[must_use]
    pub fn terminal(summary: &StreamSummary) -> Option<Self> {
        match summary.outcome {
            RunOutcome::Done => Some(Self::Complete {
                summary: summary.clone(),
            }),
            RunOutcome::Failed => Some(Self::Error {
                message: summary
                    .error
                    .clone()
                    .unwrap_or_else(|| "Unknown failure".to_string()),
                summary: summary.clone(),
            }),
            RunOutcome::Cancelled => None,
        }
    }

    /// Whether no further events follow this one
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Error { .. })
    }
}

impl From<&RunStart> for StreamEvent {
    fn from(start: &RunStart) -> Self {
        Self::Start {
            repository: start.repository.clone(),
            from_ref: start.from_ref.clone(),
            to_ref: start.to_ref.clone(),
        }
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode one NDJSON record
///
/// # Errors
///
/// Returns the JSON error if the line is not a valid event.
pub fn parse_event(line: &str) -> Result<StreamEvent, serde_json::Error> {
    serde_json::from_str(line)
}

/// Decode an NDJSON event stream
///
/// Blank lines are ignored; malformed records and lines that are not UTF-8
/// are skipped with a warning. Reading stops at the first I/O error.
pub fn read_events<R: BufRead>(reader: R) -> impl Iterator<Item = StreamEvent> {
    reader
        .lines()
        .enumerate()
        .map_while(|(idx, line)| match line {
            Ok(line) => Some(Some((idx, line))),
            Err(err) if err.kind() == ErrorKind::InvalidData => {
                warn!(line = idx + 1, "Skipping non UTF-8 event record");
                Some(None)
            }
            Err(err) => {
                warn!(line = idx + 1, error = %err, "Stopped reading events");
                None
            }
        })
        .flatten()
        .filter_map(|(idx, line)| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            match parse_event(line) {
                Ok(event) => Some(event),
                Err(err) => {
                    warn!(line = idx + 1, error = %err, "Skipping malformed event record");
                    None
                }
            }
        })
}

// ============================================================================
// Sinks
// ============================================================================

/// Writes each event as one JSON line and flushes it
///
/// A broken pipe marks the consumer as gone and cancels the run.
pub struct NdjsonSink<W> {
    writer: W,
    closed: bool,
}

impl<W: Write + Send> NdjsonSink<W> {
    /// Write events to `writer`
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            closed: false,
        }
    }

    /// Whether the consumer has gone away
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The underlying writer
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Write one event
    ///
    /// # Errors
    ///
    /// Returns `CallbackError::Closed` once the pipe is broken and
    /// `CallbackError::Failed` for any other write failure.
    pub fn write_event(&mut self, event: &StreamEvent) -> Result<(), CallbackError> {
        if self.closed {
            return Err(CallbackError::Closed);
        }
        let line =
            serde_json::to_string(event).map_err(|e| CallbackError::Failed(e.to_string()))?;
        match writeln!(self.writer, "{line}").and_then(|()| self.writer.flush()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::BrokenPipe => {
                self.closed = true;
                Err(CallbackError::Closed)
            }
            Err(err) => Err(CallbackError::Failed(err.to_string())),
        }
    }
}

#[async_trait]
impl<W: Write + Send> EventSink for NdjsonSink<W> {
    async fn on_start(&mut self, start: &RunStart) -> Result<(), CallbackError> {
        self.write_event(&StreamEvent::from(start))
    }

    async fn on_progress(&mut self, message: &str) -> Result<(), CallbackError> {
        self.write_event(&StreamEvent::Progress {
            message: message.to_string(),
        })
    }

    async fn on_batch(
        &mut self,
        commits: &[ParsedCommit],
        progress: FetchProgress,
    ) -> Result<(), CallbackError> {
        self.write_event(&StreamEvent::Commits {
            commits: commits.to_vec(),
            processed: progress.processed,
            total: progress.total,
        })
    }

    async fn on_finish(&mut self, summary: &StreamSummary) -> Result<(), CallbackError> {
        match StreamEvent::terminal(summary) {
            Some(event) => self.write_event(&event),
            None => Ok(()),
        }
    }
}

/// Forwards events to another task
///
/// Dropping the receiver cancels the run.
pub struct ChannelSink {
    tx: mpsc::Sender<StreamEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiving end, holding at most `capacity` events
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<StreamEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    async fn send(&mut self, event: StreamEvent) -> Result<(), CallbackError> {
        self.tx.send(event).await.map_err(|_| CallbackError::Closed)
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn on_start(&mut self, start: &RunStart) -> Result<(), CallbackError> {
        self.send(StreamEvent::from(start)).await
    }

    async fn on_progress(&mut self, message: &str) -> Result<(), CallbackError> {
        self.send(StreamEvent::Progress {
            message: message.to_string(),
        })
        .await
    }

    async fn on_batch(
        &mut self,
        commits: &[ParsedCommit],
        progress: FetchProgress,
    ) -> Result<(), CallbackError> {
        self.send(StreamEvent::Commits {
            commits: commits.to_vec(),
            processed: progress.processed,
            total: progress.total,
        })
        .await
    }

    async fn on_finish(&mut self, summary: &StreamSummary) -> Result<(), CallbackError> {
        match StreamEvent::terminal(summary) {
            Some(event) => self.send(event).await,
            None => Ok(()),
        }
    }
}

/// Gathers every batch in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    commits: Vec<ParsedCommit>,
    progress: Vec<String>,
    batches: usize,
}

impl CollectingSink {
    /// Commits received so far, in delivery order
    #[must_use]
    pub fn commits(&self) -> &[ParsedCommit] {
        &self.commits
    }

    /// Progress messages received so far
    #[must_use]
    pub fn progress(&self) -> &[String] {
        &self.progress
    }

    /// Number of batches received
    #[must_use]
    pub fn batches(&self) -> usize {
        self.batches
    }

    /// Take the gathered commits
    #[must_use]
    pub fn into_commits(self) -> Vec<ParsedCommit> {
        self.commits
    }
}

#[async_trait]
impl EventSink for CollectingSink {
    async fn on_progress(&mut self, message: &str) -> Result<(), CallbackError> {
        self.progress.push(message.to_string());
        Ok(())
    }

    async fn on_batch(
        &mut self,
        commits: &[ParsedCommit],
        _progress: FetchProgress,
    ) -> Result<(), CallbackError> {
        self.batches += 1;
        self.commits.extend_from_slice(commits);
        Ok(())
    }
}

//! refspan library
//!
//! Resolves two git references in a GitHub repository and produces the
//! commits between them, optionally restricted to a directory, enriched with
//! metadata parsed from each message and delivered in batches.
//!
//! The pieces, in the order a run uses them:
//!
//! - [`resolver`]: tag, branch or commit label to a full commit identifier
//! - [`fetcher`]: graph or linear enumeration of the range
//! - [`pipeline`]: filtering, parsing, batching, progress and cancellation
//! - [`events`]: NDJSON framing of a streamed run
//! - [`config`]: request options and the command line

pub mod config;
pub mod events;
pub mod fetcher;
pub mod pipeline;
pub mod resolver;

pub use config::{Config, ConfigError, RangeOptions};
pub use events::{ChannelSink, CollectingSink, NdjsonSink, StreamEvent, read_events};
pub use fetcher::{
    ApiStrategy, FetchConfig, FetchError, FetchOutcome, FetchStrategy, RangeFetcher,
    ensure_files, select_strategy,
};
pub use pipeline::{
    CallbackError, EventSink, FetchProgress, Pipeline, PipelineState, RangeResult, RunError,
    RunFailure, RunOutcome, StreamSummary, collect, run,
};
pub use resolver::{ResolveError, Resolver, resolve};

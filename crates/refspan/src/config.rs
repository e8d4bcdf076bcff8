//! Configuration for refspan
//!
//! [`RangeOptions`] is the library's request type: every option a range
//! resolution recognizes, with its default. [`Config`] is the command-line
//! surface of the `refspan` binary and converts into it.

use std::time::Duration;

use clap::{Parser, ValueEnum};
use refspan_git::{FilterCriteria, GitError, RepositoryCoordinate};
use refspan_github::GithubConfig;
use serde::{Deserialize, Serialize};

use crate::fetcher::FetchStrategy;

// ============================================================================
// Defaults
// ============================================================================

/// Commits per graph history page
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Commits per linear history or comparison page
pub const DEFAULT_LINEAR_PAGE_SIZE: usize = 100;

/// Parsed commits per delivered batch
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Pause between delivered batches
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(100);

/// Safety cap on commits walked for a single range
pub const DEFAULT_MAX_COMMITS: usize = 5000;

/// Pages of base-side history scanned by the intersection search
pub const DEFAULT_INTERSECTION_PAGES: u32 = 3;

// ============================================================================
// Range options
// ============================================================================

/// Everything a range resolution needs to know
///
/// Built once per request and never mutated by the pipeline.
///
/// ```
/// use refspan::config::RangeOptions;
///
/// let options = RangeOptions::new("https://github.com/rust-lang/cargo")
///     .with_from("0.80.0")
///     .with_to("0.81.0")
///     .with_target_dir("src/cargo/core");
/// assert_eq!(options.batch_size, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeOptions {
    /// Repository URL in any accepted form
    pub repository_url: String,
    /// Older reference (tag, branch or commit identifier)
    pub from: Option<String>,
    /// Newer reference (tag, branch or commit identifier)
    pub to: Option<String>,
    /// Bearer token passed to the host unchanged
    #[serde(skip_serializing)]
    pub token: Option<String>,
    /// REST API root for GitHub Enterprise hosts
    pub api_url: Option<String>,
    /// Only keep commits touching this directory
    pub target_dir: Option<String>,
    /// Sub-paths of `target_dir` whose changes alone do not count
    #[serde(default)]
    pub exclude_sub_paths: Vec<String>,
    /// Force a fetch strategy instead of choosing automatically
    pub strategy_override: Option<FetchStrategy>,
    /// Commits per graph history page
    pub page_size: usize,
    /// Commits per linear history or comparison page
    pub linear_page_size: usize,
    /// Parsed commits per delivered batch
    pub batch_size: usize,
    /// Pause between delivered batches
    pub batch_delay: Duration,
    /// Safety cap on commits walked
    pub max_commits: usize,
    /// Pages of base-side history scanned by the intersection search
    pub intersection_pages: u32,
}

impl RangeOptions {
    /// Options for `repository_url` with every other setting at its default
    #[must_use]
    pub fn new(repository_url: impl Into<String>) -> Self {
        Self {
            repository_url: repository_url.into(),
            from: None,
            to: None,
            token: None,
            api_url: None,
            target_dir: None,
            exclude_sub_paths: Vec::new(),
            strategy_override: None,
            page_size: DEFAULT_PAGE_SIZE,
            linear_page_size: DEFAULT_LINEAR_PAGE_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay: DEFAULT_BATCH_DELAY,
            max_commits: DEFAULT_MAX_COMMITS,
            intersection_pages: DEFAULT_INTERSECTION_PAGES,
        }
    }

    /// Set the older reference
    #[must_use]
    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Set the newer reference
    #[must_use]
    pub fn with_to(mut self, to: impl Into<String>) -> Self {
        self.to = Some(to.into());
        self
    }

    /// Set the bearer token
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the REST API root
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = Some(api_url.into());
        self
    }

    /// Restrict the range to commits touching `dir`
    #[must_use]
    pub fn with_target_dir(mut self, dir: impl Into<String>) -> Self {
        self.target_dir = Some(dir.into());
        self
    }

    /// Ignore commits whose in-scope changes all fall under these sub-paths
    #[must_use]
    pub fn with_exclude_sub_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_sub_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Force a fetch strategy
    #[must_use]
    pub fn with_strategy(mut self, strategy: FetchStrategy) -> Self {
        self.strategy_override = Some(strategy);
        self
    }

    /// Set the graph page size
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the linear page size
    #[must_use]
    pub fn with_linear_page_size(mut self, page_size: usize) -> Self {
        self.linear_page_size = page_size;
        self
    }

    /// Set the batch size
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the pause between batches; zero disables it
    #[must_use]
    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    /// Set the walk safety cap
    #[must_use]
    pub fn with_max_commits(mut self, max_commits: usize) -> Self {
        self.max_commits = max_commits;
        self
    }

    /// Set the intersection search budget in pages
    #[must_use]
    pub fn with_intersection_pages(mut self, pages: u32) -> Self {
        self.intersection_pages = pages;
        self
    }

    /// Normalized directory filter
    #[must_use]
    pub fn filter_criteria(&self) -> FilterCriteria {
        let excludes =
            (!self.exclude_sub_paths.is_empty()).then_some(self.exclude_sub_paths.as_slice());
        FilterCriteria::new(self.target_dir.as_deref(), excludes)
    }

    /// Parse the repository URL
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if the URL does not name a repository.
    pub fn coordinate(&self) -> Result<RepositoryCoordinate, GitError> {
        RepositoryCoordinate::parse(&self.repository_url)
    }

    /// Connection settings for the GitHub provider
    #[must_use]
    pub fn github_config(&self) -> GithubConfig {
        let mut config = GithubConfig::default();
        if let Some(token) = &self.token {
            config = config.with_token(token.clone());
        }
        if let Some(api_url) = &self.api_url {
            config = config.with_api_url(api_url.clone());
        }
        config
    }
}

// ============================================================================
// Command line
// ============================================================================

/// Fetch strategy as chosen on the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// Graph when a token is available, linear otherwise
    #[default]
    Auto,
    /// Cursor-paginated history walk (needs a token)
    Graph,
    /// Path-scoped history listing or two-endpoint comparison
    Linear,
}

impl StrategyArg {
    /// The override this choice stands for
    #[must_use]
    pub fn to_override(self) -> Option<FetchStrategy> {
        match self {
            Self::Auto => None,
            Self::Graph => Some(FetchStrategy::Graph),
            Self::Linear => Some(FetchStrategy::Linear),
        }
    }
}

/// refspan - list the commits between two git references on GitHub
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "refspan")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Repository URL or `owner/name`
    ///
    /// Accepts https, ssh and scp-style URLs, with or without `.git`.
    #[arg(short, long, env = "REFSPAN_REPOSITORY")]
    pub repository: Option<String>,

    /// Older reference: tag, branch or commit identifier
    ///
    /// When omitted together with --to, the most recent commit on the
    /// default branch is returned.
    #[arg(short, long)]
    pub from: Option<String>,

    /// Newer reference: tag, branch or commit identifier
    ///
    /// Defaults to the head of the default branch.
    #[arg(short, long)]
    pub to: Option<String>,

    /// GitHub token
    ///
    /// Enables the GraphQL history walk and raises the API rate limit.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// REST API root for GitHub Enterprise, e.g. https://ghe.example.com/api/v3
    #[arg(long, env = "REFSPAN_API_URL")]
    pub api_url: Option<String>,

    /// Only list commits touching this directory
    #[arg(short = 'd', long)]
    pub target_dir: Option<String>,

    /// Sub-path of the target directory to ignore (repeatable or comma separated)
    #[arg(short = 'x', long = "exclude", value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// History fetch strategy
    #[arg(long, value_enum, default_value_t = StrategyArg::Auto)]
    pub strategy: StrategyArg,

    /// Stream newline-delimited JSON events instead of one result document
    #[arg(short, long, default_value = "false")]
    pub stream: bool,

    /// Commits per streamed batch [default: 10]
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Pause between streamed batches in milliseconds [default: 100]
    #[arg(long)]
    pub batch_delay_ms: Option<u64>,

    /// Safety cap on commits walked [default: 5000]
    #[arg(long)]
    pub max_commits: Option<usize>,

    /// Enable verbose logging (debug level)
    ///
    /// Logs are written to stderr so they never mix with the JSON output.
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,

    /// Quiet mode - suppress info-level logs
    ///
    /// Only errors and warnings will be logged.
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,
}

impl Config {
    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No repository was given
    /// - The repository does not parse
    /// - A numeric setting is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        let repository = self
            .repository
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .ok_or(ConfigError::MissingRepository)?;
        RepositoryCoordinate::parse(repository)?;

        if self.batch_size == Some(0) {
            return Err(ConfigError::ZeroValue("batch-size"));
        }
        if self.max_commits == Some(0) {
            return Err(ConfigError::ZeroValue("max-commits"));
        }
        Ok(())
    }

    /// Validate and convert into library options
    ///
    /// # Errors
    ///
    /// Returns the first validation error, see [`Config::validate`].
    pub fn to_options(&self) -> Result<RangeOptions, ConfigError> {
        self.validate()?;

        let mut options = RangeOptions::new(self.repository.clone().unwrap_or_default());
        options.from = non_empty(self.from.as_deref());
        options.to = non_empty(self.to.as_deref());
        options.token = non_empty(self.token.as_deref());
        options.api_url = non_empty(self.api_url.as_deref());
        options.target_dir = non_empty(self.target_dir.as_deref());
        options.exclude_sub_paths = self
            .exclude
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        options.strategy_override = self.strategy.to_override();
        if let Some(batch_size) = self.batch_size {
            options.batch_size = batch_size;
        }
        if let Some(ms) = self.batch_delay_ms {
            options.batch_delay = Duration::from_millis(ms);
        }
        if let Some(max_commits) = self.max_commits {
            options.max_commits = max_commits;
        }
        Ok(options)
    }

    /// Get the log level based on verbose/quiet flags
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::WARN
        } else {
            tracing::Level::INFO
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No repository given on the command line or in the environment
    #[error("No repository given; pass --repository or set REFSPAN_REPOSITORY")]
    MissingRepository,

    /// Repository URL does not parse
    #[error("Invalid repository: {0}")]
    InvalidRepository(#[from] GitError),

    /// A numeric setting that must be positive is zero
    #[error("--{0} must be greater than zero")]
    ZeroValue(&'static str),
}

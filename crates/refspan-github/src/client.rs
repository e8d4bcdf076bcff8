// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! GitHub REST v3 / GraphQL v4 implementation of [`HistoryProvider`]

use std::time::Duration;

use async_trait::async_trait;
use refspan_git::{CommitId, RawCommit, RepositoryCoordinate};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, USER_AGENT};
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::provider::{Comparison, HistoryPage, HistoryProvider, RefKind, RefTarget};
use crate::wire::{
    CommitResponse, CompareResponse, ErrorBody, FILES_PER_PAGE, GraphQlRequest, GraphQlResponse,
    HISTORY_QUERY, HistoryData, HistoryVariables, RefResponse, RepoResponse, TagResponse,
    flatten_files,
};

/// Public GitHub API root
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// GitHub stops listing a commit's files after 3000 entries
const MAX_FILE_PAGES: u32 = 30;

/// Connection settings for [`GithubClient`]
#[derive(Debug, Clone)]
pub struct GithubConfig {
    /// REST API root, e.g. `https://api.github.com` or `https://ghe.example.com/api/v3`
    pub api_url: String,
    /// Bearer token; GraphQL history walking requires one
    pub token: Option<String>,
    /// `User-Agent` header value
    pub user_agent: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            user_agent: format!("refspan/{}", env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(30),
        }
    }
}

impl GithubConfig {
    /// Set the bearer token
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the REST API root
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Set the per-request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// GraphQL endpoint matching the REST root
    ///
    /// `https://api.github.com` maps to `https://api.github.com/graphql`;
    /// an Enterprise root ending in `/api/v3` maps to `/api/graphql`.
    #[must_use]
    pub fn graphql_url(&self) -> String {
        let root = self.api_url.trim_end_matches('/');
        match root.strip_suffix("/v3") {
            Some(api) => format!("{api}/graphql"),
            None => format!("{root}/graphql"),
        }
    }
}

/// GitHub-backed history provider
pub struct GithubClient {
    config: GithubConfig,
    api_root: Url,
    http: reqwest::Client,
}

impl GithubClient {
    /// Create a client
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Transport` if the API URL is malformed or the
    /// HTTP client cannot be built.
    pub fn new(config: GithubConfig) -> Result<Self, ProviderError> {
        let api_root = Url::parse(&config.api_url)
            .map_err(|e| ProviderError::Transport(format!("invalid API URL: {e}")))?;
        if api_root.cannot_be_a_base() {
            return Err(ProviderError::Transport(format!(
                "invalid API URL: {}",
                config.api_url
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            "application/vnd.github+json"
                .parse()
                .map_err(|_| ProviderError::Transport("invalid Accept header".into()))?,
        );
        headers.insert(
            "x-github-api-version",
            "2022-11-28"
                .parse()
                .map_err(|_| ProviderError::Transport("invalid version header".into()))?,
        );
        if let Some(token) = &config.token {
            headers.insert(
                AUTHORIZATION,
                format!("Bearer {token}")
                    .parse()
                    .map_err(|_| ProviderError::Transport("token is not a valid header".into()))?,
            );
        }
        headers.insert(
            USER_AGENT,
            config
                .user_agent
                .parse()
                .map_err(|_| ProviderError::Transport("invalid User-Agent".into()))?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            config,
            api_root,
            http,
        })
    }

    /// The client's settings
    #[must_use]
    pub fn config(&self) -> &GithubConfig {
        &self.config
    }

    /// Build `{api_root}/repos/{owner}/{name}/{segments...}`, percent-encoding
    /// each segment
    fn repo_url(&self, repo: &RepositoryCoordinate, segments: &[&str]) -> Url {
        build_repo_url(&self.api_root, repo, segments)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        debug!(url = %url, "GET");
        let response = self.http.get(url).query(query).send().await?;
        let response = check_status(response).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Build a repository-scoped REST URL
fn build_repo_url(root: &Url, repo: &RepositoryCoordinate, segments: &[&str]) -> Url {
    let mut url = root.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty()
            .extend(["repos", repo.owner(), repo.name()])
            .extend(segments.iter().flat_map(|s| s.split('/')));
    }
    url
}

/// Turn a non-success response into a [`ProviderError`]
async fn check_status(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let headers = response.headers().clone();
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, &headers, &body))
}

/// Map an HTTP failure to a provider error
///
/// GitHub answers 422 for unknown commit SHAs and 404 for unknown refs, so
/// both count as not-found. A 403 or 429 with an exhausted quota is a rate
/// limit rather than an authorization failure.
#[must_use]
pub fn status_error(status: StatusCode, headers: &HeaderMap, body: &str) -> ProviderError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.chars().take(200).collect());
    let quota_exhausted = header_str(headers, "x-ratelimit-remaining") == Some("0");
    let reset = || header_str(headers, "x-ratelimit-reset").and_then(|r| r.parse().ok());
    match status {
        StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY => ProviderError::NotFound {
            what: message,
        },
        StatusCode::UNAUTHORIZED => ProviderError::Unauthorized { message },
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited { reset: reset() },
        StatusCode::FORBIDDEN if quota_exhausted => ProviderError::RateLimited { reset: reset() },
        _ => ProviderError::Http {
            status: status.as_u16(),
            message,
        },
    }
}

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[async_trait]
impl HistoryProvider for GithubClient {
    fn supports_graph(&self) -> bool {
        self.config.token.is_some()
    }

    async fn commit(
        &self,
        repo: &RepositoryCoordinate,
        id: &str,
    ) -> Result<RawCommit, ProviderError> {
        let url = self.repo_url(repo, &["commits", id]);
        let response: CommitResponse = self
            .get_json(url, &[("per_page", FILES_PER_PAGE.to_string())])
            .await?;
        Ok(response.into_raw_paged(FILES_PER_PAGE))
    }

    async fn reference(
        &self,
        repo: &RepositoryCoordinate,
        kind: RefKind,
        name: &str,
    ) -> Result<RefTarget, ProviderError> {
        let url = self.repo_url(repo, &["git", "ref", kind.namespace(), name]);
        let response: RefResponse = self.get_json(url, &[]).await?;
        Ok(response.object.into())
    }

    async fn tag_target(
        &self,
        repo: &RepositoryCoordinate,
        tag_sha: &str,
    ) -> Result<RefTarget, ProviderError> {
        let url = self.repo_url(repo, &["git", "tags", tag_sha]);
        let response: TagResponse = self.get_json(url, &[]).await?;
        Ok(response.object.into())
    }

    async fn default_branch(&self, repo: &RepositoryCoordinate) -> Result<String, ProviderError> {
        let url = self.repo_url(repo, &[]);
        let response: RepoResponse = self.get_json(url, &[]).await?;
        Ok(response.default_branch)
    }

    async fn history_page(
        &self,
        repo: &RepositoryCoordinate,
        head: &CommitId,
        after: Option<&str>,
        page_size: usize,
    ) -> Result<HistoryPage, ProviderError> {
        if self.config.token.is_none() {
            return Err(ProviderError::Unsupported(
                "GraphQL history requires a token".to_string(),
            ));
        }

        let request = GraphQlRequest {
            query: HISTORY_QUERY,
            variables: HistoryVariables {
                owner: repo.owner(),
                name: repo.name(),
                oid: head.as_str(),
                first: page_size,
                after,
            },
        };
        let graphql_url = self.config.graphql_url();
        debug!(url = %graphql_url, head = %head.short(), after = ?after, "POST history page");

        let response = self.http.post(&graphql_url).json(&request).send().await?;
        let response = check_status(response).await?;
        let body = response.text().await?;
        let envelope: GraphQlResponse<HistoryData> = serde_json::from_str(&body)?;

        if let Some(first) = envelope.errors.first() {
            if first.kind.as_deref() == Some("NOT_FOUND") {
                return Err(ProviderError::not_found(first.message.clone()));
            }
            let messages: Vec<&str> = envelope.errors.iter().map(|e| e.message.as_str()).collect();
            return Err(ProviderError::GraphQl(messages.join("; ")));
        }

        envelope
            .data
            .and_then(|d| d.repository)
            .ok_or_else(|| ProviderError::not_found(format!("repository {repo}")))?
            .object
            .and_then(|o| o.history)
            .map(HistoryPage::from)
            .ok_or_else(|| ProviderError::not_found(format!("commit {head}")))
    }

    async fn list_commits(
        &self,
        repo: &RepositoryCoordinate,
        head: &CommitId,
        path: Option<&str>,
        page: u32,
        per_page: usize,
    ) -> Result<Vec<RawCommit>, ProviderError> {
        let url = self.repo_url(repo, &["commits"]);
        let mut query = vec![
            ("sha", head.to_string()),
            ("per_page", per_page.to_string()),
            ("page", page.to_string()),
        ];
        if let Some(path) = path {
            query.push(("path", path.to_string()));
        }
        let response: Vec<CommitResponse> = self.get_json(url, &query).await?;
        Ok(response.into_iter().map(CommitResponse::into_raw).collect())
    }

    async fn compare(
        &self,
        repo: &RepositoryCoordinate,
        base: &CommitId,
        head: &CommitId,
        page: u32,
        per_page: usize,
    ) -> Result<Comparison, ProviderError> {
        let basehead = format!("{base}...{head}");
        let url = self.repo_url(repo, &["compare", &basehead]);
        let response: CompareResponse = self
            .get_json(
                url,
                &[
                    ("per_page", per_page.to_string()),
                    ("page", page.to_string()),
                ],
            )
            .await?;
        Ok(Comparison {
            total_commits: response.total_commits,
            commits: response
                .commits
                .into_iter()
                .map(|c| {
                    // Compare pages carry no per-commit file lists
                    let mut raw = c.into_raw();
                    raw.changed_files = None;
                    raw
                })
                .collect(),
        })
    }

    async fn changed_files(
        &self,
        repo: &RepositoryCoordinate,
        id: &CommitId,
    ) -> Result<Vec<String>, ProviderError> {
        let mut files = Vec::new();
        for page in 1..=MAX_FILE_PAGES {
            let url = self.repo_url(repo, &["commits", id.as_str()]);
            let response: CommitResponse = self
                .get_json(
                    url,
                    &[
                        ("per_page", FILES_PER_PAGE.to_string()),
                        ("page", page.to_string()),
                    ],
                )
                .await?;
            let entries = response.files.unwrap_or_default();
            let count = entries.len();
            files.extend(flatten_files(entries));
            if count < FILES_PER_PAGE {
                return Ok(files);
            }
        }
        warn!(sha = %id.short(), files = files.len(), "Changed-file listing truncated by host");
        Ok(files)
    }
}

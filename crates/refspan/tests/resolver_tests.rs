// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Reference resolution against an in-memory history


use fixtures::{MemoryProvider, repo};
use refspan::resolver::{MAX_TAG_DEPTH, ResolveError, Resolver, resolve};
use refspan_github::CountingProvider;

fn history() -> (MemoryProvider, Vec<refspan_git::CommitId>) {
    let (mut provider, ids) = MemoryProvider::linear(6, |i| vec![format!("src/file{i}.rs")]);
    provider
        .tag("v1.0.0", &ids[1])
        .annotated_tag("v2.0.0", &ids[3], 1)
        .branch("release", &ids[4]);
    (provider, ids)
}

#[tokio::test]
async fn test_resolves_full_and_abbreviated_ids() {
    let (provider, ids) = history();
    let repo = repo();

    let full = resolve(&provider, &repo, ids[2].as_str()).await.expect("full id");
    assert_eq!(full, ids[2]);

    let short = resolve(&provider, &repo, &ids[2].as_str()[..12])
        .await
        .expect("abbreviated id");
    assert_eq!(short, ids[2]);

    let upper = ids[2].as_str()[..10].to_ascii_uppercase();
    let upper = resolve(&provider, &repo, &upper).await.expect("uppercase id");
    assert_eq!(upper, ids[2]);
}

#[tokio::test]
async fn test_resolves_lightweight_and_annotated_tags() {
    let (provider, ids) = history();
    let repo = repo();

    assert_eq!(resolve(&provider, &repo, "v1.0.0").await.expect("tag"), ids[1]);
    assert_eq!(
        resolve(&provider, &repo, "v2.0.0").await.expect("annotated tag"),
        ids[3]
    );
    assert_eq!(provider.count("tag_target"), 1);
}

#[tokio::test]
async fn test_resolves_branch_after_tag_miss() {
    let (provider, ids) = history();
    let id = resolve(&provider, &repo(), "release").await.expect("branch");
    assert_eq!(id, ids[4]);
    // Non-hex labels never hit the commit endpoint.
    assert_eq!(provider.calls(), vec!["reference", "reference"]);
}

#[tokio::test]
async fn test_qualified_names_restrict_the_namespace() {
    let (mut provider, ids) = history();
    // A tag and a branch with the same name point at different commits.
    provider.tag("shared", &ids[0]).branch("shared", &ids[5]);
    let repo = repo();

    assert_eq!(resolve(&provider, &repo, "shared").await.expect("tag wins"), ids[0]);
    assert_eq!(
        resolve(&provider, &repo, "refs/heads/shared").await.expect("branch"),
        ids[5]
    );
    assert_eq!(
        resolve(&provider, &repo, "refs/tags/shared").await.expect("tag"),
        ids[0]
    );

    let err = resolve(&provider, &repo, "refs/tags/release")
        .await
        .expect_err("release is only a branch");
    assert!(matches!(err, ResolveError::ReferenceNotFound { .. }));
}

#[tokio::test]
async fn test_hex_looking_branch_falls_through_to_refs() {
    let (mut provider, ids) = history();
    provider.branch("cafe", &ids[2]);
    let id = resolve(&provider, &repo(), "cafe").await.expect("branch");
    assert_eq!(id, ids[2]);
    assert_eq!(provider.calls().first(), Some(&"commit"));
}

#[tokio::test]
async fn test_unknown_label_reports_not_found() {
    let (provider, _) = history();
    let err = resolve(&provider, &repo(), "does-not-exist")
        .await
        .expect_err("missing");
    assert_eq!(err.label(), "does-not-exist");
    match err {
        ResolveError::ReferenceNotFound { last_error, .. } => assert!(last_error.is_none()),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_blank_label_is_not_found_without_requests() {
    let (provider, _) = history();
    let err = resolve(&provider, &repo(), "   ").await.expect_err("blank");
    assert!(matches!(err, ResolveError::ReferenceNotFound { .. }));
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_rate_limit_aborts_resolution() {
    let (provider, _) = history();
    let provider = provider.rate_limited();
    let err = resolve(&provider, &repo(), "v1.0.0")
        .await
        .expect_err("rate limited");
    assert!(matches!(err, ResolveError::Provider { .. }));
    assert!(err.to_string().contains("v1.0.0"));
    // Fatal errors stop after the first attempt.
    assert_eq!(provider.calls().len(), 1);
}

#[tokio::test]
async fn test_tag_chain_deeper_than_limit_is_rejected() {
    let (mut provider, ids) = history();
    provider
        .annotated_tag("nested", &ids[2], MAX_TAG_DEPTH)
        .annotated_tag("too-deep", &ids[2], MAX_TAG_DEPTH + 2);
    let repo = repo();

    assert_eq!(resolve(&provider, &repo, "nested").await.expect("nested"), ids[2]);
    let err = resolve(&provider, &repo, "too-deep")
        .await
        .expect_err("chain too deep");
    match err {
        ResolveError::ReferenceNotFound { last_error, .. } => {
            assert!(last_error.expect("reason").contains("does not point at a commit"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_resolution_is_idempotent() {
    let (provider, _) = history();
    let counting = CountingProvider::new(&provider);
    let repo = repo();
    let resolver = Resolver::new(&counting, &repo);

    let first = resolver.resolve("v2.0.0").await.expect("first");
    let requests = counting.request_count();
    let second = resolver.resolve("v2.0.0").await.expect("second");

    assert_eq!(first, second);
    assert_eq!(counting.request_count(), requests * 2);
}

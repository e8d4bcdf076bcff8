// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! End-to-end runs of the streaming pipeline over an in-memory history


use fixtures::{Delivered, MemoryProvider, RecordingSink, ids_in, options};
use refspan::events::{ChannelSink, NdjsonSink, StreamEvent, read_events};
use refspan::fetcher::{ApiStrategy, FetchStrategy};
use refspan::pipeline::{FetchProgress, Pipeline, RunOutcome};
use refspan_git::CommitId;
use similar_asserts::assert_eq;
use tokio_util::sync::CancellationToken;

/// 25 commits tagged `v1` (index 4) and `v2` (index 24)
fn tagged_history() -> (MemoryProvider, Vec<CommitId>) {
    let (mut provider, ids) = MemoryProvider::linear(25, |i| vec![format!("src/module{i}.rs")]);
    provider.tag("v1", &ids[4]).tag("v2", &ids[24]);
    (provider, ids)
}

/// `ids[lo..=hi]`, newest first
fn span(ids: &[CommitId], lo: usize, hi: usize) -> Vec<CommitId> {
    ids[lo..=hi].iter().rev().cloned().collect()
}

// ============================================================================
// Batching and ordering
// ============================================================================

#[tokio::test]
async fn test_run_delivers_fixed_size_batches() {
    let (provider, ids) = tagged_history();
    let pipeline = Pipeline::new(
        &provider,
        options().with_from("v1").with_to("v2").with_batch_size(6),
    );
    let mut sink = RecordingSink::default();

    let summary = pipeline.run(&mut sink, &CancellationToken::new()).await;

    assert_eq!(summary.outcome, RunOutcome::Done);
    let sizes: Vec<usize> = sink.batches().iter().map(|b| b.len()).collect();
    assert_eq!(sizes, vec![6, 6, 6, 2]);
    assert_eq!(
        sink.batch_progress(),
        vec![
            FetchProgress { processed: 6, total: 20 },
            FetchProgress { processed: 12, total: 20 },
            FetchProgress { processed: 18, total: 20 },
            FetchProgress { processed: 20, total: 20 },
        ]
    );
    assert_eq!(ids_of(&sink), span(&ids, 5, 24));

    assert_eq!(summary.total_commits, 20);
    assert_eq!(summary.checked, 20);
    assert_eq!(summary.api_strategy_used, ApiStrategy::Graph);
    assert!(summary.boundary_confirmed);
    assert_eq!(summary.from_sha.as_ref(), Some(&ids[4]));
    assert_eq!(summary.to_sha.as_ref(), Some(&ids[24]));
    assert_eq!(summary.repository.as_deref(), Some("octocat/Hello-World"));
    assert!(summary.warnings.is_empty());
    assert!(summary.request_count > 0);
}

fn ids_of(sink: &RecordingSink) -> Vec<CommitId> {
    ids_in(&sink.commits())
}

#[tokio::test]
async fn test_run_announces_start_first_and_finish_last() {
    let (provider, _) = tagged_history();
    let pipeline = Pipeline::new(&provider, options().with_from("v1").with_to("v2"));
    let mut sink = RecordingSink::default();

    let summary = pipeline.run(&mut sink, &CancellationToken::new()).await;

    match sink.delivered.first() {
        Some(Delivered::Start(start)) => {
            assert_eq!(start.repository, "octocat/Hello-World");
            assert_eq!(start.from_ref.as_deref(), Some("v1"));
            assert_eq!(start.to_ref.as_deref(), Some("v2"));
        }
        other => panic!("expected start, got {other:?}"),
    }
    assert_eq!(sink.delivered.last(), Some(&Delivered::Finish(summary)));

    let messages = sink.messages();
    assert_eq!(messages[0], "Initializing range for octocat/Hello-World");
    assert!(messages.contains(&"Resolving v1"));
    assert!(messages.contains(&"Resolving v2"));
    assert!(messages.iter().any(|m| m.starts_with("Fetching commits from")));
    assert!(messages.contains(&"Fetched 20 commits"));
    assert_eq!(messages.last(), Some(&"Completed: 20 commits (20 checked)"));
}

#[tokio::test]
async fn test_streamed_batches_equal_collected_result() {
    let (provider, _) = tagged_history();
    let pipeline = Pipeline::new(
        &provider,
        options().with_from("v1").with_to("v2").with_batch_size(3),
    );
    let mut sink = RecordingSink::default();
    pipeline.run(&mut sink, &CancellationToken::new()).await;

    let result = pipeline.collect().await.expect("collect");

    assert_eq!(result.commits, sink.commits());
    assert_eq!(result.total_commits, 20);
    assert_eq!(result.repository, "octocat/Hello-World");
    assert_eq!(result.from_ref.as_deref(), Some("v1"));
    assert_eq!(result.to_ref.as_deref(), Some("v2"));
    assert_eq!(result.api_strategy_used, ApiStrategy::Graph);
    assert!(result.warning.is_none());
}

#[tokio::test]
async fn test_commits_are_parsed() {
    let (provider, ids) = tagged_history();
    let pipeline = Pipeline::new(&provider, options().with_from("v1").with_to("v2"));

    let result = pipeline.collect().await.expect("collect");

    // Commit 5 is "fix: [HW-1] change number 5"
    let commit = result
        .commits
        .iter()
        .find(|c| *c.id() == ids[5])
        .expect("commit 5");
    assert_eq!(commit.classifier.as_deref(), Some("fix"));
    assert_eq!(commit.ticket_id.as_deref(), Some("HW-1"));
}

// ============================================================================
// Degenerate ranges
// ============================================================================

#[tokio::test]
async fn test_same_reference_yields_empty_range() {
    let (mut provider, ids) = tagged_history();
    provider.tag("also-v1", &ids[4]);
    let pipeline = Pipeline::new(&provider, options().with_from("v1").with_to("also-v1"));
    let mut sink = RecordingSink::default();

    let summary = pipeline.run(&mut sink, &CancellationToken::new()).await;

    assert_eq!(summary.outcome, RunOutcome::Done);
    assert_eq!(summary.total_commits, 0);
    assert!(sink.batches().is_empty());
    assert!(summary.boundary_confirmed);
    assert!(summary.warning().expect("warning").contains("the range is empty"));
    assert_eq!(provider.count("history_page"), 0);
    assert_eq!(provider.count("compare"), 0);
}

#[tokio::test]
async fn test_no_references_returns_newest_default_branch_commit() {
    let (provider, ids) = tagged_history();
    let pipeline = Pipeline::new(&provider, options());

    let result = pipeline.collect().await.expect("collect");

    assert_eq!(ids_in(&result.commits), vec![ids[24].clone()]);
    assert!(result.from_sha.is_none());
    assert_eq!(result.to_sha.as_ref(), Some(&ids[24]));
    assert!(result.warning.expect("warning").contains("No references given"));
    assert!(result.boundary_confirmed);
}

#[tokio::test]
async fn test_single_reference_runs_to_default_branch_head() {
    let (mut provider, ids) = tagged_history();
    provider.tag("v0", &ids[19]).branch("trunk", &ids[24]);
    let provider = provider.with_default_branch("trunk");
    let pipeline = Pipeline::new(&provider, options().with_from("v0"));

    let result = pipeline.collect().await.expect("collect");

    assert_eq!(ids_in(&result.commits), span(&ids, 20, 24));
    assert_eq!(result.from_sha.as_ref(), Some(&ids[19]));
    assert!(
        result
            .warning
            .expect("warning")
            .contains("Only one reference given")
    );
    assert_eq!(provider.count("default_branch"), 1);
}

// ============================================================================
// Filtering
// ============================================================================

fn app_history() -> (MemoryProvider, Vec<CommitId>) {
    let (mut provider, ids) = MemoryProvider::linear(20, |i| {
        if i % 3 == 0 {
            vec![format!("app/screen{i}.rs")]
        } else {
            vec![format!("lib/util{i}.rs")]
        }
    });
    provider.tag("start", &ids[1]).tag("end", &ids[19]);
    (provider, ids)
}

fn expected_app(ids: &[CommitId]) -> Vec<CommitId> {
    [18, 15, 12, 9, 6, 3].iter().map(|&i| ids[i].clone()).collect()
}

#[tokio::test]
async fn test_target_dir_filters_graph_results() {
    let (provider, ids) = app_history();
    let pipeline = Pipeline::new(
        &provider,
        options().with_from("start").with_to("end").with_target_dir("app/"),
    );

    let result = pipeline.collect().await.expect("collect");

    assert_eq!(ids_in(&result.commits), expected_app(&ids));
    assert_eq!(result.api_strategy_used, ApiStrategy::Graph);
    // Graph pages carry no files; each of the 18 commits needs a lookup.
    assert_eq!(provider.count("changed_files"), 18);
}

#[tokio::test]
async fn test_path_scoped_history_skips_file_lookups() {
    let (provider, ids) = app_history();
    let provider = provider.without_graph();
    let pipeline = Pipeline::new(
        &provider,
        options().with_from("start").with_to("end").with_target_dir("app"),
    );
    let mut sink = RecordingSink::default();

    let summary = pipeline.run(&mut sink, &CancellationToken::new()).await;

    assert_eq!(ids_of(&sink), expected_app(&ids));
    assert_eq!(summary.api_strategy_used, ApiStrategy::Linear);
    assert!(summary.boundary_confirmed);
    assert_eq!(provider.count("changed_files"), 0);
}

#[tokio::test]
async fn test_graph_and_linear_agree_on_filtered_range() {
    let (graph, _) = app_history();
    let (linear, _) = app_history();
    let linear = linear.without_graph();
    let opts = options().with_from("start").with_to("end").with_target_dir("app");

    let from_graph = Pipeline::new(&graph, opts.clone()).collect().await.expect("graph");
    let from_linear = Pipeline::new(&linear, opts).collect().await.expect("linear");

    assert_eq!(from_graph.commits, from_linear.commits);
}

#[tokio::test]
async fn test_exclusion_only_wins_when_total() {
    let (mut provider, ids) = MemoryProvider::linear(8, |i| {
        if i % 2 == 0 {
            vec!["app/generated/schema.rs".to_string()]
        } else {
            vec![
                "app/main.rs".to_string(),
                "app/generated/schema.rs".to_string(),
            ]
        }
    });
    provider.tag("start", &ids[0]).tag("end", &ids[7]);
    let provider = provider.without_graph();
    let pipeline = Pipeline::new(
        &provider,
        options()
            .with_from("start")
            .with_to("end")
            .with_target_dir("app")
            .with_exclude_sub_paths(["generated"]),
    );

    let result = pipeline.collect().await.expect("collect");

    let expected: Vec<CommitId> = [7, 5, 3, 1].iter().map(|&i| ids[i].clone()).collect();
    assert_eq!(ids_in(&result.commits), expected);
    // Excludes need the file lists even for a path-scoped listing.
    assert!(provider.count("changed_files") > 0);
}

#[tokio::test]
async fn test_file_lookup_failure_skips_commit_under_target_dir() {
    let (provider, ids) = app_history();
    let provider = provider.failing_files(&ids[9]);
    let pipeline = Pipeline::new(
        &provider,
        options().with_from("start").with_to("end").with_target_dir("app"),
    );
    let mut sink = RecordingSink::default();

    let summary = pipeline.run(&mut sink, &CancellationToken::new()).await;

    assert_eq!(summary.outcome, RunOutcome::Done);
    assert_eq!(summary.file_lookup_failures, 1);
    assert!(!ids_of(&sink).contains(&ids[9]));
    assert_eq!(ids_of(&sink).len(), 5);
}

#[tokio::test]
async fn test_file_lookup_failure_keeps_commit_without_target_dir() {
    let (mut provider, ids) = MemoryProvider::linear(6, |_| vec!["docs/readme.md".to_string()]);
    provider.tag("start", &ids[0]).tag("end", &ids[5]);
    let provider = provider.failing_files(&ids[3]);
    let pipeline = Pipeline::new(
        &provider,
        options()
            .with_from("start")
            .with_to("end")
            .with_exclude_sub_paths(["docs"]),
    );
    let mut sink = RecordingSink::default();

    let summary = pipeline.run(&mut sink, &CancellationToken::new()).await;

    // Every other commit only touches docs/ and is excluded.
    assert_eq!(ids_of(&sink), vec![ids[3].clone()]);
    assert_eq!(summary.file_lookup_failures, 1);
    assert_eq!(summary.checked, 5);
}

// ============================================================================
// Callbacks and cancellation
// ============================================================================

#[tokio::test]
async fn test_failed_callbacks_are_counted_and_ignored() {
    let (provider, ids) = tagged_history();
    let pipeline = Pipeline::new(
        &provider,
        options().with_from("v1").with_to("v2").with_batch_size(5),
    );
    let mut sink = RecordingSink {
        fail_batches: vec![1, 3],
        ..RecordingSink::default()
    };

    let summary = pipeline.run(&mut sink, &CancellationToken::new()).await;

    assert_eq!(summary.outcome, RunOutcome::Done);
    assert_eq!(summary.callback_failures, 2);
    assert_eq!(ids_of(&sink), span(&ids, 5, 24));
    assert!(sink.finish().is_some());
}

#[tokio::test]
async fn test_failing_progress_does_not_stop_the_run() {
    let (provider, _) = tagged_history();
    let pipeline = Pipeline::new(&provider, options().with_from("v1").with_to("v2"));
    let mut sink = RecordingSink {
        fail_progress: true,
        ..RecordingSink::default()
    };

    let summary = pipeline.run(&mut sink, &CancellationToken::new()).await;

    assert_eq!(summary.outcome, RunOutcome::Done);
    assert_eq!(summary.total_commits, 20);
    assert_eq!(summary.callback_failures, sink.messages().len());
}

#[tokio::test]
async fn test_failing_finish_callback_is_counted() {
    let (provider, _) = tagged_history();
    let pipeline = Pipeline::new(&provider, options().with_from("v1").with_to("v2"));
    let mut sink = RecordingSink {
        fail_finish: true,
        ..RecordingSink::default()
    };

    let summary = pipeline.run(&mut sink, &CancellationToken::new()).await;

    assert_eq!(summary.outcome, RunOutcome::Done);
    assert_eq!(summary.callback_failures, 1);
    assert!(sink.finish().is_some());
}

#[tokio::test]
async fn test_failing_finish_callback_counted_without_client() {
    let mut sink = RecordingSink {
        fail_finish: true,
        ..RecordingSink::default()
    };

    let summary = refspan::pipeline::run(
        options().with_from("v1").with_to("v2").with_api_url("not a url"),
        &mut sink,
        &CancellationToken::new(),
    )
    .await;

    assert_eq!(summary.outcome, RunOutcome::Failed);
    assert!(summary.error.as_deref().is_some_and(|e| e.contains("invalid API URL")));
    assert_eq!(summary.callback_failures, 1);
    let delivered = sink.finish().expect("finish delivered");
    assert_eq!(delivered.callback_failures, 0);
    assert!(sink.batches().is_empty());
}

#[tokio::test]
async fn test_closed_consumer_cancels_the_run() {
    let (provider, _) = tagged_history();
    let pipeline = Pipeline::new(
        &provider,
        options().with_from("v1").with_to("v2").with_batch_size(4),
    );
    let mut sink = RecordingSink {
        close_at_batch: Some(2),
        ..RecordingSink::default()
    };
    let cancel = CancellationToken::new();

    let summary = pipeline.run(&mut sink, &cancel).await;

    assert_eq!(summary.outcome, RunOutcome::Cancelled);
    assert_eq!(sink.batches().len(), 1);
    assert_eq!(sink.calls_after_close, 0);
    assert!(sink.finish().is_none());
    assert!(summary.error.is_none());
    // Only the run's own token is cancelled.
    assert!(!cancel.is_cancelled());
}

#[tokio::test]
async fn test_cancelled_token_stops_before_any_request() {
    let (provider, _) = tagged_history();
    let pipeline = Pipeline::new(&provider, options().with_from("v1").with_to("v2"));
    let mut sink = RecordingSink::default();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let summary = pipeline.run(&mut sink, &cancel).await;

    assert_eq!(summary.outcome, RunOutcome::Cancelled);
    assert!(sink.delivered.is_empty());
    assert!(provider.calls().is_empty());
    assert_eq!(summary.request_count, 0);
}

#[tokio::test]
async fn test_dropped_receiver_cancels_channel_run() {
    let (provider, _) = tagged_history();
    let pipeline = Pipeline::new(&provider, options().with_from("v1").with_to("v2"));
    let (mut sink, rx) = ChannelSink::channel(4);
    drop(rx);

    let summary = pipeline.run(&mut sink, &CancellationToken::new()).await;

    assert_eq!(summary.outcome, RunOutcome::Cancelled);
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_channel_sink_delivers_in_order() {
    let (provider, ids) = tagged_history();
    let pipeline = Pipeline::new(
        &provider,
        options().with_from("v1").with_to("v2").with_batch_size(7),
    );
    let (mut sink, mut rx) = ChannelSink::channel(2);

    let run = async {
        let summary = pipeline.run(&mut sink, &CancellationToken::new()).await;
        drop(sink);
        summary
    };
    let consume = async {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    };
    let (summary, events) = tokio::join!(run, consume);

    assert_eq!(summary.outcome, RunOutcome::Done);
    assert!(matches!(events.first(), Some(StreamEvent::Start { .. })));
    assert!(matches!(events.last(), Some(StreamEvent::Complete { .. })));
    let streamed: Vec<CommitId> = events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Commits { commits, .. } => Some(ids_in(commits)),
            _ => None,
        })
        .flatten()
        .collect();
    assert_eq!(streamed, span(&ids, 5, 24));
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_unknown_reference_fails_the_run() {
    let (provider, _) = tagged_history();
    let pipeline = Pipeline::new(&provider, options().with_from("nope").with_to("v2"));
    let mut sink = RecordingSink::default();

    let summary = pipeline.run(&mut sink, &CancellationToken::new()).await;

    assert_eq!(summary.outcome, RunOutcome::Failed);
    assert!(
        summary
            .error
            .as_deref()
            .expect("error")
            .starts_with("Reference not found: nope")
    );
    assert!(sink.batches().is_empty());
    assert_eq!(sink.finish(), Some(&summary));

    let failure = pipeline.collect().await.expect_err("failure");
    assert_eq!(failure.repository.as_deref(), Some("octocat/Hello-World"));
    assert!(failure.error.starts_with("Reference not found: nope"));
}

#[tokio::test]
async fn test_invalid_repository_fails_without_start() {
    let (provider, _) = tagged_history();
    let mut opts = options().with_from("v1").with_to("v2");
    opts.repository_url = "not-a-repository".to_string();
    let pipeline = Pipeline::new(&provider, opts);
    let mut sink = RecordingSink::default();

    let summary = pipeline.run(&mut sink, &CancellationToken::new()).await;

    assert_eq!(summary.outcome, RunOutcome::Failed);
    assert!(summary.repository.is_none());
    assert!(summary.error.expect("error").starts_with("Invalid repository"));
    assert_eq!(sink.delivered.len(), 1);
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_forced_linear_reports_linear() {
    let (provider, ids) = tagged_history();
    let pipeline = Pipeline::new(
        &provider,
        options()
            .with_from("v1")
            .with_to("v2")
            .with_strategy(FetchStrategy::Linear),
    );

    let result = pipeline.collect().await.expect("collect");

    assert_eq!(result.api_strategy_used, ApiStrategy::Linear);
    assert_eq!(ids_in(&result.commits), span(&ids, 5, 24));
    assert_eq!(provider.count("history_page"), 0);
}

#[tokio::test]
async fn test_graph_failure_is_reported_as_fallback() {
    let (provider, ids) = tagged_history();
    let provider = provider.failing_graph();
    let pipeline = Pipeline::new(&provider, options().with_from("v1").with_to("v2"));

    let result = pipeline.collect().await.expect("collect");

    assert_eq!(result.api_strategy_used, ApiStrategy::LinearFallback);
    assert_eq!(ids_in(&result.commits), span(&ids, 5, 24));
    assert!(result.warning.expect("warning").contains("Graph history walk failed"));
}

// ============================================================================
// NDJSON framing
// ============================================================================

#[tokio::test]
async fn test_ndjson_stream_round_trips_through_reader() {
    let (provider, ids) = tagged_history();
    let pipeline = Pipeline::new(
        &provider,
        options().with_from("v1").with_to("v2").with_batch_size(8),
    );
    let mut sink = NdjsonSink::new(Vec::new());

    let summary = pipeline.run(&mut sink, &CancellationToken::new()).await;
    let bytes = sink.into_inner();

    let events: Vec<StreamEvent> = read_events(bytes.as_slice()).collect();
    assert!(matches!(events.first(), Some(StreamEvent::Start { .. })));
    assert_eq!(events.last(), Some(&StreamEvent::Complete { summary }));
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);

    let batches: Vec<(usize, usize)> = events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Commits {
                processed, total, ..
            } => Some((*processed, *total)),
            _ => None,
        })
        .collect();
    assert_eq!(batches, vec![(8, 20), (16, 20), (20, 20)]);

    let streamed: Vec<CommitId> = events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Commits { commits, .. } => Some(ids_in(commits)),
            _ => None,
        })
        .flatten()
        .collect();
    assert_eq!(streamed, span(&ids, 5, 24));
}

#[tokio::test]
async fn test_ndjson_failed_run_ends_with_error_event() {
    let (provider, _) = tagged_history();
    let pipeline = Pipeline::new(&provider, options().with_from("v1").with_to("missing"));
    let mut sink = NdjsonSink::new(Vec::new());

    pipeline.run(&mut sink, &CancellationToken::new()).await;
    let events: Vec<StreamEvent> = read_events(sink.into_inner().as_slice()).collect();

    match events.last() {
        Some(StreamEvent::Error { message, summary }) => {
            assert!(message.starts_with("Reference not found: missing"));
            assert_eq!(summary.outcome, RunOutcome::Failed);
        }
        other => panic!("expected error event, got {other:?}"),
    }
}

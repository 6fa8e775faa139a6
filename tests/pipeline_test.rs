mod common;

use common::{local_map, output_lines};
use consulator::{
    run_pipeline, FormatFlags, InputFormat, KvStore, MemoryStore, PipelineError, Summary,
    SyncConfig, SyncMode,
};

fn config(mode: SyncMode, prefix: &str) -> SyncConfig {
    let formats = FormatFlags {
        json: true,
        ..FormatFlags::default()
    };
    SyncConfig::new(mode, formats, vec![], prefix).expect("Should build config")
}

#[tokio::test]
async fn test_second_run_is_a_no_op() {
    let store = MemoryStore::with_pairs([("svc/x", "old"), ("svc/stale", "1"), ("other/k", "v")]);
    let local = local_map(&[("x", "new"), ("y/z", "2")]);
    let config = config(SyncMode::Sync, "svc").with_verbose(true);

    let mut out = Vec::new();
    let first = run_pipeline(&config, &local, &store, &mut out)
        .await
        .expect("First run should succeed");
    assert_eq!(
        first,
        Summary {
            inserted: 1,
            updated: 1,
            deleted: 1
        }
    );

    let mut out = Vec::new();
    let second = run_pipeline(&config, &local, &store, &mut out)
        .await
        .expect("Second run should succeed");
    assert!(second.is_empty());
    assert_eq!(
        output_lines(&out),
        vec!["Sync completed. 0 keys deleted, 0 key inserted, 0 keys updated."]
    );

    // Keys outside the prefix are untouched
    let snapshot = store.snapshot().await;
    assert_eq!(snapshot["other/k"], b"v".to_vec());
}

#[tokio::test]
async fn test_import_leaves_unknown_remote_keys() {
    let store = MemoryStore::with_pairs([("keep", "me")]);
    let config = config(SyncMode::Import, "");

    let mut out = Vec::new();
    let summary = run_pipeline(&config, &local_map(&[]), &store, &mut out)
        .await
        .expect("Should succeed");

    assert!(summary.is_empty());
    assert_eq!(store.list("").await.expect("Should list").len(), 1);
    assert_eq!(output_lines(&out), vec!["Import completed. 0 keys set."]);
}

#[tokio::test]
async fn test_listing_failure_touches_nothing() {
    let store = MemoryStore::with_pairs([("a", "1")]).fail_listing();
    let config = config(SyncMode::Sync, "");

    let mut out = Vec::new();
    let result = run_pipeline(&config, &local_map(&[("b", "2")]), &store, &mut out).await;

    assert!(matches!(result, Err(PipelineError::Listing(_))));
    assert_eq!(store.put_count(), 0);
    assert_eq!(store.delete_count(), 0);
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_dry_run_pipeline_reports_without_writing() {
    let store = MemoryStore::with_pairs([("app/a", "1")]);
    let config = config(SyncMode::Sync, "app/").with_dry_run(true);

    let mut out = Vec::new();
    let summary = run_pipeline(&config, &local_map(&[("b", "2")]), &store, &mut out)
        .await
        .expect("Should succeed");

    assert_eq!(summary.deleted, 1);
    assert_eq!(summary.inserted, 1);
    assert_eq!(store.put_count() + store.delete_count(), 0);
    assert_eq!(config.source, consulator::InputSource::Stdin(InputFormat::Json));
}

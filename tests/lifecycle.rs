//! End-to-end: prior state and configuration in, remote calls out.

use fastly_setdiff::testing::{
    assert_added, assert_deleted, assert_error_contains, assert_modified, assert_unmodified,
    RecordingHandler,
};
use fastly_setdiff::{
    apply_diff, try_init_logging, ApplySummary, ChangeKind, DiffOptions, RecordSet, SetDiff,
    SetDiffError,
};
use serde_json::json;

#[tokio::test]
async fn test_reconcile_logging_endpoints_from_state() {
    try_init_logging();

    let prior = json!({
        "logging_syslog": [
            {"name": "syslog-a", "address": "a.example.com", "port": 514, "format": "%h"},
            {"name": "syslog-b", "address": "b.example.com", "port": 514, "format": "%h"}
        ]
    });
    let desired = json!({
        "logging_syslog": [
            {"name": "syslog-b", "address": "b.example.com", "port": 514, "format": "%h"},
            {"name": "syslog-a", "address": "a.example.com", "port": 6514, "format": "%h"},
            {"name": "syslog-c", "address": "c.example.com", "port": 514, "format": "%h"}
        ]
    });

    let old = RecordSet::try_from(prior["logging_syslog"].clone()).unwrap();
    let new = RecordSet::try_from(desired["logging_syslog"].clone()).unwrap();

    let differ = SetDiff::by_field("name");
    let result = differ.diff(&old, &new).unwrap();

    assert_added(
        &result,
        &[json!({"name": "syslog-c", "address": "c.example.com", "port": 514, "format": "%h"})],
    );
    assert_modified(
        &result,
        &[json!({"name": "syslog-a", "address": "a.example.com", "port": 6514, "format": "%h"})],
    );
    assert_deleted(&result, &[]);
    assert_unmodified(
        &result,
        &[json!({"name": "syslog-b", "address": "b.example.com", "port": 514, "format": "%h"})],
    );

    let plan = differ.changes(&old, &result).unwrap();
    let kinds: Vec<_> = plan.iter().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        vec![ChangeKind::Update, ChangeKind::NoChange, ChangeKind::Create]
    );

    let handler = RecordingHandler::new();
    let summary = apply_diff(&differ, &handler, &old, &result).await.unwrap();

    assert_eq!(summary.total_calls(), 2);
    assert_eq!(
        handler.updated(),
        vec![(
            json!({"name": "syslog-a", "address": "a.example.com", "port": 6514, "format": "%h"}),
            json!({"port": 6514})
        )]
    );
}

async fn reconcile(
    handler: &RecordingHandler,
    old: &RecordSet,
    new: &RecordSet,
) -> Result<ApplySummary, SetDiffError> {
    let differ = SetDiff::by_field("name");
    let result = differ.diff(old, new)?;
    apply_diff(&differ, handler, old, &result).await
}

#[tokio::test]
async fn test_key_errors_prevent_any_remote_call() {
    let old: RecordSet = vec![json!({"name": "gone", "port": 514})].into();
    let new: RecordSet = vec![
        json!({"name": "fresh", "port": 514}),
        json!({"address": "nameless.example.com"}),
    ]
    .into();

    let handler = RecordingHandler::new();
    let err = reconcile(&handler, &old, &new).await.unwrap_err();

    assert_error_contains(&err, "nameless.example.com");
    assert!(err.is_key_error());
    assert!(handler.calls().is_empty());
}

#[test]
fn test_options_from_provider_config() {
    let config = json!({"set_diff": {"duplicate_keys": "reject"}});
    let options = DiffOptions::from_value(config["set_diff"].clone()).unwrap();

    let new: RecordSet = vec![json!({"name": "a", "port": 1}), json!({"name": "a", "port": 2})].into();
    let err = SetDiff::by_field("name")
        .with_options(options)
        .diff(&RecordSet::new(), &new)
        .unwrap_err();

    assert!(matches!(err, SetDiffError::DuplicateKey { .. }));
}

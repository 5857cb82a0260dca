//! Sharding service integration tests.
//!
//! These drive the full service over the in-memory backend and cover the
//! layer's contract: tenant isolation, server-authoritative timestamps,
//! pagination, cross-org gating, batch atomicity, migration idempotence,
//! and shard health classification.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;

use docshard_core::{
    BatchOperation, CollectionKind, FieldFilter, MemoryBackend, QueryOptions, ShardHealth,
    ShardedStore, ShardingError, SortDirection, FIELD_CREATED_AT, FIELD_ORGANIZATION_ID,
    FIELD_UPDATED_AT, MAX_BATCH_OPS,
};
use docshard_storage::{
    BackendResult, DocumentBackend, DocumentPage, DocumentWrite, FixedClock, PageOptions,
    StoredDocument, WriteOp,
};

fn fields(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
}

/// Store over a pinned-clock memory backend; the backend handle is
/// returned for seeding data and injecting access denials.
fn test_store() -> (Arc<MemoryBackend>, Arc<FixedClock>, ShardedStore) {
    let clock = Arc::new(FixedClock::new(t0()));
    let backend = Arc::new(MemoryBackend::with_clock(clock.clone()));
    let store = ShardedStore::new(backend.clone());
    (backend, clock, store)
}

fn ts(at: DateTime<Utc>) -> serde_json::Value {
    serde_json::to_value(at).unwrap()
}

#[tokio::test]
async fn create_then_read_injects_system_fields() {
    let (_backend, _clock, store) = test_store();

    let id = store
        .create("acme", CollectionKind::Employees, fields(json!({"name": "Jane"})), None)
        .await
        .unwrap();
    assert!(!id.is_empty());

    let doc = store
        .read("acme", CollectionKind::Employees, &id)
        .await
        .unwrap()
        .expect("created document must be readable");

    assert_eq!(doc.id, id);
    assert_eq!(doc.fields.get("name"), Some(&json!("Jane")));
    assert_eq!(doc.fields.get(FIELD_ORGANIZATION_ID), Some(&json!("acme")));
    assert_eq!(doc.fields.get(FIELD_CREATED_AT), Some(&ts(t0())));
    assert_eq!(doc.fields.get(FIELD_UPDATED_AT), Some(&ts(t0())));
}

#[tokio::test]
async fn spoofed_system_fields_are_overwritten() {
    let (_backend, _clock, store) = test_store();

    let id = store
        .create(
            "acme",
            CollectionKind::Warnings,
            fields(json!({
                "reason": "late",
                "organizationId": "evil-corp",
                "createdAt": "1999-01-01T00:00:00Z",
                "updatedAt": "1999-01-01T00:00:00Z",
            })),
            None,
        )
        .await
        .unwrap();

    let doc = store.read("acme", CollectionKind::Warnings, &id).await.unwrap().unwrap();
    assert_eq!(doc.fields.get(FIELD_ORGANIZATION_ID), Some(&json!("acme")));
    assert_eq!(doc.fields.get(FIELD_CREATED_AT), Some(&ts(t0())));
    assert_eq!(doc.fields.get(FIELD_UPDATED_AT), Some(&ts(t0())));
}

#[tokio::test]
async fn queries_never_cross_tenant_boundaries() {
    let (_backend, _clock, store) = test_store();

    for i in 0..3 {
        store
            .create("acme", CollectionKind::Warnings, fields(json!({"n": i})), None)
            .await
            .unwrap();
    }
    store
        .create("globex", CollectionKind::Warnings, fields(json!({"n": 99})), None)
        .await
        .unwrap();

    let result = store
        .query("acme", CollectionKind::Warnings, &[], QueryOptions::default())
        .await
        .unwrap();
    assert_eq!(result.records.len(), 3);
    for record in &result.records {
        assert_eq!(record.fields.get(FIELD_ORGANIZATION_ID), Some(&json!("acme")));
    }

    // A tenant that never wrote anything sees an empty shard.
    let result = store
        .query("initech", CollectionKind::Warnings, &[], QueryOptions::default())
        .await
        .unwrap();
    assert!(result.records.is_empty());
    assert!(!result.has_more);
}

#[tokio::test]
async fn read_of_missing_document_returns_none() {
    let (_backend, _clock, store) = test_store();
    let doc = store.read("acme", CollectionKind::Meetings, "nope").await.unwrap();
    assert!(doc.is_none());
}

#[tokio::test]
async fn update_merges_and_refreshes_only_updated_at() {
    let (_backend, clock, store) = test_store();

    let id = store
        .create(
            "acme",
            CollectionKind::Absences,
            fields(json!({"reason": "sick", "days": 2})),
            None,
        )
        .await
        .unwrap();

    let t1 = Utc.with_ymd_and_hms(2025, 6, 2, 14, 30, 0).unwrap();
    clock.set(t1);

    store
        .update(
            "acme",
            CollectionKind::Absences,
            &id,
            // createdAt in an update payload must be ignored.
            fields(json!({"days": 3, "createdAt": "1999-01-01T00:00:00Z"})),
        )
        .await
        .unwrap();

    let doc = store.read("acme", CollectionKind::Absences, &id).await.unwrap().unwrap();
    assert_eq!(doc.fields.get("reason"), Some(&json!("sick")));
    assert_eq!(doc.fields.get("days"), Some(&json!(3)));
    assert_eq!(doc.fields.get(FIELD_CREATED_AT), Some(&ts(t0())));
    assert_eq!(doc.fields.get(FIELD_UPDATED_AT), Some(&ts(t1)));
}

#[tokio::test]
async fn update_of_missing_document_is_an_error() {
    let (_backend, _clock, store) = test_store();
    let err = store
        .update("acme", CollectionKind::Absences, "ghost", fields(json!({"days": 1})))
        .await
        .unwrap_err();
    assert!(matches!(err, ShardingError::DocumentNotFound { .. }));
}

#[tokio::test]
async fn delete_is_idempotent() {
    let (_backend, _clock, store) = test_store();

    let id = store
        .create("acme", CollectionKind::Meetings, fields(json!({"topic": "1:1"})), None)
        .await
        .unwrap();
    store.delete("acme", CollectionKind::Meetings, &id).await.unwrap();
    store.delete("acme", CollectionKind::Meetings, &id).await.unwrap();
    assert!(store.read("acme", CollectionKind::Meetings, &id).await.unwrap().is_none());
}

#[tokio::test]
async fn pagination_walks_a_shard_in_pages() {
    let (_backend, _clock, store) = test_store();

    for i in 0..5 {
        store
            .create(
                "acme",
                CollectionKind::Employees,
                fields(json!({"name": format!("emp-{i}"), "seniority": i})),
                Some(&format!("e{i}")),
            )
            .await
            .unwrap();
    }

    let mut options = QueryOptions {
        page_size: Some(2),
        order_field: Some("seniority".to_string()),
        direction: None, // defaults to descending
        cursor: None,
    };

    let page1 = store.query("acme", CollectionKind::Employees, &[], options.clone()).await.unwrap();
    assert_eq!(page1.records.len(), 2);
    assert!(page1.has_more);
    assert_eq!(page1.records[0].id, "e4");
    assert_eq!(page1.records[1].id, "e3");

    options.cursor = page1.next_cursor;
    let page2 = store.query("acme", CollectionKind::Employees, &[], options.clone()).await.unwrap();
    assert_eq!(page2.records.len(), 2);
    assert!(page2.has_more);

    options.cursor = page2.next_cursor;
    let page3 = store.query("acme", CollectionKind::Employees, &[], options.clone()).await.unwrap();
    assert_eq!(page3.records.len(), 1);
    assert_eq!(page3.records[0].id, "e0");
    assert!(!page3.has_more);
    assert!(page3.next_cursor.is_none());
}

#[tokio::test]
async fn has_more_is_a_page_full_heuristic() {
    let (_backend, _clock, store) = test_store();

    for i in 0..4 {
        store
            .create(
                "acme",
                CollectionKind::Recognitions,
                fields(json!({"points": i})),
                Some(&format!("r{i}")),
            )
            .await
            .unwrap();
    }

    let mut options = QueryOptions {
        page_size: Some(2),
        order_field: Some("points".to_string()),
        direction: Some(SortDirection::Ascending),
        cursor: None,
    };

    let page1 = store.query("acme", CollectionKind::Recognitions, &[], options.clone()).await.unwrap();
    options.cursor = page1.next_cursor;
    let page2 = store.query("acme", CollectionKind::Recognitions, &[], options.clone()).await.unwrap();

    // Exactly-full final page: has_more is a documented false positive.
    assert_eq!(page2.records.len(), 2);
    assert!(page2.has_more);

    options.cursor = page2.next_cursor;
    let page3 = store.query("acme", CollectionKind::Recognitions, &[], options).await.unwrap();
    assert!(page3.records.is_empty());
    assert!(!page3.has_more);
}

#[tokio::test]
async fn query_filters_apply_within_the_shard() {
    let (_backend, _clock, store) = test_store();

    for (id, status) in [("a1", "pending"), ("a2", "approved"), ("a3", "pending")] {
        store
            .create("acme", CollectionKind::Absences, fields(json!({"status": status})), Some(id))
            .await
            .unwrap();
    }

    let result = store
        .query(
            "acme",
            CollectionKind::Absences,
            &[FieldFilter::eq("status", json!("pending"))],
            QueryOptions::default(),
        )
        .await
        .unwrap();
    let mut ids: Vec<_> = result.records.iter().map(|r| r.id.clone()).collect();
    ids.sort();
    assert_eq!(ids, vec!["a1", "a3"]);
}

#[tokio::test]
async fn invalid_cursor_is_reported_as_such() {
    let (_backend, _clock, store) = test_store();
    let err = store
        .query(
            "acme",
            CollectionKind::Employees,
            &[],
            QueryOptions { cursor: Some("@@garbage@@".to_string()), ..Default::default() },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ShardingError::InvalidCursor { .. }));
}

#[tokio::test]
async fn cross_org_queries_are_disabled_by_default() {
    let (backend, _clock, store) = test_store();

    // Deny the whole tree: if the gate let any I/O through, the error
    // would be PermissionDenied instead of the disabled class.
    backend.deny_path_prefix("");

    let err = store
        .cross_org_query(CollectionKind::AudioRecordings, &[], QueryOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ShardingError::CrossOrgQueriesDisabled));
}

#[tokio::test]
async fn cross_org_query_spans_all_tenants_when_enabled() {
    let (_backend, _clock, store) = test_store();

    for org in ["acme", "globex", "initech"] {
        store
            .create(
                org,
                CollectionKind::AudioRecordings,
                fields(json!({"status": "expired"})),
                None,
            )
            .await
            .unwrap();
    }
    store
        .create("acme", CollectionKind::AudioRecordings, fields(json!({"status": "fresh"})), None)
        .await
        .unwrap();

    store.update_config(|c| {
        c.enable_collection_groups = true;
        c.enable_cross_org_queries = true;
    });

    let result = store
        .cross_org_query(
            CollectionKind::AudioRecordings,
            &[FieldFilter::eq("status", json!("expired"))],
            QueryOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(result.records.len(), 3);

    let mut orgs: Vec<_> = result
        .records
        .iter()
        .filter_map(|r| r.fields.get(FIELD_ORGANIZATION_ID).and_then(|v| v.as_str()))
        .map(str::to_string)
        .collect();
    orgs.sort();
    assert_eq!(orgs, vec!["acme", "globex", "initech"]);
}

#[tokio::test]
async fn batch_write_commits_mixed_operations_across_tenants() {
    let (_backend, _clock, store) = test_store();

    let victim = store
        .create("acme", CollectionKind::Warnings, fields(json!({"level": 1})), None)
        .await
        .unwrap();
    let doomed = store
        .create("globex", CollectionKind::Warnings, fields(json!({"level": 9})), None)
        .await
        .unwrap();

    store
        .batch_write(vec![
            BatchOperation::Create {
                organization_id: "globex".to_string(),
                collection: CollectionKind::Meetings,
                doc_id: Some("m1".to_string()),
                data: fields(json!({"topic": "retro"})),
            },
            BatchOperation::Update {
                organization_id: "acme".to_string(),
                collection: CollectionKind::Warnings,
                doc_id: victim.clone(),
                data: fields(json!({"level": 2})),
            },
            BatchOperation::Delete {
                organization_id: "globex".to_string(),
                collection: CollectionKind::Warnings,
                doc_id: doomed.clone(),
            },
        ])
        .await
        .unwrap();

    let meeting = store.read("globex", CollectionKind::Meetings, "m1").await.unwrap().unwrap();
    assert_eq!(meeting.fields.get(FIELD_ORGANIZATION_ID), Some(&json!("globex")));
    assert_eq!(meeting.fields.get(FIELD_CREATED_AT), Some(&ts(t0())));

    let warning = store.read("acme", CollectionKind::Warnings, &victim).await.unwrap().unwrap();
    assert_eq!(warning.fields.get("level"), Some(&json!(2)));

    assert!(store.read("globex", CollectionKind::Warnings, &doomed).await.unwrap().is_none());
}

#[tokio::test]
async fn batch_with_one_failing_operation_applies_nothing() {
    let (_backend, _clock, store) = test_store();

    let err = store
        .batch_write(vec![
            BatchOperation::Create {
                organization_id: "acme".to_string(),
                collection: CollectionKind::Meetings,
                doc_id: Some("m1".to_string()),
                data: fields(json!({"topic": "kickoff"})),
            },
            BatchOperation::Update {
                organization_id: "acme".to_string(),
                collection: CollectionKind::Meetings,
                doc_id: "does-not-exist".to_string(),
                data: fields(json!({"topic": "renamed"})),
            },
        ])
        .await
        .unwrap_err();
    assert!(matches!(err, ShardingError::DocumentNotFound { .. }));

    // The create in the same batch must not have taken effect.
    assert!(store.read("acme", CollectionKind::Meetings, "m1").await.unwrap().is_none());
}

#[tokio::test]
async fn malformed_batch_operations_fail_fast_before_any_io() {
    let (backend, _clock, store) = test_store();
    backend.deny_path_prefix(""); // any I/O would surface PermissionDenied

    let err = store
        .batch_write(vec![BatchOperation::Create {
            organization_id: String::new(),
            collection: CollectionKind::Warnings,
            doc_id: None,
            data: fields(json!({"level": 1})),
        }])
        .await
        .unwrap_err();
    assert!(matches!(err, ShardingError::InvalidBatchOperation { index: 0, .. }));

    let err = store
        .batch_write(vec![
            BatchOperation::Delete {
                organization_id: "acme".to_string(),
                collection: CollectionKind::Warnings,
                doc_id: "w1".to_string(),
            },
            BatchOperation::Update {
                organization_id: "acme".to_string(),
                collection: CollectionKind::Warnings,
                doc_id: "w2".to_string(),
                data: fields(json!({})),
            },
        ])
        .await
        .unwrap_err();
    assert!(matches!(err, ShardingError::InvalidBatchOperation { index: 1, .. }));

    let oversized: Vec<BatchOperation> = (0..=MAX_BATCH_OPS)
        .map(|i| BatchOperation::Delete {
            organization_id: "acme".to_string(),
            collection: CollectionKind::Warnings,
            doc_id: format!("w{i}"),
        })
        .collect();
    let err = store.batch_write(oversized).await.unwrap_err();
    assert!(matches!(err, ShardingError::InvalidBatchOperation { .. }));
}

#[tokio::test]
async fn permission_failures_are_distinguishable_from_io_failures() {
    let (backend, _clock, store) = test_store();
    backend.deny_path_prefix("tenants/acme");

    let err = store
        .create("acme", CollectionKind::Warnings, fields(json!({"level": 1})), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ShardingError::PermissionDenied { .. }));

    // Other tenants are unaffected.
    store
        .create("globex", CollectionKind::Warnings, fields(json!({"level": 1})), None)
        .await
        .unwrap();
}

/// Seeds a legacy flat collection: `with_org` documents carrying an
/// organizationId, plus `orphans` without one.
async fn seed_legacy(
    backend: &MemoryBackend,
    collection: &str,
    with_org: &[(&str, &str)],
    orphans: usize,
) {
    for (id, org) in with_org {
        backend
            .set(
                collection,
                id,
                DocumentWrite::from_map(fields(json!({
                    "organizationId": org,
                    "reason": format!("case-{id}"),
                    "createdAt": "2020-05-01T00:00:00Z",
                }))),
            )
            .await
            .unwrap();
    }
    for i in 0..orphans {
        backend
            .set(
                collection,
                &format!("orphan-{i}"),
                DocumentWrite::from_map(fields(json!({"reason": "unknown owner"}))),
            )
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn migration_shards_legacy_documents_and_reports_skips() {
    let (backend, _clock, store) = test_store();
    seed_legacy(
        &backend,
        "legacyWarnings",
        &[
            ("w1", "acme"),
            ("w2", "acme"),
            ("w3", "globex"),
            ("w4", "acme"),
            ("w5", "globex"),
        ],
        2,
    )
    .await;

    let report = store
        .migrate_flat_collection("legacyWarnings", CollectionKind::Warnings, 2)
        .await
        .unwrap();

    assert_eq!(report.migrated, 5);
    assert_eq!(report.unchanged, 0);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.failed, 0);
    assert_eq!(report.errors.len(), 2);
    assert!(report.errors.iter().all(|e| e.contains("missing organizationId")));

    // IDs and fields are preserved, including legacy audit timestamps.
    let doc = store.read("acme", CollectionKind::Warnings, "w1").await.unwrap().unwrap();
    assert_eq!(doc.fields.get("reason"), Some(&json!("case-w1")));
    assert_eq!(doc.fields.get(FIELD_CREATED_AT), Some(&json!("2020-05-01T00:00:00Z")));

    let acme = store
        .query("acme", CollectionKind::Warnings, &[], QueryOptions::default())
        .await
        .unwrap();
    assert_eq!(acme.records.len(), 3);
    let globex = store
        .query("globex", CollectionKind::Warnings, &[], QueryOptions::default())
        .await
        .unwrap();
    assert_eq!(globex.records.len(), 2);
}

#[tokio::test]
async fn migration_reruns_are_idempotent() {
    let (backend, _clock, store) = test_store();
    seed_legacy(&backend, "legacyMeetings", &[("m1", "acme"), ("m2", "globex")], 1).await;

    let first = store
        .migrate_flat_collection("legacyMeetings", CollectionKind::Meetings, 10)
        .await
        .unwrap();
    assert_eq!(first.migrated, 2);

    let before = store.read("acme", CollectionKind::Meetings, "m1").await.unwrap();

    let second = store
        .migrate_flat_collection("legacyMeetings", CollectionKind::Meetings, 10)
        .await
        .unwrap();
    assert_eq!(second.migrated, 0);
    assert_eq!(second.unchanged, 2);
    assert_eq!(second.skipped, 1);

    let after = store.read("acme", CollectionKind::Meetings, "m1").await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn migration_continues_past_failing_documents() {
    let (backend, _clock, store) = test_store();
    seed_legacy(
        &backend,
        "legacyAbsences",
        &[("a1", "acme"), ("a2", "globex"), ("a3", "acme")],
        0,
    )
    .await;
    backend.deny_path_prefix("tenants/globex");

    let report = store
        .migrate_flat_collection("legacyAbsences", CollectionKind::Absences, 1)
        .await
        .unwrap();

    assert_eq!(report.migrated, 2);
    assert_eq!(report.failed, 1);
    assert!(!report.errors.is_empty());
    assert!(store.read("acme", CollectionKind::Absences, "a1").await.unwrap().is_some());
    assert!(store.read("acme", CollectionKind::Absences, "a3").await.unwrap().is_some());
}

/// Delegating backend that fails the next N commits with a transient
/// error, for exercising the migration retry path.
struct FlakyBackend {
    inner: MemoryBackend,
    failing_commits: AtomicU32,
}

#[async_trait]
impl DocumentBackend for FlakyBackend {
    async fn insert(&self, path: &str, write: DocumentWrite) -> BackendResult<String> {
        self.inner.insert(path, write).await
    }
    async fn set(&self, path: &str, id: &str, write: DocumentWrite) -> BackendResult<()> {
        self.inner.set(path, id, write).await
    }
    async fn get(&self, path: &str, id: &str) -> BackendResult<Option<StoredDocument>> {
        self.inner.get(path, id).await
    }
    async fn merge(&self, path: &str, id: &str, write: DocumentWrite) -> BackendResult<()> {
        self.inner.merge(path, id, write).await
    }
    async fn delete(&self, path: &str, id: &str) -> BackendResult<()> {
        self.inner.delete(path, id).await
    }
    async fn query(
        &self,
        path: &str,
        filters: &[docshard_storage::FieldFilter],
        page: &PageOptions,
    ) -> BackendResult<DocumentPage> {
        self.inner.query(path, filters, page).await
    }
    async fn query_group(
        &self,
        collection: &str,
        filters: &[docshard_storage::FieldFilter],
        page: &PageOptions,
    ) -> BackendResult<DocumentPage> {
        self.inner.query_group(collection, filters, page).await
    }
    async fn commit(&self, ops: Vec<WriteOp>) -> BackendResult<()> {
        if self
            .failing_commits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(docshard_storage::BackendError::Unavailable {
                message: "injected outage".to_string(),
            });
        }
        self.inner.commit(ops).await
    }
}

#[tokio::test]
async fn migration_retries_transient_commit_failures() {
    let backend = Arc::new(FlakyBackend {
        inner: MemoryBackend::new(),
        failing_commits: AtomicU32::new(1),
    });
    seed_legacy(&backend.inner, "legacyRecognitions", &[("r1", "acme"), ("r2", "acme")], 0).await;

    let store = ShardedStore::new(backend.clone());
    let report = store
        .migrate_flat_collection("legacyRecognitions", CollectionKind::Recognitions, 10)
        .await
        .unwrap();

    assert_eq!(report.migrated, 2);
    assert_eq!(report.failed, 0);
    assert!(store.read("acme", CollectionKind::Recognitions, "r1").await.unwrap().is_some());
}

#[tokio::test]
async fn shard_stats_classify_health_against_the_configured_limit() {
    let (_backend, _clock, store) = test_store();
    store.update_config(|c| c.max_documents_per_shard = 10);

    for i in 0..5 {
        store
            .create("acme", CollectionKind::Employees, fields(json!({"n": i})), None)
            .await
            .unwrap();
    }
    for i in 0..2 {
        store
            .create("acme", CollectionKind::Warnings, fields(json!({"n": i})), None)
            .await
            .unwrap();
    }

    let stats = store.shard_stats("acme").await.unwrap();
    assert_eq!(stats.organization_id, "acme");
    assert_eq!(stats.total_documents, 7);
    assert_eq!(stats.health, ShardHealth::Healthy);
    assert_eq!(stats.collections.len(), CollectionKind::ALL.len());

    let employees = stats
        .collections
        .iter()
        .find(|c| c.kind == CollectionKind::Employees)
        .unwrap();
    assert_eq!(employees.approx_count, 5);
    assert_eq!(employees.path, "tenants/acme/employees");

    store
        .create("acme", CollectionKind::Meetings, fields(json!({"n": 0})), None)
        .await
        .unwrap();
    let stats = store.shard_stats("acme").await.unwrap();
    assert_eq!(stats.health, ShardHealth::Warning);

    for i in 0..2 {
        store
            .create("acme", CollectionKind::Absences, fields(json!({"n": i})), None)
            .await
            .unwrap();
    }
    let stats = store.shard_stats("acme").await.unwrap();
    assert_eq!(stats.health, ShardHealth::Critical);
}

#[tokio::test]
async fn path_cache_memoizes_and_can_be_cleared_or_disabled() {
    let (_backend, _clock, store) = test_store();

    store
        .create("acme", CollectionKind::Employees, fields(json!({"n": 1})), None)
        .await
        .unwrap();
    store.read("acme", CollectionKind::Employees, "x").await.unwrap();
    assert_eq!(store.path_cache_len(), 1);

    store
        .create("globex", CollectionKind::Warnings, fields(json!({"n": 1})), None)
        .await
        .unwrap();
    assert_eq!(store.path_cache_len(), 2);

    store.clear_path_cache();
    assert_eq!(store.path_cache_len(), 0);

    // With caching disabled, resolution still works but memoizes nothing.
    store.update_config(|c| c.cache_enabled = false);
    store.read("acme", CollectionKind::Employees, "x").await.unwrap();
    assert_eq!(store.path_cache_len(), 0);
}

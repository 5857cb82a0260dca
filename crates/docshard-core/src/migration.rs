//! Flat-to-sharded migration.
//!
//! One-time utility that copies documents from a legacy root-level
//! collection into the tenant-scoped layout. Document IDs are preserved,
//! so re-running a migration overwrites its own earlier output rather
//! than duplicating it. This is the one component with a catch-and-
//! continue policy: its job is best-effort bulk conversion with a final
//! report, not all-or-nothing conversion.

use std::time::Duration;

use docshard_storage::{DocumentWrite, PageOptions, WriteOp};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::error::{ShardingError, ShardingResult};
use crate::kind::CollectionKind;
use crate::store::{ShardedStore, FIELD_ORGANIZATION_ID};

/// Commit attempts per batch before its documents are counted failed.
const COMMIT_ATTEMPTS: u32 = 3;
/// Initial backoff delay; doubles per retry.
const COMMIT_BACKOFF: Duration = Duration::from_millis(50);

/// Outcome of one migration run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Documents written into their tenant shard by this run.
    pub migrated: u64,
    /// Documents already present in the target with identical fields;
    /// not rewritten. A clean re-run reports everything here.
    pub unchanged: u64,
    /// Documents without a usable tenant field; they cannot be placed
    /// into any shard and need manual cleanup.
    pub skipped: u64,
    /// Documents whose batch commit failed after retries.
    pub failed: u64,
    /// One diagnostic per skip and per failed batch.
    pub errors: Vec<String>,
}

impl ShardedStore {
    /// Migrates every document of a legacy flat collection into the
    /// sharded layout for `target`, committing `batch_size` documents at
    /// a time (the configured default when `batch_size` is 0).
    ///
    /// Source documents keep their IDs and fields verbatim — including
    /// their original audit timestamps. Documents missing a non-empty
    /// `organizationId` string are counted as skipped with a diagnostic.
    /// A failed batch marks its documents failed and migration continues
    /// with the next batch.
    #[instrument(skip(self), fields(legacy = %legacy_collection, target = %target))]
    pub async fn migrate_flat_collection(
        &self,
        legacy_collection: &str,
        target: CollectionKind,
        batch_size: usize,
    ) -> ShardingResult<MigrationReport> {
        let batch_size = if batch_size == 0 {
            self.config().batch_size
        } else {
            batch_size
        };

        let mut report = MigrationReport::default();
        let mut staged: Vec<WriteOp> = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page_options = PageOptions {
                page_size: Some(batch_size as u32),
                page_token: page_token.take(),
                order_by: None,
            };
            let page = self
                .backend
                .query(legacy_collection, &[], &page_options)
                .await
                .map_err(|e| {
                    ShardingError::from_backend("<legacy>", legacy_collection, "migrate", e)
                })?;

            for doc in &page.documents {
                let org = doc
                    .fields
                    .get(FIELD_ORGANIZATION_ID)
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty());
                let Some(org) = org else {
                    report.skipped += 1;
                    report.errors.push(format!(
                        "document {}: missing {FIELD_ORGANIZATION_ID}, cannot be placed in a shard",
                        doc.id
                    ));
                    continue;
                };

                let path = self.shard_path(org, target);
                match self.backend.get(&path, &doc.id).await {
                    Ok(Some(existing)) if existing.fields == doc.fields => {
                        report.unchanged += 1;
                        continue;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        // Best-effort policy: record and move on, like a
                        // failed batch commit.
                        report.failed += 1;
                        report.errors.push(format!("document {}: target read failed: {e}", doc.id));
                        continue;
                    }
                }

                staged.push(WriteOp::Set {
                    path,
                    id: doc.id.clone(),
                    write: DocumentWrite::from_map(doc.fields.clone()),
                });
                if staged.len() >= batch_size {
                    self.flush_migration_batch(&mut staged, &mut report).await;
                }
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        self.flush_migration_batch(&mut staged, &mut report).await;

        info!(
            migrated = report.migrated,
            unchanged = report.unchanged,
            skipped = report.skipped,
            failed = report.failed,
            "migration finished"
        );
        Ok(report)
    }

    /// Commits the staged batch, retrying transient backend failures with
    /// exponential backoff. A batch that still fails is recorded in the
    /// report and migration moves on.
    async fn flush_migration_batch(&self, staged: &mut Vec<WriteOp>, report: &mut MigrationReport) {
        if staged.is_empty() {
            return;
        }
        let ops: Vec<WriteOp> = staged.drain(..).collect();
        let count = ops.len() as u64;

        let mut delay = COMMIT_BACKOFF;
        for attempt in 1..=COMMIT_ATTEMPTS {
            match self.backend.commit(ops.clone()).await {
                Ok(()) => {
                    report.migrated += count;
                    return;
                }
                Err(e) if e.is_transient() && attempt < COMMIT_ATTEMPTS => {
                    warn!(attempt, error = %e, "transient batch commit failure, retrying");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(e) => {
                    report.failed += count;
                    report.errors.push(format!("batch commit failed ({count} documents): {e}"));
                    return;
                }
            }
        }
    }
}

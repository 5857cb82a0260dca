//! Tenant-scoped document CRUD.

use std::sync::{Arc, PoisonError, RwLock};

use docshard_storage::{DocumentBackend, DocumentWrite, FieldMap, StoredDocument};
use tracing::{debug, instrument};

use crate::config::ShardingConfig;
use crate::error::{ShardingError, ShardingResult};
use crate::kind::CollectionKind;
use crate::path::PathResolver;

/// Tenant field stamped into every stored document. Always equals the
/// shard namespace the document lives under; caller-supplied values are
/// overwritten, never trusted.
pub const FIELD_ORGANIZATION_ID: &str = "organizationId";
/// Creation timestamp, server-assigned at first write.
pub const FIELD_CREATED_AT: &str = "createdAt";
/// Last-modification timestamp, server-assigned on every write.
pub const FIELD_UPDATED_AT: &str = "updatedAt";

/// The sharding service: namespaces all document operations under
/// deterministic per-tenant paths on a backing document database.
///
/// One instance serves every tenant; callers pass the organization ID
/// sourced from their auth/session context on each call. The path cache
/// memoizes path strings only — never document content — so there is no
/// cache-staleness concern for reads.
pub struct ShardedStore {
    pub(crate) backend: Arc<dyn DocumentBackend>,
    pub(crate) paths: PathResolver,
    config: RwLock<ShardingConfig>,
}

impl ShardedStore {
    /// Creates a store with the default (conservative) configuration.
    pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
        Self::with_config(backend, ShardingConfig::default())
    }

    pub fn with_config(backend: Arc<dyn DocumentBackend>, config: ShardingConfig) -> Self {
        Self {
            backend,
            paths: PathResolver::new(),
            config: RwLock::new(config),
        }
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> ShardingConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Mutates configuration at runtime (flags, thresholds).
    pub fn update_config(&self, f: impl FnOnce(&mut ShardingConfig)) {
        let mut config = self.config.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut config);
    }

    /// Wipes the path cache. Only needed when the path-generation scheme
    /// itself changes; never required for routine use.
    pub fn clear_path_cache(&self) {
        self.paths.clear();
    }

    /// Number of memoized shard paths.
    pub fn path_cache_len(&self) -> usize {
        self.paths.len()
    }

    pub(crate) fn shard_path(&self, organization_id: &str, kind: CollectionKind) -> String {
        let use_cache = self
            .config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .cache_enabled;
        self.paths.resolve(organization_id, kind, use_cache)
    }

    /// Builds the stored record for a create: caller data merged with the
    /// injected tenant ID and server-time audit stamps. Any
    /// `organizationId`/`createdAt`/`updatedAt` the caller supplied is
    /// replaced — spoofed audit fields must never reach storage.
    pub(crate) fn create_write(organization_id: &str, data: FieldMap) -> DocumentWrite {
        DocumentWrite::from_map(data)
            .set(FIELD_ORGANIZATION_ID, organization_id.into())
            .set_server_time(FIELD_CREATED_AT)
            .set_server_time(FIELD_UPDATED_AT)
    }

    /// Builds the merge payload for an update: the partial data without
    /// system fields, plus a refreshed `updatedAt`. `createdAt` is never
    /// touched by updates.
    pub(crate) fn update_write(mut data: FieldMap) -> DocumentWrite {
        data.remove(FIELD_ORGANIZATION_ID);
        data.remove(FIELD_CREATED_AT);
        data.remove(FIELD_UPDATED_AT);
        DocumentWrite::from_map(data).set_server_time(FIELD_UPDATED_AT)
    }

    /// Creates a document in the tenant's shard and returns its ID.
    ///
    /// With an explicit `doc_id` this is an upsert (overwrite semantics);
    /// otherwise the backend assigns a fresh unique ID.
    #[instrument(skip(self, data), fields(org = %organization_id, collection = %kind))]
    pub async fn create(
        &self,
        organization_id: &str,
        kind: CollectionKind,
        data: FieldMap,
        doc_id: Option<&str>,
    ) -> ShardingResult<String> {
        let path = self.shard_path(organization_id, kind);
        let write = Self::create_write(organization_id, data);
        let id = match doc_id {
            Some(id) => {
                self.backend.set(&path, id, write).await.map_err(|e| {
                    ShardingError::from_backend(organization_id, kind.as_str(), "create", e)
                })?;
                id.to_string()
            }
            None => self.backend.insert(&path, write).await.map_err(|e| {
                ShardingError::from_backend(organization_id, kind.as_str(), "create", e)
            })?,
        };
        debug!(doc_id = %id, "document created");
        Ok(id)
    }

    /// Reads one document. Returns `None` when it does not exist; a
    /// missing document is not an error on the read path.
    pub async fn read(
        &self,
        organization_id: &str,
        kind: CollectionKind,
        doc_id: &str,
    ) -> ShardingResult<Option<StoredDocument>> {
        let path = self.shard_path(organization_id, kind);
        self.backend
            .get(&path, doc_id)
            .await
            .map_err(|e| ShardingError::from_backend(organization_id, kind.as_str(), "read", e))
    }

    /// Merges partial data into an existing document and refreshes
    /// `updatedAt`. Fails with [`ShardingError::DocumentNotFound`] when
    /// the target does not exist — updates require an existing target.
    #[instrument(skip(self, data), fields(org = %organization_id, collection = %kind))]
    pub async fn update(
        &self,
        organization_id: &str,
        kind: CollectionKind,
        doc_id: &str,
        data: FieldMap,
    ) -> ShardingResult<()> {
        let path = self.shard_path(organization_id, kind);
        let write = Self::update_write(data);
        self.backend.merge(&path, doc_id, write).await.map_err(|e| match e {
            docshard_storage::BackendError::NotFound { .. } => ShardingError::DocumentNotFound {
                organization_id: organization_id.to_string(),
                collection: kind.as_str().to_string(),
                doc_id: doc_id.to_string(),
            },
            other => ShardingError::from_backend(organization_id, kind.as_str(), "update", other),
        })
    }

    /// Deletes a document. Idempotent: deleting a nonexistent document
    /// succeeds.
    #[instrument(skip(self), fields(org = %organization_id, collection = %kind))]
    pub async fn delete(
        &self,
        organization_id: &str,
        kind: CollectionKind,
        doc_id: &str,
    ) -> ShardingResult<()> {
        let path = self.shard_path(organization_id, kind);
        self.backend
            .delete(&path, doc_id)
            .await
            .map_err(|e| ShardingError::from_backend(organization_id, kind.as_str(), "delete", e))
    }
}

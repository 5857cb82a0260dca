//! Shard path resolution.
//!
//! Paths are a pure function of (organization, collection kind); the
//! resolver only adds memoization. Organization IDs are not validated
//! here — a malformed ID simply denotes a shard that holds nothing.
//! Tenant-ID validity is the caller's responsibility.

use dashmap::DashMap;

use crate::kind::CollectionKind;

/// Root segment every tenant shard lives under.
pub const TENANT_ROOT: &str = "tenants";

/// Computes the shard path for one tenant's collection.
pub fn shard_path(organization_id: &str, kind: CollectionKind) -> String {
    format!("{TENANT_ROOT}/{organization_id}/{kind}")
}

/// Memoizing resolver from (organization, kind) to shard path.
///
/// Entries never expire — paths are immutable once computed — but the
/// cache can be wiped wholesale after a path-scheme change or in tests.
#[derive(Debug, Default)]
pub struct PathResolver {
    cache: DashMap<(String, CollectionKind), String>,
}

impl PathResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the shard path, memoizing when `use_cache` is set.
    pub fn resolve(&self, organization_id: &str, kind: CollectionKind, use_cache: bool) -> String {
        if !use_cache {
            return shard_path(organization_id, kind);
        }
        self.cache
            .entry((organization_id.to_string(), kind))
            .or_insert_with(|| shard_path(organization_id, kind))
            .clone()
    }

    /// Wipes every cached entry.
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

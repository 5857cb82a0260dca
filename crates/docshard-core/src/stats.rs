//! Shard statistics and health classification.

use docshard_storage::PageOptions;
use tracing::instrument;

use crate::error::{ShardingError, ShardingResult};
use crate::kind::CollectionKind;
use crate::store::ShardedStore;

/// Cap on the per-collection counting query. Counts at or above this
/// are approximations, not exact totals.
pub const STATS_SAMPLE_LIMIT: u32 = 1000;

/// Three-valued shard health classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShardHealth {
    Healthy,
    /// Total at or above 80% of the configured per-shard limit.
    Warning,
    /// Total at or above the configured per-shard limit.
    Critical,
}

/// Per-collection slice of one tenant's shard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionStats {
    pub kind: CollectionKind,
    /// Capped count; see [`STATS_SAMPLE_LIMIT`].
    pub approx_count: u64,
    pub path: String,
}

/// Statistics for one tenant across all known collection kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardStats {
    pub organization_id: String,
    pub collections: Vec<CollectionStats>,
    pub total_documents: u64,
    pub health: ShardHealth,
}

fn classify(total: u64, max_documents_per_shard: u64) -> ShardHealth {
    if total >= max_documents_per_shard {
        ShardHealth::Critical
    } else if total * 10 >= max_documents_per_shard * 8 {
        ShardHealth::Warning
    } else {
        ShardHealth::Healthy
    }
}

impl ShardedStore {
    /// Estimates per-collection document counts for one tenant and
    /// classifies the shard against `max_documents_per_shard`.
    ///
    /// Each count comes from a single capped query page, so very large
    /// collections saturate at [`STATS_SAMPLE_LIMIT`].
    #[instrument(skip(self), fields(org = %organization_id))]
    pub async fn shard_stats(&self, organization_id: &str) -> ShardingResult<ShardStats> {
        let mut collections = Vec::with_capacity(CollectionKind::ALL.len());
        let mut total_documents = 0u64;

        for kind in CollectionKind::ALL {
            let path = self.shard_path(organization_id, kind);
            let page_options = PageOptions {
                page_size: Some(STATS_SAMPLE_LIMIT),
                page_token: None,
                order_by: None,
            };
            let page = self
                .backend
                .query(&path, &[], &page_options)
                .await
                .map_err(|e| {
                    ShardingError::from_backend(organization_id, kind.as_str(), "shard_stats", e)
                })?;

            let approx_count = page.documents.len() as u64;
            total_documents += approx_count;
            collections.push(CollectionStats { kind, approx_count, path });
        }

        let max = self.config().max_documents_per_shard;
        Ok(ShardStats {
            organization_id: organization_id.to_string(),
            collections,
            total_documents,
            health: classify(total_documents, max),
        })
    }
}

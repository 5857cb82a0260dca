//! docshard-core: Per-organization sharding service
//!
//! A single backing document database scales to thousands of tenant
//! organizations by namespacing every collection under a deterministic
//! per-tenant path (`tenants/{org}/{collection}`). This crate provides:
//!
//! - Path resolution with an injectable, clearable cache
//! - Tenant-scoped CRUD with server-authoritative timestamps
//! - Paginated queries confined to one tenant's shard
//! - Security-gated cross-tenant collection-group queries
//! - Atomic batch writes spanning tenants
//! - A flat-to-sharded migration tool with a per-document report
//! - Shard statistics with health classification
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                docshard-core                   │
//! ├───────────────────────────────────────────────┤
//! │  path.rs      - PathResolver + cache          │
//! │  store.rs     - ShardedStore CRUD             │
//! │  query.rs     - tenant + cross-org queries    │
//! │  batch.rs     - atomic batch writes           │
//! │  migration.rs - flat-to-sharded migration     │
//! │  stats.rs     - shard statistics / health     │
//! └───────────────────────────────────────────────┘
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod kind;
pub mod logging;
pub mod migration;
pub mod path;
pub mod query;
pub mod stats;
pub mod store;

// Re-export commonly used types
pub use batch::{BatchOperation, MAX_BATCH_OPS};
pub use config::ShardingConfig;
pub use error::{ShardingError, ShardingResult};
pub use kind::CollectionKind;
pub use migration::MigrationReport;
pub use query::{QueryOptions, QueryResult};
pub use stats::{CollectionStats, ShardHealth, ShardStats};
pub use store::{ShardedStore, FIELD_CREATED_AT, FIELD_ORGANIZATION_ID, FIELD_UPDATED_AT};

// The backend surface callers need to construct and drive a store.
pub use docshard_storage::{
    DocumentBackend, FieldFilter, FieldMap, FilterOp, MemoryBackend, SortDirection, StoredDocument,
};

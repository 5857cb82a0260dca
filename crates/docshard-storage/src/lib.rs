//! docshard-storage: Document-database backend abstraction
//!
//! This crate provides the backing-store abstraction for docshard, including:
//! - DocumentBackend trait for hierarchical document storage
//! - In-memory implementation for testing and embedded use
//! - Server-authoritative timestamp handling via an injectable Clock
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              docshard-storage                │
//! ├─────────────────────────────────────────────┤
//! │  traits.rs - DocumentBackend trait, queries │
//! │  memory.rs - In-memory implementation       │
//! │  clock.rs  - Server-time source             │
//! └─────────────────────────────────────────────┘
//! ```

pub mod clock;
pub mod error;
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{BackendError, BackendResult};
pub use memory::MemoryBackend;
pub use traits::{
    DocCursor, DocumentBackend, DocumentPage, DocumentWrite, FieldFilter, FieldMap, FieldWrite,
    FilterOp, OrderBy, PageOptions, SortDirection, StoredDocument, WriteOp, DEFAULT_PAGE_SIZE,
};

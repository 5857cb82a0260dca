//! Server-time source for persisted timestamps.
//!
//! Stored `createdAt`/`updatedAt` fields must come from the storage
//! backend's clock, never from client-supplied values. Backends resolve
//! the [`crate::traits::FieldWrite::ServerTime`] sentinel through a
//! `Clock` at commit time, so tests can pin time with [`FixedClock`].

use std::sync::Mutex;

use chrono::{DateTime, Utc};

/// Source of the authoritative commit time.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time. The default for production backends.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to an explicit instant, advanced manually.
///
/// Used by tests that assert timestamp authority without sleeping.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    /// Moves the clock to a new instant.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

//! The closed set of tenant collection kinds.
//!
//! Collection kinds are an enum rather than free-form strings so a typo
//! cannot silently create a new empty shard.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ShardingError;

/// A named category of tenant-scoped entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CollectionKind {
    Employees,
    Warnings,
    Absences,
    Meetings,
    Recognitions,
    AudioRecordings,
}

impl CollectionKind {
    /// Every known kind, in the order shard statistics report them.
    pub const ALL: [CollectionKind; 6] = [
        CollectionKind::Employees,
        CollectionKind::Warnings,
        CollectionKind::Absences,
        CollectionKind::Meetings,
        CollectionKind::Recognitions,
        CollectionKind::AudioRecordings,
    ];

    /// The wire name used as the collection path segment.
    pub fn as_str(self) -> &'static str {
        match self {
            CollectionKind::Employees => "employees",
            CollectionKind::Warnings => "warnings",
            CollectionKind::Absences => "absences",
            CollectionKind::Meetings => "meetings",
            CollectionKind::Recognitions => "recognitions",
            CollectionKind::AudioRecordings => "audioRecordings",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionKind {
    type Err = ShardingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CollectionKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ShardingError::UnknownCollectionKind { name: s.to_string() })
    }
}

impl TryFrom<String> for CollectionKind {
    type Error = ShardingError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<CollectionKind> for String {
    fn from(kind: CollectionKind) -> Self {
        kind.as_str().to_string()
    }
}

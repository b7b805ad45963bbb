//! Cached bucket metadata.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// A cached snapshot of a bucket's metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedBucket {
    pub id: Uuid,

    /// Path of the bucket within its storage provider.
    pub path: String,

    /// Storage provider that hosts the bucket.
    pub provider_id: Uuid,

    pub is_active: bool,

    /// Whether this is the owner's default bucket.
    pub is_default: bool,

    pub description: Option<String>,

    /// When this snapshot was taken.
    pub cached_at: OffsetDateTime,
}

impl CachedBucket {
    /// Whether documents can currently be routed to this bucket.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.is_active
    }
}

//! Cached per-bucket permission grants.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Capability a caller holds on a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PermissionLevel {
    /// No access. Present so revocations can be modeled as a grant.
    None,
    Read,
    Write,
    /// Read and write, but no delete.
    ReadWrite,
    /// Read, write and delete.
    Delete,
    /// Everything, including managing other grants.
    Admin,
}

impl PermissionLevel {
    /// Whether a caller holding this level satisfies the `required` level.
    ///
    /// Admin satisfies anything; Delete satisfies Read, Write and
    /// ReadWrite; ReadWrite satisfies Read and Write; every other pairing
    /// requires an exact match.
    #[must_use]
    pub fn satisfies(self, required: PermissionLevel) -> bool {
        use PermissionLevel::{Admin, Delete, Read, ReadWrite, Write};
        match (self, required) {
            (Admin, _) => true,
            (Delete, Read | Write | ReadWrite | Delete) => true,
            (ReadWrite, Read | Write | ReadWrite) => true,
            (held, wanted) => held == wanted,
        }
    }
}

/// A cached snapshot of one `(api key, bucket)` permission grant.
///
/// The pair `(api_key_id, bucket_id)` is the grant's composite identity and
/// is unique within the cache at any instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedPermission {
    pub api_key_id: Uuid,
    pub bucket_id: Uuid,
    pub level: PermissionLevel,

    /// Account that created the grant.
    pub granted_by: Uuid,
    pub granted_at: OffsetDateTime,

    /// When this snapshot was taken.
    pub cached_at: OffsetDateTime,
}

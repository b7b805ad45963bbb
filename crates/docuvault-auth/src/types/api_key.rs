//! Cached API-key credentials.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Permission tier an API key holds over the whole service.
///
/// The tier bounds what any per-bucket grant can allow; fine-grained access
/// is decided by [`crate::types::PermissionLevel`] grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApiKeyTier {
    /// May only read documents and metadata.
    ReadOnly,
    /// May read and write documents.
    ReadWrite,
    /// May additionally manage buckets and permissions.
    FullAccess,
}

impl ApiKeyTier {
    /// Whether this tier permits any write operation at all.
    #[must_use]
    pub fn allows_write(self) -> bool {
        matches!(self, Self::ReadWrite | Self::FullAccess)
    }
}

/// A cached snapshot of an API key's credentials.
///
/// The key is reachable by two lookup keys — its id and its public key
/// string — which the cache service always writes and removes together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedApiKey {
    /// Stable identity of the key.
    pub id: Uuid,

    /// Public key string presented by callers.
    pub key: String,

    /// Hash of the secret half of the credential pair.
    /// The plaintext secret is never cached.
    pub secret_hash: String,

    /// Id of the account that owns this key.
    pub owner_id: Uuid,

    /// Service-wide permission tier.
    pub tier: ApiKeyTier,

    /// Whether the key is currently enabled.
    pub is_active: bool,

    /// Optional expiry. `None` means the key never expires.
    pub expires_at: Option<OffsetDateTime>,

    /// When the key was last used to authenticate, if ever.
    pub last_used_at: Option<OffsetDateTime>,

    /// Storage providers this key may touch. Empty means unrestricted.
    pub allowed_provider_ids: Vec<Uuid>,

    /// When this snapshot was taken.
    pub cached_at: OffsetDateTime,
}

impl CachedApiKey {
    /// Whether the key may currently be used to authenticate: it must be
    /// active and either carry no expiry or expire in the future.
    #[must_use]
    pub fn is_valid_for_use(&self) -> bool {
        self.is_active
            && self
                .expires_at
                .is_none_or(|expiry| expiry > docuvault_core::time::now_utc())
    }

    /// Whether the key may touch the given storage provider.
    ///
    /// An empty allow-list means the key is unrestricted.
    #[must_use]
    pub fn can_access_provider(&self, provider_id: Uuid) -> bool {
        self.allowed_provider_ids.is_empty() || self.allowed_provider_ids.contains(&provider_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn sample_key() -> CachedApiKey {
        CachedApiKey {
            id: Uuid::new_v4(),
            key: "dv_test_key".to_string(),
            secret_hash: "hash".to_string(),
            owner_id: Uuid::new_v4(),
            tier: ApiKeyTier::ReadWrite,
            is_active: true,
            expires_at: None,
            last_used_at: None,
            allowed_provider_ids: Vec::new(),
            cached_at: docuvault_core::time::now_utc(),
        }
    }

    #[test]
    fn test_valid_for_use_active_without_expiry() {
        let key = sample_key();
        assert!(key.is_valid_for_use());
    }

    #[test]
    fn test_valid_for_use_inactive() {
        let key = CachedApiKey {
            is_active: false,
            ..sample_key()
        };
        assert!(!key.is_valid_for_use());
    }

    #[test]
    fn test_valid_for_use_expired() {
        let key = CachedApiKey {
            expires_at: Some(docuvault_core::time::now_utc() - Duration::minutes(1)),
            ..sample_key()
        };
        assert!(!key.is_valid_for_use());
    }

    #[test]
    fn test_valid_for_use_future_expiry() {
        let key = CachedApiKey {
            expires_at: Some(docuvault_core::time::now_utc() + Duration::hours(1)),
            ..sample_key()
        };
        assert!(key.is_valid_for_use());
    }

    #[test]
    fn test_provider_access_unrestricted_when_empty() {
        let key = sample_key();
        assert!(key.can_access_provider(Uuid::new_v4()));
    }

    #[test]
    fn test_provider_access_restricted_by_allow_list() {
        let allowed = Uuid::new_v4();
        let other = Uuid::new_v4();
        let key = CachedApiKey {
            allowed_provider_ids: vec![allowed],
            ..sample_key()
        };
        assert!(key.can_access_provider(allowed));
        assert!(!key.can_access_provider(other));
    }

    #[test]
    fn test_tier_allows_write() {
        assert!(!ApiKeyTier::ReadOnly.allows_write());
        assert!(ApiKeyTier::ReadWrite.allows_write());
        assert!(ApiKeyTier::FullAccess.allows_write());
    }
}

use chrono::{DateTime, Utc};
use wicket_blob::BlobId;

/// A download capability for one blob, issued to one user, valid strictly
/// before `expires_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedDownloadToken {
    pub user: String,
    pub blob_id: BlobId,
    pub expires_at: DateTime<Utc>,
    pub signature: Vec<u8>,
}

impl ScopedDownloadToken {
    /// The `(user, blob)` pair this token grants access for.
    pub fn key(&self) -> TokenKey {
        TokenKey {
            user: self.user.clone(),
            blob_id: self.blob_id.clone(),
        }
    }

    /// Drop the blob binding, leaving what travels on the wire.
    pub fn to_wire(&self) -> WireToken {
        WireToken {
            user: self.user.clone(),
            expires_at: self.expires_at,
            signature: self.signature.clone(),
        }
    }
}

/// A token as parsed from its wire form, before it is bound to the blob id
/// of the request it arrived with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireToken {
    pub user: String,
    pub expires_at: DateTime<Utc>,
    pub signature: Vec<u8>,
}

impl WireToken {
    /// Bind to the requested blob. Verification then fails unless the
    /// signature was computed for this exact blob.
    pub fn bind(self, blob_id: BlobId) -> ScopedDownloadToken {
        ScopedDownloadToken {
            user: self.user,
            blob_id,
            expires_at: self.expires_at,
            signature: self.signature,
        }
    }
}

/// Identity of an issued token: who it was issued to and for which blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenKey {
    pub user: String,
    pub blob_id: BlobId,
}

impl TokenKey {
    pub fn new(user: impl Into<String>, blob_id: BlobId) -> Self {
        Self {
            user: user.into(),
            blob_id,
        }
    }
}

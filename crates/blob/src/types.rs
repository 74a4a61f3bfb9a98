use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::error::BlobError;

/// Length of a canonical blob id in hexadecimal characters.
pub const BLOB_ID_LEN: usize = 40;

/// Canonical content-derived blob identifier.
///
/// Always exactly [`BLOB_ID_LEN`] lowercase hexadecimal characters (the
/// `SHA-1` digest of the blob content). Uppercase input is accepted and
/// normalized on parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlobId(String);

impl BlobId {
    /// Parse and validate a raw identifier.
    pub fn parse(raw: &str) -> Result<Self, BlobError> {
        if raw.len() != BLOB_ID_LEN || !raw.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(BlobError::MalformedId(raw.to_owned()));
        }
        Ok(Self(raw.to_ascii_lowercase()))
    }

    /// Derive the id for a piece of content.
    pub fn for_content(data: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(data);
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for BlobId {
    type Err = BlobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for BlobId {
    type Error = BlobError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<BlobId> for String {
    fn from(id: BlobId) -> Self {
        id.0
    }
}

impl AsRef<str> for BlobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A stored attachment: its id, raw content, and the filename it was
/// extracted with (if the message declared one).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    /// Content-derived identifier.
    pub id: BlobId,
    /// The raw binary content.
    pub data: Bytes,
    /// Filename suggested by the original MIME part.
    pub suggested_name: Option<String>,
}

impl Blob {
    /// Build a blob from content, deriving its id.
    pub fn new(data: Bytes, suggested_name: Option<String>) -> Self {
        Self {
            id: BlobId::for_content(&data),
            data,
            suggested_name,
        }
    }

    /// Size of the content in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

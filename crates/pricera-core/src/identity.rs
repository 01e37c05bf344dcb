//! Stable identities for crawl targets.
//!
//! Every URL that enters the pipeline is paired with a SHA-256 digest of its
//! string form. The digest is the chain's object key, the file name in
//! object storage, and the correlation key used when crawl outcomes are
//! reconciled back onto records keyed by the original URL.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A digest function used to derive object keys.
///
/// The default is [`Sha256Hasher`]. Alternative hashers exist mainly for
/// tests that need predictable keys.
pub trait Hasher {
    fn hash(&self, value: &str) -> String;
}

/// Lowercase hex SHA-256 of the UTF-8 bytes of the value.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl Hasher for Sha256Hasher {
    fn hash(&self, value: &str) -> String {
        hash_value(value)
    }
}

/// Hash a value with SHA-256 and return the lowercase hex digest.
pub fn hash_value(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hex::encode(hasher.finalize())
}

/// A source URL tagged with its stable hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HashedUrl {
    pub url: String,
    pub hash: String,
}

impl HashedUrl {
    pub fn from_value(url: impl Into<String>) -> Self {
        Self::with_hasher(url, &Sha256Hasher)
    }

    pub fn from_values<I, S>(urls: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        urls.into_iter().map(Self::from_value).collect()
    }

    pub fn with_hasher(url: impl Into<String>, hasher: &dyn Hasher) -> Self {
        let url = url.into();
        let hash = hasher.hash(&url);
        Self { url, hash }
    }

    /// Storage key for this identity's chain under `prefix`.
    ///
    /// `{prefix}/{hash}.jsonl.gz`, with any trailing `/` on the prefix
    /// collapsed so `"rozetka_product/"` and `"rozetka_product"` agree.
    pub fn storage_key(&self, prefix: &str) -> String {
        storage_key(prefix, &self.hash)
    }
}

/// Build the object storage key for a chain.
pub fn storage_key(prefix: &str, object_key: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        format!("{}.jsonl.gz", object_key)
    } else {
        format!("{}/{}.jsonl.gz", prefix, object_key)
    }
}

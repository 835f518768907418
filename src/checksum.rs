//! SHA256 fingerprints for loaded schema sets

use sha2::{Digest, Sha256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hex-encoded SHA256 digest
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum(String);

impl Checksum {
    /// Compute checksum from raw bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(format!("{:x}", Sha256::digest(data)))
    }

    /// Compute one checksum over several byte slices, in order.
    ///
    /// Each part is prefixed with its length, so moving bytes across a
    /// part boundary changes the digest.
    pub fn from_parts<'a, I>(parts: I) -> Self
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part);
        }
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Get the hex string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for log lines
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_consistency() {
        let content = br#"{"$id": "event.json"}"#;
        assert_eq!(Checksum::from_bytes(content), Checksum::from_bytes(content));
    }

    #[test]
    fn test_part_boundaries_matter() {
        let left = Checksum::from_parts([&b"ab"[..], &b"c"[..]]);
        let right = Checksum::from_parts([&b"a"[..], &b"bc"[..]]);
        assert_ne!(left, right);

        let joined = Checksum::from_parts([&b"abc"[..]]);
        assert_ne!(left, joined);
        assert_ne!(Checksum::from_parts([&b""[..], &b"abc"[..]]), joined);
    }

    #[test]
    fn test_from_bytes_is_plain_sha256() {
        assert_eq!(
            Checksum::from_bytes(b"").as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_part_order_matters() {
        let ab = Checksum::from_parts([&b"a"[..], &b"b"[..]]);
        let ba = Checksum::from_parts([&b"b"[..], &b"a"[..]]);
        assert_ne!(ab, ba);
        assert_eq!(ab.short().len(), 12);
    }
}

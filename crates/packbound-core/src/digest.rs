//! Content digest helpers shared by the cache and configuration loading.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 digest of a byte slice.
#[must_use]
pub fn hex_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Hex-encoded SHA-256 digest over a sequence of parts.
///
/// Each part's length is folded in ahead of its bytes so that different
/// partitions of the same byte stream produce different digests.
#[must_use]
pub fn hex_digest_parts<'a, I>(parts: I) -> String
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(u64::try_from(part.len()).unwrap_or(u64::MAX).to_le_bytes());
        hasher.update(part);
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_stable() {
        assert_eq!(hex_digest(b"abc"), hex_digest(b"abc"));
        assert_ne!(hex_digest(b"abc"), hex_digest(b"abd"));
    }

    #[test]
    fn digest_is_hex_of_expected_length() {
        let d = hex_digest(b"abc");
        assert_eq!(d.len(), 64);
        assert!(d.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn parts_partitioning_matters() {
        let joined = hex_digest_parts([b"ab".as_slice(), b"c".as_slice()]);
        let split = hex_digest_parts([b"a".as_slice(), b"bc".as_slice()]);
        assert_ne!(joined, split);
    }
}

//! Content identity.
//!
//! A document's identity is the SHA-256 digest of its exact byte
//! sequence. Byte-identical content fetched at any time, from any
//! source, yields the same id — this is the sole deduplication key and
//! the storage address for raw blobs.

use sha2::{Digest, Sha256};

/// Identity scheme name recorded on every document and manifest.
pub const HASH_ALG: &str = "sha256";

/// Compute the content-addressed document id (lowercase hex SHA-256).
pub fn compute_doc_id(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_digest() {
        // sha256("hello")
        assert_eq!(
            compute_doc_id(b"hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn identical_bytes_identical_id() {
        let a = compute_doc_id(b"same content");
        let b = compute_doc_id(&b"same content".to_vec());
        assert_eq!(a, b);
    }

    #[test]
    fn empty_input_is_valid() {
        assert_eq!(compute_doc_id(b"").len(), 64);
    }
}

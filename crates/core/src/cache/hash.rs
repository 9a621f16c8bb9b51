//! Request identity key generation.

use sha2::{Digest, Sha256};

/// Compute the storage key for a request identity.
pub fn compute_entry_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_stability() {
        let hash1 = compute_entry_key("GET", "https://example.com/");
        let hash2 = compute_entry_key("GET", "https://example.com/");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_method_case_insensitive() {
        assert_eq!(compute_entry_key("get", "https://example.com/"), compute_entry_key("GET", "https://example.com/"));
    }

    #[test]
    fn test_hash_query_string_matters() {
        let plain = compute_entry_key("GET", "https://example.com/app.js");
        let versioned = compute_entry_key("GET", "https://example.com/app.js?v=2");
        assert_ne!(plain, versioned);
    }

    #[test]
    fn test_hash_format() {
        let hash = compute_entry_key("GET", "https://example.com/");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

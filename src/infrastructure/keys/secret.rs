//! Key secret handling
//!
//! Secrets are opaque strings; only their SHA-256 digest is persisted or
//! cached. Generation is mechanical here -- prefix policy and entropy
//! requirements belong to the issuing side.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Random bytes per generated secret when the caller does not specify.
pub const DEFAULT_SECRET_BYTES: usize = 16;

/// Digest a secret for storage and cache keys.
pub fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Generate a fresh secret: optional prefix, then base64url random bytes.
pub fn generate_secret(prefix: Option<&str>, byte_length: usize) -> String {
    let mut bytes = vec![0u8; byte_length.max(DEFAULT_SECRET_BYTES)];
    rand::thread_rng().fill_bytes(&mut bytes);
    let encoded = URL_SAFE_NO_PAD.encode(&bytes);

    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{}_{}", prefix, encoded),
        _ => encoded,
    }
}

/// New key record identifier.
pub fn new_key_id() -> String {
    format!("key_{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(hash_secret("test_secret"), hash_secret("test_secret"));
        assert_ne!(hash_secret("test_secret"), hash_secret("other_secret"));
    }

    #[test]
    fn test_hash_never_echoes_the_secret() {
        let hash = hash_secret("test_aaaaaaaaaaaaaaaa");
        assert!(!hash.contains("test_aaaaaaaaaaaaaaaa"));
        // SHA-256 in unpadded base64url is 43 characters.
        assert_eq!(hash.len(), 43);
    }

    #[test]
    fn test_generate_secret_with_prefix() {
        let secret = generate_secret(Some("kg"), 16);
        assert!(secret.starts_with("kg_"));
        assert!(secret.len() > "kg_".len() + 20);
    }

    #[test]
    fn test_generate_secret_without_prefix() {
        let secret = generate_secret(None, 16);
        assert!(!secret.contains('_'));
    }

    #[test]
    fn test_generated_secrets_are_unique() {
        assert_ne!(generate_secret(None, 16), generate_secret(None, 16));
    }

    #[test]
    fn test_key_id_shape() {
        let id = new_key_id();
        assert!(id.starts_with("key_"));
        assert_ne!(id, new_key_id());
    }
}

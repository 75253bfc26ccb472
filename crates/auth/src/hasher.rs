//! Password hashing boundary.

use sha2::{Digest, Sha256};

/// Hashes and verifies credential secrets.
///
/// Stored credentials are opaque to the rest of the system; only this trait
/// ever sees the raw secret.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, raw: &str) -> String;

    fn verify(&self, raw: &str, hashed: &str) -> bool;
}

/// Hex-encoded SHA-256 digest.
// TODO: replace with a memory-hard hash (argon2) before opening registration
// beyond the admin CLI.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256PasswordHasher;

impl PasswordHasher for Sha256PasswordHasher {
    fn hash(&self, raw: &str) -> String {
        hex::encode(Sha256::digest(raw.as_bytes()))
    }

    fn verify(&self, raw: &str, hashed: &str) -> bool {
        self.hash(raw) == hashed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_accepts_matching_secret() {
        let hasher = Sha256PasswordHasher;
        let hashed = hasher.hash("s3cret");
        assert!(hasher.verify("s3cret", &hashed));
        assert!(!hasher.verify("other", &hashed));
    }

    #[test]
    fn hash_is_stable_and_hex_encoded() {
        let hasher = Sha256PasswordHasher;
        let hashed = hasher.hash("s3cret");
        assert_eq!(hashed, hasher.hash("s3cret"));
        assert_eq!(hashed.len(), 64);
        assert!(hashed.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

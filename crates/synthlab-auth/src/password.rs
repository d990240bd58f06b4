//! Password hashing.

use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

const SCHEME: &str = "sha256";
const SALT_LEN: usize = 16;

/// Hashes and checks account passwords.
pub trait PasswordHasher: Send + Sync {
    /// Produces a self-describing hash of `password`.
    fn hash(&self, password: &str) -> String;

    /// Returns `true` if `password` matches `stored`.
    fn verify(&self, password: &str, stored: &str) -> bool;
}

/// Salted SHA-256, stored as `sha256$<salt hex>$<digest hex>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SaltedSha256Hasher;

fn digest(salt: &[u8], password: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}

impl PasswordHasher for SaltedSha256Hasher {
    fn hash(&self, password: &str) -> String {
        let mut salt = [0u8; SALT_LEN];
        rand::rng().fill_bytes(&mut salt);
        format!(
            "{SCHEME}${}${}",
            hex::encode(salt),
            hex::encode(digest(&salt, password))
        )
    }

    fn verify(&self, password: &str, stored: &str) -> bool {
        let mut parts = stored.split('$');
        let (Some(SCHEME), Some(salt_hex), Some(expected_hex), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return false;
        };
        let (Ok(salt), Ok(expected)) = (hex::decode(salt_hex), hex::decode(expected_hex)) else {
            return false;
        };
        digest(&salt, password).ct_eq(&expected).into()
    }
}

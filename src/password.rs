//! Password hashing.
//!
//! Stored format: `pbkdf2_sha256$<iterations>$<salt b64>$<hash b64>`.
//! The iteration count travels with the hash so it can be raised later
//! without invalidating existing credentials.

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

pub const PBKDF2_ITERATIONS: u32 = 600_000;
const ALGORITHM: &str = "pbkdf2_sha256";
const SALT_LENGTH: usize = 16;
const HASH_LENGTH: usize = 32;

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    hash_password_with(password, PBKDF2_ITERATIONS)
}

pub fn hash_password_with(password: &str, iterations: u32) -> String {
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    let hash = derive(password, &salt, iterations);
    format!(
        "{ALGORITHM}${iterations}${}${}",
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(hash)
    )
}

/// Check a password against a stored hash. Malformed hashes never match.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(ALGORITHM), Some(iterations), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };

    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (STANDARD_NO_PAD.decode(salt), STANDARD_NO_PAD.decode(expected))
    else {
        return false;
    };

    let actual = derive(password, &salt, iterations);
    actual.as_slice().ct_eq(expected.as_slice()).into()
}

fn derive(password: &str, salt: &[u8], iterations: u32) -> [u8; HASH_LENGTH] {
    let mut out = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST: u32 = 1_000;

    #[test]
    fn correct_password_verifies() {
        let stored = hash_password_with("s3cret!", FAST);
        assert!(verify_password("s3cret!", &stored));
    }

    #[test]
    fn wrong_password_fails() {
        let stored = hash_password_with("s3cret!", FAST);
        assert!(!verify_password("s3cret?", &stored));
    }

    #[test]
    fn salts_differ_between_hashes() {
        assert_ne!(hash_password_with("same", FAST), hash_password_with("same", FAST));
    }

    #[test]
    fn stored_format_records_iterations() {
        let stored = hash_password_with("pw", FAST);
        assert!(stored.starts_with("pbkdf2_sha256$1000$"));
    }

    #[test]
    fn malformed_hash_never_matches() {
        assert!(!verify_password("pw", ""));
        assert!(!verify_password("pw", "md5$1$abc$def"));
        assert!(!verify_password("pw", "pbkdf2_sha256$notanumber$abc$def"));
        assert!(!verify_password("pw", "pbkdf2_sha256$1000$!!$def"));
    }
}

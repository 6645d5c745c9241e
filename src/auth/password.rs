use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

/// Hash a plaintext password with a fresh random salt.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "password hashing failed");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Compare a plaintext candidate against a stored hash. A mismatch is
/// `Ok(false)`; only a malformed stored hash is an error.
pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "stored password hash is malformed");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_roundtrip() {
        let hash = hash_password("N@ira4Life!").expect("hashing should succeed");
        assert!(verify_password("N@ira4Life!", &hash).expect("verify should succeed"));
    }

    #[test]
    fn wrong_password_is_a_clean_false() {
        let hash = hash_password("N@ira4Life!").expect("hashing should succeed");
        assert!(!verify_password("n@ira4life!", &hash).expect("verify should not error"));
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("anything", "definitely-not-a-phc-string").is_err());
    }

    #[test]
    fn same_password_hashes_differently_each_time() {
        let a = hash_password("N@ira4Life!").unwrap();
        let b = hash_password("N@ira4Life!").unwrap();
        assert_ne!(a, b);
    }
}

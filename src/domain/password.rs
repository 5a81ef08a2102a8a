//! Password value object wrapping an Argon2 PHC hash.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use super::token::generate_reset_token;
use crate::config::MIN_PASSWORD_LENGTH;
use crate::errors::{AppError, AppResult};

/// Hash of a user's password. The plain text never leaves the constructor.
#[derive(Clone, PartialEq, Eq)]
pub struct Password {
    hash: String,
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Password")
            .field("hash", &"[REDACTED]")
            .finish()
    }
}

impl Password {
    /// Hash a new password.
    ///
    /// # Errors
    /// `Validation` when shorter than the minimum length.
    pub fn new(plain_text: &str) -> AppResult<Self> {
        if plain_text.chars().count() < MIN_PASSWORD_LENGTH as usize {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(plain_text.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("Password hash failed: {}", e)))?
            .to_string();
        Ok(Self { hash })
    }

    /// A random password nobody knows, for accounts that must go through the
    /// set-password flow before their first login.
    pub fn unusable() -> AppResult<Self> {
        Self::new(&generate_reset_token())
    }

    pub fn from_hash(hash: String) -> Self {
        Self { hash }
    }

    pub fn as_str(&self) -> &str {
        &self.hash
    }

    pub fn into_string(self) -> String {
        self.hash
    }

    /// Malformed stored hashes never verify.
    pub fn verify(&self, plain_text: &str) -> bool {
        match PasswordHash::new(&self.hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(plain_text.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::warn!("Stored password hash is malformed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let password = Password::new("SecurePassword123!").unwrap();
        assert!(password.verify("SecurePassword123!"));
        assert!(!password.verify("WrongPassword123"));
    }

    #[test]
    fn restored_hash_still_verifies() {
        let hash = Password::new("TestPassword123").unwrap().into_string();
        assert!(Password::from_hash(hash).verify("TestPassword123"));
    }

    #[test]
    fn salts_differ() {
        let a = Password::new("SamePassword123").unwrap();
        let b = Password::new("SamePassword123").unwrap();
        assert_ne!(a.as_str(), b.as_str());
    }

    #[test]
    fn too_short_is_rejected() {
        assert!(matches!(Password::new("short"), Err(AppError::Validation(_))));
        assert!(Password::new("12345678").is_ok());
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!Password::from_hash("not-a-hash".into()).verify("anything"));
    }
}

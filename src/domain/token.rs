//! Persisted refresh and password-reset tokens.

use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use uuid::Uuid;

use crate::config::RESET_TOKEN_LENGTH;

#[derive(Debug, Clone, PartialEq)]
pub struct RefreshToken {
    pub id: Uuid,
    pub token: String,
    pub user_id: Uuid,
    pub revoked: bool,
    pub expires_at: DateTime<Utc>,
}

impl RefreshToken {
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && self.expires_at > now
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PasswordResetToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}

impl PasswordResetToken {
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        !self.used && self.expires_at > now
    }
}

/// Random URL-safe token for password resets.
pub fn generate_reset_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RESET_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn reset_tokens_are_long_and_distinct() {
        let a = generate_reset_token();
        let b = generate_reset_token();
        assert_eq!(a.len(), RESET_TOKEN_LENGTH);
        assert_ne!(a, b);
    }

    #[test]
    fn usability_depends_on_flags_and_expiry() {
        let now = Utc::now();
        let mut token = PasswordResetToken {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            token: "t".into(),
            expires_at: now + Duration::minutes(5),
            used: false,
        };
        assert!(token.is_usable(now));
        assert!(!token.is_usable(now + Duration::minutes(6)));
        token.used = true;
        assert!(!token.is_usable(now));
    }
}

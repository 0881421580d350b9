use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use tracing::{debug, error};

use crate::users::repo_types::{CredentialKind, User};

const TOKEN_LEN: usize = 22;

pub fn digest(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Random url-safe token for "remember me" sessions.
pub fn new_token() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

impl User {
    /// True if `token` matches the digest stored for `kind`. A missing or
    /// unparsable digest yields false, never an error.
    pub fn authenticated(&self, kind: CredentialKind, token: &str) -> bool {
        let Some(stored) = self.digest(kind) else {
            debug!(user_id = %self.id, ?kind, "no digest set");
            return false;
        };
        verify(token, stored).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn user_with(password_digest: String, remember_digest: Option<String>) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Example User".into(),
            email: "example@user.com".into(),
            password_digest,
            remember_digest,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn digest_and_verify_roundtrip() {
        let hash = digest("Secur3P@ssw0rd!").expect("hashing should succeed");
        assert!(verify("Secur3P@ssw0rd!", &hash).expect("verify should succeed"));
        assert!(!verify("wrong-password", &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify("anything", "not-a-valid-hash").unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn authenticated_is_false_without_remember_digest() {
        let user = user_with(digest("foobar").unwrap(), None);
        assert!(!user.authenticated(CredentialKind::Remember, ""));
    }

    #[test]
    fn authenticated_checks_the_requested_kind() {
        let token = new_token();
        let user = user_with(digest("foobar").unwrap(), Some(digest(&token).unwrap()));
        assert!(user.authenticated(CredentialKind::Remember, &token));
        assert!(user.authenticated(CredentialKind::Password, "foobar"));
        assert!(!user.authenticated(CredentialKind::Remember, "foobar"));
    }

    #[test]
    fn authenticated_is_false_for_malformed_digest() {
        let user = user_with("garbage".into(), None);
        assert!(!user.authenticated(CredentialKind::Password, "foobar"));
    }

    #[test]
    fn tokens_are_random_alphanumerics() {
        let a = new_token();
        let b = new_token();
        assert_eq!(a.len(), TOKEN_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}

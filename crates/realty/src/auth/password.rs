use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use tracing::warn;

use super::{AdminUser, AuthError};
use crate::config::AuthConfig;

/// Argon2id PHC string for the given password.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AuthError::Hash(err.to_string()))
}

/// False for a wrong password and for a malformed stored hash.
pub fn verify_password(password: &str, phc: &str) -> bool {
    match PasswordHash::new(phc) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(err) => {
            warn!(error = %err, "stored admin password hash is malformed");
            false
        }
    }
}

/// The single configured administrator account.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    username: String,
    password_hash: Option<String>,
}

impl AdminCredentials {
    pub fn new(username: impl Into<String>, password_hash: Option<String>) -> Self {
        Self {
            username: username.into(),
            password_hash,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        if config.admin_password_hash.is_none() {
            warn!("ADMIN_PASSWORD_HASH not set; admin login is disabled");
        }
        Self::new(
            config.admin_username.clone(),
            config.admin_password_hash.clone(),
        )
    }

    pub fn login_enabled(&self) -> bool {
        self.password_hash.is_some()
    }

    pub fn authenticate(&self, username: &str, password: &str) -> Result<AdminUser, AuthError> {
        let Some(hash) = self.password_hash.as_deref() else {
            return Err(AuthError::InvalidCredentials);
        };
        if username != self.username || !verify_password(password, hash) {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(AdminUser {
            username: self.username.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_verify_and_differ_per_salt() {
        let first = hash_password("s3cret-pass").expect("hash");
        let second = hash_password("s3cret-pass").expect("hash");

        assert!(first.starts_with("$argon2"));
        assert_ne!(first, second);
        assert!(verify_password("s3cret-pass", &first));
        assert!(!verify_password("wrong", &first));
        assert!(!verify_password("s3cret-pass", "not-a-phc-string"));
    }

    #[test]
    fn authenticates_only_the_configured_admin() {
        let credentials = AdminCredentials::new("agent", Some(hash_password("pw").expect("hash")));

        let user = credentials.authenticate("agent", "pw").expect("valid login");
        assert_eq!(user.username, "agent");
        assert!(matches!(
            credentials.authenticate("someone", "pw"),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            credentials.authenticate("agent", "nope"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn login_is_disabled_without_a_hash() {
        let credentials = AdminCredentials::new("admin", None);
        assert!(!credentials.login_enabled());
        assert!(credentials.authenticate("admin", "").is_err());
    }
}

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{AdminUser, AuthError};
use crate::config::AuthConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub token_type: TokenKind,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Issues and checks HS256 tokens for the API layer.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], access_ttl_secs: i64, refresh_ttl_secs: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    /// Uses `JWT_SECRET` when set, otherwise a secret that lives as long as the process.
    pub fn from_config(config: &AuthConfig) -> Self {
        let secret = match config.jwt_secret.as_deref() {
            Some(secret) => secret.to_string(),
            None => {
                warn!("JWT_SECRET not set; API tokens will not survive a restart");
                format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
            }
        };
        Self::new(
            secret.as_bytes(),
            config.access_ttl_secs,
            config.refresh_ttl_secs,
        )
    }

    pub fn issue_pair(&self, user: &AdminUser) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access: self.issue(user, TokenKind::Access)?,
            refresh: self.issue(user, TokenKind::Refresh)?,
        })
    }

    /// New access token from a valid refresh token.
    pub fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let claims = self.decode_kind(refresh_token, TokenKind::Refresh)?;
        self.issue(
            &AdminUser {
                username: claims.sub,
            },
            TokenKind::Access,
        )
    }

    pub fn verify_access(&self, token: &str) -> Result<AdminUser, AuthError> {
        let claims = self.decode_kind(token, TokenKind::Access)?;
        Ok(AdminUser {
            username: claims.sub,
        })
    }

    fn issue(&self, user: &AdminUser, kind: TokenKind) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl_secs,
            TokenKind::Refresh => self.refresh_ttl_secs,
        };
        let claims = TokenClaims {
            sub: user.username.clone(),
            token_type: kind,
            exp: now + ttl,
            iat: now,
            jti: Uuid::new_v4().simple().to_string(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| AuthError::Issue(err.to_string()))
    }

    fn decode_kind(&self, token: &str, kind: TokenKind) -> Result<TokenClaims, AuthError> {
        let data = decode::<TokenClaims>(token, &self.decoding, &self.validation).map_err(|err| {
            debug!(error = %err, "rejected bearer token");
            AuthError::InvalidToken
        })?;
        if data.claims.token_type != kind {
            return Err(AuthError::InvalidToken);
        }
        Ok(data.claims)
    }
}

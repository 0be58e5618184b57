use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::response::Redirect;

use super::tokens::TokenIssuer;
use super::{AdminUser, AuthError};
use crate::sessions::CurrentSession;

pub const LOGIN_PATH: &str = "/app/agent-login/";

/// Admin identified by an `Authorization: Bearer <access token>` header.
#[derive(Debug, Clone)]
pub struct AdminToken(pub AdminUser);

#[async_trait]
impl<S> FromRequestParts<S> for AdminToken
where
    S: Send + Sync,
    Arc<TokenIssuer>: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AuthError::MissingCredentials)?;
        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::InvalidToken)?;

        let issuer = Arc::<TokenIssuer>::from_ref(state);
        issuer.verify_access(token).map(AdminToken)
    }
}

/// Admin logged in through the website session.
///
/// Anonymous requests are redirected to the login page with `next` set.
#[derive(Debug, Clone)]
pub struct SiteAdmin {
    pub user: AdminUser,
    pub session_id: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for SiteAdmin
where
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<CurrentSession>()
            .cloned()
            .unwrap_or_default();
        match (session.user, session.id) {
            (Some(user), Some(session_id)) => Ok(SiteAdmin { user, session_id }),
            _ => Err(Redirect::to(&format!(
                "{LOGIN_PATH}?next={}",
                parts.uri.path()
            ))),
        }
    }
}

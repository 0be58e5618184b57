//! Admin authentication: password login for the website, bearer tokens for the API.

pub mod extract;
pub mod password;
pub mod tokens;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub use extract::{AdminToken, SiteAdmin, LOGIN_PATH};
pub use password::{hash_password, verify_password, AdminCredentials};
pub use tokens::{TokenClaims, TokenIssuer, TokenKind, TokenPair};

/// The authenticated site administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
    pub username: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("No active account found with the given credentials")]
    InvalidCredentials,
    #[error("Authentication credentials were not provided.")]
    MissingCredentials,
    #[error("Given token not valid for any token type")]
    InvalidToken,
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("token could not be issued: {0}")]
    Issue(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::InvalidCredentials
            | AuthError::MissingCredentials
            | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::Hash(_) | AuthError::Issue(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

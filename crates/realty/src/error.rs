use crate::auth::AuthError;
use crate::config::ConfigError;
use crate::inquiries::InquiryServiceError;
use crate::listings::ListingError;
use crate::media::MediaError;
use crate::store::RepositoryError;
use crate::telemetry::TelemetryError;
use crate::validation::ValidationErrors;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Validation(ValidationErrors),
    BadRequest(String),
    NotFound,
    Auth(AuthError),
    Repository(RepositoryError),
    Media(MediaError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Validation(err) => write!(f, "{}", err),
            AppError::BadRequest(message) => write!(f, "{}", message),
            AppError::NotFound => write!(f, "Not found."),
            AppError::Auth(err) => write!(f, "{}", err),
            AppError::Repository(err) => write!(f, "storage error: {}", err),
            AppError::Media(err) => write!(f, "media error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Validation(err) => Some(err),
            AppError::Auth(err) => Some(err),
            AppError::Repository(err) => Some(err),
            AppError::Media(err) => Some(err),
            AppError::BadRequest(_) | AppError::NotFound => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
            AppError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            AppError::NotFound => {
                (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found." }))).into_response()
            }
            AppError::Auth(err) => err.into_response(),
            AppError::Media(MediaError::UnsupportedType { name }) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": format!("'{name}' is not a supported image file") })),
            )
                .into_response(),
            other => {
                tracing::error!(error = %other, "request failed");
                let body = Json(json!({ "error": other.to_string() }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

impl From<AuthError> for AppError {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}

impl From<MediaError> for AppError {
    fn from(value: MediaError) -> Self {
        Self::Media(value)
    }
}

impl From<RepositoryError> for AppError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound => Self::NotFound,
            other => Self::Repository(other),
        }
    }
}

impl From<ListingError> for AppError {
    fn from(value: ListingError) -> Self {
        match value {
            ListingError::Validation(errors) => errors.into(),
            ListingError::Repository(err) => err.into(),
            ListingError::Media(err) => err.into(),
        }
    }
}

impl From<InquiryServiceError> for AppError {
    fn from(value: InquiryServiceError) -> Self {
        match value {
            InquiryServiceError::Validation(errors) => errors.into(),
            InquiryServiceError::Repository(err) => err.into(),
        }
    }
}

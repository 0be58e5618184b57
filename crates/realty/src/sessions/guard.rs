use std::convert::Infallible;
use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::SET_COOKIE;
use axum::http::request::Parts;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use super::store::{
    clear_session_cookie, session_id_from_headers, SessionStore, SessionTouch, SESSION_COOKIE,
};
use crate::auth::AdminUser;

const EXEMPT_PREFIXES: [&str; 3] = ["/api/", "/static/", "/media/"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleDecision {
    /// Idle longer than the allowed age; the session must be flushed.
    Expire,
    /// Still active; record this request time as the last activity.
    Refresh(DateTime<Utc>),
}

/// Idle-timeout decision for an authenticated session.
///
/// Expires only when strictly more than `max_age` has elapsed. A session
/// without recorded activity is refreshed.
pub fn evaluate_idle(
    now: DateTime<Utc>,
    last_activity: Option<DateTime<Utc>>,
    max_age: Duration,
) -> IdleDecision {
    match last_activity {
        Some(last) if now.signed_duration_since(last) > max_age => IdleDecision::Expire,
        _ => IdleDecision::Refresh(now),
    }
}

/// API, static and media requests bypass the guard entirely.
pub fn is_exempt(path: &str) -> bool {
    EXEMPT_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
}

/// Session resolved for the current request; anonymous when no user is attached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentSession {
    pub id: Option<String>,
    pub user: Option<AdminUser>,
}

impl CurrentSession {
    pub fn is_admin(&self) -> bool {
        self.user.is_some()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CurrentSession>()
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Clone)]
pub struct IdleGuard {
    store: Arc<SessionStore>,
    max_age: Duration,
}

impl IdleGuard {
    pub fn new(store: Arc<SessionStore>, max_age: Duration) -> Self {
        Self { store, max_age }
    }
}

/// Resolves the session cookie, logs out idle admins and stamps activity.
pub async fn idle_session_guard(
    State(guard): State<IdleGuard>,
    mut request: Request,
    next: Next,
) -> Response {
    if is_exempt(request.uri().path()) {
        return next.run(request).await;
    }

    let mut current = CurrentSession::default();
    let mut clear_cookie = false;

    if let Some(id) = session_id_from_headers(request.headers()) {
        match guard.store.touch(&id, Utc::now(), guard.max_age).await {
            SessionTouch::Active(user) => {
                current = CurrentSession {
                    id: Some(id),
                    user: Some(user),
                };
            }
            SessionTouch::Expired(user) => {
                clear_cookie = true;
                info!(username = %user.username, "idle admin session logged out");
            }
            SessionTouch::Anonymous => {
                current.id = Some(id);
            }
            SessionTouch::Unknown => {
                debug!("request carried an unknown session cookie");
                clear_cookie = true;
            }
        }
    }

    request.extensions_mut().insert(current);
    let mut response = next.run(request).await;

    if clear_cookie && !sets_session_cookie(&response) {
        if let Ok(value) = HeaderValue::from_str(&clear_session_cookie()) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }
    response
}

fn sets_session_cookie(response: &Response) -> bool {
    let prefix = format!("{SESSION_COOKIE}=");
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.starts_with(&prefix))
}

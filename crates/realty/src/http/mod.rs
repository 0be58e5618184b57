//! HTTP surface: the JSON API, the website pages, and static/media files.

pub mod api;
mod forms;
pub mod site;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::Router;
use tower_http::services::ServeDir;

use crate::config::MediaConfig;
use crate::sessions::{idle_session_guard, IdleGuard};

pub use api::api_router;
pub use site::site_router;
pub use state::AppContext;

/// Upper bound for request bodies, sized for several photos per upload.
pub const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Full application router. The idle-session guard wraps every route and
/// skips `/api/`, `/static/` and `/media/` itself.
pub fn app_router(ctx: AppContext, media: &MediaConfig) -> Router {
    let guard = IdleGuard::new(ctx.sessions.clone(), ctx.session_max_age);

    Router::new()
        .merge(api_router())
        .merge(site_router())
        .nest_service("/static", ServeDir::new(&media.static_root))
        .nest_service("/media", ServeDir::new(&media.media_root))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(from_fn_with_state(guard, idle_session_guard))
        .with_state(ctx)
}

use std::sync::Arc;

use axum::extract::FromRef;
use chrono::Duration;
use tracing::info;

use crate::auth::{AdminCredentials, TokenIssuer};
use crate::config::AppConfig;
use crate::inquiries::{InMemoryInquiryRepository, InquiryService};
use crate::listings::{InMemoryPropertyRepository, ListingService};
use crate::media::LocalImageStorage;
use crate::notify::NotificationDispatcher;
use crate::sessions::SessionStore;

/// Shared state handed to every API and website handler.
#[derive(Clone)]
pub struct AppContext {
    pub listings: Arc<ListingService>,
    pub inquiries: Arc<InquiryService>,
    pub sessions: Arc<SessionStore>,
    pub tokens: Arc<TokenIssuer>,
    pub admins: Arc<AdminCredentials>,
    pub session_max_age: Duration,
}

impl AppContext {
    /// In-memory stores, local image storage, and whichever notification
    /// channels the configuration fully describes.
    pub fn from_config(config: &AppConfig) -> Self {
        let notifier = NotificationDispatcher::from_config(&config.notifier);
        info!(
            email = notifier.has_email(),
            whatsapp = notifier.has_messaging(),
            "notification channels configured"
        );

        let listings = ListingService::new(
            Arc::new(InMemoryPropertyRepository::default()),
            Arc::new(LocalImageStorage::new(config.media.media_root.clone())),
        );
        let inquiries = InquiryService::new(
            Arc::new(InMemoryInquiryRepository::default()),
            Arc::new(notifier),
        );

        Self {
            listings: Arc::new(listings),
            inquiries: Arc::new(inquiries),
            sessions: Arc::new(SessionStore::new(config.session.max_age())),
            tokens: Arc::new(TokenIssuer::from_config(&config.auth)),
            admins: Arc::new(AdminCredentials::from_config(&config.auth)),
            session_max_age: config.session.max_age(),
        }
    }
}

impl FromRef<AppContext> for Arc<TokenIssuer> {
    fn from_ref(context: &AppContext) -> Self {
        context.tokens.clone()
    }
}

impl FromRef<AppContext> for Arc<SessionStore> {
    fn from_ref(context: &AppContext) -> Self {
        context.sessions.clone()
    }
}

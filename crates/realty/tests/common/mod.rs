#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use realty::auth::{hash_password, AdminCredentials, TokenIssuer};
use realty::config::MediaConfig;
use realty::http::{app_router, AppContext};
use realty::inquiries::{InMemoryInquiryRepository, InquiryService};
use realty::listings::{InMemoryPropertyRepository, ListingService};
use realty::media::LocalImageStorage;
use realty::notify::{
    ChannelKind, Notification, NotificationChannel, NotificationDispatcher, NotifyError,
};
use realty::sessions::SessionStore;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

pub const ADMIN: &str = "agent";
pub const PASSWORD: &str = "correct horse";
pub const BOUNDARY: &str = "realty-test-boundary";

/// Channel that fails every delivery after an optional delay.
pub struct BrokenChannel {
    pub kind: ChannelKind,
    pub delay: Duration,
    pub attempts: Arc<AtomicUsize>,
}

#[async_trait]
impl NotificationChannel for BrokenChannel {
    fn kind(&self) -> ChannelKind {
        self.kind
    }

    async fn deliver(&self, _notification: &Notification) -> Result<(), NotifyError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Err(NotifyError::Transport("connection refused".to_string()))
    }
}

pub struct TestApp {
    pub router: Router,
    pub context: AppContext,
    pub attempts: Arc<AtomicUsize>,
    _media: TempDir,
}

impl TestApp {
    /// Both notification channels configured but failing after `delay`.
    pub fn with_broken_channels(delay: Duration) -> Self {
        let attempts = Arc::new(AtomicUsize::new(0));
        let email: Arc<dyn NotificationChannel> = Arc::new(BrokenChannel {
            kind: ChannelKind::Email,
            delay,
            attempts: attempts.clone(),
        });
        let messaging: Arc<dyn NotificationChannel> = Arc::new(BrokenChannel {
            kind: ChannelKind::WhatsApp,
            delay,
            attempts: attempts.clone(),
        });
        let dispatcher = NotificationDispatcher::new(Some(email), Some(messaging), 4);
        Self::build(dispatcher, attempts)
    }

    pub fn new() -> Self {
        Self::build(NotificationDispatcher::disabled(), Arc::new(AtomicUsize::new(0)))
    }

    fn build(dispatcher: NotificationDispatcher, attempts: Arc<AtomicUsize>) -> Self {
        let media = tempfile::tempdir().expect("media dir");
        let media_config = MediaConfig {
            media_root: media.path().join("media"),
            static_root: media.path().join("static"),
        };
        let hash = hash_password(PASSWORD).expect("hash password");

        let context = AppContext {
            listings: Arc::new(ListingService::new(
                Arc::new(InMemoryPropertyRepository::default()),
                Arc::new(LocalImageStorage::new(media_config.media_root.clone())),
            )),
            inquiries: Arc::new(InquiryService::new(
                Arc::new(InMemoryInquiryRepository::default()),
                Arc::new(dispatcher),
            )),
            sessions: Arc::new(SessionStore::new(chrono::Duration::seconds(1800))),
            tokens: Arc::new(TokenIssuer::new(b"integration-secret", 300, 86_400)),
            admins: Arc::new(AdminCredentials::new(ADMIN, Some(hash))),
            session_max_age: chrono::Duration::seconds(1800),
        };

        Self {
            router: app_router(context.clone(), &media_config),
            context,
            attempts,
            _media: media,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router response")
    }

    pub async fn access_token(&self) -> String {
        let response = self
            .send(json_request(
                "POST",
                "/api/token/",
                None,
                serde_json::json!({ "username": ADMIN, "password": PASSWORD }),
            ))
            .await;
        let body = read_json(response).await;
        body["access"].as_str().expect("access token").to_string()
    }

    /// Logs in through the website and returns the session cookie value.
    pub async fn login_session(&self) -> String {
        let response = self
            .send(form_request(
                "/app/agent-login/",
                None,
                &format!("username={ADMIN}&password=correct+horse"),
            ))
            .await;
        session_from(&response).expect("session cookie issued on login")
    }
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("json request")
}

pub fn get_request(uri: &str, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(session) = session {
        builder = builder.header(header::COOKIE, format!("sessionid={session}"));
    }
    builder.body(Body::empty()).expect("get request")
}

pub fn form_request(uri: &str, session: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(session) = session {
        builder = builder.header(header::COOKIE, format!("sessionid={session}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("form request")
}

/// Multipart body with text fields followed by `images` file parts.
pub fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &str)]) -> Vec<u8> {
    multipart_body_for("images", fields, files)
}

/// Multipart body whose file parts are all named `file_field`.
pub fn multipart_body_for(
    file_field: &str,
    fields: &[(&str, &str)],
    files: &[(&str, &str)],
) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (file_name, contents) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{file_field}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(contents.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_request(uri: &str, token: Option<&str>, body: Vec<u8>) -> Request<Body> {
    multipart_request_with("POST", uri, token, body)
}

pub fn multipart_request_with(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Vec<u8>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri).header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
    );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body)).expect("multipart request")
}

pub async fn read_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json payload")
}

/// Value of the `sessionid` cookie set by the response, if any.
pub fn session_from(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|cookie| {
            cookie
                .strip_prefix("sessionid=")
                .and_then(|rest| rest.split(';').next())
                .map(str::to_string)
        })
        .filter(|value| !value.is_empty())
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

pub fn property_json(title: &str, location: &str, price: &str) -> Value {
    serde_json::json!({
        "title": title,
        "description": "Corner unit",
        "price": price,
        "location": location,
        "property_type": "Flat",
        "bedrooms": 2,
    })
}

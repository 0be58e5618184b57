use std::collections::HashMap;

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::guard::{evaluate_idle, IdleDecision};
use crate::auth::AdminUser;

pub const SESSION_COOKIE: &str = "sessionid";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Error,
}

/// One-shot message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub text: String,
}

impl FlashMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionData {
    pub user: Option<AdminUser>,
    pub last_activity: Option<DateTime<Utc>>,
    pub flash: Vec<FlashMessage>,
}

/// Outcome of resolving a session for an incoming request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionTouch {
    /// No session stored under the id.
    Unknown,
    /// Session exists without a logged-in user.
    Anonymous,
    /// Admin session; its last activity is now the request time.
    Active(AdminUser),
    /// Admin session idle beyond the max age; it has been removed.
    Expired(AdminUser),
}

/// Website sessions keyed by the `sessionid` cookie value.
///
/// Sessions idle longer than `max_age` are dropped whenever a new session is
/// created, whether or not their browser ever returns.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionData>>,
    max_age: Duration,
}

impl SessionStore {
    pub fn new(max_age: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_age,
        }
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Stores `data` under a fresh random id and returns the id.
    pub async fn create(&self, data: SessionData) -> String {
        let id = Uuid::new_v4().simple().to_string();
        let now = Utc::now();
        let max_age = self.max_age;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, existing| {
            evaluate_idle(now, existing.last_activity, max_age) != IdleDecision::Expire
        });
        let pruned = before - sessions.len();
        if pruned > 0 {
            debug!(pruned, "dropped idle sessions");
        }
        sessions.insert(id.clone(), data);
        id
    }

    pub async fn get(&self, id: &str) -> Option<SessionData> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Replaces the stored data wholesale.
    pub async fn save(&self, id: &str, data: SessionData) {
        self.sessions.write().await.insert(id.to_string(), data);
    }

    /// Idle check and activity stamp in one write. A missing id is never
    /// re-created, so a concurrent logout stays effective.
    pub async fn touch(&self, id: &str, now: DateTime<Utc>, max_age: Duration) -> SessionTouch {
        let mut sessions = self.sessions.write().await;
        let Some(data) = sessions.get_mut(id) else {
            return SessionTouch::Unknown;
        };
        let Some(user) = data.user.clone() else {
            return SessionTouch::Anonymous;
        };
        match evaluate_idle(now, data.last_activity, max_age) {
            IdleDecision::Refresh(stamp) => {
                data.last_activity = Some(stamp);
                SessionTouch::Active(user)
            }
            IdleDecision::Expire => {
                sessions.remove(id);
                SessionTouch::Expired(user)
            }
        }
    }

    /// Flushes every value held by the session.
    pub async fn remove(&self, id: &str) -> Option<SessionData> {
        self.sessions.write().await.remove(id)
    }

    /// Returns false when the session no longer exists.
    pub async fn push_flash(&self, id: &str, message: FlashMessage) -> bool {
        match self.sessions.write().await.get_mut(id) {
            Some(data) => {
                data.flash.push(message);
                true
            }
            None => false,
        }
    }

    /// Drains pending messages. An anonymous session only carries flash
    /// messages, so it is removed once they are read.
    pub async fn take_flash(&self, id: &str) -> Vec<FlashMessage> {
        let mut sessions = self.sessions.write().await;
        let Some(data) = sessions.get_mut(id) else {
            return Vec::new();
        };
        let messages = std::mem::take(&mut data.flash);
        if data.user.is_none() {
            sessions.remove(id);
        }
        messages
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// Value of the `sessionid` cookie, if the request carries one.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

pub fn session_cookie(id: &str, max_age_secs: i64) -> String {
    format!("{SESSION_COOKIE}={id}; HttpOnly; Path=/; SameSite=Lax; Max-Age={max_age_secs}")
}

pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0")
}

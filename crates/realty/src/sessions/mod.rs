//! Cookie-backed website sessions and the idle-logout guard.

pub mod guard;
pub mod store;

pub use guard::{evaluate_idle, idle_session_guard, is_exempt, CurrentSession, IdleDecision, IdleGuard};
pub use store::{
    clear_session_cookie, session_cookie, session_id_from_headers, FlashLevel, FlashMessage,
    SessionData, SessionStore, SessionTouch, SESSION_COOKIE,
};

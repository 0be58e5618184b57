//! Out-of-band inquiry notifications.
//!
//! Deliveries run on detached tasks bounded by a semaphore; a failed delivery
//! is logged by the dispatcher and otherwise forgotten. Nothing here can fail
//! the request that saved the inquiry.

pub mod dispatcher;
pub mod email;
pub mod message;
pub mod whatsapp;

pub use dispatcher::{ChannelKind, Fanout, NotificationChannel, NotificationDispatcher};
pub use email::SmtpEmailChannel;
pub use message::Notification;
pub use whatsapp::WhatsAppChannel;

/// Failure of a single delivery attempt.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("message could not be built: {0}")]
    Build(String),
    #[error("transport failed: {0}")]
    Transport(String),
    #[error("provider rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::email::SmtpEmailChannel;
use super::message::Notification;
use super::whatsapp::WhatsAppChannel;
use super::NotifyError;
use crate::config::NotifierConfig;
use crate::inquiries::{Inquiry, InquiryId};

/// Outbound delivery hook (SMTP, WhatsApp, or a test double).
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    fn kind(&self) -> ChannelKind;
    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Email,
    WhatsApp,
}

impl ChannelKind {
    pub const fn label(self) -> &'static str {
        match self {
            ChannelKind::Email => "email",
            ChannelKind::WhatsApp => "whatsapp",
        }
    }
}

/// Which channels an inquiry fans out to, and with which message template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fanout {
    /// Email and chat message with every inquiry field.
    AllChannels,
    /// Chat message only, listing the inquiry fields.
    MessagingOnly,
    /// Chat message only, naming the property the inquiry was posted from.
    PropertyMessage { title: String, location: String },
}

/// Fire-and-forget dispatcher for inquiry notifications.
///
/// Each delivery is a detached task that holds one semaphore permit while it
/// talks to its transport, so at most `max_in_flight` deliveries are active.
pub struct NotificationDispatcher {
    email: Option<Arc<dyn NotificationChannel>>,
    messaging: Option<Arc<dyn NotificationChannel>>,
    permits: Arc<Semaphore>,
}

impl NotificationDispatcher {
    pub fn new(
        email: Option<Arc<dyn NotificationChannel>>,
        messaging: Option<Arc<dyn NotificationChannel>>,
        max_in_flight: usize,
    ) -> Self {
        Self {
            email,
            messaging,
            permits: Arc::new(Semaphore::new(max_in_flight.max(1))),
        }
    }

    /// Dispatcher with no channels; every notification is dropped.
    pub fn disabled() -> Self {
        Self::new(None, None, 1)
    }

    /// Builds whichever channels the configuration fully describes.
    pub fn from_config(config: &NotifierConfig) -> Self {
        let email = match SmtpEmailChannel::from_config(config) {
            Some(Ok(channel)) => Some(Arc::new(channel) as Arc<dyn NotificationChannel>),
            Some(Err(err)) => {
                warn!(error = %err, "email notifications disabled: invalid configuration");
                None
            }
            None => {
                warn!("email notifications disabled: smtp host or addresses not configured");
                None
            }
        };

        let messaging = match WhatsAppChannel::from_config(config) {
            Some(channel) => Some(Arc::new(channel) as Arc<dyn NotificationChannel>),
            None => {
                warn!("whatsapp notifications disabled: messaging credentials not configured");
                None
            }
        };

        Self::new(email, messaging, config.max_in_flight)
    }

    pub fn has_email(&self) -> bool {
        self.email.is_some()
    }

    pub fn has_messaging(&self) -> bool {
        self.messaging.is_some()
    }

    /// Schedules the notifications for a saved inquiry and returns immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn inquiry_received(&self, inquiry: &Inquiry, fanout: Fanout) {
        match fanout {
            Fanout::AllChannels => {
                if let Some(email) = &self.email {
                    self.spawn(email.clone(), Notification::inquiry_email(inquiry), inquiry.id);
                }
                if let Some(messaging) = &self.messaging {
                    self.spawn(
                        messaging.clone(),
                        Notification::inquiry_message(inquiry),
                        inquiry.id,
                    );
                }
            }
            Fanout::MessagingOnly => {
                if let Some(messaging) = &self.messaging {
                    self.spawn(
                        messaging.clone(),
                        Notification::inquiry_message(inquiry),
                        inquiry.id,
                    );
                }
            }
            Fanout::PropertyMessage { title, location } => {
                if let Some(messaging) = &self.messaging {
                    self.spawn(
                        messaging.clone(),
                        Notification::property_inquiry_message(inquiry, &title, &location),
                        inquiry.id,
                    );
                }
            }
        }
    }

    fn spawn(
        &self,
        channel: Arc<dyn NotificationChannel>,
        notification: Notification,
        inquiry_id: InquiryId,
    ) {
        let permits = self.permits.clone();
        let kind = channel.kind();
        debug!(channel = kind.label(), %inquiry_id, "queueing inquiry notification");

        tokio::spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    warn!(channel = kind.label(), %inquiry_id, "notification pool closed");
                    return;
                }
            };

            match channel.deliver(&notification).await {
                Ok(()) => info!(channel = kind.label(), %inquiry_id, "inquiry notification sent"),
                Err(err) => warn!(
                    channel = kind.label(),
                    %inquiry_id,
                    error = %err,
                    "inquiry notification failed"
                ),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct RecordingChannel {
        kind: ChannelKind,
        sent: mpsc::UnboundedSender<(ChannelKind, Notification)>,
    }

    #[async_trait]
    impl NotificationChannel for RecordingChannel {
        fn kind(&self) -> ChannelKind {
            self.kind
        }

        async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
            let _ = self.sent.send((self.kind, notification.clone()));
            Ok(())
        }
    }

    struct SlowChannel {
        active: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
        done: mpsc::UnboundedSender<()>,
    }

    #[async_trait]
    impl NotificationChannel for SlowChannel {
        fn kind(&self) -> ChannelKind {
            ChannelKind::WhatsApp
        }

        async fn deliver(&self, _notification: &Notification) -> Result<(), NotifyError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            let _ = self.done.send(());
            Err(NotifyError::Transport("provider down".to_string()))
        }
    }

    fn inquiry(id: u64) -> Inquiry {
        Inquiry {
            id: InquiryId(id),
            name: "Asha".to_string(),
            phone: "9990001111".to_string(),
            email: None,
            location: Some("Pune".to_string()),
            message: None,
            created_at: Utc::now(),
        }
    }

    fn recording() -> (
        NotificationDispatcher,
        mpsc::UnboundedReceiver<(ChannelKind, Notification)>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let email: Arc<dyn NotificationChannel> = Arc::new(RecordingChannel {
            kind: ChannelKind::Email,
            sent: tx.clone(),
        });
        let messaging: Arc<dyn NotificationChannel> = Arc::new(RecordingChannel {
            kind: ChannelKind::WhatsApp,
            sent: tx,
        });
        (
            NotificationDispatcher::new(Some(email), Some(messaging), 4),
            rx,
        )
    }

    async fn next(
        rx: &mut mpsc::UnboundedReceiver<(ChannelKind, Notification)>,
    ) -> (ChannelKind, Notification) {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("delivery within timeout")
            .expect("channel open")
    }

    #[tokio::test]
    async fn all_channels_fan_out_to_email_and_messaging() {
        let (dispatcher, mut rx) = recording();
        dispatcher.inquiry_received(&inquiry(1), Fanout::AllChannels);

        let mut kinds = vec![next(&mut rx).await.0, next(&mut rx).await.0];
        kinds.sort_by_key(|kind| kind.label());
        assert_eq!(kinds, vec![ChannelKind::Email, ChannelKind::WhatsApp]);
    }

    #[tokio::test]
    async fn property_fanout_only_uses_messaging() {
        let (dispatcher, mut rx) = recording();
        dispatcher.inquiry_received(
            &inquiry(2),
            Fanout::PropertyMessage {
                title: "Sea View Villa".to_string(),
                location: "Alibaug".to_string(),
            },
        );

        let (kind, notification) = next(&mut rx).await;
        assert_eq!(kind, ChannelKind::WhatsApp);
        assert!(notification.body.contains("Property: Sea View Villa"));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err(), "no email for website inquiries");
    }

    #[tokio::test]
    async fn deliveries_are_bounded_by_the_pool() {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let channel: Arc<dyn NotificationChannel> = Arc::new(SlowChannel {
            active: active.clone(),
            peak: peak.clone(),
            done: done_tx,
        });
        let dispatcher = NotificationDispatcher::new(None, Some(channel), 2);

        for id in 0..6 {
            dispatcher.inquiry_received(&inquiry(id), Fanout::MessagingOnly);
        }
        for _ in 0..6 {
            tokio::time::timeout(Duration::from_secs(2), done_rx.recv())
                .await
                .expect("delivery finishes")
                .expect("channel open");
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(active.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn disabled_dispatcher_accepts_inquiries() {
        let dispatcher = NotificationDispatcher::disabled();
        assert!(!dispatcher.has_email());
        assert!(!dispatcher.has_messaging());
        dispatcher.inquiry_received(&inquiry(3), Fanout::AllChannels);
    }
}

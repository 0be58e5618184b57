use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::dispatcher::{ChannelKind, NotificationChannel};
use super::message::Notification;
use super::NotifyError;
use crate::config::NotifierConfig;

/// Email channel over an SMTP relay with STARTTLS.
pub struct SmtpEmailChannel {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpEmailChannel {
    /// `None` when the host or either address is missing.
    pub fn from_config(config: &NotifierConfig) -> Option<Result<Self, NotifyError>> {
        let host = config.smtp_host.as_deref()?;
        let sender = config.mail_sender_address.as_deref()?;
        let recipient = config.mail_recipient_address.as_deref()?;
        Some(Self::connect(
            host,
            config.smtp_port,
            sender,
            config.smtp_password.as_deref(),
            recipient,
        ))
    }

    /// The sender address doubles as the SMTP login when a password is set.
    pub fn connect(
        host: &str,
        port: u16,
        sender: &str,
        password: Option<&str>,
        recipient: &str,
    ) -> Result<Self, NotifyError> {
        let from = parse_mailbox(sender)?;
        let to = parse_mailbox(recipient)?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|err| NotifyError::Transport(err.to_string()))?
            .port(port);
        if let Some(password) = password {
            builder = builder.credentials(Credentials::new(
                sender.to_string(),
                password.to_string(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from,
            to,
        })
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address
        .parse::<Mailbox>()
        .map_err(|err| NotifyError::InvalidAddress {
            address: address.to_string(),
            reason: err.to_string(),
        })
}

#[async_trait]
impl NotificationChannel for SmtpEmailChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Email
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(notification.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(notification.body.clone())
            .map_err(|err| NotifyError::Build(err.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|err| NotifyError::Transport(err.to_string()))?;
        Ok(())
    }
}

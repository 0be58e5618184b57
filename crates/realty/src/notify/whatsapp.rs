use async_trait::async_trait;
use reqwest::Client;

use super::dispatcher::{ChannelKind, NotificationChannel};
use super::message::Notification;
use super::NotifyError;
use crate::config::NotifierConfig;

/// WhatsApp delivery through the Twilio Messages API. Requests run with the
/// client's default settings, so a slow provider is waited out.
pub struct WhatsAppChannel {
    client: Client,
    endpoint: String,
    account_sid: String,
    auth_token: String,
    from: String,
    to: String,
}

impl WhatsAppChannel {
    /// `None` unless the account, token, and both numbers are configured.
    pub fn from_config(config: &NotifierConfig) -> Option<Self> {
        Some(Self::new(
            &config.messaging_api_base,
            config.messaging_account_id.as_deref()?,
            config.messaging_auth_token.as_deref()?,
            config.messaging_sender_number.as_deref()?,
            config.messaging_recipient_number.as_deref()?,
        ))
    }

    pub fn new(api_base: &str, account_sid: &str, auth_token: &str, from: &str, to: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!(
                "{}/2010-04-01/Accounts/{}/Messages.json",
                api_base.trim_end_matches('/'),
                account_sid
            ),
            account_sid: account_sid.to_string(),
            auth_token: auth_token.to_string(),
            from: whatsapp_address(from),
            to: whatsapp_address(to),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Numbers are accepted with or without the `whatsapp:` scheme.
pub fn whatsapp_address(number: &str) -> String {
    let number = number.trim();
    if number.starts_with("whatsapp:") {
        number.to_string()
    } else {
        format!("whatsapp:{number}")
    }
}

#[async_trait]
impl NotificationChannel for WhatsAppChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::WhatsApp
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        let form = [
            ("From", self.from.as_str()),
            ("To", self.to.as_str()),
            ("Body", notification.body.as_str()),
        ];

        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|err| NotifyError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(NotifyError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

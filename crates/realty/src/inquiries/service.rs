use std::sync::Arc;

use tracing::info;

use super::domain::{Inquiry, InquiryId, InquirySubmission};
use super::repository::InquiryRepository;
use crate::notify::{Fanout, NotificationDispatcher};
use crate::store::RepositoryError;
use crate::validation::ValidationErrors;

/// Where an inquiry was submitted from; decides the notification fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InquiryOrigin {
    /// JSON API: email plus chat message.
    Api,
    /// Website contact form: chat message only.
    Contact,
    /// Website property page: chat message naming the listing.
    Property { title: String, location: String },
}

impl InquiryOrigin {
    fn fanout(self) -> Fanout {
        match self {
            InquiryOrigin::Api => Fanout::AllChannels,
            InquiryOrigin::Contact => Fanout::MessagingOnly,
            InquiryOrigin::Property { title, location } => Fanout::PropertyMessage { title, location },
        }
    }
}

/// Service composing the inquiry store and the notification dispatcher.
pub struct InquiryService {
    repository: Arc<dyn InquiryRepository>,
    notifier: Arc<NotificationDispatcher>,
}

impl InquiryService {
    pub fn new(
        repository: Arc<dyn InquiryRepository>,
        notifier: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            repository,
            notifier,
        }
    }

    /// Validate and persist an inquiry, then schedule its notifications.
    ///
    /// The inquiry is stored before any delivery is attempted and the call
    /// returns without waiting on a channel.
    pub fn submit(
        &self,
        submission: InquirySubmission,
        origin: InquiryOrigin,
    ) -> Result<Inquiry, InquiryServiceError> {
        let inquiry = submission.validate()?;
        let stored = self.repository.insert(inquiry)?;
        info!(inquiry_id = %stored.id, "inquiry captured");

        self.notifier.inquiry_received(&stored, origin.fanout());
        Ok(stored)
    }

    pub fn list(&self) -> Result<Vec<Inquiry>, InquiryServiceError> {
        Ok(self.repository.list()?)
    }

    pub fn get(&self, id: InquiryId) -> Result<Inquiry, InquiryServiceError> {
        let inquiry = self.repository.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        Ok(inquiry)
    }

    /// Full (`partial = false`) or partial edit by an admin. No notification
    /// is sent for edits.
    pub fn update(
        &self,
        id: InquiryId,
        submission: InquirySubmission,
        partial: bool,
    ) -> Result<Inquiry, InquiryServiceError> {
        let current = self.get(id)?;
        let inquiry = if partial {
            submission.apply_to(&current)?
        } else {
            submission.validate()?
        };
        let updated = self.repository.update(id, inquiry)?;
        info!(inquiry_id = %id, "inquiry updated");
        Ok(updated)
    }

    pub fn delete(&self, id: InquiryId) -> Result<(), InquiryServiceError> {
        self.repository.delete(id)?;
        info!(inquiry_id = %id, "inquiry deleted");
        Ok(())
    }
}

/// Error raised by the inquiry service.
#[derive(Debug, thiserror::Error)]
pub enum InquiryServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

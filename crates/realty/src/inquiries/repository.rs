use super::domain::{Inquiry, InquiryId, NewInquiry};
use crate::store::RepositoryError;

/// Storage abstraction for captured leads.
pub trait InquiryRepository: Send + Sync {
    /// Persist a validated inquiry, assigning its id and `created_at`.
    fn insert(&self, inquiry: NewInquiry) -> Result<Inquiry, RepositoryError>;
    /// Replace the writable fields; id and `created_at` are kept.
    fn update(&self, id: InquiryId, inquiry: NewInquiry) -> Result<Inquiry, RepositoryError>;
    fn fetch(&self, id: InquiryId) -> Result<Option<Inquiry>, RepositoryError>;
    /// Newest first.
    fn list(&self) -> Result<Vec<Inquiry>, RepositoryError>;
    fn delete(&self, id: InquiryId) -> Result<(), RepositoryError>;
}

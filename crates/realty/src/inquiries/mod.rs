//! Lead capture: validated inquiries, their store, and the service that
//! persists them before handing off to the notification dispatcher.

pub mod domain;
pub mod memory;
pub mod repository;
pub mod service;

pub use domain::{Inquiry, InquiryId, InquirySubmission, NewInquiry};
pub use memory::InMemoryInquiryRepository;
pub use repository::InquiryRepository;
pub use service::{InquiryOrigin, InquiryService, InquiryServiceError};

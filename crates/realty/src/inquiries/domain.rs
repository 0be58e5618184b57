use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::{is_valid_email, optional_text, required_text, ValidationErrors};

const NAME_MAX: usize = 120;
const PHONE_MAX: usize = 20;
const LOCATION_MAX: usize = 120;

/// Identifier wrapper for stored inquiries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InquiryId(pub u64);

impl fmt::Display for InquiryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A captured lead. `created_at` is assigned by the store and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inquiry {
    pub id: InquiryId,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub location: Option<String>,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Raw inquiry as posted by the contact form, the property page, or the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InquirySubmission {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Validated inquiry waiting for an id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInquiry {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub location: Option<String>,
    pub message: Option<String>,
}

impl NewInquiry {
    pub fn into_inquiry(self, id: InquiryId, created_at: DateTime<Utc>) -> Inquiry {
        Inquiry {
            id,
            name: self.name,
            phone: self.phone,
            email: self.email,
            location: self.location,
            message: self.message,
            created_at,
        }
    }
}

impl InquirySubmission {
    /// Partial update: fields absent from the submission keep their current value.
    pub fn apply_to(self, current: &Inquiry) -> Result<NewInquiry, ValidationErrors> {
        InquirySubmission {
            name: self.name.or_else(|| Some(current.name.clone())),
            phone: self.phone.or_else(|| Some(current.phone.clone())),
            email: self.email.or_else(|| current.email.clone()),
            location: self.location.or_else(|| current.location.clone()),
            message: self.message.or_else(|| current.message.clone()),
        }
        .validate()
    }

    pub fn validate(self) -> Result<NewInquiry, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = required_text(&mut errors, "name", self.name, NAME_MAX);
        let phone = required_text(&mut errors, "phone", self.phone, PHONE_MAX);
        let email = optional_text(&mut errors, "email", self.email, None);
        if let Some(address) = email.as_deref() {
            if !is_valid_email(address) {
                errors.add("email", "Enter a valid email address.");
            }
        }
        let location = optional_text(&mut errors, "location", self.location, Some(LOCATION_MAX));
        // Free text is kept verbatim apart from blank-as-absent.
        let message = self.message.filter(|text| !text.trim().is_empty());

        errors.into_result(NewInquiry {
            name,
            phone,
            email,
            location,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::REQUIRED;

    fn asha() -> InquirySubmission {
        InquirySubmission {
            name: Some("Asha".to_string()),
            phone: Some("9990001111".to_string()),
            location: Some("Pune".to_string()),
            ..InquirySubmission::default()
        }
    }

    #[test]
    fn minimal_contact_form_is_valid() {
        let inquiry = asha().validate().expect("valid inquiry");
        assert_eq!(inquiry.name, "Asha");
        assert_eq!(inquiry.phone, "9990001111");
        assert_eq!(inquiry.location.as_deref(), Some("Pune"));
        assert!(inquiry.email.is_none());
        assert!(inquiry.message.is_none());
    }

    #[test]
    fn reports_each_invalid_field() {
        let submission = InquirySubmission {
            name: Some("  ".to_string()),
            phone: None,
            email: Some("not-an-address".to_string()),
            location: Some("x".repeat(121)),
            message: None,
        };

        let errors = submission.validate().expect_err("invalid inquiry");
        assert_eq!(errors.field("name"), Some(&[REQUIRED.to_string()][..]));
        assert_eq!(errors.field("phone"), Some(&[REQUIRED.to_string()][..]));
        assert!(errors.field("email").is_some());
        assert!(errors.field("location").is_some());
        assert!(errors.field("message").is_none());
    }

    #[test]
    fn message_is_preserved_verbatim() {
        let mut submission = asha();
        submission.message = Some("  Looking for a 2BHK\nnear the station ".to_string());
        let inquiry = submission.validate().expect("valid inquiry");
        assert_eq!(
            inquiry.message.as_deref(),
            Some("  Looking for a 2BHK\nnear the station ")
        );
    }

    #[test]
    fn partial_update_keeps_absent_fields() {
        let current = asha()
            .validate()
            .expect("valid inquiry")
            .into_inquiry(InquiryId(7), Utc::now());
        let patch = InquirySubmission {
            email: Some("asha@example.com".to_string()),
            ..InquirySubmission::default()
        };

        let updated = patch.apply_to(&current).expect("valid patch");
        assert_eq!(updated.name, "Asha");
        assert_eq!(updated.location.as_deref(), Some("Pune"));
        assert_eq!(updated.email.as_deref(), Some("asha@example.com"));

        let blanked = InquirySubmission {
            phone: Some(" ".to_string()),
            ..InquirySubmission::default()
        };
        let errors = blanked.apply_to(&current).expect_err("phone cleared");
        assert_eq!(errors.field("phone"), Some(&[REQUIRED.to_string()][..]));
    }
}

use std::fmt::Write as _;

use crate::inquiries::Inquiry;

const MISSING: &str = "-";

/// Rendered notification; channels without a subject line ignore `subject`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

impl Notification {
    /// Email to the administrator listing every field of the inquiry.
    pub fn inquiry_email(inquiry: &Inquiry) -> Self {
        Self {
            subject: format!("New Inquiry from {}", inquiry.name),
            body: field_lines(inquiry),
        }
    }

    /// Chat message for inquiries arriving without a property context.
    pub fn inquiry_message(inquiry: &Inquiry) -> Self {
        let mut body = String::from("New Inquiry:\n");
        body.push_str(field_lines(inquiry).trim_end());
        Self {
            subject: format!("New Inquiry from {}", inquiry.name),
            body,
        }
    }

    /// Chat message for inquiries posted from a property page.
    pub fn property_inquiry_message(
        inquiry: &Inquiry,
        property_title: &str,
        property_location: &str,
    ) -> Self {
        Self {
            subject: format!("New Inquiry from {}", inquiry.name),
            body: format!(
                "New Inquiry!\nName: {}\nPhone: {}\nProperty: {}\nLocation: {}",
                inquiry.name, inquiry.phone, property_title, property_location
            ),
        }
    }
}

fn field_lines(inquiry: &Inquiry) -> String {
    let mut body = String::new();
    let _ = writeln!(body, "Name: {}", inquiry.name);
    let _ = writeln!(body, "Phone: {}", inquiry.phone);
    let _ = writeln!(body, "Email: {}", inquiry.email.as_deref().unwrap_or(MISSING));
    let _ = writeln!(
        body,
        "Location: {}",
        inquiry.location.as_deref().unwrap_or(MISSING)
    );
    let _ = writeln!(
        body,
        "Message: {}",
        inquiry.message.as_deref().unwrap_or(MISSING)
    );
    body
}

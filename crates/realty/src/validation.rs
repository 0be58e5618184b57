//! Field-level validation shared by the inquiry and listing forms.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub const REQUIRED: &str = "This field is required.";

/// Field name to messages, serialized as `{"field": ["message", ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&[String]> {
        self.0.get(name).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid input")?;
        for (index, (field, messages)) in self.0.iter().enumerate() {
            let separator = if index == 0 { ": " } else { "; " };
            write!(f, "{separator}{field} ({})", messages.join(" "))?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Scalar accepted from either JSON bodies or form posts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawField {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl RawField {
    /// Textual form with surrounding whitespace removed.
    pub fn as_text(&self) -> String {
        match self {
            RawField::Text(value) => value.trim().to_string(),
            RawField::Integer(value) => value.to_string(),
            RawField::Float(value) => value.to_string(),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, RawField::Text(value) if value.trim().is_empty())
    }
}

/// Trimmed required text with a maximum length in characters.
pub(crate) fn required_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<String>,
    max_chars: usize,
) -> String {
    let value = value.map(|raw| raw.trim().to_string()).unwrap_or_default();
    if value.is_empty() {
        errors.add(field, REQUIRED);
    } else {
        check_length(errors, field, &value, max_chars);
    }
    value
}

/// Trimmed optional text; blank input is stored as absent.
pub(crate) fn optional_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<String>,
    max_chars: Option<usize>,
) -> Option<String> {
    let value = value
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())?;
    if let Some(max_chars) = max_chars {
        check_length(errors, field, &value, max_chars);
    }
    Some(value)
}

fn check_length(errors: &mut ValidationErrors, field: &str, value: &str, max_chars: usize) {
    if value.chars().count() > max_chars {
        errors.add(
            field,
            format!("Ensure this field has no more than {max_chars} characters."),
        );
    }
}

pub(crate) fn optional_integer(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<RawField>,
) -> Option<i32> {
    let raw = value.filter(|raw| !raw.is_blank())?;
    match raw.as_text().parse::<i32>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            errors.add(field, "A valid integer is required.");
            None
        }
    }
}

pub(crate) fn optional_float(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<RawField>,
) -> Option<f64> {
    let raw = value.filter(|raw| !raw.is_blank())?;
    match raw.as_text().parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Some(parsed),
        _ => {
            errors.add(field, "A valid number is required.");
            None
        }
    }
}

/// RFC 5322 address parsed by `lettre`, with a dotted domain whose last
/// label is alphabetic (or punycode) and at least two characters long.
pub(crate) fn is_valid_email(value: &str) -> bool {
    let Ok(address) = value.parse::<lettre::Address>() else {
        return false;
    };
    address
        .domain()
        .rsplit_once('.')
        .is_some_and(|(_, tld)| {
            tld.len() >= 2
                && (tld.starts_with("xn--") || tld.chars().all(|c| c.is_alphabetic() || c == '-'))
        })
}

use std::collections::HashMap;

use axum::async_trait;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::AppError;
use crate::inquiries::InquirySubmission;
use crate::listings::PropertyDraft;
use crate::media::ImageUpload;
use crate::validation::RawField;

/// Text fields and file parts of a multipart body.
#[derive(Debug, Default)]
pub(crate) struct MultipartForm {
    pub(crate) fields: HashMap<String, String>,
    pub(crate) files: HashMap<String, Vec<ImageUpload>>,
}

impl MultipartForm {
    pub(crate) fn text(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }

    pub(crate) fn take_files(&mut self, name: &str) -> Vec<ImageUpload> {
        self.files.remove(name).unwrap_or_default()
    }

    pub(crate) fn property_draft(&self) -> PropertyDraft {
        let raw = |name: &str| self.text(name).map(RawField::Text);
        PropertyDraft {
            title: self.text("title"),
            description: self.text("description"),
            price: raw("price"),
            location: self.text("location"),
            property_type: self.text("property_type"),
            bedrooms: raw("bedrooms"),
            bathrooms: raw("bathrooms"),
            plot_area: raw("plot_area"),
            carpet_area: raw("carpet_area"),
            super_builtup_area: raw("super_builtup_area"),
        }
    }
}

/// Reads the whole body. Browsers send an empty, unnamed part for an empty
/// file input; those parts are skipped.
pub(crate) async fn read_multipart(mut multipart: Multipart) -> Result<MultipartForm, AppError> {
    let mut form = MultipartForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::BadRequest(err.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| AppError::BadRequest(err.body_text()))?;
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                form.files.entry(name).or_default().push(ImageUpload {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
            None => {
                let value = field
                    .text()
                    .await
                    .map_err(|err| AppError::BadRequest(err.body_text()))?;
                form.fields.insert(name, value);
            }
        }
    }
    Ok(form)
}

/// Body decoded as a url-encoded form when the request says so, JSON otherwise.
#[derive(Debug, Clone)]
pub(crate) struct JsonOrForm<T>(pub(crate) T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = Response;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(value) = Form::<T>::from_request(request, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(value))
        } else {
            let Json(value) = Json::<T>::from_request(request, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(value))
        }
    }
}

/// Inquiry form on the contact and property pages. The pages render name,
/// phone and location; email and message are accepted when posted.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct InquiryForm {
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) phone: Option<String>,
    #[serde(default)]
    pub(crate) email: Option<String>,
    #[serde(default)]
    pub(crate) location: Option<String>,
    #[serde(default)]
    pub(crate) message: Option<String>,
}

impl From<InquiryForm> for InquirySubmission {
    fn from(form: InquiryForm) -> Self {
        InquirySubmission {
            name: form.name,
            phone: form.phone,
            email: form.email,
            location: form.location,
            message: form.message,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LoginForm {
    #[serde(default)]
    pub(crate) username: String,
    #[serde(default)]
    pub(crate) password: String,
}

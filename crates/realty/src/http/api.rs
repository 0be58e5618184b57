use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::forms::{read_multipart, JsonOrForm};
use super::state::AppContext;
use crate::auth::AdminToken;
use crate::error::AppError;
use crate::inquiries::{Inquiry, InquiryId, InquiryOrigin, InquirySubmission};
use crate::listings::{PropertyDetail, PropertyDraft, PropertyId, PropertyImage, PropertyImageId};
use crate::validation::ValidationErrors;

/// JSON API under `/api/`. Reads are public except inquiries; writes need a
/// bearer access token, except inquiry creation.
pub fn api_router() -> Router<AppContext> {
    Router::new()
        .route("/api/token/", post(obtain_token))
        .route("/api/token/refresh/", post(refresh_token))
        .route(
            "/api/properties/",
            get(list_properties).post(create_property),
        )
        .route(
            "/api/properties/:id/",
            get(retrieve_property)
                .put(update_property)
                .patch(partial_update_property)
                .delete(destroy_property),
        )
        .route("/api/properties/:id/toggle_sold/", post(toggle_sold))
        .route(
            "/api/property-images/",
            get(list_images).post(upload_images),
        )
        .route(
            "/api/property-images/:id/",
            get(retrieve_image)
                .put(update_image)
                .patch(partial_update_image)
                .delete(destroy_image),
        )
        .route(
            "/api/inquiries/",
            get(list_inquiries).post(create_inquiry),
        )
        .route(
            "/api/inquiries/:id/",
            get(retrieve_inquiry)
                .put(update_inquiry)
                .patch(partial_update_inquiry)
                .delete(destroy_inquiry),
        )
}

#[derive(Debug, Deserialize)]
struct TokenRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
struct RefreshRequest {
    #[serde(default)]
    refresh: String,
}

async fn obtain_token(
    State(ctx): State<AppContext>,
    Json(request): Json<TokenRequest>,
) -> Result<Response, AppError> {
    let mut errors = ValidationErrors::new();
    if request.username.trim().is_empty() {
        errors.add("username", crate::validation::REQUIRED);
    }
    if request.password.is_empty() {
        errors.add("password", crate::validation::REQUIRED);
    }
    errors.into_result(())?;

    let user = ctx.admins.authenticate(&request.username, &request.password)?;
    let pair = ctx.tokens.issue_pair(&user)?;
    info!(username = %user.username, "api token issued");
    Ok(Json(pair).into_response())
}

async fn refresh_token(
    State(ctx): State<AppContext>,
    Json(request): Json<RefreshRequest>,
) -> Result<Response, AppError> {
    if request.refresh.trim().is_empty() {
        return Err(ValidationErrors::single("refresh", crate::validation::REQUIRED).into());
    }
    let access = ctx.tokens.refresh(request.refresh.trim())?;
    Ok(Json(json!({ "access": access })).into_response())
}

async fn list_properties(
    State(ctx): State<AppContext>,
) -> Result<Json<Vec<PropertyDetail>>, AppError> {
    Ok(Json(ctx.listings.list()?))
}

async fn create_property(
    _admin: AdminToken,
    State(ctx): State<AppContext>,
    Json(draft): Json<PropertyDraft>,
) -> Result<Response, AppError> {
    let detail = ctx.listings.create(draft)?;
    Ok((StatusCode::CREATED, Json(detail)).into_response())
}

async fn retrieve_property(
    State(ctx): State<AppContext>,
    Path(id): Path<u64>,
) -> Result<Json<PropertyDetail>, AppError> {
    Ok(Json(ctx.listings.get(PropertyId(id))?))
}

async fn update_property(
    _admin: AdminToken,
    State(ctx): State<AppContext>,
    Path(id): Path<u64>,
    Json(draft): Json<PropertyDraft>,
) -> Result<Json<PropertyDetail>, AppError> {
    Ok(Json(ctx.listings.update(PropertyId(id), draft, false)?))
}

async fn partial_update_property(
    _admin: AdminToken,
    State(ctx): State<AppContext>,
    Path(id): Path<u64>,
    Json(draft): Json<PropertyDraft>,
) -> Result<Json<PropertyDetail>, AppError> {
    Ok(Json(ctx.listings.update(PropertyId(id), draft, true)?))
}

async fn destroy_property(
    _admin: AdminToken,
    State(ctx): State<AppContext>,
    Path(id): Path<u64>,
) -> Result<StatusCode, AppError> {
    ctx.listings.delete(PropertyId(id))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_sold(
    _admin: AdminToken,
    State(ctx): State<AppContext>,
    Path(id): Path<u64>,
) -> Result<Response, AppError> {
    let property = ctx.listings.toggle_sold_out(PropertyId(id))?;
    Ok(Json(json!({ "sold_out": property.sold_out })).into_response())
}

async fn list_images(State(ctx): State<AppContext>) -> Result<Json<Vec<PropertyImage>>, AppError> {
    Ok(Json(ctx.listings.images()?))
}

/// Multipart body: a `property` id plus one or more `images` file parts.
async fn upload_images(
    _admin: AdminToken,
    State(ctx): State<AppContext>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let mut form = read_multipart(multipart).await?;

    let Some(raw_property) = form.text("property").filter(|value| !value.trim().is_empty()) else {
        return Err(AppError::BadRequest("property is required".to_string()));
    };
    let files = form.take_files("images");
    if files.is_empty() {
        return Err(AppError::BadRequest("No images provided".to_string()));
    }
    let property = raw_property.trim().parse::<u64>().map_err(|_| {
        ValidationErrors::single(
            "property",
            "Incorrect type. Expected pk value, received str.",
        )
    })?;

    let created = ctx.listings.attach_images(PropertyId(property), files).await?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

async fn retrieve_image(
    State(ctx): State<AppContext>,
    Path(id): Path<u64>,
) -> Result<Json<PropertyImage>, AppError> {
    Ok(Json(ctx.listings.image(PropertyImageId(id))?))
}

async fn update_image(
    _admin: AdminToken,
    State(ctx): State<AppContext>,
    Path(id): Path<u64>,
    multipart: Multipart,
) -> Result<Json<PropertyImage>, AppError> {
    Ok(Json(edit_image(&ctx, id, multipart, false).await?))
}

async fn partial_update_image(
    _admin: AdminToken,
    State(ctx): State<AppContext>,
    Path(id): Path<u64>,
    multipart: Multipart,
) -> Result<Json<PropertyImage>, AppError> {
    Ok(Json(edit_image(&ctx, id, multipart, true).await?))
}

/// Multipart body with an optional `property` id and an optional `image` file part.
async fn edit_image(
    ctx: &AppContext,
    id: u64,
    multipart: Multipart,
    partial: bool,
) -> Result<PropertyImage, AppError> {
    let mut form = read_multipart(multipart).await?;
    let property = match form.text("property").filter(|value| !value.trim().is_empty()) {
        Some(raw) => Some(PropertyId(raw.trim().parse::<u64>().map_err(|_| {
            ValidationErrors::single(
                "property",
                "Incorrect type. Expected pk value, received str.",
            )
        })?)),
        None => None,
    };
    let upload = form.take_files("image").into_iter().next();

    Ok(ctx
        .listings
        .update_image(PropertyImageId(id), property, upload, partial)
        .await?)
}

async fn destroy_image(
    _admin: AdminToken,
    State(ctx): State<AppContext>,
    Path(id): Path<u64>,
) -> Result<StatusCode, AppError> {
    ctx.listings.delete_image(PropertyImageId(id))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_inquiries(
    _admin: AdminToken,
    State(ctx): State<AppContext>,
) -> Result<Json<Vec<Inquiry>>, AppError> {
    Ok(Json(ctx.inquiries.list()?))
}

/// Public; JSON or a url-encoded form. The response does not wait on email
/// or WhatsApp delivery.
async fn create_inquiry(
    State(ctx): State<AppContext>,
    JsonOrForm(submission): JsonOrForm<InquirySubmission>,
) -> Result<Response, AppError> {
    let inquiry = ctx.inquiries.submit(submission, InquiryOrigin::Api)?;
    Ok((StatusCode::CREATED, Json(inquiry)).into_response())
}

async fn retrieve_inquiry(
    _admin: AdminToken,
    State(ctx): State<AppContext>,
    Path(id): Path<u64>,
) -> Result<Json<Inquiry>, AppError> {
    Ok(Json(ctx.inquiries.get(InquiryId(id))?))
}

async fn update_inquiry(
    _admin: AdminToken,
    State(ctx): State<AppContext>,
    Path(id): Path<u64>,
    JsonOrForm(submission): JsonOrForm<InquirySubmission>,
) -> Result<Json<Inquiry>, AppError> {
    Ok(Json(ctx.inquiries.update(InquiryId(id), submission, false)?))
}

async fn partial_update_inquiry(
    _admin: AdminToken,
    State(ctx): State<AppContext>,
    Path(id): Path<u64>,
    JsonOrForm(submission): JsonOrForm<InquirySubmission>,
) -> Result<Json<Inquiry>, AppError> {
    Ok(Json(ctx.inquiries.update(InquiryId(id), submission, true)?))
}

async fn destroy_inquiry(
    _admin: AdminToken,
    State(ctx): State<AppContext>,
    Path(id): Path<u64>,
) -> Result<StatusCode, AppError> {
    ctx.inquiries.delete(InquiryId(id))?;
    Ok(StatusCode::NO_CONTENT)
}

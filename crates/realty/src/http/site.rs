use axum::extract::{Multipart, Path, Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Json, Router};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;

use super::forms::{read_multipart, InquiryForm, LoginForm};
use super::state::AppContext;
use crate::auth::SiteAdmin;
use crate::error::AppError;
use crate::inquiries::{InquiryOrigin, InquiryServiceError};
use crate::listings::{ListingError, PropertyId, PropertyQuery, PropertyType, FEATURED_LIMIT};
use crate::sessions::{
    clear_session_cookie, session_cookie, CurrentSession, FlashMessage, SessionData,
};
use crate::validation::ValidationErrors;

const LANDING: &str = "/";
const DASHBOARD: &str = "/app/admin-dashboard/";
const INQUIRY_FIELDS: [&str; 3] = ["name", "phone", "location"];

/// Public pages and the session-authenticated admin pages. Every page is a
/// JSON payload carrying the pending flash messages; form posts redirect.
pub fn site_router() -> Router<AppContext> {
    Router::new()
        .route("/", get(landing))
        .route("/app/", get(landing))
        .route("/app/properties/", get(public_dashboard))
        .route(
            "/app/property/:id/",
            get(property_detail).post(property_inquiry),
        )
        .route("/app/contact/", get(contact_form).post(contact_submit))
        .route("/app/admin-dashboard/", get(admin_dashboard))
        .route("/app/add-property/", get(add_property_form).post(add_property))
        .route(
            "/app/edit-property/:id/",
            get(edit_property_form).post(edit_property),
        )
        .route(
            "/app/delete-property/:id/",
            get(delete_property_confirm).post(delete_property),
        )
        .route("/app/toggle-sold/:id/", get(toggle_sold).post(toggle_sold))
        .route("/app/agent-login/", get(login_form).post(login))
        .route("/app/logout/", get(logout).post(logout))
}

/// Page payload with the session's flash messages consumed.
async fn render(ctx: &AppContext, session: &CurrentSession, page: &str, data: Value) -> Json<Value> {
    let messages = match session.id.as_deref() {
        Some(id) => ctx.sessions.take_flash(id).await,
        None => Vec::new(),
    };
    let mut payload = json!({
        "page": page,
        "user": session.user,
        "messages": messages,
    });
    if let (Some(target), Value::Object(extra)) = (payload.as_object_mut(), data) {
        target.extend(extra);
    }
    Json(payload)
}

/// Queues a flash message and redirects. Anonymous visitors get a fresh
/// session so the message survives the redirect; it is dropped once read.
async fn redirect_with_flash(
    ctx: &AppContext,
    session: &CurrentSession,
    to: &str,
    message: FlashMessage,
) -> Response {
    if let Some(id) = session.id.as_deref() {
        if ctx.sessions.push_flash(id, message.clone()).await {
            return Redirect::to(to).into_response();
        }
    }

    let id = ctx
        .sessions
        .create(SessionData {
            last_activity: Some(Utc::now()),
            flash: vec![message],
            ..SessionData::default()
        })
        .await;
    let cookie = session_cookie(&id, ctx.session_max_age.num_seconds());
    (AppendHeaders([(SET_COOKIE, cookie)]), Redirect::to(to)).into_response()
}

fn form_errors(errors: ValidationErrors) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, Json(errors)).into_response()
}

async fn landing(
    State(ctx): State<AppContext>,
    session: CurrentSession,
) -> Result<Json<Value>, AppError> {
    let featured = ctx.listings.featured(FEATURED_LIMIT)?;
    Ok(render(&ctx, &session, "landing", json!({ "featured_props": featured })).await)
}

async fn public_dashboard(
    State(ctx): State<AppContext>,
    session: CurrentSession,
    Query(query): Query<PropertyQuery>,
) -> Result<Json<Value>, AppError> {
    let properties = ctx.listings.search(&query)?;
    Ok(render(
        &ctx,
        &session,
        "properties",
        json!({ "properties": properties, "q": query.q, "price": query.price }),
    )
    .await)
}

async fn property_detail(
    State(ctx): State<AppContext>,
    session: CurrentSession,
    Path(id): Path<u64>,
) -> Result<Json<Value>, AppError> {
    let detail = ctx.listings.get(PropertyId(id))?;
    Ok(render(
        &ctx,
        &session,
        "property_detail",
        json!({ "property": detail, "form": INQUIRY_FIELDS }),
    )
    .await)
}

/// Saves the inquiry and notifies over WhatsApp with the listing's title and location.
async fn property_inquiry(
    State(ctx): State<AppContext>,
    session: CurrentSession,
    Path(id): Path<u64>,
    Form(form): Form<InquiryForm>,
) -> Result<Response, AppError> {
    let property = ctx.listings.fetch(PropertyId(id))?;
    let origin = InquiryOrigin::Property {
        title: property.fields.title.clone(),
        location: property.fields.location.clone(),
    };

    match ctx.inquiries.submit(form.into(), origin) {
        Ok(_) => Ok(redirect_with_flash(
            &ctx,
            &session,
            &format!("/app/property/{id}/"),
            FlashMessage::success("Inquiry submitted successfully!"),
        )
        .await),
        Err(InquiryServiceError::Validation(errors)) => Ok(form_errors(errors)),
        Err(other) => Err(other.into()),
    }
}

async fn contact_form(State(ctx): State<AppContext>, session: CurrentSession) -> Json<Value> {
    render(&ctx, &session, "contact", json!({ "form": INQUIRY_FIELDS })).await
}

async fn contact_submit(
    State(ctx): State<AppContext>,
    session: CurrentSession,
    Form(form): Form<InquiryForm>,
) -> Result<Response, AppError> {
    match ctx.inquiries.submit(form.into(), InquiryOrigin::Contact) {
        Ok(_) => Ok(redirect_with_flash(
            &ctx,
            &session,
            LANDING,
            FlashMessage::success("Message sent successfully!"),
        )
        .await),
        Err(InquiryServiceError::Validation(errors)) => Ok(form_errors(errors)),
        Err(other) => Err(other.into()),
    }
}

async fn admin_dashboard(
    admin: SiteAdmin,
    State(ctx): State<AppContext>,
    session: CurrentSession,
    Query(query): Query<PropertyQuery>,
) -> Result<Json<Value>, AppError> {
    let query = PropertyQuery {
        q: query.q,
        price: None,
    };
    let properties = ctx.listings.search(&query)?;
    info!(username = %admin.user.username, results = properties.len(), "admin dashboard viewed");
    Ok(render(
        &ctx,
        &session,
        "admin_dashboard",
        json!({ "properties": properties, "q": query.q }),
    )
    .await)
}

async fn add_property_form(
    _admin: SiteAdmin,
    State(ctx): State<AppContext>,
    session: CurrentSession,
) -> Json<Value> {
    let types: Vec<&str> = PropertyType::ALL.iter().map(|kind| kind.label()).collect();
    render(&ctx, &session, "add_property", json!({ "property_types": types })).await
}

async fn add_property(
    _admin: SiteAdmin,
    State(ctx): State<AppContext>,
    session: CurrentSession,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let mut form = read_multipart(multipart).await?;
    let images = form.take_files("images");

    match ctx.listings.create_with_images(form.property_draft(), images).await {
        Ok(_) => Ok(redirect_with_flash(
            &ctx,
            &session,
            DASHBOARD,
            FlashMessage::success("Property added successfully!"),
        )
        .await),
        Err(ListingError::Validation(errors)) => Ok(form_errors(errors)),
        Err(other) => Err(other.into()),
    }
}

async fn edit_property_form(
    _admin: SiteAdmin,
    State(ctx): State<AppContext>,
    session: CurrentSession,
    Path(id): Path<u64>,
) -> Result<Json<Value>, AppError> {
    let detail = ctx.listings.get(PropertyId(id))?;
    Ok(render(
        &ctx,
        &session,
        "edit_property",
        json!({ "property": detail.property, "images": detail.images }),
    )
    .await)
}

async fn edit_property(
    _admin: SiteAdmin,
    State(ctx): State<AppContext>,
    session: CurrentSession,
    Path(id): Path<u64>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let mut form = read_multipart(multipart).await?;
    let images = form.take_files("images");

    match ctx
        .listings
        .update_with_images(PropertyId(id), form.property_draft(), images)
        .await
    {
        Ok(_) => Ok(redirect_with_flash(
            &ctx,
            &session,
            DASHBOARD,
            FlashMessage::success("Property updated successfully!"),
        )
        .await),
        Err(ListingError::Validation(errors)) => Ok(form_errors(errors)),
        Err(other) => Err(other.into()),
    }
}

async fn delete_property_confirm(
    _admin: SiteAdmin,
    State(ctx): State<AppContext>,
    session: CurrentSession,
    Path(id): Path<u64>,
) -> Result<Json<Value>, AppError> {
    let property = ctx.listings.fetch(PropertyId(id))?;
    Ok(render(&ctx, &session, "delete_confirm", json!({ "property": property })).await)
}

async fn delete_property(
    _admin: SiteAdmin,
    State(ctx): State<AppContext>,
    session: CurrentSession,
    Path(id): Path<u64>,
) -> Result<Response, AppError> {
    ctx.listings.delete(PropertyId(id))?;
    Ok(redirect_with_flash(
        &ctx,
        &session,
        DASHBOARD,
        FlashMessage::success("Property deleted successfully!"),
    )
    .await)
}

async fn toggle_sold(
    _admin: SiteAdmin,
    State(ctx): State<AppContext>,
    session: CurrentSession,
    Path(id): Path<u64>,
) -> Result<Response, AppError> {
    let property = ctx.listings.toggle_sold_out(PropertyId(id))?;
    let text = if property.sold_out {
        format!("{} marked as SOLD OUT.", property.fields.title)
    } else {
        format!("{} marked as AVAILABLE again.", property.fields.title)
    };
    Ok(redirect_with_flash(&ctx, &session, DASHBOARD, FlashMessage::success(text)).await)
}

async fn login_form(State(ctx): State<AppContext>, session: CurrentSession) -> Response {
    if session.is_admin() {
        return Redirect::to(DASHBOARD).into_response();
    }
    render(&ctx, &session, "agent_login", json!({})).await.into_response()
}

/// Starts a fresh authenticated session; the previous session, if any, is discarded.
async fn login(
    State(ctx): State<AppContext>,
    session: CurrentSession,
    Form(form): Form<LoginForm>,
) -> Response {
    if session.is_admin() {
        return Redirect::to(DASHBOARD).into_response();
    }

    match ctx.admins.authenticate(form.username.trim(), &form.password) {
        Ok(user) => {
            if let Some(old) = session.id.as_deref() {
                ctx.sessions.remove(old).await;
            }
            info!(username = %user.username, "admin logged in");
            let id = ctx
                .sessions
                .create(SessionData {
                    user: Some(user),
                    last_activity: Some(Utc::now()),
                    flash: Vec::new(),
                })
                .await;
            let cookie = session_cookie(&id, ctx.session_max_age.num_seconds());
            (AppendHeaders([(SET_COOKIE, cookie)]), Redirect::to(DASHBOARD)).into_response()
        }
        Err(_) => {
            let mut page = render(&ctx, &session, "agent_login", json!({})).await;
            if let Some(messages) = page.0.get_mut("messages").and_then(Value::as_array_mut) {
                messages.push(json!(FlashMessage::error("Invalid credentials")));
            }
            page.into_response()
        }
    }
}

async fn logout(State(ctx): State<AppContext>, session: CurrentSession) -> Response {
    if let Some(id) = session.id.as_deref() {
        if let Some(data) = ctx.sessions.remove(id).await {
            if let Some(user) = data.user {
                info!(username = %user.username, "admin logged out");
            }
        }
    }
    (
        AppendHeaders([(SET_COOKIE, clear_session_cookie())]),
        Redirect::to(LANDING),
    )
        .into_response()
}

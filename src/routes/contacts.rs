/**
 * Contact Routes
 * Public contact form and the admin inbox
 */
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::auth::AdminSession;
use crate::db::{
    models::{Contact, NewContact},
    Table,
};
use crate::error::{ApiError, ApiJson};
use crate::routes::{non_blank, parse_id, IdQuery, SuccessResponse};
use crate::state::AppState;

lazy_static::lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid");
}

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ContactSubmitted {
    pub message: &'static str,
    pub data: Contact,
}

#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    pub id: Option<String>,
    pub read: Option<bool>,
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// POST /api/contact
pub async fn submit(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ContactRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(name), Some(email), Some(message)) = (
        non_blank(payload.name),
        non_blank(payload.email),
        non_blank(payload.message),
    ) else {
        return Err(ApiError::bad_request("All fields are required"));
    };
    if !is_valid_email(&email) {
        return Err(ApiError::bad_request("Invalid email format"));
    }

    let contact = state
        .store
        .insert_contact(&NewContact {
            name,
            email,
            message,
        })
        .await
        .map_err(ApiError::store("Failed to submit contact form"))?;

    tracing::info!(id = %contact.id, "Contact message stored");

    // The message is already stored; a failed notification must not fail the request.
    if let Err(e) = state.notifier.notify(&contact).await {
        tracing::warn!(id = %contact.id, "Failed to send contact notification: {}", e);
    }

    Ok((
        StatusCode::CREATED,
        Json(ContactSubmitted {
            message: "Contact submitted successfully",
            data: contact,
        }),
    ))
}

/// GET /api/admin/contacts
pub async fn list(
    _session: AdminSession,
    State(state): State<AppState>,
) -> Result<Json<Vec<Contact>>, ApiError> {
    let contacts = state
        .store
        .list_contacts()
        .await
        .map_err(ApiError::store("Failed to fetch contacts"))?;
    Ok(Json(contacts))
}

/// PUT /api/admin/contacts
pub async fn mark_read(
    _session: AdminSession,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<MarkReadRequest>,
) -> Result<Json<Contact>, ApiError> {
    let (Some(id), Some(read)) = (non_blank(payload.id), payload.read) else {
        return Err(ApiError::bad_request("id and read are required"));
    };
    let id = parse_id(Some(id))?;

    let contact = state
        .store
        .set_contact_read(id, read)
        .await
        .map_err(ApiError::store("Failed to update contact"))?
        .ok_or_else(|| ApiError::not_found("Contact not found"))?;

    tracing::info!(id = %contact.id, read = contact.read, "Contact read flag updated");
    Ok(Json(contact))
}

/// DELETE /api/admin/contacts?id=
pub async fn delete(
    _session: AdminSession,
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let id = parse_id(query.id)?;

    let removed = state
        .store
        .delete(Table::Contacts, id)
        .await
        .map_err(ApiError::store("Failed to delete contact"))?;
    if !removed {
        return Err(ApiError::not_found("Contact not found"));
    }

    tracing::info!(id = %id, "Contact deleted");
    Ok(Json(SuccessResponse::with_message("Contact deleted successfully")))
}

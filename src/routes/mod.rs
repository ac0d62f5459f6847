/**
 * Routes Module
 * API route handlers and the request helpers they share
 */
pub mod auth;
pub mod contacts;
pub mod education;
pub mod env_check;
pub mod experience;
pub mod health;
pub mod icons;
pub mod projects;
pub mod skills;
pub mod upload;

use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::Store;
use crate::error::ApiError;
use crate::ordering::{self, Direction, OrderedCollection};

pub use crate::error::ErrorResponse;

/// `{success: true}` with an optional human-readable message.
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }
}

/// `?id=` on delete routes.
#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub id: Option<String>,
    pub direction: Option<String>,
}

/// Trimmed value, or `None` when missing or blank.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn parse_id(raw: Option<String>) -> Result<Uuid, ApiError> {
    let raw = non_blank(raw).ok_or_else(|| ApiError::bad_request("ID is required"))?;
    Uuid::parse_str(&raw).map_err(|_| ApiError::bad_request("Invalid ID"))
}

/// Trims every entry and drops blank ones.
pub fn non_blank_list(values: Option<Vec<String>>) -> Vec<String> {
    values
        .unwrap_or_default()
        .into_iter()
        .filter_map(|v| non_blank(Some(v)))
        .collect()
}

/// Shared body of every `POST .../reorder` handler.
pub async fn reorder(
    store: &dyn Store,
    collection: OrderedCollection,
    request: ReorderRequest,
) -> Result<Json<SuccessResponse>, ApiError> {
    let (Some(id), Some(direction)) = (non_blank(request.id), non_blank(request.direction)) else {
        return Err(ApiError::bad_request("ID and direction are required"));
    };
    let direction: Direction = direction
        .parse()
        .map_err(|()| ApiError::bad_request("Direction must be 'up' or 'down'"))?;
    let id = parse_id(Some(id))?;

    ordering::move_item(store, collection, id, direction).await?;
    Ok(Json(SuccessResponse::ok()))
}

/**
 * Experience Routes
 * Public list plus admin CRUD and reorder for work history
 */
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::auth::AdminSession;
use crate::db::{
    models::{Experience, ExperienceInput},
    Table,
};
use crate::error::{ApiError, ApiJson};
use crate::ordering::{append_position, OrderedCollection};
use crate::routes::{non_blank, parse_id, IdQuery, ReorderRequest, SuccessResponse};
use crate::state::AppState;

const COLLECTION: OrderedCollection = OrderedCollection::Experience;

#[derive(Debug, Deserialize)]
pub struct ExperienceRequest {
    pub id: Option<String>,
    pub period: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub location: Option<String>,
}

impl ExperienceRequest {
    fn into_input(self) -> Result<ExperienceInput, ApiError> {
        match (
            non_blank(self.period),
            non_blank(self.company),
            non_blank(self.position),
            non_blank(self.location),
        ) {
            (Some(period), Some(company), Some(position), Some(location)) => Ok(ExperienceInput {
                period,
                company,
                position,
                location,
            }),
            _ => Err(ApiError::bad_request("Missing required fields")),
        }
    }
}

async fn fetch_all(state: &AppState) -> Result<Vec<Experience>, ApiError> {
    state
        .store
        .list_experience()
        .await
        .map_err(ApiError::store("Failed to fetch experience"))
}

/// GET /api/experience
pub async fn list_public(State(state): State<AppState>) -> Result<Json<Vec<Experience>>, ApiError> {
    Ok(Json(fetch_all(&state).await?))
}

/// GET /api/admin/experience
pub async fn list(
    _session: AdminSession,
    State(state): State<AppState>,
) -> Result<Json<Vec<Experience>>, ApiError> {
    Ok(Json(fetch_all(&state).await?))
}

/// POST /api/admin/experience
pub async fn create(
    _session: AdminSession,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ExperienceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = payload.into_input()?;
    let sort_order = append_position(state.store.as_ref(), COLLECTION).await?;

    let row = state
        .store
        .insert_experience(&input, sort_order)
        .await
        .map_err(ApiError::store("Failed to create experience"))?;

    tracing::info!(id = %row.id, company = %row.company, "Experience created");
    Ok((StatusCode::CREATED, Json(row)))
}

/// PUT /api/admin/experience
pub async fn update(
    _session: AdminSession,
    State(state): State<AppState>,
    ApiJson(mut payload): ApiJson<ExperienceRequest>,
) -> Result<Json<Experience>, ApiError> {
    let id = parse_id(payload.id.take())?;
    let input = payload.into_input()?;

    let row = state
        .store
        .update_experience(id, &input)
        .await
        .map_err(ApiError::store("Failed to update experience"))?
        .ok_or_else(|| ApiError::not_found("Experience not found"))?;

    tracing::info!(id = %row.id, "Experience updated");
    Ok(Json(row))
}

/// DELETE /api/admin/experience?id=
pub async fn delete(
    _session: AdminSession,
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let id = parse_id(query.id)?;

    let removed = state
        .store
        .delete(Table::Experience, id)
        .await
        .map_err(ApiError::store("Failed to delete experience"))?;
    if !removed {
        return Err(ApiError::not_found("Experience not found"));
    }

    tracing::info!(id = %id, "Experience deleted");
    Ok(Json(SuccessResponse::with_message(
        "Experience deleted successfully",
    )))
}

/// POST /api/admin/experience/reorder
pub async fn reorder(
    _session: AdminSession,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ReorderRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    crate::routes::reorder(state.store.as_ref(), COLLECTION, payload).await
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::test_support::TestApp;

    fn job(company: &str) -> serde_json::Value {
        json!({
            "period": "2021 - Present",
            "company": company,
            "position": "Backend Engineer",
            "location": "Remote",
        })
    }

    #[tokio::test]
    async fn test_create_appends_and_public_list_is_ordered() {
        let app = TestApp::new();
        let first = app.create("/api/admin/experience", job("Acme")).await;
        let second = app.create("/api/admin/experience", job("Globex")).await;

        let (status, rows) = app.get("/api/experience").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(rows[0]["id"], first.to_string());
        assert_eq!(rows[0]["sort_order"], 1);
        assert_eq!(rows[1]["id"], second.to_string());
        assert_eq!(rows[1]["sort_order"], 2);
    }

    #[tokio::test]
    async fn test_create_requires_session_and_writes_nothing() {
        let app = TestApp::new();
        let (status, body) = app
            .json(Method::POST, "/api/admin/experience", job("Acme"))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");

        let (_, rows) = app.get("/api/experience").await;
        assert_eq!(rows.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_create_missing_field_returns_bad_request() {
        let app = TestApp::new();
        let (status, body) = app
            .admin_json(
                Method::POST,
                "/api/admin/experience",
                json!({"period": "2020", "company": "Acme", "position": ""}),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required fields");
    }

    #[tokio::test]
    async fn test_update_and_missing_row() {
        let app = TestApp::new();
        let id = app.create("/api/admin/experience", job("Acme")).await;

        let mut changed = job("Acme Corp");
        changed["id"] = json!(id);
        let (status, row) = app
            .admin_json(Method::PUT, "/api/admin/experience", changed.clone())
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(row["company"], "Acme Corp");
        assert_eq!(row["sort_order"], 1);

        changed["id"] = json!(uuid::Uuid::new_v4());
        let (status, body) = app
            .admin_json(Method::PUT, "/api/admin/experience", changed)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Experience not found");
    }

    #[tokio::test]
    async fn test_delete_requires_id_and_reports_missing_rows() {
        let app = TestApp::new();
        let id = app.create("/api/admin/experience", job("Acme")).await;

        let (status, body) = app.admin_delete("/api/admin/experience").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "ID is required");

        let uri = format!("/api/admin/experience?id={id}");
        let (status, body) = app.admin_delete(&uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (status, _) = app.admin_delete(&uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_reorder_moves_items_and_rejects_edges() {
        let app = TestApp::new();
        let a = app.create("/api/admin/experience", job("A")).await;
        let b = app.create("/api/admin/experience", job("B")).await;

        let (status, body) = app
            .admin_json(
                Method::POST,
                "/api/admin/experience/reorder",
                json!({"id": a, "direction": "up"}),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Cannot move item in that direction");
        assert_eq!(app.ids("/api/admin/experience").await, vec![a, b]);

        let (status, _) = app
            .admin_json(
                Method::POST,
                "/api/admin/experience/reorder",
                json!({"id": a, "direction": "down"}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(app.ids("/api/admin/experience").await, vec![b, a]);
    }

    #[tokio::test]
    async fn test_reorder_validates_body() {
        let app = TestApp::new();
        let (status, body) = app
            .admin_json(
                Method::POST,
                "/api/admin/experience/reorder",
                json!({"direction": "up"}),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "ID and direction are required");

        let (status, body) = app
            .admin_json(
                Method::POST,
                "/api/admin/experience/reorder",
                json!({"id": uuid::Uuid::new_v4(), "direction": "left"}),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Direction must be 'up' or 'down'");

        let (status, body) = app
            .admin_json(
                Method::POST,
                "/api/admin/experience/reorder",
                json!({"id": uuid::Uuid::new_v4(), "direction": "down"}),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Item not found");
    }
}

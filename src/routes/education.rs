/**
 * Education Routes
 * Public list plus admin CRUD and reorder for education history
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
    models::{Education, EducationInput},
    Table,
};
use crate::error::{ApiError, ApiJson};
use crate::ordering::{append_position, OrderedCollection};
use crate::routes::{non_blank, parse_id, IdQuery, ReorderRequest, SuccessResponse};
use crate::state::AppState;

const COLLECTION: OrderedCollection = OrderedCollection::Education;

#[derive(Debug, Deserialize)]
pub struct EducationRequest {
    pub id: Option<String>,
    pub period: Option<String>,
    pub institution: Option<String>,
    pub degree: Option<String>,
    pub location: Option<String>,
}

impl EducationRequest {
    fn into_input(self) -> Result<EducationInput, ApiError> {
        match (
            non_blank(self.period),
            non_blank(self.institution),
            non_blank(self.degree),
            non_blank(self.location),
        ) {
            (Some(period), Some(institution), Some(degree), Some(location)) => Ok(EducationInput {
                period,
                institution,
                degree,
                location,
            }),
            _ => Err(ApiError::bad_request("Missing required fields")),
        }
    }
}

async fn fetch_all(state: &AppState) -> Result<Vec<Education>, ApiError> {
    state
        .store
        .list_education()
        .await
        .map_err(ApiError::store("Failed to fetch education"))
}

/// GET /api/education
pub async fn list_public(State(state): State<AppState>) -> Result<Json<Vec<Education>>, ApiError> {
    Ok(Json(fetch_all(&state).await?))
}

/// GET /api/admin/education
pub async fn list(
    _session: AdminSession,
    State(state): State<AppState>,
) -> Result<Json<Vec<Education>>, ApiError> {
    Ok(Json(fetch_all(&state).await?))
}

/// POST /api/admin/education
pub async fn create(
    _session: AdminSession,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<EducationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = payload.into_input()?;
    let sort_order = append_position(state.store.as_ref(), COLLECTION).await?;

    let row = state
        .store
        .insert_education(&input, sort_order)
        .await
        .map_err(ApiError::store("Failed to create education"))?;

    tracing::info!(id = %row.id, institution = %row.institution, "Education created");
    Ok((StatusCode::CREATED, Json(row)))
}

/// PUT /api/admin/education
pub async fn update(
    _session: AdminSession,
    State(state): State<AppState>,
    ApiJson(mut payload): ApiJson<EducationRequest>,
) -> Result<Json<Education>, ApiError> {
    let id = parse_id(payload.id.take())?;
    let input = payload.into_input()?;

    let row = state
        .store
        .update_education(id, &input)
        .await
        .map_err(ApiError::store("Failed to update education"))?
        .ok_or_else(|| ApiError::not_found("Education not found"))?;

    tracing::info!(id = %row.id, "Education updated");
    Ok(Json(row))
}

/// DELETE /api/admin/education?id=
pub async fn delete(
    _session: AdminSession,
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let id = parse_id(query.id)?;

    let removed = state
        .store
        .delete(Table::Education, id)
        .await
        .map_err(ApiError::store("Failed to delete education"))?;
    if !removed {
        return Err(ApiError::not_found("Education not found"));
    }

    tracing::info!(id = %id, "Education deleted");
    Ok(Json(SuccessResponse::with_message(
        "Education deleted successfully",
    )))
}

/// POST /api/admin/education/reorder
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

    use crate::db::{models::EducationInput, Store};
    use crate::test_support::TestApp;

    fn input(institution: &str) -> EducationInput {
        EducationInput {
            period: "2014 - 2018".to_string(),
            institution: institution.to_string(),
            degree: "BSc Computer Science".to_string(),
            location: "Lisbon".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_returns_created_row() {
        let app = TestApp::new();
        let (status, row) = app
            .admin_json(
                Method::POST,
                "/api/admin/education",
                json!({
                    "period": "2014 - 2018",
                    "institution": "  University of Lisbon ",
                    "degree": "BSc",
                    "location": "Lisbon",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(row["institution"], "University of Lisbon");
        assert_eq!(row["sort_order"], 1);
    }

    #[tokio::test]
    async fn test_update_requires_id() {
        let app = TestApp::new();
        let (status, body) = app
            .admin_json(
                Method::PUT,
                "/api/admin/education",
                json!({"period": "x", "institution": "y", "degree": "z", "location": "w"}),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "ID is required");
    }

    #[tokio::test]
    async fn test_reorder_with_tied_sort_orders_is_observable() {
        let app = TestApp::new();
        let first = app.store.insert_education(&input("First"), 3).await.unwrap();
        let second = app.store.insert_education(&input("Second"), 3).await.unwrap();
        let before = app.ids("/api/admin/education").await;
        assert_eq!(before.len(), 2);

        let (status, _) = app
            .admin_json(
                Method::POST,
                "/api/admin/education/reorder",
                json!({"id": before[0], "direction": "down"}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let after = app.ids("/api/admin/education").await;
        assert_eq!(after, vec![before[1], before[0]]);
        assert!(after.contains(&first.id) && after.contains(&second.id));
    }

    #[tokio::test]
    async fn test_admin_list_requires_session() {
        let app = TestApp::new();
        let (status, _) = app.get("/api/admin/education").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = app.get("/api/education").await;
        assert_eq!(status, StatusCode::OK);
    }
}

/**
 * Projects Routes
 * Portfolio projects with galleries and technology icons
 */
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::AdminSession;
use crate::db::{
    models::{Project, ProjectInput},
    Table,
};
use crate::error::{ApiError, ApiJson};
use crate::icons::{self, Glyph};
use crate::ordering::{append_position, OrderedCollection};
use crate::routes::{non_blank, non_blank_list, parse_id, IdQuery, ReorderRequest, SuccessResponse};
use crate::state::AppState;

const COLLECTION: OrderedCollection = OrderedCollection::Projects;
const SHORT_DESCRIPTION_CHARS: usize = 150;

#[derive(Debug, Deserialize)]
pub struct ProjectRequest {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub gallery: Option<Vec<String>>,
    pub technologies: Option<Vec<String>>,
    pub year: Option<String>,
    pub github_url: Option<String>,
    pub live_url: Option<String>,
    pub sort_order: Option<i32>,
}

impl ProjectRequest {
    fn into_input(self) -> Result<ProjectInput, ApiError> {
        let (Some(title), Some(description), Some(year)) = (
            non_blank(self.title),
            non_blank(self.description),
            non_blank(self.year),
        ) else {
            return Err(ApiError::bad_request(
                "Title, description, and year are required",
            ));
        };

        let gallery = non_blank_list(self.gallery);
        if gallery.is_empty() {
            return Err(ApiError::bad_request("At least one gallery image is required"));
        }
        let technologies = non_blank_list(self.technologies);
        if technologies.is_empty() {
            return Err(ApiError::bad_request("At least one technology is required"));
        }

        let short_description = non_blank(self.short_description)
            .unwrap_or_else(|| description.chars().take(SHORT_DESCRIPTION_CHARS).collect());

        Ok(ProjectInput {
            title,
            description,
            short_description,
            gallery,
            technologies,
            year,
            github_url: non_blank(self.github_url),
            live_url: non_blank(self.live_url),
            sort_order: self.sort_order,
        })
    }
}

/// Project plus one resolved glyph per entry of `technologies`.
#[derive(Debug, Serialize)]
pub struct PublicProject {
    #[serde(flatten)]
    pub project: Project,
    pub technology_icons: Vec<Glyph>,
}

impl From<Project> for PublicProject {
    fn from(project: Project) -> Self {
        let technology_icons = project
            .technologies
            .iter()
            .map(|tech| icons::resolve(Some(tech.as_str())))
            .collect();
        Self {
            project,
            technology_icons,
        }
    }
}

async fn fetch_all(state: &AppState) -> Result<Vec<Project>, ApiError> {
    state
        .store
        .list_projects()
        .await
        .map_err(ApiError::store("Failed to fetch projects"))
}

/// GET /api/projects
pub async fn list_public(
    State(state): State<AppState>,
) -> Result<Json<Vec<PublicProject>>, ApiError> {
    let projects = fetch_all(&state).await?;
    Ok(Json(projects.into_iter().map(PublicProject::from).collect()))
}

/// GET /api/admin/projects
pub async fn list(
    _session: AdminSession,
    State(state): State<AppState>,
) -> Result<Json<Vec<Project>>, ApiError> {
    Ok(Json(fetch_all(&state).await?))
}

/// POST /api/admin/projects
pub async fn create(
    _session: AdminSession,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ProjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = payload.into_input()?;
    let sort_order = match input.sort_order {
        Some(explicit) => explicit,
        None => append_position(state.store.as_ref(), COLLECTION).await?,
    };

    let project = state
        .store
        .insert_project(&input, sort_order)
        .await
        .map_err(ApiError::store("Failed to create project"))?;

    tracing::info!(id = %project.id, title = %project.title, "Project created");
    Ok((StatusCode::CREATED, Json(project)))
}

/// PUT /api/admin/projects
pub async fn update(
    _session: AdminSession,
    State(state): State<AppState>,
    ApiJson(mut payload): ApiJson<ProjectRequest>,
) -> Result<Json<Project>, ApiError> {
    let id = parse_id(payload.id.take())?;
    let input = payload.into_input()?;

    let project = state
        .store
        .update_project(id, &input)
        .await
        .map_err(ApiError::store("Failed to update project"))?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    tracing::info!(id = %project.id, "Project updated");
    Ok(Json(project))
}

/// DELETE /api/admin/projects?id=
pub async fn delete(
    _session: AdminSession,
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let id = parse_id(query.id)?;

    let removed = state
        .store
        .delete(Table::Projects, id)
        .await
        .map_err(ApiError::store("Failed to delete project"))?;
    if !removed {
        return Err(ApiError::not_found("Project not found"));
    }

    tracing::info!(id = %id, "Project deleted");
    Ok(Json(SuccessResponse::with_message("Project deleted successfully")))
}

/// POST /api/admin/projects/reorder
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
    use serde_json::{json, Value};

    use crate::test_support::TestApp;

    fn project(title: &str) -> Value {
        json!({
            "title": title,
            "description": "A long description of the project",
            "gallery": ["/projects/shot-1.png"],
            "technologies": ["SiReact", "SiRust"],
            "year": "2024",
            "github_url": "",
            "live_url": "https://example.com",
        })
    }

    #[tokio::test]
    async fn test_create_fills_defaults() {
        let app = TestApp::new();
        let mut body = project("Site");
        body["description"] = json!("x".repeat(200));

        let (status, row) = app
            .admin_json(Method::POST, "/api/admin/projects", body)
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(row["short_description"].as_str().unwrap().len(), 150);
        assert!(row["github_url"].is_null());
        assert_eq!(row["live_url"], "https://example.com");
        assert_eq!(row["sort_order"], 1);
    }

    #[tokio::test]
    async fn test_create_validates_required_fields() {
        let app = TestApp::new();

        let mut body = project("Site");
        body["year"] = json!("");
        let (status, err) = app
            .admin_json(Method::POST, "/api/admin/projects", body)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"], "Title, description, and year are required");

        let mut body = project("Site");
        body["gallery"] = json!([]);
        let (_, err) = app
            .admin_json(Method::POST, "/api/admin/projects", body)
            .await;
        assert_eq!(err["error"], "At least one gallery image is required");

        let mut body = project("Site");
        body["technologies"] = json!([]);
        let (_, err) = app
            .admin_json(Method::POST, "/api/admin/projects", body)
            .await;
        assert_eq!(err["error"], "At least one technology is required");
    }

    #[tokio::test]
    async fn test_explicit_sort_order_is_kept_on_update() {
        let app = TestApp::new();
        let id = app.create("/api/admin/projects", project("Site")).await;

        let mut body = project("Site v2");
        body["id"] = json!(id);
        body["sort_order"] = json!(9);
        let (status, row) = app
            .admin_json(Method::PUT, "/api/admin/projects", body)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(row["title"], "Site v2");
        assert_eq!(row["sort_order"], 9);

        let mut body = project("Site v3");
        body["id"] = json!(id);
        let (_, row) = app
            .admin_json(Method::PUT, "/api/admin/projects", body)
            .await;
        assert_eq!(row["sort_order"], 9);
    }

    #[tokio::test]
    async fn test_public_list_carries_technology_icons() {
        let app = TestApp::new();
        app.create("/api/admin/projects", project("Site")).await;

        let (status, rows) = app.get("/api/projects").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(rows[0]["title"], "Site");
        assert_eq!(
            rows[0]["technology_icons"],
            json!([{"kind": "simple_icon", "slug": "react"}, {"kind": "unknown"}])
        );
    }

    #[tokio::test]
    async fn test_reorder_last_item_down_is_rejected() {
        let app = TestApp::new();
        let a = app.create("/api/admin/projects", project("A")).await;
        let b = app.create("/api/admin/projects", project("B")).await;

        let (status, _) = app
            .admin_json(
                Method::POST,
                "/api/admin/projects/reorder",
                json!({"id": b, "direction": "down"}),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .admin_json(
                Method::POST,
                "/api/admin/projects/reorder",
                json!({"id": b, "direction": "up"}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(app.ids("/api/admin/projects").await, vec![b, a]);
    }

    #[tokio::test]
    async fn test_reorder_moves_one_step_when_swap_would_tie() {
        let app = TestApp::new();
        for (title, order) in [("P1", 1), ("P2", 2), ("P3", 2)] {
            let mut body = project(title);
            body["sort_order"] = json!(order);
            app.create("/api/admin/projects", body).await;
        }

        let before = app.ids("/api/admin/projects").await;
        let (status, _) = app
            .admin_json(
                Method::POST,
                "/api/admin/projects/reorder",
                json!({"id": before[0], "direction": "down"}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            app.ids("/api/admin/projects").await,
            vec![before[1], before[0], before[2]]
        );
    }
}

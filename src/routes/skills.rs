/**
 * Skills Routes
 * Categorized skills with icons; admin CRUD and reorder
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
    models::{Skill, SkillCategory, SkillInput},
    Table,
};
use crate::error::{ApiError, ApiJson};
use crate::icons::{self, Glyph};
use crate::ordering::{append_position, OrderedCollection};
use crate::routes::{non_blank, parse_id, IdQuery, ReorderRequest, SuccessResponse};
use crate::state::AppState;

const COLLECTION: OrderedCollection = OrderedCollection::Skills;

#[derive(Debug, Deserialize)]
pub struct SkillRequest {
    pub id: Option<String>,
    pub name: Option<String>,
    pub categories: Option<Vec<String>>,
    /// Single-category form sent by older dashboard builds.
    pub category: Option<String>,
    pub icon_name: Option<String>,
}

/// Skill as the public site renders it.
#[derive(Debug, Serialize)]
pub struct PublicSkill {
    pub name: String,
    pub categories: Vec<SkillCategory>,
    pub icon_name: Option<String>,
    pub icon: Glyph,
}

impl From<Skill> for PublicSkill {
    fn from(skill: Skill) -> Self {
        Self {
            icon: icons::resolve(skill.icon_name.as_deref()),
            name: skill.name,
            categories: skill.categories,
            icon_name: skill.icon_name,
        }
    }
}

/// Parses category names into a duplicate-free list, keeping first-seen order.
pub fn parse_categories(raw: &[String]) -> Result<Vec<SkillCategory>, ApiError> {
    let mut categories = Vec::new();
    let mut invalid = Vec::new();

    for value in raw.iter().map(|v| v.trim()).filter(|v| !v.is_empty()) {
        match value.parse::<SkillCategory>() {
            Ok(category) if !categories.contains(&category) => categories.push(category),
            Ok(_) => {}
            Err(()) => invalid.push(value),
        }
    }

    if !invalid.is_empty() {
        return Err(ApiError::bad_request(format!(
            "Invalid categories: {}",
            invalid.join(", ")
        )));
    }
    if categories.is_empty() {
        return Err(ApiError::bad_request("At least one category is required"));
    }
    Ok(categories)
}

impl SkillRequest {
    fn into_input(self) -> Result<SkillInput, ApiError> {
        let name = non_blank(self.name).ok_or_else(|| ApiError::bad_request("Name is required"))?;

        let raw = match (self.categories, non_blank(self.category)) {
            (Some(list), _) if !list.is_empty() => list,
            (_, Some(single)) => vec![single],
            _ => return Err(ApiError::bad_request("At least one category is required")),
        };

        Ok(SkillInput {
            name,
            categories: parse_categories(&raw)?,
            icon_name: non_blank(self.icon_name),
        })
    }
}

async fn fetch_all(state: &AppState) -> Result<Vec<Skill>, ApiError> {
    state
        .store
        .list_skills()
        .await
        .map_err(ApiError::store("Failed to fetch skills"))
}

/// GET /api/skills
pub async fn list_public(
    State(state): State<AppState>,
) -> Result<Json<Vec<PublicSkill>>, ApiError> {
    let skills = fetch_all(&state).await?;
    Ok(Json(skills.into_iter().map(PublicSkill::from).collect()))
}

/// GET /api/admin/skills
pub async fn list(
    _session: AdminSession,
    State(state): State<AppState>,
) -> Result<Json<Vec<Skill>>, ApiError> {
    Ok(Json(fetch_all(&state).await?))
}

/// POST /api/admin/skills
pub async fn create(
    _session: AdminSession,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SkillRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = payload.into_input()?;
    let sort_order = append_position(state.store.as_ref(), COLLECTION).await?;

    let skill = state
        .store
        .insert_skill(&input, sort_order)
        .await
        .map_err(ApiError::store("Failed to create skill"))?;

    tracing::info!(id = %skill.id, name = %skill.name, "Skill created");
    Ok((StatusCode::CREATED, Json(skill)))
}

/// PUT /api/admin/skills
pub async fn update(
    _session: AdminSession,
    State(state): State<AppState>,
    ApiJson(mut payload): ApiJson<SkillRequest>,
) -> Result<Json<Skill>, ApiError> {
    let id = parse_id(payload.id.take())?;
    let input = payload.into_input()?;

    let skill = state
        .store
        .update_skill(id, &input)
        .await
        .map_err(ApiError::store("Failed to update skill"))?
        .ok_or_else(|| ApiError::not_found("Skill not found"))?;

    tracing::info!(id = %skill.id, "Skill updated");
    Ok(Json(skill))
}

/// DELETE /api/admin/skills?id=
pub async fn delete(
    _session: AdminSession,
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let id = parse_id(query.id)?;

    let removed = state
        .store
        .delete(Table::Skills, id)
        .await
        .map_err(ApiError::store("Failed to delete skill"))?;
    if !removed {
        return Err(ApiError::not_found("Skill not found"));
    }

    tracing::info!(id = %id, "Skill deleted");
    Ok(Json(SuccessResponse::with_message("Skill deleted successfully")))
}

/// POST /api/admin/skills/reorder
pub async fn reorder(
    _session: AdminSession,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ReorderRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    crate::routes::reorder(state.store.as_ref(), COLLECTION, payload).await
}

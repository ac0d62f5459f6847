use axum::Json;
use serde::Serialize;

use crate::icons::{IconOption, CATALOG};

#[derive(Debug, Serialize)]
pub struct IconCatalogResponse {
    pub icons: &'static [IconOption],
}

/// GET /api/icons - icons the dashboard can assign to skills and technologies
pub async fn list_icons() -> Json<IconCatalogResponse> {
    Json(IconCatalogResponse { icons: CATALOG })
}

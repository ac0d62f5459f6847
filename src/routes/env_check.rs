/**
 * Environment Check
 * Reports which settings are configured, never their values
 */
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::auth::AdminSession;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct EnvCheckResponse {
    pub environment: String,
    pub store_backend: String,
    pub database_url: bool,
    pub session_secret: bool,
    pub email_api_key: bool,
    pub notification_recipient: bool,
    pub sender_address: bool,
    pub public_dir: bool,
}

/// GET /api/admin/check-env
pub async fn check_env(
    _session: AdminSession,
    State(state): State<AppState>,
) -> Json<EnvCheckResponse> {
    let config = &state.config;
    let public_dir = tokio::fs::metadata(&config.public_dir)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false);

    Json(EnvCheckResponse {
        environment: config.environment.clone(),
        store_backend: state.store.backend().to_string(),
        database_url: config.database.is_some(),
        session_secret: !config.has_default_secret(),
        email_api_key: config.email.api_key.is_some(),
        notification_recipient: config.email.recipient.is_some(),
        sender_address: !config.email.from.is_empty(),
        public_dir,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    use crate::test_support::TestApp;

    #[tokio::test]
    async fn test_reports_flags_only() {
        let app = TestApp::new();
        let (status, body) = app.admin_get("/api/admin/check-env").await;
        assert_eq!(status, StatusCode::OK);

        let report: EnvCheckResponse = serde_json::from_value(body.clone()).unwrap();
        assert_eq!(report.store_backend, "memory");
        assert!(!report.database_url);
        assert!(report.session_secret);
        assert!(!report.email_api_key);
        assert!(report.public_dir);
        assert!(!body.to_string().contains("test-session-secret"));
    }

    #[tokio::test]
    async fn test_requires_session() {
        let app = TestApp::new();
        let (status, _) = app.get("/api/admin/check-env").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

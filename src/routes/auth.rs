/**
 * Authentication Routes
 * Admin login, logout, and session lookup over the session cookie
 */
use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::{
    clear_cookie, issue_token, session_cookie, verify_credentials, AdminSession, SessionUser,
};
use crate::error::{ApiError, ApiJson};
use crate::routes::{non_blank, SuccessResponse};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize, Serialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: SessionUser,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub authenticated: bool,
    pub user: SessionUser,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/admin/login
/// Verifies credentials and sets the session cookie
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Passwords are not trimmed; only emptiness counts as missing.
    let email = non_blank(payload.email);
    let password = payload.password.filter(|p| !p.is_empty());
    let (Some(email), Some(password)) = (email, password) else {
        return Err(ApiError::bad_request("Email and password are required"));
    };

    let user = verify_credentials(state.store.as_ref(), &email, &password)
        .await
        .ok_or(ApiError::InvalidCredentials)?;

    let token = issue_token(&user, &state.config.session_secret).map_err(|e| {
        tracing::error!("Failed to issue session token: {}", e);
        ApiError::Internal("Failed to create session".to_string())
    })?;

    tracing::info!(admin_id = %user.id, "Successful admin login: {}", user.email);

    Ok((
        [(
            header::SET_COOKIE,
            session_cookie(&token, state.config.secure_cookies()),
        )],
        Json(LoginResponse {
            success: true,
            user,
        }),
    ))
}

/// POST /api/admin/logout
/// Expires the session cookie. Idempotent.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::SET_COOKIE, clear_cookie(state.config.secure_cookies()))],
        Json(SuccessResponse::ok()),
    )
}

/// GET /api/admin/session
pub async fn session(AdminSession(user): AdminSession) -> Json<SessionResponse> {
    Json(SessionResponse {
        authenticated: true,
        user,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use serde_json::json;

    use crate::test_support::{TestApp, ADMIN_EMAIL, ADMIN_PASSWORD};

    fn login_request(email: &str, password: &str) -> Request<Body> {
        Request::post("/api/admin/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({"email": email, "password": password}).to_string(),
            ))
            .unwrap()
    }

    #[tokio::test]
    async fn test_login_sets_session_cookie() {
        let app = TestApp::new();
        let (status, headers, body) = app.send(login_request(ADMIN_EMAIL, ADMIN_PASSWORD)).await;
        assert_eq!(status, StatusCode::OK);

        let cookie = headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("admin_session="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=604800"));

        let body: LoginResponse = serde_json::from_slice(&body).unwrap();
        assert!(body.success);
        assert_eq!(body.user.email, ADMIN_EMAIL);
        assert_eq!(body.user.role, "admin");

        // The issued cookie opens the session endpoint.
        let token_pair = cookie.split(';').next().unwrap().to_string();
        let request = Request::get("/api/admin/session")
            .header(header::COOKIE, token_pair)
            .body(Body::empty())
            .unwrap();
        let (status, _, body) = app.send(request).await;
        assert_eq!(status, StatusCode::OK);
        let session: SessionResponse = serde_json::from_slice(&body).unwrap();
        assert!(session.authenticated);
        assert_eq!(session.user.email, ADMIN_EMAIL);
    }

    #[tokio::test]
    async fn test_login_wrong_password_returns_unauthorized() {
        let app = TestApp::new();
        let (status, headers, body) = app.send(login_request(ADMIN_EMAIL, "nope")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(headers.get(header::SET_COOKIE).is_none());
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "Invalid email or password");
    }

    #[tokio::test]
    async fn test_login_unknown_email_matches_wrong_password_response() {
        let app = TestApp::new();
        let (status, _, body) = app
            .send(login_request("stranger@example.com", ADMIN_PASSWORD))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "Invalid email or password");
    }

    #[tokio::test]
    async fn test_login_empty_fields_return_bad_request() {
        let app = TestApp::new();
        let (status, body) = app
            .json(Method::POST, "/api/admin/login", json!({"email": ADMIN_EMAIL}))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Email and password are required");
    }

    #[tokio::test]
    async fn test_session_rejects_missing_and_forged_cookies() {
        let app = TestApp::new();
        let (status, body) = app.get("/api/admin/session").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");

        let forged = Request::get("/api/admin/session")
            .header(header::COOKIE, "admin_session=true")
            .body(Body::empty())
            .unwrap();
        let (status, _, _) = app.send(forged).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_expires_cookie() {
        let app = TestApp::new();
        let request = Request::post("/api/admin/logout").body(Body::empty()).unwrap();
        let (status, headers, _) = app.send(request).await;
        assert_eq!(status, StatusCode::OK);
        let cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.contains("Max-Age=0"));
    }
}

/**
 * Admin sessions
 * Signed JWT in the `admin_session` cookie, plus the login verification chain
 */
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::db::{models::AdminUser, Store};
use crate::error::ApiError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "admin_session";

/// Session lifetime; the cookie's Max-Age and the token's `exp` agree.
pub const SESSION_TTL_SECS: i64 = 7 * 24 * 60 * 60;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// Admin identity carried by a session and returned to the dashboard.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: String,
}

impl From<&AdminUser> for SessionUser {
    fn from(admin: &AdminUser) -> Self {
        Self {
            id: admin.id,
            email: admin.email.clone(),
            name: admin.name.clone(),
            role: admin.role.clone(),
        }
    }
}

impl From<SessionClaims> for SessionUser {
    fn from(claims: SessionClaims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            name: claims.name,
            role: claims.role,
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no session cookie")]
    Missing,

    #[error("invalid session token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

// ============================================================================
// Tokens and cookies
// ============================================================================

pub fn issue_token(user: &SessionUser, secret: &str) -> Result<String, SessionError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(SESSION_TTL_SECS);

    let claims = SessionClaims {
        sub: user.id,
        email: user.email.clone(),
        name: user.name.clone(),
        role: user.role.clone(),
        iat: now.timestamp(),
        exp: exp.timestamp(),
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

/// Checks the signature and expiry (no leeway) of a session token.
pub fn verify_token(token: &str, secret: &str) -> Result<SessionClaims, SessionError> {
    let mut validation = Validation::default();
    validation.leeway = 0;
    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;
    Ok(data.claims)
}

pub fn session_cookie(token: &str, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={SESSION_TTL_SECS}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn clear_cookie(secure: bool) -> String {
    let mut cookie = format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Value of cookie `name` across all `Cookie` headers.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn session_from_headers(headers: &HeaderMap, secret: &str) -> Result<SessionUser, SessionError> {
    let token = read_cookie(headers, SESSION_COOKIE).ok_or(SessionError::Missing)?;
    Ok(verify_token(&token, secret)?.into())
}

// ============================================================================
// Extractor
// ============================================================================

/// Proof of a valid admin session. Put it first in a handler's arguments so
/// the request is rejected before the body is read.
#[derive(Debug, Clone)]
pub struct AdminSession(pub SessionUser);

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match session_from_headers(&parts.headers, &state.config.session_secret) {
            Ok(user) => Ok(AdminSession(user)),
            Err(e) => {
                tracing::debug!(path = %parts.uri.path(), "Rejected admin request: {}", e);
                Err(ApiError::Unauthorized)
            }
        }
    }
}

// ============================================================================
// Credential verification
// ============================================================================

/// Runs the login verification chain. Returns the admin only when a check
/// affirmatively succeeds; every failure is logged here and reported to the
/// caller as `None`.
pub async fn verify_credentials(
    store: &dyn Store,
    email: &str,
    password: &str,
) -> Option<SessionUser> {
    let admin = match store.find_admin_by_email(email).await {
        Ok(Some(admin)) if admin.is_active => admin,
        Ok(Some(_)) => {
            tracing::warn!(email = %email, "Login rejected: admin is inactive");
            return None;
        }
        Ok(None) => {
            tracing::warn!(email = %email, "Login rejected: unknown admin");
            return None;
        }
        Err(e) => {
            tracing::error!(email = %email, "Admin lookup failed: {}", e);
            return None;
        }
    };

    let verified = match store.verify_crypt_password(password, &admin.password_hash).await {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!("Primary password check failed, trying direct check: {}", e);
            match store.verify_password_direct(&admin.email, password).await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!("Direct password check failed: {}", e);
                    false
                }
            }
        }
    };

    if !verified {
        tracing::warn!(email = %email, "Login rejected: wrong password");
        return None;
    }

    if let Err(e) = store.record_login(admin.id).await {
        tracing::warn!(admin_id = %admin.id, "Failed to record last login: {}", e);
    }

    Some(SessionUser::from(&admin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use axum::http::HeaderValue;

    const SECRET: &str = "unit-test-secret";

    fn user() -> SessionUser {
        SessionUser {
            id: Uuid::new_v4(),
            email: "owner@example.com".to_string(),
            name: Some("Owner".to_string()),
            role: "admin".to_string(),
        }
    }

    #[test]
    fn test_token_round_trip() {
        let user = user();
        let token = issue_token(&user, SECRET).unwrap();
        let claims = verify_token(&token, SECRET).unwrap();
        assert_eq!(claims.exp - claims.iat, SESSION_TTL_SECS);
        assert_eq!(SessionUser::from(claims), user);
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let token = issue_token(&user(), "another-secret").unwrap();
        assert!(verify_token(&token, SECRET).is_err());
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let token = issue_token(&user(), SECRET).unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged_payload = parts[1].chars().rev().collect::<String>();
        parts[1] = &forged_payload;
        assert!(verify_token(&parts.join("."), SECRET).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let user = user();
        let claims = SessionClaims {
            sub: user.id,
            email: user.email,
            name: None,
            role: user.role,
            iat: Utc::now().timestamp() - 100,
            exp: Utc::now().timestamp() - 10,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(verify_token(&token, SECRET).is_err());
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("abc", false);
        assert!(cookie.starts_with("admin_session=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=604800"));
        assert!(!cookie.contains("Secure"));
        assert!(session_cookie("abc", true).ends_with("; Secure"));
        assert!(clear_cookie(false).contains("Max-Age=0"));
    }

    #[test]
    fn test_read_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark; admin_session=tok"));
        headers.append(header::COOKIE, HeaderValue::from_static("other=1"));
        assert_eq!(read_cookie(&headers, "admin_session").as_deref(), Some("tok"));
        assert_eq!(read_cookie(&headers, "other").as_deref(), Some("1"));
        assert!(read_cookie(&headers, "missing").is_none());
    }

    #[test]
    fn test_missing_cookie_is_missing_session() {
        let headers = HeaderMap::new();
        assert!(matches!(
            session_from_headers(&headers, SECRET),
            Err(SessionError::Missing)
        ));
    }

    #[tokio::test]
    async fn test_verify_credentials() {
        let hash = bcrypt::hash("correct horse", 4).unwrap();
        let store = MemoryStore::new().with_admin("owner@example.com", Some("Owner"), &hash);

        let user = verify_credentials(&store, "Owner@Example.com", "correct horse")
            .await
            .unwrap();
        assert_eq!(user.email, "owner@example.com");
        assert!(store.admin("owner@example.com").await.unwrap().last_login.is_some());

        assert!(verify_credentials(&store, "owner@example.com", "wrong").await.is_none());
        assert!(verify_credentials(&store, "nobody@example.com", "correct horse")
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_verify_credentials_rejects_inactive_admin() {
        let hash = bcrypt::hash("correct horse", 4).unwrap();
        let store = MemoryStore::new().with_admin("owner@example.com", None, &hash);
        store.deactivate_admin("owner@example.com").await;
        assert!(verify_credentials(&store, "owner@example.com", "correct horse")
            .await
            .is_none());
    }
}

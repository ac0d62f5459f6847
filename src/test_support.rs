//! Shared fixtures for router tests: an app over `MemoryStore`, a recording
//! notifier, and request helpers.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use crate::auth::{issue_token, SessionUser, SESSION_COOKIE};
use crate::config::Config;
use crate::db::{models::Contact, MemoryStore};
use crate::notify::{ContactNotifier, NotifyError};
use crate::state::AppState;

pub const ADMIN_EMAIL: &str = "owner@example.com";
pub const ADMIN_PASSWORD: &str = "correct horse battery";

/// Records every contact it is asked about; optionally fails each call.
#[derive(Default)]
pub struct RecordingNotifier {
    pub fail: bool,
    pub sent: Mutex<Vec<Uuid>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Uuid> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ContactNotifier for RecordingNotifier {
    async fn notify(&self, contact: &Contact) -> Result<(), NotifyError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(contact.id);
        }
        if self.fail {
            return Err(NotifyError::Rejected {
                status: 500,
                body: "mail server down".to_string(),
            });
        }
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub public_dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(false)
    }

    pub fn with_failing_notifier() -> Self {
        Self::build(true)
    }

    fn build(fail_notifications: bool) -> Self {
        let public_dir = tempfile::tempdir().unwrap();
        let hash = bcrypt::hash(ADMIN_PASSWORD, 4).unwrap();
        let store = Arc::new(MemoryStore::new().with_admin(ADMIN_EMAIL, Some("Owner"), &hash));
        let notifier = Arc::new(RecordingNotifier {
            fail: fail_notifications,
            ..Default::default()
        });
        let state = AppState::new(
            Config::for_tests(public_dir.path().to_path_buf()),
            store.clone(),
            notifier.clone(),
        );
        Self {
            router: crate::create_app(state.clone()),
            state,
            store,
            notifier,
            public_dir,
        }
    }

    /// `Cookie` header value carrying a valid admin session.
    pub fn session_cookie(&self) -> String {
        let user = SessionUser {
            id: Uuid::new_v4(),
            email: ADMIN_EMAIL.to_string(),
            name: Some("Owner".to_string()),
            role: "admin".to_string(),
        };
        let token = issue_token(&user, &self.state.config.session_secret).unwrap();
        format!("{SESSION_COOKIE}={token}")
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, body)
    }

    async fn send_json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, _, body) = self.send(request).await;
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send_json(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn json(&self, method: Method, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send_json(request).await
    }

    pub async fn admin_get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::get(uri)
            .header(header::COOKIE, self.session_cookie())
            .body(Body::empty())
            .unwrap();
        self.send_json(request).await
    }

    pub async fn admin_json(&self, method: Method, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::COOKIE, self.session_cookie())
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send_json(request).await
    }

    pub async fn admin_delete(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::delete(uri)
            .header(header::COOKIE, self.session_cookie())
            .body(Body::empty())
            .unwrap();
        self.send_json(request).await
    }

    /// Creates a row through the admin API and returns its id.
    pub async fn create(&self, uri: &str, body: Value) -> Uuid {
        let (status, row) = self.admin_json(Method::POST, uri, body).await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {row}");
        row["id"].as_str().unwrap().parse().unwrap()
    }

    /// Ids from a list endpoint, in response order.
    pub async fn ids(&self, uri: &str) -> Vec<Uuid> {
        let (status, rows) = self.admin_get(uri).await;
        assert_eq!(status, StatusCode::OK);
        rows.as_array()
            .unwrap()
            .iter()
            .map(|row| row["id"].as_str().unwrap().parse().unwrap())
            .collect()
    }
}

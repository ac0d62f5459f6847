use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::db::StoreError;

/// Error body shared by every route.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    /// 400 whose parser detail is passed back in `message`.
    #[error("{error}")]
    Malformed { error: &'static str, detail: String },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{context}")]
    Store {
        context: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn malformed(error: &'static str, detail: impl Into<String>) -> Self {
        Self::Malformed {
            error,
            detail: detail.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Wraps a store failure; `context` is what the client sees.
    pub fn store(context: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::Store { context, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Malformed { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Store { .. } | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Store details stay in the logs, never in the body.
        if let ApiError::Store { context, source } = &self {
            tracing::error!(error = %source, "{}", context);
        }

        let status = self.status();
        let message = match &self {
            ApiError::Malformed { detail, .. } => Some(detail.clone()),
            _ => None,
        };
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
                message,
            }),
        )
            .into_response()
    }
}

/// JSON body extractor whose rejection is an `ApiError` (400) instead of axum's plain-text 422.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => {
                tracing::debug!("Rejected JSON body: {}", rejection.body_text());
                Err(match rejection {
                    JsonRejection::MissingJsonContentType(_) => {
                        ApiError::bad_request("Expected a JSON body")
                    }
                    r if r.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                        ApiError::PayloadTooLarge("Request body too large".to_string())
                    }
                    r => ApiError::malformed("Invalid JSON body", r.body_text()),
                })
            }
        }
    }
}

/// Failures that stop the server from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("session secret must be set to a unique value in production")]
    InsecureSecret,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid bind address {0}")]
    BindAddress(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

use std::path::{Component, Path, PathBuf};

use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use rand::distr::{Alphanumeric, SampleString};
use serde::{Deserialize, Serialize};

use crate::auth::AdminSession;
use crate::error::ApiError;
use crate::routes::{non_blank, SuccessResponse};
use crate::state::AppState;

/// URL prefix under which uploaded project images are served.
pub const PROJECTS_URL_PREFIX: &str = "/projects/";

const FILE_FIELDS: &[&str] = &["files", "files[]"];
const DEFAULT_EXTENSION: &str = "jpg";

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub files: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteImageQuery {
    pub path: Option<String>,
}

struct ImageFile {
    original_name: String,
    extension: &'static str,
    bytes: Bytes,
}

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

fn extension_from_mime(mime: &str) -> Option<&'static str> {
    match mime {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Extension for a stored upload. The client's extension is kept only when
/// it is a known raster image type; otherwise the declared MIME type decides.
fn image_extension(file_name: &str, content_type: &str) -> &'static str {
    let from_name = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    from_name
        .and_then(|ext| ALLOWED_EXTENSIONS.iter().copied().find(|allowed| *allowed == ext))
        .or_else(|| extension_from_mime(content_type))
        .unwrap_or(DEFAULT_EXTENSION)
}

/// `project-<unix_millis>-<random6>.<ext>`
fn generate_file_name(extension: &str) -> String {
    let suffix = Alphanumeric
        .sample_string(&mut rand::rng(), 6)
        .to_ascii_lowercase();
    format!(
        "project-{}-{}.{}",
        Utc::now().timestamp_millis(),
        suffix,
        extension
    )
}

/// Path of a `/projects/...` URL relative to the public dir, if every
/// component is a plain name.
fn relative_image_path(url_path: &str) -> Option<PathBuf> {
    let relative = Path::new(url_path.trim_start_matches('/'));
    let mut components = 0;
    for component in relative.components() {
        match component {
            Component::Normal(_) => components += 1,
            _ => return None,
        }
    }
    (components > 1).then(|| relative.to_path_buf())
}

fn multipart_error(e: MultipartError) -> ApiError {
    tracing::warn!("Multipart error: {}", e.body_text());
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("Upload too large".to_string())
    } else {
        ApiError::malformed("Invalid multipart data", e.body_text())
    }
}

/// POST /api/admin/upload
pub async fn upload_images(
    _session: AdminSession,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut file_fields = 0usize;
    let mut images = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if !field.name().is_some_and(|name| FILE_FIELDS.contains(&name)) {
            continue;
        }
        file_fields += 1;

        let original_name = field.file_name().unwrap_or("unknown").to_string();
        let content_type = field.content_type().unwrap_or("").to_string();
        if !content_type.starts_with("image/") {
            tracing::warn!(
                file = %original_name,
                content_type = %content_type,
                "Skipping non-image upload"
            );
            continue;
        }

        let bytes = field.bytes().await.map_err(multipart_error)?;
        images.push(ImageFile {
            extension: image_extension(&original_name, &content_type),
            original_name,
            bytes,
        });
    }

    if file_fields == 0 {
        return Err(ApiError::bad_request("No files provided"));
    }
    if images.is_empty() {
        return Err(ApiError::bad_request("No valid image files uploaded"));
    }

    let upload_dir = state.config.projects_dir();
    if let Err(e) = tokio::fs::create_dir_all(&upload_dir).await {
        tracing::error!("Failed to create upload directory {:?}: {}", upload_dir, e);
        return Err(ApiError::Internal(
            "Failed to initialize upload directory".to_string(),
        ));
    }

    let mut files = Vec::with_capacity(images.len());
    for image in images {
        let file_name = generate_file_name(image.extension);
        match tokio::fs::write(upload_dir.join(&file_name), &image.bytes).await {
            Ok(()) => {
                tracing::info!(
                    file = %file_name,
                    original = %image.original_name,
                    size = image.bytes.len(),
                    "Image uploaded"
                );
                files.push(format!("{PROJECTS_URL_PREFIX}{file_name}"));
            }
            Err(e) => {
                tracing::error!(file = %image.original_name, "Failed to write upload: {}", e);
            }
        }
    }

    if files.is_empty() {
        return Err(ApiError::bad_request("No valid image files uploaded"));
    }
    Ok(Json(UploadResponse { files }))
}

/// DELETE /api/admin/delete-image?path=/projects/<file>
pub async fn delete_image(
    _session: AdminSession,
    State(state): State<AppState>,
    Query(query): Query<DeleteImageQuery>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let path = non_blank(query.path).ok_or_else(|| ApiError::bad_request("Image path is required"))?;
    if !path.starts_with(PROJECTS_URL_PREFIX) {
        return Err(ApiError::bad_request("Invalid image path"));
    }
    let relative =
        relative_image_path(&path).ok_or_else(|| ApiError::bad_request("Invalid file path"))?;

    let file_path = state.config.public_dir.join(relative);
    match tokio::fs::metadata(&file_path).await {
        Ok(meta) if meta.is_file() => {}
        _ => return Err(ApiError::not_found("File not found")),
    }

    if let Err(e) = tokio::fs::remove_file(&file_path).await {
        tracing::error!("Failed to delete file {:?}: {}", file_path, e);
        return Err(ApiError::Internal("Failed to delete file".to_string()));
    }

    tracing::info!("Image deleted: {}", path);
    Ok(Json(SuccessResponse::with_message("File deleted successfully")))
}

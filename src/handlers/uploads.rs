use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::{auth::AdminSession, errors::ServiceError, AppState};

/// Maximum accepted upload size (5 MB)
const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Creates the router for image upload endpoints
pub fn upload_routes() -> Router<Arc<AppState>> {
    Router::new().route("/", post(upload_image))
}

/// Accept a product image (admin): multipart field `file`, jpeg/png/webp,
/// up to 5 MB. Returns the public URL to store as the product image.
#[utoipa::path(
    post,
    path = "/api/v1/uploads",
    responses(
        (status = 201, description = "Image stored, URL returned"),
        (status = 400, description = "Missing, oversized or invalid file", body = crate::errors::ErrorResponse),
        (status = 401, description = "Admin session required", body = crate::errors::ErrorResponse),
    ),
    tag = "uploads"
)]
pub async fn upload_image(
    _session: AdminSession,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ServiceError> {
    let mut data: Option<(Vec<u8>, String)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ServiceError::ValidationError(format!("Invalid multipart request: {}", e))
    })? {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("upload").to_string();
            let bytes = field.bytes().await.map_err(|e| {
                ServiceError::ValidationError(format!("Failed to read upload: {}", e))
            })?;
            data = Some((bytes.to_vec(), filename));
            break;
        }
    }

    let (bytes, original_name) = data.ok_or_else(|| {
        ServiceError::ValidationError("No 'file' field found in upload".to_string())
    })?;

    if bytes.is_empty() {
        return Err(ServiceError::ValidationError(
            "Empty file provided".to_string(),
        ));
    }
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(ServiceError::ValidationError(format!(
            "File too large; maximum size is {} MB",
            MAX_UPLOAD_BYTES / 1024 / 1024
        )));
    }

    let format = image::guess_format(&bytes).map_err(|_| {
        ServiceError::ValidationError("Unrecognized image format".to_string())
    })?;
    let extension = match format {
        image::ImageFormat::Jpeg => "jpg",
        image::ImageFormat::Png => "png",
        image::ImageFormat::WebP => "webp",
        other => {
            return Err(ServiceError::ValidationError(format!(
                "Unsupported image format {:?}; allowed: jpeg, png, webp",
                other
            )))
        }
    };

    // Decode fully so a mislabeled or truncated file is rejected here
    image::load_from_memory(&bytes)
        .map_err(|e| ServiceError::ValidationError(format!("Invalid image: {}", e)))?;

    let uploads_dir = Path::new(&state.config.uploads_dir);
    tokio::fs::create_dir_all(uploads_dir).await.map_err(|e| {
        ServiceError::InternalError(format!("Failed to create uploads directory: {}", e))
    })?;

    let filename = format!("{}.{}", Uuid::new_v4(), extension);
    let path = uploads_dir.join(&filename);
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| ServiceError::InternalError(format!("Failed to store upload: {}", e)))?;

    info!(
        original_name = %original_name,
        stored = %filename,
        size = bytes.len(),
        "Image uploaded"
    );

    Ok((
        axum::http::StatusCode::CREATED,
        Json(json!({ "url": format!("/uploads/{}", filename) })),
    ))
}

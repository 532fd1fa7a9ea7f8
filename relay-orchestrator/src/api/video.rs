//! Artifact download handler

use axum::{
    body::Body,
    extract::{Path, Request, State},
    http::StatusCode,
    response::Response,
};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};
use crate::service::poller::is_filename_char;

const VIDEO_EXTENSION: &str = ".mp4";

/// GET /videos/{filename}
///
/// Streams the file from disk; range and conditional requests are honoured.
pub async fn get_video(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    request: Request,
) -> ApiResult<Response> {
    if !filename.ends_with(VIDEO_EXTENSION) {
        return Err(ApiError::BadRequest(format!(
            "Only {} files are served",
            VIDEO_EXTENSION
        )));
    }
    if filename.starts_with('.') || !filename.chars().all(is_filename_char) {
        return Err(ApiError::BadRequest("Invalid file name".to_string()));
    }

    let path = state.config.artifact_dir.join(&filename);
    let response = match ServeFile::new(path).oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };

    if response.status() == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound(format!("Video {} not found", filename)));
    }

    Ok(response.map(Body::new))
}

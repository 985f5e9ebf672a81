//! Download handler

use crate::{ApiError, AppState};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};
use filegate_store::{ObjectBody, DEFAULT_CONTENT_TYPE};
use futures::{stream, StreamExt, TryStreamExt};
use std::sync::Arc;

/// GET /download/{filename} - Stream an object back as an attachment
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let bucket = state.bucket()?;

    let object = state
        .store
        .get_object(bucket, &filename)
        .await
        .map_err(|e| ApiError::store("Error processing request", e))?
        .ok_or_else(|| ApiError::NotFound("File not found".to_string()))?;

    let ObjectBody {
        content_type,
        content_length,
        mut stream,
    } = object;

    // Pull the first chunk before committing to a 200 so an immediate read
    // failure still turns into a 500
    let first = stream
        .next()
        .await
        .transpose()
        .map_err(|e| ApiError::store("Error reading file", e))?;

    let key = filename.clone();
    let rest = stream.inspect_err(move |e| {
        tracing::error!(key = %key, error = %e, "Error streaming file from object store");
    });
    let body = stream::iter(first.map(Ok)).chain(rest);

    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(
            header::CONTENT_TYPE,
            content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE),
        )
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={}", filename),
        );

    if let Some(len) = content_length {
        response = response.header(header::CONTENT_LENGTH, len);
    }

    tracing::debug!(key = %filename, "Streaming download");
    Ok(response.body(Body::from_stream(body))?)
}

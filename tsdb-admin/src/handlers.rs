//! HTTP handlers for the admin API
//!
//! Thin transport layer: decode requests, call [`AdminService`], and map
//! [`AdminError`] onto HTTP status codes. Remote write takes a
//! newline-delimited JSON body, one `WriteRequest` per line, read lazily.

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use futures::{Stream, TryStreamExt};
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::io::AsyncBufReadExt;
use tokio_util::io::StreamReader;
use tracing::{error, trace, warn};

use crate::{
    api::{DeleteSeriesRequest, SnapshotRequest, WriteRequest},
    error::{AdminError, AdminResult, StatusCode as AdminStatus},
    AppState,
};

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = match self.code() {
            AdminStatus::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            AdminStatus::InvalidArgument => StatusCode::BAD_REQUEST,
            AdminStatus::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = json!({
            "error": self.to_string(),
            "code": self.code().as_str(),
        });
        (status, Json(body)).into_response()
    }
}

/// Health check endpoint
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.engine.is_ready();
    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(json!({
            "status": if ready { "healthy" } else { "not_ready" },
            "service": "tsdb-admin",
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "admin_enabled": state.admin.is_enabled(),
        })),
    )
}

/// Metrics endpoint (Prometheus format)
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(metrics_string) => {
            let mut headers = HeaderMap::new();
            headers.insert(
                header::CONTENT_TYPE,
                header::HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
            );
            (StatusCode::OK, headers, metrics_string)
        }
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                HeaderMap::new(),
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}

/// `POST /api/v2/admin/tsdb/snapshot`
pub async fn snapshot_handler(State(state): State<AppState>, body: Bytes) -> Result<Response, AdminError> {
    let request: SnapshotRequest = decode_or_default(&body)?;
    let admin = state.admin.clone();

    let response = run_blocking(move || admin.snapshot(&request)).await?;
    Ok(Json(response).into_response())
}

/// `POST /api/v2/admin/tsdb/clean_tombstones`
pub async fn clean_tombstones_handler(State(state): State<AppState>) -> Result<Response, AdminError> {
    let admin = state.admin.clone();

    run_blocking(move || admin.clean_tombstones()).await?;
    Ok(Json(json!({})).into_response())
}

/// `POST /api/v2/admin/tsdb/delete_series`
pub async fn delete_series_handler(State(state): State<AppState>, body: Bytes) -> Result<Response, AdminError> {
    let request: DeleteSeriesRequest = decode_or_default(&body)?;
    let admin = state.admin.clone();

    run_blocking(move || admin.delete_series(&request)).await?;
    Ok(Json(json!({})).into_response())
}

/// `POST /api/v2/write`
pub async fn remote_write_handler(State(state): State<AppState>, body: Body) -> Result<Response, AdminError> {
    let summary = state.admin.remote_write(request_stream(body)).await?;

    trace!(
        "Remote write finished: {} series, {} samples appended, {} failed",
        summary.series,
        summary.samples_appended,
        summary.samples_failed
    );
    Ok(Json(json!({})).into_response())
}

/// Turn a newline-delimited JSON body into a lazy stream of write requests.
/// Blank lines are skipped; an unreadable or undecodable line is a stream error.
pub fn request_stream(body: Body) -> impl Stream<Item = AdminResult<WriteRequest>> + Send + Unpin {
    let reader = StreamReader::new(body.into_data_stream().map_err(std::io::Error::other));
    let lines = reader.lines();

    Box::pin(futures::stream::unfold(lines, |mut lines| async move {
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => {
                    let item = serde_json::from_str::<WriteRequest>(&line).map_err(|e| {
                        warn!("Failed to decode write request: {}", e);
                        AdminError::transport(format!("decode write request: {}", e))
                    });
                    return Some((item, lines));
                }
                Ok(None) => return None,
                Err(e) => return Some((Err(AdminError::transport(e.to_string())), lines)),
            }
        }
    }))
}

fn decode_or_default<T: DeserializeOwned + Default>(body: &[u8]) -> AdminResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AdminError::invalid_argument(format!("invalid request body: {}", e)))
}

/// Engine control calls block; keep them off the async workers
async fn run_blocking<T, F>(f: F) -> AdminResult<T>
where
    F: FnOnce() -> AdminResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("Admin task failed: {}", e);
        AdminError::internal(format!("admin task failed: {}", e))
    })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_request_stream_splits_lines() {
        let body = Body::from(
            "{\"timeseries\":[]}\n\n{\"timeseries\":[{\"labels\":[],\"samples\":[]}]}\n",
        );
        let items: Vec<_> = request_stream(body).collect().await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[1].as_ref().unwrap().timeseries.len(), 1);
    }

    #[tokio::test]
    async fn test_request_stream_reports_bad_line() {
        let body = Body::from("{\"timeseries\":[]}\nnot json\n");
        let items: Vec<_> = request_stream(body).collect().await;

        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(AdminError::Transport(_))));
    }

    #[test]
    fn test_decode_or_default() {
        let req: SnapshotRequest = decode_or_default(b"").unwrap();
        assert!(!req.skip_head);

        let req: SnapshotRequest = decode_or_default(br#"{"skip_head": true}"#).unwrap();
        assert!(req.skip_head);

        let err = decode_or_default::<SnapshotRequest>(b"{").unwrap_err();
        assert_eq!(err.code(), AdminStatus::InvalidArgument);
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            AdminError::Disabled.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AdminError::invalid_argument("x").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AdminError::internal("x").into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

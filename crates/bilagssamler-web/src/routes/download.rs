//! Download route - finished bundle delivery.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::Response,
};
use std::sync::Arc;

use crate::helpers::{OptionExt, ResultExt, RouteResult};
use crate::state::AppState;

/// Download an assembled bundle.
pub async fn download_bundle(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> RouteResult<Response> {
    let (bundle, filename, _) = state
        .get_bundle(&session_id)
        .await
        .or_not_found("Bundle not found or expired")?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(Body::from(bundle))
        .or_internal_error()
}

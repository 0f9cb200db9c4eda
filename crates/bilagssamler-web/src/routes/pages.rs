//! Full page routes.

use axum::extract::{Path, State};
use std::sync::Arc;

use crate::helpers::{OptionExt, RouteResult};
use crate::state::AppState;
use crate::templates::{DoneTemplate, IndexTemplate};

/// Landing page with the upload form.
pub async fn index(State(state): State<Arc<AppState>>) -> IndexTemplate {
    IndexTemplate::new(
        state.config.start_page,
        state.config.watermark_text.clone(),
    )
}

/// Download page for a finished bundle.
pub async fn done(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> RouteResult<DoneTemplate> {
    let (_, filename, page_count) = state
        .get_bundle(&session_id)
        .await
        .or_not_found("Bundle not found or expired")?;

    Ok(DoneTemplate {
        session_id,
        filename,
        page_count,
    })
}

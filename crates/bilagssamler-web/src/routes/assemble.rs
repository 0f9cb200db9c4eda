//! Assemble route - multi-file upload handling.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Multipart;
use bilagssamler_core::{AppendixInput, Assembler, AssemblyConfig};
use std::sync::Arc;
use tracing::{error, info};

use crate::helpers::{ResultExt, RouteResult};
use crate::state::AppState;
use crate::templates::IndexTemplate;

/// Assemble the uploaded batch - redirects to the download page
/// (POST-Redirect-GET pattern).
///
/// Supports both HTMX requests (HX-Redirect header) and standard form
/// submissions (HTTP 303 See Other redirect) for graceful degradation
/// without JavaScript.
pub async fn assemble_bundle(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> RouteResult<Response> {
    let mut inputs = Vec::new();
    let mut config = state.config.clone();

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "files" => {
                let filename = field.file_name().unwrap_or("bilag.pdf").to_string();
                let data = field.bytes().await.or_bad_request()?;
                // Browsers submit an empty part when no file is selected
                if !data.is_empty() {
                    inputs.push(AppendixInput::new(filename, data.to_vec()));
                }
            }
            "start_page" => {
                let text = field.text().await.or_bad_request()?;
                if !text.trim().is_empty() {
                    config.start_page = text.trim().parse().map_err(|_| {
                        (
                            StatusCode::BAD_REQUEST,
                            format!("Invalid starting page: {text}"),
                        )
                    })?;
                }
            }
            "watermark" => {
                let text = field.text().await.or_bad_request()?;
                if !text.trim().is_empty() {
                    config.watermark_text = text.trim().to_string();
                }
            }
            _ => {}
        }
    }

    if inputs.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "No files uploaded".to_string()));
    }

    let file_count = inputs.len();
    info!("Assembling {} uploaded files", file_count);

    // Assembly is pure CPU work on potentially large PDFs; keep it off the
    // async runtime
    let result = tokio::task::spawn_blocking(move || run_assembly(config, inputs))
        .await
        .map_err(|e| {
            error!("Assembly task panicked: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Assembly failed".to_string(),
            )
        })?;

    let bundle = match result {
        Ok(bundle) => bundle,
        Err(e) => {
            error!("Failed to assemble bundle: {}", e);
            // Re-render the form with the failure shown above it
            let page = IndexTemplate::with_error(
                state.config.start_page,
                state.config.watermark_text.clone(),
                e.to_string(),
            );
            return Ok((StatusCode::BAD_REQUEST, page).into_response());
        }
    };

    let page_count = count_pages(&bundle);
    let session_id = state
        .store_bundle(bundle, "samlet.pdf".to_string(), page_count)
        .await;

    info!(
        "Stored bundle {} ({} files, {} pages)",
        session_id, file_count, page_count
    );

    // POST-Redirect-GET pattern
    let redirect_url = format!("/done/{session_id}");

    // Check if this is an HTMX request
    let is_htmx = headers.get("HX-Request").is_some();

    if is_htmx {
        // HX-Redirect tells HTMX to do a full page navigation
        Response::builder()
            .status(StatusCode::OK)
            .header("HX-Redirect", redirect_url)
            .body(Body::empty())
            .or_internal_error()
    } else {
        // Standard HTTP redirect for non-JS clients
        Response::builder()
            .status(StatusCode::SEE_OTHER)
            .header(header::LOCATION, redirect_url)
            .body(Body::empty())
            .or_internal_error()
    }
}

fn run_assembly(
    config: AssemblyConfig,
    inputs: Vec<AppendixInput>,
) -> bilagssamler_core::Result<Vec<u8>> {
    Assembler::new(config)?.assemble(inputs)
}

/// Page count shown on the download page. The bundle was produced by the
/// assembler, so a parse failure here only costs the displayed count.
fn count_pages(bundle: &[u8]) -> usize {
    lopdf::Document::load_mem(bundle)
        .map(|doc| doc.get_pages().len())
        .unwrap_or(0)
}

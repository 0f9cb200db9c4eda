//! Bilagssamler Web - browser front end for assembling appendix bundles.

mod helpers;
mod routes;
mod state;
mod templates;

use anyhow::Result;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, header},
    routing::{get, post},
};
use bilagssamler_core::AssemblyConfig;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use state::AppState;

#[derive(Parser, Debug)]
#[command(name = "bilagssamler-web")]
#[command(author, version, about = "Bilagssamler Web Server", long_about = None)]
struct Args {
    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind to
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Page number printed on the first output page
    #[arg(short = 's', long)]
    start_page: Option<u32>,

    /// Watermark text drawn beneath every page
    #[arg(short, long)]
    watermark: Option<String>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging
    let default_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    // Config file settings, overridden by CLI arguments
    let mut config = AssemblyConfig::load();
    if let Some(start_page) = args.start_page {
        config.start_page = start_page;
    }
    if let Some(watermark) = args.watermark {
        config.watermark_text = watermark;
    }

    let state = Arc::new(AppState::new(config));

    // Spawn background task for session cleanup (runs every 5 minutes)
    let cleanup_state = Arc::clone(&state);
    tokio::spawn(async move {
        let cleanup_interval = Duration::from_secs(5 * 60);
        loop {
            tokio::time::sleep(cleanup_interval).await;
            cleanup_state.cleanup_old_sessions().await;
            info!("Completed session cleanup");
        }
    });

    // Build router
    let app = Router::new()
        // Pages
        .route("/", get(routes::index))
        .route("/done/{session_id}", get(routes::done))
        // API endpoints
        .route("/api/assemble", post(routes::assemble_bundle))
        .route("/api/download/{session_id}", get(routes::download_bundle))
        // Middleware
        // Cache-Control for HTML - prevents bfcache issues with HTMX
        // (the download route sets its own headers)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, max-age=0"),
        ))
        .layer(CompressionLayer::new()) // Gzip compression for responses
        .layer(DefaultBodyLimit::max(300 * 1024 * 1024)) // 300MB limit for uploads
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

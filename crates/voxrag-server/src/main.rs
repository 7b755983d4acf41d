#![allow(clippy::doc_markdown)]
//! VoxRAG Server - HTTP server for the VoxRAG retrieval engine.

use axum::{extract::DefaultBodyLimit, Router};
use clap::Parser;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use voxrag_core::{Engine, EngineConfig};
use voxrag_server::{router, ApiDoc, AppState};

/// VoxRAG Server - embeddable semantic-retrieval engine, served over HTTP.
#[derive(Parser, Debug)]
#[command(name = "voxrag-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Data directory for persistent storage.
    #[arg(long, default_value = "./data", env = "VOX_DATA_DIR")]
    data_dir: String,

    /// Host address to bind to.
    #[arg(long, default_value = "127.0.0.1", env = "VOX_HOST")]
    host: String,

    /// Port to listen on.
    #[arg(short, long, default_value = "8080", env = "VOX_PORT")]
    port: u16,

    /// Vector dimension for this store. Fixed at first open.
    #[arg(long, default_value = "1536", env = "VOX_DIM")]
    dim: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    tracing::info!("starting voxrag server");
    tracing::info!(data_dir = %args.data_dir, dim = args.dim, "opening engine");

    let mut config = EngineConfig::load()?;
    config.data_dir = args.data_dir;
    config.dim = args.dim;

    let engine = Engine::open(config)?;
    let state = Arc::new(AppState { engine });

    let api_router = router(state).layer(DefaultBodyLimit::max(32 * 1024 * 1024));

    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi());

    let app = api_router
        .merge(Router::<()>::new().merge(swagger_ui))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("voxrag server listening on http://{addr}");

    axum::serve(listener, app).await?;

    Ok(())
}

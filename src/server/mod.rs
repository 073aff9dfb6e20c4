//! HTTP surface.
//!
//! | Route | Handler |
//! |---|---|
//! | `GET /` | index page (upload form + gallery) |
//! | `POST /upload` | multipart `files` → enhance each |
//! | `POST /reprocess` | composite an overlay onto a result |
//! | `POST /rename` | rename a result |
//! | `GET /download_all` | zip of all results |
//! | `GET /results/*`, `GET /uploads/*` | static files |
//!
//! Anything else falls through to the configured public directory.

pub mod error;
mod handlers;
mod page;
pub mod state;

pub use error::{ApiError, ServerError};
pub use state::AppState;

use crate::config::{ServerConfig, UploadConfig};
use crate::imaging::{ImageBackend, RustBackend};
use crate::service::ProcessingService;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use std::path::Path;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Assemble the router for `state`.
pub fn build_router<B>(state: AppState<B>, upload: &UploadConfig, public_dir: &Path) -> Router
where
    B: ImageBackend + Send + 'static,
{
    let uploads_dir = state.service.uploads().root().to_path_buf();
    let results_dir = state.service.results().root().to_path_buf();
    let json_limit = usize::try_from(upload.max_json_size).unwrap_or(usize::MAX);

    Router::new()
        .route("/", get(handlers::index::<B>))
        .route(
            "/upload",
            post(handlers::upload::<B>).layer(DefaultBodyLimit::max(upload.max_body_size())),
        )
        .route(
            "/reprocess",
            post(handlers::reprocess::<B>).layer(DefaultBodyLimit::max(json_limit)),
        )
        .route(
            "/rename",
            post(handlers::rename::<B>).layer(DefaultBodyLimit::max(json_limit)),
        )
        .route("/download_all", get(handlers::download_all::<B>))
        .nest_service("/results", ServeDir::new(results_dir))
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .fallback_service(ServeDir::new(public_dir))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Build the production router from config.
pub fn app(config: &ServerConfig) -> Result<Router, ServerError> {
    let service = ProcessingService::new(RustBackend::new(), config)?;
    Ok(build_router(
        AppState::new(service),
        &config.upload,
        &config.server.public_dir,
    ))
}

/// Serve `router` on an already-bound listener until the process stops.
pub async fn run(listener: TcpListener, router: Router) -> Result<(), ServerError> {
    tracing::info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, router).await?;
    Ok(())
}

/// Bind the configured address and serve.
pub async fn serve(config: &ServerConfig) -> Result<(), ServerError> {
    let router = app(config)?;
    let listener = TcpListener::bind(config.server.address()).await?;
    tracing::info!(
        uploads = %config.storage.uploads_dir.display(),
        results = %config.storage.results_dir.display(),
        "storage ready"
    );
    run(listener, router).await
}

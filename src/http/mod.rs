pub mod error;
pub mod handlers;

use crate::app::photos::MAX_FILES_PER_UPLOAD;
use crate::app::Services;
use crate::config::AppConfig;
use crate::utils::error::{LensError, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal::{self, ctrl_c};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

// multipart 邊界與欄位標頭的額外空間
const MULTIPART_SLACK_BYTES: usize = 1024 * 1024;

pub fn build_router(services: Services, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .allow_origin(Any)
        .max_age(Duration::from_secs(60 * 60));

    let body_limit = max_upload_bytes * MAX_FILES_PER_UPLOAD + MULTIPART_SLACK_BYTES;

    Router::new()
        .route("/health", get(handlers::health))
        .route("/events", post(handlers::create_event))
        .route("/events/:event_id", get(handlers::get_event))
        .route(
            "/events/:event_id/photos",
            post(handlers::upload_photos).get(handlers::list_photos),
        )
        .route("/events/:event_id/report", get(handlers::photo_report))
        .route(
            "/events/:event_id/photos/:photo_id",
            get(handlers::get_photo).delete(handlers::delete_photo),
        )
        .route(
            "/events/:event_id/photos/:photo_id/preview",
            get(handlers::photo_preview),
        )
        .route("/events/:event_id/search", post(handlers::search_faces))
        .route("/checkout", post(handlers::create_checkout))
        .route("/checkout/:session_id", get(handlers::checkout_status))
        .route(
            "/checkout/:session_id/photos/:photo_id",
            get(handlers::download_photo),
        )
        .route(
            "/checkout/:session_id/archive",
            get(handlers::download_archive),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(services)
}

pub async fn serve(config: &AppConfig, services: Services) -> Result<()> {
    let app = build_router(services, config.max_upload_bytes());

    let address = config.server.bind.as_str();
    info!("Binding to {address}");
    let listener = TcpListener::bind(address).await?;
    info!("🚀 Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(LensError::IoError)?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

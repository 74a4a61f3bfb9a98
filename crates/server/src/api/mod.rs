pub mod download;
pub mod health;
pub mod openapi;
pub mod schemas;

use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use wicket_blob::BlobStore;
use wicket_token::Clock;

use crate::authorize::DownloadAuthorizer;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Authorization decisions and token issuance.
    pub authorizer: Arc<DownloadAuthorizer>,
    /// Content-addressed attachment storage.
    pub store: Arc<dyn BlobStore>,
    /// Source of `now` for expiry checks.
    pub clock: Arc<dyn Clock>,
    /// Status returned when the blob id path segment is missing.
    pub missing_blob_id_status: StatusCode,
}

/// Build the Axum router with the download routes and health check.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api-doc/openapi.json", get(openapi::openapi_json))
        .route(
            "/download/{blob_id}",
            get(download::download)
                .post(download::issue_token)
                .head(download::probe)
                .options(download::probe_options),
        )
        .route(
            "/download/{blob_id}/{name}",
            get(download::download_named)
                .head(download::probe)
                .options(download::probe_options),
        )
        .route(
            "/download/",
            get(download::missing_blob_id).post(download::missing_blob_id),
        )
        .route(
            "/download",
            get(download::missing_blob_id).post(download::missing_blob_id),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

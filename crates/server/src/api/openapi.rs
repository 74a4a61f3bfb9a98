#![allow(clippy::needless_for_each)]

use axum::Json;
use utoipa::OpenApi;

use super::schemas::{ErrorResponse, HealthResponse};

#[derive(utoipa::OpenApi)]
#[openapi(
    info(
        title = "Wicket Download API",
        version = "0.1.0",
        description = "Authorized downloads of content-addressed mail attachments, using session credentials or blob-scoped download tokens.",
        license(name = "Apache-2.0")
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Download", description = "Attachment download and download token issuance")
    ),
    paths(
        super::health::health,
        super::download::download,
        super::download::download_named,
        super::download::issue_token,
        super::download::probe,
        super::download::probe_options,
    ),
    components(schemas(HealthResponse, ErrorResponse))
)]
pub struct ApiDoc;

/// `GET /api-doc/openapi.json` -- the OpenAPI document for this server.
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

//! Attachment download endpoints.
//!
//! `GET` serves blob bytes to callers holding either a session credential
//! (`Authorization` header) or a download token scoped to the blob
//! (`access_token` query parameter). `POST` exchanges a session credential
//! for such a token. `HEAD` and `OPTIONS` are unauthenticated probes.

use axum::extract::{Path, Query, State};
use axum::http::header::{ALLOW, CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;

use wicket_token::TokenCodec;

use crate::auth::credential_from_headers;
use crate::authorize::{Decision, Issuance};
use crate::disposition::content_disposition;
use crate::error::ServerError;

use super::AppState;
use super::schemas::ErrorResponse;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Content-addressed bytes never change.
const IMMUTABLE_CACHE_CONTROL: &str = "private, immutable, max-age=31536000";

const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS, POST";

/// Query parameters accepted by the download endpoints.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DownloadQuery {
    /// Download token issued for this blob. Should be percent-encoded; an
    /// unencoded `+` in the signature is tolerated.
    pub access_token: Option<String>,
    /// Content type to serve the bytes as.
    pub accept: Option<String>,
}

/// `GET /download/{blob_id}` -- download a blob.
#[utoipa::path(
    get,
    path = "/download/{blob_id}",
    tag = "Download",
    summary = "Download an attachment",
    description = "Returns the blob bytes. Authenticate with the Authorization header or an access_token issued for this blob.",
    params(
        ("blob_id" = String, Path, description = "40 hexadecimal character blob id"),
        DownloadQuery,
    ),
    responses(
        (status = 200, description = "Blob bytes"),
        (status = 400, description = "Malformed blob id", body = ErrorResponse),
        (status = 401, description = "Missing, invalid, expired or out-of-scope credentials", body = ErrorResponse),
        (status = 404, description = "Blob not found", body = ErrorResponse),
    )
)]
pub async fn download(
    State(state): State<AppState>,
    Path(blob_id): Path<String>,
    Query(query): Query<DownloadQuery>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    serve_blob(&state, &blob_id, None, &query, &headers).await
}

/// `GET /download/{blob_id}/{name}` -- download a blob under a chosen file name.
#[utoipa::path(
    get,
    path = "/download/{blob_id}/{name}",
    tag = "Download",
    summary = "Download an attachment with a file name",
    description = "Same as the unnamed download, with the Content-Disposition file name taken from the path.",
    params(
        ("blob_id" = String, Path, description = "40 hexadecimal character blob id"),
        ("name" = String, Path, description = "File name for Content-Disposition"),
        DownloadQuery,
    ),
    responses(
        (status = 200, description = "Blob bytes"),
        (status = 400, description = "Malformed blob id", body = ErrorResponse),
        (status = 401, description = "Missing, invalid, expired or out-of-scope credentials", body = ErrorResponse),
        (status = 404, description = "Blob not found", body = ErrorResponse),
    )
)]
pub async fn download_named(
    State(state): State<AppState>,
    Path((blob_id, name)): Path<(String, String)>,
    Query(query): Query<DownloadQuery>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    serve_blob(&state, &blob_id, Some(&name), &query, &headers).await
}

async fn serve_blob(
    state: &AppState,
    raw_blob_id: &str,
    name: Option<&str>,
    query: &DownloadQuery,
    headers: &HeaderMap,
) -> Result<Response, ServerError> {
    let now = state.clock.now();
    let decision = state
        .authorizer
        .authorize(
            raw_blob_id,
            credential_from_headers(headers),
            query.access_token.as_deref(),
            now,
        )
        .await;

    let grant = match decision {
        Decision::Authorized(grant) => grant,
        Decision::BadRequest(message) => return Err(ServerError::BadRequest(message)),
        Decision::Unauthorized(reason) => {
            return Err(ServerError::Unauthorized(reason.to_string()));
        }
    };

    let Some(blob) = state.store.get(&grant.blob_id).await? else {
        return Err(ServerError::NotFound(format!(
            "blob not found: {}",
            grant.blob_id
        )));
    };

    let content_type = query
        .accept
        .as_deref()
        .and_then(|accept| HeaderValue::from_str(accept).ok())
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    let disposition = content_disposition(name.or(blob.suggested_name.as_deref()));
    let disposition = HeaderValue::try_from(disposition)
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    info!(
        user = %grant.user,
        blob_id = %grant.blob_id,
        size = blob.size(),
        via = ?grant.via,
        "blob downloaded"
    );

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, content_type),
            (CONTENT_LENGTH, HeaderValue::from(blob.size())),
            (CONTENT_DISPOSITION, disposition),
            (CACHE_CONTROL, HeaderValue::from_static(IMMUTABLE_CACHE_CONTROL)),
        ],
        blob.data,
    )
        .into_response())
}

/// `POST /download/{blob_id}` -- issue a download token for a blob.
#[utoipa::path(
    post,
    path = "/download/{blob_id}",
    tag = "Download",
    summary = "Issue a download token",
    description = "Exchanges the session credential in the Authorization header for a short-lived token usable only for this blob, returned as plain text.",
    params(
        ("blob_id" = String, Path, description = "40 hexadecimal character blob id"),
    ),
    responses(
        (status = 200, description = "Serialized download token", body = String, content_type = "text/plain"),
        (status = 400, description = "Malformed blob id", body = ErrorResponse),
        (status = 401, description = "Missing or invalid session credential", body = ErrorResponse),
    )
)]
pub async fn issue_token(
    State(state): State<AppState>,
    Path(blob_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    let now = state.clock.now();
    match state
        .authorizer
        .issue(&blob_id, credential_from_headers(&headers), now)
        .await?
    {
        Issuance::Issued(token) => Ok((
            StatusCode::OK,
            [(CONTENT_TYPE, "text/plain")],
            TokenCodec::serialize(&token),
        )
            .into_response()),
        Issuance::BadRequest(message) => Err(ServerError::BadRequest(message)),
        Issuance::Unauthorized(reason) => Err(ServerError::Unauthorized(reason.to_string())),
    }
}

/// `HEAD /download/{blob_id}` -- endpoint probe, no authorization.
#[utoipa::path(
    head,
    path = "/download/{blob_id}",
    tag = "Download",
    summary = "Probe the download endpoint",
    params(
        ("blob_id" = String, Path, description = "Blob id (not checked)"),
    ),
    responses(
        (status = 200, description = "Endpoint is available"),
    )
)]
pub async fn probe() -> StatusCode {
    StatusCode::OK
}

/// `OPTIONS /download/{blob_id}` -- endpoint probe listing the allowed methods.
#[utoipa::path(
    options,
    path = "/download/{blob_id}",
    tag = "Download",
    summary = "List the methods the download endpoint supports",
    params(
        ("blob_id" = String, Path, description = "Blob id (not checked)"),
    ),
    responses(
        (status = 200, description = "Endpoint is available", headers(("Allow" = String, description = "Supported methods"))),
    )
)]
pub async fn probe_options() -> impl IntoResponse {
    (StatusCode::OK, [(ALLOW, ALLOWED_METHODS)])
}

/// `GET|POST /download/` -- request without a blob id.
pub async fn missing_blob_id(State(state): State<AppState>) -> ServerError {
    ServerError::Status {
        status: state.missing_blob_id_status,
        message: "missing blob id".to_owned(),
    }
}

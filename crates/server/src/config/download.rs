use axum::http::StatusCode;
use serde::Deserialize;

/// Download endpoint configuration.
#[derive(Debug, Deserialize)]
pub struct DownloadConfig {
    /// Status returned for `/download/` requests with no blob id segment.
    ///
    /// Only `400` and `404` are accepted.
    #[serde(default = "default_missing_blob_id_status")]
    pub missing_blob_id_status: u16,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            missing_blob_id_status: default_missing_blob_id_status(),
        }
    }
}

fn default_missing_blob_id_status() -> u16 {
    400
}

impl DownloadConfig {
    /// Validated status for requests missing the blob id segment.
    pub fn missing_blob_id_status(&self) -> Result<StatusCode, String> {
        match self.missing_blob_id_status {
            400 => Ok(StatusCode::BAD_REQUEST),
            404 => Ok(StatusCode::NOT_FOUND),
            other => Err(format!(
                "download.missing_blob_id_status must be 400 or 404, got {other}"
            )),
        }
    }
}

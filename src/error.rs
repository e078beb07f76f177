use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::fmt::Display;

use crate::media::UploadError;

pub type AppResult<T> = Result<T, AppErr>;

#[derive(thiserror::Error, Debug)]
pub enum AppErr {
    #[error("Bad request: {0}")]
    Bad(String),

    #[error("Upload: {0}")]
    Upload(#[from] UploadError),

    #[error("Config: {0}")]
    Config(String),

    #[error("DB: {0}")]
    Db(#[from] sqlx::Error),
}

impl IntoResponse for AppErr {
    fn into_response(self) -> axum::response::Response {
        let code = match &self {
            AppErr::Bad(_)                            => StatusCode::BAD_REQUEST,
            AppErr::Upload(UploadError::Transient(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppErr::Upload(UploadError::Permanent(_)) => StatusCode::BAD_GATEWAY,
            _                                         => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if code.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let message = match self {
            AppErr::Bad(msg) => msg,
            other            => other.to_string(),
        };
        (code, Json(json!({ "error": message }))).into_response()
    }
}

/* ── 小助手：把任何 error 轉成 Bad ── */
pub fn bad<E: Display>(e: E) -> AppErr { AppErr::Bad(e.to_string()) }

/// Presence and upload inputs must be present and non-empty.
pub fn required<'a>(value: Option<&'a str>, field: &str) -> AppResult<&'a str> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppErr::Bad(format!("{field} is required"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_missing_and_empty() {
        assert!(matches!(required(None, "roomName"), Err(AppErr::Bad(m)) if m == "roomName is required"));
        assert!(matches!(required(Some(""), "username"), Err(AppErr::Bad(_))));
        assert_eq!(required(Some("lobby"), "roomName").unwrap(), "lobby");
    }

    #[test]
    fn status_codes_follow_error_kind() {
        let resp = bad("nope").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = AppErr::from(UploadError::Transient("timeout".into())).into_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

        let resp = AppErr::from(UploadError::Permanent("rejected".into())).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

        let resp = AppErr::Config("missing".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

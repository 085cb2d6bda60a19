use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Google Ads API error: {code}{}", .message.as_deref().map(|m| format!(" - {m}")).unwrap_or_default())]
    Upstream { code: String, message: Option<String> },

    #[error("OAuth token exchange failed: {0}")]
    Auth(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Error body for `/test-credentials`, which also reports `success: false`.
#[derive(Debug)]
pub struct CredentialCheckError(pub AppError);

impl From<AppError> for CredentialCheckError {
    fn from(e: AppError) -> Self {
        Self(e)
    }
}

impl IntoResponse for CredentialCheckError {
    fn into_response(self) -> axum::response::Response {
        let status = self.0.status_code();
        let body = serde_json::json!({ "success": false, "error": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_message_includes_detail_when_present() {
        let e = AppError::Upstream {
            code: "INVALID_ARGUMENT".to_string(),
            message: Some("Invalid customer ID.".to_string()),
        };
        assert_eq!(e.to_string(), "Google Ads API error: INVALID_ARGUMENT - Invalid customer ID.");
        assert_eq!(e.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn upstream_message_without_detail() {
        let e = AppError::Upstream { code: "UNAUTHENTICATED".to_string(), message: None };
        assert_eq!(e.to_string(), "Google Ads API error: UNAUTHENTICATED");
    }

    #[test]
    fn validation_is_client_error() {
        let e = AppError::Validation("No keywords provided".to_string());
        assert_eq!(e.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(e.to_string(), "No keywords provided");
    }
}

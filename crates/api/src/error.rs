use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use chat::ChatError;

/// Errors a handler can return. Every variant renders as the standard
/// failure envelope with `success: false` and a single message line.
#[derive(Debug)]
pub enum ApiError {
    Chat(ChatError),
    BadRequest(String),
    NotFound(&'static str),
    Internal(anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Chat(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Chat(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Chat(e) => e.to_string(),
            ApiError::BadRequest(message) => message.clone(),
            ApiError::NotFound(what) => what.to_string(),
            ApiError::Internal(e) => e.to_string(),
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(e: ChatError) -> Self {
        ApiError::Chat(e)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Internal(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();

        if status.is_server_error() {
            error!(status = %status, error = %message, "request failed");
        }

        let body = Json(json!({
            "success": false,
            "error": { "message": message },
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_400() {
        assert_eq!(
            ApiError::Chat(ChatError::InvalidRequest).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Chat(ChatError::MissingPatientTarget).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::BadRequest("Query is required".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn collaborator_failures_map_to_500() {
        assert_eq!(
            ApiError::Chat(ChatError::Retrieval(anyhow::anyhow!("down"))).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::NotFound("Doctor not found").status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn response_body_is_the_failure_envelope() {
        let response = ApiError::BadRequest("Query is required".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failures reading or writing the conversation file.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures talking to the inference backend.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Ollama API error: {}", .0.as_u16())]
    Backend(reqwest::StatusCode),

    #[error("{0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Generation(#[from] GenerateError),

    #[error("Conversation #{0} not found")]
    NotFound(String),

    #[error("Failed to render page: {0}")]
    Render(#[from] tera::Error),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Generation(_) | ApiError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "status": "error",
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

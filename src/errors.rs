// src/errors.rs
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImgDropError {
    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Upload exceeds {0} bytes")]
    PayloadTooLarge(usize),

    #[error("Invalid operation mode: {0}")]
    InvalidOperation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Font error: {0}")]
    Font(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ImgDropError {
    fn label(&self) -> &'static str {
        match self {
            ImgDropError::ImageProcessing(_) => "Image processing error",
            ImgDropError::Validation(_) => "Validation error",
            ImgDropError::Upload(_) => "Upload error",
            ImgDropError::PayloadTooLarge(_) => "Payload too large",
            ImgDropError::InvalidOperation(_) => "Invalid operation",
            ImgDropError::NotFound(_) => "Not found",
            ImgDropError::Storage(_) => "Storage error",
            ImgDropError::Archive(_) => "Archive error",
            ImgDropError::Font(_) => "Caption font unavailable",
            ImgDropError::Internal(_) => "Internal error",
        }
    }
}

impl ResponseError for ImgDropError {
    fn status_code(&self) -> StatusCode {
        match self {
            ImgDropError::ImageProcessing(_)
            | ImgDropError::Validation(_)
            | ImgDropError::Upload(_)
            | ImgDropError::InvalidOperation(_) => StatusCode::BAD_REQUEST,
            ImgDropError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ImgDropError::NotFound(_) => StatusCode::NOT_FOUND,
            ImgDropError::Storage(_)
            | ImgDropError::Archive(_)
            | ImgDropError::Font(_)
            | ImgDropError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.label(),
            "message": self.to_string()
        }))
    }
}

impl From<std::io::Error> for ImgDropError {
    fn from(e: std::io::Error) -> Self {
        ImgDropError::Storage(e.to_string())
    }
}

impl From<actix_web::error::BlockingError> for ImgDropError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        ImgDropError::Internal(format!("Worker thread failed: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ImgDropError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ImgDropError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ImgDropError::PayloadTooLarge(10).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ImgDropError::Font("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

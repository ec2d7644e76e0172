// src/errors.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("MongoDB error: {0}")]
    MongoDB(#[from] mongodb::error::Error),

    #[error("Missing required field: {0}")]
    MissingRequiredField(String),

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("User not found")]
    UserNotFound,

    #[error("No email address linked to this account")]
    NoEmailOnFile,

    #[error("Failed to send OTP email: {0}")]
    MailDelivery(String),

    #[error("Invalid OTP")]
    InvalidOtp,

    #[error("OTP has expired. Please request a new one.")]
    OtpExpired,

    #[error("Authentication required")]
    Unauthorized,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::MongoDB(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string()),
            AppError::MissingRequiredField(_) => (StatusCode::BAD_REQUEST, "Missing required field".to_string()),
            AppError::DuplicateEmail => (StatusCode::BAD_REQUEST, "Email already registered".to_string()),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "User not found".to_string()),
            AppError::NoEmailOnFile => (StatusCode::BAD_REQUEST, "No email on file".to_string()),
            AppError::MailDelivery(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Mail delivery failed".to_string()),
            AppError::InvalidOtp => (StatusCode::BAD_REQUEST, "Invalid OTP".to_string()),
            AppError::OtpExpired => (StatusCode::BAD_REQUEST, "OTP expired".to_string()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Authentication failed".to_string()),
            AppError::ValidationError(_) => (StatusCode::BAD_REQUEST, "Validation failed".to_string()),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string()),
        };

        let body = Json(json!({
            "error": error_message,
            "message": self.to_string(),
            "success": false,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }));

        (status, body).into_response()
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(err: bcrypt::BcryptError) -> Self {
        AppError::Internal(format!("Password hashing error: {}", err))
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        AppError::Internal(format!("Token error: {}", err))
    }
}

// Helper conversion functions
impl AppError {
    pub fn missing_field(field: impl Into<String>) -> Self {
        AppError::MissingRequiredField(field.into())
    }

    pub fn mail(msg: impl Into<String>) -> Self {
        AppError::MailDelivery(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}

/// True when a write was rejected by a unique index (server code 11000).
pub fn is_duplicate_key_error(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};

    matches!(
        *err.kind,
        ErrorKind::Write(WriteFailure::WriteError(ref write_error)) if write_error.code == 11000
    )
}

pub type Result<T> = std::result::Result<T, AppError>;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found: {0}")]
    NotFound(String),
    #[error("Invalid Operation: {0}")]
    InvalidOperation(String),
    #[error("Configuration Error: {0}")]
    Configuration(String),
    #[error("Database Error: {0}")]
    DatabaseError(String),
    #[error("Export Error: {0}")]
    ExportError(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for AppError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        AppError::ExportError(err.to_string())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidOperation(_)
            | AppError::Configuration(_)
            | AppError::DatabaseError(_)
            | AppError::ExportError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::NotFound(msg)
            | AppError::InvalidOperation(msg)
            | AppError::Configuration(msg)
            | AppError::DatabaseError(msg)
            | AppError::ExportError(msg) => msg.clone(),
        };
        HttpResponse::build(self.status_code()).json(ErrorResponse { error: message })
    }
}

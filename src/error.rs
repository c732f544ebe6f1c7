// ============================================================================
// ERREURS API
// ============================================================================
//
// Toutes les routes retournent Result<HttpResponse, AppError>.
// Format des réponses d'erreur:
//   - 400 validation : {"champ": ["message", ...]}
//   - 400 conflit    : {"errors": "message"}
//   - 401/403/404    : {"detail": "message"}
//   - 500            : {"detail": "Internal server error"} (détail dans les logs)
//
// ============================================================================

use std::collections::BTreeMap;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use validator::ValidationErrors;

/// Erreurs par champ, sérialisées telles quelles en JSON
pub type FieldErrors = BTreeMap<String, Vec<String>>;

pub const REQUIRED_FIELD: &str = "This field is required.";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0:?}")]
    Validation(FieldErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Database(DbErr),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Erreur de validation sur un seul champ
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        AppError::Validation(errors)
    }

    pub fn not_found() -> Self {
        AppError::NotFound("Not found.".to_string())
    }

    pub fn permission_denied() -> Self {
        AppError::Forbidden("You do not have permission to perform this action.".to_string())
    }
}

/// Ajoute un message à un champ dans une map d'erreurs
pub fn push_error(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors.entry(field.to_string()).or_default().push(message.into());
}

/// Convertit les erreurs du crate validator en {"champ": ["message"]}
pub fn field_errors_from(errors: &ValidationErrors) -> FieldErrors {
    let mut result = FieldErrors::new();
    for (field, field_errors) in errors.field_errors() {
        for error in field_errors.iter() {
            let message = match &error.message {
                Some(message) => message.to_string(),
                None => format!("Invalid value ({}).", error.code),
            };
            push_error(&mut result, &field.to_string(), message);
        }
    }
    result
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(field_errors_from(&errors))
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        // Contrainte UNIQUE violée (favori/panier/abonnement en double) -> 400
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::BadRequest("The object already exists.".to_string())
            }
            _ => AppError::Database(err),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_)
            | AppError::Io(_)
            | AppError::Spreadsheet(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        match self {
            AppError::Validation(errors) => {
                tracing::debug!("Validation failed: {:?}", errors);
                HttpResponse::build(status).json(errors)
            }
            AppError::BadRequest(message) => {
                tracing::debug!("Bad request: {}", message);
                HttpResponse::build(status).json(serde_json::json!({ "errors": message }))
            }
            AppError::Unauthorized(message)
            | AppError::Forbidden(message)
            | AppError::NotFound(message) => {
                HttpResponse::build(status).json(serde_json::json!({ "detail": message }))
            }
            _ => {
                tracing::error!("Internal error: {}", self);
                HttpResponse::build(status).json(serde_json::json!({
                    "detail": "Internal server error"
                }))
            }
        }
    }
}

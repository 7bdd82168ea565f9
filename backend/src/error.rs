//! Error handling for the lot lineage service
//!
//! Provides consistent, machine-readable errors for host applications

use lot_lineage::EngineError;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Engine errors
    #[error("Invalid amount {requested}: must be between 1 and {available}")]
    InvalidAmount { requested: i128, available: u64 },

    #[error("Malformed lineage at batch {0}")]
    MalformedLineage(Uuid),

    #[error("Primary batch {0} is exhausted")]
    ExhaustedPrimary(Uuid),

    // Store errors
    #[error("Stale plan for batch {batch_id}: expected {expected} units, found {actual:?}")]
    StalePlan {
        batch_id: Uuid,
        expected: u64,
        actual: Option<u64>,
    },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Internal errors
    #[error("Internal error")]
    InternalError(#[from] anyhow::Error),
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidAmount {
                requested,
                available,
            } => AppError::InvalidAmount {
                requested,
                available,
            },
            EngineError::MalformedLineage { batch_id } => AppError::MalformedLineage(batch_id),
            EngineError::ExhaustedPrimary { batch_id } => AppError::ExhaustedPrimary(batch_id),
            EngineError::InvalidUnitRange { .. } => AppError::Validation {
                field: "range".to_string(),
                message: err.to_string(),
            },
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let (field, message) = errors
            .field_errors()
            .into_iter()
            .next()
            .map(|(field, errs)| {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| format!("{} is invalid", field));
                (field.to_string(), message)
            })
            .unwrap_or_else(|| ("input".to_string(), "Invalid input".to_string()));

        AppError::Validation { field, message }
    }
}

/// Error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    /// Stable code the host can branch on
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::InvalidAmount { .. } => "INVALID_AMOUNT",
            AppError::MalformedLineage(_) => "MALFORMED_LINEAGE",
            AppError::ExhaustedPrimary(_) => "EXHAUSTED_PRIMARY",
            AppError::StalePlan { .. } => "STALE_PLAN",
            AppError::Store(_) => "STORE_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        let field = match self {
            AppError::Validation { field, .. } => Some(field.clone()),
            AppError::InvalidAmount { .. } => Some("amount".to_string()),
            _ => None,
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        ErrorResponse {
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.to_string(),
                field,
            },
        }
    }
}

/// Result type alias for services
pub type AppResult<T> = Result<T, AppError>;

//! Error taxonomy shared by the request pipeline and the business handlers.
//!
//! Every failure that reaches a caller is an [`ApiError`]. Its outward shape is
//! always a [`StructuredError`]; the category decides the HTTP status and whether
//! a markup template exists for it.

use axum::http::StatusCode;
use serde::Serialize;

use crate::id::CodecError;
use crate::records::StoreError;

/// Field-level validation failure. Raised before any business handler runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    FieldRequired { field: String },
    #[error("{field}: {value:?} is not one of {}", .allowed.join(", "))]
    FieldInvalid {
        field: String,
        value: String,
        allowed: Vec<String>,
    },
    #[error("{field}: {value:?} is not in a recognised format")]
    FieldFormatInvalid { field: String, value: String },
}

impl ValidationError {
    pub fn required(field: &str) -> Self {
        Self::FieldRequired {
            field: field.to_string(),
        }
    }

    pub fn invalid(field: &str, value: &str, allowed: &[&str]) -> Self {
        Self::FieldInvalid {
            field: field.to_string(),
            value: value.to_string(),
            allowed: allowed.iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn format(field: &str, value: &str) -> Self {
        Self::FieldFormatInvalid {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::FieldRequired { .. } => "field_required",
            Self::FieldInvalid { .. } => "field_invalid",
            Self::FieldFormatInvalid { .. } => "field_format_invalid",
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Self::FieldRequired { field }
            | Self::FieldInvalid { field, .. }
            | Self::FieldFormatInvalid { field, .. } => field,
        }
    }
}

/// Outward error categories. Together with success these are the only shapes a
/// business operation can end in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Internal,
}

/// Every error a caller can receive.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("request body could not be decoded: {0}")]
    MalformedBody(String),
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },
    #[error("request did not complete within {secs}s")]
    Timeout { secs: u64 },
    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

impl ApiError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) | Self::MalformedBody(_) | Self::PayloadTooLarge { .. } => {
                ErrorCategory::Validation
            }
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Timeout { .. } | Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::MalformedBody(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Timeout { .. } => StatusCode::REQUEST_TIMEOUT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The outward shape. Internal causes never leak past this point.
    pub fn structured(&self) -> StructuredError {
        match self {
            Self::Validation(err) => StructuredError {
                message: err.to_string(),
                code: err.code().to_string(),
                field: Some(err.field().to_string()),
            },
            Self::MalformedBody(_) => StructuredError::new("body_malformed", self.to_string()),
            Self::PayloadTooLarge { .. } => {
                StructuredError::new("payload_too_large", self.to_string())
            }
            Self::NotFound { .. } => StructuredError::new("not_found", self.to_string()),
            Self::Timeout { .. } => StructuredError::new("timeout", self.to_string()),
            Self::Internal(_) => StructuredError::new("internal", "internal error"),
        }
    }

    /// A path or argument identifier that failed to decode.
    pub fn bad_identifier(field: &str, value: &str, cause: CodecError) -> Self {
        tracing::debug!(field, value, error = %cause, "identifier rejected");
        Self::Validation(ValidationError::format(field, value))
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { resource, id } => Self::NotFound {
                resource,
                id: id.to_string(),
            },
            other => Self::Internal(other.into()),
        }
    }
}

/// `{ "message", "code", "field"? }`, the single error body callers see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructuredError {
    pub message: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl StructuredError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.to_string(),
            field: None,
        }
    }
}

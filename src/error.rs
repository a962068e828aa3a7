//! Request handling errors
//!
//! Every failure a handler or the binding layer can raise, with the HTTP status it maps to.

use hyper::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WebError {
    #[error("Required request parameter '{0}' is not present")]
    MissingParameter(String),

    #[error("Failed to convert value '{value}' of parameter '{name}' to {expected}")]
    TypeMismatch {
        name: String,
        value: String,
        expected: &'static str,
    },

    #[error("Required request header '{0}' is not present")]
    MissingHeader(String),

    #[error("Required cookie '{0}' is not present")]
    MissingCookie(String),

    #[error("Expected session attribute '{0}'")]
    SessionAttributeRequired(String),

    #[error("Parameter conditions \"{0}\" not met for actual request parameters")]
    UnsatisfiedParams(String),

    #[error("Department {0} does not exist")]
    UnknownDepartment(u32),

    #[error("Employee {0} not found")]
    EmployeeNotFound(u32),

    #[error("No handler found for {method} {path}")]
    NoHandler { method: String, path: String },

    #[error("Request method '{method}' not supported (allowed: {allowed})")]
    MethodNotAllowed { method: String, allowed: String },

    #[error("Failed to read request body: {0}")]
    BodyRead(String),

    #[error("Request body too large: {size} bytes (max: {max})")]
    PayloadTooLarge { size: u64, max: u64 },

    #[error("Request body exceeds the limit of {max} bytes")]
    BodyLimitExceeded { max: u64 },

    #[error("Could not resolve view with name '{0}'")]
    UnknownView(String),

    #[error("Failed to convert model attribute '{key}': {source}")]
    ModelAttribute {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl WebError {
    /// HTTP status reported to the client
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingParameter(_)
            | Self::TypeMismatch { .. }
            | Self::MissingHeader(_)
            | Self::MissingCookie(_)
            | Self::SessionAttributeRequired(_)
            | Self::UnsatisfiedParams(_)
            | Self::UnknownDepartment(_)
            | Self::BodyRead(_) => StatusCode::BAD_REQUEST,
            Self::EmployeeNotFound(_) | Self::NoHandler { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::PayloadTooLarge { .. } | Self::BodyLimitExceeded { .. } => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            Self::UnknownView(_) | Self::ModelAttribute { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn type_mismatch(name: &str, value: &str, expected: &'static str) -> Self {
        Self::TypeMismatch {
            name: name.to_string(),
            value: value.to_string(),
            expected,
        }
    }
}

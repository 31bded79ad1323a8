use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    auth::AuthError, binder::BindError, envelope::Envelope, repository::RepositoryError,
};

/// ApiError
///
/// Every stage of the request pipeline fails with this type. Each variant maps to
/// exactly one HTTP status, and the response is always rendered as an `Envelope`.
#[derive(Error, Debug)]
pub enum ApiError {
    /// No token, a token that fails verification, or rejected login credentials (401).
    #[error("unauthorized")]
    Unauthorized,

    /// A valid identity whose role does not grant the operation's capability (403).
    #[error("forbidden")]
    Forbidden,

    /// A required query parameter is absent or empty (400).
    #[error("query parameter `{0}` is required")]
    MissingParameter(String),

    /// A path or query parameter failed to parse for its declared type (400).
    #[error("invalid format for parameter `{name}`: {cause}")]
    InvalidParameterFormat { name: String, cause: String },

    /// The JSON body is malformed or fails field validation (422).
    #[error("bad request: {0}")]
    BodyValidation(String),

    /// No operation is registered for the path, or the referenced row does not exist (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// The path exists but not for this method (405).
    #[error("method not allowed")]
    MethodNotAllowed,

    /// The write would duplicate an existing row (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The repository reported a storage failure (500).
    #[error("internal server error: {0}")]
    Repository(String),

    /// Any other server-side failure, such as token minting or hashing (500).
    #[error("internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::MissingParameter(_) | Self::InvalidParameterFormat { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::BodyValidation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Repository(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request discarded: server error");
        } else {
            tracing::info!(error = %self, "Request discarded");
        }

        Envelope::<()>::error(status, self.to_string()).into_response()
    }
}

impl From<BindError> for ApiError {
    fn from(err: BindError) -> Self {
        match err {
            BindError::RequiredParam { name } => Self::MissingParameter(name.to_string()),
            BindError::InvalidParamFormat { name, cause } => Self::InvalidParameterFormat {
                name: name.to_string(),
                cause,
            },
            BindError::MalformedQuery(cause) => Self::InvalidParameterFormat {
                name: "query".to_string(),
                cause,
            },
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        tracing::debug!(reason = %err, "authentication failed");
        Self::Unauthorized
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(what) => Self::NotFound(what),
            RepositoryError::Duplicate(what) => Self::Conflict(what),
            RepositoryError::Storage(msg) => Self::Repository(msg),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::BodyValidation(errors.to_string())
    }
}

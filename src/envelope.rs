use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Envelope
///
/// The single response shape written by every operation, on success and on every
/// short-circuit path. `code` is always the HTTP status the response is sent with:
/// the status line is derived from it in `into_response`, and constructors only
/// accept a `StatusCode`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope<T = serde_json::Value> {
    pub code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<T>,
}

impl<T> Envelope<T> {
    pub fn new(status: StatusCode, error: Option<String>, body: Option<T>) -> Self {
        Self {
            code: status.as_u16(),
            error,
            body,
        }
    }

    /// 200 with a body.
    pub fn ok(body: T) -> Self {
        Self::new(StatusCode::OK, None, Some(body))
    }

    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(status, Some(message.into()), None)
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl Envelope<()> {
    /// 200 with no body, used by the mutating operations that return nothing.
    pub fn empty() -> Self {
        Self::new(StatusCode::OK, None, None)
    }

    /// 201 with no body.
    pub fn created() -> Self {
        Self::new(StatusCode::CREATED, None, None)
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

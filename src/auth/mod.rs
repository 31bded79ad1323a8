use axum::http::HeaderValue;
use thiserror::Error;

pub mod policy;
pub mod token;

pub use policy::{Capability, authorize};
pub use token::{Claims, TokenCodec};

/// Name of the header carrying the signed token on every protected operation.
pub const TOKEN_HEADER: &str = "token";

/// Role
///
/// The role claim of a verified token. Any string other than `user` or `admin`
/// decodes to `Unknown`, which authenticates but never satisfies a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
    Unknown,
}

impl Role {
    pub fn from_claim(raw: &str) -> Self {
        match raw {
            "user" => Role::User,
            "admin" => Role::Admin,
            _ => Role::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Unknown => "unknown",
        }
    }
}

/// Identity
///
/// The authenticated caller. Only `authenticate` produces it, and it lives for the
/// duration of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub role: Role,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("token header absent")]
    MissingToken,
    #[error("token header is not valid ASCII")]
    MalformedHeader,
    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
}

/// authenticate
///
/// The authentication gate: a pure function of the `Token` header and the codec.
///
/// NoToken -> `MissingToken`; a bad signature, malformed token, or a `role` claim
/// that is absent or not a string -> `InvalidToken`; otherwise the decoded identity.
pub fn authenticate(
    header: Option<&HeaderValue>,
    codec: &TokenCodec,
) -> Result<Identity, AuthError> {
    let raw = header.ok_or(AuthError::MissingToken)?;
    let token = raw.to_str().map_err(|_| AuthError::MalformedHeader)?.trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }

    let claims = codec.verify(token)?;
    let identity = Identity {
        role: Role::from_claim(&claims.role),
        username: claims.username,
    };

    tracing::debug!(username = %identity.username, role = identity.role.as_str(), "authenticated");
    Ok(identity)
}

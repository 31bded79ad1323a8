use super::{Identity, Role};
use crate::error::ApiError;

/// Capability
///
/// Coarse permission tag attached to each operation in the operation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Read,
    Write,
}

impl Capability {
    /// `write` is admin-only; `read` is open to users and admins.
    pub fn permits(self, role: Role) -> bool {
        match self {
            Capability::Write => role == Role::Admin,
            Capability::Read => matches!(role, Role::User | Role::Admin),
        }
    }
}

/// authorize
///
/// Operations without a capability (login, signup) are always allowed.
pub fn authorize(identity: &Identity, required: Option<Capability>) -> Result<(), ApiError> {
    match required {
        None => Ok(()),
        Some(capability) if capability.permits(identity.role) => Ok(()),
        Some(capability) => {
            tracing::info!(
                username = %identity.username,
                role = identity.role.as_str(),
                ?capability,
                "Request discarded: forbidden"
            );
            Err(ApiError::Forbidden)
        }
    }
}

use thiserror::Error;

/// Result type alias for Hostlink operations.
pub type Result<T> = std::result::Result<T, HostlinkError>;

/// Error kinds surfaced at the HTTP boundary (spec §7).
///
/// Each variant maps to exactly one HTTP status via [`HostlinkError::status_code`].
/// Repository errors propagate unmodified up to the service layer, which is
/// the only place that classifies them into one of these kinds.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostlinkError {
    /// Missing or malformed fields on a request body.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Registration token gate rejected the request (spec §4.2 step 1).
    #[error("Invalid token")]
    InvalidToken,

    /// Signature authentication failed (spec §4.3). The message is never
    /// echoed to the client — 401 responses stay generic by design.
    #[error("Unauthenticated")]
    Unauthenticated,

    /// Unknown id.
    #[error("{0} not found")]
    NotFound(String),

    /// Status DAG violation (spec §3 / §4.5).
    #[error("Illegal transition from {0} to {1}")]
    IllegalTransition(String, String),

    /// Reserved for future duplicate-agent semantics (spec §4.6).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Repository IO/connection failure.
    #[error("Transient error: {0}")]
    Transient(String),

    /// The agent exists but has no stored public key (spec §4.1,
    /// `get_public_key`). Distinct from `NotFound` so the authenticator can
    /// still respond 401 without conflating "unknown agent" with
    /// "agent has no credentials on file".
    #[error("Public key not found for agent {0}")]
    PublicKeyNotFound(String),
}

impl HostlinkError {
    pub fn not_found_agent(id: &str) -> Self {
        Self::NotFound(format!("Agent '{id}'"))
    }

    pub fn not_found_task(id: &str) -> Self {
        Self::NotFound(format!("Task '{id}'"))
    }

    pub fn empty_field(field: &str) -> Self {
        Self::Validation(format!("Field '{field}' cannot be empty"))
    }

    pub fn illegal_transition(from: &str, to: &str) -> Self {
        Self::IllegalTransition(from.to_string(), to.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, HostlinkError::NotFound(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, HostlinkError::Validation(_))
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, HostlinkError::Transient(_))
    }

    /// Convert to the HTTP status code spec §7 assigns this error kind.
    pub fn status_code(&self) -> u16 {
        match self {
            HostlinkError::Validation(_) => 400,
            HostlinkError::InvalidToken => 401,
            HostlinkError::Unauthenticated => 401,
            HostlinkError::NotFound(_) => 404,
            HostlinkError::IllegalTransition(_, _) => 400,
            HostlinkError::Conflict(_) => 409,
            HostlinkError::Transient(_) => 500,
            HostlinkError::PublicKeyNotFound(_) => 401,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_spec_table() {
        assert_eq!(HostlinkError::Validation("x".into()).status_code(), 400);
        assert_eq!(HostlinkError::InvalidToken.status_code(), 401);
        assert_eq!(HostlinkError::Unauthenticated.status_code(), 401);
        assert_eq!(HostlinkError::not_found_agent("agt_1").status_code(), 404);
        assert_eq!(
            HostlinkError::illegal_transition("completed", "running").status_code(),
            400
        );
        assert_eq!(HostlinkError::Conflict("dup".into()).status_code(), 409);
        assert_eq!(HostlinkError::Transient("io".into()).status_code(), 500);
    }

    #[test]
    fn predicates() {
        assert!(HostlinkError::not_found_agent("x").is_not_found());
        assert!(!HostlinkError::InvalidToken.is_not_found());
        assert!(HostlinkError::Validation("x".into()).is_validation());
        assert!(HostlinkError::Transient("x".into()).is_transient());
    }

    #[test]
    fn illegal_transition_is_400_not_409() {
        // spec §7: task update on an already-terminal task is 400, not 409,
        // because the resource exists and the state is knowable.
        let err = HostlinkError::illegal_transition("completed", "running");
        assert_eq!(err.status_code(), 400);
    }
}

use std::fmt;

/// Sentinel error returned by the repository layer. Services translate this
/// into protocol-specific codes; nothing above the repository boundary
/// should construct one of these from scratch except via [`RepoError::internal`].
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("not found")]
    NotFound,
    #[error("already exists")]
    AlreadyExists,
    /// Caller lacks scope over the target. Distinct from `NotFound` so the
    /// RPC layer can map it to `permissionDenied` without the repository
    /// having consulted whether the target itself exists.
    #[error("unauthorized")]
    Unauthorized,
    #[error("failed precondition: {0}")]
    FailedPrecondition(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl RepoError {
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        RepoError::Internal(err.into())
    }
}

/// Authentication-layer error: missing/invalid/expired credentials, invalid
/// SSO state, expired session. Always surfaces as 401 and must never reveal
/// which specific reason applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    MissingCredentials,
    InvalidToken,
    TokenExpired,
    InvalidState,
    MissingCode,
    SessionExpired,
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Deliberately uniform: messages must not reveal which specific
        // reason applied (missing vs. invalid vs. expired).
        f.write_str("Unauthorized: invalid credentials")
    }
}

impl std::error::Error for AuthFailure {}

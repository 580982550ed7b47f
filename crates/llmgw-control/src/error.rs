use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use llmgw_common::error::AuthFailure;
use llmgw_common::RepoError;
use serde::Serialize;

/// Control-plane RPC failure, carrying a single stable code vocabulary
/// across every operation. `ApiError::code()` is the stable string
/// surfaced in the JSON body; the HTTP status is derived from it rather
/// than the other way around.
#[derive(Debug)]
pub enum ApiError {
    Unauthenticated,
    PermissionDenied,
    InvalidArgument(String),
    NotFound,
    AlreadyExists,
    FailedPrecondition(String),
    Unimplemented,
    Internal,
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthenticated => "unauthenticated",
            ApiError::PermissionDenied => "permissionDenied",
            ApiError::InvalidArgument(_) => "invalidArgument",
            ApiError::NotFound => "notFound",
            ApiError::AlreadyExists => "alreadyExists",
            ApiError::FailedPrecondition(_) => "failedPrecondition",
            ApiError::Unimplemented => "unimplemented",
            ApiError::Internal => "internal",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::PermissionDenied => StatusCode::FORBIDDEN,
            ApiError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::AlreadyExists => StatusCode::CONFLICT,
            ApiError::FailedPrecondition(_) => StatusCode::PRECONDITION_FAILED,
            ApiError::Unimplemented => StatusCode::NOT_IMPLEMENTED,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::InvalidArgument(msg) | ApiError::FailedPrecondition(msg) => msg.clone(),
            other => other.code().to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code(),
            message: self.message(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Repository-level authorization is distinct from a missing target
/// (`RepoError::Unauthorized` vs `RepoError::NotFound`) precisely so this
/// mapping never has to decide which one to report from ambiguous
/// information; both would otherwise leak whether a resource exists.
impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => ApiError::NotFound,
            RepoError::AlreadyExists => ApiError::AlreadyExists,
            RepoError::Unauthorized => ApiError::PermissionDenied,
            RepoError::FailedPrecondition(msg) => ApiError::FailedPrecondition(msg),
            RepoError::InvalidArgument(msg) => ApiError::InvalidArgument(msg),
            RepoError::Internal(err) => {
                tracing::error!(error = %err, "repository internal error");
                ApiError::Internal
            }
        }
    }
}

impl From<AuthFailure> for ApiError {
    fn from(_: AuthFailure) -> Self {
        ApiError::Unauthenticated
    }
}

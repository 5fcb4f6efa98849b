use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Outcome of a rejected `register` or `login`. The messages are shown to
/// the end user verbatim.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Name must be at least 3 characters")]
    NameTooShort,

    #[error("Invalid email")]
    InvalidEmail,

    #[error("Password must be at least 6 characters")]
    PasswordTooShort,

    #[error("Email already registered")]
    EmailTaken,

    #[error("User not found")]
    UserNotFound,

    #[error("Incorrect password")]
    WrongPassword,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::NameTooShort | AuthError::InvalidEmail | AuthError::PasswordTooShort => {
                StatusCode::BAD_REQUEST
            }
            AuthError::EmailTaken => StatusCode::CONFLICT,
            AuthError::UserNotFound | AuthError::WrongPassword => StatusCode::UNAUTHORIZED,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text safe to hand to the UI; internal causes stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AuthError::Internal(_) => "Internal error".into(),
            other => other.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not logged in")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(ref e) => {
                error!(error = %e, "request failed");
                return (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response();
            }
        };

        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_failures_map_to_bad_request() {
        for err in [
            AuthError::NameTooShort,
            AuthError::InvalidEmail,
            AuthError::PasswordTooShort,
        ] {
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        }
        assert_eq!(AuthError::EmailTaken.status(), StatusCode::CONFLICT);
        assert_eq!(AuthError::WrongPassword.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn internal_causes_are_not_shown_to_users() {
        let err = AuthError::Internal(anyhow::anyhow!("disk on fire"));
        assert_eq!(err.public_message(), "Internal error");
        assert_eq!(AuthError::UserNotFound.public_message(), "User not found");
    }

    #[test]
    fn app_error_statuses() {
        assert_eq!(AppError::Unauthorized.into_response().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::NotFound("Assessment").into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("boom")).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

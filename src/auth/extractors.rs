use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::{auth::repo_types::User, error::AppError, state::AppState};

/// The user behind the session pointer; rejects with 401 when logged out.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        state
            .session
            .get_current_user()
            .await?
            .map(CurrentUser)
            .ok_or(AppError::Unauthorized)
    }
}

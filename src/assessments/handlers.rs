use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    assessments::{repo, repo_types::Assessment},
    auth::extractors::CurrentUser,
    error::AppError,
    plans,
    state::AppState,
};

pub fn assessment_routes() -> Router<AppState> {
    Router::new()
        .route("/assessments", get(list_assessments).put(put_assessment))
        .route(
            "/assessments/:id",
            get(get_assessment).delete(delete_assessment),
        )
}

#[instrument(skip(state, user))]
pub async fn list_assessments(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Assessment>>, AppError> {
    let items = repo::get_assessments(state.storage.as_ref(), Some(user.id)).await?;
    Ok(Json(items))
}

/// Loads `id` if it belongs to `owner`; someone else's record reads as missing.
async fn owned(state: &AppState, owner: Uuid, id: Uuid) -> Result<Option<Assessment>, AppError> {
    Ok(repo::get_assessment_by_id(state.storage.as_ref(), id)
        .await?
        .filter(|a| a.user_id == owner))
}

#[instrument(skip(state, user))]
pub async fn get_assessment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Assessment>, AppError> {
    owned(&state, user.id, id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("Assessment"))
}

#[instrument(skip(state, user, assessment))]
pub async fn put_assessment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(assessment): Json<Assessment>,
) -> Result<Json<Assessment>, AppError> {
    if assessment.user_id != user.id {
        warn!(user_id = %user.id, owner = %assessment.user_id, "assessment owner mismatch");
        return Err(AppError::Forbidden("Assessment belongs to another user"));
    }

    let storage = state.storage.as_ref();
    if repo::get_assessment_by_id(storage, assessment.id).await?.is_none() {
        let count = repo::get_assessments(storage, Some(user.id)).await?.len();
        if !plans::can_create_assessment(user.plan, count) {
            warn!(user_id = %user.id, plan = ?user.plan, count, "assessment limit reached");
            return Err(AppError::Forbidden("Assessment limit reached for current plan"));
        }
    }

    repo::save_assessment(storage, &assessment).await?;
    info!(user_id = %user.id, assessment_id = %assessment.id, "assessment stored");
    Ok(Json(assessment))
}

#[instrument(skip(state, user))]
pub async fn delete_assessment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if owned(&state, user.id, id).await?.is_some() {
        repo::delete_assessment(state.storage.as_ref(), id).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, instrument, warn};

use crate::{
    assessments,
    auth::{
        dto::{AuthResponse, LoginData, MeResponse, PublicUser, RegisterData},
        extractors::CurrentUser,
        services,
    },
    error::{AppError, AuthError},
    plans,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn failure(err: AuthError) -> (StatusCode, Json<AuthResponse>) {
    if let AuthError::Internal(ref e) = err {
        error!(error = %e, "auth request failed");
    }
    (err.status(), Json(AuthResponse::failed(err.public_message())))
}

fn rejected(rejection: JsonRejection) -> (StatusCode, Json<AuthResponse>) {
    warn!(error = %rejection.body_text(), "malformed auth body");
    (
        rejection.status(),
        Json(AuthResponse::failed(rejection.body_text())),
    )
}

#[instrument(skip(state, body))]
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterData>, JsonRejection>,
) -> (StatusCode, Json<AuthResponse>) {
    let Json(payload) = match body {
        Ok(body) => body,
        Err(rejection) => return rejected(rejection),
    };
    match services::register(&state, payload).await {
        Ok(user) => (StatusCode::CREATED, Json(AuthResponse::ok(&user))),
        Err(e) => failure(e),
    }
}

#[instrument(skip(state, body))]
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginData>, JsonRejection>,
) -> (StatusCode, Json<AuthResponse>) {
    let Json(payload) = match body {
        Ok(body) => body,
        Err(rejection) => return rejected(rejection),
    };
    match services::login(&state, payload).await {
        Ok(user) => (StatusCode::OK, Json(AuthResponse::ok(&user))),
        Err(e) => failure(e),
    }
}

#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    services::logout(&state).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, user))]
pub async fn get_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<MeResponse>, AppError> {
    let assessment_count = assessments::repo::get_assessments(state.storage.as_ref(), Some(user.id))
        .await?
        .len();
    Ok(Json(MeResponse {
        plan_features: user.plan.features(),
        can_create_assessment: plans::can_create_assessment(user.plan, assessment_count),
        assessment_count,
        user: PublicUser::from(&user),
    }))
}

use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{LoginData, RegisterData},
        password::{hash_password, verify_password},
        repo,
        repo_types::User,
    },
    error::AuthError,
    state::AppState,
};

const MIN_NAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 6;

/// Rules run in order; the first failure wins.
fn validate_registration(data: &RegisterData) -> Result<(), AuthError> {
    if data.name.chars().count() < MIN_NAME_LEN {
        return Err(AuthError::NameTooShort);
    }
    if !data.email.contains('@') {
        return Err(AuthError::InvalidEmail);
    }
    if data.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::PasswordTooShort);
    }
    Ok(())
}

/// Creates the account and logs it in.
#[instrument(skip(state, data), fields(email = %data.email))]
pub async fn register(state: &AppState, data: RegisterData) -> Result<User, AuthError> {
    if let Err(e) = validate_registration(&data) {
        warn!(reason = %e, "registration rejected");
        return Err(e);
    }

    let storage = state.storage.as_ref();
    if repo::get_user_by_email(storage, &data.email).await?.is_some() {
        warn!("email already registered");
        return Err(AuthError::EmailTaken);
    }

    let user = User {
        id: Uuid::new_v4(),
        name: data.name,
        email: data.email,
        password_hash: hash_password(&data.password)?,
        user_type: data.user_type,
        plan: data.plan.unwrap_or_default(),
        created_at: OffsetDateTime::now_utc(),
    };

    // Lost a race with a concurrent registration of the same address.
    if !repo::claim_email(storage, &user.email, user.id).await? {
        warn!("email claimed concurrently");
        return Err(AuthError::EmailTaken);
    }

    if let Err(e) = persist_and_log_in(state, &user).await {
        if let Err(undo) = repo::discard_user(storage, &user).await {
            error!(error = %undo, user_id = %user.id, "rollback of failed registration failed");
        }
        return Err(e.into());
    }

    info!(user_id = %user.id, plan = ?user.plan, "user registered");
    Ok(user)
}

async fn persist_and_log_in(state: &AppState, user: &User) -> anyhow::Result<()> {
    repo::save_user(state.storage.as_ref(), user).await?;
    state.session.set_current_user(Some(user)).await
}

#[instrument(skip(state, data), fields(email = %data.email))]
pub async fn login(state: &AppState, data: LoginData) -> Result<User, AuthError> {
    let Some(user) = repo::get_user_by_email(state.storage.as_ref(), &data.email).await? else {
        warn!("login unknown email");
        return Err(AuthError::UserNotFound);
    };

    if !verify_password(&data.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AuthError::WrongPassword);
    }

    state.session.set_current_user(Some(&user)).await?;
    info!(user_id = %user.id, "user logged in");
    Ok(user)
}

pub async fn logout(state: &AppState) -> anyhow::Result<()> {
    state.session.clear().await?;
    info!("user logged out");
    Ok(())
}

use tracing::warn;
use uuid::Uuid;

use crate::auth::repo_types::User;
use crate::storage::{self, keys, StorageClient};

fn user_key(id: Uuid) -> String {
    format!("{}{}", keys::USERS, id)
}

fn email_key(email: &str) -> String {
    format!("{}{}", keys::USER_EMAILS, email)
}

/// Upsert by id. A new user is appended; an existing one is replaced in place.
pub async fn save_user(storage: &dyn StorageClient, user: &User) -> anyhow::Result<()> {
    let key = user_key(user.id);
    if let Some(previous) = storage::get_json::<User>(storage, &key).await? {
        if previous.email != user.email {
            release_email(storage, &previous.email, user.id).await?;
        }
    }
    storage::set_json(storage, &key, user).await?;
    if !claim_email(storage, &user.email, user.id).await? {
        warn!(user_id = %user.id, "email already indexed for another user");
    }
    Ok(())
}

/// Atomically binds `email` to `user_id`. Returns `false` when another user
/// holds it.
pub async fn claim_email(
    storage: &dyn StorageClient,
    email: &str,
    user_id: Uuid,
) -> anyhow::Result<bool> {
    let key = email_key(email);
    let id = user_id.to_string();
    if storage.insert_if_absent(&key, &id).await? {
        return Ok(true);
    }
    Ok(storage.get(&key).await?.as_deref() == Some(id.as_str()))
}

pub(crate) async fn release_email(
    storage: &dyn StorageClient,
    email: &str,
    user_id: Uuid,
) -> anyhow::Result<()> {
    let key = email_key(email);
    if storage.get(&key).await?.as_deref() == Some(user_id.to_string().as_str()) {
        storage.delete(&key).await?;
    }
    Ok(())
}

/// Undoes a half-finished registration: drops the record and frees the
/// email, but only while the index still points at this user.
pub async fn discard_user(storage: &dyn StorageClient, user: &User) -> anyhow::Result<()> {
    storage.delete(&user_key(user.id)).await?;
    release_email(storage, &user.email, user.id).await
}

/// Every stored user in insertion order; empty when no backend is present.
pub async fn get_users(storage: &dyn StorageClient) -> anyhow::Result<Vec<User>> {
    if !storage.is_available() {
        return Ok(Vec::new());
    }
    storage::list_json(storage, keys::USERS).await
}

pub async fn get_user(storage: &dyn StorageClient, id: Uuid) -> anyhow::Result<Option<User>> {
    if !storage.is_available() {
        return Ok(None);
    }
    storage::get_json(storage, &user_key(id)).await
}

/// Exact, case-sensitive lookup.
pub async fn get_user_by_email(
    storage: &dyn StorageClient,
    email: &str,
) -> anyhow::Result<Option<User>> {
    if !storage.is_available() {
        return Ok(None);
    }
    let Some(raw_id) = storage.get(&email_key(email)).await? else {
        return Ok(None);
    };
    let Ok(id) = raw_id.parse::<Uuid>() else {
        warn!(email = %email, "malformed email index entry");
        return Ok(None);
    };
    get_user(storage, id).await
}

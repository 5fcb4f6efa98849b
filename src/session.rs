use std::sync::Arc;

use tracing::debug;

use crate::auth::repo_types::User;
use crate::storage::{self, keys, StorageClient};

/// Holds the "current user" pointer.
///
/// The stored value is a copy of the user taken at login; later edits to the
/// user record are not reflected until the next login.
#[derive(Clone)]
pub struct SessionProvider {
    storage: Arc<dyn StorageClient>,
}

impl SessionProvider {
    pub fn new(storage: Arc<dyn StorageClient>) -> Self {
        Self { storage }
    }

    /// `None` clears the pointer.
    pub async fn set_current_user(&self, user: Option<&User>) -> anyhow::Result<()> {
        match user {
            Some(user) => {
                storage::set_json(self.storage.as_ref(), keys::CURRENT_USER, user).await?;
                debug!(user_id = %user.id, "session set");
            }
            None => {
                self.storage.delete(keys::CURRENT_USER).await?;
                debug!("session cleared");
            }
        }
        Ok(())
    }

    pub async fn get_current_user(&self) -> anyhow::Result<Option<User>> {
        if !self.storage.is_available() {
            return Ok(None);
        }
        storage::get_json(self.storage.as_ref(), keys::CURRENT_USER).await
    }

    pub async fn clear(&self) -> anyhow::Result<()> {
        self.set_current_user(None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo_types::UserType;
    use crate::plans::SubscriptionPlan;
    use crate::storage::MemoryStorage;
    use time::macros::datetime;
    use uuid::Uuid;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Ana Silva".into(),
            email: "ana@x.com".into(),
            password_hash: "hash".into(),
            user_type: UserType::Consumer,
            plan: SubscriptionPlan::Basic,
            created_at: datetime!(2024-03-01 10:00:00 UTC),
        }
    }

    #[tokio::test]
    async fn set_get_and_clear() {
        let session = SessionProvider::new(Arc::new(MemoryStorage::new()));
        assert!(session.get_current_user().await.unwrap().is_none());

        let u = user();
        session.set_current_user(Some(&u)).await.unwrap();
        assert_eq!(session.get_current_user().await.unwrap(), Some(u));

        session.clear().await.unwrap();
        assert!(session.get_current_user().await.unwrap().is_none());
        // clearing twice is fine
        session.clear().await.unwrap();
    }

    #[tokio::test]
    async fn unavailable_backend_has_no_session() {
        let backend = Arc::new(MemoryStorage::new());
        let session = SessionProvider::new(backend.clone());
        session.set_current_user(Some(&user())).await.unwrap();
        backend.set_available(false);
        assert!(session.get_current_user().await.unwrap().is_none());
    }
}

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{User, UserType};
use crate::plans::{PlanFeatures, SubscriptionPlan};

/// Registration form input. Missing text fields read as empty and are
/// reported by validation.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(rename = "type")]
    pub user_type: UserType,
    #[serde(default)]
    pub plan: Option<SubscriptionPlan>,
}

/// Login form input.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Result object returned by register and login, success or not.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<PublicUser>,
}

impl AuthResponse {
    pub fn ok(user: &User) -> Self {
        Self {
            success: true,
            error: None,
            user: Some(PublicUser::from(user)),
        }
    }

    pub fn failed(error: String) -> Self {
        Self {
            success: false,
            error: Some(error),
            user: None,
        }
    }
}

/// User as shown to the client; never carries the password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(rename = "type")]
    pub user_type: UserType,
    pub plan: SubscriptionPlan,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&User> for PublicUser {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
            user_type: u.user_type,
            plan: u.plan,
            created_at: u.created_at,
        }
    }
}

/// Dashboard header: who is logged in and what their plan allows.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user: PublicUser,
    pub plan_features: &'static PlanFeatures,
    pub assessment_count: usize,
    pub can_create_assessment: bool,
}

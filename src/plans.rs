use axum::{routing::get, Json, Router};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Subscription tier stored on every user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPlan {
    #[default]
    Basic,
    Pro,
    Premium,
}

/// Display metadata and capability flags of a plan.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanFeatures {
    pub name: &'static str,
    pub price_cents: u32,
    pub features: Vec<&'static str>,
    /// `None` means unlimited.
    pub max_assessments: Option<usize>,
    pub ai_analysis: bool,
    pub pdf_reports: bool,
    pub historical_data: bool,
}

lazy_static! {
    static ref BASIC: PlanFeatures = PlanFeatures {
        name: "Basic",
        price_cents: 0,
        features: vec!["Up to 3 assessments", "Manual body measurements"],
        max_assessments: Some(3),
        ai_analysis: false,
        pdf_reports: false,
        historical_data: false,
    };
    static ref PRO: PlanFeatures = PlanFeatures {
        name: "PRO",
        price_cents: 7990,
        features: vec![
            "Unlimited assessments",
            "Advanced AI analysis",
            "PDF reports",
            "Full history",
            "Progress charts",
            "Priority support",
        ],
        max_assessments: None,
        ai_analysis: true,
        pdf_reports: true,
        historical_data: true,
    };
    static ref PREMIUM: PlanFeatures = PlanFeatures {
        name: "Premium",
        price_cents: 14990,
        features: vec![
            "Everything in PRO",
            "Body composition analysis",
            "Personalized recommendations",
            "Photo comparison",
            "Integration API",
            "24/7 support",
        ],
        max_assessments: None,
        ai_analysis: true,
        pdf_reports: true,
        historical_data: true,
    };
}

impl SubscriptionPlan {
    pub const ALL: [SubscriptionPlan; 3] = [Self::Basic, Self::Pro, Self::Premium];

    pub fn features(self) -> &'static PlanFeatures {
        match self {
            Self::Basic => &*BASIC,
            Self::Pro => &*PRO,
            Self::Premium => &*PREMIUM,
        }
    }
}

/// Whether a user on `plan` who already owns `current_count` assessments may add one.
pub fn can_create_assessment(plan: SubscriptionPlan, current_count: usize) -> bool {
    match plan.features().max_assessments {
        None => true,
        Some(limit) => current_count < limit,
    }
}

#[derive(Debug, Serialize)]
pub struct PlanEntry {
    pub plan: SubscriptionPlan,
    #[serde(flatten)]
    pub features: &'static PlanFeatures,
}

pub fn plans_routes() -> Router<AppState> {
    Router::new().route("/plans", get(list_plans))
}

pub async fn list_plans() -> Json<Vec<PlanEntry>> {
    Json(
        SubscriptionPlan::ALL
            .into_iter()
            .map(|plan| PlanEntry {
                plan,
                features: plan.features(),
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_plans_always_allow_new_assessments() {
        assert!(can_create_assessment(SubscriptionPlan::Pro, 0));
        assert!(can_create_assessment(SubscriptionPlan::Premium, 10_000));
    }

    #[test]
    fn basic_plan_stops_at_its_limit() {
        assert!(can_create_assessment(SubscriptionPlan::Basic, 2));
        assert!(!can_create_assessment(SubscriptionPlan::Basic, 3));
        assert!(!can_create_assessment(SubscriptionPlan::Basic, 4));
    }

    #[test]
    fn plan_tags_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&SubscriptionPlan::Premium).unwrap(), "\"premium\"");
        let plan: SubscriptionPlan = serde_json::from_str("\"pro\"").unwrap();
        assert_eq!(plan, SubscriptionPlan::Pro);
        assert_eq!(SubscriptionPlan::default(), SubscriptionPlan::Basic);
    }

    #[tokio::test]
    async fn catalog_lists_every_plan_with_flattened_features() {
        let Json(entries) = list_plans().await;
        assert_eq!(entries.len(), 3);
        let json = serde_json::to_value(&entries).unwrap();
        assert_eq!(json[1]["plan"], "pro");
        assert_eq!(json[1]["name"], "PRO");
        assert_eq!(json[1]["priceCents"], 7990);
        assert!(json[1]["maxAssessments"].is_null());
        assert_eq!(json[0]["maxAssessments"], 3);
    }
}

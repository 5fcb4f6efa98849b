use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// One body-composition assessment owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub id: Uuid,
    pub user_id: Uuid, // not checked against the user collection
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub photos: Vec<String>, // opaque references (URLs or data URIs)
    #[serde(default)]
    pub measurements: Measurements,
    pub ai_analysis: AiAnalysis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Body measurements; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chest: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waist: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hips: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legs: Option<f64>,
}

/// Analysis payload. Stored as given, never computed here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiAnalysis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_fat_percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muscle_mass: Option<f64>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    pub overall_score: f64,
}

//! Plan creation (`/api/dietplan/dietplan`) and the backend capability the
//! submission orchestrator depends on.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::profile::model::{CompleteProfile, Gender, Goal};

use super::ApiClient;
use super::user::{ProfileRecord, UserApi};

/// Body of the plan-creation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub age: u32,
    pub height: f64,
    pub weight: f64,
    pub gender: Gender,
    pub goal: Goal,
    pub activity_factor: f64,
    pub cuisine: String,
    pub restrictions: Vec<String>,
}

impl From<&CompleteProfile> for PlanRequest {
    fn from(profile: &CompleteProfile) -> Self {
        Self {
            age: profile.age(),
            height: profile.height_cm(),
            weight: profile.weight_kg(),
            gender: profile.gender(),
            goal: profile.goal(),
            activity_factor: profile.activity().factor(),
            cuisine: profile.cuisine().to_string(),
            restrictions: profile.restrictions().to_vec(),
        }
    }
}

/// One food entry of a meal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DietPlan {
    #[serde(default)]
    pub breakfast: Vec<MealItem>,
    #[serde(default)]
    pub lunch: Vec<MealItem>,
    #[serde(default)]
    pub dinner: Vec<MealItem>,
    #[serde(default)]
    pub snacks: Vec<MealItem>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl DietPlan {
    pub fn total_calories(&self) -> f64 {
        [&self.breakfast, &self.lunch, &self.dinner, &self.snacks]
            .into_iter()
            .flatten()
            .filter_map(|item| item.calories)
            .sum()
    }
}

/// Result of plan creation; forwarded unchanged into profile persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResponse {
    pub bmi: f64,
    pub bmi_category: String,
    pub calories: f64,
    #[serde(rename = "dietPlan")]
    pub diet_plan: DietPlan,
}

/// The two remote calls a profile submission makes.
#[async_trait]
pub trait DietPlanApi: Send + Sync {
    async fn create_plan(&self, request: &PlanRequest) -> Result<PlanResponse, ApiError>;
    async fn save_profile(&self, record: &ProfileRecord) -> Result<serde_json::Value, ApiError>;
}

#[async_trait]
impl DietPlanApi for ApiClient {
    async fn create_plan(&self, request: &PlanRequest) -> Result<PlanResponse, ApiError> {
        self.post(&["api", "dietplan", "dietplan"], request).await
    }

    async fn save_profile(&self, record: &ProfileRecord) -> Result<serde_json::Value, ApiError> {
        self.set_user_details(record).await
    }
}

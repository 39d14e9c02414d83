//! `/api/user/*` endpoints.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::profile::model::{ActivityLevel, CompleteProfile, Gender, Goal};

use super::ApiClient;
use super::dietplan::{DietPlan, PlanResponse};

/// Full profile as persisted by the backend: the wizard answers merged with
/// the plan-creation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub email: String,
    pub gender: Gender,
    pub age: u32,
    pub weight: f64,
    pub height: f64,
    #[serde(rename = "activityLevel")]
    pub activity_level: ActivityLevel,
    pub activity_factor: f64,
    pub cuisine: String,
    pub restrictions: Vec<String>,
    pub goal: Goal,
    pub bmi: f64,
    pub bmi_category: String,
    pub calories: f64,
    #[serde(rename = "dietPlan")]
    pub diet_plan: DietPlan,
}

impl ProfileRecord {
    pub fn merge(profile: &CompleteProfile, plan: PlanResponse) -> Self {
        Self {
            email: profile.email().to_string(),
            gender: profile.gender(),
            age: profile.age(),
            weight: profile.weight_kg(),
            height: profile.height_cm(),
            activity_level: profile.activity(),
            activity_factor: profile.activity().factor(),
            cuisine: profile.cuisine().to_string(),
            restrictions: profile.restrictions().to_vec(),
            goal: profile.goal(),
            bmi: plan.bmi,
            bmi_category: plan.bmi_category,
            calories: plan.calories,
            diet_plan: plan.diet_plan,
        }
    }
}

#[async_trait]
pub trait UserApi: Send + Sync {
    async fn set_user_details(&self, record: &ProfileRecord)
    -> Result<serde_json::Value, ApiError>;
    async fn get_user_details(&self, email: &str) -> Result<ProfileRecord, ApiError>;
}

#[async_trait]
impl UserApi for ApiClient {
    async fn set_user_details(
        &self,
        record: &ProfileRecord,
    ) -> Result<serde_json::Value, ApiError> {
        self.put(&["api", "user", "set-user-details", record.email.as_str()], record)
            .await
    }

    async fn get_user_details(&self, email: &str) -> Result<ProfileRecord, ApiError> {
        self.get(&["api", "user", "get-user-details", email]).await
    }
}

use serde::{Deserialize, Deserializer, Serialize};

use super::generator::{GenerationReport, MealEntity, ScheduleEntity};
use super::goal::Goal;
use super::repo::{NutritionPlan, Stored};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanRequest {
    pub name: String,
    pub goal: Goal,
    #[serde(default)]
    pub avoid: Vec<String>,
    pub meals_per_day: usize,
}

/// Partial update of a scheduled meal; absent fields are left alone.
/// `time: null` clears the time, which shows up as `Some(None)`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMealRequest {
    pub is_eaten: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    pub time: Option<Option<String>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanCreatedResponse {
    pub plan: Stored<NutritionPlan>,
    pub generation: GenerationReport,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleWithMeals {
    #[serde(flatten)]
    pub schedule: Stored<ScheduleEntity>,
    pub meals: Vec<Stored<MealEntity>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionSummary {
    pub total_meals: usize,
    pub eaten_meals: usize,
    pub completion_rate: f64,
    pub total_calories: f64,
    pub eaten_calories: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDetails {
    pub plan: Stored<NutritionPlan>,
    pub schedules: Vec<ScheduleWithMeals>,
    pub summary: CompletionSummary,
}

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use super::error::PlanError;
use super::generator::{MealEntity, ScheduleEntity};
use super::goal::Goal;
use crate::store::{
    Action, Document, DocumentStore, Permission, Query, StoreError, MEALS, MEAL_SCHEDULES,
    NUTRITION_PLANS,
};

/// Nutrition plan document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionPlan {
    pub user_id: Uuid,
    pub name: String,
    pub goal: Goal,
    #[serde(default)]
    pub avoid: Vec<String>,
    pub meals_per_day: usize,
}

/// A decoded document together with its store identity.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stored<T> {
    pub id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(flatten)]
    pub data: T,
}

impl<T: DeserializeOwned> Stored<T> {
    pub fn from_document(doc: &Document) -> Result<Self, StoreError> {
        Ok(Self {
            id: doc.id,
            created_at: doc.created_at,
            data: doc.decode()?,
        })
    }
}

fn decode_all<T: DeserializeOwned>(docs: &[Document]) -> Result<Vec<Stored<T>>, StoreError> {
    docs.iter().map(Stored::from_document).collect()
}

pub async fn insert_plan(
    store: &dyn DocumentStore,
    plan: &NutritionPlan,
) -> Result<Stored<NutritionPlan>, PlanError> {
    let doc = store
        .create_document(
            NUTRITION_PLANS,
            serde_json::to_value(plan)?,
            Permission::owner(plan.user_id),
        )
        .await?;
    Ok(Stored::from_document(&doc)?)
}

/// Loads a plan the user holds `action` rights on. Plans the user cannot see
/// are reported as missing.
pub async fn find_plan(
    store: &dyn DocumentStore,
    user_id: Uuid,
    plan_id: Uuid,
    action: Action,
) -> Result<Stored<NutritionPlan>, PlanError> {
    let doc = match store.get_document(NUTRITION_PLANS, plan_id).await {
        Ok(doc) => doc,
        Err(StoreError::NotFound { .. }) => return Err(PlanError::PlanNotFound(plan_id)),
        Err(e) => return Err(e.into()),
    };
    if !doc.allows(action, user_id) {
        return Err(PlanError::PlanNotFound(plan_id));
    }
    Ok(Stored::from_document(&doc)?)
}

/// The user's plans, newest first.
pub async fn list_plans(
    store: &dyn DocumentStore,
    user_id: Uuid,
) -> Result<Vec<Stored<NutritionPlan>>, PlanError> {
    let docs = store
        .list_documents(NUTRITION_PLANS, &[Query::equal("userId", user_id.to_string())])
        .await?;
    let mut plans = decode_all::<NutritionPlan>(&docs)?;
    plans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(plans)
}

/// Schedules of a plan ordered Sunday to Saturday.
pub async fn list_schedules(
    store: &dyn DocumentStore,
    plan_id: Uuid,
) -> Result<Vec<Stored<ScheduleEntity>>, PlanError> {
    let docs = store
        .list_documents(
            MEAL_SCHEDULES,
            &[
                Query::equal("nutritionPlanId", plan_id.to_string()),
                Query::order_asc("dayOfWeek"),
            ],
        )
        .await?;
    Ok(decode_all(&docs)?)
}

pub async fn list_meals(
    store: &dyn DocumentStore,
    schedule_id: Uuid,
) -> Result<Vec<Stored<MealEntity>>, PlanError> {
    let docs = store
        .list_documents(
            MEALS,
            &[Query::equal("mealScheduleId", schedule_id.to_string())],
        )
        .await?;
    Ok(decode_all(&docs)?)
}

pub async fn update_meal(
    store: &dyn DocumentStore,
    user_id: Uuid,
    meal_id: Uuid,
    patch: Value,
) -> Result<Stored<MealEntity>, PlanError> {
    let doc = match store.get_document(MEALS, meal_id).await {
        Ok(doc) => doc,
        Err(StoreError::NotFound { .. }) => return Err(PlanError::MealNotFound(meal_id)),
        Err(e) => return Err(e.into()),
    };
    if !doc.allows(Action::Update, user_id) {
        return Err(PlanError::MealNotFound(meal_id));
    }
    let updated = store.update_document(MEALS, meal_id, patch).await?;
    Ok(Stored::from_document(&updated)?)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionCounts {
    pub schedules: usize,
    pub meals: usize,
}

/// Removes a plan's meals, then its schedules, then the plan itself.
pub async fn delete_plan_cascade(
    store: &dyn DocumentStore,
    plan_id: Uuid,
) -> Result<DeletionCounts, PlanError> {
    let mut counts = DeletionCounts::default();
    for schedule in list_schedules(store, plan_id).await? {
        for meal in list_meals(store, schedule.id).await? {
            store.delete_document(MEALS, meal.id).await?;
            counts.meals += 1;
        }
        store.delete_document(MEAL_SCHEDULES, schedule.id).await?;
        counts.schedules += 1;
    }
    store.delete_document(NUTRITION_PLANS, plan_id).await?;
    Ok(counts)
}

use serde_json::{Map, Value};
use time::Date;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{
    CompletionSummary, CreatePlanRequest, PlanCreatedResponse, PlanDetails, ScheduleWithMeals,
    UpdateMealRequest,
};
use super::error::PlanError;
use super::filter::filter_meals;
use super::generator::{generate_meal_plan, GenerationReport, MealEntity, PlanTarget};
use super::repo::{self, DeletionCounts, NutritionPlan, Stored};
use crate::state::AppState;
use crate::store::Action;

pub const MAX_MEALS_PER_DAY: usize = 10;

fn validate(req: &CreatePlanRequest) -> Result<(), PlanError> {
    if req.name.trim().is_empty() {
        return Err(PlanError::InvalidRequest("name must not be empty".into()));
    }
    if !(1..=MAX_MEALS_PER_DAY).contains(&req.meals_per_day) {
        return Err(PlanError::InvalidRequest(format!(
            "mealsPerDay must be between 1 and {MAX_MEALS_PER_DAY}"
        )));
    }
    Ok(())
}

/// Stores a new plan and generates its week of meals.
#[instrument(skip(state, req))]
pub async fn create_plan(
    state: &AppState,
    user_id: Uuid,
    req: CreatePlanRequest,
    today: Date,
) -> Result<PlanCreatedResponse, PlanError> {
    validate(&req)?;
    let plan = repo::insert_plan(
        state.store.as_ref(),
        &NutritionPlan {
            user_id,
            name: req.name.trim().to_string(),
            goal: req.goal,
            avoid: req.avoid,
            meals_per_day: req.meals_per_day,
        },
    )
    .await?;
    info!(plan_id = %plan.id, goal = plan.data.goal.label(), "nutrition plan created");

    let generation = generate_for_plan(state, user_id, &plan, today).await?;
    Ok(PlanCreatedResponse { plan, generation })
}

/// Fetches the catalog, narrows it to the plan's preferences and writes the week.
pub async fn generate_for_plan(
    state: &AppState,
    user_id: Uuid,
    plan: &Stored<NutritionPlan>,
    today: Date,
) -> Result<GenerationReport, PlanError> {
    let catalog = state.catalog.fetch_meals().await?;
    if catalog.is_empty() {
        warn!(plan_id = %plan.id, "catalog has no meal types; schedules will be empty");
    }
    let filtered = filter_meals(&catalog, &plan.data.goal, &plan.data.avoid);
    info!(
        plan_id = %plan.id,
        candidates = catalog.total_candidates(),
        kept = filtered.total_candidates(),
        "catalog filtered"
    );
    let target = PlanTarget {
        id: plan.id,
        meals_per_day: plan.data.meals_per_day,
    };
    generate_meal_plan(state.store.as_ref(), &target, &filtered, user_id, today).await
}

/// Generates the week for an existing plan that has none yet.
#[instrument(skip(state))]
pub async fn regenerate_plan(
    state: &AppState,
    user_id: Uuid,
    plan_id: Uuid,
    today: Date,
) -> Result<GenerationReport, PlanError> {
    let plan = repo::find_plan(state.store.as_ref(), user_id, plan_id, Action::Update).await?;
    if !repo::list_schedules(state.store.as_ref(), plan_id).await?.is_empty() {
        return Err(PlanError::AlreadyGenerated(plan_id));
    }
    generate_for_plan(state, user_id, &plan, today).await
}

pub async fn list_plans(
    state: &AppState,
    user_id: Uuid,
) -> Result<Vec<Stored<NutritionPlan>>, PlanError> {
    repo::list_plans(state.store.as_ref(), user_id).await
}

#[instrument(skip(state))]
pub async fn plan_details(
    state: &AppState,
    user_id: Uuid,
    plan_id: Uuid,
) -> Result<PlanDetails, PlanError> {
    let store = state.store.as_ref();
    let plan = repo::find_plan(store, user_id, plan_id, Action::Read).await?;

    let mut schedules = Vec::new();
    for schedule in repo::list_schedules(store, plan_id).await? {
        let meals = repo::list_meals(store, schedule.id).await?;
        schedules.push(ScheduleWithMeals { schedule, meals });
    }
    let summary = summarize(
        schedules
            .iter()
            .flat_map(|s| s.meals.iter().map(|m| &m.data)),
    );
    Ok(PlanDetails {
        plan,
        schedules,
        summary,
    })
}

/// Eaten/total counts and calories over a set of scheduled meals.
pub fn summarize<'a>(meals: impl IntoIterator<Item = &'a MealEntity>) -> CompletionSummary {
    let mut summary = CompletionSummary::default();
    for meal in meals {
        summary.total_meals += 1;
        summary.total_calories += meal.calories;
        if meal.is_eaten {
            summary.eaten_meals += 1;
            summary.eaten_calories += meal.calories;
        }
    }
    if summary.total_meals > 0 {
        summary.completion_rate = summary.eaten_meals as f64 / summary.total_meals as f64;
    }
    summary
}

#[instrument(skip(state))]
pub async fn delete_plan(
    state: &AppState,
    user_id: Uuid,
    plan_id: Uuid,
) -> Result<DeletionCounts, PlanError> {
    repo::find_plan(state.store.as_ref(), user_id, plan_id, Action::Delete).await?;
    let counts = repo::delete_plan_cascade(state.store.as_ref(), plan_id).await?;
    info!(%plan_id, schedules = counts.schedules, meals = counts.meals, "nutrition plan deleted");
    Ok(counts)
}

#[instrument(skip(state, req))]
pub async fn update_meal(
    state: &AppState,
    user_id: Uuid,
    meal_id: Uuid,
    req: UpdateMealRequest,
) -> Result<Stored<MealEntity>, PlanError> {
    let mut patch = Map::new();
    if let Some(is_eaten) = req.is_eaten {
        patch.insert("isEaten".into(), Value::Bool(is_eaten));
    }
    match req.time {
        Some(Some(time)) => {
            patch.insert("time".into(), Value::String(time));
        }
        Some(None) => {
            patch.insert("time".into(), Value::Null);
        }
        None => {}
    }
    if patch.is_empty() {
        return Err(PlanError::InvalidRequest(
            "nothing to update; expected isEaten or time".into(),
        ));
    }
    repo::update_meal(state.store.as_ref(), user_id, meal_id, Value::Object(patch)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::nutrition::goal::Goal;
    use crate::store::{MEALS, MEAL_SCHEDULES, NUTRITION_PLANS};
    use serde_json::json;
    use time::macros::date;

    const TODAY: Date = date!(2026 - 10 - 14);

    fn catalog() -> Catalog {
        serde_json::from_value(json!({
            "breakfast": [
                { "title": "Egg Scramble", "ingredients": ["eggs", "butter"], "calories": 350 },
                { "title": "Peanut Toast", "ingredients": ["bread", "peanut butter"], "calories": 420 }
            ],
            "lunch": [
                { "title": "Chicken Wrap", "ingredients": ["chicken", "tortilla"], "calories": 560,
                  "instructions": ["Grill chicken", "Wrap"] }
            ],
            "dinner": [
                { "title": "Salmon Plate", "ingredients": ["salmon", "rice"], "calories": 640 },
                { "title": "Veggie Stir Fry", "ingredients": ["broccoli", "soy sauce"], "calories": 380 }
            ]
        }))
        .unwrap()
    }

    fn request(goal: &str, meals_per_day: usize) -> CreatePlanRequest {
        CreatePlanRequest {
            name: "Cut week".into(),
            goal: Goal::from(goal),
            avoid: vec!["Peanut".into()],
            meals_per_day,
        }
    }

    async fn count(state: &AppState, collection: &str) -> usize {
        state.store.list_documents(collection, &[]).await.unwrap().len()
    }

    #[tokio::test]
    async fn create_plan_filters_and_generates_week() {
        let state = AppState::fake_with_catalog(catalog());
        let user = Uuid::new_v4();
        let created = create_plan(&state, user, request("Build Muscle", 3), TODAY)
            .await
            .unwrap();

        assert_eq!(created.plan.data.user_id, user);
        assert_eq!(created.generation.days.len(), 7);
        assert_eq!(created.generation.total_meals(), 21);

        let details = plan_details(&state, user, created.plan.id).await.unwrap();
        let monday: Vec<_> = details.schedules[1]
            .meals
            .iter()
            .map(|m| m.data.title.as_str())
            .collect();
        // Peanut Toast is avoided and Veggie Stir Fry carries no muscle tag.
        assert_eq!(monday, vec!["Egg Scramble", "Chicken Wrap", "Salmon Plate"]);
        assert_eq!(details.schedules[1].meals[1].data.instructions, "Grill chicken\nWrap");
        assert_eq!(details.summary.total_meals, 21);
        assert_eq!(details.summary.completion_rate, 0.0);
    }

    #[tokio::test]
    async fn create_plan_rejects_bad_meal_counts() {
        let state = AppState::fake_with_catalog(catalog());
        for meals_per_day in [0, MAX_MEALS_PER_DAY + 1] {
            let err = create_plan(&state, Uuid::new_v4(), request("Lose Fat", meals_per_day), TODAY)
                .await
                .unwrap_err();
            assert!(matches!(err, PlanError::InvalidRequest(_)));
        }
        assert_eq!(count(&state, NUTRITION_PLANS).await, 0);
    }

    #[tokio::test]
    async fn regenerate_refuses_plan_with_schedules() {
        let state = AppState::fake_with_catalog(catalog());
        let user = Uuid::new_v4();
        let created = create_plan(&state, user, request("Maintain Weight", 2), TODAY)
            .await
            .unwrap();
        let err = regenerate_plan(&state, user, created.plan.id, TODAY)
            .await
            .unwrap_err();
        assert!(matches!(err, PlanError::AlreadyGenerated(id) if id == created.plan.id));
        assert_eq!(count(&state, MEAL_SCHEDULES).await, 7);
    }

    #[tokio::test]
    async fn plans_are_private_to_their_owner() {
        let state = AppState::fake_with_catalog(catalog());
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let created = create_plan(&state, owner, request("Lose Fat", 1), TODAY)
            .await
            .unwrap();

        let err = plan_details(&state, stranger, created.plan.id).await.unwrap_err();
        assert!(matches!(err, PlanError::PlanNotFound(_)));
        let err = delete_plan(&state, stranger, created.plan.id).await.unwrap_err();
        assert!(matches!(err, PlanError::PlanNotFound(_)));
        assert!(list_plans(&state, stranger).await.unwrap().is_empty());
        assert_eq!(list_plans(&state, owner).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_plan_cascades() {
        let state = AppState::fake_with_catalog(catalog());
        let user = Uuid::new_v4();
        let keep = create_plan(&state, user, request("Maintain Weight", 1), TODAY)
            .await
            .unwrap();
        let doomed = create_plan(&state, user, request("Maintain Weight", 2), TODAY)
            .await
            .unwrap();

        let counts = delete_plan(&state, user, doomed.plan.id).await.unwrap();
        assert_eq!(counts, DeletionCounts { schedules: 7, meals: 14 });
        assert_eq!(count(&state, NUTRITION_PLANS).await, 1);
        assert_eq!(count(&state, MEAL_SCHEDULES).await, 7);
        assert_eq!(count(&state, MEALS).await, 7);
        assert!(plan_details(&state, user, keep.plan.id).await.is_ok());
    }

    #[tokio::test]
    async fn marking_meals_eaten_updates_summary() {
        let state = AppState::fake_with_catalog(catalog());
        let user = Uuid::new_v4();
        let created = create_plan(&state, user, request("Maintain Weight", 2), TODAY)
            .await
            .unwrap();
        let meal_id = created.generation.days[0].meal_ids[0];

        let updated = update_meal(
            &state,
            user,
            meal_id,
            UpdateMealRequest {
                is_eaten: Some(true),
                time: Some(Some("07:30".into())),
            },
        )
        .await
        .unwrap();
        assert!(updated.data.is_eaten);
        assert_eq!(updated.data.time.as_deref(), Some("07:30"));

        let cleared = update_meal(
            &state,
            user,
            meal_id,
            UpdateMealRequest {
                is_eaten: None,
                time: Some(None),
            },
        )
        .await
        .unwrap();
        assert!(cleared.data.is_eaten);
        assert_eq!(cleared.data.time, None);

        let details = plan_details(&state, user, created.plan.id).await.unwrap();
        assert_eq!(details.summary.eaten_meals, 1);
        assert_eq!(details.summary.total_meals, 14);
        assert_eq!(details.summary.eaten_calories, 350.0);
        assert!((details.summary.completion_rate - 1.0 / 14.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn update_meal_checks_owner_and_payload() {
        let state = AppState::fake_with_catalog(catalog());
        let user = Uuid::new_v4();
        let created = create_plan(&state, user, request("Maintain Weight", 1), TODAY)
            .await
            .unwrap();
        let meal_id = created.generation.days[0].meal_ids[0];

        let err = update_meal(&state, user, meal_id, UpdateMealRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PlanError::InvalidRequest(_)));

        let err = update_meal(
            &state,
            Uuid::new_v4(),
            meal_id,
            UpdateMealRequest {
                is_eaten: Some(true),
                time: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PlanError::MealNotFound(_)));
    }

    #[test]
    fn summarize_handles_no_meals() {
        let summary = summarize(std::iter::empty());
        assert_eq!(summary, CompletionSummary::default());
    }
}

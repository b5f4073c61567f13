use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use time::{Date, Duration};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::error::PlanError;
use crate::catalog::{Catalog, MealCandidate};
use crate::store::{DocumentStore, Permission, StoreError, MEALS, MEAL_SCHEDULES};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

pub const DAYS_PER_WEEK: u8 = 7;
/// Hard bound on round-robin steps per day, reached when pools run dry.
pub const MAX_SELECTION_ROUNDS: usize = 20;

/// One day of a nutrition plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntity {
    pub nutrition_plan_id: Uuid,
    /// 0 = Sunday .. 6 = Saturday
    pub day_of_week: u8,
    #[serde(with = "iso_date")]
    pub date: Date,
}

/// One scheduled meal, with list fields flattened to text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealEntity {
    pub meal_schedule_id: Uuid,
    pub title: String,
    #[serde(rename = "type")]
    pub meal_type: String,
    pub calories: f64,
    pub ingredients: String,
    pub instructions: String,
    pub image: Option<String>,
    pub is_eaten: bool,
    pub time: Option<String>,
}

impl MealEntity {
    pub fn scheduled(schedule_id: Uuid, selected: &SelectedMeal) -> Self {
        let meal = &selected.candidate;
        Self {
            meal_schedule_id: schedule_id,
            title: meal.title.clone(),
            meal_type: selected.meal_type.clone(),
            calories: meal.calories,
            ingredients: meal.ingredients.join(", "),
            instructions: meal.instructions.joined(),
            image: meal.image.clone(),
            is_eaten: false,
            time: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectedMeal {
    pub meal_type: String,
    pub candidate: MealCandidate,
}

#[derive(Debug, Clone, Copy)]
pub struct PlanTarget {
    pub id: Uuid,
    pub meals_per_day: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedDay {
    pub schedule_id: Uuid,
    pub day_of_week: u8,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub meal_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationReport {
    pub plan_id: Uuid,
    pub days: Vec<GeneratedDay>,
}

impl GenerationReport {
    pub fn total_meals(&self) -> usize {
        self.days.iter().map(|d| d.meal_ids.len()).sum()
    }
}

/// Date of `day_of_week` (0 = Sunday) in the Sunday-started week containing
/// `today`. Days earlier in the week resolve to past dates.
pub fn week_date(today: Date, day_of_week: u8) -> Date {
    let offset = i64::from(day_of_week) - i64::from(today.weekday().number_days_from_sunday());
    today + Duration::days(offset)
}

/// Picks the meals for one day: cycle through meal types in catalog order,
/// taking the first meal left in each type's pool and skipping empty pools,
/// until `meals_per_day` are chosen or [`MAX_SELECTION_ROUNDS`] steps pass.
/// Works on its own copy of the pools, so a meal fills at most one slot.
pub fn preview_day(catalog: &Catalog, meals_per_day: usize) -> Vec<SelectedMeal> {
    let mut pools: Vec<(&str, VecDeque<MealCandidate>)> = catalog
        .iter()
        .map(|(meal_type, candidates)| (meal_type, candidates.iter().cloned().collect()))
        .collect();

    let mut selected = Vec::with_capacity(meals_per_day);
    if pools.is_empty() {
        return selected;
    }

    let mut round = 0;
    while selected.len() < meals_per_day && round < MAX_SELECTION_ROUNDS {
        let slot = round % pools.len();
        let (meal_type, pool) = &mut pools[slot];
        if let Some(candidate) = pool.pop_front() {
            selected.push(SelectedMeal {
                meal_type: meal_type.to_string(),
                candidate,
            });
        }
        round += 1;
    }
    selected
}

/// Writes a week of schedules and meals for `plan`, one document at a time.
///
/// Every document is owned by `user_id`. The first failed write ends the run;
/// whatever was written before it stays in the store.
#[instrument(skip(store, catalog), fields(plan_id = %plan.id))]
pub async fn generate_meal_plan(
    store: &dyn DocumentStore,
    plan: &PlanTarget,
    catalog: &Catalog,
    user_id: Uuid,
    today: Date,
) -> Result<GenerationReport, PlanError> {
    info!(
        meals_per_day = plan.meals_per_day,
        meal_types = catalog.meal_types().count(),
        candidates = catalog.total_candidates(),
        "generating meal plan"
    );

    let permissions = Permission::owner(user_id);
    let mut days = Vec::with_capacity(usize::from(DAYS_PER_WEEK));
    let mut meals_written = 0usize;

    let abort = |e: StoreError, days_written: usize, meals_written: usize| {
        error!(
            error = %e,
            schedules_written = days_written,
            meals_written,
            "meal plan generation aborted; partial plan left in store"
        );
        PlanError::Store(e)
    };

    for day_of_week in 0..DAYS_PER_WEEK {
        let schedule = ScheduleEntity {
            nutrition_plan_id: plan.id,
            day_of_week,
            date: week_date(today, day_of_week),
        };
        let schedule_doc = store
            .create_document(
                MEAL_SCHEDULES,
                serde_json::to_value(&schedule)?,
                permissions.clone(),
            )
            .await
            .map_err(|e| abort(e, days.len(), meals_written))?;

        let selected = preview_day(catalog, plan.meals_per_day);
        if selected.len() < plan.meals_per_day {
            warn!(
                day_of_week,
                requested = plan.meals_per_day,
                selected = selected.len(),
                "not enough candidate meals for this day"
            );
        }

        let mut meal_ids = Vec::with_capacity(selected.len());
        for meal in &selected {
            let entity = MealEntity::scheduled(schedule_doc.id, meal);
            let meal_doc = store
                .create_document(MEALS, serde_json::to_value(&entity)?, permissions.clone())
                .await
                .map_err(|e| abort(e, days.len() + 1, meals_written))?;
            meals_written += 1;
            meal_ids.push(meal_doc.id);
        }

        debug!(day_of_week, date = %schedule.date, meals = meal_ids.len(), "day scheduled");
        days.push(GeneratedDay {
            schedule_id: schedule_doc.id,
            day_of_week,
            date: schedule.date,
            meal_ids,
        });
    }

    info!(meals = meals_written, "meal plan generated");
    Ok(GenerationReport {
        plan_id: plan.id,
        days,
    })
}

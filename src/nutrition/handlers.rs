use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, patch, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{error, instrument, warn};
use uuid::Uuid;

use super::dto::{CreatePlanRequest, PlanCreatedResponse, PlanDetails, UpdateMealRequest};
use super::error::PlanError;
use super::generator::{GenerationReport, MealEntity};
use super::repo::{NutritionPlan, Stored};
use super::services;
use crate::{auth::jwt::AuthUser, state::AppState};

pub fn plan_routes() -> Router<AppState> {
    Router::new()
        .route("/nutrition-plans", post(create_plan).get(list_plans))
        .route("/nutrition-plans/:id", get(get_plan).delete(delete_plan))
        .route("/nutrition-plans/:id/generate", post(generate_plan))
}

pub fn meal_routes() -> Router<AppState> {
    Router::new().route("/meals/:id", patch(update_meal))
}

fn reject(e: PlanError) -> (StatusCode, String) {
    let status = e.status();
    if status.is_server_error() {
        error!(error = %e, "nutrition request failed");
    } else {
        warn!(error = %e, %status, "nutrition request rejected");
    }
    e.into()
}

fn today() -> time::Date {
    OffsetDateTime::now_utc().date()
}

/// POST /nutrition-plans { name, goal, avoid?, mealsPerDay }
#[instrument(skip(state, body))]
pub async fn create_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreatePlanRequest>,
) -> Result<(StatusCode, HeaderMap, Json<PlanCreatedResponse>), (StatusCode, String)> {
    let created = services::create_plan(&state, user_id, body, today())
        .await
        .map_err(reject)?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = format!("/api/v1/nutrition-plans/{}", created.plan.id).parse() {
        headers.insert(axum::http::header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(created)))
}

#[instrument(skip(state))]
pub async fn list_plans(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Stored<NutritionPlan>>>, (StatusCode, String)> {
    let plans = services::list_plans(&state, user_id).await.map_err(reject)?;
    Ok(Json(plans))
}

#[instrument(skip(state))]
pub async fn get_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PlanDetails>, (StatusCode, String)> {
    let details = services::plan_details(&state, user_id, id)
        .await
        .map_err(reject)?;
    Ok(Json(details))
}

/// POST /nutrition-plans/:id/generate. Refused once the plan has schedules.
#[instrument(skip(state))]
pub async fn generate_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<GenerationReport>), (StatusCode, String)> {
    let report = services::regenerate_plan(&state, user_id, id, today())
        .await
        .map_err(reject)?;
    Ok((StatusCode::CREATED, Json(report)))
}

#[instrument(skip(state))]
pub async fn delete_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    services::delete_plan(&state, user_id, id)
        .await
        .map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /meals/:id { isEaten?, time? }
#[instrument(skip(state, body))]
pub async fn update_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateMealRequest>,
) -> Result<Json<Stored<MealEntity>>, (StatusCode, String)> {
    let meal = services::update_meal(&state, user_id, id, body)
        .await
        .map_err(reject)?;
    Ok(Json(meal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::JwtKeys, catalog::Catalog};
    use axum::{body::Body, extract::FromRef, http::Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn state() -> AppState {
        let catalog: Catalog = serde_json::from_value(json!({
            "breakfast": [{ "title": "Oats", "ingredients": ["oats", "milk"], "calories": 300 }],
            "lunch": [{ "title": "Chicken Salad", "ingredients": ["chicken", "lettuce"], "calories": 450 }]
        }))
        .unwrap();
        AppState::fake_with_catalog(catalog)
    }

    fn bearer(state: &AppState, user_id: Uuid) -> String {
        let token = JwtKeys::from_ref(state).sign_access(user_id).unwrap();
        format!("Bearer {token}")
    }

    async fn send(
        state: &AppState,
        method: &str,
        uri: &str,
        auth: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let app = crate::app::build_app(state.clone());
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            req = req.header("authorization", auth);
        }
        let req = match body {
            Some(body) => req
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), 1_048_576).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn requires_bearer_token() {
        let state = state();
        let (status, _) = send(&state, "GET", "/api/v1/nutrition-plans", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = send(
            &state,
            "GET",
            "/api/v1/nutrition-plans",
            Some("Bearer not-a-token"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn plan_lifecycle_over_http() {
        let state = state();
        let auth = bearer(&state, Uuid::new_v4());

        let (status, created) = send(
            &state,
            "POST",
            "/api/v1/nutrition-plans",
            Some(&auth),
            Some(json!({ "name": "Bulk", "goal": "Maintain Weight", "mealsPerDay": 2 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["plan"]["goal"], "Maintain Weight");
        assert_eq!(created["generation"]["days"].as_array().unwrap().len(), 7);
        let plan_id = created["plan"]["id"].as_str().unwrap().to_string();
        let meal_id = created["generation"]["days"][0]["mealIds"][1]
            .as_str()
            .unwrap()
            .to_string();

        let (status, meal) = send(
            &state,
            "PATCH",
            &format!("/api/v1/meals/{meal_id}"),
            Some(&auth),
            Some(json!({ "isEaten": true })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(meal["title"], "Chicken Salad");
        assert_eq!(meal["isEaten"], true);

        let (status, details) = send(
            &state,
            "GET",
            &format!("/api/v1/nutrition-plans/{plan_id}"),
            Some(&auth),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(details["schedules"][0]["dayOfWeek"], 0);
        assert_eq!(details["schedules"][0]["meals"][0]["type"], "breakfast");
        assert_eq!(details["summary"]["eatenMeals"], 1);
        assert_eq!(details["summary"]["totalMeals"], 14);

        let (status, _) = send(
            &state,
            "POST",
            &format!("/api/v1/nutrition-plans/{plan_id}/generate"),
            Some(&auth),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(
            &state,
            "DELETE",
            &format!("/api/v1/nutrition-plans/{plan_id}"),
            Some(&auth),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(
            &state,
            "GET",
            &format!("/api/v1/nutrition-plans/{plan_id}"),
            Some(&auth),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn rejects_invalid_meal_count() {
        let state = state();
        let auth = bearer(&state, Uuid::new_v4());
        let (status, _) = send(
            &state,
            "POST",
            "/api/v1/nutrition-plans",
            Some(&auth),
            Some(json!({ "name": "Bulk", "goal": "Build Muscle", "mealsPerDay": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn lists_only_own_plans() {
        let state = state();
        let alice = bearer(&state, Uuid::new_v4());
        let bob = bearer(&state, Uuid::new_v4());
        let body = json!({ "name": "Lean", "goal": "Lose Fat", "avoid": ["milk"], "mealsPerDay": 1 });
        let (status, _) = send(&state, "POST", "/api/v1/nutrition-plans", Some(&alice), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, mine) = send(&state, "GET", "/api/v1/nutrition-plans", Some(&alice), None).await;
        let (_, theirs) = send(&state, "GET", "/api/v1/nutrition-plans", Some(&bob), None).await;
        assert_eq!(mine.as_array().unwrap().len(), 1);
        assert_eq!(mine[0]["avoid"], json!(["milk"]));
        assert!(theirs.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn health_and_catalog() {
        let state = state();
        let (status, _) = send(&state, "GET", "/api/v1/health", None, None).await;
        assert_eq!(status, StatusCode::OK);

        let auth = bearer(&state, Uuid::new_v4());
        let (status, catalog) = send(&state, "GET", "/api/v1/catalog/meals", Some(&auth), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(catalog["lunch"][0]["title"], "Chicken Salad");
    }
}

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tracing::{error, instrument};

use super::model::Catalog;
use crate::{auth::jwt::AuthUser, state::AppState};

pub fn catalog_routes() -> Router<AppState> {
    Router::new().route("/catalog/meals", get(get_meal_catalog))
}

#[instrument(skip(state))]
pub async fn get_meal_catalog(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Catalog>, (StatusCode, String)> {
    match state.catalog.fetch_meals().await {
        Ok(catalog) => Ok(Json(catalog)),
        Err(e) => {
            error!(error = %e, %user_id, "catalog fetch failed");
            Err((StatusCode::BAD_GATEWAY, e.to_string()))
        }
    }
}

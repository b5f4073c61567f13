pub mod dto;
pub mod error;
pub mod filter;
pub mod generator;
pub mod goal;
pub mod handlers;
pub mod repo;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use error::PlanError;
pub use filter::filter_meals;
pub use generator::{generate_meal_plan, preview_day, GenerationReport, PlanTarget};
pub use goal::Goal;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::plan_routes())
        .merge(handlers::meal_routes())
}

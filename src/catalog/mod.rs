pub mod handlers;
pub mod images;
pub mod model;
pub mod source;

use crate::state::AppState;
use axum::Router;

pub use model::{Catalog, Instructions, MealCandidate};
pub use source::{CatalogError, CatalogSource, HttpCatalog, StaticCatalog};

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::catalog_routes())
}

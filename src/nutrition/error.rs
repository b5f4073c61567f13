use axum::http::StatusCode;
use uuid::Uuid;

use crate::{catalog::CatalogError, store::StoreError};

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("could not encode document: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("nutrition plan {0} not found")]
    PlanNotFound(Uuid),
    #[error("meal {0} not found")]
    MealNotFound(Uuid),
    #[error("nutrition plan {0} already has a generated schedule")]
    AlreadyGenerated(Uuid),
    #[error("{0}")]
    InvalidRequest(String),
}

impl PlanError {
    pub fn status(&self) -> StatusCode {
        match self {
            PlanError::PlanNotFound(_) | PlanError::MealNotFound(_) => StatusCode::NOT_FOUND,
            PlanError::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
            PlanError::AlreadyGenerated(_) => StatusCode::CONFLICT,
            PlanError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            PlanError::Catalog(_) => StatusCode::BAD_GATEWAY,
            PlanError::Store(_) | PlanError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PlanError> for (StatusCode, String) {
    fn from(e: PlanError) -> Self {
        (e.status(), e.to_string())
    }
}

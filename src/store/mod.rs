use std::cmp::Ordering;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub const NUTRITION_PLANS: &str = "nutritionPlans";
pub const MEAL_SCHEDULES: &str = "mealSchedules";
pub const MEALS: &str = "meals";

/// What a permission grant allows its user to do with a document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Read,
    Update,
    Delete,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub action: Action,
    pub user_id: Uuid,
}

impl Permission {
    /// Read, update and delete grants for a single owning user.
    pub fn owner(user_id: Uuid) -> Vec<Permission> {
        [Action::Read, Action::Update, Action::Delete]
            .into_iter()
            .map(|action| Permission { action, user_id })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub collection: String,
    pub data: Value,
    pub permissions: Vec<Permission>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Document {
    pub fn allows(&self, action: Action, user_id: Uuid) -> bool {
        self.permissions
            .iter()
            .any(|p| p.action == action && p.user_id == user_id)
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        Ok(T::deserialize(&self.data)?)
    }
}

/// Predicates and modifiers accepted by [`DocumentStore::list_documents`].
/// Field names address top-level keys of the document data.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Equal(String, Value),
    GreaterThanEqual(String, Value),
    LessThanEqual(String, Value),
    OrderAsc(String),
    OrderDesc(String),
    Limit(i64),
}

impl Query {
    pub fn equal(field: &str, value: impl Into<Value>) -> Self {
        Query::Equal(field.to_string(), value.into())
    }

    pub fn order_asc(field: &str) -> Self {
        Query::OrderAsc(field.to_string())
    }

    pub fn order_desc(field: &str) -> Self {
        Query::OrderDesc(field.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document {id} not found in {collection}")]
    NotFound { collection: String, id: Uuid },
    #[error("document data must be a JSON object")]
    NotAnObject,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("malformed document: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn not_found(collection: &str, id: Uuid) -> Self {
        StoreError::NotFound {
            collection: collection.to_string(),
            id,
        }
    }
}

/// Document-database client the nutrition services write through.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_documents(
        &self,
        collection: &str,
        queries: &[Query],
    ) -> Result<Vec<Document>, StoreError>;

    async fn get_document(&self, collection: &str, id: Uuid) -> Result<Document, StoreError>;

    async fn create_document(
        &self,
        collection: &str,
        data: Value,
        permissions: Vec<Permission>,
    ) -> Result<Document, StoreError>;

    /// Shallow merge: every top-level key of `patch` replaces the stored one.
    async fn update_document(
        &self,
        collection: &str,
        id: Uuid,
        patch: Value,
    ) -> Result<Document, StoreError>;

    async fn delete_document(&self, collection: &str, id: Uuid) -> Result<(), StoreError>;
}

/// Orders two JSON scalars the way the range predicates compare them.
/// Values of different kinds are unordered.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

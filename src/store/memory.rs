use std::cmp::Ordering;

use async_trait::async_trait;
use serde_json::Value;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{compare_values, Document, DocumentStore, Permission, Query, StoreError};

/// Process-local store used when no database is configured and in tests.
/// Documents are kept in insertion order.
#[derive(Default)]
pub struct MemoryStore {
    docs: RwLock<Vec<Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self, collection: &str) -> usize {
        self.docs
            .read()
            .await
            .iter()
            .filter(|d| d.collection == collection)
            .count()
    }
}

fn matches(doc: &Document, query: &Query) -> bool {
    match query {
        Query::Equal(field, value) => doc.field(field) == Some(value),
        Query::GreaterThanEqual(field, value) => doc
            .field(field)
            .and_then(|v| compare_values(v, value))
            .is_some_and(|o| o != Ordering::Less),
        Query::LessThanEqual(field, value) => doc
            .field(field)
            .and_then(|v| compare_values(v, value))
            .is_some_and(|o| o != Ordering::Greater),
        Query::OrderAsc(_) | Query::OrderDesc(_) | Query::Limit(_) => true,
    }
}

// Missing or incomparable fields sort last.
fn compare_field(a: &Document, b: &Document, field: &str) -> Ordering {
    match (a.field(field), b.field(field)) {
        (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_documents(
        &self,
        collection: &str,
        queries: &[Query],
    ) -> Result<Vec<Document>, StoreError> {
        let docs = self.docs.read().await;
        let mut out: Vec<Document> = docs
            .iter()
            .filter(|d| d.collection == collection)
            .filter(|d| queries.iter().all(|q| matches(d, q)))
            .cloned()
            .collect();

        // Later orderings are tie-breakers, so apply them back to front with a stable sort.
        for q in queries.iter().rev() {
            match q {
                Query::OrderAsc(field) => out.sort_by(|a, b| compare_field(a, b, field)),
                Query::OrderDesc(field) => out.sort_by(|a, b| compare_field(b, a, field)),
                _ => {}
            }
        }

        if let Some(limit) = queries.iter().rev().find_map(|q| match q {
            Query::Limit(n) => Some(*n),
            _ => None,
        }) {
            out.truncate(usize::try_from(limit).unwrap_or(0));
        }
        Ok(out)
    }

    async fn get_document(&self, collection: &str, id: Uuid) -> Result<Document, StoreError> {
        self.docs
            .read()
            .await
            .iter()
            .find(|d| d.collection == collection && d.id == id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(collection, id))
    }

    async fn create_document(
        &self,
        collection: &str,
        data: Value,
        permissions: Vec<Permission>,
    ) -> Result<Document, StoreError> {
        if !data.is_object() {
            return Err(StoreError::NotAnObject);
        }
        let doc = Document {
            id: Uuid::new_v4(),
            collection: collection.to_string(),
            data,
            permissions,
            created_at: OffsetDateTime::now_utc(),
        };
        self.docs.write().await.push(doc.clone());
        Ok(doc)
    }

    async fn update_document(
        &self,
        collection: &str,
        id: Uuid,
        patch: Value,
    ) -> Result<Document, StoreError> {
        let Value::Object(patch) = patch else {
            return Err(StoreError::NotAnObject);
        };
        let mut docs = self.docs.write().await;
        let doc = docs
            .iter_mut()
            .find(|d| d.collection == collection && d.id == id)
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        let Value::Object(data) = &mut doc.data else {
            return Err(StoreError::NotAnObject);
        };
        data.extend(patch);
        Ok(doc.clone())
    }

    async fn delete_document(&self, collection: &str, id: Uuid) -> Result<(), StoreError> {
        let mut docs = self.docs.write().await;
        let before = docs.len();
        docs.retain(|d| !(d.collection == collection && d.id == id));
        if docs.len() == before {
            return Err(StoreError::not_found(collection, id));
        }
        Ok(())
    }
}

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{types::Json, FromRow, PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use super::{Document, DocumentStore, Permission, Query, StoreError};

/// Postgres-backed document store: one `documents` table, data kept as jsonb.
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct DocumentRow {
    id: Uuid,
    collection: String,
    data: Value,
    permissions: Json<Vec<Permission>>,
    created_at: OffsetDateTime,
}

impl From<DocumentRow> for Document {
    fn from(r: DocumentRow) -> Self {
        Self {
            id: r.id,
            collection: r.collection,
            data: r.data,
            permissions: r.permissions.0,
            created_at: r.created_at,
        }
    }
}

const COLUMNS: &str = "id, collection, data, permissions, created_at";

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Builds the SELECT for a collection listing. Predicates compare jsonb
/// values, so numbers compare numerically and strings lexically.
fn list_query<'a>(collection: &'a str, queries: &'a [Query]) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM documents WHERE collection = "));
    qb.push_bind(collection);

    let mut orderings = Vec::new();
    let mut limit = None;
    for q in queries {
        match q {
            Query::Equal(field, value) => {
                qb.push(" AND data -> ").push_bind(field.as_str());
                qb.push(" = ").push_bind(value);
            }
            Query::GreaterThanEqual(field, value) => {
                qb.push(" AND data -> ").push_bind(field.as_str());
                qb.push(" >= ").push_bind(value);
            }
            Query::LessThanEqual(field, value) => {
                qb.push(" AND data -> ").push_bind(field.as_str());
                qb.push(" <= ").push_bind(value);
            }
            Query::OrderAsc(field) => orderings.push((field.as_str(), "ASC")),
            Query::OrderDesc(field) => orderings.push((field.as_str(), "DESC")),
            Query::Limit(n) => limit = Some(*n),
        }
    }

    qb.push(" ORDER BY ");
    for (field, dir) in orderings {
        qb.push("data -> ").push_bind(field).push(" ").push(dir).push(", ");
    }
    qb.push("seq ASC");

    if let Some(n) = limit {
        qb.push(" LIMIT ").push_bind(n);
    }
    qb
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn list_documents(
        &self,
        collection: &str,
        queries: &[Query],
    ) -> Result<Vec<Document>, StoreError> {
        let mut qb = list_query(collection, queries);
        let rows = qb
            .build_query_as::<DocumentRow>()
            .fetch_all(&self.db)
            .await?;
        debug!(collection, count = rows.len(), "documents listed");
        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn get_document(&self, collection: &str, id: Uuid) -> Result<Document, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(&format!(
            "SELECT {COLUMNS} FROM documents WHERE collection = $1 AND id = $2"
        ))
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        row.map(Document::from)
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
        let row = sqlx::query_as::<_, DocumentRow>(&format!(
            r#"
            INSERT INTO documents (id, collection, data, permissions)
            VALUES ($1, $2, $3, $4)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(collection)
        .bind(&data)
        .bind(Json(&permissions))
        .fetch_one(&self.db)
        .await?;
        debug!(collection, id = %row.id, "document created");
        Ok(row.into())
    }

    async fn update_document(
        &self,
        collection: &str,
        id: Uuid,
        patch: Value,
    ) -> Result<Document, StoreError> {
        if !patch.is_object() {
            return Err(StoreError::NotAnObject);
        }
        // jsonb || jsonb replaces top-level keys, matching the trait's merge contract.
        let row = sqlx::query_as::<_, DocumentRow>(&format!(
            r#"
            UPDATE documents
               SET data = data || $3
             WHERE collection = $1 AND id = $2
            RETURNING {COLUMNS}
            "#
        ))
        .bind(collection)
        .bind(id)
        .bind(&patch)
        .fetch_optional(&self.db)
        .await?;
        row.map(Document::from)
            .ok_or_else(|| StoreError::not_found(collection, id))
    }

    async fn delete_document(&self, collection: &str, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(collection, id));
        }
        Ok(())
    }
}

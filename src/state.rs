use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crate::catalog::{CatalogSource, HttpCatalog, StaticCatalog};
use crate::config::AppConfig;
use crate::store::{DocumentStore, MemoryStore, PgStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn DocumentStore>,
    pub catalog: Arc<dyn CatalogSource>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store = match &config.database_url {
            Some(url) => {
                let db = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await
                    .context("connect to database")?;
                sqlx::migrate!("./migrations")
                    .run(&db)
                    .await
                    .context("run migrations")?;
                info!("using postgres document store");
                Arc::new(PgStore::new(db)) as Arc<dyn DocumentStore>
            }
            None => {
                warn!("DATABASE_URL not set; documents are kept in memory");
                Arc::new(MemoryStore::new()) as Arc<dyn DocumentStore>
            }
        };

        let catalog = match &config.catalog_url {
            Some(url) => Arc::new(HttpCatalog::new(url.as_str())?) as Arc<dyn CatalogSource>,
            None => {
                warn!("CATALOG_URL not set; meal catalog is empty");
                Arc::new(StaticCatalog::default()) as Arc<dyn CatalogSource>
            }
        };

        Ok(Self::from_parts(config, store, catalog))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        store: Arc<dyn DocumentStore>,
        catalog: Arc<dyn CatalogSource>,
    ) -> Self {
        Self {
            config,
            store,
            catalog,
        }
    }

    /// In-memory state for tests: empty store, fixed catalog, throwaway JWT settings.
    #[cfg(test)]
    pub fn fake_with_catalog(catalog: crate::catalog::Catalog) -> Self {
        let config = Arc::new(AppConfig {
            database_url: None,
            catalog_url: None,
            jwt: crate::config::JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
            },
        });
        Self::from_parts(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(StaticCatalog::new(catalog)),
        )
    }
}

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::images::direct_view_url;
use super::model::Catalog;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("catalog is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Where candidate meals come from. The catalog is read-only to this service.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_meals(&self) -> Result<Catalog, CatalogError>;
}

/// Catalog served as a JSON document over HTTP.
#[derive(Clone)]
pub struct HttpCatalog {
    client: reqwest::Client,
    url: String,
}

impl HttpCatalog {
    pub fn new(url: impl Into<String>) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl CatalogSource for HttpCatalog {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch_meals(&self) -> Result<Catalog, CatalogError> {
        let body = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let catalog = normalize_images(serde_json::from_str(&body)?);
        debug!(
            meal_types = catalog.meal_types().count(),
            candidates = catalog.total_candidates(),
            "catalog fetched"
        );
        Ok(catalog)
    }
}

/// Fixed in-memory catalog.
#[derive(Clone, Default)]
pub struct StaticCatalog {
    catalog: Catalog,
}

impl StaticCatalog {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: normalize_images(catalog),
        }
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn fetch_meals(&self) -> Result<Catalog, CatalogError> {
        Ok(self.catalog.clone())
    }
}

fn normalize_images(mut catalog: Catalog) -> Catalog {
    for meal in catalog.candidates_mut() {
        if let Some(image) = meal.image.as_mut() {
            *image = direct_view_url(image);
        }
    }
    catalog
}

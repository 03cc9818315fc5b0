use std::time::Duration;

use anyhow::Context;
use axum::async_trait;
use reqwest::Client;

use super::types::{CatalogFilter, RawRecipeRecord};

/// Boundary to the external recipe catalog API.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Full catalog listing. Also the data source for the local
    /// recommendation fallbacks.
    async fn list_all(&self) -> anyhow::Result<Vec<RawRecipeRecord>>;
    async fn get_by_id(&self, id: i64) -> anyhow::Result<Option<RawRecipeRecord>>;
    async fn search(&self, filter: &CatalogFilter) -> anyhow::Result<Vec<RawRecipeRecord>>;
}

#[derive(Clone)]
pub struct RecipeApi {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl RecipeApi {
    pub fn new(base_url: &str, api_key: Option<&str>, timeout_secs: u64) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(str::to_string),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .timeout(self.timeout);
        if let Some(key) = &self.api_key {
            req = req.header("x-api-key", key);
        }
        req
    }
}

#[async_trait]
impl CatalogClient for RecipeApi {
    async fn list_all(&self) -> anyhow::Result<Vec<RawRecipeRecord>> {
        let records = self
            .get("/")
            .send()
            .await
            .context("catalog list request")?
            .error_for_status()
            .context("catalog list status")?
            .json::<Vec<RawRecipeRecord>>()
            .await
            .context("catalog list body")?;
        Ok(records)
    }

    async fn get_by_id(&self, id: i64) -> anyhow::Result<Option<RawRecipeRecord>> {
        // The catalog API has no per-id endpoint; filter the bulk listing.
        let records = self.list_all().await?;
        Ok(records.into_iter().find(|r| r.id == Some(id)))
    }

    async fn search(&self, filter: &CatalogFilter) -> anyhow::Result<Vec<RawRecipeRecord>> {
        let mut params: Vec<(&str, f64)> = Vec::new();
        if let Some(v) = filter.min_protein {
            params.push(("protein_in_grams__gte", v));
        }
        if let Some(v) = filter.max_protein {
            params.push(("protein_in_grams__lte", v));
        }
        if let Some(v) = filter.min_carbs {
            params.push(("carbohydrates_in_grams__gte", v));
        }
        if let Some(v) = filter.max_carbs {
            params.push(("carbohydrates_in_grams__lte", v));
        }
        if let Some(v) = filter.min_calories {
            params.push(("calories__gte", v));
        }
        if let Some(v) = filter.max_calories {
            params.push(("calories__lte", v));
        }

        let records = self
            .get("/")
            .query(&params)
            .send()
            .await
            .context("catalog search request")?
            .error_for_status()
            .context("catalog search status")?
            .json::<Vec<RawRecipeRecord>>()
            .await
            .context("catalog search body")?;
        Ok(records)
    }
}

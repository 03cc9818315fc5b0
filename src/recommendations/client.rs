use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::cache::{CacheKey, CachedValue, RecommendationCache};
use crate::recipes::client::CatalogClient;
use crate::recipes::mapping::{derive_tags, to_diet};
use crate::recipes::types::{Diet, RawRecipeRecord};

use super::dto::{PersonalizedRequest, RecommendationRecord};

/// Boundary to the external recommendation engine.
#[async_trait]
pub trait RecommenderApi: Send + Sync {
    async fn similar(&self, diet_id: &str, count: usize)
        -> anyhow::Result<Vec<RecommendationRecord>>;
    async fn trending(&self, count: usize) -> anyhow::Result<Vec<RecommendationRecord>>;
    /// Older endpoint shape, tried once when `trending` fails.
    async fn popular_legacy(&self) -> anyhow::Result<Vec<RecommendationRecord>>;
    async fn personalized(
        &self,
        request: &PersonalizedRequest,
    ) -> anyhow::Result<Vec<RecommendationRecord>>;
    async fn track_view(&self, user_id: &str, diet_id: &str) -> anyhow::Result<()>;
}

pub struct HttpRecommender {
    http: Client,
    base_url: String,
    timeout: Duration,
    tracking_timeout: Duration,
}

impl HttpRecommender {
    pub fn new(base_url: &str, timeout_secs: u64, tracking_timeout_secs: u64) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(timeout_secs),
            tracking_timeout: Duration::from_secs(tracking_timeout_secs),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[derive(Deserialize)]
struct SimilarResponse {
    similar_recipes: Option<Vec<RecommendationRecord>>,
}

#[derive(Deserialize)]
struct TrendingResponse {
    trending_recipes: Option<Vec<RecommendationRecord>>,
}

#[derive(Deserialize)]
struct PersonalizedResponse {
    recommendations: Option<Vec<RecommendationRecord>>,
}

#[async_trait]
impl RecommenderApi for HttpRecommender {
    async fn similar(
        &self,
        diet_id: &str,
        count: usize,
    ) -> anyhow::Result<Vec<RecommendationRecord>> {
        let body = self
            .http
            .get(self.url(&format!("/recommendations/similar/{diet_id}")))
            .query(&[("num_recommendations", count)])
            .timeout(self.timeout)
            .send()
            .await
            .context("similar request")?
            .error_for_status()
            .context("similar status")?
            .json::<SimilarResponse>()
            .await
            .context("similar body")?;
        // A 200 without the expected field counts as a failure too.
        body.similar_recipes
            .ok_or_else(|| anyhow::anyhow!("similar response missing similar_recipes"))
    }

    async fn trending(&self, count: usize) -> anyhow::Result<Vec<RecommendationRecord>> {
        let body = self
            .http
            .get(self.url("/recommendations/trending"))
            .query(&[("num_recommendations", count)])
            .timeout(self.timeout)
            .send()
            .await
            .context("trending request")?
            .error_for_status()
            .context("trending status")?
            .json::<TrendingResponse>()
            .await
            .context("trending body")?;
        body.trending_recipes
            .ok_or_else(|| anyhow::anyhow!("trending response missing trending_recipes"))
    }

    async fn popular_legacy(&self) -> anyhow::Result<Vec<RecommendationRecord>> {
        let records = self
            .http
            .get(self.url("/recommend/popular"))
            .timeout(self.timeout)
            .send()
            .await
            .context("popular request")?
            .error_for_status()
            .context("popular status")?
            .json::<Vec<RecommendationRecord>>()
            .await
            .context("popular body")?;
        Ok(records)
    }

    async fn personalized(
        &self,
        request: &PersonalizedRequest,
    ) -> anyhow::Result<Vec<RecommendationRecord>> {
        let body = self
            .http
            .post(self.url("/recommendations/personalized"))
            .json(request)
            .timeout(self.timeout)
            .send()
            .await
            .context("personalized request")?
            .error_for_status()
            .context("personalized status")?
            .json::<PersonalizedResponse>()
            .await
            .context("personalized body")?;
        body.recommendations
            .ok_or_else(|| anyhow::anyhow!("personalized response missing recommendations"))
    }

    async fn track_view(&self, user_id: &str, diet_id: &str) -> anyhow::Result<()> {
        self.http
            .post(self.url("/user/view"))
            .json(&json!({ "user_id": user_id, "diet_id": diet_id }))
            .timeout(self.tracking_timeout)
            .send()
            .await
            .context("view request")?
            .error_for_status()
            .context("view status")?;
        Ok(())
    }
}

/// Two-tier resolver for similar/popular recommendations:
/// cache → remote engine → local heuristic over the catalog. Whatever the
/// winning tier produced is cached for the full TTL, degraded results
/// included, so a remote outage does not re-run the fallback on every call.
pub struct RecommendationClient {
    pub(crate) api: Arc<dyn RecommenderApi>,
    pub(crate) catalog: Arc<dyn CatalogClient>,
    pub(crate) cache: Arc<RecommendationCache>,
}

impl RecommendationClient {
    pub fn new(
        api: Arc<dyn RecommenderApi>,
        catalog: Arc<dyn CatalogClient>,
        cache: Arc<RecommendationCache>,
    ) -> Self {
        Self { api, catalog, cache }
    }

    pub async fn get_similar(&self, diet_id: &str, count: usize) -> anyhow::Result<Vec<Diet>> {
        let key = CacheKey::Similar {
            diet_id: diet_id.to_string(),
            count,
        };
        if let Some(CachedValue::Diets(diets)) = self.cache.get(&key).await {
            return Ok(diets);
        }

        let diets = match self.api.similar(diet_id, count).await {
            Ok(records) => self.enrich(records).await,
            Err(e) => {
                warn!(error = %e, diet_id, "similar engine call failed, using local fallback");
                self.similar_fallback(diet_id, count).await?
            }
        };

        self.cache
            .put(key, CachedValue::Diets(diets.clone()))
            .await;
        Ok(diets)
    }

    pub async fn get_popular(&self, count: usize) -> anyhow::Result<Vec<Diet>> {
        let key = CacheKey::Popular { count };
        if let Some(CachedValue::Diets(diets)) = self.cache.get(&key).await {
            return Ok(diets);
        }

        let records = match self.api.trending(count).await {
            Ok(records) => Some(records),
            Err(e) => {
                warn!(error = %e, "trending call failed, trying legacy popular endpoint");
                match self.api.popular_legacy().await {
                    Ok(records) => Some(records),
                    Err(e) => {
                        warn!(error = %e, "legacy popular call failed, using local fallback");
                        None
                    }
                }
            }
        };

        let diets = match records {
            Some(records) => {
                let mut diets = self.enrich(records).await;
                diets.truncate(count);
                diets
            }
            None => self.popular_fallback(count).await?,
        };

        self.cache
            .put(key, CachedValue::Diets(diets.clone()))
            .await;
        Ok(diets)
    }

    /// Best-effort enrichment: the catalog is fetched once per batch and ids
    /// are resolved locally. A record with no catalog match, or the whole
    /// batch when the fetch fails, is mapped from the engine's own fields.
    pub(crate) async fn enrich(&self, records: Vec<RecommendationRecord>) -> Vec<Diet> {
        if records.is_empty() {
            return Vec::new();
        }
        let catalog = match self.catalog.list_all().await {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!(error = %e, "catalog fetch for enrichment failed");
                Vec::new()
            }
        };
        records
            .into_iter()
            .map(|record| {
                match catalog.iter().find(|r| r.id == Some(record.id)) {
                    Some(raw) => to_diet(raw),
                    None => record.to_diet_unenriched(),
                }
            })
            .collect()
    }

    /// Ranks the catalog by tag overlap with the target record. Stable sort,
    /// so equal scores keep catalog order. Unknown target id yields an empty
    /// list; a failing catalog fetch propagates (no further fallback tier).
    async fn similar_fallback(&self, diet_id: &str, count: usize) -> anyhow::Result<Vec<Diet>> {
        let catalog = self.catalog.list_all().await.context("fallback catalog fetch")?;
        let Some(target) = catalog.iter().find(|r| r.id_str() == diet_id) else {
            return Ok(Vec::new());
        };
        let target_tags: HashSet<String> = derive_tags(target).into_iter().collect();

        let mut scored: Vec<(usize, &RawRecipeRecord)> = catalog
            .iter()
            .filter(|r| r.id_str() != diet_id)
            .map(|r| {
                let overlap = derive_tags(r)
                    .iter()
                    .filter(|t| target_tags.contains(*t))
                    .count();
                (overlap, r)
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(scored.into_iter().take(count).map(|(_, r)| to_diet(r)).collect())
    }

    /// Calorie-descending ranking over the catalog, ties in catalog order.
    async fn popular_fallback(&self, count: usize) -> anyhow::Result<Vec<Diet>> {
        let mut catalog = self.catalog.list_all().await.context("fallback catalog fetch")?;
        catalog.sort_by(|a, b| {
            b.calories
                .unwrap_or(0.0)
                .partial_cmp(&a.calories.unwrap_or(0.0))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(catalog.iter().take(count).map(to_diet).collect())
    }
}

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::cache::RecommendationCache;
use crate::config::AppConfig;
use crate::profiles::repo::{PgProfileStore, ProfileStore};
use crate::recipes::client::{CatalogClient, RecipeApi};
use crate::recommendations::client::{HttpRecommender, RecommendationClient};
use crate::recommendations::service::PersonalizationService;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub cache: Arc<RecommendationCache>,
    pub catalog: Arc<dyn CatalogClient>,
    pub profiles: Arc<dyn ProfileStore>,
    pub recommendations: Arc<RecommendationClient>,
    pub personalization: Arc<PersonalizationService>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await?;

        let catalog = Arc::new(RecipeApi::new(
            &config.catalog_base_url,
            config.catalog_api_key.as_deref(),
            config.timeouts.catalog_secs,
        )) as Arc<dyn CatalogClient>;

        let engine = Arc::new(HttpRecommender::new(
            &config.recommender_base_url,
            config.timeouts.recommender_secs,
            config.timeouts.tracking_secs,
        ));

        let cache = Arc::new(RecommendationCache::with_ttl(Duration::from_secs(
            config.cache_ttl_minutes * 60,
        )));

        Ok(Self::from_parts(db, config, cache, catalog, engine))
    }

    pub fn from_parts(
        db: PgPool,
        config: Arc<AppConfig>,
        cache: Arc<RecommendationCache>,
        catalog: Arc<dyn CatalogClient>,
        engine: Arc<HttpRecommender>,
    ) -> Self {
        let profiles = Arc::new(PgProfileStore::new(db.clone())) as Arc<dyn ProfileStore>;
        let recommendations = Arc::new(RecommendationClient::new(
            engine,
            catalog.clone(),
            cache.clone(),
        ));
        let personalization = Arc::new(PersonalizationService::new(
            profiles.clone(),
            recommendations.clone(),
        ));

        Self {
            db,
            config,
            cache,
            catalog,
            profiles,
            recommendations,
            personalization,
        }
    }
}

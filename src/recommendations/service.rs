use std::sync::Arc;

use tracing::warn;

use crate::cache::{CacheKey, CachedValue};
use crate::profiles::repo::ProfileStore;
use crate::recipes::types::Diet;

use super::client::RecommendationClient;
use super::dto::{PersonalizedRequest, ANONYMOUS_USER};

/// Assembles a user's stored preferences and saved diets into a personalized
/// request, consults the cache, and maps the engine's answer into diets.
pub struct PersonalizationService {
    profiles: Arc<dyn ProfileStore>,
    client: Arc<RecommendationClient>,
}

impl PersonalizationService {
    pub fn new(profiles: Arc<dyn ProfileStore>, client: Arc<RecommendationClient>) -> Self {
        Self { profiles, client }
    }

    /// Profile-load failures propagate; the route handler degrades to
    /// popular. Engine failures degrade to popular here.
    pub async fn get_personalized(&self, email: &str, count: usize) -> anyhow::Result<Vec<Diet>> {
        let profile = self.profiles.find(email).await?.unwrap_or_default();
        let liked_recipes = profile.saved_diet_ids();
        let request = PersonalizedRequest {
            user_id: email.to_string(),
            preferences: profile.preferences,
            liked_recipes,
            num_recommendations: count,
        };
        let key = CacheKey::Personalized(request.clone());

        // The raw engine response is what gets cached; enrichment re-runs on
        // every read so catalog detail stays fresh.
        if let Some(CachedValue::Records(records)) = self.client.cache.get(&key).await {
            return Ok(self.client.enrich(records).await);
        }

        match self.client.api.personalized(&request).await {
            Ok(records) => {
                self.client
                    .cache
                    .put(key, CachedValue::Records(records.clone()))
                    .await;
                Ok(self.client.enrich(records).await)
            }
            Err(e) => {
                warn!(error = %e, user = email, "personalized engine call failed, degrading to popular");
                self.client.get_popular(count).await
            }
        }
    }

    /// Best-effort view notification. Never returns a result: both the engine
    /// call and the profile-history write are logged and swallowed. Callers
    /// dispatch this on a detached task.
    pub async fn track_view(&self, user_id: &str, diet_id: &str) {
        if let Err(e) = self.client.api.track_view(user_id, diet_id).await {
            warn!(error = %e, user = user_id, diet_id, "view tracking failed");
        }
        if user_id != ANONYMOUS_USER {
            if let Err(e) = self.profiles.record_view(user_id, diet_id).await {
                warn!(error = %e, user = user_id, diet_id, "view history write failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::async_trait;

    use super::*;
    use crate::cache::RecommendationCache;
    use crate::profiles::dto::{DietCategory, UserPreferences, UserProfile};
    use crate::recipes::client::CatalogClient;
    use crate::recipes::types::{CatalogFilter, RawRecipeRecord};
    use crate::recommendations::dto::RecommendationRecord;

    // -- fakes -------------------------------------------------------------

    /// Engine fake: every call either fails or returns canned records.
    struct FakeEngine {
        fail: bool,
        records: Vec<RecommendationRecord>,
        personalized_calls: AtomicUsize,
    }

    impl FakeEngine {
        fn down() -> Self {
            Self {
                fail: true,
                records: Vec::new(),
                personalized_calls: AtomicUsize::new(0),
            }
        }

        fn up(records: Vec<RecommendationRecord>) -> Self {
            Self {
                fail: false,
                records,
                personalized_calls: AtomicUsize::new(0),
            }
        }

        fn answer(&self) -> anyhow::Result<Vec<RecommendationRecord>> {
            if self.fail {
                anyhow::bail!("connection refused")
            }
            Ok(self.records.clone())
        }
    }

    #[async_trait]
    impl crate::recommendations::client::RecommenderApi for FakeEngine {
        async fn similar(
            &self,
            _diet_id: &str,
            _count: usize,
        ) -> anyhow::Result<Vec<RecommendationRecord>> {
            self.answer()
        }
        async fn trending(&self, _count: usize) -> anyhow::Result<Vec<RecommendationRecord>> {
            self.answer()
        }
        async fn popular_legacy(&self) -> anyhow::Result<Vec<RecommendationRecord>> {
            self.answer()
        }
        async fn personalized(
            &self,
            _request: &PersonalizedRequest,
        ) -> anyhow::Result<Vec<RecommendationRecord>> {
            self.personalized_calls.fetch_add(1, Ordering::SeqCst);
            self.answer()
        }
        async fn track_view(&self, _user_id: &str, _diet_id: &str) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("timed out")
            }
            Ok(())
        }
    }

    /// Engine fake whose trending endpoint is down while the older popular
    /// endpoint still answers.
    struct LegacyOnlyEngine {
        records: Vec<RecommendationRecord>,
        legacy_calls: AtomicUsize,
    }

    #[async_trait]
    impl crate::recommendations::client::RecommenderApi for LegacyOnlyEngine {
        async fn similar(
            &self,
            _diet_id: &str,
            _count: usize,
        ) -> anyhow::Result<Vec<RecommendationRecord>> {
            anyhow::bail!("connection refused")
        }
        async fn trending(&self, _count: usize) -> anyhow::Result<Vec<RecommendationRecord>> {
            anyhow::bail!("connection refused")
        }
        async fn popular_legacy(&self) -> anyhow::Result<Vec<RecommendationRecord>> {
            self.legacy_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.records.clone())
        }
        async fn personalized(
            &self,
            _request: &PersonalizedRequest,
        ) -> anyhow::Result<Vec<RecommendationRecord>> {
            anyhow::bail!("connection refused")
        }
        async fn track_view(&self, _user_id: &str, _diet_id: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    /// Catalog fake that counts bulk fetches, for asserting that cached
    /// degraded results do not re-run the fallback computation.
    struct CountingCatalog {
        records: Vec<RawRecipeRecord>,
        list_calls: AtomicUsize,
    }

    impl CountingCatalog {
        fn new(records: Vec<RawRecipeRecord>) -> Self {
            Self {
                records,
                list_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CatalogClient for CountingCatalog {
        async fn list_all(&self) -> anyhow::Result<Vec<RawRecipeRecord>> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.records.clone())
        }
        async fn get_by_id(&self, id: i64) -> anyhow::Result<Option<RawRecipeRecord>> {
            Ok(self.records.iter().find(|r| r.id == Some(id)).cloned())
        }
        async fn search(&self, _filter: &CatalogFilter) -> anyhow::Result<Vec<RawRecipeRecord>> {
            Ok(self.records.clone())
        }
    }

    struct FakeProfiles {
        profile: Option<UserProfile>,
        fail_find: bool,
        fail_views: bool,
        view_writes: AtomicUsize,
    }

    #[async_trait]
    impl ProfileStore for FakeProfiles {
        async fn find(&self, _email: &str) -> anyhow::Result<Option<UserProfile>> {
            if self.fail_find {
                anyhow::bail!("profile store unavailable")
            }
            Ok(self.profile.clone())
        }
        async fn put_preferences(
            &self,
            _email: &str,
            _prefs: &UserPreferences,
        ) -> anyhow::Result<()> {
            Ok(())
        }
        async fn put_categories(
            &self,
            _email: &str,
            _categories: &[DietCategory],
        ) -> anyhow::Result<()> {
            Ok(())
        }
        async fn save_diet(
            &self,
            _email: &str,
            _diet_id: &str,
            _category: Option<&str>,
        ) -> anyhow::Result<()> {
            Ok(())
        }
        async fn remove_saved_diet(&self, _email: &str, _diet_id: &str) -> anyhow::Result<()> {
            Ok(())
        }
        async fn record_view(&self, _email: &str, _diet_id: &str) -> anyhow::Result<()> {
            self.view_writes.fetch_add(1, Ordering::SeqCst);
            if self.fail_views {
                anyhow::bail!("write failed")
            }
            Ok(())
        }
    }

    fn engine_record(id: i64) -> RecommendationRecord {
        RecommendationRecord {
            id,
            recipe: None,
            image: None,
            score: None,
        }
    }

    fn record(id: i64, protein: f64, carbs: f64, calories: f64) -> RawRecipeRecord {
        RawRecipeRecord {
            id: Some(id),
            recipe: Some(format!("Recipe {id}")),
            protein_in_grams: Some(protein),
            carbohydrates_in_grams: Some(carbs),
            calories: Some(calories),
            ..Default::default()
        }
    }

    /// Ten records where 42 derives {keto, high-protein, very-low-carb}.
    /// 2 and 7 match all three tags, 5 and 8 share two, the rest share one.
    fn fixture_catalog() -> Vec<RawRecipeRecord> {
        vec![
            record(1, 15.0, 50.0, 400.0),  // keto only
            record(2, 25.0, 5.0, 400.0),   // high-protein + very-low-carb
            record(3, 15.0, 50.0, 400.0),  // keto only
            record(42, 30.0, 5.0, 400.0),  // target
            record(5, 25.0, 50.0, 400.0),  // high-protein
            record(6, 15.0, 50.0, 400.0),  // keto only
            record(7, 40.0, 2.0, 400.0),   // high-protein + very-low-carb
            record(8, 15.0, 5.0, 400.0),   // very-low-carb
            record(9, 15.0, 50.0, 400.0),  // keto only
            record(10, 15.0, 50.0, 400.0), // keto only
        ]
    }

    struct Harness {
        engine: Arc<FakeEngine>,
        catalog: Arc<CountingCatalog>,
        client: Arc<RecommendationClient>,
    }

    fn harness(engine: FakeEngine, records: Vec<RawRecipeRecord>) -> Harness {
        let engine = Arc::new(engine);
        let catalog = Arc::new(CountingCatalog::new(records));
        let client = Arc::new(RecommendationClient::new(
            engine.clone(),
            catalog.clone(),
            Arc::new(RecommendationCache::new()),
        ));
        Harness {
            engine,
            catalog,
            client,
        }
    }

    fn service(h: &Harness, profiles: FakeProfiles) -> PersonalizationService {
        PersonalizationService::new(Arc::new(profiles), h.client.clone())
    }

    fn healthy_profiles() -> FakeProfiles {
        FakeProfiles {
            profile: Some(UserProfile::default()),
            fail_find: false,
            fail_views: false,
            view_writes: AtomicUsize::new(0),
        }
    }

    // -- similar / popular fallbacks ---------------------------------------

    #[tokio::test]
    async fn similar_fallback_ranks_by_tag_overlap_with_stable_ties() {
        let h = harness(FakeEngine::down(), fixture_catalog());

        let diets = h.client.get_similar("42", 4).await.expect("similar");
        assert_eq!(diets.len(), 4);
        // Full-overlap records first, in catalog order; then the two-tag
        // overlaps, also in catalog order.
        assert_eq!(diets[0].id, "2");
        assert_eq!(diets[1].id, "7");
        assert_eq!(diets[2].id, "5");
        assert_eq!(diets[3].id, "8");
    }

    #[tokio::test]
    async fn similar_fallback_for_unknown_id_is_empty_not_an_error() {
        let h = harness(FakeEngine::down(), fixture_catalog());
        let diets = h.client.get_similar("999", 4).await.expect("similar");
        assert!(diets.is_empty());
    }

    #[tokio::test]
    async fn popular_fallback_sorts_by_calories_descending() {
        let catalog = vec![
            record(1, 10.0, 30.0, 250.0),
            record(2, 10.0, 30.0, 700.0),
            record(3, 10.0, 30.0, 700.0),
            record(4, 10.0, 30.0, 450.0),
        ];
        let h = harness(FakeEngine::down(), catalog);

        let diets = h.client.get_popular(3).await.expect("popular");
        let ids: Vec<&str> = diets.iter().map(|d| d.id.as_str()).collect();
        // Ties at 700 keep catalog order.
        assert_eq!(ids, ["2", "3", "4"]);
    }

    #[tokio::test]
    async fn popular_retries_the_legacy_endpoint_and_caches_its_records() {
        let engine = Arc::new(LegacyOnlyEngine {
            records: vec![engine_record(2), engine_record(5), engine_record(7)],
            legacy_calls: AtomicUsize::new(0),
        });
        let catalog = Arc::new(CountingCatalog::new(fixture_catalog()));
        let client = RecommendationClient::new(
            engine.clone(),
            catalog.clone(),
            Arc::new(RecommendationCache::new()),
        );

        let diets = client.get_popular(2).await.expect("popular");
        // Legacy records enriched from the catalog and truncated to count;
        // no calorie-ranking fallback involved.
        let ids: Vec<&str> = diets.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["2", "5"]);
        assert_eq!(diets[0].name, "Recipe 2");
        assert_eq!(engine.legacy_calls.load(Ordering::SeqCst), 1);

        let again = client.get_popular(2).await.expect("cached");
        assert_eq!(diets, again);
        assert_eq!(engine.legacy_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn enrichment_fetches_the_catalog_once_per_batch() {
        let engine = FakeEngine::up(vec![engine_record(1), engine_record(2), engine_record(5)]);
        let h = harness(engine, fixture_catalog());

        let diets = h.client.get_similar("42", 4).await.expect("similar");
        assert_eq!(diets.len(), 3);
        assert_eq!(h.catalog.list_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn degraded_similar_result_is_cached_without_rerunning_the_fallback() {
        let h = harness(FakeEngine::down(), fixture_catalog());

        let first = h.client.get_similar("42", 4).await.expect("first");
        assert_eq!(h.catalog.list_calls.load(Ordering::SeqCst), 1);

        let second = h.client.get_similar("42", 4).await.expect("second");
        assert_eq!(first, second);
        assert_eq!(h.catalog.list_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn similar_from_engine_enriches_records_from_the_catalog() {
        let engine = FakeEngine::up(vec![
            RecommendationRecord {
                id: 2,
                recipe: None,
                image: None,
                score: Some(0.9),
            },
            RecommendationRecord {
                id: 999, // not in catalog, mapped unenriched
                recipe: Some("Mystery Bowl".into()),
                image: None,
                score: Some(0.4),
            },
        ]);
        let h = harness(engine, fixture_catalog());

        let diets = h.client.get_similar("42", 4).await.expect("similar");
        assert_eq!(diets.len(), 2);
        assert_eq!(diets[0].name, "Recipe 2");
        assert!(diets[0].tags.contains(&"high-protein".to_string()));
        assert_eq!(diets[1].name, "Mystery Bowl");
        assert_eq!(diets[1].tags, vec!["keto"]);
    }

    #[tokio::test]
    async fn fallback_failure_propagates_when_catalog_is_also_down() {
        struct DeadCatalog;
        #[async_trait]
        impl CatalogClient for DeadCatalog {
            async fn list_all(&self) -> anyhow::Result<Vec<RawRecipeRecord>> {
                anyhow::bail!("catalog unreachable")
            }
            async fn get_by_id(&self, _id: i64) -> anyhow::Result<Option<RawRecipeRecord>> {
                anyhow::bail!("catalog unreachable")
            }
            async fn search(
                &self,
                _filter: &CatalogFilter,
            ) -> anyhow::Result<Vec<RawRecipeRecord>> {
                anyhow::bail!("catalog unreachable")
            }
        }

        let client = RecommendationClient::new(
            Arc::new(FakeEngine::down()),
            Arc::new(DeadCatalog),
            Arc::new(RecommendationCache::new()),
        );
        assert!(client.get_similar("42", 4).await.is_err());
        assert!(client.get_popular(8).await.is_err());
    }

    // -- personalization ----------------------------------------------------

    #[tokio::test]
    async fn personalized_caches_the_raw_response_and_skips_the_engine_on_repeat() {
        let engine = FakeEngine::up(vec![RecommendationRecord {
            id: 2,
            recipe: None,
            image: None,
            score: None,
        }]);
        let h = harness(engine, fixture_catalog());
        let svc = service(&h, healthy_profiles());

        let first = svc.get_personalized("a@b.c", 8).await.expect("first");
        let second = svc.get_personalized("a@b.c", 8).await.expect("second");
        assert_eq!(first, second);
        assert_eq!(h.engine.personalized_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn personalized_profile_load_failure_propagates() {
        let h = harness(FakeEngine::down(), fixture_catalog());
        let svc = service(
            &h,
            FakeProfiles {
                profile: None,
                fail_find: true,
                fail_views: false,
                view_writes: AtomicUsize::new(0),
            },
        );
        assert!(svc.get_personalized("a@b.c", 8).await.is_err());
    }

    #[tokio::test]
    async fn personalized_engine_failure_degrades_to_popular() {
        let h = harness(FakeEngine::down(), fixture_catalog());
        let svc = service(&h, healthy_profiles());

        let diets = svc.get_personalized("a@b.c", 3).await.expect("degraded");
        assert_eq!(diets.len(), 3);
        // Popular fallback ordering: fixture calories are uniform, so
        // catalog order wins throughout.
        assert_eq!(diets[0].id, "1");
    }

    // -- view tracking ------------------------------------------------------

    #[tokio::test]
    async fn track_view_swallows_failures_for_anonymous_users() {
        let h = harness(FakeEngine::down(), fixture_catalog());
        let svc = service(&h, healthy_profiles());
        svc.track_view(ANONYMOUS_USER, "42").await;
    }

    #[tokio::test]
    async fn track_view_swallows_failures_on_both_paths_for_known_users() {
        let h = harness(FakeEngine::down(), fixture_catalog());
        let svc = PersonalizationService::new(
            Arc::new(FakeProfiles {
                profile: Some(UserProfile::default()),
                fail_find: false,
                fail_views: true,
                view_writes: AtomicUsize::new(0),
            }),
            h.client.clone(),
        );
        svc.track_view("a@b.c", "42").await;
    }

    #[tokio::test]
    async fn track_view_skips_the_profile_write_for_anonymous_users() {
        let h = harness(FakeEngine::up(Vec::new()), fixture_catalog());
        let profiles = Arc::new(healthy_profiles());
        let svc = PersonalizationService::new(profiles.clone(), h.client.clone());

        svc.track_view(ANONYMOUS_USER, "42").await;
        assert_eq!(profiles.view_writes.load(Ordering::SeqCst), 0);

        svc.track_view("a@b.c", "42").await;
        assert_eq!(profiles.view_writes.load(Ordering::SeqCst), 1);
    }
}

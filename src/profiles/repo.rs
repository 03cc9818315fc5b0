use axum::async_trait;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use super::dto::{DietCategory, SavedDiet, UserPreferences, UserProfile};

/// Boundary to the user-profile document store, keyed by email.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find(&self, email: &str) -> anyhow::Result<Option<UserProfile>>;
    async fn put_preferences(&self, email: &str, prefs: &UserPreferences) -> anyhow::Result<()>;
    async fn put_categories(&self, email: &str, categories: &[DietCategory]) -> anyhow::Result<()>;
    async fn save_diet(&self, email: &str, diet_id: &str, category: Option<&str>) -> anyhow::Result<()>;
    async fn remove_saved_diet(&self, email: &str, diet_id: &str) -> anyhow::Result<()>;
    /// View-history write used by the best-effort tracking path.
    async fn record_view(&self, email: &str, diet_id: &str) -> anyhow::Result<()>;
}

#[derive(Debug, FromRow)]
struct ProfileRow {
    preferences: serde_json::Value,
    categories: serde_json::Value,
    saved_diets: serde_json::Value,
}

#[derive(Clone)]
pub struct PgProfileStore {
    db: PgPool,
}

impl PgProfileStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn load(&self, email: &str) -> anyhow::Result<Option<UserProfile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT preferences, categories, saved_diets
            FROM user_profiles
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;

        let Some(row) = row else { return Ok(None) };
        Ok(Some(UserProfile {
            preferences: serde_json::from_value(row.preferences)?,
            categories: serde_json::from_value(row.categories)?,
            saved_diets: serde_json::from_value(row.saved_diets)?,
        }))
    }

    async fn upsert_column(
        &self,
        email: &str,
        column: &str,
        value: serde_json::Value,
    ) -> anyhow::Result<()> {
        // column names come from the fixed call sites below, never from input
        let sql = format!(
            r#"
            INSERT INTO user_profiles (email, {column})
            VALUES ($1, $2)
            ON CONFLICT (email)
            DO UPDATE SET {column} = EXCLUDED.{column}, updated_at = now()
            "#
        );
        sqlx::query(&sql).bind(email).bind(value).execute(&self.db).await?;
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn find(&self, email: &str) -> anyhow::Result<Option<UserProfile>> {
        self.load(email).await
    }

    async fn put_preferences(&self, email: &str, prefs: &UserPreferences) -> anyhow::Result<()> {
        self.upsert_column(email, "preferences", serde_json::to_value(prefs)?)
            .await
    }

    async fn put_categories(&self, email: &str, categories: &[DietCategory]) -> anyhow::Result<()> {
        self.upsert_column(email, "categories", serde_json::to_value(categories)?)
            .await
    }

    async fn save_diet(
        &self,
        email: &str,
        diet_id: &str,
        category: Option<&str>,
    ) -> anyhow::Result<()> {
        let mut saved = self
            .load(email)
            .await?
            .map(|p| p.saved_diets)
            .unwrap_or_default();
        saved.retain(|s| s.diet_id != diet_id);
        saved.push(SavedDiet {
            diet_id: diet_id.to_string(),
            category: category.map(str::to_string),
            saved_at: OffsetDateTime::now_utc(),
        });
        self.upsert_column(email, "saved_diets", serde_json::to_value(&saved)?)
            .await
    }

    async fn remove_saved_diet(&self, email: &str, diet_id: &str) -> anyhow::Result<()> {
        let mut saved = self
            .load(email)
            .await?
            .map(|p| p.saved_diets)
            .unwrap_or_default();
        saved.retain(|s| s.diet_id != diet_id);
        self.upsert_column(email, "saved_diets", serde_json::to_value(&saved)?)
            .await
    }

    async fn record_view(&self, email: &str, diet_id: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_profiles (email, viewed_diets)
            VALUES ($1, jsonb_build_array($2::text))
            ON CONFLICT (email)
            DO UPDATE SET viewed_diets = user_profiles.viewed_diets || to_jsonb($2::text),
                          updated_at = now()
            "#,
        )
        .bind(email)
        .bind(diet_id)
        .execute(&self.db)
        .await?;
        Ok(())
    }
}

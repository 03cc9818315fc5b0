use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
}

/// Timeouts for the external HTTP collaborators, in seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutConfig {
    pub recommender_secs: u64,
    pub catalog_secs: u64,
    pub tracking_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub recommender_base_url: String,
    pub catalog_base_url: String,
    pub catalog_api_key: Option<String>,
    pub cache_ttl_minutes: u64,
    pub timeouts: TimeoutConfig,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let recommender_base_url = std::env::var("RECOMMENDER_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8000".into());
        let catalog_base_url = std::env::var("CATALOG_BASE_URL")
            .unwrap_or_else(|_| "https://keto-diet.p.rapidapi.com".into());
        let catalog_api_key = std::env::var("CATALOG_API_KEY").ok();
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "healthlover".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "healthlover-users".into()),
        };
        let timeouts = TimeoutConfig {
            recommender_secs: env_u64("RECOMMENDER_TIMEOUT_SECS", 10),
            catalog_secs: env_u64("CATALOG_TIMEOUT_SECS", 20),
            tracking_secs: env_u64("TRACKING_TIMEOUT_SECS", 5),
        };
        Ok(Self {
            database_url,
            recommender_base_url,
            catalog_base_url,
            catalog_api_key,
            cache_ttl_minutes: env_u64("CACHE_TTL_MINUTES", 30),
            timeouts,
            jwt,
        })
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

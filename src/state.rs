use crate::config::AppConfig;
use crate::store::{MemoryStore, PgStore, Store};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store = match &config.database_url {
            Some(url) => {
                let db = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await?;

                if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
                    tracing::warn!(error = %e, "migration failed; continuing");
                }
                Arc::new(PgStore::new(db)) as Arc<dyn Store>
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using in-memory store");
                Arc::new(MemoryStore::new()) as Arc<dyn Store>
            }
        };

        Ok(Self::from_parts(store, config))
    }

    pub fn from_parts(store: Arc<dyn Store>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    /// In-memory state for tests.
    #[cfg(test)]
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            database_url: None,
            jwt: crate::config::JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
            },
        });
        Self::from_parts(Arc::new(MemoryStore::new()), config)
    }
}

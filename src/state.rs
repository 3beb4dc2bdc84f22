use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::{
    auth::{jwt::JwtKeys, password::hash_password},
    config::{AppConfig, StoreBackend},
    store::{AdminRole, MemoryStore, NewAdmin, PgStore, Store},
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
    pub keys: JwtKeys,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store: Arc<dyn Store> = match config.store_backend {
            StoreBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL is required for the postgres backend")?;
                let pg = PgStore::connect(url, config.database_max_connections).await?;
                pg.migrate().await?;
                Arc::new(pg)
            }
            StoreBackend::Memory => {
                tracing::warn!("using in-memory store; data is lost on restart");
                Arc::new(MemoryStore::new())
            }
        };

        let state = Self::from_parts(store, config);
        state.bootstrap_admin().await?;
        Ok(state)
    }

    pub fn from_parts(store: Arc<dyn Store>, config: Arc<AppConfig>) -> Self {
        let keys = JwtKeys::new(&config.jwt);
        Self {
            store,
            config,
            keys,
        }
    }

    /// Seeds the configured super-admin unless an admin with that email already exists.
    async fn bootstrap_admin(&self) -> anyhow::Result<()> {
        let Some(seed) = &self.config.bootstrap_admin else {
            return Ok(());
        };
        let email = seed.email.trim().to_lowercase();
        if self.store.find_admin_by_email(&email).await?.is_some() {
            return Ok(());
        }
        let hashed_password = hash_password(&seed.password)?;
        let admin = self
            .store
            .insert_admin(NewAdmin {
                email,
                full_name: seed.full_name.clone(),
                role: AdminRole::SuperAdmin,
                created_by: None,
                hashed_password,
            })
            .await?;
        info!(admin_id = %admin.id, email = %admin.email, "bootstrap super admin created");
        Ok(())
    }

    /// State over a fresh [`MemoryStore`] with fixed test JWT settings.
    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::config::JwtConfig;

        let config = Arc::new(AppConfig {
            store_backend: StoreBackend::Memory,
            database_url: None,
            database_max_connections: 1,
            jwt: JwtConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 30,
            },
            host: "127.0.0.1".into(),
            port: 0,
            cors_allowed_origins: vec![],
            bootstrap_admin: None,
        });
        Self::from_parts(Arc::new(MemoryStore::new()), config)
    }
}

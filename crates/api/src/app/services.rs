//! Service wiring: storage backend selection and shared handles.

use std::sync::Arc;

use tienda_auth::SessionStore;
use tienda_store::{MemStore, PgStore, Store};

use crate::config::ApiConfig;

/// Shared per-process services, injected into handlers as an extension.
pub struct AppServices {
    pub store: Arc<dyn Store>,
    pub sessions: Arc<SessionStore>,
    /// Base URL for absolute image URLs in product responses.
    pub public_base_url: String,
}

impl AppServices {
    pub fn new(store: Arc<dyn Store>, config: &ApiConfig) -> Self {
        Self {
            store,
            sessions: Arc::new(SessionStore::new(config.session_ttl)),
            public_base_url: config.public_base_url.clone(),
        }
    }
}

/// Build services from configuration: Postgres when `DATABASE_URL` is set,
/// the in-memory store otherwise.
pub async fn build_services(config: &ApiConfig) -> anyhow::Result<Arc<AppServices>> {
    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let pool = sqlx::PgPool::connect(url).await?;
            let store = PgStore::new(pool);
            store.migrate().await?;
            tracing::info!("using postgres store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using volatile in-memory store");
            Arc::new(MemStore::new())
        }
    };

    Ok(Arc::new(AppServices::new(store, config)))
}

//! Process configuration, read once from the environment at startup.

use chrono::Duration;

/// API configuration.
///
/// `database_url` is optional: without it the server runs on the in-memory
/// store, which is only meant for local development and tests.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: String,
    pub database_url: Option<String>,
    /// Base URL used to render absolute image URLs in product responses.
    pub public_base_url: String,
    pub session_ttl: Duration,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let database_url = std::env::var("DATABASE_URL").ok();
        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://{bind_addr}"))
            .trim_end_matches('/')
            .to_string();

        let session_ttl_minutes = std::env::var("SESSION_TTL_MINUTES")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(60);

        Self {
            bind_addr,
            database_url,
            public_base_url,
            session_ttl: Duration::minutes(session_ttl_minutes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        // Uses whatever the test environment has; only shape-level checks.
        let config = ApiConfig::from_env();
        assert!(!config.bind_addr.is_empty());
        assert!(!config.public_base_url.ends_with('/'));
        assert!(config.session_ttl > Duration::zero());
    }
}

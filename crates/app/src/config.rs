//! Application configuration loaded from environment variables.

use std::time::Duration;

/// Client configuration.
///
/// All fields have defaults suitable for a local backend stack. In other
/// environments, override via environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the auth service.
    pub auth_url: String,
    /// Base URL of the relational store's REST surface.
    pub store_url: String,
    /// Project API key sent with every collaborator request.
    pub api_key: String,
    /// Freshness window for cached reads.
    pub cache_ttl: Duration,
    /// Bounded wait for the initial session resolution.
    pub auth_resolve_timeout: Duration,
}

impl AppConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                  |
    /// |----------------------------|--------------------------|
    /// | `AUTH_URL`                 | `http://localhost:54321` |
    /// | `STORE_URL`                | `http://localhost:54321` |
    /// | `STORE_API_KEY`            | (empty)                  |
    /// | `CACHE_TTL_SECS`           | `30`                     |
    /// | `AUTH_RESOLVE_TIMEOUT_SECS`| `15`                     |
    pub fn from_env() -> Self {
        let auth_url =
            std::env::var("AUTH_URL").unwrap_or_else(|_| "http://localhost:54321".into());
        let store_url =
            std::env::var("STORE_URL").unwrap_or_else(|_| "http://localhost:54321".into());
        let api_key = std::env::var("STORE_API_KEY").unwrap_or_default();

        let cache_ttl_secs: u64 = std::env::var("CACHE_TTL_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("CACHE_TTL_SECS must be a valid u64");

        let auth_resolve_timeout_secs: u64 = std::env::var("AUTH_RESOLVE_TIMEOUT_SECS")
            .unwrap_or_else(|_| "15".into())
            .parse()
            .expect("AUTH_RESOLVE_TIMEOUT_SECS must be a valid u64");

        Self {
            auth_url,
            store_url,
            api_key,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            auth_resolve_timeout: Duration::from_secs(auth_resolve_timeout_secs),
        }
    }
}

//! Application configuration.
//!
//! Built once in `main` from the environment and passed by reference into
//! whatever needs it; no global settings module.

use chrono::Duration;

/// Process configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server binds to.
    pub bind_addr: String,

    /// Postgres connection string. `None` selects the in-memory stores
    /// (dev/tests only; nothing survives a restart).
    pub database_url: Option<String>,

    /// HS256 secret for access tokens.
    pub jwt_secret: String,

    /// Access-token time-to-live.
    pub token_ttl: Duration,

    /// Origins allowed by CORS (exact matches).
    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    /// Read configuration from the environment, with dev defaults.
    pub fn from_env() -> Self {
        let bind_addr =
            std::env::var("STOREKEEP_BIND").unwrap_or_else(|_| "0.0.0.0:8000".to_string());

        let database_url = std::env::var("DATABASE_URL").ok();
        if database_url.is_none() {
            tracing::warn!("DATABASE_URL not set; using in-memory stores (nothing is persisted)");
        }

        let jwt_secret = std::env::var("STOREKEEP_SECRET_KEY").unwrap_or_else(|_| {
            tracing::warn!("STOREKEEP_SECRET_KEY not set; using insecure dev default");
            "dev-secret".to_string()
        });

        let token_ttl_minutes = std::env::var("STOREKEEP_TOKEN_TTL_MINUTES")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(60);

        let cors_allowed_origins = std::env::var("STOREKEEP_CORS_ORIGINS")
            .map(|value| split_list(&value))
            .unwrap_or_else(|_| {
                vec![
                    "http://localhost:3000".to_string(),
                    "http://127.0.0.1:3000".to_string(),
                ]
            });

        Self {
            bind_addr,
            database_url,
            jwt_secret,
            token_ttl: Duration::minutes(token_ttl_minutes),
            cors_allowed_origins,
        }
    }

    /// In-memory configuration for tests.
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            bind_addr: "127.0.0.1:0".to_string(),
            database_url: None,
            jwt_secret: jwt_secret.to_string(),
            token_ttl: Duration::minutes(10),
            cors_allowed_origins: Vec::new(),
        }
    }
}

fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_list_trims_and_drops_empties() {
        assert_eq!(
            split_list("http://a.example, http://b.example ,,"),
            vec!["http://a.example".to_string(), "http://b.example".to_string()]
        );
    }
}

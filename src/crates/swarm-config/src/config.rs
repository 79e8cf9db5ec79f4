use std::env;
use std::str::FromStr;

use crate::error::ConfigError;

/// Pure environment-variable configuration. No YAML/TOML layering: unlike the
/// rest of this workspace's config loaders, every value here is read straight
/// from `std::env` once at startup.
#[derive(Debug, Clone)]
pub struct SwarmConfig {
    pub anthropic_api_key: String,
    pub auth_secret: String,
    pub supabase_url: Option<String>,
    pub supabase_service_role_key: Option<String>,
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub rate_limit_requests: u32,
    pub rate_limit_window_seconds: u64,
    pub agent_timeout_seconds: u64,
    pub agent_stagger_seconds: f64,
    pub max_concurrent_agents: usize,
    pub voyage_api_key: Option<String>,
    pub voyage_model: Option<String>,
    pub neo4j_uri: Option<String>,
    pub neo4j_user: Option<String>,
    pub neo4j_password: Option<String>,
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingRequired(key))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn with_default<T: FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl SwarmConfig {
    /// Reads every required and optional setting from the process
    /// environment. Fails only when a genuinely required variable is
    /// missing; everything else falls back to a documented default.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            anthropic_api_key: required("ANTHROPIC_API_KEY")?,
            auth_secret: required("AUTH_SECRET")?,
            supabase_url: optional("SUPABASE_URL"),
            supabase_service_role_key: optional("SUPABASE_SERVICE_ROLE_KEY"),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: with_default("PORT", 8080),
            cors_origins: optional("CORS_ORIGINS")
                .unwrap_or_else(|| "http://localhost:3000".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            rate_limit_requests: with_default("RATE_LIMIT_REQUESTS", 20),
            rate_limit_window_seconds: with_default("RATE_LIMIT_WINDOW_SECONDS", 60),
            agent_timeout_seconds: with_default("AGENT_TIMEOUT_SECONDS", 120),
            agent_stagger_seconds: with_default("AGENT_STAGGER_SECONDS", 2.5),
            max_concurrent_agents: with_default("MAX_CONCURRENT_AGENTS", 6),
            voyage_api_key: optional("VOYAGE_API_KEY"),
            voyage_model: optional("VOYAGE_MODEL"),
            neo4j_uri: optional("NEO4J_URI"),
            neo4j_user: optional("NEO4J_USER"),
            neo4j_password: optional("NEO4J_PASSWORD"),
        })
    }

    /// Whether enough Voyage configuration is present to attempt rehydration
    /// embeddings at all. Doesn't guarantee the gateway will report
    /// `rehydration_ready` — that's the persistence backend's call — just
    /// that this process was configured with the intent to use it.
    pub fn rehydration_configured(&self) -> bool {
        self.voyage_api_key.is_some()
    }

    /// Non-fatal startup checks. Returns the warnings a caller should log at
    /// `warn` level; informational gaps (an unconfigured optional
    /// integration) are logged directly here at `info` rather than
    /// collected, since they aren't actionable the way a weak secret is.
    pub fn validate_at_startup(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.auth_secret.len() < 16 {
            warnings.push(format!(
                "AUTH_SECRET is only {} characters; 16+ is recommended for an HMAC bearer secret",
                self.auth_secret.len()
            ));
        }

        if let Some(url) = &self.supabase_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                warnings.push(format!("SUPABASE_URL does not look like a URL: {url}"));
            }
        }

        for origin in &self.cors_origins {
            if !(origin.starts_with("http://") || origin.starts_with("https://")) {
                warnings.push(format!("CORS_ORIGINS entry does not look like an origin: {origin}"));
            }
        }

        if self.voyage_api_key.is_none() {
            tracing::info!("VOYAGE_API_KEY not set; rehydration will run in passthrough mode");
        }
        if self.neo4j_uri.is_none() {
            tracing::info!("NEO4J_URI not set; graph mirror to Neo4j disabled");
        }
        if self.supabase_url.is_none() {
            tracing::info!("SUPABASE_URL not set; persistence runs in-memory only");
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-global; serialize tests that touch them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for key in [
            "ANTHROPIC_API_KEY",
            "AUTH_SECRET",
            "SUPABASE_URL",
            "SUPABASE_SERVICE_ROLE_KEY",
            "HOST",
            "PORT",
            "CORS_ORIGINS",
            "RATE_LIMIT_REQUESTS",
            "RATE_LIMIT_WINDOW_SECONDS",
            "AGENT_TIMEOUT_SECONDS",
            "AGENT_STAGGER_SECONDS",
            "MAX_CONCURRENT_AGENTS",
            "VOYAGE_API_KEY",
            "VOYAGE_MODEL",
            "NEO4J_URI",
            "NEO4J_USER",
            "NEO4J_PASSWORD",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn from_env_fails_without_required_variables() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        let err = SwarmConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired("ANTHROPIC_API_KEY")));
    }

    #[test]
    fn from_env_applies_documented_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("ANTHROPIC_API_KEY", "key");
        env::set_var("AUTH_SECRET", "a-reasonably-long-secret");

        let config = SwarmConfig::from_env().unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.cors_origins, vec!["http://localhost:3000".to_string()]);
        assert_eq!(config.rate_limit_requests, 20);
        assert_eq!(config.agent_stagger_seconds, 2.5);
        assert_eq!(config.max_concurrent_agents, 6);
        clear_env();
    }

    #[test]
    fn validate_at_startup_flags_a_short_auth_secret() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("ANTHROPIC_API_KEY", "key");
        env::set_var("AUTH_SECRET", "short");
        let config = SwarmConfig::from_env().unwrap();
        let warnings = config.validate_at_startup();
        assert!(warnings.iter().any(|w| w.contains("AUTH_SECRET")));
        clear_env();
    }

    #[test]
    fn validate_at_startup_flags_a_malformed_cors_origin() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("ANTHROPIC_API_KEY", "key");
        env::set_var("AUTH_SECRET", "a-reasonably-long-secret");
        env::set_var("CORS_ORIGINS", "not-a-url, http://localhost:3000");
        let config = SwarmConfig::from_env().unwrap();
        let warnings = config.validate_at_startup();
        assert!(warnings.iter().any(|w| w.contains("not-a-url")));
        clear_env();
    }
}

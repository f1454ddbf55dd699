//! Server configuration, loaded from environment variables at startup.

use std::time::Duration;

use secrecy::SecretString;

/// Default Gemini REST endpoint.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default Gemini model used for summaries.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Runtime configuration for chatsum-server.
///
/// Every field has a sensible default so the server works out-of-the-box
/// without any environment variables set. A missing Gemini key is not an
/// error: summaries degrade to the local heuristic.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:8000"`).
    pub bind_address: String,

    /// sqlx SQLite connection string (default: `"sqlite://chatsum.db"`).
    pub database_url: String,

    /// Upper bound on pooled store connections.
    pub db_max_connections: u32,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// When set, log records are also written to daily-rolling files here.
    pub log_dir: Option<String>,

    /// Comma-separated list of allowed CORS origins. `None` allows any origin.
    pub cors_allowed_origins: Option<String>,

    /// Serve Swagger UI at `/swagger-ui`.
    pub enable_swagger: bool,

    /// External summarizer settings.
    pub gemini: GeminiConfig,
}

/// Settings for the Gemini-backed summarizer.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API credential; `None` means summaries always come from the fallback.
    pub api_key: Option<SecretString>,
    /// Model name without the `models/` prefix.
    pub model: String,
    /// REST base URL, without a trailing slash.
    pub base_url: String,
    /// Bound on a single generation request.
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_owned(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_owned(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build [`Config`] from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());
        let flag = |key: &str, default: bool| {
            lookup(key)
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(default)
        };
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            bind_address: env_or("CHATSUM_BIND", "0.0.0.0:8000"),
            database_url: env_or("CHATSUM_DATABASE_URL", "sqlite://chatsum.db"),
            db_max_connections: parse_or(&lookup, "CHATSUM_DB_MAX_CONNECTIONS", 16),
            log_level: env_or("CHATSUM_LOG", "info"),
            log_json: flag("CHATSUM_LOG_JSON", false),
            log_dir: non_empty("CHATSUM_LOG_DIR"),
            cors_allowed_origins: non_empty("CHATSUM_CORS_ORIGINS"),
            enable_swagger: flag("CHATSUM_ENABLE_SWAGGER", true),
            gemini: GeminiConfig {
                api_key: non_empty("GEMINI_API_KEY").map(SecretString::from),
                model: env_or("CHATSUM_GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
                base_url: env_or("CHATSUM_GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL)
                    .trim_end_matches('/')
                    .to_owned(),
                timeout: Duration::from_secs(parse_or(&lookup, "CHATSUM_SUMMARY_TIMEOUT_SECS", 30)),
            },
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod test {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let cfg = config_from(&[]);
        assert_eq!(cfg.bind_address, "0.0.0.0:8000");
        assert_eq!(cfg.database_url, "sqlite://chatsum.db");
        assert!(cfg.gemini.api_key.is_none());
        assert_eq!(cfg.gemini.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(cfg.gemini.timeout, Duration::from_secs(30));
        assert!(cfg.enable_swagger);
        assert!(cfg.cors_allowed_origins.is_none());
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let cfg = config_from(&[("GEMINI_API_KEY", "  ")]);
        assert!(cfg.gemini.api_key.is_none());
    }

    #[test]
    fn reads_overrides() {
        let cfg = config_from(&[
            ("GEMINI_API_KEY", "secret"),
            ("CHATSUM_GEMINI_BASE_URL", "http://127.0.0.1:9000/"),
            ("CHATSUM_SUMMARY_TIMEOUT_SECS", "5"),
            ("CHATSUM_LOG_JSON", "TRUE"),
            ("CHATSUM_DB_MAX_CONNECTIONS", "not-a-number"),
        ]);
        let key = cfg.gemini.api_key.as_ref().map(|k| k.expose_secret().to_owned());
        assert_eq!(key.as_deref(), Some("secret"));
        assert_eq!(cfg.gemini.base_url, "http://127.0.0.1:9000");
        assert_eq!(cfg.gemini.timeout, Duration::from_secs(5));
        assert!(cfg.log_json);
        assert_eq!(cfg.db_max_connections, 16);
    }
}

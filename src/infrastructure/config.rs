use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;

use crate::infrastructure::secrets::DEFAULT_SECRET_TTL;
use crate::modules::oclc::auth::{DEFAULT_SCOPE, OCLC_KEY, OCLC_SECRET, TOKEN_URL};
use crate::modules::oclc::discovery::{BASE_URL, SEARCH_TIMEOUT};
use crate::modules::springshare::default_url_replace_chars;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Required OCLC client credentials are not set
    MissingCredentials(Vec<&'static str>),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingCredentials(names) => {
                write!(f, "Missing required credentials: {}", names.join(", "))
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub oclc_base_url: String,
    pub oclc_token_url: String,
    pub oclc_scopes: Vec<String>,
    pub search_timeout: Duration,
    pub max_results_per_page: u32,
    pub default_results_per_page: u32,
    pub default_library: String,
    /// Referrer domain -> library symbol, in lookup order
    pub library_mappings: Vec<(String, String)>,
    /// Library symbol -> WorldCat Discovery site name
    pub site_mappings: HashMap<String, String>,
    pub default_site: String,
    pub url_replace_chars: Vec<String>,
    pub secret_cache_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            cors_allowed_origins: Vec::new(),
            oclc_base_url: BASE_URL.to_string(),
            oclc_token_url: TOKEN_URL.to_string(),
            oclc_scopes: vec![DEFAULT_SCOPE.to_string()],
            search_timeout: SEARCH_TIMEOUT,
            max_results_per_page: 50,
            default_results_per_page: 10,
            default_library: "SZH".to_string(),
            library_mappings: Vec::new(),
            site_mappings: HashMap::new(),
            default_site: "worldcat".to_string(),
            url_replace_chars: default_url_replace_chars(),
            secret_cache_ttl: DEFAULT_SECRET_TTL,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let missing: Vec<&'static str> = [OCLC_KEY, OCLC_SECRET]
            .into_iter()
            .filter(|name| env::var(name).map(|v| v.trim().is_empty()).unwrap_or(true))
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingCredentials(missing));
        }

        let defaults = Self::default();

        let max_results_per_page = parse_env("MAX_RESULTS_PER_PAGE", defaults.max_results_per_page);
        let config = Self {
            port: parse_env("PORT", defaults.port),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .ok()
                .map(|s| {
                    s.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_else(Vec::new),
            oclc_base_url: env::var("OCLC_BASE_URL").unwrap_or(defaults.oclc_base_url),
            oclc_token_url: env::var("OCLC_TOKEN_URL").unwrap_or(defaults.oclc_token_url),
            oclc_scopes: env::var("OCLC_SCOPES")
                .ok()
                .map(|s| s.split_whitespace().map(str::to_string).collect::<Vec<_>>())
                .filter(|scopes| !scopes.is_empty())
                .unwrap_or(defaults.oclc_scopes),
            search_timeout: Duration::from_secs(parse_env(
                "OCLC_SEARCH_TIMEOUT_SECS",
                defaults.search_timeout.as_secs(),
            )),
            max_results_per_page,
            default_results_per_page: parse_env(
                "DEFAULT_RESULTS_PER_PAGE",
                defaults.default_results_per_page,
            ),
            default_library: non_blank_env("DEFAULT_LIBRARY").unwrap_or(defaults.default_library),
            library_mappings: load_library_mappings(),
            site_mappings: parse_json_env("SITE_MAPPINGS", defaults.site_mappings),
            default_site: non_blank_env("DEFAULT_SITE").unwrap_or(defaults.default_site),
            url_replace_chars: parse_json_env("URL_REPLACE_CHARS", defaults.url_replace_chars),
            secret_cache_ttl: Duration::from_secs(parse_env(
                "SECRET_CACHE_TTL_SECS",
                defaults.secret_cache_ttl.as_secs(),
            )),
        };

        Ok(config.normalized())
    }

    /// Enforce `1 <= default page size <= max page size`.
    pub fn normalized(mut self) -> Self {
        self.max_results_per_page = self.max_results_per_page.max(1);
        let clamped = self
            .default_results_per_page
            .clamp(1, self.max_results_per_page);
        if clamped != self.default_results_per_page {
            tracing::warn!(
                "DEFAULT_RESULTS_PER_PAGE {} out of range, using {}",
                self.default_results_per_page,
                clamped
            );
            self.default_results_per_page = clamped;
        }
        self
    }
}

fn non_blank_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid value '{}' for {}, using default", raw, name);
            default
        }),
        Err(_) => default,
    }
}

fn parse_json_env<T: DeserializeOwned>(name: &str, default: T) -> T {
    let Ok(raw) = env::var(name) else {
        return default;
    };
    if raw.trim().is_empty() {
        return default;
    }
    match serde_json::from_str(&raw) {
        Ok(value) => {
            tracing::info!("Loaded {} from environment", name);
            value
        }
        Err(e) => {
            tracing::error!("Failed to parse {}: {}", name, e);
            default
        }
    }
}

/// JSON object order is the lookup order, so go through `serde_json::Map`
/// (insertion ordered) rather than a `HashMap`.
fn load_library_mappings() -> Vec<(String, String)> {
    let map: serde_json::Map<String, serde_json::Value> =
        parse_json_env("LIBRARY_MAPPINGS", serde_json::Map::new());

    map.into_iter()
        .filter_map(|(domain, symbol)| match symbol {
            serde_json::Value::String(symbol) => Some((domain, symbol)),
            other => {
                tracing::warn!("Ignoring library mapping {} -> {}: not a string", domain, other);
                None
            }
        })
        .collect()
}

//! Application state shared by all handlers

use std::sync::Arc;

use crate::infrastructure::config::Config;
use crate::infrastructure::secrets::{EnvSecretSource, SecretCache, SecretSource};
use crate::modules::oclc::{CredentialCache, HttpDiscoveryClient, HttpTokenTransport};
use crate::modules::query::{LibraryResolver, Paginator};
use crate::modules::springshare::ResultFormatter;
use crate::services::SearchService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub search: Arc<SearchService>,
}

impl AppState {
    /// Build the full pipeline, reading OCLC credentials from the environment.
    pub fn from_config(config: Config) -> Result<Self, reqwest::Error> {
        Self::with_secret_source(config, Arc::new(EnvSecretSource))
    }

    pub fn with_secret_source(
        config: Config,
        source: Arc<dyn SecretSource>,
    ) -> Result<Self, reqwest::Error> {
        let secrets = Arc::new(SecretCache::new(source, config.secret_cache_ttl));
        let transport =
            HttpTokenTransport::new(&config.oclc_token_url, &config.oclc_scopes, secrets)?;
        let credentials = Arc::new(CredentialCache::new(Arc::new(transport)));
        let discovery = HttpDiscoveryClient::new(&config.oclc_base_url, config.search_timeout)?;

        let search = SearchService::new(
            credentials,
            Arc::new(discovery),
            Paginator::new(config.default_results_per_page, config.max_results_per_page),
            LibraryResolver::new(config.library_mappings.clone(), &config.default_library),
            ResultFormatter::new(
                config.site_mappings.clone(),
                &config.default_site,
                config.url_replace_chars.clone(),
                config.default_results_per_page as usize,
            ),
        );

        Ok(Self {
            config: Arc::new(config),
            search: Arc::new(search),
        })
    }
}

//! OCLC client-credentials authentication.
//!
//! [`CredentialCache`] owns the single bearer token shared by all requests.
//! Readers take a fresh token without coordination. When the token is
//! missing or close to expiry exactly one caller refreshes it while the
//! others wait for that refresh and reuse its outcome. If the token
//! endpoint keeps failing, the last token obtained is served stale.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

use super::retry::{RetryPolicy, TransportError};
use crate::domain::SearchError;
use crate::infrastructure::secrets::SecretCache;

pub const TOKEN_URL: &str = "https://oauth.oclc.org/token";
pub const DEFAULT_SCOPE: &str = "WorldCatDiscoveryAPI:view_brief_bib";
pub const TOKEN_TIMEOUT: Duration = Duration::from_secs(10);
pub const OCLC_KEY: &str = "OCLC_KEY";
pub const OCLC_SECRET: &str = "OCLC_SECRET";

/// Tokens are refreshed this long before they actually expire.
pub fn default_skew() -> chrono::Duration {
    chrono::Duration::minutes(5)
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    /// Actual expiry as reported by the token endpoint
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    pub fn is_fresh(&self, now: DateTime<Utc>, skew: chrono::Duration) -> bool {
        self.expires_at
            .checked_sub_signed(skew)
            .is_some_and(|refresh_at| now < refresh_at)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// One attempt at obtaining a token. Retries are the cache's business.
#[async_trait]
pub trait TokenTransport: Send + Sync {
    async fn fetch_token(&self) -> Result<TokenResponse, TransportError>;
}

pub fn basic_auth_header(key: &str, secret: &str) -> String {
    format!("Basic {}", BASE64.encode(format!("{}:{}", key, secret)))
}

/// Client-credentials grant against the OCLC OAuth server.
pub struct HttpTokenTransport {
    client: reqwest::Client,
    token_url: String,
    scope: String,
    secrets: Arc<SecretCache>,
}

impl HttpTokenTransport {
    pub fn new(
        token_url: impl Into<String>,
        scopes: &[String],
        secrets: Arc<SecretCache>,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(TOKEN_TIMEOUT).build()?;
        Ok(Self {
            client,
            token_url: token_url.into(),
            scope: scopes.join(" "),
            secrets,
        })
    }
}

#[async_trait]
impl TokenTransport for HttpTokenTransport {
    async fn fetch_token(&self) -> Result<TokenResponse, TransportError> {
        let key = self
            .secrets
            .get(OCLC_KEY)
            .await
            .map_err(|e| TransportError::Secret(e.to_string()))?;
        let secret = self
            .secrets
            .get(OCLC_SECRET)
            .await
            .map_err(|e| TransportError::Secret(e.to_string()))?;

        let response = self
            .client
            .post(&self.token_url)
            .header(
                AUTHORIZATION,
                basic_auth_header(key.expose_secret(), secret.expose_secret()),
            )
            .header(ACCEPT, "application/json")
            .form(&[
                ("grant_type", "client_credentials"),
                ("scope", self.scope.as_str()),
            ])
            .send()
            .await
            .map_err(TransportError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            if status == StatusCode::UNAUTHORIZED {
                // Credentials may have been rotated; reload them next time.
                self.secrets.invalidate(OCLC_KEY);
                self.secrets.invalidate(OCLC_SECRET);
            }
            return Err(TransportError::Status(status.as_u16()));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}

struct CacheState {
    credential: Option<Credential>,
    /// Bumped by every completed refresh attempt, successful or not
    generation: u64,
}

pub struct CredentialCache {
    transport: Arc<dyn TokenTransport>,
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
    skew: chrono::Duration,
    state: RwLock<CacheState>,
    refresh: Mutex<()>,
}

impl CredentialCache {
    pub fn new(transport: Arc<dyn TokenTransport>) -> Self {
        Self {
            transport,
            clock: Arc::new(SystemClock),
            policy: RetryPolicy::token_endpoint(),
            skew: default_skew(),
            state: RwLock::new(CacheState {
                credential: None,
                generation: 0,
            }),
            refresh: Mutex::new(()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_skew(mut self, skew: chrono::Duration) -> Self {
        self.skew = skew;
        self
    }

    /// Current bearer token, refreshing it first when needed.
    pub async fn get(&self) -> Result<Credential, SearchError> {
        let observed = {
            let state = self.state.read().await;
            if let Some(credential) = &state.credential
                && credential.is_fresh(self.clock.now(), self.skew)
            {
                return Ok(credential.clone());
            }
            state.generation
        };

        let _refresh = self.refresh.lock().await;

        {
            let state = self.state.read().await;
            if state.generation != observed {
                // A refresh finished while we waited for the lock.
                return state.credential.clone().ok_or(SearchError::NoCredential);
            }
        }

        self.refresh_locked().await
    }

    /// Mark the cached token as expired. It stays available as a stale
    /// fallback until a refresh succeeds.
    pub async fn invalidate(&self) {
        let mut state = self.state.write().await;
        if let Some(credential) = state.credential.as_mut() {
            credential.expires_at = self.clock.now();
            tracing::info!("Cached OCLC token invalidated");
        }
    }

    pub async fn cached(&self) -> Option<Credential> {
        self.state.read().await.credential.clone()
    }

    fn credential_from(&self, token: TokenResponse) -> Result<Credential, TransportError> {
        let expires_at = chrono::Duration::try_seconds(token.expires_in)
            .and_then(|lifetime| self.clock.now().checked_add_signed(lifetime))
            .ok_or_else(|| {
                TransportError::Decode(format!("expires_in out of range: {}", token.expires_in))
            })?;
        Ok(Credential {
            token: token.access_token,
            expires_at,
        })
    }

    // Caller holds `self.refresh`.
    async fn refresh_locked(&self) -> Result<Credential, SearchError> {
        tracing::info!("Requesting new OCLC access token");
        let outcome = self
            .policy
            .run(|| self.transport.fetch_token())
            .await
            .and_then(|token| self.credential_from(token));

        let mut state = self.state.write().await;
        state.generation += 1;

        match outcome {
            Ok(credential) => {
                tracing::info!(
                    "OCLC token obtained, expires at {}",
                    credential.expires_at.to_rfc3339()
                );
                state.credential = Some(credential.clone());
                Ok(credential)
            }
            Err(e) => {
                tracing::error!("OCLC token request failed: {}", e);
                match &state.credential {
                    Some(stale) => {
                        tracing::warn!(
                            "Using expired OCLC token (expired at {})",
                            stale.expires_at.to_rfc3339()
                        );
                        Ok(stale.clone())
                    }
                    None => {
                        tracing::error!("No OCLC token available");
                        Err(SearchError::NoCredential)
                    }
                }
            }
        }
    }
}

//! OCLC upstream access: OAuth token cache and the discovery search client.

pub mod auth;
pub mod discovery;
pub mod retry;

pub use auth::{
    Clock, Credential, CredentialCache, HttpTokenTransport, SystemClock, TokenResponse,
    TokenTransport,
};
pub use discovery::{DATABASE_IDS, DiscoveryClient, DiscoveryError, HttpDiscoveryClient};
pub use retry::{RetryPolicy, TransportError};

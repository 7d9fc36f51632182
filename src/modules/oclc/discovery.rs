//! WorldCat Discovery `brief-bibs` search client.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

use crate::models::BriefBibsQuery;

pub const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);
pub const BASE_URL: &str = "https://discovery.api.oclc.org/worldcat-org-ci";
/// WorldCat database id
pub const DATABASE_IDS: &str = "638";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    Timeout,
    /// Non-success HTTP status from the search endpoint
    Status(u16),
    Network(String),
    /// Body was not JSON
    Decode(String),
}

impl DiscoveryError {
    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            DiscoveryError::Timeout
        } else if e.is_decode() {
            DiscoveryError::Decode(e.to_string())
        } else {
            DiscoveryError::Network(e.to_string())
        }
    }
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryError::Timeout => write!(f, "search request timed out"),
            DiscoveryError::Status(code) => write!(f, "search endpoint returned HTTP {}", code),
            DiscoveryError::Network(msg) => write!(f, "{}", msg),
            DiscoveryError::Decode(msg) => write!(f, "invalid search response: {}", msg),
        }
    }
}

impl std::error::Error for DiscoveryError {}

#[async_trait]
pub trait DiscoveryClient: Send + Sync {
    /// One search call, no retries. Returns the raw JSON body.
    async fn brief_bibs(&self, token: &str, query: &BriefBibsQuery)
    -> Result<Value, DiscoveryError>;
}

pub struct HttpDiscoveryClient {
    client: reqwest::Client,
    search_url: String,
}

impl HttpDiscoveryClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            search_url: format!("{}/search/brief-bibs", base_url.trim_end_matches('/')),
        })
    }

    pub fn search_url(&self) -> &str {
        &self.search_url
    }
}

#[async_trait]
impl DiscoveryClient for HttpDiscoveryClient {
    async fn brief_bibs(
        &self,
        token: &str,
        query: &BriefBibsQuery,
    ) -> Result<Value, DiscoveryError> {
        tracing::debug!(
            "Searching {} for '{}' (offset {}, limit {}, held by {})",
            self.search_url,
            query.q,
            query.offset,
            query.limit,
            query.held_by_symbol
        );

        let response = self
            .client
            .get(&self.search_url)
            .bearer_auth(token)
            .header(ACCEPT, "application/json")
            .query(query)
            .send()
            .await
            .map_err(DiscoveryError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::Status(status.as_u16()));
        }

        response.json::<Value>().await.map_err(DiscoveryError::from_reqwest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn query() -> BriefBibsQuery {
        BriefBibsQuery {
            q: "python".to_string(),
            offset: 11,
            limit: 10,
            held_by_symbol: "SZH".to_string(),
            db_ids: DATABASE_IDS.to_string(),
            order_by: "bestMatch".to_string(),
        }
    }

    #[tokio::test]
    async fn sends_bearer_token_and_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/brief-bibs"))
            .and(header("authorization", "Bearer tok"))
            .and(query_param("q", "python"))
            .and(query_param("offset", "11"))
            .and(query_param("limit", "10"))
            .and(query_param("heldBySymbol", "SZH"))
            .and(query_param("dbIds", "638"))
            .and(query_param("orderBy", "bestMatch"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"numberOfRecords": 3})))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpDiscoveryClient::new(&format!("{}/", server.uri()), SEARCH_TIMEOUT).unwrap();
        let body = client.brief_bibs("tok", &query()).await.unwrap();
        assert_eq!(body["numberOfRecords"], 3);
    }

    #[tokio::test]
    async fn maps_status_and_timeout() {
        let server = MockServer::start().await;
        Mock::given(path("/slow/search/brief-bibs"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;
        Mock::given(path("/down/search/brief-bibs"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let slow = HttpDiscoveryClient::new(&format!("{}/slow", server.uri()), Duration::from_millis(50))
            .unwrap();
        assert_eq!(slow.brief_bibs("tok", &query()).await, Err(DiscoveryError::Timeout));

        let down = HttpDiscoveryClient::new(&format!("{}/down", server.uri()), SEARCH_TIMEOUT).unwrap();
        assert_eq!(down.brief_bibs("tok", &query()).await, Err(DiscoveryError::Status(502)));
    }

    #[tokio::test]
    async fn non_json_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(path("/search/brief-bibs"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let client = HttpDiscoveryClient::new(&server.uri(), SEARCH_TIMEOUT).unwrap();
        assert!(matches!(
            client.brief_bibs("tok", &query()).await,
            Err(DiscoveryError::Decode(_))
        ));
    }
}

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use worldcat_bridge::infrastructure::secrets::{SecretError, SecretSource};
use worldcat_bridge::infrastructure::{AppState, Config};
use worldcat_bridge::server::build_router;

struct StaticSecrets;

#[async_trait::async_trait]
impl SecretSource for StaticSecrets {
    async fn fetch(&self, name: &str) -> Result<Option<String>, SecretError> {
        Ok(match name {
            "OCLC_KEY" => Some("key".to_string()),
            "OCLC_SECRET" => Some("secret".to_string()),
            _ => None,
        })
    }
}

fn test_config(server: &MockServer) -> Config {
    let mut sites = HashMap::new();
    sites.insert("JNU".to_string(), "johnsonu".to_string());
    Config {
        oclc_base_url: server.uri(),
        oclc_token_url: format!("{}/token", server.uri()),
        library_mappings: vec![("library.jnu.edu".to_string(), "JNU".to_string())],
        site_mappings: sites,
        ..Config::default()
    }
}

fn app(config: Config) -> Router {
    let state = AppState::with_secret_source(config, Arc::new(StaticSecrets))
        .expect("Failed to build state");
    build_router(state)
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "test-token",
            "expires_in": 1199,
            "token_type": "bearer"
        })))
        .mount(server)
        .await;
}

fn brief_bibs() -> Value {
    json!({
        "numberOfRecords": 2817,
        "briefRecords": [
            {
                "title": "Learning Python",
                "oclcNumber": "857881924",
                "creator": "Mark Lutz",
                "date": "2013",
                "publisher": "O'Reilly",
                "isbns": ["9781449355739"],
                "generalFormat": "Book"
            },
            {
                "title": "Python - The Complete Reference",
                "oclcNumber": "1035353370",
                "creator": "Martin C. Brown",
                "date": "2018",
                "publisher": "McGraw-Hill",
                "isbns": [],
                "issns": null,
                "generalFormat": "Book"
            }
        ]
    })
}

async fn get(app: Router, uri: &str, referer: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder().uri(uri);
    if let Some(referer) = referer {
        request = request.header("referer", referer);
    }
    let response = app
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_search_returns_formatted_results() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/search/brief-bibs"))
        .and(header("authorization", "Bearer test-token"))
        .and(query_param("q", "python"))
        .and(query_param("offset", "1"))
        .and(query_param("limit", "10"))
        .and(query_param("heldBySymbol", "SZH"))
        .and(query_param("dbIds", "638"))
        .and(query_param("orderBy", "bestMatch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(brief_bibs()))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = get(app(test_config(&server)), "/search?q=python&page=1&perpage=10", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_results"], 2817);
    assert_eq!(body["perpage"], 2);
    assert_eq!(body["sort"], json!({"field": "relevancy", "dir": "desc"}));

    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    for result in results {
        assert!(!result["title"].as_str().unwrap().is_empty());
        assert!(result["url"]
            .as_str()
            .unwrap()
            .starts_with("https://worldcat.on.worldcat.org/search?queryString="));
    }
    assert_eq!(results[0]["identifier"], "9781449355739");
    assert_eq!(results[0]["author"], "Mark Lutz");
    assert_eq!(
        results[1]["url"],
        "https://worldcat.on.worldcat.org/search?queryString=ti%3APython%20The%20Complete%20Reference"
    );
    assert_eq!(results[1]["identifier"], "");
}

#[tokio::test]
async fn test_referer_selects_library_and_site() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/search/brief-bibs"))
        .and(query_param("heldBySymbol", "JNU"))
        .and(query_param("orderBy", "publicationDateDesc"))
        .and(query_param("offset", "21"))
        .and(query_param("limit", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(brief_bibs()))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = get(
        app(test_config(&server)),
        "/search?q=python&page=2&perpage=20&sort=date_desc",
        Some("https://LIBRARY.jnu.edu/research/guides"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sort"], json!({"field": "date", "dir": "desc"}));
    assert!(body["results"][0]["url"]
        .as_str()
        .unwrap()
        .starts_with("https://johnsonu.on.worldcat.org/search?queryString="));
}

#[tokio::test]
async fn test_repeated_parameters_use_first_value() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/search/brief-bibs"))
        .and(query_param("q", "a"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(brief_bibs()))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = get(
        app(test_config(&server)),
        "/search?q=a&q=b&perpage=5&perpage=50",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_results"], 2817);
}

#[tokio::test]
async fn test_token_request_uses_client_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(header("authorization", "Basic a2V5OnNlY3JldA=="))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("scope=WorldCatDiscoveryAPI%3Aview_brief_bib"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "test-token",
            "expires_in": 1199
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search/brief-bibs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(brief_bibs()))
        .expect(2)
        .mount(&server)
        .await;

    let app = app(test_config(&server));
    let (first, _) = get(app.clone(), "/search?q=python", None).await;
    let (second, _) = get(app, "/search?q=java", None).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
}

#[tokio::test]
async fn test_validation_errors_are_400() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(path("/search/brief-bibs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(brief_bibs()))
        .expect(0)
        .mount(&server)
        .await;

    let app = app(test_config(&server));

    let (status, body) = get(app.clone(), "/search?q=", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Search query cannot be empty");
    assert_eq!(body["total_results"], 0);
    assert_eq!(body["results"], json!([]));

    let (status, body) = get(app.clone(), "/search?q=python&page=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Page number"));

    let (status, body) = get(app.clone(), "/search?q=python&perpage=1000", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("cannot exceed 50"));

    let (status, body) = get(app.clone(), "/search?q=python&sort=bogus_desc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("sort"));

    let (status, _) = get(app, "/search?q=python&page=2000&perpage=10", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upstream_timeout_is_503() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(path("/search/brief-bibs"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(brief_bibs())
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let config = Config {
        search_timeout: Duration::from_millis(200),
        ..test_config(&server)
    };
    let (status, body) = get(app(config), "/search?q=python", None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Request timed out");
    assert_eq!(body["results"], json!([]));
}

#[tokio::test]
async fn test_upstream_error_is_503() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(path("/search/brief-bibs"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (status, body) = get(app(test_config(&server)), "/search?q=python", None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().starts_with("Search request failed"));
}

#[tokio::test]
async fn test_rejected_credentials_are_401() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "invalid client"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/search/brief-bibs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(brief_bibs()))
        .expect(0)
        .mount(&server)
        .await;

    let (status, body) = get(app(test_config(&server)), "/search?q=python", None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Authentication failed");
    assert_eq!(body["total_results"], 0);
}

#[tokio::test]
async fn test_non_json_upstream_is_generic_500() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(path("/search/brief-bibs"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>down for maintenance</html>"))
        .mount(&server)
        .await;

    let (status, body) = get(app(test_config(&server)), "/search?q=python", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "An unexpected error occurred");
    assert!(!body["error"].as_str().unwrap().contains("maintenance"));
}

#[tokio::test]
async fn test_health_check() {
    let server = MockServer::start().await;
    let (status, body) = get(app(test_config(&server)), "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "worldcat-bridge");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let server = MockServer::start().await;
    let (status, body) = get(app(test_config(&server)), "/api-docs/openapi.json", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"].get("/search").is_some());
    assert!(body["paths"].get("/health").is_some());
}

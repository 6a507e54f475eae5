//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and exercise fetching,
//! seeding, scoring and whole crawl sessions end-to-end.

use sieve_crawl::config::{parse_config, Config};
use sieve_crawl::crawler::{
    build_http_client, run_session, Crawler, FetchError, HttpFetcher, PageFetcher,
    SearchCredentials, SeedMode, SessionRequest,
};
use sieve_crawl::output::read_pending;
use sieve_crawl::scoring::{EmbeddingModel, Scorer, SimilarityModel};
use sieve_crawl::seeds::{collect_seeds, CustomSearchProvider, SeedError, SeedProvider};
use sieve_crawl::sink::{ResultSink, SqliteSink};
use sieve_crawl::{LinkCategory, SieveError};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ROOT_PAGE: &str = r#"<html><head><title>Home</title></head><body>
    <p>Welcome to our home page</p>
    <a href="/a">A</a>
    <a href="/b">B</a>
    </body></html>"#;

const WIDGET_PAGE: &str = r#"<html><head><title>Widgets</title></head><body>
    <p>We sell the best widget around</p>
    <div>Quotes: sales@x.test</div>
    <a href="/">Home</a>
    </body></html>"#;

const OTHER_PAGE: &str = r#"<html><head><title>Other</title></head><body>
    <p>Nothing to see here</p>
    </body></html>"#;

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

/// Mounts the three-page site; each page may be requested `times` times
async fn mount_site(server: &MockServer, times: u64) {
    for (route, body) in [("/", ROOT_PAGE), ("/a", WIDGET_PAGE), ("/b", OTHER_PAGE)] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(html(body))
            .expect(times)
            .mount(server)
            .await;
    }
}

/// Builds a validated config whose sinks live in `dir`
fn create_test_config(dir: &Path, seeds: &[String], extra: &str) -> Config {
    let domains = seeds
        .iter()
        .map(|s| format!("\"{}\"", s))
        .collect::<Vec<_>>()
        .join(", ");

    let toml = format!(
        r#"
[crawler]
max-depth = 1
crawl-timeout = 30
max-concurrent-fetches = 2
fetch-timeout = 5

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[seeds]
custom-domains = [{domains}]

[output]
open-path = "{dir}/open.db"
form-path = "{dir}/form.db"
pending-path = "{dir}/pending.json"

{extra}
"#,
        domains = domains,
        dir = dir.display(),
        extra = extra,
    );

    parse_config(&toml).expect("test config should be valid")
}

fn keywords() -> Vec<String> {
    vec!["widget".to_string()]
}

fn domains_request() -> SessionRequest {
    SessionRequest {
        keywords: keywords(),
        mode: SeedMode::Domains,
        credentials: SearchCredentials::default(),
    }
}

fn http_fetcher() -> HttpFetcher {
    let config = create_test_config(Path::new("/tmp"), &[], "");
    let client = build_http_client(&config.user_agent, Duration::from_secs(5)).unwrap();
    HttpFetcher::new(client)
}

#[tokio::test]
async fn test_end_to_end_single_relevant_page() {
    let server = MockServer::start().await;
    mount_site(&server, 1).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), &[], "");
    let crawler = Crawler::from_config(&config).await.unwrap();

    let seed = Url::parse(&format!("{}/", server.uri())).unwrap();
    let results = crawler.crawl(&[seed], &keywords()).await;

    assert_eq!(results.total(), 1);
    let record = &results.form[0];
    assert_eq!(record.url, format!("{}/a", server.uri()));
    assert_eq!(record.title, "Widgets");
    assert_eq!(record.summary, "We sell the best widget around");
    assert_eq!(record.category, LinkCategory::Form);
    assert!(record.score >= 0.2);

    // The link back to "/" from /a is at the depth bound and never followed
    assert_eq!(results.stats.claimed, 3);
    assert_eq!(results.stats.fetched, 3);
    assert!(!results.stats.deadline_reached);
}

#[tokio::test]
async fn test_markup_only_rule_classifies_as_open() {
    let server = MockServer::start().await;
    mount_site(&server, 1).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), &[], "[classifier]\nrule = \"markup-only\"");
    let crawler = Crawler::from_config(&config).await.unwrap();

    let seed = Url::parse(&format!("{}/", server.uri())).unwrap();
    let results = crawler.crawl(&[seed], &keywords()).await;

    assert!(results.form.is_empty());
    assert_eq!(results.open.len(), 1);
    assert_eq!(results.open[0].category, LinkCategory::Open);
}

#[tokio::test]
async fn test_session_persists_and_dedupes_across_runs() {
    let server = MockServer::start().await;
    mount_site(&server, 2).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), &[server.uri()], "");

    let first = run_session(&config, domains_request()).await.unwrap();
    assert_eq!(first.seed_count, 1);
    assert!(first.open_added.is_empty());
    assert_eq!(first.form_added.len(), 1);
    assert!(first.failed.is_empty());

    let second = run_session(&config, domains_request()).await.unwrap();
    assert!(second.form_added.is_empty());
    assert_eq!(second.stats.relevant, 1);

    let sink = SqliteSink::new(&dir.path().join("form.db")).unwrap();
    let keys = sink.existing_keys().unwrap();
    assert_eq!(keys.len(), 1);
    assert!(keys.contains(&format!("{}/a", server.uri())));
}

#[tokio::test]
async fn test_session_sink_failure_writes_pending_dump() {
    let server = MockServer::start().await;
    mount_site(&server, 1).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path(), &[server.uri()], "");
    config.output.form_path = dir
        .path()
        .join("missing-dir")
        .join("form.db")
        .to_string_lossy()
        .into_owned();

    let report = run_session(&config, domains_request()).await.unwrap();

    assert!(report.form_added.is_empty());
    assert_eq!(report.failed.len(), 1);

    let pending = read_pending(&dir.path().join("pending.json")).unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].url, format!("{}/a", server.uri()));
}

#[tokio::test]
async fn test_search_mode_requires_credentials_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let extra = format!("[search]\nendpoint = \"{}/customsearch/v1\"", server.uri());
    let config = create_test_config(dir.path(), &[], &extra);

    let request = SessionRequest {
        keywords: keywords(),
        mode: SeedMode::Search,
        credentials: SearchCredentials {
            api_key: Some("key".to_string()),
            engine_id: None,
        },
    };

    let result = run_session(&config, request).await;
    assert!(matches!(
        result,
        Err(SieveError::Seed(SeedError::MissingCredentials(_)))
    ));
}

#[tokio::test]
async fn test_session_without_seeds_does_not_crawl() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), &[], "");

    let result = run_session(&config, domains_request()).await;
    assert!(matches!(result, Err(SieveError::Seed(SeedError::NoSeeds))));
}

#[tokio::test]
async fn test_search_provider_unions_and_query_results() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .and(query_param("q", r#""upi" AND "fraud""#))
        .and(query_param("key", "test-key"))
        .and(query_param("cx", "test-cx"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [
                { "link": "https://one.test/" },
                { "title": "no link" },
                { "link": "mailto:someone@one.test" },
                { "link": "https://two.test/page" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .and(query_param("q", r#""upi" OR "fraud""#))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [
                { "link": "https://two.test/page" },
                { "link": "https://three.test/" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = CustomSearchProvider::new(
        reqwest::Client::new(),
        &format!("{}/customsearch/v1", server.uri()),
        Some("test-key".to_string()),
        Some("test-cx".to_string()),
    )
    .unwrap();

    let keywords = vec!["upi".to_string(), "fraud".to_string()];
    let seeds = collect_seeds(&provider, &keywords).await.unwrap();
    let seeds: Vec<&str> = seeds.iter().map(Url::as_str).collect();

    assert_eq!(
        seeds,
        vec![
            "https://one.test/",
            "https://two.test/page",
            "https://three.test/"
        ]
    );
}

#[tokio::test]
async fn test_search_provider_reports_api_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_string("quota exceeded"))
        .mount(&server)
        .await;

    let provider = CustomSearchProvider::new(
        reqwest::Client::new(),
        &server.uri(),
        Some("k".to_string()),
        Some("cx".to_string()),
    )
    .unwrap();

    let result = collect_seeds(&provider, &keywords()).await;
    match result {
        Err(SeedError::Status { status, body }) => {
            assert_eq!(status, 403);
            assert_eq!(body, "quota exceeded");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_search_provider_malformed_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let provider = CustomSearchProvider::new(
        reqwest::Client::new(),
        &server.uri(),
        Some("k".to_string()),
        Some("cx".to_string()),
    )
    .unwrap();

    let result = collect_seeds(&provider, &keywords()).await;
    assert!(matches!(result, Err(SeedError::Malformed(_))));
}

#[tokio::test]
async fn test_search_transport_error_hides_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "items": [] }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let provider = CustomSearchProvider::new(
        client,
        &server.uri(),
        Some("SECRETKEY123".to_string()),
        Some("cx".to_string()),
    )
    .unwrap();

    let err = provider.search(r#""a""#).await.unwrap_err();
    assert!(matches!(err, SeedError::Http(_)));
    let message = err.to_string();
    assert!(!message.contains("SECRETKEY123"), "key leaked: {}", message);
    assert!(!message.contains(&server.uri()));
}

#[tokio::test]
async fn test_fetcher_parses_html_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(ROOT_PAGE))
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/", server.uri())).unwrap();
    let page = http_fetcher().fetch(&url).await.unwrap();

    assert_eq!(page.title, "Home");
    assert_eq!(page.summary, "Welcome to our home page");
    let links: Vec<String> = page.links.iter().map(|u| u.to_string()).collect();
    assert_eq!(
        links,
        vec![format!("{}/a", server.uri()), format!("{}/b", server.uri())]
    );
}

#[tokio::test]
async fn test_fetcher_maps_failures() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/empty"))
        .respond_with(html("   "))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let fetcher = http_fetcher();
    let fetch = |route: &str| {
        let url = Url::parse(&format!("{}{}", server.uri(), route)).unwrap();
        let fetcher = fetcher.clone();
        async move { fetcher.fetch(&url).await }
    };

    assert!(matches!(fetch("/missing").await, Err(FetchError::Status(404))));
    assert!(matches!(fetch("/broken").await, Err(FetchError::Status(503))));
    assert!(matches!(fetch("/data.json").await, Err(FetchError::NotHtml(_))));
    assert!(matches!(fetch("/empty").await, Err(FetchError::EmptyBody)));
}

#[tokio::test]
async fn test_fetcher_follows_redirects() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new/"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new/"))
        .respond_with(html(r#"<p>moved</p><a href="child">c</a>"#))
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/old", server.uri())).unwrap();
    let page = http_fetcher().fetch(&url).await.unwrap();

    assert_eq!(page.url.path(), "/new/");
    // Relative links resolve against the final URL
    assert_eq!(page.links[0].path(), "/new/child");
}

#[tokio::test]
async fn test_fetch_timeout_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html("<p>slow</p>").set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let config = create_test_config(Path::new("/tmp"), &[], "");
    let client = build_http_client(&config.user_agent, Duration::from_millis(200)).unwrap();
    let url = Url::parse(&server.uri()).unwrap();

    let result = HttpFetcher::new(client).fetch(&url).await;
    assert!(matches!(result, Err(FetchError::Timeout)));
}

#[tokio::test]
async fn test_embedding_scorer_against_mock_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_json(serde_json::json!({
            "model": "test-embed",
            "input": ["We sell widgets", "widget"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [
                { "index": 1, "embedding": [0.6, 0.8] },
                { "index": 0, "embedding": [0.8, 0.6] }
            ]
        })))
        .mount(&server)
        .await;

    let model = EmbeddingModel::new(
        reqwest::Client::new(),
        &format!("{}/v1/", server.uri()),
        "test-embed",
        Some("sk-test".to_string()),
    );

    let relevant = Scorer::new(Arc::new(model.clone()), 0.9)
        .score("We sell widgets", &keywords())
        .await;
    assert!(relevant.is_relevant);
    assert!((relevant.score - 0.96).abs() < 1e-6);

    let strict = Scorer::new(Arc::new(model), 0.97)
        .score("We sell widgets", &keywords())
        .await;
    assert!(!strict.is_relevant);
}

#[tokio::test]
async fn test_embedding_failure_scores_zero() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let model = EmbeddingModel::new(reqwest::Client::new(), &server.uri(), "m", None);
    let relevance = Scorer::new(Arc::new(model), 0.0)
        .score("some text", &keywords())
        .await;

    assert!(!relevance.is_relevant);
    assert_eq!(relevance.score, 0.0);
}

#[tokio::test]
async fn test_embedding_input_is_capped() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(body_json(serde_json::json!({
            "model": "m",
            "input": ["We sell", "widget"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [
                { "index": 0, "embedding": [1.0, 0.0] },
                { "index": 1, "embedding": [1.0, 0.0] }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let model = EmbeddingModel::new(reqwest::Client::new(), &server.uri(), "m", None)
        .with_max_input_chars(7);
    let relevance = Scorer::new(Arc::new(model), 0.5)
        .score("We sell widgets and gadgets", &keywords())
        .await;

    assert!(relevance.is_relevant);
    assert!((relevance.score - 1.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_embedding_transport_error_hides_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let endpoint = format!("{}/v1", server.uri());
    let model = EmbeddingModel::new(client, &endpoint, "m", Some("sk-test".to_string()));

    let message = model
        .similarity("We sell widgets", "widget")
        .await
        .unwrap_err()
        .to_string();
    assert!(!message.contains(&endpoint), "url leaked: {}", message);
    assert!(!message.contains("sk-test"));
}

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use jobbot_core::AppError;
use jobbot_core::testutil::{MockFetcher, MockPage, MockRenderer};

use crate::integration::common::{json_body, post_json, setup_test_app};

const FEED: &str = "https://example.com/jobs.rss";

#[tokio::test]
async fn health_returns_200() {
    let app = setup_test_app(MockFetcher::new(), MockRenderer::new());

    let response = app
        .router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"status": "ok"}));
}

#[tokio::test]
async fn scrape_feed_returns_jobs() {
    let fetcher = MockFetcher::new().with_page(
        FEED,
        "<rss><channel>\
         <item><title>A</title><link>https://x/1</link></item>\
         <item><title>B</title><link>https://x/2</link></item>\
         </channel></rss>",
    );
    let app = setup_test_app(fetcher, MockRenderer::new());

    let response = app
        .router
        .oneshot(post_json("/scrape", json!({"url": FEED}).to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({
            "ok": true,
            "jobs": [
                {"title": "A", "url": "https://x/1", "description": ""},
                {"title": "B", "url": "https://x/2", "description": ""},
            ]
        })
    );
}

#[tokio::test]
async fn scrape_type_hint_overrides_classification() {
    let url = "https://example.com/postings";
    let fetcher = MockFetcher::new().with_page(
        url,
        r#"{"data":[{"text":"Engineer","applyUrl":"https://x/3"}]}"#,
    );
    let app = setup_test_app(fetcher, MockRenderer::new());

    let response = app
        .router
        .oneshot(post_json("/scrape", json!({"url": url, "type": "api"}).to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["jobs"][0]["title"], "Engineer");
    assert_eq!(body["jobs"][0]["url"], "https://x/3");
    assert_eq!(app.renderer.opened(), 0);
}

#[tokio::test]
async fn scrape_rendered_page_returns_jobs() {
    let url = "https://example.com/careers";
    let renderer = MockRenderer::new().with_page(
        url,
        MockPage::new()
            .with_anchor("https://example.com/careers/42", "Welder")
            .with_anchor("https://example.com/about", "About"),
    );
    let app = setup_test_app(MockFetcher::new(), renderer);

    let response = app
        .router
        .oneshot(post_json("/scrape", json!({"url": url}).to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(
        body["jobs"],
        json!([{"title": "Welder", "url": "https://example.com/careers/42", "description": ""}])
    );
    assert_eq!(app.renderer.live_sessions(), 0);
}

#[tokio::test]
async fn missing_url_returns_400() {
    let app = setup_test_app(MockFetcher::new(), MockRenderer::new());

    let response = app
        .router
        .oneshot(post_json("/scrape", "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await, json!({"error": "url required"}));
    assert!(app.fetcher.calls().is_empty());
}

#[tokio::test]
async fn blank_url_returns_400() {
    let app = setup_test_app(MockFetcher::new(), MockRenderer::new());

    let response = app
        .router
        .oneshot(post_json("/scrape", json!({"url": "   "}).to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "url required");
}

#[tokio::test]
async fn malformed_json_returns_400() {
    let app = setup_test_app(MockFetcher::new(), MockRenderer::new());

    let response = app
        .router
        .oneshot(post_json("/scrape", "{\"url\": "))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(!body["error"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn policy_rejection_returns_500() {
    let fetcher = MockFetcher::new()
        .with_page("https://example.com/robots.txt", "User-agent: *\nDisallow: /\n")
        .with_page(FEED, "<item><title>A</title><link>https://x/1</link></item>");
    let app = setup_test_app(fetcher, MockRenderer::new());

    let response = app
        .router
        .oneshot(post_json("/scrape", json!({"url": FEED}).to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("robots.txt"));
    assert_eq!(app.fetcher.calls(), vec!["https://example.com/robots.txt"]);
}

#[tokio::test]
async fn fetch_failure_returns_500() {
    let fetcher = MockFetcher::new().with_response(
        FEED,
        Err(AppError::FetchError(format!("HTTP 503 for {FEED}"))),
    );
    let app = setup_test_app(fetcher, MockRenderer::new());

    let response = app
        .router
        .oneshot(post_json("/scrape", json!({"url": FEED}).to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await,
        json!({"error": format!("Fetch error: HTTP 503 for {FEED}")})
    );
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let app = setup_test_app(MockFetcher::new(), MockRenderer::new());
    let padding = "x".repeat(jobbot_server::routes::MAX_BODY_BYTES + 1);
    let body = json!({"url": FEED, "padding": padding}).to_string();

    let response = app
        .router
        .oneshot(post_json("/scrape", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(app.fetcher.calls().is_empty());
}

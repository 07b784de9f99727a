use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;

use jobbot_core::testutil::{MockFetcher, MockRenderer};
use jobbot_core::{ExtractionService, HostThrottle, ScraperConfig, ThrottleConfig};
use jobbot_server::routes;
use jobbot_server::state::AppState;

/// Router wired to mock collaborators, plus handles to inspect them.
pub struct TestApp {
    pub router: Router,
    pub fetcher: MockFetcher,
    pub renderer: MockRenderer,
}

pub fn setup_test_app(fetcher: MockFetcher, renderer: MockRenderer) -> TestApp {
    let throttle = HostThrottle::new(ThrottleConfig::new(Duration::from_millis(10)));
    let service = ExtractionService::new(
        fetcher.clone(),
        fetcher.clone(),
        renderer.clone(),
        throttle,
        &ScraperConfig::default(),
    );
    let state = Arc::new(AppState {
        extractor: Arc::new(service),
    });

    TestApp {
        router: routes::router(state),
        fetcher,
        renderer,
    }
}

pub fn post_json(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

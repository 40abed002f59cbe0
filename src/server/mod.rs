//! HTTP endpoint for the scrape pipeline.
//!
//! `POST /api/scrape` (also mounted at `/scrape`) takes `{"url": "..."}` and
//! returns the extracted `{title, description, content}` or a structured error.

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::app::{Result, SiftError};
use crate::scraper::ScrapePipeline;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ScrapePipeline>,
}

impl AppState {
    pub fn new(pipeline: Arc<ScrapePipeline>) -> Self {
        Self { pipeline }
    }
}

/// Start the web server.
pub async fn serve(pipeline: Arc<ScrapePipeline>, host: &str, port: u16) -> Result<()> {
    let app = create_router(AppState::new(pipeline));

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|e| {
            SiftError::Config(format!("Invalid listen address {}:{}: {}", host, port, e))
        })?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use crate::domain::Tier;
    use crate::scraper::testing::{
        stub_pipeline, FetchBehavior, StubFetcher, StubRenderer, ARTICLE_HTML,
    };

    fn app_with(fetcher: StubFetcher, stealth: StubRenderer, plain: StubRenderer) -> axum::Router {
        let pipeline = stub_pipeline(Arc::new(fetcher), Arc::new(stealth), Arc::new(plain));
        create_router(AppState::new(Arc::new(pipeline)))
    }

    fn article_app() -> axum::Router {
        app_with(
            StubFetcher::ok(ARTICLE_HTML),
            StubRenderer::failing(Tier::Stealth, "unused"),
            StubRenderer::failing(Tier::Plain, "unused"),
        )
    }

    fn post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_scrape_success() {
        let response = article_app()
            .oneshot(post("/api/scrape", r#"{"url": "example.com/post"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["extractionMethod"], "readability");
        assert_eq!(json["data"]["url"], "https://example.com/post");
        assert!(!json["data"]["title"].as_str().unwrap().is_empty());
        assert!(json["data"]["description"].is_string());
        assert!(json["data"]["content"].is_string());
    }

    #[tokio::test]
    async fn test_short_route_alias() {
        let response = article_app()
            .oneshot(post("/scrape", r#"{"url": "https://example.com"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_url_is_400() {
        for body in [r#"{}"#, r#"{"url": ""}"#, r#"{"url": null}"#] {
            let response = article_app().oneshot(post("/api/scrape", body)).await.unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let json = json_body(response).await;
            assert_eq!(json["error"], "URL is required");
            assert!(json.get("type").is_none());
        }
    }

    #[tokio::test]
    async fn test_blocked_is_400_with_suggestion() {
        let app = app_with(
            StubFetcher::new(FetchBehavior::Timeout),
            StubRenderer::failing(Tier::Stealth, "Failed to launch browser"),
            StubRenderer::failing(Tier::Plain, "navigation exceeded 60s"),
        );

        let response = app
            .oneshot(post("/api/scrape", r#"{"url": "https://example.com"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(
            json["error"],
            "This website has strong protection that could not be bypassed."
        );
        assert_eq!(
            json["suggestion"],
            "Try accessing the website directly in your browser first, then try again later."
        );
        assert_eq!(json["type"], "SCRAPING_BLOCKED");
    }

    #[tokio::test]
    async fn test_no_content_is_500() {
        let app = app_with(
            StubFetcher::new(FetchBehavior::Fail("dns")),
            StubRenderer::succeeding(Tier::Stealth, "   "),
            StubRenderer::failing(Tier::Plain, "unused"),
        );

        let response = app
            .oneshot(post("/api/scrape", r#"{"url": "https://example.com"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert_eq!(json["error"], "Failed to retrieve page content.");
    }

    #[tokio::test]
    async fn test_malformed_body_is_500() {
        let response = article_app()
            .oneshot(post("/api/scrape", "not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert_eq!(
            json["error"],
            "Failed to scrape the webpage. Please check the URL and try again."
        );
    }

    #[tokio::test]
    async fn test_get_is_not_allowed() {
        let response = article_app()
            .oneshot(
                Request::builder()
                    .uri("/api/scrape")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}

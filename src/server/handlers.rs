use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use super::AppState;
use crate::domain::{ExtractionMethod, ScrapeRequest, ScrapedData};
use crate::scraper::pipeline::{BLOCKED_SUGGESTION, BLOCKED_TYPE};
use crate::scraper::PipelineError;

const SCRAPE_FAILED: &str = "Failed to scrape the webpage. Please check the URL and try again.";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResponse {
    pub success: bool,
    pub data: ScrapedData,
    pub extraction_method: ExtractionMethod,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<&'static str>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
}

impl ErrorResponse {
    fn plain(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            suggestion: None,
            kind: None,
        }
    }
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            PipelineError::MissingUrl => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::plain(self.to_string()),
            ),
            PipelineError::Blocked { .. } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: self.to_string(),
                    suggestion: Some(BLOCKED_SUGGESTION),
                    kind: Some(BLOCKED_TYPE),
                },
            ),
            PipelineError::NoContent => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::plain(self.to_string()),
            ),
        };
        (status, Json(body)).into_response()
    }
}

/// POST /api/scrape
pub async fn scrape(
    State(state): State<AppState>,
    payload: Result<Json<ScrapeRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(e) => {
            tracing::error!("Rejected scrape request body: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::plain(SCRAPE_FAILED)),
            )
                .into_response();
        }
    };

    match state.pipeline.run(&request).await {
        Ok(outcome) => Json(ScrapeResponse {
            success: true,
            data: outcome.data,
            extraction_method: outcome.method,
        })
        .into_response(),
        Err(e) => {
            if let PipelineError::Blocked { ref reason } = e {
                tracing::warn!("Scrape blocked: {}", reason);
            }
            e.into_response()
        }
    }
}

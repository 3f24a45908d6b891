//! HTTP request boundary.
//!
//! `GET /export?url=<toc-url>` runs one export job; `GET /health` answers `ok`.
//! A job that finds the job gate full is rejected at once with 429.

use std::future::Future;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::orchestrator::{BookExporter, ExportOutcome};

#[derive(Clone)]
pub struct ApiState {
    exporter: Arc<BookExporter>,
    retry_after_secs: u64,
}

impl ApiState {
    pub fn new(exporter: Arc<BookExporter>, retry_after_secs: u64) -> Self {
        Self {
            exporter,
            retry_after_secs,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExportParams {
    pub url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookSummary {
    pub title: String,
    pub slug: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExportResponse {
    pub book: BookSummary,
    pub parts: usize,
    pub subsections: usize,
    pub xml: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BusyResponse {
    pub queued: bool,
    pub message: String,
    pub retry_after_seconds: u64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

impl From<ExportOutcome> for ExportResponse {
    fn from(outcome: ExportOutcome) -> Self {
        Self {
            parts: outcome.part_count(),
            subsections: outcome.subsection_count(),
            book: BookSummary {
                title: outcome.book.title,
                slug: outcome.book.slug,
            },
            xml: outcome.xml,
        }
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/export", get(export))
        .route("/health", get(health))
        .with_state(state)
}

/// Serves until `shutdown` resolves, then lets in-flight requests finish
pub async fn serve<F>(listener: TcpListener, state: ApiState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("🌐 listening on http://{}", addr);
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn health() -> &'static str {
    "ok"
}

async fn export(State(state): State<ApiState>, Query(params): Query<ExportParams>) -> Response {
    let Some(url) = params.url.filter(|u| !u.trim().is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "missing url parameter");
    };

    let governor = state.exporter.governor();
    let Some(permit) = governor.try_admit_job() else {
        warn!(
            "rejecting export of {}: {}/{} jobs running",
            url,
            governor.jobs_in_use(),
            governor.job_capacity()
        );
        return busy_response(state.retry_after_secs);
    };

    // The job runs detached so a dropped connection does not cancel it
    let exporter = state.exporter.clone();
    let job = tokio::spawn(async move {
        let _permit = permit;
        exporter.export(&url).await
    });

    match job.await {
        Ok(Ok(outcome)) => (StatusCode::OK, Json(ExportResponse::from(outcome))).into_response(),
        Ok(Err(e)) => {
            error!("❌ export failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "export failed")
        }
        Err(e) => {
            error!("❌ export task aborted: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "export failed")
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    let body = ErrorResponse {
        error: message.to_string(),
    };
    (status, Json(body)).into_response()
}

fn busy_response(retry_after_secs: u64) -> Response {
    let body = BusyResponse {
        queued: false,
        message: "server is busy with other exports, retry later".to_string(),
        retry_after_seconds: retry_after_secs,
    };
    (
        StatusCode::TOO_MANY_REQUESTS,
        [(header::RETRY_AFTER, retry_after_secs.to_string())],
        Json(body),
    )
        .into_response()
}

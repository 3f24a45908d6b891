mod common;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use tokio::sync::watch;

use common::{exporter, spawn_fixture_site, toc_url, two_part_toc, FixtureDiscoverer};
use textbook_export::api::{self, ApiState, BusyResponse, ErrorResponse, ExportResponse};
use textbook_export::browser::TocDiscoverer;
use textbook_export::ConcurrencyGovernor;

async fn spawn_api(discoverer: Arc<dyn TocDiscoverer>, governor: Arc<ConcurrencyGovernor>) -> SocketAddr {
    let exporter = Arc::new(exporter(discoverer, Duration::from_secs(10), governor));
    let state = ApiState::new(exporter, 30);
    common::spawn_router(api::router(state)).await
}

fn export_url(api: SocketAddr, toc: &str) -> String {
    format!("http://{}/export?url={}", api, toc)
}

#[tokio::test]
async fn health_answers_ok() {
    let governor = Arc::new(ConcurrencyGovernor::new(2, 5));
    let api = spawn_api(Arc::new(FixtureDiscoverer::new(String::new())), governor).await;
    let body = reqwest::get(format!("http://{}/health", api))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn missing_url_is_a_client_error() {
    let governor = Arc::new(ConcurrencyGovernor::new(2, 5));
    let api = spawn_api(Arc::new(FixtureDiscoverer::new(String::new())), governor.clone()).await;

    for url in [format!("http://{}/export", api), format!("http://{}/export?url=", api)] {
        let response = reqwest::get(url).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response.json().await.unwrap();
        assert_eq!(body.error, "missing url parameter");
    }
    assert_eq!(governor.jobs_in_use(), 0);
}

#[tokio::test]
async fn successful_export_embeds_the_document() {
    let site = spawn_fixture_site().await;
    let toc = two_part_toc(["1-1-scope", "1-2-units", "2-1-vectors"]);
    let governor = Arc::new(ConcurrencyGovernor::new(2, 5));
    let api = spawn_api(Arc::new(FixtureDiscoverer::new(toc)), governor).await;

    let response = reqwest::get(export_url(api, &toc_url(site))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: ExportResponse = response.json().await.unwrap();
    assert_eq!(body.book.slug, "physics");
    assert_eq!(body.book.title, "University Physics Volume 1");
    assert_eq!(body.parts, 2);
    assert_eq!(body.subsections, 3);
    assert!(body.xml.contains("<rss version=\"2.0\""));
    assert_eq!(body.xml.matches("<item>").count(), 5);
}

#[tokio::test]
async fn job_failure_is_a_generic_server_error() {
    let governor = Arc::new(ConcurrencyGovernor::new(2, 5));
    let api = spawn_api(Arc::new(FixtureDiscoverer::failing()), governor.clone()).await;

    let response = reqwest::get(export_url(api, "https://openstax.org/books/physics/pages/1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorResponse = response.json().await.unwrap();
    assert_eq!(body.error, "export failed");
    assert_eq!(governor.jobs_in_use(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn third_concurrent_job_is_rejected_not_queued() {
    let site = spawn_fixture_site().await;
    let toc = two_part_toc(["1-1-scope", "1-2-units", "2-1-vectors"]);
    let (release, hold) = watch::channel(false);
    let governor = Arc::new(ConcurrencyGovernor::new(2, 5));
    let api = spawn_api(Arc::new(FixtureDiscoverer::held(toc, hold)), governor.clone()).await;
    let url = export_url(api, &toc_url(site));

    let first = tokio::spawn(reqwest::get(url.clone()));
    let second = tokio::spawn(reqwest::get(url.clone()));

    // Wait until both jobs hold the gate
    tokio::time::timeout(Duration::from_secs(5), async {
        while governor.jobs_in_use() < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    let started = std::time::Instant::now();
    let third = reqwest::get(url.clone()).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(third.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        third.headers().get("retry-after").and_then(|v| v.to_str().ok()),
        Some("30")
    );
    let body: BusyResponse = third.json().await.unwrap();
    assert!(!body.queued);
    assert_eq!(body.retry_after_seconds, 30);

    release.send(true).unwrap();
    for job in [first, second] {
        let response = job.await.unwrap().unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(governor.jobs_in_use(), 0);
}

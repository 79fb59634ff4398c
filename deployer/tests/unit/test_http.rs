//! HTTP client against an in-process build service

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use build_api::models::{DeployPayload, HealthStatus};
use futures::TryStreamExt;
use minici::errors::DeployError;
use minici::http::client::HttpClient;
use minici::session::fsm::SessionStatus;
use minici::session::notify::NullNotifier;
use minici::session::runner::{SessionRunner, StreamOptions};
use minici::session::service::BuildService;
use minici::stream::classifier::{Classifier, ClassifierSettings};
use tokio::net::TcpListener;

use crate::support::request;

async fn build(Json(payload): Json<DeployPayload>) -> Response {
    if payload.repo_url.contains("broken") {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }
    if payload.repo_url.contains("empty") {
        return StatusCode::NO_CONTENT.into_response();
    }

    let frames = vec![
        format!("data: Cloning {}\n\n", payload.repo_url),
        "data: Running `npm start` (container: c0ffee42)\n\nda".to_string(),
        "ta: > Ready on http://localhost:3000\n\n".to_string(),
    ];
    let body = futures::stream::iter(frames.into_iter().map(Ok::<_, Infallible>));
    Response::builder()
        .header("content-type", "text/event-stream")
        .body(Body::from_stream(body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

async fn ping(Path(id): Path<String>) -> StatusCode {
    if id == "c0ffee42" {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn serve() -> String {
    let app = Router::new()
        .route("/build-stream", post(build))
        .route("/health", get(|| async { "ok" }))
        .route("/ping/{id}", get(ping));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_build_stream_end_to_end() {
    let base_url = serve().await;
    let client = Arc::new(HttpClient::new(&base_url).unwrap());
    let classifier = Arc::new(Classifier::new(&ClassifierSettings::default()).unwrap());
    let runner = SessionRunner::new(
        client,
        classifier,
        Arc::new(NullNotifier),
        StreamOptions::default(),
    );

    runner.submit(request()).await.unwrap();
    let session = runner.wait().await;

    assert_eq!(session.status(), SessionStatus::Succeeded);
    assert_eq!(
        session.events(),
        [
            "Cloning https://github.com/acme/shop.git",
            "Running `npm start` (container: c0ffee42)",
            "> Ready on http://localhost:3000",
        ]
    );
    assert_eq!(session.live_url(), Some("http://localhost:3000"));
    assert_eq!(session.container_id(), Some("c0ffee42"));
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let base_url = serve().await;
    let client = HttpClient::new(&base_url).unwrap();

    let mut payload = request().to_payload();
    payload.repo_url = "https://github.com/acme/broken.git".to_string();
    let err = client.start_build(&payload).await.err().unwrap();
    assert!(matches!(err, DeployError::TransportError(_)));
    assert_eq!(err.to_string(), "Server responded with 500");

    payload.repo_url = "https://github.com/acme/empty.git".to_string();
    let err = client.start_build(&payload).await.err().unwrap();
    assert_eq!(err.to_string(), "No response body received");
}

#[tokio::test]
async fn test_raw_body_chunks() {
    let base_url = serve().await;
    let client = HttpClient::new(&base_url).unwrap();

    let body = client.start_build(&request().to_payload()).await.unwrap();
    let chunks: Vec<_> = body.try_collect().await.unwrap();
    let text: Vec<u8> = chunks.concat();
    assert!(String::from_utf8(text).unwrap().ends_with("http://localhost:3000\n\n"));
}

#[tokio::test]
async fn test_health_and_ping() {
    let base_url = serve().await;
    let client = HttpClient::new(&base_url).unwrap();

    let report = client.health().await.unwrap();
    assert_eq!(report.status, HealthStatus::Healthy);
    assert_eq!(report.detail, "ok");

    assert!(client.ping("c0ffee42").await.is_ok());
    let err = client.ping("missing").await.unwrap_err();
    assert_eq!(err.to_string(), "Server responded with 404");
}

#[tokio::test]
async fn test_unreachable_service() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpClient::new(&format!("http://{}", addr)).unwrap();
    let err = client.health().await.unwrap_err();
    assert!(err.is_transport());
}

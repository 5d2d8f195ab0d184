//! HTTP removal client against a local fake service

mod support;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use nobg::{BackgroundRemover, HttpRemover, RemoteError, Upload};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// One multipart field as the service received it
#[derive(Debug, Clone)]
struct ReceivedPart {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

#[derive(Clone)]
struct FakeService {
    status: StatusCode,
    body: Vec<u8>,
    received: Arc<Mutex<Vec<ReceivedPart>>>,
}

async fn remove(State(service): State<FakeService>, mut multipart: Multipart) -> (StatusCode, Vec<u8>) {
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or("").to_string();
        let file_name = field.file_name().map(|s| s.to_string());
        let content_type = field.content_type().map(|s| s.to_string());
        let bytes = field.bytes().await.unwrap().to_vec();
        service.received.lock().unwrap().push(ReceivedPart {
            name,
            file_name,
            content_type,
            bytes,
        });
    }
    (service.status, service.body.clone())
}

/// Starts a service answering every upload with `status` and `body`
async fn serve(status: StatusCode, body: Vec<u8>) -> (String, Arc<Mutex<Vec<ReceivedPart>>>) {
    let received = Arc::new(Mutex::new(Vec::new()));
    let service = FakeService {
        status,
        body,
        received: received.clone(),
    };
    let router = Router::new()
        .route("/api/remove", post(remove))
        .with_state(service);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("http://{}/api/remove", addr), received)
}

fn upload() -> Upload {
    Upload {
        file_name: "cat.png".into(),
        mime: "image/png".into(),
        bytes: Arc::from(support::png(2, 2)),
    }
}

fn client(endpoint: &str) -> HttpRemover {
    HttpRemover::new(endpoint, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_success_returns_body_and_sends_multipart_file() {
    let result_png = support::png(3, 2);
    let (endpoint, received) = serve(StatusCode::OK, result_png.clone()).await;

    let bytes = client(&endpoint).remove_background(upload()).await.unwrap();
    assert_eq!(bytes, result_png);

    let parts = received.lock().unwrap().clone();
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].name, "file");
    assert_eq!(parts[0].file_name.as_deref(), Some("cat.png"));
    assert_eq!(parts[0].content_type.as_deref(), Some("image/png"));
    assert_eq!(parts[0].bytes, support::png(2, 2));
}

#[tokio::test]
async fn test_error_status_is_failure() {
    let (endpoint, received) =
        serve(StatusCode::INTERNAL_SERVER_ERROR, b"rembg crashed".to_vec()).await;

    let result = client(&endpoint).remove_background(upload()).await;

    assert!(matches!(result, Err(RemoteError::Status { status: 500 })));
    assert_eq!(received.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unsupported_type_status_is_failure() {
    let (endpoint, _) = serve(StatusCode::UNSUPPORTED_MEDIA_TYPE, Vec::new()).await;

    let result = client(&endpoint).remove_background(upload()).await;

    assert!(matches!(result, Err(RemoteError::Status { status: 415 })));
}

#[tokio::test]
async fn test_empty_success_body_is_failure() {
    let (endpoint, _) = serve(StatusCode::OK, Vec::new()).await;

    let result = client(&endpoint).remove_background(upload()).await;

    assert!(matches!(result, Err(RemoteError::EmptyBody)));
}

#[tokio::test]
async fn test_unknown_route_is_failure() {
    let (endpoint, _) = serve(StatusCode::OK, support::png(1, 1)).await;
    let endpoint = endpoint.replace("/api/remove", "/api/missing");

    let result = client(&endpoint).remove_background(upload()).await;

    assert!(matches!(result, Err(RemoteError::Status { status: 404 })));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_transport_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = client(&format!("http://{}/api/remove", addr))
        .remove_background(upload())
        .await;

    assert!(matches!(result, Err(RemoteError::Transport(_))));
}

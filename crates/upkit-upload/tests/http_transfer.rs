//! Integration tests for the HTTP multipart adapter against an in-process
//! axum server.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::Multipart;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use futures::{stream, StreamExt};
use serde_json::{json, Value};

use upkit_core::types::RawFile;
use upkit_upload::{
    HttpTransfer, ProgressSink, ProgressTracker, TransferAdapter, TransferError, TransferRequest,
    UploadOptions,
};

// =============================================================================
// Helpers
// =============================================================================

/// Echo every multipart field and a few request headers back as JSON.
async fn echo(headers: HeaderMap, mut multipart: Multipart) -> Json<Value> {
    let mut fields = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.unwrap();
        fields.push(json!({
            "name": name,
            "file_name": file_name,
            "content_type": content_type,
            "len": bytes.len(),
            "text": String::from_utf8_lossy(&bytes),
        }));
    }
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    Json(json!({
        "fields": fields,
        "x_trace": header("x-trace"),
        "cookie": header("cookie"),
    }))
}

async fn fail() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "disk full")
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(5)).await;
    "late"
}

/// Send the status line and part of the body, then stall.
async fn stalled_body() -> Body {
    let head = stream::once(async { Ok::<_, std::io::Error>("partial") });
    let tail = stream::once(async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok::<_, std::io::Error>("rest")
    });
    Body::from_stream(head.chain(tail))
}

async fn spawn_server() -> SocketAddr {
    let app = Router::new()
        .route("/upload", post(echo))
        .route("/fail", post(fail))
        .route("/slow", post(slow))
        .route("/stalled", post(stalled_body));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[derive(Default)]
struct Collect(Mutex<Vec<u8>>);

impl ProgressSink for Collect {
    fn report(&self, percent: u8) {
        self.0.lock().unwrap().push(percent);
    }
}

fn tracker_for(file: &RawFile) -> (ProgressTracker, Arc<Collect>) {
    let sink = Arc::new(Collect::default());
    (ProgressTracker::new(file.size_bytes, sink.clone()), sink)
}

fn request(file: RawFile, options: &UploadOptions) -> TransferRequest {
    TransferRequest::from_options(file, options)
}

// =============================================================================
// Wire format
// =============================================================================

#[tokio::test]
async fn uploads_file_part_then_extra_fields() {
    let addr = spawn_server().await;
    let options = UploadOptions::new(format!("http://{}/upload", addr))
        .field_name("document")
        .data("album", "holiday")
        .data("owner", "42")
        .header("X-Trace", "abc123")
        .header("Content-Type", "text/plain");
    let file = RawFile::from_bytes("notes.txt", b"hello upload".to_vec()).with_mime_type("text/plain");
    let (tracker, sink) = tracker_for(&file);

    let response = HttpTransfer::new()
        .unwrap()
        .transfer(request(file, &options), tracker)
        .await
        .unwrap();
    assert_eq!(response.status, 200);

    let body = response.json().unwrap();
    let fields = body["fields"].as_array().unwrap();
    assert_eq!(fields.len(), 3);
    assert_eq!(fields[0]["name"], "document");
    assert_eq!(fields[0]["file_name"], "notes.txt");
    assert_eq!(fields[0]["content_type"], "text/plain");
    assert_eq!(fields[0]["text"], "hello upload");
    assert_eq!(fields[1]["name"], "album");
    assert_eq!(fields[1]["text"], "holiday");
    assert_eq!(fields[2]["name"], "owner");
    assert_eq!(fields[2]["text"], "42");
    assert_eq!(body["x_trace"], "abc123");

    assert_eq!(*sink.0.lock().unwrap(), vec![0, 99]);
}

#[tokio::test]
async fn streams_large_file_with_progress() {
    let addr = spawn_server().await;
    let options = UploadOptions::new(format!("http://{}/upload", addr));
    let file = RawFile::from_bytes("big.bin", vec![9u8; 300 * 1024]);
    let (tracker, sink) = tracker_for(&file);

    let response = HttpTransfer::new()
        .unwrap()
        .transfer(request(file, &options), tracker.clone())
        .await
        .unwrap();

    let body = response.json().unwrap();
    assert_eq!(body["fields"][0]["name"], "file");
    assert_eq!(body["fields"][0]["len"], 300 * 1024);

    let reported = sink.0.lock().unwrap().clone();
    assert_eq!(reported.first(), Some(&0));
    assert_eq!(reported.last(), Some(&99));
    assert!(reported.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(tracker.last(), Some(99));
}

#[tokio::test]
async fn uploads_file_from_disk() {
    let addr = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.csv");
    std::fs::write(&path, b"a,b\n1,2\n").unwrap();

    let file = RawFile::from_path(&path).await.unwrap();
    let options = UploadOptions::new(format!("http://{}/upload", addr));
    let (tracker, _sink) = tracker_for(&file);
    let response = HttpTransfer::new()
        .unwrap()
        .transfer(request(file, &options), tracker)
        .await
        .unwrap();

    let body = response.json().unwrap();
    assert_eq!(body["fields"][0]["file_name"], "report.csv");
    assert_eq!(body["fields"][0]["text"], "a,b\n1,2\n");
}

#[tokio::test]
async fn zero_byte_file_is_sent() {
    let addr = spawn_server().await;
    let options = UploadOptions::new(format!("http://{}/upload", addr));
    let file = RawFile::from_bytes("empty.txt", Vec::new());
    let (tracker, sink) = tracker_for(&file);

    let response = HttpTransfer::new()
        .unwrap()
        .transfer(request(file, &options), tracker)
        .await
        .unwrap();

    let body = response.json().unwrap();
    assert_eq!(body["fields"][0]["len"], 0);
    assert_eq!(*sink.0.lock().unwrap(), vec![0]);
}

// =============================================================================
// Credentials
// =============================================================================

#[tokio::test]
async fn cookies_are_sent_only_with_credentials() {
    let addr = spawn_server().await;
    let url: reqwest::Url = format!("http://{}/upload", addr).parse().unwrap();
    let transfer = HttpTransfer::new().unwrap();
    transfer.cookie_jar().add_cookie_str("session=s3cr3t", &url);

    let anonymous = UploadOptions::new(url.as_str());
    let file = RawFile::from_bytes("a.txt", b"x".to_vec());
    let (tracker, _) = tracker_for(&file);
    let body = transfer
        .transfer(request(file.clone(), &anonymous), tracker)
        .await
        .unwrap()
        .json()
        .unwrap();
    assert!(body["cookie"].is_null());

    let credentialed = anonymous.with_credentials(true);
    let (tracker, _) = tracker_for(&file);
    let body = transfer
        .transfer(request(file, &credentialed), tracker)
        .await
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(body["cookie"], "session=s3cr3t");
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn non_success_status_is_an_error() {
    let addr = spawn_server().await;
    let options = UploadOptions::new(format!("http://{}/fail", addr));
    let file = RawFile::from_bytes("a.txt", b"x".to_vec());
    let (tracker, _) = tracker_for(&file);

    let err = HttpTransfer::new()
        .unwrap()
        .transfer(request(file, &options), tracker)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        TransferError::Status {
            status: 500,
            body: "disk full".into()
        }
    );
}

#[tokio::test]
async fn refused_connection_is_a_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let options = UploadOptions::new(format!("http://{}/upload", addr));
    let file = RawFile::from_bytes("a.txt", b"x".to_vec());
    let (tracker, _) = tracker_for(&file);
    let err = HttpTransfer::new()
        .unwrap()
        .transfer(request(file, &options), tracker)
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::Network(_)), "got {:?}", err);
}

#[tokio::test]
async fn slow_server_times_out() {
    let addr = spawn_server().await;
    let options =
        UploadOptions::new(format!("http://{}/slow", addr)).timeout(Duration::from_millis(200));
    let file = RawFile::from_bytes("a.txt", b"x".to_vec());
    let (tracker, _) = tracker_for(&file);

    let err = HttpTransfer::new()
        .unwrap()
        .transfer(request(file, &options), tracker)
        .await
        .unwrap_err();
    assert_eq!(err, TransferError::Timeout);
}

#[tokio::test]
async fn stalled_response_body_times_out() {
    let addr = spawn_server().await;
    let options =
        UploadOptions::new(format!("http://{}/stalled", addr)).timeout(Duration::from_millis(300));
    let file = RawFile::from_bytes("a.txt", b"x".to_vec());
    let (tracker, _) = tracker_for(&file);

    let err = HttpTransfer::new()
        .unwrap()
        .transfer(request(file, &options), tracker)
        .await
        .unwrap_err();
    assert_eq!(err, TransferError::Timeout);
}

#[tokio::test]
async fn malformed_endpoint_is_an_invalid_request() {
    let options = UploadOptions::default();
    let mut request = request(RawFile::from_bytes("a.txt", b"x".to_vec()), &options);
    request.endpoint = "not a url".into();
    let (tracker, _) = tracker_for(&request.file);

    let err = HttpTransfer::new()
        .unwrap()
        .transfer(request, tracker)
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::InvalidRequest(_)), "got {:?}", err);
}

#[tokio::test]
async fn invalid_mime_type_is_an_invalid_request() {
    let options = UploadOptions::new("http://127.0.0.1:9/upload");
    let file = RawFile::from_bytes("a.txt", b"x".to_vec()).with_mime_type("not a mime");
    let (tracker, _) = tracker_for(&file);

    let err = HttpTransfer::new()
        .unwrap()
        .transfer(request(file, &options), tracker)
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::InvalidRequest(_)));
}

#[tokio::test]
async fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gone.txt");
    std::fs::write(&path, b"x").unwrap();
    let file = RawFile::from_path(&path).await.unwrap();
    std::fs::remove_file(&path).unwrap();

    let options = UploadOptions::new("http://127.0.0.1:9/upload");
    let (tracker, sink) = tracker_for(&file);
    let err = HttpTransfer::new()
        .unwrap()
        .transfer(request(file, &options), tracker)
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::Io(_)));
    assert!(sink.0.lock().unwrap().is_empty());
}

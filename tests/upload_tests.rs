//! Upload destinations against a local HTTP server

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::{RawQuery, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{post, put};
use axum::Router;
use clipship::adapters::upload_video_host::{StaticToken, VideoHostSettings, CHUNK_GRANULARITY};
use clipship::adapters::{FormUploader, VideoHostUploader};
use clipship::ports::{NoProgress, SharedSink, UploadPort};
use clipship::{DomainError, UploadProgress};
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Serve `router` on an ephemeral port and return its base URL
async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", address)
}

fn clip_file(dir: &TempDir, size: usize) -> PathBuf {
    let path = dir.path().join("clip.mp4");
    let content: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
    std::fs::write(&path, content).unwrap();
    path
}

#[derive(Default)]
struct Received {
    requests: Mutex<Vec<(HeaderMap, Bytes)>>,
}

async fn accept_form(State(received): State<Arc<Received>>, headers: HeaderMap, body: Bytes) -> StatusCode {
    received.requests.lock().unwrap().push((headers, body));
    StatusCode::OK
}

#[tokio::test]
async fn test_form_upload_streams_file_as_multipart() {
    let received = Arc::new(Received::default());
    let base = spawn(
        Router::new()
            .route("/upload", post(accept_form))
            .with_state(received.clone()),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let path = clip_file(&dir, 200 * 1024);
    let uploader = FormUploader::new(format!("{}/upload", base), "uploadedFile").unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel::<UploadProgress>();
    let sink: SharedSink<UploadProgress> = Arc::new(tx);
    let id = uploader
        .upload(&path, "goal.mp4", sink, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(id, "");

    let requests = received.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let (headers, body) = &requests[0];
    let content_type = headers[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("multipart/form-data"), "{content_type}");

    let text = String::from_utf8_lossy(body);
    assert!(text.contains("name=\"uploadedFile\""));
    assert!(text.contains("filename=\"goal.mp4\""));
    assert!(text.contains("application/octet-stream"));
    assert!(body.len() > 200 * 1024);

    let mut percents = Vec::new();
    while let Ok(progress) = rx.try_recv() {
        percents.push(progress.percent_complete);
    }
    assert!(percents.len() >= 3, "{percents:?}");
    assert!(percents.windows(2).all(|pair| pair[0] <= pair[1]), "{percents:?}");
    assert_eq!(percents.last(), Some(&100));
}

#[tokio::test]
async fn test_form_upload_reports_server_error() {
    let base = spawn(Router::new().route(
        "/upload",
        post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    ))
    .await;

    let dir = TempDir::new().unwrap();
    let path = clip_file(&dir, 1024);
    let uploader = FormUploader::new(format!("{}/upload", base), "uploadedFile").unwrap();

    let err = uploader
        .upload(&path, "goal.mp4", Arc::new(NoProgress), &CancellationToken::new())
        .await
        .unwrap_err();
    match err {
        DomainError::UploadFailed(message) => {
            assert_eq!(message, "Server responded with 500 Internal Server Error")
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(path.exists());
}

#[tokio::test]
async fn test_form_upload_unreachable_server() {
    let dir = TempDir::new().unwrap();
    let path = clip_file(&dir, 1024);
    // Port 9 is discard; nothing listens on it locally
    let uploader = FormUploader::new("http://127.0.0.1:9/upload", "uploadedFile").unwrap();
    let err = uploader
        .upload(&path, "goal.mp4", Arc::new(NoProgress), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::UploadFailed(_)), "{err}");
}

/// Session state of the fake video host
#[derive(Default)]
struct VideoHost {
    session_query: Mutex<Option<String>>,
    session_headers: Mutex<Option<HeaderMap>>,
    metadata: Mutex<Option<serde_json::Value>>,
    chunks: Mutex<Vec<(String, usize)>>,
}

async fn open_session(
    State(host): State<Arc<VideoHost>>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    *host.session_query.lock().unwrap() = query;
    *host.session_headers.lock().unwrap() = Some(headers);
    *host.metadata.lock().unwrap() = serde_json::from_slice(&body).ok();
    (StatusCode::OK, [(header::LOCATION, "/session/abc")]).into_response()
}

/// Acknowledges the first chunk, completes on the second
async fn receive_chunk(State(host): State<Arc<VideoHost>>, headers: HeaderMap, body: Bytes) -> Response {
    let range = headers[header::CONTENT_RANGE].to_str().unwrap().to_string();
    let mut chunks = host.chunks.lock().unwrap();
    chunks.push((range, body.len()));
    if chunks.len() == 1 {
        let acknowledged = format!("bytes=0-{}", body.len() - 1);
        (StatusCode::PERMANENT_REDIRECT, [(header::RANGE, acknowledged)]).into_response()
    } else {
        (StatusCode::CREATED, axum::Json(serde_json::json!({"id": "vid42"}))).into_response()
    }
}

fn video_host_settings(base: &str) -> VideoHostSettings {
    VideoHostSettings {
        upload_url: format!("{}/upload/videos", base),
        chunk_size: CHUNK_GRANULARITY,
        category_id: "22".to_string(),
        privacy_status: "unlisted".to_string(),
    }
}

#[tokio::test]
async fn test_video_host_resumable_upload() {
    let host = Arc::new(VideoHost::default());
    let base = spawn(
        Router::new()
            .route("/upload/videos", post(open_session))
            .route("/session/abc", put(receive_chunk))
            .with_state(host.clone()),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let size = CHUNK_GRANULARITY + 44 * 1024;
    let path = clip_file(&dir, size);
    let uploader =
        VideoHostUploader::new(video_host_settings(&base), Arc::new(StaticToken::new("tok"))).unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel::<UploadProgress>();
    let sink: SharedSink<UploadProgress> = Arc::new(tx);
    let id = uploader
        .upload(&path, "goal.mp4", sink, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(id, "vid42");

    let query = host.session_query.lock().unwrap().clone().unwrap();
    assert!(query.contains("uploadType=resumable"), "{query}");

    let headers = host.session_headers.lock().unwrap().clone().unwrap();
    assert_eq!(headers[header::AUTHORIZATION], "Bearer tok");
    assert_eq!(headers["x-upload-content-length"], size.to_string().as_str());
    assert_eq!(headers["x-upload-content-type"], "video/*");

    let metadata = host.metadata.lock().unwrap().clone().unwrap();
    assert_eq!(metadata["snippet"]["title"], "goal.mp4");
    assert_eq!(metadata["snippet"]["categoryId"], "22");
    assert_eq!(metadata["status"]["privacyStatus"], "unlisted");

    let chunks = host.chunks.lock().unwrap().clone();
    assert_eq!(
        chunks,
        vec![
            (format!("bytes 0-{}/{}", CHUNK_GRANULARITY - 1, size), CHUNK_GRANULARITY),
            (format!("bytes {}-{}/{}", CHUNK_GRANULARITY, size - 1, size), 44 * 1024),
        ]
    );

    let mut last = None;
    while let Ok(progress) = rx.try_recv() {
        last = Some(progress.percent_complete);
    }
    assert_eq!(last, Some(100));
}

#[tokio::test]
async fn test_video_host_session_refused() {
    let base = spawn(Router::new().route(
        "/upload/videos",
        post(|| async { (StatusCode::UNAUTHORIZED, "invalid credentials") }),
    ))
    .await;

    let dir = TempDir::new().unwrap();
    let path = clip_file(&dir, 1024);
    let uploader =
        VideoHostUploader::new(video_host_settings(&base), Arc::new(StaticToken::new("bad"))).unwrap();

    let err = uploader
        .upload(&path, "goal.mp4", Arc::new(NoProgress), &CancellationToken::new())
        .await
        .unwrap_err();
    match err {
        DomainError::UploadFailed(message) => assert!(message.contains("invalid credentials"), "{message}"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_video_host_cancel_before_start() {
    let dir = TempDir::new().unwrap();
    let path = clip_file(&dir, 1024);
    let uploader = VideoHostUploader::new(
        video_host_settings("http://127.0.0.1:9"),
        Arc::new(StaticToken::new("tok")),
    )
    .unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = uploader
        .upload(&path, "goal.mp4", Arc::new(NoProgress), &cancel)
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn test_form_upload_cancelled_in_flight() {
    let base = spawn(Router::new().route(
        "/upload",
        post(|| async {
            tokio::time::sleep(std::time::Duration::from_secs(30)).await;
            StatusCode::OK
        }),
    ))
    .await;

    let dir = TempDir::new().unwrap();
    let path = clip_file(&dir, 1024 * 1024);
    let uploader = FormUploader::new(format!("{}/upload", base), "uploadedFile").unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let err = uploader
        .upload(&path, "goal.mp4", Arc::new(NoProgress), &cancel)
        .await
        .unwrap_err();
    assert!(err.is_cancelled(), "{err}");
    assert!(started.elapsed() < std::time::Duration::from_secs(10));
    // Removing the clip is the caller's job
    assert!(path.exists());
}

#[tokio::test]
async fn test_video_host_without_progress_fails() {
    let base = spawn(
        Router::new()
            .route(
                "/upload/videos",
                post(|| async { (StatusCode::OK, [(header::LOCATION, "/session/stuck")]) }),
            )
            .route("/session/stuck", put(|| async { StatusCode::PERMANENT_REDIRECT })),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let path = clip_file(&dir, CHUNK_GRANULARITY * 2);
    let uploader =
        VideoHostUploader::new(video_host_settings(&base), Arc::new(StaticToken::new("tok"))).unwrap();

    let cancel = CancellationToken::new();
    let upload = uploader.upload(&path, "goal.mp4", Arc::new(NoProgress), &cancel);
    let err = tokio::time::timeout(std::time::Duration::from_secs(10), upload)
        .await
        .expect("upload kept resending the same chunk")
        .unwrap_err();
    match err {
        DomainError::UploadFailed(message) => {
            assert!(message.contains("did not acknowledge any progress"), "{message}")
        }
        other => panic!("unexpected error: {other}"),
    }
}

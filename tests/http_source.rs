//! End-to-end tests of the REST source against a minimal local HTTP responder

use silverwall::provider::{ApiSource, TrackSelector};
use silverwall::providers::HttpSource;
use silverwall::{RaceStatus, TelemetryError};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Serve exactly one response and report the request line
async fn serve_once(
    status: &'static str,
    body: &'static str,
) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let (line_tx, line_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut buf = vec![0u8; 4096];
        let mut read = 0;
        while !buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf[read..]).await.expect("read request");
            if n == 0 {
                break;
            }
            read += n;
        }

        let request = String::from_utf8_lossy(&buf[..read]).to_string();
        let _ = line_tx.send(request.lines().next().unwrap_or_default().to_string());

        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.expect("write response");
        let _ = socket.shutdown().await;
    });

    (format!("http://{addr}"), line_rx)
}

fn source(base: String) -> HttpSource {
    HttpSource::new(base, Duration::from_secs(5)).expect("client")
}

#[tokio::test]
async fn fetches_live_status() {
    let (base, request) = serve_once(
        "200 OK",
        r#"{"status":"live","session_name":"Race","meeting_name":"Abu Dhabi Grand Prix","circuit":"Yas Marina"}"#,
    )
    .await;

    let status = source(base).fetch_status().await.expect("status");
    assert_eq!(
        status,
        RaceStatus::Live {
            session_name: Some("Race".into()),
            meeting_name: Some("Abu Dhabi Grand Prix".into()),
            circuit: Some("Yas Marina".into()),
        }
    );
    assert_eq!(request.await.expect("request line"), "GET /api/status HTTP/1.1");
}

#[tokio::test]
async fn waiting_status_carries_countdown() {
    let (base, _) = serve_once(
        "200 OK",
        r#"{"status":"waiting","next_session":"qualifying","meeting":"Qatar Grand Prix","countdown_seconds":3725}"#,
    )
    .await;

    match source(base).fetch_status().await.expect("status") {
        RaceStatus::Waiting { next_session, countdown, .. } => {
            assert_eq!(next_session, "QUALIFYING");
            assert_eq!(countdown.text, "1H 2M");
        }
        other => panic!("expected waiting, got {other:?}"),
    }
}

#[tokio::test]
async fn server_error_is_http_error() {
    let (base, _) = serve_once("500 Internal Server Error", r#"{"detail":"boom"}"#).await;

    match source(base).fetch_status().await {
        Err(TelemetryError::Http { status, url }) => {
            assert_eq!(status, 500);
            assert!(url.ends_with("/api/status"));
        }
        other => panic!("expected HTTP error, got {other:?}"),
    }
}

#[tokio::test]
async fn fetches_current_track() {
    let (base, request) = serve_once(
        "200 OK",
        r#"{"name":"Yas Marina Circuit","location":"Abu Dhabi","points":[{"x":0.1,"y":0.2},{"x":0.9,"y":0.8}],"source":"openf1"}"#,
    )
    .await;

    let track = source(base).fetch_track(&TrackSelector::Current).await.expect("track");
    assert_eq!(track.name, "Yas Marina Circuit");
    assert_eq!(track.points.len(), 2);
    assert_eq!(request.await.expect("request line"), "GET /api/track/current HTTP/1.1");
}

#[tokio::test]
async fn track_error_body_is_backend_error() {
    let (base, request) =
        serve_once("200 OK", r#"{"error":"Track geometry not found for: atlantis"}"#).await;

    let selector = TrackSelector::Circuit("atlantis".into());
    match source(base).fetch_track(&selector).await {
        Err(TelemetryError::Backend { message }) => assert!(message.contains("atlantis")),
        other => panic!("expected backend error, got {other:?}"),
    }
    assert_eq!(request.await.expect("request line"), "GET /api/track/atlantis HTTP/1.1");
}

// Integration tests for the signed request executor against a mock server.

mod helpers;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use httptest::{cycle, matchers::*, responders::*, Expectation, Server};
use reqwest::Method;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use signed_pager::error_handling::{ErrorType, InfoType};
use signed_pager::RequestError;

use helpers::{test_builder, test_config_for, test_manager};

#[tokio::test]
async fn test_server_errors_are_retried_until_success() {
    let server = Server::run();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/api/ping"),
            request::headers(contains(key("sign"))),
            request::headers(contains(key("time"))),
            request::headers(contains(("user-id", "12345"))),
            request::headers(contains(("cookie", "sess=abc"))),
            request::headers(contains(("app-token", "33d57ade8c02dbc5a333db99ff9ae26a"))),
        ])
        .times(3)
        .respond_with(cycle![
            status_code(500),
            status_code(503),
            json_encoded(json!({"ok": true})),
        ]),
    );

    let manager = test_manager(&server);
    let executor = manager.executor();
    let url = executor.url("/api/ping").unwrap();
    let response = executor.execute(&url, Method::GET, None).await.unwrap();

    assert_eq!(response.status.as_u16(), 200);
    assert_eq!(manager.stats().get_error_count(ErrorType::ServerError), 2);
    assert_eq!(manager.stats().get_info_count(InfoType::RequestSucceeded), 1);
}

#[tokio::test]
async fn test_terminal_client_status_is_returned() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/api/missing"))
            .respond_with(status_code(404).body(r#"{"error":{"code":0,"message":"Not found"}}"#)),
    );

    let manager = test_manager(&server);
    let executor = manager.executor();
    let url = executor.url("/api/missing").unwrap();
    let response = executor.execute(&url, Method::GET, None).await.unwrap();

    assert_eq!(response.status.as_u16(), 404);
    assert_eq!(manager.stats().get_error_count(ErrorType::ClientTerminal), 1);
    let api_error = response.api_error().unwrap();
    assert_eq!(api_error.reason, "Not found");
}

#[tokio::test]
async fn test_unhandled_status_is_fatal() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/api/teapot"))
            .times(1)
            .respond_with(status_code(418)),
    );

    let manager = test_manager(&server);
    let executor = manager.executor();
    let url = executor.url("/api/teapot").unwrap();
    let err = executor.execute(&url, Method::GET, None).await.unwrap_err();

    assert!(matches!(
        err,
        RequestError::UnexpectedStatus { status: 418, .. }
    ));
    assert_eq!(manager.stats().get_error_count(ErrorType::UnclassifiedFatal), 1);
}

#[tokio::test]
async fn test_json_request_surfaces_error_envelope() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/api/me")).respond_with(
            json_encoded(json!({"error": {"code": 101, "message": "Blocked by 2FA."}})),
        ),
    );

    let manager = test_manager(&server);
    let executor = manager.executor();
    let url = executor.url("/api/me").unwrap();
    let err = executor
        .json_request::<Value>(&url, Method::GET, None)
        .await
        .unwrap_err();

    let api_error = err.api_error().unwrap();
    assert_eq!(api_error.code, 101);
    assert_eq!(api_error.reason, "Blocked by 2FA.");
}

#[tokio::test]
async fn test_rate_limit_pauses_until_probe_clears() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/api/feed"))
            .times(2)
            .respond_with(cycle![
                status_code(429),
                json_encoded(json!({"list": [], "hasMore": false})),
            ]),
    );
    server.expect(
        Expectation::matching(request::method_path("GET", "/probe"))
            .times(1..)
            .respond_with(status_code(200)),
    );

    let manager = test_manager(&server);
    let executor = manager.executor();
    let url = executor.url("/api/feed").unwrap();
    let response = executor.execute(&url, Method::GET, None).await.unwrap();

    assert_eq!(response.status.as_u16(), 200);
    assert_eq!(manager.stats().get_error_count(ErrorType::RateLimited), 1);
    assert_eq!(manager.stats().get_info_count(InfoType::RateLimitCleared), 1);
}

#[tokio::test]
async fn test_in_flight_requests_never_exceed_gate_limit() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/api/slow"))
            .times(40)
            .respond_with(delay_and_then(
                Duration::from_millis(20),
                json_encoded(json!({"ok": true})),
            )),
    );

    let manager = test_manager(&server);
    let executor = manager.executor();
    let url = executor.url("/api/slow").unwrap();

    let handles: Vec<_> = (0..40)
        .map(|_| {
            let executor = executor.clone();
            let url = url.clone();
            tokio::spawn(async move { executor.execute(&url, Method::GET, None).await })
        })
        .collect();
    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }

    let gate = manager.gate();
    assert!(gate.peak_in_flight() <= gate.limit());
    assert_eq!(gate.in_flight(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_close_ends_retry_loop() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/api/down"))
            .times(1..)
            .respond_with(status_code(500)),
    );

    let manager = test_manager(&server);
    let executor = manager.executor();
    let url = executor.url("/api/down").unwrap();

    let pending = tokio::spawn(async move { executor.execute(&url, Method::GET, None).await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    manager.close();

    let err = pending.await.unwrap().unwrap_err();
    assert!(matches!(err, RequestError::SessionClosed));
    assert!(manager.stats().get_error_count(ErrorType::ServerError) >= 1);
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let server = Server::run();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("POST", "/api/messages"),
            request::headers(contains(("content-type", "application/json"))),
            request::body(json_decoded(eq(json!({"text": "hello", "price": 0})))),
        ])
        .respond_with(json_encoded(json!({"id": 77}))),
    );

    let manager = test_manager(&server);
    let executor = manager.executor();
    let url = executor.url("/api/messages").unwrap();
    let body = json!({"text": "hello", "price": 0});
    let created: Value = executor
        .json_request(&url, Method::POST, Some(&body))
        .await
        .unwrap();

    assert_eq!(created["id"], 77);
}

#[tokio::test]
async fn test_closed_manager_rejects_new_requests() {
    let server = Server::run();
    let manager = test_manager(&server);
    manager.close();

    let executor = manager.executor();
    let url = executor.url("/api/anything").unwrap();
    let err = executor.execute(&url, Method::GET, None).await.unwrap_err();
    assert!(matches!(
        err,
        RequestError::GateClosed | RequestError::SessionClosed
    ));
}

/// Reads one request head from `stream`.
async fn read_request_head(stream: &mut TcpStream) {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
}

#[tokio::test]
async fn test_dropped_connections_are_retried() {
    const DROPPED: usize = 2;
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&accepted);
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let n = counter.fetch_add(1, Ordering::SeqCst);
            read_request_head(&mut stream).await;
            if n < DROPPED {
                drop(stream);
                continue;
            }
            let body = r#"{"ok":true}"#;
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    let manager = Arc::new(
        test_builder(test_config_for(format!("http://{}/", addr)))
            .build()
            .unwrap(),
    );
    let executor = manager.executor();
    let url = executor.url("/api/flaky").unwrap();
    let response = executor.execute(&url, Method::GET, None).await.unwrap();

    assert_eq!(response.status.as_u16(), 200);
    assert_eq!(response.json::<Value>().unwrap()["ok"], true);
    assert_eq!(accepted.load(Ordering::SeqCst), DROPPED + 1);
    let stats = manager.stats();
    let transient = stats.get_error_count(ErrorType::TransientRequest)
        + stats.get_error_count(ErrorType::TransientBody)
        + stats.get_error_count(ErrorType::TransientConnect);
    assert!(transient >= DROPPED);
    assert_eq!(stats.get_info_count(InfoType::RequestSucceeded), 1);
}

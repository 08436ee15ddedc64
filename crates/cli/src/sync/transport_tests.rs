// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the transport module.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::{self, BoxFuture, FutureExt};
use reqwest::Url;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use super::transport::{HttpTransport, NoEndpoint, Transport, TransportError};
use crate::auth::{AuthError, StaticToken, TokenSource};
use crate::test_helpers::record;

/// Minimal HTTP responder: answers each request with the next scripted
/// status and keeps the raw request text.
struct Responder {
    url: Url,
    requests: Arc<Mutex<Vec<String>>>,
}

impl Responder {
    async fn start(statuses: Vec<u16>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let script = Arc::new(Mutex::new(VecDeque::from(statuses)));

        let seen = Arc::clone(&requests);
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let status = script.lock().unwrap().pop_front().unwrap_or(500);
                serve(stream, status, &seen).await;
            }
        });

        Responder {
            url: Url::parse(&format!("http://{}/locations", addr)).unwrap(),
            requests,
        }
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

async fn serve(mut stream: TcpStream, status: u16, seen: &Mutex<Vec<String>>) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let content_length = head
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .map(|v| v.trim().parse::<usize>().unwrap())
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    // Recorded before responding so the client never observes a reply first.
    seen.lock()
        .unwrap()
        .push(String::from_utf8_lossy(&buf).into_owned());
    let response = format!(
        "HTTP/1.1 {} Scripted\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        status
    );
    stream.write_all(response.as_bytes()).await.unwrap();
    stream.shutdown().await.ok();
}

fn body_of(request: &str) -> serde_json::Value {
    let body = request.split("\r\n\r\n").nth(1).unwrap();
    serde_json::from_str(body).unwrap()
}

fn transport(url: Url, tokens: Option<Arc<dyn TokenSource>>) -> HttpTransport {
    HttpTransport::new(url, Duration::from_secs(5), tokens).unwrap()
}

/// Hands out a stale token until refreshed.
#[derive(Default)]
struct RotatingToken {
    refreshes: AtomicUsize,
}

impl TokenSource for RotatingToken {
    fn token(&self) -> BoxFuture<'_, Result<String, AuthError>> {
        future::ready(Ok("stale".to_string())).boxed()
    }

    fn refresh(&self) -> BoxFuture<'_, Result<String, AuthError>> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        future::ready(Ok("fresh".to_string())).boxed()
    }
}

struct NoToken;

impl TokenSource for NoToken {
    fn token(&self) -> BoxFuture<'_, Result<String, AuthError>> {
        future::ready(Err(AuthError::Missing)).boxed()
    }
}

#[tokio::test]
async fn posts_record_as_json_with_bearer_token() {
    let server = Responder::start(vec![201]).await;
    let http = transport(
        server.url.clone(),
        Some(Arc::new(StaticToken::new("secret"))),
    );
    let r = record(48.85, 2.35, 0);

    http.send(r).await.unwrap();

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].starts_with("POST /locations HTTP/1.1"));
    assert!(requests[0]
        .to_ascii_lowercase()
        .contains("authorization: bearer secret"));
    let body = body_of(&requests[0]);
    assert_eq!(body["latitude"], 48.85);
    assert_eq!(body["longitude"], 2.35);
    assert!(body["captured_at"].is_string());
}

#[tokio::test]
async fn no_token_source_sends_no_authorization() {
    let server = Responder::start(vec![200]).await;
    let http = transport(server.url.clone(), None);

    http.send(record(1.0, 2.0, 0)).await.unwrap();

    let requests = server.requests();
    assert!(!requests[0].to_ascii_lowercase().contains("authorization:"));
}

#[tokio::test]
async fn server_error_is_rejected() {
    let server = Responder::start(vec![500]).await;
    let http = transport(server.url.clone(), None);

    let err = http.send(record(1.0, 2.0, 0)).await.unwrap_err();

    assert!(matches!(err, TransportError::Rejected { status: 500 }));
}

#[tokio::test]
async fn unauthorized_refreshes_token_and_retries_once() {
    let server = Responder::start(vec![401, 200]).await;
    let tokens = Arc::new(RotatingToken::default());
    let http = transport(server.url.clone(), Some(tokens.clone()));

    http.send(record(1.0, 2.0, 0)).await.unwrap();

    assert_eq!(tokens.refreshes.load(Ordering::SeqCst), 1);
    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].to_ascii_lowercase().contains("bearer stale"));
    assert!(requests[1].to_ascii_lowercase().contains("bearer fresh"));
}

#[tokio::test]
async fn repeated_unauthorized_gives_up_after_one_retry() {
    let server = Responder::start(vec![401, 401, 200]).await;
    let tokens = Arc::new(RotatingToken::default());
    let http = transport(server.url.clone(), Some(tokens.clone()));

    let err = http.send(record(1.0, 2.0, 0)).await.unwrap_err();

    assert!(matches!(err, TransportError::Unauthorized(_)));
    assert_eq!(server.requests().len(), 2);
}

#[tokio::test]
async fn missing_token_fails_before_any_request() {
    let server = Responder::start(vec![200]).await;
    let http = transport(server.url.clone(), Some(Arc::new(NoToken)));

    let err = http.send(record(1.0, 2.0, 0)).await.unwrap_err();

    assert!(matches!(err, TransportError::Unauthorized(_)));
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn unreachable_server_is_a_connection_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let url = Url::parse(&format!("http://{}/locations", addr)).unwrap();
    let http = transport(url, None);

    let err = http.send(record(1.0, 2.0, 0)).await.unwrap_err();

    assert!(matches!(err, TransportError::ConnectionFailed(_)), "{:?}", err);
}

#[tokio::test]
async fn no_endpoint_always_fails() {
    let err = NoEndpoint.send(record(1.0, 2.0, 0)).await.unwrap_err();
    assert!(err.to_string().contains("no server.url configured"));
}

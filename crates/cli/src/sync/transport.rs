// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transport abstraction for record delivery.
//!
//! Provides a trait-based transport layer that enables:
//! - Real HTTP delivery for production
//! - Mock transports for unit testing

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use gt_core::LocationRecord;
use reqwest::{StatusCode, Url};

use crate::auth::TokenSource;

/// Error type for transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Could not reach the server.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The request did not complete in time.
    #[error("request timed out")]
    Timeout,

    /// The server answered with a non-success status.
    #[error("server rejected record: HTTP {status}")]
    Rejected { status: u16 },

    /// No usable bearer token.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Delivers a single record to the sync endpoint.
///
/// `Ok(())` means the server acknowledged the record.
pub trait Transport: Send + Sync {
    fn send(&self, record: LocationRecord) -> BoxFuture<'_, TransportResult<()>>;
}

/// Transport used when no endpoint is configured. Every send fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEndpoint;

impl Transport for NoEndpoint {
    fn send(&self, _record: LocationRecord) -> BoxFuture<'_, TransportResult<()>> {
        futures_util::future::ready(Err(TransportError::ConnectionFailed(
            "no server.url configured".to_string(),
        )))
        .boxed()
    }
}

/// HTTP transport: one JSON `POST` per record.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Url,
    tokens: Option<Arc<dyn TokenSource>>,
}

impl HttpTransport {
    /// Creates a transport posting to `endpoint`.
    ///
    /// Every request, including connection setup, is bounded by `timeout`.
    pub fn new(
        endpoint: Url,
        timeout: Duration,
        tokens: Option<Arc<dyn TokenSource>>,
    ) -> TransportResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        Ok(HttpTransport {
            client,
            endpoint,
            tokens,
        })
    }

    async fn post(&self, record: &LocationRecord, token: Option<&str>) -> TransportResult<StatusCode> {
        let mut request = self.client.post(self.endpoint.clone()).json(record);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(map_reqwest_error)?;
        Ok(response.status())
    }

    async fn deliver(&self, record: LocationRecord) -> TransportResult<()> {
        let mut status = match &self.tokens {
            Some(tokens) => {
                let token = tokens
                    .token()
                    .await
                    .map_err(|e| TransportError::Unauthorized(e.to_string()))?;
                self.post(&record, Some(&token)).await?
            }
            None => self.post(&record, None).await?,
        };

        if status == StatusCode::UNAUTHORIZED {
            if let Some(tokens) = &self.tokens {
                tracing::debug!("token rejected, refreshing and retrying once");
                let token = tokens
                    .refresh()
                    .await
                    .map_err(|e| TransportError::Unauthorized(e.to_string()))?;
                status = self.post(&record, Some(&token)).await?;
            }
        }

        if status.is_success() {
            Ok(())
        } else if status == StatusCode::UNAUTHORIZED {
            Err(TransportError::Unauthorized(
                "server rejected bearer token".to_string(),
            ))
        } else {
            Err(TransportError::Rejected {
                status: status.as_u16(),
            })
        }
    }
}

fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::ConnectionFailed(e.to_string())
    }
}

impl Transport for HttpTransport {
    fn send(&self, record: LocationRecord) -> BoxFuture<'_, TransportResult<()>> {
        self.deliver(record).boxed()
    }
}

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Network reachability checks.
//!
//! The sync engine asks the oracle before draining the queue so that an
//! offline device skips the attempt instead of failing every send.

use std::time::Duration;

use futures_util::future::{self, BoxFuture, FutureExt};
use reqwest::Url;

/// Reports whether the sync endpoint can currently be reached.
pub trait ConnectivityOracle: Send + Sync {
    fn is_reachable(&self) -> BoxFuture<'_, bool>;
}

/// Oracle that never reports the endpoint reachable.
///
/// Used when no sync endpoint is configured, so records stay queued.
#[derive(Debug, Clone, Copy, Default)]
pub struct Offline;

impl ConnectivityOracle for Offline {
    fn is_reachable(&self) -> BoxFuture<'_, bool> {
        future::ready(false).boxed()
    }
}

/// Probes reachability by opening a TCP connection to the sync server.
#[derive(Debug)]
pub struct TcpProbe {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        TcpProbe {
            host: host.into(),
            port,
            timeout,
        }
    }

    /// Builds a probe for the host and port of `url`.
    ///
    /// Returns `None` if the URL has no host or no known default port.
    pub fn for_url(url: &Url, timeout: Duration) -> Option<Self> {
        let host = url.host_str()?;
        let port = url.port_or_known_default()?;
        Some(Self::new(host, port, timeout))
    }

    /// Target of the probe as `host:port`.
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl ConnectivityOracle for TcpProbe {
    fn is_reachable(&self) -> BoxFuture<'_, bool> {
        async move {
            let connect = tokio::net::TcpStream::connect((self.host.as_str(), self.port));
            match tokio::time::timeout(self.timeout, connect).await {
                Ok(Ok(_)) => true,
                Ok(Err(e)) => {
                    tracing::debug!("probe {} failed: {}", self.target(), e);
                    false
                }
                Err(_) => {
                    tracing::debug!(
                        "probe {} timed out after {}ms",
                        self.target(),
                        self.timeout.as_millis()
                    );
                    false
                }
            }
        }
        .boxed()
    }
}

#[cfg(test)]
#[path = "connectivity_tests.rs"]
mod tests;

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Bearer token sources for the sync endpoint.
//!
//! Token issuance and renewal belong to the host application; this module
//! only needs "a valid bearer token on request".

use std::path::{Path, PathBuf};

use futures_util::future::{self, BoxFuture, FutureExt};

/// Error type for token lookups.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("no bearer token available\n  hint: set GEOTRAIL_TOKEN or auth.token / auth.token_file in config.toml")]
    Missing,

    #[error("failed to read token file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Supplies bearer tokens for authenticated requests.
pub trait TokenSource: Send + Sync {
    /// Returns the current token.
    fn token(&self) -> BoxFuture<'_, Result<String, AuthError>>;

    /// Called after the server rejected the current token.
    ///
    /// Sources that cannot renew just hand back whatever they have now.
    fn refresh(&self) -> BoxFuture<'_, Result<String, AuthError>> {
        self.token()
    }
}

/// A token fixed at startup (config file or `GEOTRAIL_TOKEN`).
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        StaticToken(token.into())
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticToken(<redacted>)")
    }
}

impl TokenSource for StaticToken {
    fn token(&self) -> BoxFuture<'_, Result<String, AuthError>> {
        future::ready(Ok(self.0.clone())).boxed()
    }
}

/// A token kept in a file and re-read on every request.
///
/// Whatever process owns the login can rotate the file; the next request
/// picks up the new token.
#[derive(Debug, Clone)]
pub struct FileToken {
    path: PathBuf,
}

impl FileToken {
    pub fn new(path: &Path) -> Self {
        FileToken {
            path: path.to_path_buf(),
        }
    }
}

impl TokenSource for FileToken {
    fn token(&self) -> BoxFuture<'_, Result<String, AuthError>> {
        async move {
            let content = match tokio::fs::read_to_string(&self.path).await {
                Ok(content) => content,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(AuthError::Missing)
                }
                Err(e) => {
                    return Err(AuthError::Read {
                        path: self.path.display().to_string(),
                        source: e,
                    })
                }
            };
            let token = content.trim();
            if token.is_empty() {
                Err(AuthError::Missing)
            } else {
                Ok(token.to_string())
            }
        }
        .boxed()
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod capture;
pub mod clear;
pub mod pending;
pub mod run;
pub mod status;
pub mod sync;

use std::future::Future;

use crate::error::{Error, Result};

/// Runs `future` to completion on a fresh tokio runtime.
pub(crate) fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Io(std::io::Error::other(format!("tokio: {}", e))))?;
    Ok(rt.block_on(future))
}

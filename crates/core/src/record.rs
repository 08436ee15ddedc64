// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Location data model.
//!
//! A [`Fix`] is what a location provider hands back; a [`LocationRecord`] is
//! the immutable value that gets queued and eventually sent to the server.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single resolved reading from a location provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy radius in meters, if the provider reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy_m: Option<f64>,
    /// When the provider acquired the fix. Cached fixes keep their original time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Fix {
    /// Creates a fix with no accuracy or timestamp information.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Fix {
            latitude,
            longitude,
            accuracy_m: None,
            timestamp: None,
        }
    }

    /// Returns a copy of this fix stamped with the given acquisition time.
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// An immutable captured location, pending delivery to the sync endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub latitude: f64,
    pub longitude: f64,
    pub captured_at: DateTime<Utc>,
}

impl LocationRecord {
    /// Creates a record after checking that the coordinates are on the globe.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCoordinate`] for non-finite or out-of-range values.
    pub fn new(latitude: f64, longitude: f64, captured_at: DateTime<Utc>) -> Result<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        if !valid {
            return Err(Error::InvalidCoordinate {
                latitude,
                longitude,
            });
        }
        Ok(LocationRecord {
            latitude,
            longitude,
            captured_at,
        })
    }

    /// Builds a record from a provider fix.
    ///
    /// The fix's own timestamp wins; `fallback` is used when the provider did
    /// not report one.
    pub fn from_fix(fix: &Fix, fallback: DateTime<Utc>) -> Result<Self> {
        LocationRecord::new(
            fix.latitude,
            fix.longitude,
            fix.timestamp.unwrap_or(fallback),
        )
    }
}

impl fmt::Display for LocationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.6},{:.6} @ {}",
            self.latitude,
            self.longitude,
            self.captured_at.to_rfc3339()
        )
    }
}

/// Which flow requested a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMode {
    /// User-visible flow; allowed to fall back to a continuous watch.
    Foreground,
    /// OS-invoked task running under an execution budget.
    Background,
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureMode::Foreground => write!(f, "foreground"),
            CaptureMode::Background => write!(f, "background"),
        }
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;

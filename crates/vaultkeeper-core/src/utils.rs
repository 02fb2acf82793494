//! Shared utilities: run tracking and JSON rendering.

use crate::{Error, Result};
use std::time::Instant;

/// Generic JSON serialization with consistent error handling
pub fn to_json_string<T: serde::Serialize + ?Sized>(data: &T, context: &str) -> Result<String> {
    serde_json::to_string_pretty(data)
        .map_err(|e| Error::other(format!("Failed to serialize {} as JSON: {}", context, e)))
}

/// Identifies and times a single batch or sync run
pub struct RunTracker {
    run_id: String,
    start_time: Instant,
}

impl RunTracker {
    /// Start tracking a new run
    pub fn new() -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            start_time: Instant::now(),
        }
    }

    /// Get the run ID
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }
}

impl Default for RunTracker {
    fn default() -> Self {
        Self::new()
    }
}

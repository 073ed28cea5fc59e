// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! Content-Security-Policy report throttling.
//!
//! Browsers can send a burst of CSP violation reports from one page load. The
//! sink accepts at most `limit` reports per client per window; the counter map
//! is cleared by a background task every window. At most `max_clients`
//! distinct clients are tracked per window and reports from further clients
//! are refused until the next reset.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

/// Distinct clients tracked per window.
pub const DEFAULT_MAX_CLIENTS: usize = 10_000;

/// Per-client CSP report counter.
pub struct CspReportThrottle {
    limit: u32,
    window: Duration,
    max_clients: usize,
    counts: Mutex<HashMap<String, u32>>,
}

impl CspReportThrottle {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            max_clients: DEFAULT_MAX_CLIENTS,
            counts: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_max_clients(mut self, max_clients: usize) -> Self {
        self.max_clients = max_clients;
        self
    }

    /// Count one report from `client`; `false` once the client is over the
    /// limit for the current window.
    pub fn check(&self, client: &str) -> bool {
        let mut counts = match self.counts.lock() {
            Ok(counts) => counts,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(count) = counts.get_mut(client) {
            *count = count.saturating_add(1);
            return *count <= self.limit;
        }
        if counts.len() >= self.max_clients || self.limit == 0 {
            return false;
        }
        counts.insert(client.to_string(), 1);
        true
    }

    /// Start a new window for every client.
    pub fn reset(&self) {
        if let Ok(mut counts) = self.counts.lock() {
            counts.clear();
        }
    }

    /// Number of clients seen in the current window.
    pub fn tracked_clients(&self) -> usize {
        self.counts.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Clear the counters every window until `shutdown` is cancelled.
    ///
    /// ```rust,ignore
    /// tokio::spawn(throttle.clone().run_reset_loop(shutdown.clone()));
    /// ```
    pub async fn run_reset_loop(self: Arc<Self>, shutdown: CancellationToken) {
        info!(window_secs = self.window.as_secs(), "CSP throttle reset task starting");
        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.window) => self.reset(),
                _ = shutdown.cancelled() => {
                    info!("CSP throttle reset task shutting down");
                    return;
                }
            }
        }
    }
}

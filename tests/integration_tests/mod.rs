//! Integration tests module
//!
//! End-to-end runs of the supervisor driving the real HTTP portal client
//! against a wiremock server.

pub mod error_scenarios;
pub mod watch_loop_test;

use std::time::Duration;
use wiremock::MockServer;

/// Number of requests the server received for `method` and `path`
pub async fn request_count(server: &MockServer, method: &str, path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|req| req.method.as_str() == method && req.url.path() == path)
        .count()
}

/// Resolve once the server has seen at least `n` matching requests
pub async fn wait_for_requests(server: &MockServer, method: &str, path: &str, n: usize) {
    while request_count(server, method, path).await < n {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

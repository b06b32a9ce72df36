use reqwest::Client;
use std::time::Duration;

/// Shared client for outbound calls. Per-request bounds are set by the callers; only the
/// connect phase is bounded here.
pub fn build_client() -> Client {
    let connect = std::env::var("HTTP_CONNECT_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(5);
    Client::builder()
        .connect_timeout(Duration::from_secs(connect))
        .build()
        .unwrap_or_else(|_| Client::new())
}

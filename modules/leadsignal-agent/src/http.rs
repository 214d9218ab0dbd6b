//! Shared HTTP client for the source adapters.

use std::time::Duration;

const USER_AGENT: &str = "LeadSignalBot/0.1 (+https://example.local; contact=local)";

/// Build the client every adapter shares: one identifying User-Agent, one
/// bounded timeout. Reqwest clients clone cheaply, so each adapter holds
/// its own handle onto the same pool.
pub fn shared_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .expect("Failed to create HTTP client")
}

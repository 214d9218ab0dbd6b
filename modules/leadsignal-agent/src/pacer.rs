//! Per-source call spacing.
//!
//! Sources are scraped politely: consecutive calls to the same source keep
//! a fixed minimum spacing, while distinct sources pace independently. The
//! spacing is fixed rather than adaptive; adapters do not retry, so there
//! is no response signal to adapt on.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

pub struct Pacer {
    min_spacing: Duration,
    last_call: Mutex<HashMap<String, Instant>>,
}

impl Pacer {
    pub fn new(min_spacing: Duration) -> Self {
        Self {
            min_spacing,
            last_call: Mutex::new(HashMap::new()),
        }
    }

    /// Sleep until the spacing since the previous call to `source` has
    /// elapsed, then record this call. Calls to one source are sequential
    /// by construction, so compute-then-sleep is race-free per source.
    pub async fn wait(&self, source: &str) {
        let wait = {
            let last = self.last_call.lock().await;
            match last.get(source) {
                Some(at) => self.min_spacing.saturating_sub(at.elapsed()),
                None => Duration::ZERO,
            }
        };
        if wait > Duration::ZERO {
            debug!(source, wait_ms = wait.as_millis() as u64, "Pacing source call");
            tokio::time::sleep(wait).await;
        }
        self.last_call.lock().await.insert(source.to_string(), Instant::now());
    }
}

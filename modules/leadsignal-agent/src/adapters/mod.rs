//! Source adapters, one per job board.
//!
//! Adapters return source-native partial records: at minimum a URL, plus
//! whatever title/company/location/tags/date text the board exposes.
//! Identity and first-seen timestamps are filled in uniformly by the
//! runner, never per adapter. A failed call surfaces as an error the
//! runner degrades to an empty batch, so one broken board cannot sink a
//! run.
//!
//! Query terms are dual-purpose by convention: keyword boards (remoteok,
//! weworkremotely) receive them as search text, slug boards (greenhouse,
//! lever) as organization identifiers.

mod greenhouse;
mod lever;
mod remoteok;
mod weworkremotely;

pub use greenhouse::GreenhouseAdapter;
pub use lever::LeverAdapter;
pub use remoteok::RemoteOkAdapter;
pub use weworkremotely::WeWorkRemotelyAdapter;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use scraper::ElementRef;
use serde_json::Value;

use leadsignal_common::JobRecord;

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Source name, recorded on every record this adapter produces.
    fn name(&self) -> &'static str;

    /// Fetch raw records for one query term.
    async fn fetch(&self, query: &str) -> Result<Vec<JobRecord>>;
}

/// Source-name to adapter mapping, injected into the runner so tests can
/// swap in doubles without touching the network.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: HashMap<&'static str, Arc<dyn SourceAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All built-in adapters over one shared HTTP client.
    pub fn builtin(client: &reqwest::Client) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(GreenhouseAdapter::new(client.clone())));
        registry.register(Arc::new(LeverAdapter::new(client.clone())));
        registry.register(Arc::new(RemoteOkAdapter::new(client.clone())));
        registry.register(Arc::new(WeWorkRemotelyAdapter::new(client.clone())));
        registry
    }

    pub fn register(&mut self, adapter: Arc<dyn SourceAdapter>) {
        self.adapters.insert(adapter.name(), adapter);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn SourceAdapter>> {
        self.adapters.get(name).cloned()
    }
}

/// String value of a JSON field, trimmed, empty when absent or non-string.
pub(crate) fn text(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// First non-empty string among the given keys.
pub(crate) fn first_text(value: &Value, keys: &[&str]) -> String {
    keys.iter()
        .map(|key| text(value, key))
        .find(|found| !found.is_empty())
        .unwrap_or_default()
}

/// Visible text of an element with whitespace collapsed to single spaces.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

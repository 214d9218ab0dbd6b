//! Greenhouse JSON board API: `boards.greenhouse.io/{org}.json`.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use leadsignal_common::{to_iso_date, JobRecord};

use super::{first_text, text, SourceAdapter};

pub struct GreenhouseAdapter {
    client: reqwest::Client,
}

impl GreenhouseAdapter {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn record_from_posting(item: &Value, org: &str) -> JobRecord {
    let tags = item
        .get("metadata")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .map(|entry| text(entry, "name"))
                .filter(|name| !name.is_empty())
                .collect::<Vec<_>>()
                .join(",")
        })
        .unwrap_or_default();
    let posted = first_text(item, &["updated_at", "created_at"]);
    JobRecord {
        title: text(item, "title"),
        company: org.to_string(),
        location: item
            .pointer("/location/name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string(),
        tags,
        posted_at: to_iso_date(&posted),
        url: first_text(item, &["absolute_url", "url"]),
        source: "greenhouse".to_string(),
        description: first_text(item, &["content", "description"]),
        ..JobRecord::default()
    }
}

fn parse_board(body: &Value, org: &str) -> Vec<JobRecord> {
    body.get("jobs")
        .and_then(Value::as_array)
        .map(|jobs| jobs.iter().map(|item| record_from_posting(item, org)).collect())
        .unwrap_or_default()
}

#[async_trait]
impl SourceAdapter for GreenhouseAdapter {
    fn name(&self) -> &'static str {
        "greenhouse"
    }

    /// `query` is the organization slug.
    async fn fetch(&self, query: &str) -> Result<Vec<JobRecord>> {
        let org = query.trim();
        let url = format!("https://boards.greenhouse.io/{org}.json");
        let body: Value = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(parse_board(&body, org))
    }
}

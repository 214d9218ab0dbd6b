//! Lever postings API: `jobs.lever.co/{org}.json`, a top-level array.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use leadsignal_common::{millis_to_iso, to_iso_date, JobRecord};

use super::{first_text, text, SourceAdapter};

pub struct LeverAdapter {
    client: reqwest::Client,
}

impl LeverAdapter {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn record_from_posting(item: &Value, org: &str) -> JobRecord {
    let location = {
        let from_categories = item
            .pointer("/categories/location")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();
        if from_categories.is_empty() {
            text(item, "location")
        } else {
            from_categories
        }
    };
    let tags = item
        .get("tags")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(",")
        })
        .unwrap_or_default();
    // `createdAt` is epoch milliseconds; older payloads carry `postedAt`
    // date text instead.
    let posted_at = match item.get("createdAt").and_then(Value::as_i64) {
        Some(millis) => millis_to_iso(millis),
        None => to_iso_date(&text(item, "postedAt")),
    };
    JobRecord {
        title: first_text(item, &["text", "title"]),
        company: org.to_string(),
        location,
        tags,
        posted_at,
        url: first_text(item, &["hostedUrl", "applyUrl", "url"]),
        source: "lever".to_string(),
        description: first_text(item, &["descriptionPlain", "description"]),
        ..JobRecord::default()
    }
}

fn parse_postings(body: &Value, org: &str) -> Vec<JobRecord> {
    body.as_array()
        .map(|items| items.iter().map(|item| record_from_posting(item, org)).collect())
        .unwrap_or_default()
}

#[async_trait]
impl SourceAdapter for LeverAdapter {
    fn name(&self) -> &'static str {
        "lever"
    }

    /// `query` is the organization slug.
    async fn fetch(&self, query: &str) -> Result<Vec<JobRecord>> {
        let org = query.trim();
        let url = format!("https://jobs.lever.co/{org}.json");
        let body: Value = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(parse_postings(&body, org))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn postings_map_onto_records() {
        let body = json!([
            {
                "text": "Product Designer",
                "hostedUrl": "https://jobs.lever.co/acme/abc",
                "applyUrl": "https://jobs.lever.co/acme/abc/apply",
                "categories": {"location": "Remote"},
                "tags": ["figma", "design systems"],
                "createdAt": 1709294400000i64,
                "descriptionPlain": "Own the design system."
            },
            {
                "title": "Ops",
                "url": "https://jobs.lever.co/acme/def",
                "location": "Berlin",
                "postedAt": "2024-02-01"
            }
        ]);

        let records = parse_postings(&body, "acme");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "Product Designer");
        assert_eq!(records[0].url, "https://jobs.lever.co/acme/abc");
        assert_eq!(records[0].location, "Remote");
        assert_eq!(records[0].tags, "figma,design systems");
        assert_eq!(records[0].posted_at, "2024-03-01T12:00:00Z");
        assert_eq!(records[0].source, "lever");
        assert_eq!(records[1].title, "Ops");
        assert_eq!(records[1].location, "Berlin");
        assert_eq!(records[1].posted_at, "2024-02-01T00:00:00Z");
    }

    #[test]
    fn non_array_body_parses_to_nothing() {
        assert!(parse_postings(&json!({"error": "no such org"}), "acme").is_empty());
    }
}

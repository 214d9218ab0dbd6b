pub mod error;

pub use error::{Result, SupabaseError};

use std::time::Duration;

use serde_json::Value;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Build a PostgREST `in.(…)` predicate from a list of values.
pub fn in_expr<S: AsRef<str>>(values: &[S]) -> String {
    let quoted: Vec<String> = values
        .iter()
        .map(|v| format!("\"{}\"", v.as_ref()))
        .collect();
    format!("in.({})", quoted.join(","))
}

/// Build a PostgREST `ilike` predicate matching the term anywhere.
pub fn ilike_expr(term: &str) -> String {
    format!("ilike.*{term}*")
}

pub struct SupabaseClient {
    client: reqwest::Client,
    rest_url: String,
    key: String,
    timeout: Duration,
}

impl SupabaseClient {
    pub fn new(base_url: &str, service_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            rest_url: format!("{}/rest/v1", base_url.trim_end_matches('/')),
            key: service_key,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Insert-or-update rows, resolving conflicts on the given column by
    /// merging. Returns the stored representations.
    pub async fn upsert(&self, table: &str, rows: &[Value], on_conflict: &str) -> Result<Vec<Value>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        tracing::debug!(table, rows = rows.len(), "Upserting rows");

        let url = format!("{}/{}", self.rest_url, table);
        let resp = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .query(&[("on_conflict", on_conflict)])
            .json(&rows)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SupabaseError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let stored: Vec<Value> = resp.json().await?;
        Ok(stored)
    }

    /// Insert rows without conflict handling. Returns the stored
    /// representations.
    pub async fn insert(&self, table: &str, rows: &[Value]) -> Result<Vec<Value>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        tracing::debug!(table, rows = rows.len(), "Inserting rows");

        let url = format!("{}/{}", self.rest_url, table);
        let resp = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .header("Prefer", "return=representation")
            .json(&rows)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SupabaseError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let stored: Vec<Value> = resp.json().await?;
        Ok(stored)
    }

    /// Select rows with raw PostgREST query parameters, e.g.
    /// `("select", "id")`, `("id", "in.(…)")`, `("order", "collected_at.desc")`.
    pub async fn select(&self, table: &str, params: &[(String, String)]) -> Result<Vec<Value>> {
        tracing::debug!(table, "Selecting rows");

        let url = format!("{}/{}", self.rest_url, table);
        let resp = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .query(params)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SupabaseError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let rows: Vec<Value> = resp.json().await?;
        Ok(rows)
    }

    /// Patch rows matched by the filter parameters. PostgREST rejects an
    /// unfiltered update, so callers always pass at least one predicate.
    pub async fn update(
        &self,
        table: &str,
        patch: &Value,
        filters: &[(String, String)],
    ) -> Result<Vec<Value>> {
        tracing::debug!(table, "Updating rows");

        let url = format!("{}/{}", self.rest_url, table);
        let resp = self
            .client
            .patch(&url)
            .timeout(self.timeout)
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .header("Prefer", "return=representation")
            .query(filters)
            .json(patch)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SupabaseError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let updated: Vec<Value> = resp.json().await?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_expr_quotes_and_joins() {
        assert_eq!(in_expr(&["a", "b"]), r#"in.("a","b")"#);
        assert_eq!(in_expr(&["solo"]), r#"in.("solo")"#);
    }

    #[test]
    fn ilike_expr_wraps_with_wildcards() {
        assert_eq!(ilike_expr("berlin"), "ilike.*berlin*");
    }
}

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use leadsignal_common::{
    now_iso, JobQuery, JobRecord, LeadPatch, LeadQuery, LeadRecord, LeadSignalError, LeadStatus,
    StoreSettings,
};
use supabase_client::{ilike_expr, in_expr, SupabaseClient, SupabaseError};

use crate::backend::JobStore;

const JOBS: &str = "jobs";
const LEADS: &str = "leads";

// PostgREST predicates ride in the query string, so id lists are chunked to
// keep URLs inside proxy limits.
const ID_CHUNK: usize = 100;

/// Hosted backend over Supabase's PostgREST API. Backend of record whenever
/// credentials are present.
pub struct SupabaseStore {
    client: SupabaseClient,
}

impl SupabaseStore {
    pub fn new(base_url: &str, service_key: String) -> Self {
        Self {
            client: SupabaseClient::new(base_url, service_key),
        }
    }

    /// Construct from settings when both credentials are present.
    pub fn from_settings(settings: &StoreSettings) -> Option<Self> {
        match (&settings.supabase_url, &settings.supabase_service_key) {
            (Some(url), Some(key)) => Some(Self::new(url, key.clone())),
            _ => None,
        }
    }
}

fn backend_err(e: SupabaseError) -> LeadSignalError {
    LeadSignalError::BackendUnavailable(e.to_string())
}

/// Job row payload. `collected_at` is included only for rows not yet
/// stored; merge-duplicates overwrites every column it is given, and the
/// first-seen timestamp must survive re-upserts.
fn job_payload(record: &JobRecord, with_collected_at: bool) -> Value {
    let mut row = Map::new();
    row.insert("id".into(), json!(record.id));
    row.insert("title".into(), json!(record.title));
    row.insert("company".into(), json!(record.company));
    row.insert("location".into(), json!(record.location));
    row.insert("salary".into(), json!(record.salary));
    row.insert("tags".into(), json!(record.tags));
    let posted_at = if record.posted_at.is_empty() {
        Value::Null
    } else {
        json!(record.posted_at)
    };
    row.insert("posted_at".into(), posted_at);
    row.insert("url".into(), json!(record.url));
    row.insert("source".into(), json!(record.source));
    if with_collected_at {
        row.insert("collected_at".into(), json!(record.collected_at));
    }
    row.insert("description".into(), json!(record.description));
    Value::Object(row)
}

fn str_field(row: &Value, key: &str) -> String {
    row.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn value_to_job(row: &Value) -> JobRecord {
    JobRecord {
        id: str_field(row, "id"),
        title: str_field(row, "title"),
        company: str_field(row, "company"),
        location: str_field(row, "location"),
        salary: str_field(row, "salary"),
        tags: str_field(row, "tags"),
        posted_at: str_field(row, "posted_at"),
        url: str_field(row, "url"),
        source: str_field(row, "source"),
        collected_at: str_field(row, "collected_at"),
        description: str_field(row, "description"),
        score: 0,
    }
}

fn value_to_lead(row: &Value) -> LeadRecord {
    LeadRecord {
        id: str_field(row, "id"),
        status: str_field(row, "status").parse().unwrap_or_default(),
        score: row.get("score").and_then(Value::as_i64).unwrap_or(0),
        favourite: row.get("favourite").and_then(Value::as_bool).unwrap_or(false),
        resume_url: str_field(row, "resume_url"),
        cover_letter_url: str_field(row, "cover_letter_url"),
        next_action: str_field(row, "next_action"),
        next_action_date: str_field(row, "next_action_date"),
        notes: str_field(row, "notes"),
        updated_at: str_field(row, "updated_at"),
    }
}

fn returned_ids(rows: Vec<Value>) -> impl Iterator<Item = String> {
    rows.into_iter().filter_map(|row| {
        row.get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
    })
}

#[async_trait]
impl JobStore for SupabaseStore {
    fn name(&self) -> &'static str {
        "supabase"
    }

    async fn upsert_jobs(&self, records: &[JobRecord]) -> Result<Vec<String>, LeadSignalError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
        let existing = self.existing_ids(&ids).await?;

        // PostgREST bulk payloads need uniform keys, so new and re-observed
        // rows go in separate requests.
        let inserts: Vec<Value> = records
            .iter()
            .filter(|r| !existing.contains(&r.id))
            .map(|r| job_payload(r, true))
            .collect();
        let updates: Vec<Value> = records
            .iter()
            .filter(|r| existing.contains(&r.id))
            .map(|r| job_payload(r, false))
            .collect();

        let mut stored = Vec::with_capacity(records.len());
        for rows in [inserts, updates] {
            if rows.is_empty() {
                continue;
            }
            let returned = self
                .client
                .upsert(JOBS, &rows, "id")
                .await
                .map_err(backend_err)?;
            stored.extend(returned_ids(returned));
        }
        Ok(stored)
    }

    async fn ensure_leads(&self, ids: &[String]) -> Result<(), LeadSignalError> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut have = HashSet::new();
        for chunk in ids.chunks(ID_CHUNK) {
            let params = vec![
                ("select".to_string(), "id".to_string()),
                ("id".to_string(), in_expr(chunk)),
            ];
            let rows = self.client.select(LEADS, &params).await.map_err(backend_err)?;
            have.extend(returned_ids(rows));
        }
        let new_rows: Vec<Value> = ids
            .iter()
            .filter(|id| !have.contains(*id))
            .map(|id| json!({ "id": id }))
            .collect();
        if !new_rows.is_empty() {
            self.client.insert(LEADS, &new_rows).await.map_err(backend_err)?;
        }
        Ok(())
    }

    async fn existing_ids(&self, ids: &[String]) -> Result<HashSet<String>, LeadSignalError> {
        let mut found = HashSet::new();
        for chunk in ids.chunks(ID_CHUNK) {
            let params = vec![
                ("select".to_string(), "id".to_string()),
                ("id".to_string(), in_expr(chunk)),
            ];
            let rows = self.client.select(JOBS, &params).await.map_err(backend_err)?;
            found.extend(returned_ids(rows));
        }
        Ok(found)
    }

    async fn query_jobs(&self, query: &JobQuery) -> Result<Vec<JobRecord>, LeadSignalError> {
        let mut params: Vec<(String, String)> = vec![("select".to_string(), "*".to_string())];
        if let Some(text) = &query.text {
            params.push((
                "or".to_string(),
                format!(
                    "(title.ilike.*{text}*,company.ilike.*{text}*,tags.ilike.*{text}*,description.ilike.*{text}*)"
                ),
            ));
        }
        if let Some(source) = &query.source {
            params.push(("source".to_string(), format!("eq.{source}")));
        }
        if let Some(location) = &query.location {
            params.push(("location".to_string(), ilike_expr(location)));
        }
        if let Some(from) = &query.collected_from {
            params.push(("collected_at".to_string(), format!("gte.{from}")));
        }
        if let Some(to) = &query.collected_to {
            params.push(("collected_at".to_string(), format!("lte.{to}")));
        }
        params.push(("order".to_string(), "collected_at.desc".to_string()));
        params.push(("limit".to_string(), query.limit.to_string()));
        params.push(("offset".to_string(), query.offset.to_string()));

        let rows = self.client.select(JOBS, &params).await.map_err(backend_err)?;
        Ok(rows.iter().map(value_to_job).collect())
    }

    async fn query_leads(&self, query: &LeadQuery) -> Result<Vec<LeadRecord>, LeadSignalError> {
        let mut params: Vec<(String, String)> = vec![("select".to_string(), "*".to_string())];
        if let Some(status) = query.status {
            params.push(("status".to_string(), format!("eq.{status}")));
        }
        params.push(("order".to_string(), "updated_at.desc".to_string()));

        let rows = self.client.select(LEADS, &params).await.map_err(backend_err)?;
        Ok(rows.iter().map(value_to_lead).collect())
    }

    async fn set_lead_fields(&self, id: &str, patch: &LeadPatch) -> Result<(), LeadSignalError> {
        let ids = vec![id.to_string()];
        self.ensure_leads(&ids).await?;

        let mut fields = Map::new();
        if let Some(status) = patch.status {
            fields.insert("status".into(), json!(status.as_str()));
        }
        if let Some(score) = patch.score {
            fields.insert("score".into(), json!(score));
        }
        if let Some(favourite) = patch.favourite {
            fields.insert("favourite".into(), json!(favourite));
        }
        let text_fields = [
            ("resume_url", &patch.resume_url),
            ("cover_letter_url", &patch.cover_letter_url),
            ("next_action", &patch.next_action),
            ("next_action_date", &patch.next_action_date),
            ("notes", &patch.notes),
        ];
        for (column, value) in text_fields {
            if let Some(value) = value {
                fields.insert(column.into(), json!(value));
            }
        }
        fields.insert("updated_at".into(), json!(now_iso()));

        self.client
            .update(LEADS, &Value::Object(fields), &[("id".to_string(), format!("eq.{id}"))])
            .await
            .map_err(backend_err)?;
        Ok(())
    }

    async fn bulk_set_status(
        &self,
        ids: &[String],
        status: LeadStatus,
    ) -> Result<usize, LeadSignalError> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.ensure_leads(ids).await?;

        let patch = json!({ "status": status.as_str(), "updated_at": now_iso() });
        let mut count = 0;
        for chunk in ids.chunks(ID_CHUNK) {
            let updated = self
                .client
                .update(LEADS, &patch, &[("id".to_string(), in_expr(chunk))])
                .await
                .map_err(backend_err)?;
            count += updated.len();
        }
        Ok(count)
    }

    async fn bulk_set_scores(
        &self,
        scores: &HashMap<String, i64>,
    ) -> Result<usize, LeadSignalError> {
        if scores.is_empty() {
            return Ok(0);
        }
        let ids: Vec<String> = scores.keys().cloned().collect();
        self.ensure_leads(&ids).await?;

        let now = now_iso();
        let mut count = 0;
        for (id, score) in scores {
            let patch = json!({ "score": score, "updated_at": now });
            let updated = self
                .client
                .update(LEADS, &patch, &[("id".to_string(), format!("eq.{id}"))])
                .await
                .map_err(backend_err)?;
            count += updated.len();
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_posted_at_becomes_null() {
        let record = JobRecord {
            id: "abc".into(),
            posted_at: String::new(),
            ..JobRecord::default()
        };
        let payload = job_payload(&record, true);
        assert!(payload.get("posted_at").unwrap().is_null());
        assert_eq!(payload.get("id").unwrap(), "abc");
    }

    #[test]
    fn collected_at_omitted_for_existing_rows() {
        let record = JobRecord {
            id: "abc".into(),
            collected_at: "2024-01-01T00:00:00Z".into(),
            ..JobRecord::default()
        };
        let fresh = job_payload(&record, true);
        assert!(fresh.get("collected_at").is_some());
        let update = job_payload(&record, false);
        assert!(update.get("collected_at").is_none());
    }

    #[test]
    fn job_rows_tolerate_missing_and_null_fields() {
        let row = json!({ "id": "x", "title": "T", "posted_at": null });
        let job = value_to_job(&row);
        assert_eq!(job.id, "x");
        assert_eq!(job.title, "T");
        assert_eq!(job.posted_at, "");
        assert_eq!(job.company, "");
    }

    #[test]
    fn lead_rows_parse_status_and_flags() {
        let row = json!({
            "id": "x",
            "status": "applied",
            "score": 7,
            "favourite": true
        });
        let lead = value_to_lead(&row);
        assert_eq!(lead.status, LeadStatus::Applied);
        assert_eq!(lead.score, 7);
        assert!(lead.favourite);
    }

    #[test]
    fn unknown_status_falls_back_to_new() {
        let row = json!({ "id": "x", "status": "someday" });
        assert_eq!(value_to_lead(&row).status, LeadStatus::New);
    }
}

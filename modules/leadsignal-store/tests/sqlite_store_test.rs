//! Contract tests for the embedded store. The same behavior is expected of
//! the hosted backend; these pin it down where it can run hermetically.

use std::collections::HashMap;

use leadsignal_common::{JobQuery, JobRecord, LeadPatch, LeadQuery, LeadStatus};
use leadsignal_store::{JobStore, SqliteStore};

fn record(id: &str, title: &str, collected_at: &str) -> JobRecord {
    JobRecord {
        id: id.to_string(),
        title: title.to_string(),
        url: format!("https://example.com/{id}"),
        source: "test".to_string(),
        collected_at: collected_at.to_string(),
        ..JobRecord::default()
    }
}

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn upsert_returns_ids_and_stores_rows() {
    let store = SqliteStore::in_memory().unwrap();
    let stored = store
        .upsert_jobs(&[
            record("a", "First", "2024-01-01T00:00:00Z"),
            record("b", "Second", "2024-01-02T00:00:00Z"),
        ])
        .await
        .unwrap();
    assert_eq!(stored, vec!["a".to_string(), "b".to_string()]);

    let jobs = store.query_jobs(&JobQuery::default()).await.unwrap();
    assert_eq!(jobs.len(), 2);
}

#[tokio::test]
async fn reupsert_overwrites_fields_but_keeps_first_collected_at() {
    let store = SqliteStore::in_memory().unwrap();
    store
        .upsert_jobs(&[record("a", "Old title", "2024-01-01T00:00:00Z")])
        .await
        .unwrap();
    store
        .upsert_jobs(&[record("a", "New title", "2025-06-01T00:00:00Z")])
        .await
        .unwrap();

    let jobs = store.query_jobs(&JobQuery::default()).await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].title, "New title");
    assert_eq!(jobs[0].collected_at, "2024-01-01T00:00:00Z");
}

#[tokio::test]
async fn existing_ids_reports_only_stored_ids() {
    let store = SqliteStore::in_memory().unwrap();
    store
        .upsert_jobs(&[record("a", "", ""), record("b", "", "")])
        .await
        .unwrap();

    let found = store.existing_ids(&ids(&["a", "b", "c"])).await.unwrap();
    assert!(found.contains("a"));
    assert!(found.contains("b"));
    assert!(!found.contains("c"));

    assert!(store.existing_ids(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn query_jobs_matches_text_across_fields_case_insensitively() {
    let store = SqliteStore::in_memory().unwrap();
    let mut designer = record("a", "Product Designer", "2024-01-01T00:00:00Z");
    designer.description = "Figma and WCAG audits".to_string();
    let engineer = record("b", "Engineer", "2024-01-02T00:00:00Z");
    store.upsert_jobs(&[designer, engineer]).await.unwrap();

    let query = JobQuery {
        text: Some("FIGMA".to_string()),
        ..JobQuery::default()
    };
    let jobs = store.query_jobs(&query).await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].id, "a");
}

#[tokio::test]
async fn query_jobs_filters_by_source_location_and_date_range() {
    let store = SqliteStore::in_memory().unwrap();
    let mut early = record("a", "Early", "2024-01-01T00:00:00Z");
    early.source = "remoteok".to_string();
    early.location = "Berlin, Germany".to_string();
    let mut late = record("b", "Late", "2024-06-01T00:00:00Z");
    late.source = "lever".to_string();
    late.location = "Remote".to_string();
    store.upsert_jobs(&[early, late]).await.unwrap();

    let by_source = store
        .query_jobs(&JobQuery {
            source: Some("lever".to_string()),
            ..JobQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(by_source.len(), 1);
    assert_eq!(by_source[0].id, "b");

    let by_location = store
        .query_jobs(&JobQuery {
            location: Some("berlin".to_string()),
            ..JobQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(by_location.len(), 1);
    assert_eq!(by_location[0].id, "a");

    let in_range = store
        .query_jobs(&JobQuery {
            collected_from: Some("2024-03-01T00:00:00Z".to_string()),
            ..JobQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(in_range.len(), 1);
    assert_eq!(in_range[0].id, "b");
}

#[tokio::test]
async fn query_jobs_orders_newest_first_and_paginates() {
    let store = SqliteStore::in_memory().unwrap();
    store
        .upsert_jobs(&[
            record("a", "", "2024-01-01T00:00:00Z"),
            record("b", "", "2024-02-01T00:00:00Z"),
            record("c", "", "2024-03-01T00:00:00Z"),
        ])
        .await
        .unwrap();

    let first_page = store
        .query_jobs(&JobQuery {
            limit: 2,
            ..JobQuery::default()
        })
        .await
        .unwrap();
    let first_ids: Vec<&str> = first_page.iter().map(|j| j.id.as_str()).collect();
    assert_eq!(first_ids, vec!["c", "b"]);

    let second_page = store
        .query_jobs(&JobQuery {
            limit: 2,
            offset: 2,
            ..JobQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(second_page.len(), 1);
    assert_eq!(second_page[0].id, "a");
}

// ---------------------------------------------------------------------------
// Leads
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ensure_leads_creates_defaults_and_is_idempotent() {
    let store = SqliteStore::in_memory().unwrap();
    store.upsert_jobs(&[record("a", "", "")]).await.unwrap();
    store.ensure_leads(&ids(&["a"])).await.unwrap();

    let leads = store.query_leads(&LeadQuery::default()).await.unwrap();
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0].status, LeadStatus::New);
    assert_eq!(leads[0].score, 0);

    // A second ensure must not reset an edited lead.
    store
        .set_lead_fields(
            "a",
            &LeadPatch {
                status: Some(LeadStatus::Applied),
                ..LeadPatch::default()
            },
        )
        .await
        .unwrap();
    store.ensure_leads(&ids(&["a"])).await.unwrap();

    let leads = store.query_leads(&LeadQuery::default()).await.unwrap();
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0].status, LeadStatus::Applied);
}

#[tokio::test]
async fn query_leads_filters_by_status() {
    let store = SqliteStore::in_memory().unwrap();
    store
        .upsert_jobs(&[record("a", "", ""), record("b", "", "")])
        .await
        .unwrap();
    store.ensure_leads(&ids(&["a", "b"])).await.unwrap();
    store
        .bulk_set_status(&ids(&["b"]), LeadStatus::Archived)
        .await
        .unwrap();

    let archived = store
        .query_leads(&LeadQuery {
            status: Some(LeadStatus::Archived),
        })
        .await
        .unwrap();
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].id, "b");

    let fresh = store
        .query_leads(&LeadQuery {
            status: Some(LeadStatus::New),
        })
        .await
        .unwrap();
    assert_eq!(fresh.len(), 1);
    assert_eq!(fresh[0].id, "a");
}

#[tokio::test]
async fn set_lead_fields_creates_missing_lead_and_rewrites_updated_at() {
    let store = SqliteStore::in_memory().unwrap();
    store.upsert_jobs(&[record("a", "", "")]).await.unwrap();

    // No ensure_leads beforehand; the patch must create the lead itself.
    store
        .set_lead_fields(
            "a",
            &LeadPatch {
                favourite: Some(true),
                notes: Some("looks promising".to_string()),
                ..LeadPatch::default()
            },
        )
        .await
        .unwrap();

    let leads = store.query_leads(&LeadQuery::default()).await.unwrap();
    assert_eq!(leads.len(), 1);
    assert!(leads[0].favourite);
    assert_eq!(leads[0].notes, "looks promising");
    assert!(!leads[0].updated_at.is_empty());
}

#[tokio::test]
async fn bulk_mutations_ensure_leads_first() {
    let store = SqliteStore::in_memory().unwrap();
    store
        .upsert_jobs(&[record("a", "", ""), record("b", "", "")])
        .await
        .unwrap();

    // No leads exist yet; both bulk writes must create them.
    let status_count = store
        .bulk_set_status(&ids(&["a"]), LeadStatus::Interview)
        .await
        .unwrap();
    assert_eq!(status_count, 1);

    let mut scores = HashMap::new();
    scores.insert("b".to_string(), 9);
    let score_count = store.bulk_set_scores(&scores).await.unwrap();
    assert_eq!(score_count, 1);

    let leads = store.query_leads(&LeadQuery::default()).await.unwrap();
    assert_eq!(leads.len(), 2);
    let lead_a = leads.iter().find(|l| l.id == "a").unwrap();
    assert_eq!(lead_a.status, LeadStatus::Interview);
    let lead_b = leads.iter().find(|l| l.id == "b").unwrap();
    assert_eq!(lead_b.score, 9);
    assert_eq!(lead_b.status, LeadStatus::New);
}

// ---------------------------------------------------------------------------
// Durability
// ---------------------------------------------------------------------------

#[tokio::test]
async fn file_backed_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("jobs.sqlite");

    {
        let store = SqliteStore::open(&path).unwrap();
        store
            .upsert_jobs(&[record("a", "Persisted", "2024-01-01T00:00:00Z")])
            .await
            .unwrap();
    }

    let store = SqliteStore::open(&path).unwrap();
    let found = store.existing_ids(&ids(&["a"])).await.unwrap();
    assert!(found.contains("a"));
}

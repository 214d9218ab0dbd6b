//! Storage contract shared by the embedded and hosted backends.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use leadsignal_common::{
    JobQuery, JobRecord, LeadPatch, LeadQuery, LeadRecord, LeadSignalError, LeadStatus,
};

/// Persistence contract for jobs and their leads.
///
/// Implemented by SqliteStore (embedded) and SupabaseStore (hosted); the
/// pipeline selects one per run. Callers that need the is-this-new signal
/// must call `existing_ids` before `upsert_jobs`, because upsert destroys it.
/// Also implemented for `Arc<S>` so a store can be shared with assertions in
/// tests.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Backend name for logs and run reports.
    fn name(&self) -> &'static str;

    /// Insert-or-update by id, returning the stored ids. Existing rows keep
    /// their identity and first-seen `collected_at`; every other field is
    /// overwritten with the incoming value.
    async fn upsert_jobs(&self, records: &[JobRecord]) -> Result<Vec<String>, LeadSignalError>;

    /// Create missing leads with default status. Idempotent, batch-safe.
    async fn ensure_leads(&self, ids: &[String]) -> Result<(), LeadSignalError>;

    /// Which of the given ids are already stored.
    async fn existing_ids(&self, ids: &[String]) -> Result<HashSet<String>, LeadSignalError>;

    async fn query_jobs(&self, query: &JobQuery) -> Result<Vec<JobRecord>, LeadSignalError>;

    async fn query_leads(&self, query: &LeadQuery) -> Result<Vec<LeadRecord>, LeadSignalError>;

    /// Patch a single lead, creating it first when missing. `updated_at` is
    /// rewritten even for an empty patch.
    async fn set_lead_fields(&self, id: &str, patch: &LeadPatch) -> Result<(), LeadSignalError>;

    /// Set the status of many leads, creating missing ones first. Returns
    /// the number of leads written.
    async fn bulk_set_status(
        &self,
        ids: &[String],
        status: LeadStatus,
    ) -> Result<usize, LeadSignalError>;

    /// Write recomputed scores, creating missing leads first. Returns the
    /// number of leads written.
    async fn bulk_set_scores(
        &self,
        scores: &HashMap<String, i64>,
    ) -> Result<usize, LeadSignalError>;
}

#[async_trait]
impl<S: JobStore + ?Sized> JobStore for Arc<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn upsert_jobs(&self, records: &[JobRecord]) -> Result<Vec<String>, LeadSignalError> {
        (**self).upsert_jobs(records).await
    }

    async fn ensure_leads(&self, ids: &[String]) -> Result<(), LeadSignalError> {
        (**self).ensure_leads(ids).await
    }

    async fn existing_ids(&self, ids: &[String]) -> Result<HashSet<String>, LeadSignalError> {
        (**self).existing_ids(ids).await
    }

    async fn query_jobs(&self, query: &JobQuery) -> Result<Vec<JobRecord>, LeadSignalError> {
        (**self).query_jobs(query).await
    }

    async fn query_leads(&self, query: &LeadQuery) -> Result<Vec<LeadRecord>, LeadSignalError> {
        (**self).query_leads(query).await
    }

    async fn set_lead_fields(&self, id: &str, patch: &LeadPatch) -> Result<(), LeadSignalError> {
        (**self).set_lead_fields(id, patch).await
    }

    async fn bulk_set_status(
        &self,
        ids: &[String],
        status: LeadStatus,
    ) -> Result<usize, LeadSignalError> {
        (**self).bulk_set_status(ids, status).await
    }

    async fn bulk_set_scores(
        &self,
        scores: &HashMap<String, i64>,
    ) -> Result<usize, LeadSignalError> {
        (**self).bulk_set_scores(scores).await
    }
}

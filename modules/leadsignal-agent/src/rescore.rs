//! Bulk rescoring of stored jobs against the current rule set.

use std::collections::HashMap;

use tracing::info;

use leadsignal_common::{score_record, JobQuery, LeadSignalError, ScoreRules};
use leadsignal_store::JobStore;

const PAGE_SIZE: u32 = 500;

/// Recompute the score of every stored job from its stored text and write
/// the results onto the leads in bulk. This is a second, independent write
/// path from ingestion scoring: editing the rules and rescoring applies
/// them to the whole backlog without refetching anything. Returns the
/// number of leads written.
pub async fn rescore_jobs<S>(store: &S, rules: Option<&ScoreRules>) -> Result<usize, LeadSignalError>
where
    S: JobStore + ?Sized,
{
    let mut scores: HashMap<String, i64> = HashMap::new();
    let mut offset = 0;
    loop {
        let page = store
            .query_jobs(&JobQuery {
                limit: PAGE_SIZE,
                offset,
                ..JobQuery::default()
            })
            .await?;
        let fetched = page.len() as u32;
        for job in &page {
            scores.insert(job.id.clone(), score_record(job, rules));
        }
        if fetched < PAGE_SIZE {
            break;
        }
        offset += PAGE_SIZE;
    }

    let updated = store.bulk_set_scores(&scores).await?;
    info!(jobs = scores.len(), updated, "Rescore complete");
    Ok(updated)
}

//! One scrape run: fetch per source and query term, score, filter, dedupe,
//! persist, and report which records are new since the previous run.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use leadsignal_common::{
    dedupe_by_id, filter_records, job_id, now_iso, score_record, JobRecord, LeadSignalError,
    ScrapeConfig, StoreSettings,
};
use leadsignal_store::{select_stores, write_csv, JobStore, SqliteStore};

use crate::adapters::AdapterRegistry;
use crate::pacer::Pacer;

/// Counts from one run. `all` is every usable fetched record before
/// filtering; `new` is the subset of `unique` first seen by the backend in
/// this run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub all: usize,
    pub filtered: usize,
    pub unique: usize,
    pub new: usize,
}

impl std::fmt::Display for RunStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scrape done: all={} filtered={} unique={} new={}",
            self.all, self.filtered, self.unique, self.new
        )
    }
}

/// Outcome of a completed run, handed to the caller for notification.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub stats: RunStats,
    /// Records whose ids the backend had not seen before this run's upsert.
    pub new_records: Vec<JobRecord>,
    /// Backend of record the run persisted to.
    pub backend: &'static str,
}

pub struct ScrapeRunner {
    config: ScrapeConfig,
    settings: StoreSettings,
    registry: AdapterRegistry,
}

impl ScrapeRunner {
    pub fn new(config: ScrapeConfig, settings: StoreSettings, registry: AdapterRegistry) -> Self {
        Self {
            config,
            settings,
            registry,
        }
    }

    /// Drive one pipeline pass. Adapter failures degrade to empty batches;
    /// cancellation stops new adapter calls, lets in-flight ones drain, and
    /// discards the partial results without persisting anything.
    pub async fn run(&self, cancel: CancellationToken) -> Result<RunReport, LeadSignalError> {
        let run_id = Uuid::new_v4();
        info!(%run_id, sites = ?self.config.sites, "Scrape run starting");

        let mut records = self.fetch_all(&cancel).await;
        let rules = self.config.score_rules.as_ref();
        for record in &mut records {
            record.score = score_record(record, rules);
        }
        let all = records.len();

        let kept = filter_records(
            records,
            &self.config.include,
            &self.config.exclude,
            &self.config.locations,
        );
        let filtered = kept.len();

        let unique_records = dedupe_by_id(kept);
        let unique = unique_records.len();

        if cancel.is_cancelled() {
            warn!(%run_id, all, filtered, unique, "Run cancelled, discarding partial results");
            return Err(LeadSignalError::Cancelled);
        }

        let (new_records, backend) = match self.persist(&unique_records).await {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(%run_id, all, filtered, unique, "Run failed during persistence");
                return Err(error);
            }
        };
        let stats = RunStats {
            all,
            filtered,
            unique,
            new: new_records.len(),
        };
        info!(
            %run_id,
            backend,
            all = stats.all,
            filtered = stats.filtered,
            unique = stats.unique,
            new = stats.new,
            "Scrape run complete"
        );
        Ok(RunReport {
            stats,
            new_records,
            backend,
        })
    }

    /// Fan out across sources, bounded; stay sequential within one source,
    /// spacing consecutive calls. A failed call logs and yields nothing.
    async fn fetch_all(&self, cancel: &CancellationToken) -> Vec<JobRecord> {
        let pacer = Pacer::new(Duration::from_millis(self.config.source_delay_ms));
        let terms: Vec<String> = if self.config.include.is_empty() {
            vec![String::new()]
        } else {
            self.config.include.clone()
        };

        let mut adapters = Vec::new();
        for site in &self.config.sites {
            match self.registry.get(site) {
                Some(adapter) => adapters.push(adapter),
                None => warn!(site = site.as_str(), "No adapter registered for source, skipping"),
            }
        }

        let pacer = &pacer;
        let terms = &terms;
        let batches: Vec<Vec<JobRecord>> = stream::iter(adapters.into_iter().map(|adapter| {
            async move {
                let mut collected = Vec::new();
                for term in terms {
                    if cancel.is_cancelled() {
                        debug!(source = adapter.name(), "Cancelled, skipping remaining calls");
                        break;
                    }
                    pacer.wait(adapter.name()).await;
                    match adapter.fetch(term).await {
                        Ok(batch) => {
                            debug!(
                                source = adapter.name(),
                                term = term.as_str(),
                                fetched = batch.len(),
                                "Adapter call complete"
                            );
                            collected.extend(normalize(batch, adapter.name()));
                        }
                        Err(error) => {
                            warn!(
                                source = adapter.name(),
                                term = term.as_str(),
                                %error,
                                "Adapter fetch failed, treating as empty"
                            );
                        }
                    }
                }
                collected
            }
        }))
        .buffer_unordered(self.config.max_concurrent_sources.max(1))
        .collect()
        .await;

        batches.into_iter().flatten().collect()
    }

    /// Persist the deduped set and compute the new-record delta. The
    /// existence check runs strictly before the upsert; on a hosted
    /// backend it doubles as the availability probe, and failing it falls
    /// back to the embedded store before anything was written.
    async fn persist(
        &self,
        unique: &[JobRecord],
    ) -> Result<(Vec<JobRecord>, &'static str), LeadSignalError> {
        let mut stores = select_stores(&self.settings, &self.config)?;
        let ids: Vec<String> = unique.iter().map(|r| r.id.clone()).collect();

        let (primary, existing) = match stores.primary.existing_ids(&ids).await {
            Ok(existing) => (Arc::clone(&stores.primary), existing),
            Err(error) if stores.hosted => {
                warn!(%error, "Hosted backend unreachable, falling back to embedded store");
                let embedded: Arc<dyn JobStore> = match stores.mirror.take() {
                    Some(mirror) => mirror,
                    None => Arc::new(SqliteStore::open(&self.settings.sqlite_path)?),
                };
                stores.hosted = false;
                let existing = embedded.existing_ids(&ids).await?;
                (embedded, existing)
            }
            Err(error) => return Err(error),
        };

        let upserted = primary.upsert_jobs(unique).await?;
        primary.ensure_leads(&upserted).await?;

        if let Some(mirror) = &stores.mirror {
            // Mirror trouble must not lose a hosted run that already landed.
            if let Err(error) = mirror.upsert_jobs(unique).await {
                warn!(%error, "Local mirror upsert failed");
            } else if let Err(error) = mirror.ensure_leads(&upserted).await {
                warn!(%error, "Local mirror lead creation failed");
            }
        }

        let embedded_in_run = !stores.hosted || stores.mirror.is_some();
        if embedded_in_run {
            if let Some(path) = &self.config.output_csv {
                match write_csv(path, unique) {
                    Ok(()) => {
                        info!(path = %path.display(), rows = unique.len(), "CSV snapshot written");
                    }
                    Err(error) => warn!(%error, "CSV snapshot failed"),
                }
            }
        }

        let upserted: HashSet<String> = upserted.into_iter().collect();
        let new_records: Vec<JobRecord> = unique
            .iter()
            .filter(|r| upserted.contains(&r.id) && !existing.contains(&r.id))
            .cloned()
            .collect();

        // A lead born this run carries the ingestion score; leads that
        // already existed keep theirs, the rescore path owns the backlog.
        if !new_records.is_empty() {
            let initial_scores: HashMap<String, i64> = new_records
                .iter()
                .map(|r| (r.id.clone(), r.score))
                .collect();
            primary.bulk_set_scores(&initial_scores).await?;
            if let Some(mirror) = &stores.mirror {
                if let Err(error) = mirror.bulk_set_scores(&initial_scores).await {
                    warn!(%error, "Local mirror score write failed");
                }
            }
        }

        Ok((new_records, primary.name()))
    }
}

/// Uniform post-fetch normalization. A record without a usable URL cannot
/// be given an identity and is dropped before it reaches any count; id,
/// first-seen timestamp and source are filled in where the adapter left
/// them out.
fn normalize(batch: Vec<JobRecord>, source: &str) -> Vec<JobRecord> {
    batch
        .into_iter()
        .filter_map(|mut record| {
            if record.url.trim().is_empty() {
                debug!(source, title = record.title.as_str(), "Dropping record without a URL");
                return None;
            }
            if record.id.is_empty() {
                record.id = job_id(&record.url);
            }
            if record.collected_at.is_empty() {
                record.collected_at = now_iso();
            }
            if record.source.is_empty() {
                record.source = source.to_string();
            }
            Some(record)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_assigns_identity_and_drops_urlless_records() {
        let batch = vec![
            JobRecord {
                url: "https://example.com/jobs/1".to_string(),
                title: "Keeps".to_string(),
                ..JobRecord::default()
            },
            JobRecord {
                title: "Dropped".to_string(),
                ..JobRecord::default()
            },
        ];
        let normalized = normalize(batch, "remoteok");
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].id, job_id("https://example.com/jobs/1"));
        assert_eq!(normalized[0].source, "remoteok");
        assert!(!normalized[0].collected_at.is_empty());
    }

    #[test]
    fn normalize_leaves_adapter_supplied_fields_alone() {
        let batch = vec![JobRecord {
            url: "https://example.com/jobs/2".to_string(),
            id: "preset".to_string(),
            source: "custom".to_string(),
            collected_at: "2024-01-01T00:00:00Z".to_string(),
            ..JobRecord::default()
        }];
        let normalized = normalize(batch, "remoteok");
        assert_eq!(normalized[0].id, "preset");
        assert_eq!(normalized[0].source, "custom");
        assert_eq!(normalized[0].collected_at, "2024-01-01T00:00:00Z");
    }

    #[test]
    fn stats_render_as_the_summary_line() {
        let stats = RunStats {
            all: 12,
            filtered: 7,
            unique: 5,
            new: 2,
        };
        assert_eq!(
            stats.to_string(),
            "Scrape done: all=12 filtered=7 unique=5 new=2"
        );
    }
}

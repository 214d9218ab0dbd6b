use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use leadsignal_agent::adapters::AdapterRegistry;
use leadsignal_agent::http;
use leadsignal_agent::rescore::rescore_jobs;
use leadsignal_agent::runner::ScrapeRunner;
use leadsignal_common::{JobQuery, LeadPatch, LeadQuery, LeadStatus, ScrapeConfig, StoreSettings};
use leadsignal_store::{open_primary, JobStore};

#[derive(Parser)]
#[command(name = "leadsignal")]
#[command(about = "Job lead aggregation - scrape boards, score postings, track leads")]
struct Cli {
    /// Path to the scrape configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one scrape across the configured sources
    Scrape {
        /// Override the configured include terms (search text or org slugs)
        #[arg(long, num_args = 1..)]
        include: Option<Vec<String>>,

        /// Override the configured exclude terms
        #[arg(long, num_args = 1..)]
        exclude: Option<Vec<String>>,

        /// Override the configured location filters
        #[arg(long, num_args = 1..)]
        locations: Option<Vec<String>>,

        /// Override the configured sources
        #[arg(long, num_args = 1..)]
        sites: Option<Vec<String>>,
    },

    /// Recompute lead scores for all stored jobs from the configured rules
    Rescore,

    /// List stored jobs
    Jobs {
        /// Text search over title, company, tags and description
        #[arg(short, long)]
        query: Option<String>,

        /// Filter by source adapter name
        #[arg(long)]
        source: Option<String>,

        /// Filter by location substring
        #[arg(long)]
        location: Option<String>,

        /// Only jobs collected at or after this ISO timestamp
        #[arg(long)]
        since: Option<String>,

        /// Only jobs collected at or before this ISO timestamp
        #[arg(long)]
        until: Option<String>,

        /// Maximum rows to print
        #[arg(long, default_value = "20")]
        limit: u32,
    },

    /// List leads
    Leads {
        /// Filter by status (new, applied, interview, offer, archived)
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Update one lead's tracking fields
    Lead {
        /// Lead id (same as the job id)
        id: String,

        /// New status (new, applied, interview, offer, archived)
        #[arg(long)]
        status: Option<String>,

        /// Override the lead's score
        #[arg(long)]
        score: Option<i64>,

        /// Mark or unmark as favourite
        #[arg(long)]
        favourite: Option<bool>,

        #[arg(long)]
        resume_url: Option<String>,

        #[arg(long)]
        cover_letter_url: Option<String>,

        #[arg(long)]
        next_action: Option<String>,

        #[arg(long)]
        next_action_date: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("leadsignal_agent=info".parse()?)
                .add_directive("leadsignal_store=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let settings = StoreSettings::from_env();

    match cli.command {
        Commands::Scrape {
            include,
            exclude,
            locations,
            sites,
        } => {
            let mut config = ScrapeConfig::load(&cli.config)?;
            if let Some(include) = include {
                config.include = include;
            }
            if let Some(exclude) = exclude {
                config.exclude = exclude;
            }
            if let Some(locations) = locations {
                config.locations = locations;
            }
            if let Some(sites) = sites {
                config.sites = sites;
            }

            let client = http::shared_client(Duration::from_secs(config.http_timeout_secs));
            let registry = AdapterRegistry::builtin(&client);
            let runner = ScrapeRunner::new(config, settings, registry);

            let cancel = CancellationToken::new();
            let signal_cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupt received, cancelling run");
                    signal_cancel.cancel();
                }
            });

            let report = runner.run(cancel).await?;
            println!("{}", report.stats);
            for record in &report.new_records {
                println!("new: {} | {} | {}", record.title, record.company, record.url);
            }
        }
        Commands::Rescore => {
            let config = ScrapeConfig::load(&cli.config)?;
            let store = open_primary(&settings)?;
            let updated = rescore_jobs(store.as_ref(), config.score_rules.as_ref()).await?;
            println!("Rescored {updated} leads");
        }
        Commands::Jobs {
            query,
            source,
            location,
            since,
            until,
            limit,
        } => {
            let store = open_primary(&settings)?;
            let jobs = store
                .query_jobs(&JobQuery {
                    text: query,
                    source,
                    location,
                    collected_from: since,
                    collected_to: until,
                    limit,
                    ..JobQuery::default()
                })
                .await?;
            if jobs.is_empty() {
                println!("No jobs found.");
            } else {
                println!(
                    "{:<14} {:<32} {:<20} {:<18} {:<14} {}",
                    "ID", "TITLE", "COMPANY", "LOCATION", "SOURCE", "URL"
                );
                println!("{}", "-".repeat(104));
                for job in jobs {
                    println!(
                        "{:<14} {:<32} {:<20} {:<18} {:<14} {}",
                        truncate(&job.id, 14),
                        truncate(&job.title, 30),
                        truncate(&job.company, 18),
                        truncate(&job.location, 16),
                        truncate(&job.source, 12),
                        job.url
                    );
                }
            }
        }
        Commands::Leads { status } => {
            let status = match status {
                Some(raw) => Some(raw.parse::<LeadStatus>().map_err(|e| anyhow!(e))?),
                None => None,
            };
            let store = open_primary(&settings)?;
            let leads = store.query_leads(&LeadQuery { status }).await?;
            if leads.is_empty() {
                println!("No leads found.");
            } else {
                println!(
                    "{:<14} {:<11} {:>6} {:<4} {:<24} {}",
                    "ID", "STATUS", "SCORE", "FAV", "NEXT ACTION", "UPDATED"
                );
                println!("{}", "-".repeat(84));
                for lead in leads {
                    println!(
                        "{:<14} {:<11} {:>6} {:<4} {:<24} {}",
                        truncate(&lead.id, 14),
                        lead.status,
                        lead.score,
                        if lead.favourite { "*" } else { "" },
                        truncate(&lead.next_action, 22),
                        lead.updated_at
                    );
                }
            }
        }
        Commands::Lead {
            id,
            status,
            score,
            favourite,
            resume_url,
            cover_letter_url,
            next_action,
            next_action_date,
            notes,
        } => {
            let status = match status {
                Some(raw) => Some(raw.parse::<LeadStatus>().map_err(|e| anyhow!(e))?),
                None => None,
            };
            let patch = LeadPatch {
                status,
                score,
                favourite,
                resume_url,
                cover_letter_url,
                next_action,
                next_action_date,
                notes,
            };
            let store = open_primary(&settings)?;
            store.set_lead_fields(&id, &patch).await?;
            println!("Updated lead {id}");
        }
    }

    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}

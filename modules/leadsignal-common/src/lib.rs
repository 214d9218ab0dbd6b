pub mod config;
pub mod dedupe;
pub mod error;
pub mod filter;
pub mod identity;
pub mod scoring;
pub mod types;

pub use config::{ScrapeConfig, StoreSettings};
pub use dedupe::dedupe_by_id;
pub use error::LeadSignalError;
pub use filter::{filter_records, matches_filters};
pub use identity::{job_id, millis_to_iso, now_iso, to_iso_date};
pub use scoring::{score_record, text_blob, ScoreRules};
pub use types::*;

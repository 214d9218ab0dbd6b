pub mod adapters;
pub mod http;
pub mod pacer;
pub mod rescore;
pub mod runner;

pub use adapters::{AdapterRegistry, SourceAdapter};
pub use rescore::rescore_jobs;
pub use runner::{RunReport, RunStats, ScrapeRunner};

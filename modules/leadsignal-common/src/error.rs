use thiserror::Error;

#[derive(Error, Debug)]
pub enum LeadSignalError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Hosted backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Scrape run cancelled before persistence")]
    Cancelled,

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

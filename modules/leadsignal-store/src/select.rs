use std::sync::Arc;

use leadsignal_common::{LeadSignalError, ScrapeConfig, StoreSettings};

use crate::backend::JobStore;
use crate::hosted::SupabaseStore;
use crate::sqlite::SqliteStore;

/// The stores taking part in one run: a backend of record plus an optional
/// embedded mirror.
pub struct SelectedStores {
    pub primary: Arc<dyn JobStore>,
    /// Present when the hosted backend is primary and the config requests a
    /// local mirror; mirror writes never feed the new-record delta.
    pub mirror: Option<Arc<SqliteStore>>,
    /// True when `primary` is the hosted backend.
    pub hosted: bool,
}

/// Open the backend of record without any mirror, for read and rescore
/// paths outside a scrape run.
pub fn open_primary(settings: &StoreSettings) -> Result<Arc<dyn JobStore>, LeadSignalError> {
    if let Some(hosted) = SupabaseStore::from_settings(settings) {
        return Ok(Arc::new(hosted));
    }
    Ok(Arc::new(SqliteStore::open(&settings.sqlite_path)?))
}

/// Pick the backend for a run: hosted when credentials are present,
/// embedded otherwise. The embedded store additionally mirrors hosted
/// writes when the config asks for it; the two are never combined
/// implicitly.
pub fn select_stores(
    settings: &StoreSettings,
    config: &ScrapeConfig,
) -> Result<SelectedStores, LeadSignalError> {
    if let Some(hosted) = SupabaseStore::from_settings(settings) {
        let mirror = if config.use_local_mirror {
            tracing::info!(
                path = %settings.sqlite_path.display(),
                "Local mirror requested alongside hosted backend"
            );
            Some(Arc::new(SqliteStore::open(&settings.sqlite_path)?))
        } else {
            None
        };
        tracing::info!("Using hosted backend");
        return Ok(SelectedStores {
            primary: Arc::new(hosted),
            mirror,
            hosted: true,
        });
    }

    tracing::info!(
        path = %settings.sqlite_path.display(),
        "No hosted credentials, using embedded store"
    );
    Ok(SelectedStores {
        primary: Arc::new(SqliteStore::open(&settings.sqlite_path)?),
        mirror: None,
        hosted: false,
    })
}

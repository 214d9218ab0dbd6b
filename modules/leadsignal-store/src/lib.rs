pub mod backend;
pub mod hosted;
pub mod select;
pub mod snapshot;
pub mod sqlite;

pub use backend::JobStore;
pub use hosted::SupabaseStore;
pub use select::{open_primary, select_stores, SelectedStores};
pub use snapshot::write_csv;
pub use sqlite::SqliteStore;

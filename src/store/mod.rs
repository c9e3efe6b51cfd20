//! Store module - Persisted preference table and settings

mod persistence;
mod preference_store;
mod snapshot;

pub use persistence::{read_optional, write_atomic};
pub use preference_store::{PreferenceStore, StoreError};
pub use snapshot::Snapshot;

pub mod loader;
pub mod catalog;
pub mod manager;
pub mod snapshot;

pub use loader::{Dataset, DatasetLoader, InMemoryLoader, TsvDatasetLoader};
pub use catalog::Catalog;
pub use manager::{CatalogManager, CatalogStatus};
pub use snapshot::{SnapshotDescription, SnapshotLoader, SnapshotManager, DEFAULT_MAX_SNAPSHOTS};

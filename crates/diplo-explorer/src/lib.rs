//! Diplo Explorer - headless driver for the distribution atlas
//!
//! Loads the upstream tables, restores a filter state from a query string,
//! applies user events read as JSON lines and writes a JSON snapshot of the
//! derived view after every recompute.

pub mod config;
pub mod error;
pub mod events;
pub mod runner;
pub mod snapshot;
pub mod state;

pub use config::ExplorerConfig;
pub use error::{ExplorerError, ExplorerResult};
pub use runner::run_events;
pub use snapshot::{Snapshot, SnapshotWriter};
pub use state::AppState;

//! # Diplo Core
//!
//! Record store, filter engine, aggregations and URL state codec for the
//! distribution atlas of Japanese millipedes.
//!
//! Everything here is synchronous and pure with respect to its inputs: a
//! [`RecordStore`] plus a [`FilterState`] fully determine the visible record
//! set and every view derived from it.
//!
//! ## Key Types
//!
//! - [`Record`]: one normalized occurrence row
//! - [`RecordStore`]: records plus taxon, region and literature lookups
//! - [`FilterState`]: every filter, facet selection and display mode
//! - [`DerivedView`]: the result of one full recompute
//!
//! ## Key Operations
//!
//! - [`compute_visible`] / [`derive_options`]: the filter pipeline and facet lists
//! - [`codec::encode`] / [`codec::decode`]: query-string persistence
//! - [`cycle_facet`]: prev/next navigation over facet options
//! - [`apply`]: state transitions with linked toggles

pub mod aggregate;
pub mod codec;
pub mod debounce;
pub mod engine;
pub mod error;
pub mod lang;
pub mod loader;
pub mod markers;
pub mod navigation;
pub mod record;
pub mod state;
pub mod store;
pub mod taxonomy;
pub mod update;
pub mod view;

// Re-export main types
pub use aggregate::{MonthlyCounts, PrefectureChart, YearChart};
pub use debounce::{DEBOUNCE_DELAY, Debouncer};
pub use engine::{FacetOption, FacetOptions, compute_visible, derive_options};
pub use error::*;
pub use lang::Language;
pub use loader::{TablePaths, load_store, try_load_store};
pub use markers::{Marker, Viewport};
pub use navigation::{Direction, cycle, cycle_facet};
pub use record::{LifeStage, Record, RecordType, TaxonRank};
pub use state::{Facet, FilterState};
pub use store::RecordStore;
pub use taxonomy::TaxonomicList;
pub use update::{StateAction, apply};
pub use view::{DerivedView, MapSettings, derive_view};

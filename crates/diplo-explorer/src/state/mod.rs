//! Application state
//!
//! One mutable [`AppState`] owned by the event loop; everything it shows is
//! rebuilt from the store and the filter state on each recompute.

pub mod app_state;

pub use app_state::*;

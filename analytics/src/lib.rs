//! Derived quote board: filtering, ordering and KPIs over canonical quotes.
//!
//! [`compute_view`] is a pure function of the raw quote list and the
//! session's [`PipelineConfig`]; callers rebuild the [`ViewState`] whenever
//! either changes.

pub mod config;
pub mod render;
pub mod view;

pub use config::{PipelineConfig, Tab};
pub use render::{to_table, write_table};
pub use view::{compute_view, compute_view_with, Kpis, ViewState};

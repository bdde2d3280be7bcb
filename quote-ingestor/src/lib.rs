//! Quote board client for the grain-exchange scraping backend.
//!
//! [`backend::BackendClient`] talks to the backend through a
//! [`fetcher::ResilientFetcher`]; [`pipeline::QuotePipeline`] keeps the
//! latest quotes and derives the board; [`scheduler::spawn_scheduler`]
//! decides when to refresh.

pub mod backend;
pub mod config;
pub mod control;
pub mod error;
pub mod fetcher;
pub mod http_client;
pub mod metrics;
pub mod pipeline;
pub mod scheduler;
pub mod sink;

//! Read-only query API over touchpoint events and the people they involve.
//!
//! Serves enriched, paginated event listings plus the aggregate views a
//! client-side timeline needs (daily inbound counts, first touchpoint per
//! person).

pub mod config;
pub mod db;
pub mod enrichment;
pub mod error;
pub mod models;
pub mod pagination;
pub mod projections;
pub mod repository;
pub mod routes;
pub mod service;

#[cfg(test)]
mod test_support;
#[cfg(test)]
mod tests;

pub use config::Config;
pub use db::Database;
pub use routes::{router, AppState};
pub use service::ActivityQueryService;

//! Operation counters for caches and rate limiters (feature `metrics`).
//!
//! Recording and reading are split the same way for every component:
//! recorder traits in [`traits`] write counters, [`snapshot`] structs are
//! plain `Copy` values handed out by a
//! [`MetricsSnapshotProvider`](traits::MetricsSnapshotProvider).

pub mod cell;
pub mod metrics_impl;
pub mod snapshot;
pub mod traits;

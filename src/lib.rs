//! kafka-lite: a lightweight distributed, partitioned-log message broker.
//!
//! A cluster of peer broker nodes collectively hosts a set of named
//! topics, each split into an ordered sequence of append-only partition
//! logs whose ownership is distributed across nodes. Any node accepts any
//! request and transparently forwards it to the partition owner.

pub mod error;
pub mod hash;
pub mod logging;
pub mod metrics;
pub mod persistence;
pub mod replication;
pub mod router;
pub mod schema;
pub mod state;
pub mod storage;
pub mod wire;

pub use error::BrokerError;
pub use router::App;
pub use state::BrokerState;

use std::sync::Arc;

/// Builds a fully initialized broker: recovers persisted topics and
/// schemas from disk, then constructs the axum router that serves the
/// HTTP surface (spec.md §2's control flow for startup).
pub fn build_app(id: u32, address: String, peers: Vec<String>, data_dir: impl Into<std::path::PathBuf>) -> Arc<App> {
    let state = BrokerState::new(id, address, peers, data_dir);
    state.load_schemas();
    state.load_topics();
    App::new(state)
}

pub fn build_router(app: Arc<App>) -> axum::Router<()> {
    router::build_router(app)
}

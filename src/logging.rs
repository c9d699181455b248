//! Tracing setup, the non-Gazette-forwarding subset of
//! `dekaf::logging::install`: a single `fmt` layer filtered by
//! `RUST_LOG`, defaulting to `info` when unset.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

pub fn install() {
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);

    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .init();
}

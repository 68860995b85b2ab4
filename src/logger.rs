//! Opt-in log output for hosts.
//!
//! The library only emits `tracing` events; nothing is printed unless the
//! host installs a subscriber, e.g. with [`init`].

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a compact stderr subscriber: `LEVEL message`, no timestamps,
/// no module paths.
///
/// Does nothing if a global subscriber is already set.
pub fn init(level: LevelFilter) {
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .with_level(true)
        .compact()
        .with_filter(level);

    let _ = Registry::default().with(layer).try_init();
}

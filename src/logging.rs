//! Subscriber setup for binaries and tests.
//!
//! The library only emits `tracing` events; nothing is printed until the
//! embedding application installs a subscriber, for example with
//! [`init_tracing`].

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install a stderr fmt subscriber filtered by `RUST_LOG`, falling back to
/// `default_filter` (e.g. `"floodgate=debug"`).
///
/// Returns `false` if a global subscriber was already installed, which is not
/// treated as an error so tests may call this repeatedly.
pub fn init_tracing(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .is_ok()
}

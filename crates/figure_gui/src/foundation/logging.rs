//! Logging utilities
//!
//! The library itself only talks to the `log` facade; binaries pick the sink.

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system from `RUST_LOG`
///
/// Repeated calls are ignored.
pub fn init() {
    let _ = env_logger::try_init();
}

/// Initialize logging with a default filter such as `"info"` or `"figure_gui=debug"`
///
/// `RUST_LOG` still takes precedence when it is set.
pub fn init_with_level(filters: &str) {
    let mut builder = env_logger::Builder::new();
    builder.parse_filters(filters);
    if let Ok(env_filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&env_filters);
    }
    let _ = builder.try_init();
}

//! Logger bootstrap for the `jot` binary.
//!
//! The library only talks to the `log` facade; the binary picks the backend.

use env_logger::{Builder, Env};

/// Install env_logger with `level` as the default filter.
///
/// `RUST_LOG` overrides `level` when set. Calling this more than once is
/// harmless: later calls are ignored.
pub fn init_logging(level: &str) {
    let env = Env::default().default_filter_or(level);
    let _ = Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}

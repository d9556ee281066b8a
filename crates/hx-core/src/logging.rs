//! Logging setup for the hx CLI.
//!
//! stdout is reserved for command payloads (reports, listings); all log
//! output goes to stderr. The `HX_LOG` environment variable overrides
//! the verbosity flags with a full filter directive.

use std::io::IsTerminal;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable carrying a tracing filter directive.
pub const LOG_ENV: &str = "HX_LOG";

/// Initialize logging from the `-v` count.
///
/// 0 shows warnings, 1 adds our info lines, 2 our debug lines, 3 and
/// up turns everything on.
pub fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "hx_core=info,hx_config=info,hx_common=info",
        2 => "hx_core=debug,hx_config=debug,hx_common=debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(verbose >= 2)
        .compact()
        .init();
}

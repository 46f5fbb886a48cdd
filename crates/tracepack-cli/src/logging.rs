//! Logging initialization for the CLI.
//!
//! The core crate emits events; this module decides where they go. What
//! tracepack logs:
//! - `WARN` for each optional or optional-peer dependency a package declares
//!   but that is not installed (field `package`).
//! - `DEBUG` for each package found, each alias or fallback redirect, each
//!   expanded package root (fields `root`, `files`), and the final closure size.
//! - `TRACE` for every scanned file and every cache hit.
//!
//! Events run inside the command's `closure` span (fields `cmd`, `cwd`); from
//! `-v` on, each entry adds a nested `closure` span carrying the entry path.
//! Everything goes to stderr; stdout carries only command output.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber.
///
/// # Arguments
/// * `verbosity` - 0 = INFO (optional-dependency warnings only), 1 = DEBUG
///   (resolution steps), 2+ = TRACE (every scanned file)
/// * `json` - If true, write one JSON object per event to stderr
///
/// A missing optional dependency in JSON mode:
/// ```json
/// {"timestamp":"...","level":"WARN","fields":{"message":"missing optional dependency: fsevents","package":"fsevents"},"span":{"cmd":"closure","cwd":"/srv/app","name":"closure"}}
/// ```
///
/// # Panics
/// Panics if the subscriber cannot be initialized (e.g., called twice).
pub fn init(verbosity: u8, json: bool) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    // RUST_LOG covers other crates; tracepack's own targets follow -v
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"))
        .add_directive(format!("tracepack_core={level}").parse().unwrap())
        .add_directive(format!("tracepack={level}").parse().unwrap());

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

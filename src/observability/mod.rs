//! Logging setup and crash-report context.
//!
//! Install at startup:
//!
//! ```ignore
//! routegen::observability::init_logging(cli.verbose);
//! routegen::observability::install_panic_hook();
//! ```
//!
//! Then mark work as it happens:
//!
//! ```ignore
//! let _phase = set_phase(PipelinePhase::Extraction);
//! for file in files {
//!     let _file = set_current_file(&file.path);
//!     extract(file)?;
//! }
//! ```

pub mod context;
pub mod panic_hook;

pub use context::{
    current_context, increment_progress, progress, set_current_file, set_current_handler,
    set_phase, set_progress, ContextGuard, PipelineContext, PipelinePhase,
};
pub use panic_hook::install_panic_hook;

use tracing_subscriber::EnvFilter;

/// Map `-v` counts to a default filter. `RUST_LOG` wins when set.
pub fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global tracing subscriber, writing to stderr.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

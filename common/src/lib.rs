//! Common library for the `wmove` tool: weight table parsing, weighted destination
//! selection, chunked streaming copy and the tree distributor tying them together.
//!
//! # Overview
//!
//! `wmove <weightfile> <source-dir>` walks `source-dir` and moves every file into one of the
//! directories listed in the weight file, choosing each destination at random with
//! probability proportional to its weight. A source file is deleted only after its whole
//! content was copied without an I/O error.
//!
//! # Error handling
//!
//! Errors are either fatal or per-file:
//! - fatal: unreadable or malformed weight file, unusable weight table, unresolvable source
//!   root, failures of the directory walk itself. These abort the run with a non-zero exit.
//! - per-file: source open, destination create, copy and delete failures. These are logged
//!   and the file is left in place (see [`distribute::FileOutcome`]).
//!
//! There are no retries.
//!
//! # Logging
//!
//! [`run`] installs a `tracing` subscriber writing to stdout. Library functions only emit
//! events; they never install a subscriber themselves.

pub mod config;
pub mod copy;
pub mod distribute;
pub mod progress;
pub mod select;
pub mod weights;

mod testutils;

pub use config::{CopyConfig, LogFormat, OutputConfig};
pub use distribute::distribute;
pub use progress::Summary;
pub use weights::{WeightEntry, WeightTable, parse_weight_file};

fn init_logging(output: &OutputConfig) -> anyhow::Result<()> {
    if output.quiet {
        return Ok(());
    }
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(output.level()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout);
    let result = match output.log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    result.map_err(|err| anyhow::anyhow!("failed to initialize logging: {err}"))
}

/// Sets up logging, runs `func` and reports its outcome.
///
/// Returns `None` if `func` failed; the error chain is logged at ERROR level. On success the
/// summary is printed to stdout when requested.
pub fn run<T, F>(output: OutputConfig, func: F) -> Option<T>
where
    T: serde::Serialize + std::fmt::Display,
    F: FnOnce() -> anyhow::Result<T>,
{
    if let Err(error) = init_logging(&output) {
        eprintln!("{error:#}");
        return None;
    }
    match func() {
        Ok(summary) => {
            if output.print_summary {
                match output.log_format {
                    LogFormat::Json => match serde_json::to_string(&summary) {
                        Ok(json) => println!("{json}"),
                        Err(error) => tracing::error!("cannot serialize summary: {error}"),
                    },
                    LogFormat::Text => println!("{summary}"),
                }
            }
            Some(summary)
        }
        Err(error) => {
            tracing::error!("{:#}", &error);
            None
        }
    }
}

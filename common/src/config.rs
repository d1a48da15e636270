//! Configuration types for output and copy settings

use crate::copy::{DEFAULT_BUFFER_SIZE, StreamCopier};

/// Format of the log event stream written to stdout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// One JSON object per event
    #[default]
    Json,
    /// Human readable lines
    Text,
}

/// Output and logging configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    /// Suppress all log output
    pub quiet: bool,
    /// Verbosity level: 0=INFO, 1=DEBUG, 2+=TRACE
    pub verbose: u8,
    /// Print summary statistics at the end
    pub print_summary: bool,
    /// Log event format
    pub log_format: LogFormat,
}

impl OutputConfig {
    /// Default filter directive when `RUST_LOG` is not set
    #[must_use]
    pub fn level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Streaming copy configuration
#[derive(Debug, Clone, Copy)]
pub struct CopyConfig {
    /// Size of the copy buffer (bytes)
    pub buffer_size: usize,
}

impl Default for CopyConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl CopyConfig {
    /// Validate configuration and return errors if invalid
    pub fn validate(&self) -> Result<(), String> {
        if self.buffer_size == 0 {
            return Err("buffer size must be greater than zero".to_string());
        }
        Ok(())
    }

    /// Builds a copier from a validated configuration
    pub fn copier(&self) -> Result<StreamCopier, String> {
        self.validate()?;
        Ok(StreamCopier::new(self.buffer_size))
    }
}

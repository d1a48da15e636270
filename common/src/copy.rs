//! Chunked stream copy with coarse progress milestones.

use std::io::{Read, Write};

use tracing::instrument;

/// Default size of the copy buffer (100 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 100 * 1024;

/// Cumulative fractions at which progress is reported, in ascending order.
pub const MILESTONES: [f64; 3] = [0.25, 0.5, 0.75];

/// Copy failure. Bytes already written to the destination stay there.
#[derive(Debug, thiserror::Error)]
pub enum CopyError {
    #[error("read failed after {bytes_copied} bytes")]
    ReadFailed {
        bytes_copied: u64,
        #[source]
        source: std::io::Error,
    },
    #[error("write failed after {bytes_copied} bytes")]
    WriteFailed {
        bytes_copied: u64,
        #[source]
        source: std::io::Error,
    },
}

impl CopyError {
    #[must_use]
    pub fn bytes_copied(&self) -> u64 {
        match self {
            CopyError::ReadFailed { bytes_copied, .. }
            | CopyError::WriteFailed { bytes_copied, .. } => *bytes_copied,
        }
    }
}

/// Receives progress milestones from [`StreamCopier`].
pub trait ProgressObserver {
    fn on_progress(&mut self, fraction: f64);
}

impl<F: FnMut(f64)> ProgressObserver for F {
    fn on_progress(&mut self, fraction: f64) {
        self(fraction)
    }
}

/// Observer that ignores all milestones.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&mut self, _fraction: f64) {}
}

/// Tracks which milestones of a single copy were already reported.
#[derive(Debug)]
struct Milestones {
    total_size: u64,
    emitted: usize,
}

impl Milestones {
    fn new(total_size: u64) -> Self {
        Self {
            total_size,
            emitted: 0,
        }
    }

    /// Highest milestone reached by `transferred` that was not emitted yet, if any.
    fn advance(&mut self, transferred: u64) -> Option<f64> {
        if self.total_size == 0 {
            return None;
        }
        // compare transferred / total >= (idx + 1) / 4 without floating point
        let reached = (0..MILESTONES.len()).rev().find(|idx| {
            u128::from(transferred) * 4 >= u128::from(self.total_size) * (*idx as u128 + 1)
        })?;
        if reached < self.emitted {
            return None;
        }
        self.emitted = reached + 1;
        Some(MILESTONES[reached])
    }
}

/// Copies streams through a fixed-size buffer, one read fully written before the next.
#[derive(Debug, Clone)]
pub struct StreamCopier {
    buffer_size: usize,
}

impl Default for StreamCopier {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE)
    }
}

impl StreamCopier {
    /// # Panics
    ///
    /// Panics if `buffer_size` is zero; use [`crate::config::CopyConfig::copier`] to build a
    /// copier from unchecked input.
    #[must_use]
    pub fn new(buffer_size: usize) -> Self {
        assert!(buffer_size > 0, "copy buffer must not be empty");
        Self { buffer_size }
    }

    #[must_use]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Copies everything remaining in `src` to `dst`, returning the number of bytes copied.
    ///
    /// `total_size` is only used to compute milestones; at most one milestone is reported per
    /// chunk and a lower milestone is never reported after a higher one.
    pub fn copy<R, W>(
        &self,
        src: &mut R,
        dst: &mut W,
        total_size: u64,
        observer: &mut dyn ProgressObserver,
    ) -> Result<u64, CopyError>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        let mut buffer = vec![0u8; self.buffer_size];
        let mut milestones = Milestones::new(total_size);
        let mut bytes_copied = 0u64;
        loop {
            let read = match src.read(&mut buffer) {
                Ok(0) => break,
                Ok(read) => read,
                Err(error) if error.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(CopyError::ReadFailed {
                        bytes_copied,
                        source,
                    });
                }
            };
            dst.write_all(&buffer[..read])
                .map_err(|source| CopyError::WriteFailed {
                    bytes_copied,
                    source,
                })?;
            bytes_copied += read as u64;
            if let Some(fraction) = milestones.advance(bytes_copied) {
                observer.on_progress(fraction);
            }
        }
        dst.flush().map_err(|source| CopyError::WriteFailed {
            bytes_copied,
            source,
        })?;
        Ok(bytes_copied)
    }

    /// Copies an open file, querying its size first for progress reporting.
    #[instrument(skip(self, src, dst, observer))]
    pub fn copy_file(
        &self,
        src: &mut std::fs::File,
        dst: &mut std::fs::File,
        observer: &mut dyn ProgressObserver,
    ) -> Result<u64, CopyError> {
        let total_size = src
            .metadata()
            .map_err(|source| CopyError::ReadFailed {
                bytes_copied: 0,
                source,
            })?
            .len();
        tracing::trace!(total_size, "copying data");
        self.copy(src, dst, total_size, observer)
    }
}

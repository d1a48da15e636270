use crate::copy::ProgressObserver;

/// Totals for one distribution run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct Summary {
    pub bytes_copied: u64,
    pub files_moved: usize,
    pub files_skipped: usize,
    /// Files copied successfully whose source could not be removed afterwards.
    pub delete_failures: usize,
}

impl std::ops::Add for Summary {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            bytes_copied: self.bytes_copied + other.bytes_copied,
            files_moved: self.files_moved + other.files_moved,
            files_skipped: self.files_skipped + other.files_skipped,
            delete_failures: self.delete_failures + other.delete_failures,
        }
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "bytes copied: {}\n\
            files moved: {}\n\
            files skipped: {}\n\
            delete failures: {}",
            bytesize::ByteSize(self.bytes_copied),
            self.files_moved,
            self.files_skipped,
            self.delete_failures,
        )
    }
}

/// Logs copy milestones of a single file as INFO events.
#[derive(Debug)]
pub struct LogProgress<'a> {
    src_path: &'a std::path::Path,
    dest_path: &'a std::path::Path,
}

impl<'a> LogProgress<'a> {
    pub fn new(src_path: &'a std::path::Path, dest_path: &'a std::path::Path) -> Self {
        Self {
            src_path,
            dest_path,
        }
    }
}

impl ProgressObserver for LogProgress<'_> {
    fn on_progress(&mut self, fraction: f64) {
        tracing::info!(
            src_path = %self.src_path.display(),
            dest_path = %self.dest_path.display(),
            fraction,
            "copy progress"
        );
    }
}

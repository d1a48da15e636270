//! Walks a source tree and moves every file into a weighted-random destination directory.
//!
//! Files are flattened: only the file name is kept, so `src/sub/y.txt` lands in
//! `<destination>/y.txt`. The source file is removed only after its content was streamed to
//! the destination without error. Per-file failures are logged and the walk continues; only
//! failures of the walk itself are fatal.

use std::os::unix::fs::MetadataExt;

use rand::Rng;
use tracing::instrument;

use crate::copy::{CopyError, NoProgress, ProgressObserver, StreamCopier};
use crate::progress::{LogProgress, Summary};
use crate::select::{self, SelectionError, WeightedSelector};
use crate::weights::WeightTable;

/// Fatal distribution errors; any of these aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot resolve source directory {path:?} to an absolute path")]
    SourceRoot {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed walking {start_dir:?}")]
    Walk {
        start_dir: std::path::PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("cannot select a destination")]
    Selection(#[from] SelectionError),
}

/// Last state a file reached before it was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Discovered,
    SourceOpened,
    DestCreated,
    Copied,
}

/// Per-file failure; the file is skipped and the walk continues.
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("cannot open source file: {0}")]
    Open(#[source] std::io::Error),
    #[error("not a regular file")]
    Unsupported,
    #[error("destination is the source file itself")]
    SameFile,
    #[error("cannot create destination file: {0}")]
    Create(#[source] std::io::Error),
    #[error("copy failed: {0}")]
    Copy(#[source] CopyError),
    #[error("cannot delete source file after copying {bytes_copied} bytes: {source}")]
    Delete {
        bytes_copied: u64,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug)]
pub enum FileOutcome {
    Moved {
        dest_path: std::path::PathBuf,
        bytes_copied: u64,
    },
    Skipped {
        stage: Stage,
        error: FileError,
    },
}

impl FileOutcome {
    fn summary(&self) -> Summary {
        match self {
            FileOutcome::Moved { bytes_copied, .. } => Summary {
                bytes_copied: *bytes_copied,
                files_moved: 1,
                ..Default::default()
            },
            FileOutcome::Skipped {
                error: FileError::Delete { bytes_copied, .. },
                ..
            } => Summary {
                bytes_copied: *bytes_copied,
                files_skipped: 1,
                delete_failures: 1,
                ..Default::default()
            },
            FileOutcome::Skipped { .. } => Summary {
                files_skipped: 1,
                ..Default::default()
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Settings {
    /// Log 25/50/75% milestones while copying each file.
    pub progress: bool,
}

/// Moves files from a source tree into destinations drawn from a weight table.
#[derive(Debug)]
pub struct Distributor<'a, R> {
    table: &'a WeightTable,
    selector: WeightedSelector<R>,
    copier: StreamCopier,
    settings: Settings,
}

impl<'a, R: Rng> Distributor<'a, R> {
    /// Fails if no destination could ever be drawn from `table`.
    pub fn new(
        table: &'a WeightTable,
        selector: WeightedSelector<R>,
        copier: StreamCopier,
        settings: Settings,
    ) -> Result<Self, SelectionError> {
        select::validate(table)?;
        Ok(Self {
            table,
            selector,
            copier,
            settings,
        })
    }

    /// Walks `source_root` in file-name order and moves every file found.
    #[instrument(skip(self))]
    pub fn distribute(&mut self, source_root: &std::path::Path) -> Result<Summary, Error> {
        let start_dir = std::path::absolute(source_root).map_err(|source| Error::SourceRoot {
            path: source_root.to_owned(),
            source,
        })?;
        let mut summary = Summary::default();
        for entry in walkdir::WalkDir::new(&start_dir).sort_by_file_name() {
            let entry = entry.map_err(|source| Error::Walk {
                start_dir: start_dir.clone(),
                source,
            })?;
            tracing::info!(src_path = %entry.path().display(), "walking");
            if entry.file_type().is_dir() {
                tracing::info!(src_path = %entry.path().display(), "directory, skipping");
                continue;
            }
            let outcome = self.move_file(entry.path(), entry.file_type())?;
            summary = summary + outcome.summary();
        }
        tracing::info!(
            start_dir = %start_dir.display(),
            files_moved = summary.files_moved,
            files_skipped = summary.files_skipped,
            "distribution finished"
        );
        Ok(summary)
    }

    /// Moves a single non-directory entry. Only selection failures are returned as errors.
    #[instrument(skip_all, fields(src_path = %src_path.display()))]
    pub fn move_file(
        &mut self,
        src_path: &std::path::Path,
        file_type: std::fs::FileType,
    ) -> Result<FileOutcome, SelectionError> {
        if let Err(error) = check_file_type(src_path, file_type) {
            tracing::warn!(error = %error, "skipping entry");
            return Ok(FileOutcome::Skipped {
                stage: Stage::Discovered,
                error,
            });
        }
        let Some(file_name) = src_path.file_name() else {
            // walkdir yields normalized paths, only a bare root like "/" has no file name
            return Ok(FileOutcome::Skipped {
                stage: Stage::Discovered,
                error: FileError::Unsupported,
            });
        };
        let dest_dir = self.selector.select(self.table)?;
        let dest_path = dest_dir.join(file_name);
        tracing::info!(dest_path = %dest_path.display(), "destination");
        Ok(self.transfer(src_path, &dest_path))
    }

    fn transfer(&self, src_path: &std::path::Path, dest_path: &std::path::Path) -> FileOutcome {
        let skip = |stage, error: FileError| {
            match &error {
                FileError::Create(_) => {
                    tracing::warn!(dest_path = %dest_path.display(), error = %error, "skipping file")
                }
                _ => {
                    tracing::error!(dest_path = %dest_path.display(), error = %error, "skipping file")
                }
            }
            FileOutcome::Skipped { stage, error }
        };
        let bytes_copied = {
            let mut src_file = match std::fs::File::open(src_path) {
                Ok(file) => file,
                Err(error) => return skip(Stage::Discovered, FileError::Open(error)),
            };
            tracing::debug!(dest_path = %dest_path.display(), "source file opened");
            if is_same_file(&src_file, dest_path) {
                return skip(Stage::SourceOpened, FileError::SameFile);
            }
            let mut dest_file = match std::fs::File::create(dest_path) {
                Ok(file) => file,
                Err(error) => return skip(Stage::SourceOpened, FileError::Create(error)),
            };
            let mut log_progress;
            let mut no_progress = NoProgress;
            let observer: &mut dyn ProgressObserver = if self.settings.progress {
                log_progress = LogProgress::new(src_path, dest_path);
                &mut log_progress
            } else {
                &mut no_progress
            };
            match self
                .copier
                .copy_file(&mut src_file, &mut dest_file, observer)
            {
                Ok(bytes_copied) => bytes_copied,
                Err(error) => return skip(Stage::DestCreated, FileError::Copy(error)),
            }
        };
        tracing::info!(dest_path = %dest_path.display(), bytes_copied, "successfully copied");
        if let Err(source) = std::fs::remove_file(src_path) {
            return skip(
                Stage::Copied,
                FileError::Delete {
                    bytes_copied,
                    source,
                },
            );
        }
        tracing::debug!(dest_path = %dest_path.display(), "source file deleted");
        FileOutcome::Moved {
            dest_path: dest_path.to_owned(),
            bytes_copied,
        }
    }
}

/// Regular files and symlinks to regular files are moved; everything else is skipped.
fn check_file_type(
    path: &std::path::Path,
    file_type: std::fs::FileType,
) -> Result<(), FileError> {
    if file_type.is_file() {
        return Ok(());
    }
    if !file_type.is_symlink() {
        return Err(FileError::Unsupported);
    }
    let target = std::fs::metadata(path).map_err(FileError::Open)?;
    if target.is_file() {
        Ok(())
    } else {
        Err(FileError::Unsupported)
    }
}

fn is_same_file(src_file: &std::fs::File, dest_path: &std::path::Path) -> bool {
    match (src_file.metadata(), std::fs::metadata(dest_path)) {
        (Ok(src), Ok(dest)) => src.dev() == dest.dev() && src.ino() == dest.ino(),
        _ => false,
    }
}

/// Distributes `source_root` across `table` using the thread-local random source.
pub fn distribute(
    source_root: &std::path::Path,
    table: &WeightTable,
    copier: StreamCopier,
    settings: Settings,
) -> Result<Summary, Error> {
    Distributor::new(table, WeightedSelector::from_thread_rng(), copier, settings)?
        .distribute(source_root)
}

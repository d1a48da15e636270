//! Weight file parsing.
//!
//! A weight file lists one destination per line in the form `<weight>:<directory>`. The
//! line is split on the first `:` only, so a directory containing `:` is kept whole. Relative
//! directories are resolved against the current working directory; existence is not checked.
//!
//! Parsing is all-or-nothing: any malformed line fails the whole file and no partial table is
//! returned.

use tracing::instrument;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("cannot read weight file {path:?}")]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed weight file line {line_number} {line:?}: {reason}")]
    MalformedLine {
        line_number: usize,
        line: String,
        reason: &'static str,
    },
    #[error("weight file line {line_number}: cannot resolve {path:?} to an absolute path")]
    InvalidPath {
        line_number: usize,
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A single destination directory and its relative selection weight.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct WeightEntry {
    pub path: std::path::PathBuf,
    pub weight: u64,
}

/// Destinations in file order. Duplicate paths are kept as separate entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct WeightTable {
    entries: Vec<WeightEntry>,
}

impl WeightTable {
    #[must_use]
    pub fn new(entries: Vec<WeightEntry>) -> Self {
        Self { entries }
    }

    /// Parses weight file contents. Lines may end with `\n` or `\r\n`.
    pub fn parse(contents: &str) -> Result<Self, ParseError> {
        let entries = contents
            .lines()
            .enumerate()
            .map(|(idx, line)| parse_line(idx + 1, line))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    #[must_use]
    pub fn entries(&self) -> &[WeightEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all weights; `u128` so that any number of `u64` weights fits.
    #[must_use]
    pub fn total_weight(&self) -> u128 {
        self.entries.iter().map(|entry| u128::from(entry.weight)).sum()
    }
}

/// Reads and parses the weight file at `path`.
#[instrument]
pub fn parse_weight_file(path: &std::path::Path) -> Result<WeightTable, ParseError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ParseError::Read {
        path: path.to_owned(),
        source,
    })?;
    let table = WeightTable::parse(&contents)?;
    tracing::debug!(
        entries = table.len(),
        total_weight = %table.total_weight(),
        "parsed weight file"
    );
    Ok(table)
}

/// Parses one `<weight>:<directory>` line; `line_number` is 1-based and only used for errors.
pub fn parse_line(line_number: usize, line: &str) -> Result<WeightEntry, ParseError> {
    let malformed = |reason| ParseError::MalformedLine {
        line_number,
        line: line.to_string(),
        reason,
    };
    let (weight, path) = line
        .split_once(':')
        .ok_or_else(|| malformed("missing ':' separator"))?;
    let weight = weight
        .parse::<u64>()
        .map_err(|_| malformed("weight is not a non-negative 64-bit integer"))?;
    let path = std::path::absolute(path).map_err(|source| ParseError::InvalidPath {
        line_number,
        path: path.to_string(),
        source,
    })?;
    tracing::debug!(weight, path = %path.display(), "parsed weight file line");
    Ok(WeightEntry { path, weight })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use proptest::prelude::*;

    #[test]
    fn parses_entries_in_file_order() -> Result<()> {
        let table = WeightTable::parse("1:/dest_a\n3:/dest_b\n0:/dest_c\n")?;
        assert_eq!(
            table.entries(),
            &[
                WeightEntry {
                    path: "/dest_a".into(),
                    weight: 1
                },
                WeightEntry {
                    path: "/dest_b".into(),
                    weight: 3
                },
                WeightEntry {
                    path: "/dest_c".into(),
                    weight: 0
                },
            ]
        );
        assert_eq!(table.total_weight(), 4);
        Ok(())
    }

    #[test]
    fn accepts_weights_beyond_32_bits() -> Result<()> {
        let table = WeightTable::parse("4294967296:/a\n1:/b")?;
        assert_eq!(table.entries()[0].weight, 4_294_967_296);
        assert_eq!(table.total_weight(), 4_294_967_297);
        Ok(())
    }

    #[test]
    fn total_weight_does_not_overflow() -> Result<()> {
        let max = u64::MAX;
        let table = WeightTable::parse(&format!("{max}:/a\n{max}:/b"))?;
        assert_eq!(table.total_weight(), u128::from(max) * 2);
        Ok(())
    }

    #[test]
    fn weight_above_u64_is_malformed() {
        let err = WeightTable::parse("18446744073709551616:/a").unwrap_err();
        assert!(matches!(err, ParseError::MalformedLine { line_number: 1, .. }));
    }

    #[test]
    fn keeps_duplicate_paths() -> Result<()> {
        let table = WeightTable::parse("1:/dest\n2:/dest")?;
        assert_eq!(table.len(), 2);
        assert_eq!(table.total_weight(), 3);
        Ok(())
    }

    #[test]
    fn relative_paths_resolve_against_cwd() -> Result<()> {
        let table = WeightTable::parse("5:some/dir")?;
        let expected = std::env::current_dir()?.join("some/dir");
        assert_eq!(table.entries()[0].path, expected);
        assert!(table.entries()[0].path.is_absolute());
        Ok(())
    }

    #[test]
    fn splits_on_first_separator_only() -> Result<()> {
        let table = WeightTable::parse("2:/mnt/a:b")?;
        assert_eq!(table.entries()[0].path, std::path::PathBuf::from("/mnt/a:b"));
        Ok(())
    }

    #[test]
    fn accepts_crlf_line_endings() -> Result<()> {
        let table = WeightTable::parse("1:/a\r\n2:/b\r\n")?;
        assert_eq!(table.entries()[1].path, std::path::PathBuf::from("/b"));
        Ok(())
    }

    #[test]
    fn missing_separator_is_malformed() {
        let err = WeightTable::parse("1:/a\n/b\n").unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedLine { line_number: 2, .. }
        ));
    }

    #[test]
    fn non_integer_weight_is_malformed() {
        for line in ["x:/a", "-1:/a", "1.5:/a", " 1:/a", ":/a"] {
            let err = WeightTable::parse(line).unwrap_err();
            assert!(
                matches!(err, ParseError::MalformedLine { line_number: 1, .. }),
                "line {line:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn blank_line_is_malformed() {
        let err = WeightTable::parse("1:/a\n\n2:/b").unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedLine { line_number: 2, .. }
        ));
    }

    #[test]
    fn empty_path_is_invalid() {
        let err = WeightTable::parse("1:").unwrap_err();
        assert!(matches!(err, ParseError::InvalidPath { line_number: 1, .. }));
    }

    #[test]
    fn empty_file_gives_empty_table() -> Result<()> {
        assert!(WeightTable::parse("")?.is_empty());
        Ok(())
    }

    #[test]
    fn missing_weight_file_is_read_error() -> Result<()> {
        let tmp_dir = tempfile::tempdir()?;
        let err = parse_weight_file(&tmp_dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, ParseError::Read { .. }));
        Ok(())
    }

    #[test]
    fn reads_weight_file_from_disk() -> Result<()> {
        let tmp_dir = tempfile::tempdir()?;
        let weight_file = tmp_dir.path().join("weights");
        std::fs::write(&weight_file, "1:/dest_a\n1:/dest_b")?;
        let table = parse_weight_file(&weight_file)?;
        assert_eq!(table.len(), 2);
        Ok(())
    }

    proptest! {
        #[test]
        fn weights_and_count_survive_parsing(
            lines in proptest::collection::vec((any::<u64>(), "/[a-z0-9_]{1,12}(/[a-z0-9_]{1,12}){0,3}"), 1..20)
        ) {
            let contents = lines
                .iter()
                .map(|(weight, path)| format!("{weight}:{path}"))
                .collect::<Vec<_>>()
                .join("\n");
            let table = WeightTable::parse(&contents).unwrap();
            prop_assert_eq!(table.len(), lines.len());
            let expected: u128 = lines.iter().map(|(weight, _)| u128::from(*weight)).sum();
            prop_assert_eq!(table.total_weight(), expected);
        }
    }
}

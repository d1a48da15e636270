/// Creates a temporary source tree:
///
/// ```text
/// src
/// |- x.txt   ("x contents")
/// |- sub
///    |- y.txt ("y")
/// ```
#[cfg(test)]
pub fn setup_test_dir() -> anyhow::Result<tempfile::TempDir> {
    let tmp_dir = tempfile::tempdir()?;
    let src_path = tmp_dir.path().join("src");
    std::fs::create_dir(&src_path)?;
    std::fs::write(src_path.join("x.txt"), "x contents")?;
    let sub_path = src_path.join("sub");
    std::fs::create_dir(&sub_path)?;
    std::fs::write(sub_path.join("y.txt"), "y")?;
    Ok(tmp_dir)
}

/// Creates `dest_a` and `dest_b` under `root`.
#[cfg(test)]
pub fn setup_dest_dirs(
    root: &std::path::Path,
) -> anyhow::Result<(std::path::PathBuf, std::path::PathBuf)> {
    let dest_a = root.join("dest_a");
    let dest_b = root.join("dest_b");
    std::fs::create_dir(&dest_a)?;
    std::fs::create_dir(&dest_b)?;
    Ok((dest_a, dest_b))
}

/// Number of non-directory entries anywhere under `root`.
#[cfg(test)]
pub fn count_files(root: &std::path::Path) -> usize {
    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| !entry.file_type().is_dir())
        .count()
}

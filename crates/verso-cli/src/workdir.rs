//! Reading working-directory files for `verso add`.

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

/// Directories never walked into.
const SKIPPED_DIRS: &[&str] = &[".git"];

/// Files gathered from the working directory.
#[derive(Debug, Default)]
pub struct Collected {
    /// (repository-relative path, content), sorted by path.
    pub files: Vec<(String, String)>,
    /// Paths left out because they are not UTF-8 text.
    pub skipped_binary: Vec<String>,
}

/// Read every file named by `inputs`, walking directories.
///
/// `state_dir` is excluded so the repository never stages its own state.
pub fn collect(cwd: &Path, inputs: &[PathBuf], state_dir: &Path) -> Result<Collected> {
    let state_dir = cwd.join(state_dir);
    let mut out = Collected::default();

    for input in inputs {
        let full = cwd.join(input);
        if !full.exists() {
            anyhow::bail!("pathspec '{}' did not match any files", input.display());
        }

        for entry in WalkDir::new(&full)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                let name = e.file_name().to_string_lossy();
                e.path() != state_dir && !SKIPPED_DIRS.iter().any(|d| name == *d)
            })
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = relative_path(cwd, entry.path());
            let bytes = fs::read(entry.path())
                .with_context(|| format!("cannot read {}", entry.path().display()))?;

            if verso_core::diff::is_binary(&bytes) {
                out.skipped_binary.push(rel);
                continue;
            }
            match String::from_utf8(bytes) {
                Ok(content) => out.files.push((rel, content)),
                Err(_) => out.skipped_binary.push(rel),
            }
        }
    }

    out.files.sort_by(|a, b| a.0.cmp(&b.0));
    out.files.dedup_by(|a, b| a.0 == b.0);
    Ok(out)
}

/// `/`-separated path of `path` relative to `root` (or as given if outside it).
fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_collect_walks_directories() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/nested")).unwrap();
        fs::write(dir.path().join("src/main.rs"), "fn main() {}").unwrap();
        fs::write(dir.path().join("src/nested/lib.rs"), "pub fn f() {}").unwrap();
        fs::write(dir.path().join("README"), "readme").unwrap();

        let collected = collect(
            dir.path(),
            &[PathBuf::from("src"), PathBuf::from("README")],
            Path::new(".verso"),
        )
        .unwrap();
        let paths: Vec<_> = collected.files.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(paths, vec!["README", "src/main.rs", "src/nested/lib.rs"]);
    }

    #[test]
    fn test_collect_skips_state_dir_and_binary() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".verso")).unwrap();
        fs::write(dir.path().join(".verso/state.json"), "{}").unwrap();
        fs::write(dir.path().join("image.bin"), b"\x89PNG\x00\x01").unwrap();
        fs::write(dir.path().join("notes.txt"), "text").unwrap();

        let collected = collect(dir.path(), &[PathBuf::from(".")], Path::new(".verso")).unwrap();
        let paths: Vec<_> = collected.files.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(paths, vec!["notes.txt"]);
        assert_eq!(collected.skipped_binary, vec!["image.bin"]);
    }

    #[test]
    fn test_collect_missing_path_fails() {
        let dir = tempdir().unwrap();
        let result = collect(dir.path(), &[PathBuf::from("nope")], Path::new(".verso"));
        assert!(result.is_err());
    }
}
